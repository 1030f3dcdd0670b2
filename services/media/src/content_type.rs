//! Declared content-type negotiation
//!
//! Thumbnails only constrain the main type (`image/*`); videos constrain both
//! parts (`video/mp4`). The two policies are intentionally different.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::ValidationError;
use crate::models::{AssetKind, MediaType};

/// Parse a declared `Content-Type` and check it against the policy for `kind`
pub fn negotiate(kind: AssetKind, header: Option<&str>) -> Result<MediaType, ValidationError> {
    let media_type = parse(header)?;

    match kind {
        AssetKind::Thumbnail if media_type.main_type() != "image" => {
            Err(ValidationError::UnsupportedMediaType {
                found: media_type.essence(),
                expected: "image/*",
            })
        }
        AssetKind::Video if media_type.main_type() != "video" || media_type.sub_type() != "mp4" => {
            Err(ValidationError::UnsupportedMediaType {
                found: media_type.essence(),
                expected: "video/mp4",
            })
        }
        _ => Ok(media_type),
    }
}

/// Split a header value into a lower-cased `main/sub` pair
///
/// Parameters after `;` are dropped. Each part is a subset of an RFC 6838
/// restricted name that also works as a file-name suffix and a URL path
/// segment: letters, digits, `+`, `_`, `-` and single interior dots.
pub fn parse(header: Option<&str>) -> Result<MediaType, ValidationError> {
    let raw = header.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(ValidationError::MissingContentType);
    }

    let essence = raw.split(';').next().unwrap_or_default().trim();
    let parts: Vec<&str> = essence.split('/').collect();
    let [main, sub] = parts.as_slice() else {
        return Err(ValidationError::MalformedContentType(raw.to_string()));
    };

    let main = main.trim().to_ascii_lowercase();
    let sub = sub.trim().to_ascii_lowercase();
    if !is_token(&main) || !is_token(&sub) {
        return Err(ValidationError::MalformedContentType(raw.to_string()));
    }

    Ok(MediaType::new(main, sub))
}

const MAX_TOKEN_LEN: usize = 127;

fn is_token(part: &str) -> bool {
    static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = TOKEN_REGEX.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9+_-]*(?:\.[a-z0-9+_-]+)*$")
            .expect("Failed to compile media type token regex")
    });

    part.len() <= MAX_TOKEN_LEN && regex.is_match(part)
}
