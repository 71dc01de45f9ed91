use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use brawl_arena_core::MapDescriptor;
use thiserror::Error;

const SHARE_DOMAIN: &str = "arena";
const SHARE_VERSION: &str = "v1";
const FIELD_DELIMITER: char = ':';

/// Prefix emitted before the encoded map payload.
pub const SHARE_HEADER: &str = "arena:v1";

/// Errors that can occur while decoding map share strings.
#[derive(Debug, Error)]
pub enum ShareStringError {
    /// The string was empty or contained only whitespace.
    #[error("share string was empty")]
    Empty,
    /// The string did not contain a version segment.
    #[error("share string is missing the version")]
    MissingVersion,
    /// The string did not contain a payload segment.
    #[error("share string is missing the payload")]
    MissingPayload,
    /// The string used an unexpected prefix.
    #[error("share prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The string used an unsupported version identifier.
    #[error("share version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode map payload: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    /// The decoded payload was not a map descriptor.
    #[error("could not parse map payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Encodes a map into a single-line string suitable for clipboard transfer.
pub fn encode_share_string(descriptor: &MapDescriptor) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(descriptor)?;
    Ok(format!("{SHARE_HEADER}:{}", STANDARD_NO_PAD.encode(json)))
}

/// Decodes a map from its share string.
pub fn decode_share_string(value: &str) -> Result<MapDescriptor, ShareStringError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ShareStringError::Empty);
    }

    let mut parts = trimmed.splitn(3, FIELD_DELIMITER);
    let domain = parts.next().unwrap_or_default();
    let version = parts.next().ok_or(ShareStringError::MissingVersion)?;
    let payload = parts.next().ok_or(ShareStringError::MissingPayload)?;

    if domain != SHARE_DOMAIN {
        return Err(ShareStringError::InvalidPrefix(domain.to_owned()));
    }
    if version != SHARE_VERSION {
        return Err(ShareStringError::UnsupportedVersion(version.to_owned()));
    }

    let bytes = STANDARD_NO_PAD.decode(payload.as_bytes())?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brawl_arena_core::{BlockRecord, BlockType, WorldPoint};

    fn sample() -> MapDescriptor {
        MapDescriptor::new(vec![
            BlockRecord::new(BlockType::Spawn, WorldPoint::new(-2.0, 1.0)),
            BlockRecord::new(BlockType::Crate, WorldPoint::new(4.0, 0.0)),
        ])
    }

    #[test]
    fn share_string_carries_header() {
        let encoded = encode_share_string(&sample()).expect("encode");
        assert!(encoded.starts_with("arena:v1:"));
        assert!(!encoded.contains('\n'));
        assert_eq!(decode_share_string(&encoded).expect("decode"), sample());
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let encoded = format!("  {}\n", encode_share_string(&sample()).expect("encode"));
        assert_eq!(decode_share_string(&encoded).expect("decode"), sample());
    }

    #[test]
    fn rejects_foreign_prefix() {
        let error = decode_share_string("level:v1:e30").expect_err("foreign prefix");
        assert!(matches!(error, ShareStringError::InvalidPrefix(prefix) if prefix == "level"));
    }

    #[test]
    fn rejects_unknown_version() {
        let error = decode_share_string("arena:v9:e30").expect_err("unknown version");
        assert!(matches!(error, ShareStringError::UnsupportedVersion(version) if version == "v9"));
    }

    #[test]
    fn rejects_truncated_strings() {
        assert!(matches!(
            decode_share_string("   "),
            Err(ShareStringError::Empty)
        ));
        assert!(matches!(
            decode_share_string("arena"),
            Err(ShareStringError::MissingVersion)
        ));
        assert!(matches!(
            decode_share_string("arena:v1"),
            Err(ShareStringError::MissingPayload)
        ));
    }

    #[test]
    fn rejects_garbage_payload() {
        assert!(matches!(
            decode_share_string("arena:v1:***"),
            Err(ShareStringError::InvalidEncoding(_))
        ));
        assert!(matches!(
            decode_share_string("arena:v1:bm90IGpzb24"),
            Err(ShareStringError::InvalidPayload(_))
        ));
    }
}
