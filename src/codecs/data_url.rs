// src/codecs/data_url.rs
//
// Base64 text boundary: bare base64 bodies and `data:<mime>;base64,<body>` URLs.

use crate::error::{ConvertError, Result};
use base64::{engine::general_purpose, Engine as _};

/// Media type reported when the input carries none.
pub const DEFAULT_MEDIA_TYPE: &str = "image/png";

const DATA_URL_SCHEME: &str = "data:";
const BARE_BODY_PREFIX: &str = "base64,";

/// Bytes recovered from base64 text, with the media type the text declared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedPayload {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

/// Encode bytes as base64. With a media type, produces a full data URL.
pub fn encode(bytes: &[u8], media_type: Option<&str>) -> String {
    let body = general_purpose::STANDARD.encode(bytes);
    match media_type {
        Some(mime) => format!("{DATA_URL_SCHEME}{mime};base64,{body}"),
        None => body,
    }
}

/// Decode a bare base64 body or a data URL.
///
/// The media type comes from the data URL header (`data:<mime>;...`) and
/// defaults to `image/png` when the header has none or the input is bare.
pub fn decode(text: &str) -> Result<DecodedPayload> {
    let normalized = text.trim();

    if let Some(rest) = normalized.strip_prefix(DATA_URL_SCHEME) {
        // Base64 never contains ',', so the last comma always starts the body
        // even when the media type itself contains one.
        let comma = rest
            .rfind(',')
            .ok_or_else(ConvertError::missing_data_url_body)?;
        let (header, body) = (&rest[..comma], &rest[comma + 1..]);
        let media_type = parse_media_type(header);
        let bytes = decode_body(body)?;
        return Ok(DecodedPayload { bytes, media_type });
    }

    let body = normalized
        .strip_prefix(BARE_BODY_PREFIX)
        .unwrap_or(normalized);
    Ok(DecodedPayload {
        bytes: decode_body(body)?,
        media_type: DEFAULT_MEDIA_TYPE.to_string(),
    })
}

/// `<mime>;base64` -> `<mime>`; anything without a `;`-terminated, non-empty
/// media type falls back to the default.
fn parse_media_type(header: &str) -> String {
    match header.split_once(';') {
        Some((mime, _)) if !mime.is_empty() => mime.to_string(),
        _ => DEFAULT_MEDIA_TYPE.to_string(),
    }
}

/// ASCII whitespace inside the body (line-wrapped base64) is skipped.
fn decode_body(body: &str) -> Result<Vec<u8>> {
    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| ConvertError::malformed_base64(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn encode_bare_and_data_url() {
        assert_eq!(encode(b"hi", None), "aGk=");
        assert_eq!(
            encode(b"hi", Some("image/webp")),
            "data:image/webp;base64,aGk="
        );
        assert_eq!(encode(&[], None), "");
    }

    #[test]
    fn decode_data_url_reports_media_type() {
        let payload = decode("data:image/jpeg;base64,aGk=").unwrap();
        assert_eq!(payload.bytes, b"hi");
        assert_eq!(payload.media_type, "image/jpeg");
    }

    #[test]
    fn decode_bare_defaults_to_png() {
        let payload = decode("aGk=").unwrap();
        assert_eq!(payload.bytes, b"hi");
        assert_eq!(payload.media_type, "image/png");
    }

    #[test]
    fn decode_strips_stray_base64_prefix() {
        let payload = decode("base64,aGk=").unwrap();
        assert_eq!(payload.bytes, b"hi");
        assert_eq!(payload.media_type, DEFAULT_MEDIA_TYPE);
    }

    #[test]
    fn decode_header_without_media_type_defaults() {
        assert_eq!(decode("data:;base64,aGk=").unwrap().media_type, "image/png");
        assert_eq!(decode("data:image/gif,aGk=").unwrap().media_type, "image/png");
    }

    #[test]
    fn decode_empty_body_is_empty_bytes() {
        let payload = decode("data:image/png;base64,").unwrap();
        assert!(payload.bytes.is_empty());
    }

    #[test]
    fn decode_rejects_foreign_characters() {
        let err = decode("aGk*").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn decode_rejects_bad_padding() {
        let err = decode("aGk").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(decode("aGk==").is_err());
    }

    #[test]
    fn decode_accepts_line_wrapped_body() {
        let bytes: Vec<u8> = (0..=255u8).collect();
        let flat = general_purpose::STANDARD.encode(&bytes);
        let wrapped = flat
            .as_bytes()
            .chunks(76)
            .map(|line| std::str::from_utf8(line).unwrap())
            .collect::<Vec<_>>()
            .join("\r\n");
        let payload = decode(&format!("data:image/png;base64,{wrapped}")).unwrap();
        assert_eq!(payload.bytes, bytes);
        assert_eq!(decode("aG\tk =").unwrap().bytes, b"hi");
    }

    #[test]
    fn decode_rejects_data_url_without_body() {
        let err = decode("data:image/png;base64").unwrap_err();
        assert_eq!(err, ConvertError::MissingDataUrlBody);
    }

    #[test]
    fn round_trip_with_awkward_media_type() {
        let bytes = vec![0u8, 255, 10, 44, 59];
        let text = encode(&bytes, Some("a,b;c"));
        let payload = decode(&text).unwrap();
        assert_eq!(payload.bytes, bytes);
        assert_eq!(payload.media_type, "a,b");
    }
}
