//! URL-safe Base64 and path segment encoding.

use crate::error::{CodecError, CodecResult};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

/// URL-safe alphabet, unpadded on encode, padding optional on decode.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encodes bytes with the URL and filename safe Base64 alphabet.
///
/// The output never contains `+`, `/` or `=`, so it can be embedded in a
/// REST path segment or a file name as-is.
#[must_use]
pub fn url_safe_encode(bytes: &[u8]) -> String {
    URL_SAFE_LENIENT.encode(bytes)
}

/// Decodes a URL-safe Base64 string produced by [`url_safe_encode`].
///
/// Trailing `=` padding is accepted but not required.
pub fn url_safe_decode(encoded: &str) -> CodecResult<Vec<u8>> {
    URL_SAFE_LENIENT
        .decode(encoded.as_bytes())
        .map_err(|e| CodecError::invalid_encoding(e.to_string()))
}

/// Encodes UTF-8 text with the URL-safe alphabet.
#[must_use]
pub fn encode_str(text: &str) -> String {
    url_safe_encode(text.as_bytes())
}

/// Decodes URL-safe Base64 back into UTF-8 text.
pub fn decode_str(encoded: &str) -> CodecResult<String> {
    let bytes = url_safe_decode(encoded)?;
    String::from_utf8(bytes)
        .map_err(|_| CodecError::InvalidUtf8)
}

/// Encodes bytes with the standard padded Base64 alphabet.
///
/// Identity derivation starts from this form and then substitutes the
/// characters that are unsafe in a URL path.
#[must_use]
pub fn standard_encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Percent-encodes an opaque identifier so it occupies exactly one path
/// segment.
#[must_use]
pub fn encode_path_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_roundtrip() {
        assert_eq!(url_safe_encode(&[]), "");
        assert!(url_safe_decode("").unwrap().is_empty());
    }

    #[test]
    fn single_byte_roundtrip() {
        let encoded = url_safe_encode(&[0xfb]);
        assert_eq!(encoded, "-w");
        assert_eq!(url_safe_decode(&encoded).unwrap(), vec![0xfb]);
    }

    #[test]
    fn multi_kilobyte_roundtrip() {
        let bytes: Vec<u8> = (0..8192u32).map(|i| (i * 31 % 256) as u8).collect();
        let encoded = url_safe_encode(&bytes);
        assert!(!encoded.contains(['+', '/', '=']));
        assert_eq!(url_safe_decode(&encoded).unwrap(), bytes);
    }

    #[test]
    fn decode_accepts_padding() {
        assert_eq!(url_safe_decode("-w==").unwrap(), vec![0xfb]);
    }

    #[test]
    fn decode_rejects_standard_alphabet() {
        let err = url_safe_decode("+w").unwrap_err();
        assert!(matches!(err, CodecError::InvalidEncoding { .. }));
    }

    #[test]
    fn string_helpers() {
        let encoded = encode_str("C:/proj/model.ext");
        assert_eq!(decode_str(&encoded).unwrap(), "C:/proj/model.ext");
    }

    #[test]
    fn decode_str_rejects_invalid_utf8() {
        let encoded = url_safe_encode(&[0xff, 0xfe]);
        assert_eq!(decode_str(&encoded), Err(CodecError::InvalidUtf8));
    }

    #[test]
    fn standard_keeps_padding() {
        assert_eq!(standard_encode(&[0xfb, 0xff]), "+/8=");
    }

    #[test]
    fn path_segment_escapes_reserved() {
        assert_eq!(encode_path_segment("a/b c"), "a%2Fb%20c");
        assert_eq!(
            encode_path_segment("60f91daf-3dd7-4283-a86d-24137b73f3da-0001fd0b"),
            "60f91daf-3dd7-4283-a86d-24137b73f3da-0001fd0b"
        );
    }

    proptest! {
        #[test]
        fn roundtrip_any_bytes(bytes in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let encoded = url_safe_encode(&bytes);
            prop_assert_eq!(url_safe_decode(&encoded).unwrap(), bytes);
        }
    }
}
