//! # FireRating Codec
//!
//! URL-safe encoding helpers for FireRating sync.
//!
//! Remote documents are addressed by opaque identifiers embedded in REST
//! path segments. This crate provides:
//! - Lossless URL-safe Base64 for arbitrary bytes
//! - UTF-8 string helpers on top of it
//! - Percent-encoding of a single path segment
//!
//! ## Usage
//!
//! ```
//! use firerating_codec::{url_safe_decode, url_safe_encode};
//!
//! let token = url_safe_encode(&[0xfb, 0xff, 0x01]);
//! assert!(!token.contains('/'));
//! assert_eq!(url_safe_decode(&token).unwrap(), vec![0xfb, 0xff, 0x01]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod url_safe;

pub use error::{CodecError, CodecResult};
pub use url_safe::{
    decode_str, encode_path_segment, encode_str, standard_encode, url_safe_decode,
    url_safe_encode,
};
