//! Encode and decode command implementations.

use firerating_codec::{decode_str, encode_str, CodecResult};

/// Runs the encode command.
pub fn encode(text: &str) {
    println!("{}", encode_str(text));
}

/// Runs the decode command.
pub fn decode(token: &str) -> CodecResult<()> {
    println!("{}", decode_str(token)?);
    Ok(())
}
