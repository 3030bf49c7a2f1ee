//! The wire encoding for envelope types.
//!
//! Everything that crosses a link travels as bincode, one value per frame.
//! Dynamic payloads inside an envelope stay JSON; this module only covers
//! the envelope itself.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};

/// Encode a value into its wire form.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| Error::Encoding(e.to_string()))
}

/// Decode a value from its wire form.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| Error::Encoding(e.to_string()))
}
