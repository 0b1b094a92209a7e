//! Wire codec for the ledger's Borsh layout
//!
//! Every byte a signature is computed over goes through this module. The
//! layout rules are the Borsh ones:
//! - unsigned integers are fixed-width little-endian (`u128` is 16 bytes)
//! - vectors and strings carry a `u32` little-endian length prefix
//! - fixed-size arrays carry no prefix
//! - `Option` is a one byte presence flag followed by the payload
//! - tagged unions are a one byte discriminant followed by the variant
//!
//! Tagged unions that are part of the wire contract implement
//! `BorshSerialize`/`BorshDeserialize` by hand against explicit discriminant
//! tables, so that reordering a Rust enum can never change the encoding.

use borsh::io::{Error as IoError, ErrorKind, Read};
use borsh::{BorshDeserialize, BorshSerialize};
use thiserror::Error;

/// Errors raised while encoding or decoding wire data
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WireError {
    /// Input bytes do not describe a valid value of the requested type
    #[error("Malformed wire data for {type_name}: {reason}")]
    MalformedWireData {
        type_name: &'static str,
        reason: String,
    },

    /// Value could not be encoded (e.g. a collection longer than `u32::MAX`)
    #[error("Failed to encode {type_name}: {reason}")]
    Encode {
        type_name: &'static str,
        reason: String,
    },
}

impl WireError {
    pub fn malformed(type_name: &'static str, reason: impl Into<String>) -> Self {
        WireError::MalformedWireData {
            type_name,
            reason: reason.into(),
        }
    }
}

/// Result type for codec operations
pub type WireResult<T> = Result<T, WireError>;

/// Encode a value into its canonical wire bytes
pub fn encode<T: BorshSerialize>(value: &T) -> WireResult<Vec<u8>> {
    borsh::to_vec(value).map_err(|e| WireError::Encode {
        type_name: short_type_name::<T>(),
        reason: e.to_string(),
    })
}

/// Decode a value from wire bytes.
///
/// The whole buffer must be consumed; trailing bytes are rejected just like
/// truncated input.
pub fn decode<T: BorshDeserialize>(bytes: &[u8]) -> WireResult<T> {
    borsh::from_slice::<T>(bytes)
        .map_err(|e| WireError::malformed(short_type_name::<T>(), e.to_string()))
}

/// Read a one byte union discriminant
pub(crate) fn read_tag<R: Read>(reader: &mut R) -> borsh::io::Result<u8> {
    u8::deserialize_reader(reader)
}

/// Build the error returned for an unknown union discriminant
pub(crate) fn unknown_tag(type_name: &str, tag: u8) -> IoError {
    IoError::new(
        ErrorKind::InvalidData,
        format!("unknown {} discriminant {}", type_name, tag),
    )
}

/// Build an `InvalidData` error with a custom message
pub(crate) fn invalid_data(message: impl Into<String>) -> IoError {
    IoError::new(ErrorKind::InvalidData, message.into())
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_u128_is_sixteen_bytes_little_endian() {
        let bytes = encode(&1u128).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(bytes[0], 1);
        assert!(bytes[1..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_string_has_u32_length_prefix() {
        let bytes = encode(&"abc".to_string()).unwrap();
        assert_eq!(bytes, vec![3, 0, 0, 0, b'a', b'b', b'c']);
    }

    #[test]
    fn test_fixed_array_has_no_prefix() {
        let bytes = encode(&[7u8; 32]).unwrap();
        assert_eq!(bytes.len(), 32);
    }

    #[test]
    fn test_option_flag() {
        assert_eq!(encode(&Option::<u8>::None).unwrap(), vec![0]);
        assert_eq!(encode(&Some(9u8)).unwrap(), vec![1, 9]);

        let err = decode::<Option<u8>>(&[2, 9]).unwrap_err();
        assert!(matches!(err, WireError::MalformedWireData { .. }));
    }

    #[test]
    fn test_truncated_and_trailing_input_rejected() {
        assert!(decode::<u64>(&[1, 2, 3]).is_err());
        assert!(decode::<u8>(&[1, 2]).is_err());

        // Length prefix claims more bytes than available
        assert!(decode::<Vec<u8>>(&[5, 0, 0, 0, 1]).is_err());
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let err = decode::<String>(&[2, 0, 0, 0, 0xff, 0xfe]).unwrap_err();
        match err {
            WireError::MalformedWireData { type_name, .. } => assert_eq!(type_name, "String"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn prop_u128_little_endian(value in any::<u128>()) {
            let bytes = encode(&value).unwrap();
            prop_assert_eq!(bytes.as_slice(), &value.to_le_bytes()[..]);
            prop_assert_eq!(decode::<u128>(&bytes).unwrap(), value);
        }

        #[test]
        fn prop_vec_prefix_matches_len(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let bytes = encode(&data).unwrap();
            let prefix = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            prop_assert_eq!(prefix as usize, data.len());
            prop_assert_eq!(bytes.len(), data.len() + 4);
        }
    }
}
