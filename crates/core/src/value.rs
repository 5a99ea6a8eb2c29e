//! Projection of stored strings into typed values
//!
//! The store's representation is textual. Writes go through `Display`;
//! reads come back as `String` and are projected by a decoder. `FromStored`
//! is the default decoder for a type; adapters also accept arbitrary
//! decoder closures.

use crate::error::{Error, Result};
use std::sync::Arc;

/// Decode a stored string into `Self`
pub trait FromStored: Sized {
    /// Project a raw stored value
    fn from_stored(raw: String) -> Result<Self>;
}

impl FromStored for String {
    fn from_stored(raw: String) -> Result<Self> {
        Ok(raw)
    }
}

macro_rules! impl_from_stored_parse {
    ($($t:ty),*) => {
        $(
            impl FromStored for $t {
                fn from_stored(raw: String) -> Result<Self> {
                    raw.parse::<$t>().map_err(|_| Error::Decode {
                        value: raw,
                        target: stringify!($t),
                    })
                }
            }
        )*
    };
}

impl_from_stored_parse!(
    i8, i16, i32, i64, i128, u8, u16, u32, u64, u128, isize, usize, f32, f64, bool, char
);

/// Shared decoder closure
pub type Decoder<T> = Arc<dyn Fn(String) -> Result<T> + Send + Sync>;

/// Decoder that uses `T::from_stored`
pub fn default_decoder<T: FromStored + 'static>() -> Decoder<T> {
    Arc::new(T::from_stored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_is_identity() {
        assert_eq!(String::from_stored("abc".into()).unwrap(), "abc");
    }

    #[test]
    fn test_numeric_decoding() {
        assert_eq!(i64::from_stored("-12".into()).unwrap(), -12);
        assert_eq!(f64::from_stored("2.5".into()).unwrap(), 2.5);
        assert!(bool::from_stored("true".into()).unwrap());
    }

    #[test]
    fn test_decode_failure_carries_value() {
        let err = i64::from_stored("x1".into()).unwrap_err();
        assert!(matches!(err, Error::Decode { ref value, target: "i64" } if value == "x1"));
    }

    #[test]
    fn test_default_decoder() {
        let d = default_decoder::<u32>();
        assert_eq!(d("7".into()).unwrap(), 7);
    }
}
