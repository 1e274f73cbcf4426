//! Serde helpers for the JSON proposal wire format.
//!
//! Field names and value shapes are carried verbatim across the MCMS tools;
//! the helpers here cover the shapes serde does not produce on its own.

/// Serializes a `U256` as a base-10 string, the form proposal files carry
/// for operation values.
pub mod u256_decimal {
    use alloy_primitives::U256;
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Serializes `value` as its decimal string representation.
    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    /// Deserializes a decimal string into a `U256`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<U256>().map_err(de::Error::custom)
    }
}
