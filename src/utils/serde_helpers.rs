use serde::{Deserialize, Deserializer, Serializer};
use serde::de::Error as DeError;

/// Serialize bytes as a `0x`-prefixed hex string
pub fn as_hex<S>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&format!("0x{}", hex::encode(bytes)))
}

/// Option variants for config fields that may be absent
pub mod opt_hex {
    use super::*;

    pub fn serialize<S>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match bytes {
            Some(b) => as_hex(b, s),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(d)?;
        s.map(|s| decode_hex(&s).map_err(D::Error::custom)).transpose()
    }
}

pub fn decode_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let s = s.trim();
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
}
