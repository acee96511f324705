//! Resource id (de)serialization.
//!
//! The service emits ids either as JSON numbers or as strings depending on the
//! resource; both are held as `String` on this side.

use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

/// Serialize an optional id (pair with `skip_serializing_if = "Option::is_none"`).
pub fn serialize<S>(id: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match id {
        Some(id) => serializer.serialize_str(id),
        None => serializer.serialize_none(),
    }
}

/// Deserialize an optional id given as a string or a number.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

/// Same convention for ids that must be present.
pub mod required {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::RawId;

    pub fn serialize<S>(id: &str, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(id)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(RawId::deserialize(deserializer)?.into())
    }
}
