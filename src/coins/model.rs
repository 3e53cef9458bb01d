use serde::{Deserialize, Serialize};

/// A coin in the collection.
///
/// Serialized in camelCase (`coinName`, `faceValue`). Only `coinName` is
/// required when decoding; `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub coin_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Coin {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            coin_name: name.into(),
            country: None,
            year: None,
            face_value: None,
            material: None,
            condition: None,
        }
    }
}
