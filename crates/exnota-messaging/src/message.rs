//! Message contracts.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use exnota_core::result::ErrorTag;

/// A named request/response contract shared by both contexts.
///
/// `Output` must serialize to a JSON object (or unit); it is flattened next
/// to the `status` field on the wire.
pub trait Message: Send + Sync + 'static {
    /// `namespace.operation`
    const NAME: &'static str;
    type Input: Serialize + DeserializeOwned + Send + 'static;
    type Output: Serialize + DeserializeOwned + Send + 'static;
    type Error: ErrorTag;
}

/// A request as it travels to the background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub name: String,
    #[serde(default)]
    pub data: Value,
}

impl Request {
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}
