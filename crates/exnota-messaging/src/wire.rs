//! Reply encoding.
//!
//! A success travels as `{"status": "success", ...payload}`, a failure as
//! `{"status": "<tag>"}`. Nothing else is ever put on the wire for a reply.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

use exnota_core::result::{ErrorTag, SUCCESS, UNKNOWN_ERROR};

use crate::error::{CallError, WireError};

const STATUS: &str = "status";

pub fn encode_reply<T, E>(result: &Result<T, E>) -> Result<Value, WireError>
where
    T: Serialize,
    E: ErrorTag,
{
    match result {
        Ok(payload) => {
            let mut map = match serde_json::to_value(payload)? {
                Value::Object(map) => map,
                Value::Null => Map::new(),
                _ => return Err(WireError::NotAnObject),
            };
            if map.contains_key(STATUS) {
                return Err(WireError::ReservedField);
            }
            map.insert(STATUS.to_string(), Value::String(SUCCESS.to_string()));
            Ok(Value::Object(map))
        }
        Err(err) => Ok(json!({ STATUS: err.as_str() })),
    }
}

/// Reply sent when a handler could not produce one of its own.
pub fn internal_fault_reply() -> Value {
    json!({ STATUS: UNKNOWN_ERROR })
}

/// Decode a reply for a message with error tags `E`.
///
/// `unknown-error` decodes as [`CallError::Internal`] unless `E` declares the
/// tag itself.
pub fn decode_reply<T, E>(reply: Value) -> Result<Result<T, CallError<E>>, WireError>
where
    T: DeserializeOwned,
    E: ErrorTag,
{
    let mut map = match reply {
        Value::Object(map) => map,
        _ => return Err(WireError::MissingStatus),
    };
    let status = match map.remove(STATUS) {
        Some(Value::String(status)) => status,
        _ => return Err(WireError::MissingStatus),
    };

    if status == SUCCESS {
        let payload = serde_json::from_value(Value::Object(map))?;
        return Ok(Ok(payload));
    }
    if let Some(err) = E::from_tag(&status) {
        return Ok(Err(CallError::Domain(err)));
    }
    if status == UNKNOWN_ERROR {
        return Ok(Err(CallError::Internal));
    }
    Err(WireError::UnknownTag(status))
}
