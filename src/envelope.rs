//! Decode backend envelopes whose payloads may be JSON-encoded strings
//!
//! The explorer API is inconsistent about encoding. `/blocks` answers with
//!   {"blocks": "[\"{\\\"number\\\":1,...}\"]"}
//! (a string holding an array of strings holding objects), `/txs_pool` with an
//! array of strings, and `/block/{id}` with a real object whose `txs` are strings.
//!
//! Everything here funnels through one primitive, [`decode_if_string`], which
//! parses a string exactly once and passes structured values through untouched.
use crate::error::DecodeError;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub(crate) const NULL_PAYLOAD: &str = "payload is null";

/// Successfully decoded items of a list plus one error per element that failed.
///
/// Items keep the order of the input list.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch<T> {
    pub items: Vec<T>,
    pub errors: Vec<DecodeError>,
}

impl<T> Batch<T> {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of elements the backend sent, decoded or not
    pub fn total(&self) -> usize {
        self.items.len() + self.errors.len()
    }
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// Parse `value` once if it is a string, otherwise return it as-is
///
/// Strings nested inside the parsed result are left alone, so a payload is
/// never decoded twice.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use bfsx::envelope::decode_if_string;
/// let v = decode_if_string(json!("{\"hash\":\"0xabc\"}")).unwrap();
/// assert_eq!(v, json!({"hash": "0xabc"}));
/// let same = decode_if_string(json!({"hash": "0xabc"})).unwrap();
/// assert_eq!(same, json!({"hash": "0xabc"}));
/// ```
pub fn decode_if_string(value: Value) -> Result<Value, DecodeError> {
    match value {
        Value::String(raw) => serde_json::from_str::<Value>(raw.trim())
            .map_err(|e| DecodeError::new(format!("inner payload is not json: {e}"), raw)),
        other => Ok(other),
    }
}

/// Decode a single record that may arrive encoded as a string
pub fn decode_record<T: DeserializeOwned>(value: Value) -> Result<T, DecodeError> {
    let inner = decode_if_string(value)?;
    if inner.is_null() {
        return Err(DecodeError::new(NULL_PAYLOAD, "null"));
    }
    let fragment = inner.to_string();
    serde_json::from_value(inner).map_err(|e| DecodeError::new(e.to_string(), fragment))
}

/// Decode a list whose container and elements may each be string-encoded
///
/// A corrupt element becomes one entry in `errors`; its siblings still decode.
/// Only a container that is not a list at all fails the whole call.
pub fn decode_list<T: DeserializeOwned>(value: Value) -> Result<Batch<T>, DecodeError> {
    let container = decode_if_string(value)?;
    let elements = match container {
        Value::Array(elements) => elements,
        other => {
            return Err(DecodeError::new("expected a list", other.to_string()));
        }
    };

    let mut batch = Batch {
        items: Vec::with_capacity(elements.len()),
        errors: Vec::new(),
    };
    for (index, element) in elements.into_iter().enumerate() {
        match decode_record::<T>(element) {
            Ok(item) => batch.items.push(item),
            Err(e) => batch.errors.push(e.at(index)),
        }
    }
    Ok(batch)
}

/// Pull a named field out of a response body
pub fn envelope_field(body: Value, name: &str) -> Result<Value, DecodeError> {
    match body {
        Value::Object(mut map) => match map.remove(name) {
            Some(field) => Ok(field),
            None => Err(DecodeError::new(
                format!("missing field `{name}`"),
                Value::Object(map).to_string(),
            )),
        },
        other => Err(DecodeError::new(
            format!("expected an object with field `{name}`"),
            other.to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
    }

    #[test]
    fn test_string_is_decoded_once() {
        // The inner `msg` stays a string: one pass only
        let input = json!("{\"msg\":\"{\\\"deep\\\":1}\"}");
        let output = decode_if_string(input).unwrap();
        assert_eq!(output, json!({"msg": "{\"deep\":1}"}));
    }

    #[test]
    fn test_structured_values_pass_through() {
        assert_eq!(decode_if_string(json!([1, 2])).unwrap(), json!([1, 2]));
        assert_eq!(decode_if_string(json!(7)).unwrap(), json!(7));
        assert_eq!(decode_if_string(json!(null)).unwrap(), json!(null));
    }

    #[test]
    fn test_invalid_string_keeps_fragment() {
        let err = decode_if_string(json!("{not json")).unwrap_err();
        assert_eq!(err.fragment, "{not json");
        assert_eq!(err.index, None);
    }

    #[test]
    fn test_list_of_encoded_strings() {
        let input = json!(["{\"id\":1}", "{\"id\":2}"]);
        let batch: Batch<Item> = decode_list(input).unwrap();
        assert_eq!(batch.items, vec![Item { id: 1 }, Item { id: 2 }]);
        assert!(batch.is_clean());
    }

    #[test]
    fn test_list_mixing_strings_and_objects() {
        let input = json!(["{\"id\":1}", {"id": 2}]);
        let batch: Batch<Item> = decode_list(input).unwrap();
        assert_eq!(batch.items, vec![Item { id: 1 }, Item { id: 2 }]);
    }

    #[test]
    fn test_encoded_container_of_encoded_elements() {
        let input = json!("[\"{\\\"id\\\":5}\"]");
        let batch: Batch<Item> = decode_list(input).unwrap();
        assert_eq!(batch.items, vec![Item { id: 5 }]);
    }

    #[test]
    fn test_one_corrupt_element_does_not_blank_siblings() {
        let input = json!(["{\"id\":1}", "{broken", "{\"id\":3}", {"nope": true}]);
        let batch: Batch<Item> = decode_list(input).unwrap();
        assert_eq!(batch.items, vec![Item { id: 1 }, Item { id: 3 }]);
        assert_eq!(batch.errors.len(), 2);
        assert_eq!(batch.errors[0].index, Some(1));
        assert_eq!(batch.errors[0].fragment, "{broken");
        assert_eq!(batch.errors[1].index, Some(3));
        assert_eq!(batch.total(), 4);
    }

    #[test]
    fn test_non_list_container_fails() {
        let err = decode_list::<Item>(json!({"id": 1})).unwrap_err();
        assert!(err.reason.contains("expected a list"));
    }

    #[test]
    fn test_null_record_is_an_error() {
        assert!(decode_record::<Item>(json!(null)).is_err());
        assert!(decode_record::<Item>(json!("null")).is_err());
    }

    #[test]
    fn test_envelope_field() {
        let body = json!({"tx": "{\"id\":9}", "other": 1});
        let field = envelope_field(body, "tx").unwrap();
        assert_eq!(decode_record::<Item>(field).unwrap(), Item { id: 9 });

        let err = envelope_field(json!({"other": 1}), "tx").unwrap_err();
        assert!(err.reason.contains("`tx`"));
        assert!(envelope_field(json!([1]), "tx").is_err());
    }
}
