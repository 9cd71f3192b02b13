//! Identifier extraction from rendered payloads.

use serde_json::Value;
use sideload_schema::Pk;

use crate::error::{InclusionError, InclusionResult};

/// Collect the identifiers found at `data_path` in a rendered payload.
///
/// Lists are walked element by element. A missing key or a `null` anywhere
/// along the path means the relation is absent and contributes nothing.
///
/// ```rust
/// use serde_json::json;
/// use sideload_core::inclusions::get_pks;
/// use sideload_schema::Pk;
///
/// let payload = json!([
///     {"entries": [{"tags": [1, 2]}, {"tags": [3]}]},
///     {"entries": []},
/// ]);
/// let pks = get_pks(Some(&payload), "entries.tags").unwrap();
/// assert_eq!(pks, vec![Pk::Int(1), Pk::Int(2), Pk::Int(3)]);
/// ```
pub fn get_pks(payload: Option<&Value>, data_path: &str) -> InclusionResult<Vec<Pk>> {
    let mut pks = Vec::new();
    collect(payload, data_path, &mut pks)?;
    Ok(pks)
}

fn collect(payload: Option<&Value>, data_path: &str, out: &mut Vec<Pk>) -> InclusionResult<()> {
    match payload {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Array(items)) => {
            for item in items {
                collect(Some(item), data_path, out)?;
            }
            Ok(())
        }
        Some(Value::Object(map)) => match data_path.split_once('.') {
            Some((first, rest)) => collect(map.get(first), rest, out),
            None => leaf(map.get(data_path), data_path, out),
        },
        Some(other) => Err(InclusionError::invalid_payload(data_path, other)),
    }
}

fn leaf(value: Option<&Value>, key: &str, out: &mut Vec<Pk>) -> InclusionResult<()> {
    match value {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Array(ids)) => {
            for id in ids.iter().filter(|id| !id.is_null()) {
                out.push(Pk::from_json(id).ok_or_else(|| InclusionError::invalid_identifier(key, id))?);
            }
            Ok(())
        }
        Some(id) => {
            out.push(Pk::from_json(id).ok_or_else(|| InclusionError::invalid_identifier(key, id))?);
            Ok(())
        }
    }
}
