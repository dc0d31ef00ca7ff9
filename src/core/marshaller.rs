use crate::core::keys::{self, json_type};
use crate::core::schema::FieldKind;
use crate::domain::model::{Map, Projection};
use crate::domain::ports::TransferObject;
use crate::utils::error::{MarshalError, Result};
use crate::utils::naming::{self, KeyCase};
use serde_json::Value;

pub fn to_array<T: TransferObject>(dto: &T) -> Result<Map> {
    to_map(dto, None)
}

/// Like [`to_array`] with every key, nested ones included, rewritten into `case`.
pub fn to_cased_array<T: TransferObject>(dto: &T, case: KeyCase) -> Result<Map> {
    to_map(dto, Some(case))
}

pub fn to_snake_case_array<T: TransferObject>(dto: &T) -> Result<Map> {
    to_cased_array(dto, KeyCase::Snake)
}

pub fn to_json<T: TransferObject>(dto: &T) -> Result<String> {
    Ok(serde_json::to_string(&to_array(dto)?)?)
}

pub fn to_snake_case_json<T: TransferObject>(dto: &T) -> Result<String> {
    Ok(serde_json::to_string(&to_snake_case_array(dto)?)?)
}

pub(crate) fn to_map<T: TransferObject>(dto: &T, case: Option<KeyCase>) -> Result<Map> {
    let schema = T::schema()?;
    tracing::debug!("Marshalling {} ({:?})", schema.type_name(), case);
    let mut out = Map::with_capacity(schema.len());

    for field in schema.fields() {
        let key = match case {
            Some(case) => case.apply(field.name()),
            None => field.name().to_string(),
        };
        out.insert(key, field.read(dto, case)?);
    }

    Ok(out)
}

/// Builds a fresh `T` from an external map.
///
/// Keys may be snake_case or camelCase at any depth. Absent fields keep
/// their `Default` value; unknown keys are ignored.
pub fn from_array<T: TransferObject>(input: Map) -> Result<T> {
    let schema = T::schema()?;
    let mut instance = T::default();
    tracing::debug!("Building {} from {} keys", schema.type_name(), input.len());

    // 同名 key 轉換後重複時，以後出現的為準
    let mut renamed = Map::with_capacity(input.len());
    for (key, value) in input {
        renamed.insert(naming::to_camel(&key), value);
    }

    for field in schema.fields() {
        let Some(value) = renamed.remove(field.name()) else {
            tracing::trace!("{}: '{}' absent from input", schema.type_name(), field.name());
            continue;
        };

        // nested / collection 交給遞迴呼叫處理，opaque 保留原樣
        let value = match field.kind() {
            FieldKind::Leaf => keys::rename_keys(value, KeyCase::Camel),
            _ => value,
        };

        if !field.write(&mut instance, value)? {
            tracing::trace!("{}: '{}' is not writable, skipped", schema.type_name(), field.name());
        }
    }

    if !renamed.is_empty() {
        tracing::trace!(
            "{}: ignored unknown keys {:?}",
            schema.type_name(),
            renamed.keys().collect::<Vec<_>>()
        );
    }

    Ok(instance)
}

pub fn from_value<T: TransferObject>(value: Value) -> Result<T> {
    match value {
        Value::Object(map) => from_array(map),
        other => Err(MarshalError::MalformedPayload {
            message: format!("expected a JSON object, got {}", json_type(&other)),
        }),
    }
}

pub fn from_json<T: TransferObject>(json: &str) -> Result<T> {
    let value: Value = serde_json::from_str(json).map_err(|e| MarshalError::MalformedPayload {
        message: e.to_string(),
    })?;
    from_value(value)
}

/// Non-null fields in declaration order, nested transfer objects kept as sub-trees.
pub fn projection<T: TransferObject>(dto: &T) -> Result<Vec<(String, Projection)>> {
    let schema = T::schema()?;
    let mut out = Vec::with_capacity(schema.len());

    for field in schema.fields() {
        match field.project(dto)? {
            Some(projected) => out.push((field.name().to_string(), projected)),
            None => tracing::trace!("{}: '{}' is null, not projected", schema.type_name(), field.name()),
        }
    }

    Ok(out)
}
