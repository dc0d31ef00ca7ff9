use chrono::{DateTime, FixedOffset};
use serde_json::Value;

/// External representation of a transfer object: string keys to JSON values.
pub type Map = serde_json::Map<String, Value>;

/// Non-null field values of a transfer object, on their way to an entity.
///
/// Nested transfer objects keep their structure so the entity side can pick
/// its own nested target type for each `Object`.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Value(Value),
    Date(DateTime<FixedOffset>),
    Object(Vec<(String, Projection)>),
}
