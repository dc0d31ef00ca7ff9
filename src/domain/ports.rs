use crate::core::entity::{self, EntityRegistry, EntitySchema, EntitySchemaBuilder};
use crate::core::format::{self, FormatOptions};
use crate::core::marshaller;
use crate::core::schema::{self, Schema, SchemaBuilder};
use crate::domain::model::{Map, Projection};
use crate::utils::error::Result;
use crate::utils::naming::KeyCase;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A plain record that crosses a boundary as a map or JSON text.
///
/// Implementors only declare their fields once in [`TransferObject::describe`];
/// every marshalling operation is provided on top of that declaration.
///
/// ```
/// use dto_marshal::{SchemaBuilder, TransferObject};
///
/// #[derive(Debug, Default)]
/// struct UserDto {
///     name: String,
///     age: u32,
/// }
///
/// impl TransferObject for UserDto {
///     fn describe(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
///         schema
///             .field("name", |u: &Self| &u.name, |u, v| u.name = v)
///             .field("age", |u: &Self| &u.age, |u, v| u.age = v)
///     }
/// }
///
/// let user = UserDto::from_json(r#"{"name":"John","age":30}"#).unwrap();
/// assert_eq!(user.age, 30);
/// assert_eq!(user.to_json().unwrap(), r#"{"name":"John","age":30}"#);
/// ```
pub trait TransferObject: Default + 'static {
    fn describe(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self>;

    fn schema() -> Result<Arc<Schema<Self>>> {
        schema::resolve::<Self>()
    }

    /// Field name to value, in declaration order.
    fn to_array(&self) -> Result<Map> {
        marshaller::to_array(self)
    }

    fn to_cased_array(&self, case: KeyCase) -> Result<Map> {
        marshaller::to_cased_array(self, case)
    }

    fn to_snake_case_array(&self) -> Result<Map> {
        marshaller::to_snake_case_array(self)
    }

    fn to_json(&self) -> Result<String> {
        marshaller::to_json(self)
    }

    fn to_snake_case_json(&self) -> Result<String> {
        marshaller::to_snake_case_json(self)
    }

    fn from_array(map: Map) -> Result<Self> {
        marshaller::from_array(map)
    }

    fn from_value(value: Value) -> Result<Self> {
        marshaller::from_value(value)
    }

    fn from_json(json: &str) -> Result<Self> {
        marshaller::from_json(json)
    }

    fn projection(&self) -> Result<Vec<(String, Projection)>> {
        marshaller::projection(self)
    }

    fn to_entity<E: Entity + Default>(&self) -> Result<E> {
        entity::to_entity(self)
    }

    fn to_entity_into<E: Entity>(&self, target: &mut E) -> Result<()> {
        entity::to_entity_into(self, target)
    }

    fn to_entity_named(&self, registry: &EntityRegistry, name: &str) -> Result<Box<dyn Any + Send>> {
        entity::to_entity_named(self, registry, name)
    }

    fn format(&self, template: &str, options: &FormatOptions) -> Result<String> {
        format::format(self, template, options)
    }

    fn format_lines(&self, queries: &[&str], options: &FormatOptions) -> Result<String> {
        format::format_lines(self, queries, options)
    }

    /// `Display` adapter printing [`TransferObject::to_json`].
    fn display(&self) -> JsonDisplay<'_, Self> {
        JsonDisplay(self)
    }
}

/// Renders a transfer object as its camelCase JSON text.
///
/// Marshalling failures surface as `fmt::Error`; call `to_json` directly
/// when the error itself matters.
pub struct JsonDisplay<'a, T>(&'a T);

impl<T: TransferObject> fmt::Display for JsonDisplay<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.0.to_json().map_err(|e| {
            tracing::warn!("Cannot display transfer object: {}", e);
            fmt::Error
        })?;
        f.write_str(&json)
    }
}

/// An externally owned type that transfer objects can be projected onto.
pub trait Entity: Sized + 'static {
    fn describe(schema: EntitySchemaBuilder<Self>) -> EntitySchemaBuilder<Self>;

    fn schema() -> Result<Arc<EntitySchema<Self>>> {
        entity::resolve::<Self>()
    }
}
