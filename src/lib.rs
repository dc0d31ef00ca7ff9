pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::core::collection::{CollectionKey, Criteria, Order, TransferObjectCollection};
pub use crate::core::entity::{EntityRegistry, EntitySchema, EntitySchemaBuilder};
pub use crate::core::format::FormatOptions;
pub use crate::core::schema::{inspect, FieldInfo, FieldKind, Schema, SchemaBuilder};
pub use crate::domain::model::{Map, Projection};
pub use crate::domain::ports::{Entity, JsonDisplay, TransferObject};
pub use crate::utils::error::{MarshalError, Result};
pub use crate::utils::naming::KeyCase;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::MarshalConfig;
