pub mod collection;
pub mod entity;
pub mod format;
pub mod keys;
pub mod marshaller;
pub mod schema;

pub use crate::domain::model::{Map, Projection};
pub use crate::domain::ports::{Entity, TransferObject};
pub use crate::utils::error::Result;
