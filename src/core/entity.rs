//! Projection of transfer objects onto entities.
//!
//! The transfer object side produces a [`Projection`] tree of its non-null
//! fields; the entity side declares which of those names it accepts and how
//! to assign them. Nested targets come from the entity's own declaration.

use crate::core::keys::json_type;
use crate::core::schema::{cached, short_type_name};
use crate::domain::model::Projection;
use crate::domain::ports::{Entity, TransferObject};
use crate::utils::date::{self, DateValue};
use crate::utils::error::{MarshalError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityFieldKind {
    Leaf,
    DateTime,
    Nested { type_name: &'static str },
    ReadOnly,
}

type AssignFn<E> = Box<dyn Fn(&mut E, Projection) -> Result<()> + Send + Sync>;

pub struct EntityField<E> {
    name: String,
    kind: EntityFieldKind,
    assign: Option<AssignFn<E>>,
}

impl<E> EntityField<E> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &EntityFieldKind {
        &self.kind
    }

    pub fn is_writable(&self) -> bool {
        self.assign.is_some()
    }
}

pub struct EntitySchema<E> {
    type_name: &'static str,
    fields: Vec<EntityField<E>>,
}

impl<E> EntitySchema<E> {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[EntityField<E>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&EntityField<E>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Writes every projected value that has a writable counterpart on `entity`.
    pub fn apply(&self, entity: &mut E, projection: Vec<(String, Projection)>) -> Result<()> {
        for (name, projected) in projection {
            match self.field(&name).and_then(|f| f.assign.as_ref()) {
                Some(assign) => assign(entity, projected)?,
                None => tracing::trace!("{}: no writable field '{}', skipped", self.type_name, name),
            }
        }
        Ok(())
    }
}

impl<E> fmt::Debug for EntitySchema<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitySchema")
            .field("type_name", &self.type_name)
            .field(
                "fields",
                &self.fields.iter().map(|x| (&x.name, &x.kind)).collect::<Vec<_>>(),
            )
            .finish()
    }
}

pub struct EntitySchemaBuilder<E> {
    type_name: &'static str,
    fields: Vec<EntityField<E>>,
}

impl<E: 'static> EntitySchemaBuilder<E> {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            fields: Vec::new(),
        }
    }

    /// Plain value. Dates arriving here are handed over as RFC3339 strings.
    pub fn field<V, S>(self, name: &str, set: S) -> Self
    where
        V: DeserializeOwned + 'static,
        S: Fn(&mut E, V) + Send + Sync + 'static,
    {
        let field = name.to_string();
        let type_name = self.type_name;
        let assign: AssignFn<E> = Box::new(move |entity: &mut E, projected: Projection| -> Result<()> {
            let value = match projected {
                Projection::Value(value) => value,
                Projection::Date(dt) => Value::String(date::encode(&dt)),
                Projection::Object(_) => {
                    return Err(MarshalError::FieldResolution {
                        type_name: type_name.to_string(),
                        field: field.clone(),
                        reason: "nested transfer object has no nested entity target".to_string(),
                    })
                }
            };
            let decoded: V = serde_json::from_value(value).map_err(|e| MarshalError::TypeMismatch {
                field: field.clone(),
                message: e.to_string(),
            })?;
            set(entity, decoded);
            Ok(())
        });

        self.push(name, EntityFieldKind::Leaf, Some(assign))
    }

    pub fn date<D, S>(self, name: &str, set: S) -> Self
    where
        D: DateValue + 'static,
        S: Fn(&mut E, D) + Send + Sync + 'static,
    {
        let field = name.to_string();
        let assign: AssignFn<E> = Box::new(move |entity: &mut E, projected: Projection| -> Result<()> {
            let fixed = match projected {
                Projection::Date(dt) => dt,
                Projection::Value(Value::String(literal)) => date::decode(&literal)?,
                Projection::Value(other) => {
                    return Err(MarshalError::TypeMismatch {
                        field: field.clone(),
                        message: format!("expected a date-time, got {}", json_type(&other)),
                    })
                }
                Projection::Object(_) => {
                    return Err(MarshalError::TypeMismatch {
                        field: field.clone(),
                        message: "expected a date-time, got a nested object".to_string(),
                    })
                }
            };
            set(entity, D::from_fixed(fixed));
            Ok(())
        });

        self.push(name, EntityFieldKind::DateTime, Some(assign))
    }

    /// Nested entity, default-constructed and filled from the nested projection.
    pub fn nested<N, S>(self, name: &str, set: S) -> Self
    where
        N: Entity + Default,
        S: Fn(&mut E, N) + Send + Sync + 'static,
    {
        let field = name.to_string();
        let nested_type = std::any::type_name::<N>();
        let assign: AssignFn<E> = Box::new(move |entity: &mut E, projected: Projection| -> Result<()> {
            match projected {
                Projection::Object(fields) => {
                    let mut nested = N::default();
                    N::schema()?.apply(&mut nested, fields)?;
                    set(entity, nested);
                    Ok(())
                }
                _ => Err(MarshalError::TypeMismatch {
                    field: field.clone(),
                    message: format!("expected a nested object for {}", nested_type),
                }),
            }
        });

        self.push(
            name,
            EntityFieldKind::Nested {
                type_name: nested_type,
            },
            Some(assign),
        )
    }

    /// Declared but not writable; values for it are skipped.
    pub fn readonly(self, name: &str) -> Self {
        self.push(name, EntityFieldKind::ReadOnly, None)
    }

    pub fn build(self) -> Result<EntitySchema<E>> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            let reason = if field.name.is_empty() {
                Some("field name is empty")
            } else if !seen.insert(field.name.as_str()) {
                Some("field is declared more than once")
            } else {
                None
            };

            if let Some(reason) = reason {
                return Err(MarshalError::FieldResolution {
                    type_name: self.type_name.to_string(),
                    field: field.name.clone(),
                    reason: reason.to_string(),
                });
            }
        }

        tracing::debug!(
            "Resolved entity schema for {} with {} fields",
            self.type_name,
            self.fields.len()
        );

        Ok(EntitySchema {
            type_name: self.type_name,
            fields: self.fields,
        })
    }

    fn push(mut self, name: &str, kind: EntityFieldKind, assign: Option<AssignFn<E>>) -> Self {
        self.fields.push(EntityField {
            name: name.to_string(),
            kind,
            assign,
        });
        self
    }
}

pub fn resolve<E: Entity>() -> Result<Arc<EntitySchema<E>>> {
    cached(|| E::describe(EntitySchemaBuilder::new(short_type_name::<E>())).build())
}

type FactoryFn = Box<dyn Fn(Vec<(String, Projection)>) -> Result<Box<dyn Any + Send>> + Send + Sync>;

/// Entity constructors addressable by name.
#[derive(Default)]
pub struct EntityRegistry {
    factories: HashMap<String, FactoryFn>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<E>(&mut self, name: &str) -> &mut Self
    where
        E: Entity + Default + Send,
    {
        let factory: FactoryFn = Box::new(|projection: Vec<(String, Projection)>| -> Result<Box<dyn Any + Send>> {
            let mut entity = E::default();
            E::schema()?.apply(&mut entity, projection)?;
            Ok(Box::new(entity) as Box<dyn Any + Send>)
        });
        self.factories.insert(name.to_string(), factory);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("names", &self.names())
            .finish()
    }
}

pub fn to_entity<T, E>(dto: &T) -> Result<E>
where
    T: TransferObject,
    E: Entity + Default,
{
    let mut entity = E::default();
    to_entity_into(dto, &mut entity)?;
    Ok(entity)
}

/// Projects onto an existing instance; fields the source leaves null keep their current value.
pub fn to_entity_into<T, E>(dto: &T, entity: &mut E) -> Result<()>
where
    T: TransferObject,
    E: Entity,
{
    let projection = dto.projection()?;
    E::schema()?.apply(entity, projection)
}

/// Looks `name` up before anything is constructed.
pub fn to_entity_named<T: TransferObject>(
    dto: &T,
    registry: &EntityRegistry,
    name: &str,
) -> Result<Box<dyn Any + Send>> {
    let factory = registry
        .factories
        .get(name)
        .ok_or_else(|| MarshalError::EntityNotFound {
            name: name.to_string(),
        })?;
    factory(dto.projection()?)
}
