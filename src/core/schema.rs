//! Field Inspector.
//!
//! A transfer object declares its fields once through [`SchemaBuilder`]. Each
//! declaration captures typed accessor closures and erases them into a
//! [`FieldDescriptor`], so the marshaller can walk any transfer object without
//! runtime reflection. Built schemas are cached per type and shared read-only.

use crate::core::collection::TransferObjectCollection;
use crate::core::format::scalar_to_string;
use crate::core::keys::{self, json_type};
use crate::core::marshaller;
use crate::domain::model::Projection;
use crate::domain::ports::TransferObject;
use crate::utils::date::{self, DateValue};
use crate::utils::error::{MarshalError, Result};
use crate::utils::naming::{self, KeyCase};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Copied as-is. Keys of map values follow the requested key case.
    Leaf,
    /// Copied as-is. Keys of map values are never renamed.
    Opaque,
    Nested { type_name: &'static str },
    DateTime,
    Collection { element: &'static str },
}

type ReadFn<T> = Box<dyn Fn(&T, Option<KeyCase>) -> Result<Value> + Send + Sync>;
type WriteFn<T> = Box<dyn Fn(&mut T, Value) -> Result<()> + Send + Sync>;
type ProjectFn<T> = Box<dyn Fn(&T) -> Result<Option<Projection>> + Send + Sync>;
type DisplayFn<T> = Box<dyn Fn(&T) -> Result<String> + Send + Sync>;
pub(crate) type GetterFn<T> = Box<dyn Fn(&T) -> String + Send + Sync>;

pub struct FieldDescriptor<T> {
    name: String,
    declared_type: &'static str,
    kind: FieldKind,
    read: ReadFn<T>,
    write: Option<WriteFn<T>>,
    project: ProjectFn<T>,
    display: DisplayFn<T>,
}

impl<T> FieldDescriptor<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// snake_case key used on the wire
    pub fn external_key(&self) -> String {
        naming::to_snake(&self.name)
    }

    pub fn declared_type(&self) -> &'static str {
        self.declared_type
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_nested_transfer_object(&self) -> bool {
        matches!(self.kind, FieldKind::Nested { .. })
    }

    pub fn is_date_time(&self) -> bool {
        self.kind == FieldKind::DateTime
    }

    pub fn is_writable(&self) -> bool {
        self.write.is_some()
    }

    pub fn info(&self) -> FieldInfo {
        FieldInfo {
            name: self.name.clone(),
            external_key: self.external_key(),
            declared_type: self.declared_type,
            kind: self.kind.clone(),
            is_nested_transfer_object: self.is_nested_transfer_object(),
            is_date_time: self.is_date_time(),
            is_writable: self.is_writable(),
        }
    }

    pub(crate) fn read(&self, dto: &T, case: Option<KeyCase>) -> Result<Value> {
        (self.read)(dto, case)
    }

    /// Returns `Ok(false)` when the field has no assignment arm.
    pub(crate) fn write(&self, dto: &mut T, value: Value) -> Result<bool> {
        match &self.write {
            Some(write) => write(dto, value).map(|_| true),
            None => Ok(false),
        }
    }

    pub(crate) fn project(&self, dto: &T) -> Result<Option<Projection>> {
        (self.project)(dto)
    }

    pub(crate) fn display(&self, dto: &T) -> Result<String> {
        (self.display)(dto)
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .field("kind", &self.kind)
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// Read-only summary of a declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub external_key: String,
    pub declared_type: &'static str,
    pub kind: FieldKind,
    pub is_nested_transfer_object: bool,
    pub is_date_time: bool,
    pub is_writable: bool,
}

pub struct Schema<T> {
    type_name: &'static str,
    fields: Vec<FieldDescriptor<T>>,
    getters: Vec<(String, GetterFn<T>)>,
}

impl<T> Schema<T> {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<T>> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub(crate) fn getter(&self, name: &str) -> Option<&GetterFn<T>> {
        self.getters
            .iter()
            .find(|(getter_name, _)| getter_name == name)
            .map(|(_, getter)| getter)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .field("getters", &self.getters.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}

pub struct SchemaBuilder<T> {
    type_name: &'static str,
    fields: Vec<FieldDescriptor<T>>,
    getters: Vec<(String, GetterFn<T>)>,
}

impl<T: 'static> SchemaBuilder<T> {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            fields: Vec::new(),
            getters: Vec::new(),
        }
    }

    /// Leaf value, written back through `set`.
    pub fn field<V, G, S>(self, name: &str, get: G, set: S) -> Self
    where
        V: Serialize + DeserializeOwned + 'static,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.leaf(name, FieldKind::Leaf, get, Some(set))
    }

    /// Leaf value that is marshalled out but never assigned from input.
    pub fn readonly<V, G>(self, name: &str, get: G) -> Self
    where
        V: Serialize + DeserializeOwned + 'static,
        G: Fn(&T) -> &V + Send + Sync + 'static,
    {
        self.leaf(name, FieldKind::Leaf, get, None::<fn(&mut T, V)>)
    }

    /// Leaf map payload whose inner keys are kept exactly as they are.
    pub fn opaque<V, G, S>(self, name: &str, get: G, set: S) -> Self
    where
        V: Serialize + DeserializeOwned + 'static,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.leaf(name, FieldKind::Opaque, get, Some(set))
    }

    pub fn nested<N, G, S>(mut self, name: &str, get: G, set: S) -> Self
    where
        N: TransferObject,
        G: Fn(&T) -> Option<&N> + Send + Sync + 'static,
        S: Fn(&mut T, N) + Send + Sync + 'static,
    {
        let get = Arc::new(get);
        let field = name.to_string();
        let type_name = std::any::type_name::<N>();

        let read: ReadFn<T> = {
            let get = Arc::clone(&get);
            Box::new(move |dto: &T, case: Option<KeyCase>| -> Result<Value> {
                match (*get)(dto) {
                    Some(nested) => Ok(Value::Object(marshaller::to_map(nested, case)?)),
                    None => Ok(Value::Null),
                }
            })
        };

        let write: WriteFn<T> = {
            let field = field.clone();
            Box::new(move |dto: &mut T, value: Value| -> Result<()> {
                match value {
                    Value::Object(map) => {
                        set(dto, N::from_array(map)?);
                        Ok(())
                    }
                    Value::Null => {
                        tracing::trace!("null for nested field '{}', keeping default", field);
                        Ok(())
                    }
                    other => Err(MarshalError::TypeMismatch {
                        field: field.clone(),
                        message: format!("expected an object for {}, got {}", type_name, json_type(&other)),
                    }),
                }
            })
        };

        let project: ProjectFn<T> = {
            let get = Arc::clone(&get);
            Box::new(move |dto: &T| -> Result<Option<Projection>> {
                match (*get)(dto) {
                    Some(nested) => Ok(Some(Projection::Object(nested.projection()?))),
                    None => Ok(None),
                }
            })
        };

        let display: DisplayFn<T> = Box::new(move |dto: &T| -> Result<String> {
            match (*get)(dto) {
                Some(nested) => nested.to_json(),
                None => Ok(String::new()),
            }
        });

        self.fields.push(FieldDescriptor {
            name: field,
            declared_type: type_name,
            kind: FieldKind::Nested { type_name },
            read,
            write: Some(write),
            project,
            display,
        });
        self
    }

    pub fn date<D, G, S>(mut self, name: &str, get: G, set: S) -> Self
    where
        D: DateValue + 'static,
        G: Fn(&T) -> Option<&D> + Send + Sync + 'static,
        S: Fn(&mut T, D) + Send + Sync + 'static,
    {
        let get = Arc::new(get);

        let read: ReadFn<T> = {
            let get = Arc::clone(&get);
            Box::new(move |dto: &T, _case: Option<KeyCase>| -> Result<Value> {
                Ok((*get)(dto)
                    .map(|d| Value::String(date::encode(d)))
                    .unwrap_or(Value::Null))
            })
        };

        let write: WriteFn<T> = {
            let field = name.to_string();
            Box::new(move |dto: &mut T, value: Value| -> Result<()> {
                match value {
                    Value::String(literal) => {
                        set(dto, D::from_fixed(date::decode(&literal)?));
                        Ok(())
                    }
                    Value::Null => {
                        tracing::trace!("null for date field '{}', keeping default", field);
                        Ok(())
                    }
                    other => Err(MarshalError::DateParse {
                        value: other.to_string(),
                        reason: format!("expected a string for '{}', got {}", field, json_type(&other)),
                    }),
                }
            })
        };

        let project: ProjectFn<T> = {
            let get = Arc::clone(&get);
            Box::new(move |dto: &T| -> Result<Option<Projection>> {
                Ok((*get)(dto).map(|d| Projection::Date(d.to_fixed())))
            })
        };

        let display: DisplayFn<T> = Box::new(move |dto: &T| -> Result<String> {
            Ok((*get)(dto).map(date::encode).unwrap_or_default())
        });

        self.fields.push(FieldDescriptor {
            name: name.to_string(),
            declared_type: std::any::type_name::<D>(),
            kind: FieldKind::DateTime,
            read,
            write: Some(write),
            project,
            display,
        });
        self
    }

    pub fn collection<N, G, S>(mut self, name: &str, get: G, set: S) -> Self
    where
        N: TransferObject,
        G: Fn(&T) -> &TransferObjectCollection<N> + Send + Sync + 'static,
        S: Fn(&mut T, TransferObjectCollection<N>) + Send + Sync + 'static,
    {
        let get = Arc::new(get);

        let read: ReadFn<T> = {
            let get = Arc::clone(&get);
            Box::new(move |dto: &T, case: Option<KeyCase>| -> Result<Value> {
                (*get)(dto).to_value(case)
            })
        };

        let write: WriteFn<T> = {
            let field = name.to_string();
            Box::new(move |dto: &mut T, value: Value| -> Result<()> {
                if value.is_null() {
                    tracing::trace!("null for collection field '{}', keeping default", field);
                    return Ok(());
                }
                set(dto, TransferObjectCollection::from_array(value)?);
                Ok(())
            })
        };

        let project: ProjectFn<T> = {
            let get = Arc::clone(&get);
            Box::new(move |dto: &T| -> Result<Option<Projection>> {
                Ok(Some(Projection::Value((*get)(dto).to_array()?)))
            })
        };

        let display: DisplayFn<T> = Box::new(move |dto: &T| -> Result<String> { (*get)(dto).to_json() });

        self.fields.push(FieldDescriptor {
            name: name.to_string(),
            declared_type: std::any::type_name::<TransferObjectCollection<N>>(),
            kind: FieldKind::Collection {
                element: std::any::type_name::<N>(),
            },
            read,
            write: Some(write),
            project,
            display,
        });
        self
    }

    /// Computed attribute available to `format` templates, looked up before fields.
    pub fn getter<F>(mut self, name: &str, get: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.getters.push((name.to_string(), Box::new(get)));
        self
    }

    pub fn build(self) -> Result<Schema<T>> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            let reason = if field.name.is_empty() {
                Some("field name is empty".to_string())
            } else if naming::to_camel(&field.name) != field.name {
                Some(format!(
                    "field name must be camelCase, e.g. '{}'",
                    naming::to_camel(&field.name)
                ))
            } else if !seen.insert(field.name.as_str()) {
                Some("field is declared more than once".to_string())
            } else {
                None
            };

            if let Some(reason) = reason {
                return Err(MarshalError::FieldResolution {
                    type_name: self.type_name.to_string(),
                    field: field.name.clone(),
                    reason,
                });
            }
        }

        tracing::debug!(
            "Resolved schema for {} with {} fields",
            self.type_name,
            self.fields.len()
        );

        Ok(Schema {
            type_name: self.type_name,
            fields: self.fields,
            getters: self.getters,
        })
    }

    fn leaf<V, G, S>(mut self, name: &str, kind: FieldKind, get: G, set: Option<S>) -> Self
    where
        V: Serialize + DeserializeOwned + 'static,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let get = Arc::new(get);
        let renames_contents = kind == FieldKind::Leaf;

        let read: ReadFn<T> = {
            let get = Arc::clone(&get);
            Box::new(move |dto: &T, case: Option<KeyCase>| -> Result<Value> {
                let value = serde_json::to_value((*get)(dto))?;
                Ok(match case {
                    Some(case) if renames_contents => keys::rename_keys(value, case),
                    _ => value,
                })
            })
        };

        let write = set.map(|set| {
            let field = name.to_string();
            Box::new(move |dto: &mut T, value: Value| -> Result<()> {
                let is_null = value.is_null();
                let decoded: V = match serde_json::from_value(value) {
                    Ok(decoded) => decoded,
                    // 非 Option 欄位收到 null 時保留預設值
                    Err(_) if is_null => {
                        tracing::trace!("null for field '{}', keeping default", field);
                        return Ok(());
                    }
                    Err(e) => {
                        return Err(MarshalError::TypeMismatch {
                            field: field.clone(),
                            message: e.to_string(),
                        })
                    }
                };
                set(dto, decoded);
                Ok(())
            }) as WriteFn<T>
        });

        let project: ProjectFn<T> = {
            let get = Arc::clone(&get);
            Box::new(move |dto: &T| -> Result<Option<Projection>> {
                let value = serde_json::to_value((*get)(dto))?;
                Ok((!value.is_null()).then_some(Projection::Value(value)))
            })
        };

        let display: DisplayFn<T> = Box::new(move |dto: &T| -> Result<String> {
            Ok(scalar_to_string(&serde_json::to_value((*get)(dto))?))
        });

        self.fields.push(FieldDescriptor {
            name: name.to_string(),
            declared_type: std::any::type_name::<V>(),
            kind,
            read,
            write,
            project,
            display,
        });
        self
    }
}

type SchemaCache = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

fn schema_cache() -> &'static SchemaCache {
    static CACHE: OnceLock<SchemaCache> = OnceLock::new();
    CACHE.get_or_init(Default::default)
}

/// Builds `S` once per type and hands out shared handles afterwards.
/// Failed builds are not cached.
pub(crate) fn cached<S, F>(build: F) -> Result<Arc<S>>
where
    S: Any + Send + Sync,
    F: FnOnce() -> Result<S>,
{
    let key = TypeId::of::<S>();

    let hit = schema_cache()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
        .cloned();
    if let Some(Ok(schema)) = hit.map(|entry| entry.downcast::<S>()) {
        return Ok(schema);
    }

    let built = Arc::new(build()?);
    let mut cache = schema_cache().write().unwrap_or_else(PoisonError::into_inner);
    let entry = cache
        .entry(key)
        .or_insert_with(|| Arc::clone(&built) as Arc<dyn Any + Send + Sync>);
    Ok(Arc::clone(entry).downcast::<S>().unwrap_or(built))
}

pub(crate) fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

pub fn resolve<T: TransferObject>() -> Result<Arc<Schema<T>>> {
    cached(|| T::describe(SchemaBuilder::new(short_type_name::<T>())).build())
}

/// Declared fields of `T` in declaration order.
pub fn inspect<T: TransferObject>() -> Result<Vec<FieldInfo>> {
    Ok(resolve::<T>()?.fields().iter().map(FieldDescriptor::info).collect())
}
