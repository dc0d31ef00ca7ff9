use crate::core::keys::json_type;
use crate::core::marshaller;
use crate::domain::ports::TransferObject;
use crate::utils::error::{MarshalError, Result};
use crate::utils::naming::{self, KeyCase};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// Collection keys: integer positions or names, like a PHP-style ordered map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionKey {
    Index(usize),
    Name(String),
}

impl CollectionKey {
    /// Canonical decimal strings become `Index`, everything else stays a name.
    pub fn parse(key: &str) -> Self {
        match key.parse::<usize>() {
            Ok(index) if index.to_string() == key => CollectionKey::Index(index),
            _ => CollectionKey::Name(key.to_string()),
        }
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKey::Index(index) => write!(f, "{}", index),
            CollectionKey::Name(name) => f.write_str(name),
        }
    }
}

impl From<usize> for CollectionKey {
    fn from(index: usize) -> Self {
        CollectionKey::Index(index)
    }
}

/// `"3"` and `3` address the same entry.
impl From<&str> for CollectionKey {
    fn from(name: &str) -> Self {
        CollectionKey::parse(name)
    }
}

impl From<String> for CollectionKey {
    fn from(name: String) -> Self {
        match CollectionKey::parse(&name) {
            CollectionKey::Index(index) => CollectionKey::Index(index),
            CollectionKey::Name(_) => CollectionKey::Name(name),
        }
    }
}

/// Ordered, keyed container of transfer objects.
///
/// Derived collections (`filter`, `map`, `partition`, `slice`, `matching`)
/// are new values; the source is never touched.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferObjectCollection<T> {
    elements: Vec<(CollectionKey, T)>,
}

impl<T> Default for TransferObjectCollection<T> {
    fn default() -> Self {
        Self { elements: Vec::new() }
    }
}

impl<T> TransferObjectCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_elements<I: IntoIterator<Item = T>>(elements: I) -> Self {
        Self {
            elements: elements
                .into_iter()
                .enumerate()
                .map(|(i, element)| (CollectionKey::Index(i), element))
                .collect(),
        }
    }

    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<CollectionKey>,
        I: IntoIterator<Item = (K, T)>,
    {
        let mut collection = Self::new();
        for (key, element) in entries {
            collection.set(key, element);
        }
        collection
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn first(&self) -> Option<&T> {
        self.elements.first().map(|(_, element)| element)
    }

    pub fn last(&self) -> Option<&T> {
        self.elements.last().map(|(_, element)| element)
    }

    pub fn get<K: Into<CollectionKey>>(&self, key: K) -> Option<&T> {
        let key = key.into();
        self.elements.iter().find(|(k, _)| *k == key).map(|(_, element)| element)
    }

    pub fn get_mut<K: Into<CollectionKey>>(&mut self, key: K) -> Option<&mut T> {
        let key = key.into();
        self.elements
            .iter_mut()
            .find(|(k, _)| *k == key)
            .map(|(_, element)| element)
    }

    pub fn contains_key<K: Into<CollectionKey>>(&self, key: K) -> bool {
        self.position(&key.into()).is_some()
    }

    pub fn keys(&self) -> Vec<CollectionKey> {
        self.elements.iter().map(|(key, _)| key.clone()).collect()
    }

    pub fn values(&self) -> Vec<&T> {
        self.elements.iter().map(|(_, element)| element).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CollectionKey, &T)> {
        self.elements.iter().map(|(key, element)| (key, element))
    }

    pub fn elements(&self) -> &[(CollectionKey, T)] {
        &self.elements
    }

    /// Replaces in place when `key` exists, appends otherwise.
    pub fn set<K: Into<CollectionKey>>(&mut self, key: K, element: T) {
        let key = key.into();
        match self.position(&key) {
            Some(pos) => self.elements[pos].1 = element,
            None => self.elements.push((key, element)),
        }
    }

    /// Appends under the next integer key (highest integer key + 1).
    ///
    /// Fails when the highest integer key is already `usize::MAX`.
    pub fn add(&mut self, element: T) -> Result<CollectionKey> {
        let highest = self
            .elements
            .iter()
            .filter_map(|(key, _)| match key {
                CollectionKey::Index(index) => Some(*index),
                CollectionKey::Name(_) => None,
            })
            .max();

        let next = match highest {
            Some(last) => last
                .checked_add(1)
                .ok_or(MarshalError::CollectionKeyExhausted { last })?,
            None => 0,
        };

        let key = CollectionKey::Index(next);
        self.elements.push((key.clone(), element));
        Ok(key)
    }

    pub fn remove<K: Into<CollectionKey>>(&mut self, key: K) -> Option<T> {
        let pos = self.position(&key.into())?;
        Some(self.elements.remove(pos).1)
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    pub fn exists<P: Fn(&CollectionKey, &T) -> bool>(&self, predicate: P) -> bool {
        self.elements.iter().any(|(key, element)| predicate(key, element))
    }

    pub fn find_first<P: Fn(&CollectionKey, &T) -> bool>(&self, predicate: P) -> Option<&T> {
        self.elements
            .iter()
            .find(|(key, element)| predicate(key, element))
            .map(|(_, element)| element)
    }

    pub fn for_all<P: Fn(&CollectionKey, &T) -> bool>(&self, predicate: P) -> bool {
        self.elements.iter().all(|(key, element)| predicate(key, element))
    }

    pub fn fold<A, F: FnMut(A, &T) -> A>(&self, initial: A, f: F) -> A {
        self.elements.iter().map(|(_, element)| element).fold(initial, f)
    }

    /// Same keys, mapped elements.
    pub fn map<U, F: FnMut(&T) -> U>(&self, mut f: F) -> TransferObjectCollection<U> {
        TransferObjectCollection {
            elements: self
                .elements
                .iter()
                .map(|(key, element)| (key.clone(), f(element)))
                .collect(),
        }
    }

    fn position(&self, key: &CollectionKey) -> Option<usize> {
        self.elements.iter().position(|(k, _)| k == key)
    }
}

impl<T: Clone> TransferObjectCollection<T> {
    /// Keeps matching elements under their original keys.
    pub fn filter<P: Fn(&CollectionKey, &T) -> bool>(&self, predicate: P) -> Self {
        Self {
            elements: self
                .elements
                .iter()
                .filter(|(key, element)| predicate(key, element))
                .cloned()
                .collect(),
        }
    }

    /// `(matches, non_matches)`, both keyed like the source.
    pub fn partition<P: Fn(&CollectionKey, &T) -> bool>(&self, predicate: P) -> (Self, Self) {
        let (matches, rest): (Vec<_>, Vec<_>) = self
            .elements
            .iter()
            .cloned()
            .partition(|(key, element)| predicate(key, element));
        (Self { elements: matches }, Self { elements: rest })
    }

    pub fn slice(&self, offset: usize, length: Option<usize>) -> Self {
        Self {
            elements: self
                .elements
                .iter()
                .skip(offset)
                .take(length.unwrap_or(usize::MAX))
                .cloned()
                .collect(),
        }
    }
}

impl<T: PartialEq> TransferObjectCollection<T> {
    pub fn contains(&self, element: &T) -> bool {
        self.elements.iter().any(|(_, e)| e == element)
    }

    pub fn index_of(&self, element: &T) -> Option<&CollectionKey> {
        self.elements.iter().find(|(_, e)| e == element).map(|(key, _)| key)
    }

    /// Removes the first equal element.
    pub fn remove_element(&mut self, element: &T) -> bool {
        match self.elements.iter().position(|(_, e)| e == element) {
            Some(pos) => {
                self.elements.remove(pos);
                true
            }
            None => false,
        }
    }
}

impl<T: TransferObject> TransferObjectCollection<T> {
    /// JSON array when keys run `0..n` in order, JSON object otherwise.
    pub fn to_array(&self) -> Result<Value> {
        self.to_value(None)
    }

    pub fn to_cased_array(&self, case: KeyCase) -> Result<Value> {
        self.to_value(Some(case))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_array()?)?)
    }

    pub fn from_array(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(T::from_value)
                .collect::<Result<Vec<_>>>()
                .map(Self::from_elements),
            Value::Object(map) => {
                let mut collection = Self::new();
                for (key, item) in map {
                    collection.set(CollectionKey::parse(&key), T::from_value(item)?);
                }
                Ok(collection)
            }
            other => Err(MarshalError::MalformedPayload {
                message: format!("expected an array or object of transfer objects, got {}", json_type(&other)),
            }),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).map_err(|e| MarshalError::MalformedPayload {
            message: e.to_string(),
        })?;
        Self::from_array(value)
    }

    pub(crate) fn to_value(&self, case: Option<KeyCase>) -> Result<Value> {
        let is_list = self
            .elements
            .iter()
            .enumerate()
            .all(|(i, (key, _))| *key == CollectionKey::Index(i));

        if is_list {
            let items = self
                .elements
                .iter()
                .map(|(_, element)| marshaller::to_map(element, case).map(Value::Object))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Value::Array(items));
        }

        let mut map = serde_json::Map::with_capacity(self.elements.len());
        for (key, element) in &self.elements {
            map.insert(key.to_string(), Value::Object(marshaller::to_map(element, case)?));
        }
        Ok(Value::Object(map))
    }
}

impl<T: TransferObject + Clone> TransferObjectCollection<T> {
    /// Filters, orders and slices according to `criteria`.
    pub fn matching(&self, criteria: &Criteria<T>) -> Result<Self> {
        let mut selected: Vec<(CollectionKey, T)> = self
            .elements
            .iter()
            .filter(|(_, element)| criteria.accepts(element))
            .cloned()
            .collect();

        if !criteria.orderings.is_empty() {
            let mut keyed = selected
                .into_iter()
                .map(|entry| -> Result<(Vec<Value>, (CollectionKey, T))> {
                    let map = marshaller::to_array(&entry.1)?;
                    let sort_keys: Vec<Value> = criteria
                        .orderings
                        .iter()
                        .map(|(field, _)| map.get(field).cloned().unwrap_or(Value::Null))
                        .collect();
                    Ok((sort_keys, entry))
                })
                .collect::<Result<Vec<_>>>()?;

            keyed.sort_by(|(a, _), (b, _)| {
                criteria
                    .orderings
                    .iter()
                    .enumerate()
                    .map(|(i, (_, order))| match order {
                        Order::Ascending => compare_values(&a[i], &b[i]),
                        Order::Descending => compare_values(&b[i], &a[i]),
                    })
                    .find(|ordering| *ordering != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });

            selected = keyed.into_iter().map(|(_, entry)| entry).collect();
        }

        let offset = criteria.first_result.unwrap_or(0);
        let length = criteria.max_results.filter(|n| *n > 0);
        if offset > 0 || length.is_some() {
            selected = selected
                .into_iter()
                .skip(offset)
                .take(length.unwrap_or(usize::MAX))
                .collect();
        }

        Ok(Self { elements: selected })
    }
}

/// Same text as [`TransferObjectCollection::to_json`].
impl<T: TransferObject> fmt::Display for TransferObjectCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.to_json().map_err(|e| {
            tracing::warn!("Cannot display collection: {}", e);
            fmt::Error
        })?;
        f.write_str(&json)
    }
}

impl<T> IntoIterator for TransferObjectCollection<T> {
    type Item = (CollectionKey, T);
    type IntoIter = std::vec::IntoIter<(CollectionKey, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a TransferObjectCollection<T> {
    type Item = &'a (CollectionKey, T);
    type IntoIter = std::slice::Iter<'a, (CollectionKey, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<T> FromIterator<T> for TransferObjectCollection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_elements(iter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

/// Selection rules for [`TransferObjectCollection::matching`].
pub struct Criteria<T> {
    predicate: Option<Box<dyn Fn(&T) -> bool>>,
    orderings: Vec<(String, Order)>,
    first_result: Option<usize>,
    max_results: Option<usize>,
}

impl<T> Default for Criteria<T> {
    fn default() -> Self {
        Self {
            predicate: None,
            orderings: Vec::new(),
            first_result: None,
            max_results: None,
        }
    }
}

impl<T> Criteria<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_fn<P: Fn(&T) -> bool + 'static>(mut self, predicate: P) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }

    /// Orders by a marshalled field; snake_case names are accepted too.
    pub fn order_by(mut self, field: &str, order: Order) -> Self {
        self.orderings.push((naming::to_camel(field), order));
        self
    }

    pub fn first_result(mut self, offset: usize) -> Self {
        self.first_result = Some(offset);
        self
    }

    pub fn max_results(mut self, limit: usize) -> Self {
        self.max_results = Some(limit);
        self
    }

    fn accepts(&self, element: &T) -> bool {
        self.predicate.as_ref().map_or(true, |p| p(element))
    }
}

impl<T> fmt::Debug for Criteria<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Criteria")
            .field("has_predicate", &self.predicate.is_some())
            .field("orderings", &self.orderings)
            .field("first_result", &self.first_result)
            .field("max_results", &self.max_results)
            .finish()
    }
}

// null 最小；型別不同時退回比較 JSON 文字
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}
