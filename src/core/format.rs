use crate::core::schema::Schema;
use crate::domain::ports::TransferObject;
use crate::utils::error::{MarshalError, Result};
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// `(alias, attribute)` pairs. Empty means aliases are derived from field names.
    pub aliases: Vec<(String, String)>,
    pub separator: String,
    pub marker: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            aliases: Vec::new(),
            separator: "\n".to_string(),
            marker: ":".to_string(),
        }
    }
}

impl FormatOptions {
    pub fn with_alias(mut self, alias: &str, attribute: &str) -> Self {
        self.aliases.push((alias.to_string(), attribute.to_string()));
        self
    }

    pub fn with_separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self
    }

    pub fn with_marker(mut self, marker: &str) -> Self {
        self.marker = marker.to_string();
        self
    }
}

/// Replaces `<marker><alias>` placeholders in `template` with attribute values.
pub fn format<T: TransferObject>(dto: &T, template: &str, options: &FormatOptions) -> Result<String> {
    let schema = T::schema()?;
    let aliases = if options.aliases.is_empty() {
        derive_aliases(schema.field_names())
    } else {
        options.aliases.clone()
    };

    if aliases.is_empty() {
        return Ok(template.to_string());
    }

    let mut values = HashMap::with_capacity(aliases.len());
    for (alias, attribute) in &aliases {
        let value = attribute_as_string(dto, &schema, attribute)?;
        values.insert(format!("{}{}", options.marker, alias), value);
    }

    // 長的 placeholder 優先，避免 :a1 先吃掉 :a10
    let mut placeholders: Vec<&String> = values.keys().collect();
    placeholders.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let pattern = placeholders
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");

    let re = Regex::new(&pattern).map_err(|e| MarshalError::InvalidConfigValue {
        field: "format.aliases".to_string(),
        value: pattern.clone(),
        reason: e.to_string(),
    })?;

    Ok(re
        .replace_all(template, |caps: &Captures| {
            values.get(&caps[0]).cloned().unwrap_or_default()
        })
        .into_owned())
}

pub fn format_lines<T: TransferObject>(dto: &T, queries: &[&str], options: &FormatOptions) -> Result<String> {
    format(dto, &queries.join(options.separator.as_str()), options)
}

/// First letter of each field plus a counter, bumped until unused:
/// `name`, `age`, `address` give `n1`, `a1`, `a2`.
pub fn derive_aliases<'a, I>(names: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut taken = HashSet::new();
    let mut aliases = Vec::new();

    for name in names {
        let Some(first) = name.chars().next() else {
            continue;
        };

        let mut count = 1;
        let alias = loop {
            let candidate = format!("{}{}", first, count);
            count += 1;
            if !taken.contains(&candidate) {
                break candidate;
            }
        };

        taken.insert(alias.clone());
        aliases.push((alias, name.to_string()));
    }

    aliases
}

fn attribute_as_string<T>(dto: &T, schema: &Schema<T>, attribute: &str) -> Result<String> {
    if let Some(getter) = schema.getter(attribute) {
        return Ok(getter(dto));
    }

    if let Some(field) = schema.field(attribute) {
        return field.display(dto);
    }

    Err(MarshalError::UndefinedAttribute {
        type_name: schema.type_name().to_string(),
        attribute: attribute.to_string(),
    })
}

/// Template rendering of a marshalled value.
pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) | Value::Null => String::new(),
        other => other.to_string(),
    }
}
