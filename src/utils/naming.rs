use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// 大寫字母前插入分隔符用
fn uppercase_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([A-Z])").expect("constant regex"))
}

/// Key naming conventions understood by the marshaller and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum KeyCase {
    Camel,
    #[default]
    Snake,
    Kebab,
    Pascal,
    Title,
}

impl KeyCase {
    pub fn apply(self, value: &str) -> String {
        match self {
            KeyCase::Camel => to_camel(value),
            KeyCase::Snake => to_snake(value),
            KeyCase::Kebab => to_kebab(value),
            KeyCase::Pascal => to_pascal(value),
            KeyCase::Title => to_title(value),
        }
    }
}

/// `first_name` -> `firstName`. Already camelCase input is returned unchanged.
pub fn to_camel(value: &str) -> String {
    lower_first(&join_words(value))
}

/// `firstName` -> `first_name`. Strings without uppercase letters are only trimmed of `_`.
pub fn to_snake(value: &str) -> String {
    separate_humps(value, '_')
}

pub fn to_pascal(value: &str) -> String {
    upper_first(&join_words(value))
}

pub fn to_kebab(value: &str) -> String {
    separate_humps(value, '-')
}

/// `hello WORLD` -> `Hello World`
pub fn to_title(value: &str) -> String {
    capitalize_words(&value.to_ascii_lowercase())
}

pub fn to_upper(value: &str) -> String {
    value.to_ascii_uppercase()
}

pub fn to_lower(value: &str) -> String {
    value.to_ascii_lowercase()
}

pub fn upper_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

pub fn lower_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

// `_` 視為空白，每個單字首字母大寫後去掉所有空白
fn join_words(value: &str) -> String {
    capitalize_words(&value.replace('_', " "))
        .chars()
        .filter(|c| *c != ' ')
        .collect()
}

fn separate_humps(value: &str, separator: char) -> String {
    let replacement = format!("{}$1", separator);
    uppercase_re()
        .replace_all(value, replacement.as_str())
        .to_ascii_lowercase()
        .trim_matches(separator)
        .to_string()
}

fn capitalize_words(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if at_word_start {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = matches!(c, ' ' | '\t' | '\r' | '\n' | '\x0c' | '\x0b');
    }
    out
}
