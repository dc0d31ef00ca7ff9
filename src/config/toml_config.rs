use crate::core::format::FormatOptions;
use crate::utils::error::{MarshalError, Result};
use crate::utils::naming::KeyCase;
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarshalConfig {
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub format: FormatConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeysConfig {
    #[serde(default)]
    pub output_case: KeyCase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatConfig {
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default = "default_separator")]
    pub separator: String,
    /// alias -> attribute
    pub aliases: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

fn default_marker() -> String {
    ":".to_string()
}

fn default_separator() -> String {
    "\n".to_string()
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            separator: default_separator(),
            aliases: None,
        }
    }
}

impl FormatConfig {
    pub fn to_options(&self) -> FormatOptions {
        FormatOptions {
            aliases: self
                .aliases
                .iter()
                .flatten()
                .map(|(alias, attribute)| (alias.clone(), attribute.clone()))
                .collect(),
            separator: self.separator.clone(),
            marker: self.marker.clone(),
        }
    }
}

impl MarshalConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MarshalError::Io)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| MarshalError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${LOG_LEVEL})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("constant regex"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl Validate for MarshalConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("format.marker", &self.format.marker)?;
        validation::validate_no_whitespace("format.marker", &self.format.marker)?;

        if let Some(aliases) = &self.format.aliases {
            for (alias, attribute) in aliases {
                validation::validate_non_empty_string("format.aliases", alias)?;
                validation::validate_non_empty_string("format.aliases", attribute)?;
            }
        }

        // [logging] 區段存在時必須指定 level
        if let Some(logging) = &self.logging {
            let level = validation::validate_required_field("logging.level", &logging.level)?;
            validation::validate_one_of("logging.level", level, &LOG_LEVELS)?;
        }

        Ok(())
    }
}
