use crate::config::toml_config::MarshalConfig;
use crate::utils::error::{MarshalError, Result};
use crate::utils::naming::KeyCase;
use crate::utils::validation::Validate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "dto-marshal")]
#[command(about = "Re-key JSON documents between camelCase, snake_case and other naming conventions")]
pub struct CliConfig {
    #[arg(long, help = "JSON file to read (stdin when omitted)")]
    pub input: Option<PathBuf>,

    #[arg(long, value_enum, help = "Target key case (defaults to keys.output_case, then snake)")]
    pub case: Option<KeyCase>,

    #[arg(long, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Pretty-print the output")]
    pub pretty: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl CliConfig {
    pub fn resolve_case(&self, file_config: Option<&MarshalConfig>) -> KeyCase {
        self.case
            .or_else(|| file_config.map(|c| c.keys.output_case))
            .unwrap_or_default()
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        for (field, path) in [("input", &self.input), ("config", &self.config)] {
            if let Some(path) = path {
                if !path.is_file() {
                    return Err(MarshalError::InvalidConfigValue {
                        field: field.to_string(),
                        value: path.display().to_string(),
                        reason: "File does not exist".to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
