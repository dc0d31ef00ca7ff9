use clap::Parser;
use dto_marshal::core::keys;
use dto_marshal::utils::error::{ErrorCategory, MarshalError};
use dto_marshal::utils::{logger, validation::Validate};
use dto_marshal::{CliConfig, MarshalConfig, Result};
use serde_json::Value;
use std::io::Read;

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 先讀設定檔，logger 需要其中的 logging 區段
    let file_config = match cli.config.as_ref().map(MarshalConfig::from_file).transpose() {
        Ok(config) => config,
        Err(e) => exit_with(e),
    };

    let level = file_config.as_ref().and_then(MarshalConfig::log_level);
    let json_logs = cli.log_json || file_config.as_ref().is_some_and(MarshalConfig::json_logs);
    if json_logs {
        logger::init_json_logger(cli.verbose, level);
    } else {
        logger::init_cli_logger(cli.verbose, level);
    }

    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = cli.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(e);
    }
    if let Some(config) = &file_config {
        if let Err(e) = config.validate() {
            tracing::error!("❌ Configuration file is invalid: {}", e);
            exit_with(e);
        }
    }

    match run(&cli, file_config.as_ref()) {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            tracing::error!("❌ Re-keying failed: {} (Category: {:?})", e, e.category());
            exit_with(e)
        }
    }
}

fn run(cli: &CliConfig, file_config: Option<&MarshalConfig>) -> Result<String> {
    let case = cli.resolve_case(file_config);

    let raw = match &cli.input {
        Some(path) => {
            tracing::info!("📥 Reading {}", path.display());
            std::fs::read_to_string(path)?
        }
        None => {
            tracing::info!("📥 Reading stdin");
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let value: Value = serde_json::from_str(&raw).map_err(|e| MarshalError::MalformedPayload {
        message: e.to_string(),
    })?;

    let renamed = keys::rename_keys(value, case);
    tracing::info!("✅ Keys rewritten as {:?}", case);

    let output = if cli.pretty {
        serde_json::to_string_pretty(&renamed)?
    } else {
        serde_json::to_string(&renamed)?
    };
    Ok(output)
}

fn exit_with(e: MarshalError) -> ! {
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    let exit_code = match e.category() {
        ErrorCategory::Config => 2,
        ErrorCategory::System => 3,
        _ => 1,
    };
    std::process::exit(exit_code);
}
