//! Implementation of the `exevo config` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::config::Config;
use crate::infrastructure::config::ConfigLoader;

const REDACTED: &str = "********";

/// Arguments of `exevo config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Extra configuration file, merged over .exevo/ and under EXEVO_* variables
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Effective configuration with secrets masked.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ConfigOutput {
    config: Config,
}

impl ConfigOutput {
    /// Wrap `config`, masking the API key.
    pub fn new(mut config: Config) -> Self {
        if config.provider.api_key.is_some() {
            config.provider.api_key = Some(REDACTED.to_string());
        }
        Self { config }
    }
}

impl CommandOutput for ConfigOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.config)
            .unwrap_or_else(|e| format!("Failed to render configuration: {e}"))
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or_default()
    }
}

/// Print the effective configuration.
pub async fn execute(args: ConfigArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load_with(args.config.as_deref())?;
    output(&ConfigOutput::new(config), json_mode);
    Ok(())
}
