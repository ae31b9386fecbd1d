//! Command-line argument parsing for athena-query.

use crate::config::{Config, OutputFormat};
use crate::error::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Execute SQL queries against AWS Athena.
#[derive(Parser, Debug)]
#[command(name = "athena-query")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Output format, overriding the configuration file (table, csv, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Output file for csv/json, overriding the configuration file
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Disable the execution cache even if the configuration enables it
    #[arg(long)]
    pub no_cache: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Applies command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) -> Result<()> {
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(file) = &self.output_file {
            config.output.file = Some(file.clone());
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
        config.output.validate()
    }
}

/// Serve an HTTP query page backed by AWS Athena.
#[derive(Parser, Debug)]
#[command(name = "athena-query-web")]
#[command(version, about, long_about = None)]
pub struct WebCli {
    /// Path to the TOML configuration file
    #[arg(long, value_name = "PATH", default_value = "config.toml")]
    pub config: PathBuf,

    /// Address to listen on
    #[arg(long, value_name = "ADDR", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl WebCli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
