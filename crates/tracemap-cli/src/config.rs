// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration: defaults, then a TOML file, then environment.
//!
//! The file is `--config <path>` when given, otherwise
//! `$XDG_CONFIG_HOME/tracemap/config.toml` if it exists. Command-line flags
//! are applied on top by `main`.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const ENV_LOG_LEVEL: &str = "TRACEMAP_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "TRACEMAP_LOG_FORMAT";
pub const ENV_OUTPUT: &str = "TRACEMAP_OUTPUT";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracemapConfig {
	pub logging: LoggingConfig,
	pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
	pub level: LogLevel,
	pub format: LogFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
	pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
	Error,
	Warn,
	#[default]
	Info,
	Debug,
	Trace,
}

impl LogLevel {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Error => "error",
			Self::Warn => "warn",
			Self::Info => "info",
			Self::Debug => "debug",
			Self::Trace => "trace",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	#[default]
	Pretty,
	Json,
	Compact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
	#[default]
	Text,
	Json,
}

impl TracemapConfig {
	/// Load from `explicit` (which must exist) or the user config file, then
	/// apply environment overrides.
	pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
		let mut config = match explicit {
			Some(path) => Self::from_file(path)?,
			None => match user_config_path() {
				Some(path) if path.is_file() => Self::from_file(&path)?,
				_ => Self::default(),
			},
		};
		config.apply_env(|key| std::env::var(key).ok())?;
		Ok(config)
	}

	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		toml::from_str(&text).map_err(|source| ConfigError::TomlParse {
			path: path.to_path_buf(),
			source,
		})
	}

	/// Apply `TRACEMAP_*` overrides read through `lookup`.
	pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(value) = lookup(ENV_LOG_LEVEL) {
			self.logging.level = parse_value(ENV_LOG_LEVEL, &value)?;
		}
		if let Some(value) = lookup(ENV_LOG_FORMAT) {
			self.logging.format = parse_value(ENV_LOG_FORMAT, &value)?;
		}
		if let Some(value) = lookup(ENV_OUTPUT) {
			self.output.format = parse_value(ENV_OUTPUT, &value)?;
		}
		Ok(())
	}
}

fn parse_value<T: ValueEnum>(field: &str, value: &str) -> Result<T, ConfigError> {
	T::from_str(value.trim(), true).map_err(|message| ConfigError::InvalidValue {
		field: field.to_string(),
		message,
	})
}

/// `$XDG_CONFIG_HOME/tracemap/config.toml`, or the platform equivalent.
pub fn user_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("tracemap").join("config.toml"))
}
