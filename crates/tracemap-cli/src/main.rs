// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! tracemap CLI - translate positions through JavaScript source maps.
//!
//! Each subcommand runs one lookup against a fresh mapping session and prints
//! the result as text or JSON. A lookup that finds nothing exits with status 1.

use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

use tracemap::{decode_vlq_segment, maybe_map, SourceMap, SourceMapper};
use tracemap_core::FunctionInfo;

mod config;
mod error;
mod logging;

use config::{LogLevel, OutputFormat, TracemapConfig};

/// tracemap - source map lookups for debuggers
#[derive(Parser, Debug)]
#[command(name = "tracemap", version, about, long_about = None)]
struct Args {
	/// Path to a configuration file
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	/// Log level (overrides config and TRACEMAP_LOG_LEVEL)
	#[arg(long, global = true, value_enum)]
	log_level: Option<LogLevel>,

	/// Print results as JSON
	#[arg(long, global = true)]
	json: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Map a generated file, or a position in it, to the original source
	Original {
		file: PathBuf,
		/// Zero-based line in the generated file
		#[arg(long)]
		line: Option<u32>,
		/// Zero-based column in the generated file
		#[arg(long)]
		column: Option<u32>,
		/// Only print the original file name
		#[arg(long)]
		name_only: bool,
	},
	/// Map a position in an original file into generated code
	Generated {
		file: PathBuf,
		/// Zero-based line in the original file
		#[arg(long)]
		line: u32,
		/// Zero-based column in the original file
		#[arg(long, default_value_t = 0)]
		column: u32,
	},
	/// Remap a call-stack frame through the `.map` next to its file
	Frame {
		file: String,
		/// Declaration line as reported by the runtime
		#[arg(long)]
		line: u32,
		#[arg(long)]
		function: String,
		#[arg(long)]
		namespace: Option<String>,
	},
	/// Decode one Base64 VLQ segment
	Decode { segment: String },
	/// Summarise a source map file
	Inspect { map: PathBuf },
}

/// Summary printed by `inspect`.
#[derive(Debug, Serialize)]
struct MapSummary {
	file: Option<String>,
	sources: Vec<String>,
	names: usize,
	lines: usize,
	segments: usize,
	has_sources_content: bool,
}

impl MapSummary {
	fn new(map: &SourceMap) -> Self {
		Self {
			file: map.file().map(str::to_string),
			sources: map.sources().to_vec(),
			names: map.names().len(),
			lines: map.line_count(),
			segments: map.segment_count(),
			has_sources_content: map.has_sources_content(),
		}
	}
}

impl fmt::Display for MapSummary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "file: {}", self.file.as_deref().unwrap_or("<none>"))?;
		writeln!(f, "lines: {}", self.lines)?;
		writeln!(f, "segments: {}", self.segments)?;
		writeln!(f, "names: {}", self.names)?;
		writeln!(f, "sources content: {}", self.has_sources_content)?;
		write!(f, "sources:")?;
		for source in &self.sources {
			write!(f, "\n  {}", source)?;
		}
		Ok(())
	}
}

/// VLQ values printed by `decode`.
#[derive(Debug, Serialize)]
#[serde(transparent)]
struct Values(Vec<i32>);

impl fmt::Display for Values {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let parts: Vec<String> = self.0.iter().map(i32::to_string).collect();
		write!(f, "{}", parts.join(", "))
	}
}

struct Printer {
	format: OutputFormat,
}

impl Printer {
	fn emit<T: Serialize + fmt::Display>(&self, value: Option<T>) -> Result<ExitCode> {
		match self.format {
			OutputFormat::Json => {
				println!("{}", serde_json::to_string_pretty(&value)?);
			}
			OutputFormat::Text => match &value {
				Some(v) => println!("{}", v),
				None => println!("no mapping"),
			},
		}

		Ok(if value.is_some() {
			ExitCode::SUCCESS
		} else {
			ExitCode::FAILURE
		})
	}
}

fn main() -> Result<ExitCode> {
	let args = Args::parse();

	let mut config =
		TracemapConfig::load(args.config.as_deref()).context("failed to load configuration")?;
	if let Some(level) = args.log_level {
		config.logging.level = level;
	}
	if args.json {
		config.output.format = OutputFormat::Json;
	}

	logging::init_logging(&config.logging);
	debug!(?config, "Configuration loaded");

	let printer = Printer {
		format: config.output.format,
	};
	run(args.command, &printer)
}

fn run(command: Command, printer: &Printer) -> Result<ExitCode> {
	let mut mapper = SourceMapper::new();

	match command {
		Command::Original {
			file,
			line,
			column,
			name_only,
		} => {
			if name_only {
				printer.emit(mapper.original_file_name(&file, line, column))
			} else if let Some(line) = line {
				printer.emit(mapper.map_to_original(&file, line, column.unwrap_or(0)))
			} else {
				printer.emit(mapper.map_to_original_file(&file))
			}
		}
		Command::Generated { file, line, column } => {
			printer.emit(mapper.map_to_javascript(&file, line, column))
		}
		Command::Frame {
			file,
			line,
			function,
			namespace,
		} => {
			let mut frame = FunctionInfo::new(function).with_location(file, line);
			frame.namespace = namespace;
			printer.emit(Some(maybe_map(frame, None)))
		}
		Command::Decode { segment } => {
			let values = decode_vlq_segment(&segment)
				.with_context(|| format!("failed to decode VLQ segment {:?}", segment))?;
			printer.emit(Some(Values(values)))
		}
		Command::Inspect { map } => {
			let parsed = SourceMap::from_path(&map)
				.with_context(|| format!("failed to read source map {}", map.display()))?;
			printer.emit(Some(MapSummary::new(&parsed)))
		}
	}
}
