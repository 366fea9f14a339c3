// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Position records returned by mapping queries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Result of a mapping query in either direction.
///
/// For a forward query (generated to original) `line`/`column` are in the
/// original file and `file_name` is the matching `sources` entry. For a
/// reverse query they are in the generated file and `file_name` is the map's
/// advisory `file` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMapInfo {
	/// Zero-based line.
	pub line: u32,
	/// Zero-based column.
	pub column: u32,
	pub file_name: Option<String>,
	/// Symbol name recorded for the segment, if any.
	pub name: Option<String>,
}

impl SourceMapInfo {
	pub fn new(line: u32, column: u32) -> Self {
		Self {
			line,
			column,
			file_name: None,
			name: None,
		}
	}

	pub fn with_file_name(mut self, file_name: Option<String>) -> Self {
		self.file_name = file_name;
		self
	}

	pub fn with_name(mut self, name: Option<String>) -> Self {
		self.name = name;
		self
	}
}

impl fmt::Display for SourceMapInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.file_name {
			Some(file) => write!(f, "{}:{}:{}", file, self.line, self.column)?,
			None => write!(f, "<unknown>:{}:{}", self.line, self.column)?,
		}
		if let Some(name) = &self.name {
			write!(f, " ({})", name)?;
		}
		Ok(())
	}
}

/// An original-file position translated into generated code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedLocation {
	/// Generated file the position lives in.
	pub file: PathBuf,
	/// Zero-based line.
	pub line: u32,
	/// Zero-based column.
	pub column: u32,
}

impl fmt::Display for GeneratedLocation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
	}
}
