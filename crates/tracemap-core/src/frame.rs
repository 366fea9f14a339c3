// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Call-stack frame descriptions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single call-stack frame as reported by the script runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
	/// Enclosing namespace or module, if the runtime reports one.
	pub namespace: Option<String>,
	/// Function name as seen in generated code.
	pub function: String,
	/// Declaration line of the function. Not normalised to zero- or
	/// one-based numbering; see `tracemap::maybe_map`.
	pub line_number: Option<u32>,
	pub filename: Option<String>,
}

impl FunctionInfo {
	pub fn new(function: impl Into<String>) -> Self {
		Self {
			function: function.into(),
			..Self::default()
		}
	}

	pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = Some(namespace.into());
		self
	}

	pub fn with_location(mut self, filename: impl Into<String>, line_number: u32) -> Self {
		self.filename = Some(filename.into());
		self.line_number = Some(line_number);
		self
	}
}

impl fmt::Display for FunctionInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if let Some(ns) = &self.namespace {
			write!(f, "{}.", ns)?;
		}
		write!(f, "{}", self.function)?;
		match (&self.filename, self.line_number) {
			(Some(file), Some(line)) => write!(f, " [{}:{}]", file, line),
			(Some(file), None) => write!(f, " [{}]", file),
			_ => Ok(()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_builder_sets_location() {
		let info = FunctionInfo::new("greet").with_location("out/app.js", 12);
		assert_eq!(info.function, "greet");
		assert_eq!(info.filename.as_deref(), Some("out/app.js"));
		assert_eq!(info.line_number, Some(12));
		assert!(info.namespace.is_none());
	}

	#[test]
	fn test_display_formats() {
		let info = FunctionInfo::new("greet")
			.with_namespace("Greeter")
			.with_location("app.js", 4);
		assert_eq!(info.to_string(), "Greeter.greet [app.js:4]");
		assert_eq!(FunctionInfo::new("main").to_string(), "main");
	}

	proptest! {
		#[test]
		fn test_serde_roundtrip(function in "[a-zA-Z_$][a-zA-Z0-9_$]{0,20}", line in 0u32..100_000) {
			let info = FunctionInfo::new(function).with_location("bundle.js", line);
			let json = serde_json::to_string(&info).unwrap();
			let parsed: FunctionInfo = serde_json::from_str(&json).unwrap();
			prop_assert_eq!(info, parsed);
		}
	}
}
