// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for source map parsing and discovery.

use thiserror::Error;

/// Errors that can occur while reading a source map.
///
/// These never cross the [`SourceMapper`](crate::SourceMapper) boundary; the
/// mapper logs them and reports "no mapping" instead.
#[derive(Debug, Error)]
pub enum SourceMapError {
	#[error("Invalid source map JSON: {0}")]
	InvalidJson(#[from] serde_json::Error),

	#[error("Unsupported source map version: expected 3, got {0}")]
	UnsupportedVersion(u32),

	#[error("Invalid VLQ character: {0:?}")]
	InvalidVlqChar(char),

	#[error("VLQ value continues past the end of the segment")]
	UnterminatedVlq,

	#[error("VLQ value does not fit in a signed 32-bit integer")]
	VlqOverflow,

	#[error("Mapping on generated line {line} has a negative {field}")]
	NegativeValue { field: &'static str, line: usize },

	#[error("Invalid inline source map URL: {0}")]
	InvalidDataUrl(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SourceMapError>;
