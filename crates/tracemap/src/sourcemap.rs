// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Source map parsing and position lookup.
//!
//! Implements the Source Map Revision 3 format in both directions: generated
//! positions are mapped to original ones through the decoded segment table,
//! and original positions are mapped back with a best-effort scan.

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use tracemap_core::SourceMapInfo;

use crate::error::{Result, SourceMapError};
use crate::vlq::{decode_vlq_mappings, Line, Segment};

/// Raw source map JSON structure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSourceMap {
	version: u32,
	#[serde(default)]
	file: Option<String>,
	#[serde(default)]
	source_root: Option<String>,
	#[serde(default)]
	sources: Vec<String>,
	#[serde(default)]
	sources_content: Option<Vec<Option<String>>>,
	#[serde(default)]
	names: Vec<String>,
	mappings: String,
}

/// Parsed source map ready for lookups. Immutable once built.
#[derive(Debug, Clone)]
pub struct SourceMap {
	/// Generated file name (advisory).
	file: Option<String>,
	/// Original source paths with `sourceRoot` already applied.
	sources: Vec<String>,
	sources_content: Vec<Option<String>>,
	names: Vec<String>,
	/// Decoded segments, indexed by generated line.
	lines: Vec<Line>,
}

impl SourceMap {
	/// Parse a source map from JSON bytes.
	pub fn from_bytes(data: &[u8]) -> Result<Self> {
		let raw: RawSourceMap = serde_json::from_slice(data)?;

		if raw.version != 3 {
			return Err(SourceMapError::UnsupportedVersion(raw.version));
		}

		let lines = decode_vlq_mappings(&raw.mappings)?;
		let root = raw.source_root.as_deref();
		let sources = raw
			.sources
			.into_iter()
			.map(|source| apply_source_root(root, source))
			.collect();

		Ok(Self {
			file: raw.file,
			sources,
			sources_content: raw.sources_content.unwrap_or_default(),
			names: raw.names,
			lines,
		})
	}

	/// Read and parse a source map file.
	pub fn from_path(path: &Path) -> Result<Self> {
		let data = std::fs::read(path)?;
		Self::from_bytes(&data)
	}

	pub fn file(&self) -> Option<&str> {
		self.file.as_deref()
	}

	pub fn sources(&self) -> &[String] {
		&self.sources
	}

	pub fn names(&self) -> &[String] {
		&self.names
	}

	pub fn lines(&self) -> &[Line] {
		&self.lines
	}

	/// Number of generated lines covered by the mappings.
	pub fn line_count(&self) -> usize {
		self.lines.len()
	}

	pub fn segment_count(&self) -> usize {
		self.lines.iter().map(Line::len).sum()
	}

	/// Embedded content of the source at `index`, if the map carries it.
	pub fn source_content(&self, index: usize) -> Option<&str> {
		self.sources_content.get(index).and_then(|c| c.as_deref())
	}

	pub fn has_sources_content(&self) -> bool {
		self.sources_content.iter().any(|c| c.is_some())
	}

	/// Map a generated position to the original one.
	///
	/// Picks the closest segment at or before `column`. A column in front of
	/// the first segment (leading whitespace, usually) falls back to that first
	/// segment. Returns `None` only for a line past the table or without
	/// segments.
	pub fn map_to_original(&self, line: u32, column: u32) -> Option<SourceMapInfo> {
		let segments = self.lines.get(line as usize)?.segments();

		let idx = segments.partition_point(|s| s.generated_column <= column);
		let segment = match idx {
			0 => segments.first()?,
			_ => &segments[idx - 1],
		};

		Some(self.original_info(segment))
	}

	/// Map a generated line to the original position of its first segment.
	pub fn map_to_original_line(&self, line: u32) -> Option<SourceMapInfo> {
		let segment = self.lines.get(line as usize)?.first()?;
		Some(self.original_info(segment))
	}

	/// Map an original position back into generated code.
	///
	/// The table is indexed by generated position, so this is a heuristic scan
	/// rather than an exact inverse; see [`ReverseScan`].
	pub fn map_to_generated_approx(&self, line: u32, column: u32) -> Option<SourceMapInfo> {
		ReverseScan::new(self, None, line, column).run()
	}

	/// Same as [`map_to_generated_approx`](Self::map_to_generated_approx) but
	/// only considers segments that belong to `sources[source_index]`.
	pub fn map_to_generated_approx_in(
		&self,
		source_index: u32,
		line: u32,
		column: u32,
	) -> Option<SourceMapInfo> {
		ReverseScan::new(self, Some(source_index), line, column).run()
	}

	fn original_info(&self, segment: &Segment) -> SourceMapInfo {
		SourceMapInfo::new(segment.original_line, segment.original_column)
			.with_file_name(self.sources.get(segment.source_index as usize).cloned())
			.with_name(self.name_of(segment))
	}

	fn generated_info(&self, line: u32, column: u32, segment: &Segment) -> SourceMapInfo {
		SourceMapInfo::new(line, column)
			.with_file_name(self.file.clone())
			.with_name(self.name_of(segment))
	}

	fn name_of(&self, segment: &Segment) -> Option<String> {
		segment
			.name_index
			.and_then(|idx| self.names.get(idx as usize).cloned())
	}
}

impl FromStr for SourceMap {
	type Err = SourceMapError;

	fn from_str(s: &str) -> Result<Self> {
		Self::from_bytes(s.as_bytes())
	}
}

/// Prefix a source path with the map's `sourceRoot`.
fn apply_source_root(root: Option<&str>, source: String) -> String {
	match root {
		Some(root) if !root.is_empty() => {
			if root.ends_with('/') || root.ends_with('\\') {
				format!("{}{}", root, source)
			} else {
				format!("{}/{}", root, source)
			}
		}
		_ => source,
	}
}

/// Generated lines that reference the requested original line, kept when no
/// segment matches the requested column exactly.
///
/// The runner-up wins when present: for constructs such as class field
/// initializers the first generated line is the declaration site, and the
/// second is where the code actually runs.
#[derive(Debug, Default)]
struct BestLines<'a> {
	candidate: Option<(u32, &'a Segment)>,
	runner_up: Option<(u32, &'a Segment)>,
}

impl<'a> BestLines<'a> {
	fn offer(&mut self, line: u32, segment: &'a Segment) {
		match self.candidate {
			None => self.candidate = Some((line, segment)),
			Some((held, _)) if held != line && self.runner_up.is_none() => {
				self.runner_up = Some((line, segment));
			}
			_ => {}
		}
	}

	fn is_held(&self) -> bool {
		self.candidate.is_some()
	}

	fn best(&self) -> Option<(u32, &'a Segment)> {
		self.runner_up.or(self.candidate)
	}
}

/// One forward pass over the segment table looking for an original position.
///
/// Per generated line, the segment on the requested original line with the
/// largest original column not past the requested one is the match. It is
/// resolved as soon as a later segment on that line moves past the requested
/// column, or at the end of the line. The generated column is offset by the
/// distance between the requested and matched original columns.
///
/// Without an exact match the scan keeps [`BestLines`] and gives up once it
/// sees a segment for a later original line while holding a candidate.
struct ReverseScan<'a> {
	map: &'a SourceMap,
	source: Option<u32>,
	line: u32,
	column: u32,
}

impl<'a> ReverseScan<'a> {
	fn new(map: &'a SourceMap, source: Option<u32>, line: u32, column: u32) -> Self {
		Self {
			map,
			source,
			line,
			column,
		}
	}

	fn run(&self) -> Option<SourceMapInfo> {
		let mut best = BestLines::default();

		for (gen_line, line) in self.map.lines.iter().enumerate() {
			let gen_line = gen_line as u32;
			let mut matched: Option<&Segment> = None;

			for segment in line.segments() {
				if self.source.is_some_and(|s| s != segment.source_index) {
					continue;
				}

				if segment.original_line == self.line {
					if segment.original_column <= self.column {
						if matched.map_or(true, |m| segment.original_column >= m.original_column) {
							matched = Some(segment);
						}
					} else if let Some(m) = matched {
						return Some(self.exact(gen_line, m));
					}
					best.offer(gen_line, segment);
				} else if segment.original_line > self.line {
					if let Some(m) = matched {
						return Some(self.exact(gen_line, m));
					}
					if best.is_held() {
						return self.fallback(&best);
					}
				}
			}

			if let Some(m) = matched {
				return Some(self.exact(gen_line, m));
			}
		}

		self.fallback(&best)
	}

	fn exact(&self, gen_line: u32, segment: &Segment) -> SourceMapInfo {
		let column = segment
			.generated_column
			.saturating_add(self.column - segment.original_column);
		self.map.generated_info(gen_line, column, segment)
	}

	fn fallback(&self, best: &BestLines<'_>) -> Option<SourceMapInfo> {
		best.best().map(|(gen_line, segment)| {
			self.map
				.generated_info(gen_line, segment.generated_column, segment)
		})
	}
}
