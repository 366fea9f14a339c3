// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session-scoped source map cache and lookup facade.
//!
//! A [`SourceMapper`] discovers, loads and memoizes maps for files on disk so
//! callers can translate positions without knowing whether a file is
//! generated or original, or where its map lives. Create one per debug
//! session and pass it to whatever needs mapping. It is not synchronized;
//! wrap it in a `Mutex` if several threads share it.
//!
//! Discovery is best-effort: any I/O or parse failure is logged and treated
//! as "no map".

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracemap_core::{FunctionInfo, GeneratedLocation, SourceMapInfo};
use tracing::{debug, instrument, warn};

use crate::discovery::{self, MapOrigin};
use crate::error::Result;
use crate::paths;
use crate::sourcemap::SourceMap;

/// A generated file's map plus the file's own lines.
#[derive(Debug)]
struct ForwardEntry {
	map: Arc<SourceMap>,
	origin: MapOrigin,
	lines: Vec<String>,
}

/// The map that covers an original file, and the generated file it belongs to.
#[derive(Debug, Clone)]
struct ReverseEntry {
	map: Arc<SourceMap>,
	generated: PathBuf,
	origin: MapOrigin,
}

/// Discovers and caches source maps for one debug session.
#[derive(Debug, Default)]
pub struct SourceMapper {
	/// Keyed by generated file.
	forward: HashMap<PathBuf, ForwardEntry>,
	/// Keyed by original file. `None` records a lookup that found nothing.
	reverse: HashMap<PathBuf, Option<ReverseEntry>>,
}

impl SourceMapper {
	pub fn new() -> Self {
		Self::default()
	}

	/// The first original source of `generated`, if a map can be found.
	#[instrument(level = "debug", skip(self, generated), fields(generated = %generated.display()))]
	pub fn map_to_original_file(&mut self, generated: &Path) -> Option<String> {
		self.forward_entry(generated)?
			.map
			.sources()
			.first()
			.cloned()
	}

	/// Map a zero-based position in a generated file to the original source.
	///
	/// The column is first moved past any whitespace at that point of the line,
	/// so a caller asking for column 0 of an indented statement does not land
	/// on the tail of the previous one.
	#[instrument(level = "debug", skip(self, generated), fields(generated = %generated.display()))]
	pub fn map_to_original(
		&mut self,
		generated: &Path,
		line: u32,
		column: u32,
	) -> Option<SourceMapInfo> {
		let entry = self.forward_entry(generated)?;

		let column = match entry.lines.get(line as usize) {
			Some(text) => skip_whitespace(text, column),
			None => column,
		};

		let info = entry.map.map_to_original(line, column);
		debug!(line, column, found = info.is_some(), "Forward lookup");
		info
	}

	/// Map a zero-based position in an original file to generated code.
	#[instrument(level = "debug", skip(self, original), fields(original = %original.display()))]
	pub fn map_to_javascript(
		&mut self,
		original: &Path,
		line: u32,
		column: u32,
	) -> Option<GeneratedLocation> {
		let entry = self.reverse_entry(original)?;

		let source_index = paths::find_source_index(&entry.generated, entry.map.sources(), original);
		let info = match source_index {
			Some(idx) => entry.map.map_to_generated_approx_in(idx, line, column),
			None => entry.map.map_to_generated_approx(line, column),
		}?;

		let file = if source_index.is_some() {
			entry.generated.clone()
		} else {
			// Best effort: the map's `file` next to the requested original.
			let dir = original.parent().unwrap_or_else(|| Path::new(""));
			match &info.file_name {
				Some(name) => dir.join(name),
				None => entry.generated.clone(),
			}
		};

		debug!(
			generated = %file.display(),
			line = info.line,
			column = info.column,
			"Reverse lookup"
		);

		Some(GeneratedLocation {
			file,
			line: info.line,
			column: info.column,
		})
	}

	/// Original file name for `generated`, position-aware when a line is given.
	pub fn original_file_name(
		&mut self,
		generated: &Path,
		line: Option<u32>,
		column: Option<u32>,
	) -> Option<String> {
		line.and_then(|line| self.map_to_original(generated, line, column.unwrap_or(0)))
			.and_then(|info| info.file_name)
			.or_else(|| self.map_to_original_file(generated))
	}

	/// Drop every cached entry that involves `path`, as generated or original
	/// file.
	pub fn invalidate(&mut self, path: &Path) {
		self.forward.remove(path);
		self.reverse.remove(path);
		self.reverse
			.retain(|_, entry| entry.as_ref().map_or(true, |e| e.generated != path));
	}

	/// Whether `path` has a cache entry, including a negative one.
	pub fn is_cached(&self, path: &Path) -> bool {
		self.forward.contains_key(path) || self.reverse.contains_key(path)
	}

	pub fn clear(&mut self) {
		self.forward.clear();
		self.reverse.clear();
	}

	/// Forward cache lookup with discovery on miss.
	fn forward_entry(&mut self, generated: &Path) -> Option<&ForwardEntry> {
		if self
			.forward
			.get(generated)
			.is_some_and(|entry| entry.origin.is_stale())
		{
			debug!(file = %generated.display(), "Source map changed on disk, reloading");
			self.invalidate(generated);
		}

		if !self.forward.contains_key(generated) {
			let discovered = match discovery::discover_forward(generated) {
				Ok(found) => found?,
				Err(e) => {
					warn!(error = %e, file = %generated.display(), "Failed to load source map");
					return None;
				}
			};

			debug!(
				file = %generated.display(),
				sources = discovered.map.sources().len(),
				"Loaded source map"
			);

			self.forward.insert(
				generated.to_path_buf(),
				ForwardEntry {
					map: Arc::new(discovered.map),
					origin: discovered.origin,
					lines: discovered.lines,
				},
			);

			// A previously unmapped original may be covered by this map now.
			self.reverse.retain(|_, entry| entry.is_some());
		}

		self.forward.get(generated)
	}

	/// Reverse cache lookup with discovery on miss.
	fn reverse_entry(&mut self, original: &Path) -> Option<ReverseEntry> {
		if let Some(cached) = self.reverse.get(original) {
			match cached {
				Some(entry) if entry.origin.is_stale() => {
					debug!(file = %original.display(), "Reverse source map changed on disk");
				}
				_ => return cached.clone(),
			}
		}

		// A map that exists but fails to parse is not cached, so a fixed file
		// is picked up on the next lookup.
		let found = match self.discover_reverse(original) {
			Ok(found) => found,
			Err(e) => {
				warn!(error = %e, file = %original.display(), "Failed to load source map");
				return None;
			}
		};

		if found.is_none() {
			debug!(file = %original.display(), "No source map covers file");
		}
		self.reverse.insert(original.to_path_buf(), found.clone());
		found
	}

	fn discover_reverse(&self, original: &Path) -> Result<Option<ReverseEntry>> {
		for (generated, entry) in &self.forward {
			if entry.origin.is_stale() {
				continue;
			}
			if paths::find_source_index(generated, entry.map.sources(), original).is_some() {
				debug!(
					original = %original.display(),
					generated = %generated.display(),
					"Reusing forward source map"
				);
				return Ok(Some(ReverseEntry {
					map: Arc::clone(&entry.map),
					generated: generated.clone(),
					origin: entry.origin.clone(),
				}));
			}
		}

		Ok(discovery::discover_sibling(original)?.map(|(generated, map, origin)| ReverseEntry {
			map: Arc::new(map),
			generated,
			origin,
		}))
	}
}

/// Advance `column` past whitespace in `text`. Columns count characters.
fn skip_whitespace(text: &str, column: u32) -> u32 {
	let skipped = text
		.chars()
		.skip(column as usize)
		.take_while(|c| c.is_whitespace())
		.count();
	column.saturating_add(skipped as u32)
}

/// Maps already loaded by [`maybe_map`], keyed by map path. `None` records a
/// map that failed to load.
pub type MapCache = HashMap<PathBuf, Option<Arc<SourceMap>>>;

/// Remap a call-stack frame through the `<file>.map` sitting next to its file.
///
/// The declaration line is looked up as given and the original line is
/// returned as found, with no zero/one-based conversion in either direction.
/// For `tsc` output this works out: the runtime reports one-based function
/// lines, `tsc` emits the body on the line after the opening brace, and the
/// two offsets cancel. This depends on the compiler's emission habits and is
/// pinned by the `greeter` fixture test.
///
/// The mapped source is resolved against the generated file's directory.
/// Returns `info` unchanged when there is no companion map or no mapping.
pub fn maybe_map(info: FunctionInfo, cache: Option<&mut MapCache>) -> FunctionInfo {
	let (Some(filename), Some(line)) = (info.filename.clone(), info.line_number) else {
		return info;
	};

	let map_path = discovery::companion_map_path(Path::new(&filename));
	if !map_path.is_file() {
		return info;
	}

	let map = match cache {
		Some(cache) => cache
			.entry(map_path.clone())
			.or_insert_with(|| load_companion(&map_path))
			.clone(),
		None => load_companion(&map_path),
	};

	let Some(mapped) = map.and_then(|map| map.map_to_original_line(line)) else {
		return info;
	};

	debug!(
		function = %info.function,
		line,
		original_line = mapped.line,
		"Remapped stack frame"
	);

	FunctionInfo {
		namespace: info.namespace,
		function: mapped.name.unwrap_or(info.function),
		line_number: Some(mapped.line),
		filename: mapped
			.file_name
			.map(|source| {
				let resolved = paths::resolve_source(Path::new(&filename), &source);
				paths::normalize(&resolved).to_string_lossy().into_owned()
			})
			.or(info.filename),
	}
}

fn load_companion(path: &Path) -> Option<Arc<SourceMap>> {
	match SourceMap::from_path(path) {
		Ok(map) => Some(Arc::new(map)),
		Err(e) => {
			warn!(error = %e, map = %path.display(), "Failed to load companion source map");
			None
		}
	}
}
