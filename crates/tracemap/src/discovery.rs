// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Locating the source map that belongs to a file on disk.
//!
//! Generated files point at their map with a trailing
//! `//# sourceMappingURL=...` (or `/*# ... */`) comment. TypeScript output
//! without such a comment can still be found by the `<name>.js` +
//! `<name>.js.map` sibling convention.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::debug;

use crate::error::{Result, SourceMapError};
use crate::sourcemap::SourceMap;

/// Marker preceding the map location in a generated file.
pub const SOURCE_MAPPING_URL_MARKER: &str = "# sourceMappingURL=";

const DATA_URL_PREFIX: &str = "data:";

/// Where a map was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapOrigin {
	/// A map file, with the modification time seen when it was read.
	File {
		path: PathBuf,
		modified: Option<SystemTime>,
	},
	/// A `data:` URL embedded in the generated file.
	Inline,
}

impl MapOrigin {
	fn file(path: PathBuf) -> Self {
		let modified = modified_time(&path);
		Self::File { path, modified }
	}

	/// Whether the map file behind this origin was removed or rewritten.
	pub fn is_stale(&self) -> bool {
		match self {
			Self::File { path, modified } => !path.is_file() || modified_time(path) != *modified,
			Self::Inline => false,
		}
	}
}

fn modified_time(path: &Path) -> Option<SystemTime> {
	std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// A generated file together with its parsed map.
#[derive(Debug)]
pub struct Discovered {
	pub map: SourceMap,
	pub origin: MapOrigin,
	/// Text of the generated file, one entry per line.
	pub lines: Vec<String>,
}

/// Scan from the last line upwards for the `sourceMappingURL` comment and
/// return the trimmed text after the marker.
pub fn find_source_mapping_url(lines: &[String]) -> Option<&str> {
	lines.iter().rev().find_map(|line| {
		let start = line.find(SOURCE_MAPPING_URL_MARKER)? + SOURCE_MAPPING_URL_MARKER.len();
		let url = line[start..].trim();
		let url = url.strip_suffix("*/").map(str::trim_end).unwrap_or(url);
		(!url.is_empty()).then_some(url)
	})
}

/// Resolve the path named by a `sourceMappingURL` comment.
///
/// A relative URL is resolved against the generated file's directory, never
/// the working directory. An absolute URL is tried as written. Either way the
/// bare file name next to the generated file is the last resort.
pub fn resolve_map_path(generated: &Path, url: &str) -> Option<PathBuf> {
	let candidate = Path::new(url);
	let dir = generated.parent().unwrap_or_else(|| Path::new(""));

	let direct = if candidate.is_absolute() {
		candidate.to_path_buf()
	} else {
		dir.join(candidate)
	};
	if direct.is_file() {
		return Some(direct);
	}

	let sibling = dir.join(candidate.file_name()?);
	sibling.is_file().then_some(sibling)
}

/// Decode a `data:application/json;base64,...` source map URL.
pub fn decode_data_url(url: &str) -> Result<SourceMap> {
	let rest = url
		.strip_prefix(DATA_URL_PREFIX)
		.ok_or_else(|| SourceMapError::InvalidDataUrl(url.to_string()))?;
	let (meta, payload) = rest
		.split_once(',')
		.ok_or_else(|| SourceMapError::InvalidDataUrl(url.to_string()))?;

	let mut params = meta.split(';');
	let mime = params.next().unwrap_or_default();
	if !mime.is_empty() && mime != "application/json" {
		return Err(SourceMapError::InvalidDataUrl(format!("unsupported media type {}", mime)));
	}

	if params.any(|p| p == "base64") {
		let bytes = STANDARD
			.decode(payload)
			.map_err(|e| SourceMapError::InvalidDataUrl(e.to_string()))?;
		SourceMap::from_bytes(&bytes)
	} else {
		payload.parse()
	}
}

/// Read a generated file and load the map its `sourceMappingURL` names.
///
/// `Ok(None)` when the file or its map does not exist.
pub fn discover_forward(generated: &Path) -> Result<Option<Discovered>> {
	if !generated.is_file() {
		debug!(file = %generated.display(), "Generated file does not exist");
		return Ok(None);
	}

	let text = std::fs::read_to_string(generated)?;
	let lines: Vec<String> = text.lines().map(str::to_string).collect();

	let Some(url) = find_source_mapping_url(&lines) else {
		debug!(file = %generated.display(), "No sourceMappingURL comment");
		return Ok(None);
	};

	let (map, origin) = if url.starts_with(DATA_URL_PREFIX) {
		(decode_data_url(url)?, MapOrigin::Inline)
	} else {
		let Some(path) = resolve_map_path(generated, url) else {
			debug!(file = %generated.display(), url, "Source map named by comment not found");
			return Ok(None);
		};
		let origin = MapOrigin::file(path.clone());
		(SourceMap::from_path(&path)?, origin)
	};

	Ok(Some(Discovered { map, origin, lines }))
}

/// Load a map by the TypeScript sibling convention: `foo.ts` compiles to
/// `foo.js` with `foo.js.map` beside it.
///
/// Returns the generated file path along with the map.
pub fn discover_sibling(original: &Path) -> Result<Option<(PathBuf, SourceMap, MapOrigin)>> {
	let generated = original.with_extension("js");
	let mut map_name = generated.clone().into_os_string();
	map_name.push(".map");
	let map_path = PathBuf::from(map_name);

	if generated == original || !generated.is_file() || !map_path.is_file() {
		return Ok(None);
	}

	let map = SourceMap::from_path(&map_path)?;
	Ok(Some((generated, map, MapOrigin::file(map_path))))
}

/// Companion map for call-stack remapping: just `<file>.map`.
pub fn companion_map_path(generated: &Path) -> PathBuf {
	let mut name = generated.as_os_str().to_owned();
	name.push(".map");
	PathBuf::from(name)
}
