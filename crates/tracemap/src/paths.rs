// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Lexical path handling for matching `sources` entries against files.

use std::path::{Component, Path, PathBuf};

/// Remove `.` components and fold `..` into their parent without touching
/// the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
	let mut out = PathBuf::new();
	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				let last = out.components().next_back();
				match last {
					Some(Component::Normal(_)) => {
						out.pop();
					}
					Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
					_ => out.push(".."),
				}
			}
			other => out.push(other.as_os_str()),
		}
	}
	out
}

/// Whether two paths name the same file.
///
/// Canonical paths are compared when both exist; otherwise the lexically
/// normalised forms are.
pub fn same_path(a: &Path, b: &Path) -> bool {
	if let (Ok(ca), Ok(cb)) = (a.canonicalize(), b.canonicalize()) {
		return ca == cb;
	}
	normalize(a) == normalize(b)
}

/// Resolve a `sources` entry against the directory of the generated file.
pub fn resolve_source(generated_file: &Path, source: &str) -> PathBuf {
	let source = Path::new(source);
	match generated_file.parent() {
		Some(dir) if source.is_relative() => dir.join(source),
		_ => source.to_path_buf(),
	}
}

/// Find which `sources` entry, resolved next to `generated_file`, is `original`.
pub fn find_source_index(generated_file: &Path, sources: &[String], original: &Path) -> Option<u32> {
	sources
		.iter()
		.position(|source| same_path(&resolve_source(generated_file, source), original))
		.map(|idx| idx as u32)
}
