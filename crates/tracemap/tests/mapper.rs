// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Discovery and caching behaviour of `SourceMapper` against real files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;
use tracemap::{maybe_map, FunctionInfo, MapCache, SourceMapper};

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
	let path = dir.join(name);
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).unwrap();
	}
	fs::write(&path, contents).unwrap();
	path
}

fn map_json(file: &str, sources: &[&str], mappings: &str) -> String {
	serde_json::json!({
		"version": 3,
		"file": file,
		"sources": sources,
		"names": [],
		"mappings": mappings,
	})
	.to_string()
}

#[test]
fn test_companion_discovery_and_removal() {
	let dir = TempDir::new().unwrap();
	let js = write(dir.path(), "app.js", "var a = 1;\n//# sourceMappingURL=app.js.map\n");
	let map = write(dir.path(), "app.js.map", &map_json("app.js", &["app.ts"], "AAAA"));

	let mut mapper = SourceMapper::new();
	let info = mapper.map_to_original(&js, 0, 0).unwrap();
	assert_eq!(info.file_name.as_deref(), Some("app.ts"));
	assert_eq!(mapper.map_to_original_file(&js).as_deref(), Some("app.ts"));
	assert!(mapper.is_cached(&js));

	fs::remove_file(&map).unwrap();

	assert!(mapper.map_to_original(&js, 0, 0).is_none());
	assert!(mapper.map_to_original_file(&js).is_none());
	assert!(!mapper.is_cached(&js));
}

#[test]
fn test_map_url_falls_back_to_sibling_file_name() {
	let dir = TempDir::new().unwrap();
	let js = write(
		dir.path(),
		"app.js",
		"var a = 1;\n/*# sourceMappingURL=/build/output/app.js.map */\n",
	);
	write(dir.path(), "app.js.map", &map_json("app.js", &["app.ts"], "AAAA"));

	let mut mapper = SourceMapper::new();
	assert_eq!(mapper.map_to_original_file(&js).as_deref(), Some("app.ts"));
}

#[test]
fn test_map_url_resolves_into_subdirectory() {
	let dir = TempDir::new().unwrap();
	let js = write(dir.path(), "b.js", "var b = 1;\n//# sourceMappingURL=maps/b.js.map\n");
	write(dir.path(), "maps/b.js.map", &map_json("b.js", &["b.ts"], "AAAA"));

	let mut mapper = SourceMapper::new();
	assert_eq!(mapper.map_to_original_file(&js).as_deref(), Some("b.ts"));
}

#[test]
fn test_relative_map_url_ignores_working_directory() {
	// the crate's own fixture is reachable through this URL from the test CWD
	let url = "tests/fixtures/greeter.js.map";
	let dir = TempDir::new().unwrap();
	let js = write(dir.path(), "app.js", &format!("var a = 1;\n//# sourceMappingURL={}\n", url));

	let mut mapper = SourceMapper::new();
	assert!(mapper.map_to_original(&js, 0, 0).is_none());

	write(dir.path(), url, &map_json("app.js", &["mine.ts"], "AAAA"));
	mapper.clear();
	assert_eq!(mapper.map_to_original_file(&js).as_deref(), Some("mine.ts"));
}

#[test]
fn test_generated_file_without_comment_is_unmapped() {
	let dir = TempDir::new().unwrap();
	let js = write(dir.path(), "app.js", "var a = 1;\n");
	write(dir.path(), "app.js.map", &map_json("app.js", &["app.ts"], "AAAA"));

	let mut mapper = SourceMapper::new();
	assert!(mapper.map_to_original(&js, 0, 0).is_none());
}

#[test]
fn test_leading_whitespace_is_skipped() {
	let dir = TempDir::new().unwrap();
	let js = write(
		dir.path(),
		"app.js",
		"foo(1, 2);\n    bar();\n//# sourceMappingURL=app.js.map\n",
	);
	// line 1: column 0 belongs to the end of `foo(...)`, column 4 to `bar()`
	write(dir.path(), "app.js.map", &map_json("app.js", &["app.ts"], "AAAA;AAAK,IACL"));

	let mut mapper = SourceMapper::new();
	let info = mapper.map_to_original(&js, 1, 0).unwrap();
	assert_eq!((info.line, info.column), (1, 0));
}

#[test]
fn test_inline_data_url_map() {
	let dir = TempDir::new().unwrap();
	let js = write(
		dir.path(),
		"inline.js",
		"var a = 1;\n//# sourceMappingURL=data:application/json;base64,eyJ2ZXJzaW9uIjozLCJmaWxlIjoiaW5saW5lLmpzIiwic291cmNlcyI6WyJpbmxpbmUudHMiXSwibmFtZXMiOltdLCJtYXBwaW5ncyI6IkFBQUEifQ==\n",
	);

	let mut mapper = SourceMapper::new();
	assert_eq!(mapper.map_to_original_file(&js).as_deref(), Some("inline.ts"));
}

#[test]
fn test_original_file_name_prefers_position() {
	let dir = TempDir::new().unwrap();
	let js = write(
		dir.path(),
		"bundle.js",
		"a();\nb();\n//# sourceMappingURL=bundle.js.map\n",
	);
	write(
		dir.path(),
		"bundle.js.map",
		&map_json("bundle.js", &["a.ts", "b.ts"], "AAAA;ACAA"),
	);

	let mut mapper = SourceMapper::new();
	assert_eq!(
		mapper.original_file_name(&js, Some(1), None).as_deref(),
		Some("b.ts")
	);
	assert_eq!(mapper.original_file_name(&js, None, None).as_deref(), Some("a.ts"));
	// past the mappings: falls back to the file-level answer
	assert_eq!(
		mapper.original_file_name(&js, Some(40), Some(3)).as_deref(),
		Some("a.ts")
	);
}

#[test]
fn test_negative_cache_is_purged_by_forward_load() {
	let dir = TempDir::new().unwrap();
	let ts = write(dir.path(), "src/b.ts", "let b = 1;\n");
	let js = write(
		dir.path(),
		"out/a.js",
		"var b = 1;\n//# sourceMappingURL=a.js.map\n",
	);
	write(dir.path(), "out/a.js.map", &map_json("a.js", &["../src/b.ts"], "AAAA"));

	let mut mapper = SourceMapper::new();
	assert!(mapper.map_to_javascript(&ts, 0, 0).is_none());
	assert!(mapper.is_cached(&ts), "miss should be remembered");

	assert!(mapper.map_to_original(&js, 0, 0).is_some());

	let loc = mapper.map_to_javascript(&ts, 0, 0).unwrap();
	assert_eq!(loc.file, js);
	assert_eq!((loc.line, loc.column), (0, 0));
}

#[test]
fn test_reverse_uses_typescript_sibling_convention() {
	let dir = TempDir::new().unwrap();
	let ts = write(dir.path(), "b.ts", "\n\n\nlet b = 1;\n");
	let js = write(dir.path(), "b.js", "var b = 1;\n");
	write(dir.path(), "b.js.map", &map_json("b.js", &["b.ts"], "AAGA"));

	let mut mapper = SourceMapper::new();
	let loc = mapper.map_to_javascript(&ts, 3, 2).unwrap();
	assert_eq!(loc.file, js);
	assert_eq!((loc.line, loc.column), (0, 2));
}

#[test]
fn test_reverse_falls_back_to_map_file_field() {
	let dir = TempDir::new().unwrap();
	let ts = write(dir.path(), "b.ts", "let b = 1;\n");
	write(dir.path(), "b.js", "var b = 1;\n");
	// sources do not name b.ts, so the map's own `file` is used
	write(dir.path(), "b.js.map", &map_json("bundle.js", &["elsewhere/b.ts"], "AAAA"));

	let mut mapper = SourceMapper::new();
	let loc = mapper.map_to_javascript(&ts, 0, 0).unwrap();
	assert_eq!(loc.file, dir.path().join("bundle.js"));
}

#[test]
fn test_unsupported_version_populates_no_cache() {
	let dir = TempDir::new().unwrap();
	let js = write(dir.path(), "app.js", "var a;\n//# sourceMappingURL=app.js.map\n");
	let bad = r#"{"version":2,"sources":["app.ts"],"names":[],"mappings":"AAAA"}"#;
	write(dir.path(), "app.js.map", bad);
	let ts = write(dir.path(), "app.ts", "let a;\n");

	let mut mapper = SourceMapper::new();
	assert!(mapper.map_to_original(&js, 0, 0).is_none());
	assert!(mapper.map_to_javascript(&ts, 0, 0).is_none());
	assert!(!mapper.is_cached(&js));
	assert!(!mapper.is_cached(&ts));
}

#[test]
fn test_rewritten_map_is_reloaded() {
	let dir = TempDir::new().unwrap();
	let js = write(dir.path(), "app.js", "var a;\n//# sourceMappingURL=app.js.map\n");
	let map = write(dir.path(), "app.js.map", &map_json("app.js", &["old.ts"], "AAAA"));

	let mut mapper = SourceMapper::new();
	assert_eq!(mapper.map_to_original_file(&js).as_deref(), Some("old.ts"));

	fs::write(&map, map_json("app.js", &["new.ts"], "AAAA")).unwrap();
	let later = SystemTime::now() + Duration::from_secs(60);
	fs::File::options()
		.write(true)
		.open(&map)
		.unwrap()
		.set_modified(later)
		.unwrap();

	assert_eq!(mapper.map_to_original_file(&js).as_deref(), Some("new.ts"));
}

#[test]
fn test_invalidate_and_clear() {
	let dir = TempDir::new().unwrap();
	let js = write(dir.path(), "app.js", "var a;\n//# sourceMappingURL=app.js.map\n");
	write(dir.path(), "app.js.map", &map_json("app.js", &["app.ts"], "AAAA"));
	let ts = dir.path().join("app.ts");

	let mut mapper = SourceMapper::new();
	assert!(mapper.map_to_original(&js, 0, 0).is_some());
	assert!(mapper.map_to_javascript(&ts, 0, 0).is_some());
	assert!(mapper.is_cached(&js) && mapper.is_cached(&ts));

	mapper.invalidate(&js);
	assert!(!mapper.is_cached(&js));
	assert!(!mapper.is_cached(&ts), "reverse entry pointing at the file goes too");

	assert!(mapper.map_to_original(&js, 0, 0).is_some());
	mapper.clear();
	assert!(!mapper.is_cached(&js));
}

#[test]
fn test_maybe_map_prefers_recovered_name() {
	let dir = TempDir::new().unwrap();
	let js = write(dir.path(), "app.js", "function t() {}\n");
	let map_path = write(
		dir.path(),
		"app.js.map",
		r#"{"version":3,"sources":["app.ts"],"names":["realName"],"mappings":"AAAAA"}"#,
	);

	let frame = FunctionInfo::new("t")
		.with_namespace("app")
		.with_location(js.to_string_lossy(), 0);

	let mut cache = MapCache::new();
	let mapped = maybe_map(frame.clone(), Some(&mut cache));
	assert_eq!(mapped.function, "realName");
	assert_eq!(mapped.namespace.as_deref(), Some("app"));
	assert_eq!(mapped.line_number, Some(0));
	let expected = dir.path().join("app.ts");
	assert_eq!(mapped.filename.as_deref(), Some(&*expected.to_string_lossy()));
	assert!(cache.contains_key(&map_path));

	// the cached map is reused even though the file is now garbage
	fs::write(&map_path, "not json").unwrap();
	assert_eq!(maybe_map(frame.clone(), Some(&mut cache)).function, "realName");
	assert_eq!(maybe_map(frame.clone(), None), frame);
}

#[test]
fn test_maybe_map_resolves_source_next_to_generated_file() {
	let dir = TempDir::new().unwrap();
	let js = write(dir.path(), "out/app.js", "function run() {}\n");
	write(dir.path(), "out/app.js.map", &map_json("app.js", &["../src/app.ts"], "AAAA"));

	let frame = FunctionInfo::new("run").with_location(js.to_string_lossy(), 0);
	let mapped = maybe_map(frame, None);
	let expected = dir.path().join("src").join("app.ts");
	assert_eq!(mapped.filename.as_deref(), Some(&*expected.to_string_lossy()));
}

#[test]
fn test_maybe_map_without_companion_is_unchanged() {
	let dir = TempDir::new().unwrap();
	let js = write(dir.path(), "plain.js", "function t() {}\n");

	let frame = FunctionInfo::new("t").with_location(js.to_string_lossy(), 0);
	assert_eq!(maybe_map(frame.clone(), None), frame);
}
