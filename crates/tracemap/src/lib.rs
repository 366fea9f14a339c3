// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Source map translation engine for debugger breakpoints and call stacks.
//!
//! This crate provides functionality for:
//! - Decoding Base64 VLQ source map mappings
//! - Parsing JavaScript/TypeScript source maps (v3)
//! - Mapping generated positions to original ones, and back (approximately)
//! - Discovering maps next to files on disk and caching them per session
//! - Remapping call-stack frames through a companion `.map` file
//!
//! # Example
//!
//! ```
//! use tracemap::SourceMap;
//!
//! let map: SourceMap = r#"{
//!     "version": 3,
//!     "file": "app.js",
//!     "sources": ["src/app.ts"],
//!     "names": [],
//!     "mappings": "AAAA;IACE"
//! }"#
//! .parse()
//! .unwrap();
//!
//! let original = map.map_to_original(1, 4).unwrap();
//! assert_eq!(original.file_name.as_deref(), Some("src/app.ts"));
//! assert_eq!((original.line, original.column), (1, 2));
//!
//! let generated = map.map_to_generated_approx(1, 2).unwrap();
//! assert_eq!((generated.line, generated.column), (1, 4));
//! ```

pub mod discovery;
pub mod error;
pub mod mapper;
pub mod paths;
pub mod sourcemap;
pub mod vlq;

// Re-export main types
pub use error::{Result, SourceMapError};
pub use mapper::{maybe_map, MapCache, SourceMapper};
pub use sourcemap::SourceMap;
pub use tracemap_core::{FunctionInfo, GeneratedLocation, SourceMapInfo};
pub use vlq::{decode_vlq_mappings, decode_vlq_segment, Line, Segment};
