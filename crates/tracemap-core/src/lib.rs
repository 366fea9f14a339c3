// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core records for the tracemap source-map translation engine.
//!
//! These are the plain values that cross the boundary between the mapping
//! engine (`tracemap`) and the code that consumes it: breakpoint resolution,
//! call-stack formatting and the `tracemap` command-line tool.
//!
//! # Overview
//!
//! - [`SourceMapInfo`]: the answer to any mapping query
//! - [`GeneratedLocation`]: an original position resolved into generated code
//! - [`FunctionInfo`]: a call-stack frame description that can be remapped
//!
//! All line and column values are zero-based, except [`FunctionInfo::line_number`]
//! which keeps whatever convention the stack producer used.

pub mod frame;
pub mod position;

pub use frame::FunctionInfo;
pub use position::{GeneratedLocation, SourceMapInfo};
