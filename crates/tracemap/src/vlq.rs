// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! VLQ (Variable-Length Quantity) decoder for source map mappings.
//!
//! Source maps use Base64 VLQ encoding for compact storage of line/column mappings.
//! This module decodes the `mappings` field into per-line segment tables following
//! the Source Map Revision 3 format.

use crate::error::{Result, SourceMapError};

/// Base64 character set used in VLQ encoding.
const BASE64_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const CONTINUATION_BIT: u8 = 0b10_0000;
const VALUE_MASK: u8 = 0b01_1111;

/// Shift of the last chunk that can still contribute to a 32-bit magnitude
/// plus its sign bit.
const MAX_SHIFT: u32 = 30;

/// Decode a Base64 character to its 6-bit value.
fn decode_char(ch: u8) -> Result<u8> {
	BASE64_CHARS
		.iter()
		.position(|&c| c == ch)
		.map(|pos| pos as u8)
		.ok_or(SourceMapError::InvalidVlqChar(ch as char))
}

/// Decode a VLQ-encoded segment into a vector of signed integers.
///
/// Each segment represents one or more values:
/// - Minimum 1 value: generated column offset
/// - Optional 3 more values: source index, original line, original column
/// - Optional 5th value: name index
///
/// What the values mean is up to the caller; this only undoes the encoding.
pub fn decode_vlq_segment(segment: &str) -> Result<Vec<i32>> {
	let mut values = Vec::new();
	let mut value = 0u64;
	let mut shift = 0u32;
	let mut continued = false;

	for ch in segment.bytes() {
		let digit = decode_char(ch)?;

		if shift > MAX_SHIFT {
			return Err(SourceMapError::VlqOverflow);
		}

		continued = digit & CONTINUATION_BIT != 0;
		value |= u64::from(digit & VALUE_MASK) << shift;
		shift += 5;

		if !continued {
			values.push(from_vlq_signed(value)?);
			value = 0;
			shift = 0;
		}
	}

	if continued {
		return Err(SourceMapError::UnterminatedVlq);
	}

	Ok(values)
}

/// Convert from sign-magnitude (sign in the lowest bit) to two's complement.
fn from_vlq_signed(value: u64) -> Result<i32> {
	let negative = value & 1 != 0;
	let magnitude = value >> 1;

	if negative {
		// -2^31 has no positive counterpart, so it gets one extra step of range.
		if magnitude > 1 << 31 {
			return Err(SourceMapError::VlqOverflow);
		}
		Ok((-(magnitude as i64)) as i32)
	} else {
		i32::try_from(magnitude).map_err(|_| SourceMapError::VlqOverflow)
	}
}

/// A single mapped point within a generated line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
	/// Column in the generated line (0-indexed).
	pub generated_column: u32,
	/// Index into the sources array.
	pub source_index: u32,
	/// Line in the original file (0-indexed).
	pub original_line: u32,
	/// Column in the original file (0-indexed).
	pub original_column: u32,
	/// Optional index into the names array.
	pub name_index: Option<u32>,
}

/// The segments of one generated line, in ascending generated column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
	segments: Vec<Segment>,
}

impl Line {
	pub fn segments(&self) -> &[Segment] {
		&self.segments
	}

	pub fn first(&self) -> Option<&Segment> {
		self.segments.first()
	}

	pub fn len(&self) -> usize {
		self.segments.len()
	}

	pub fn is_empty(&self) -> bool {
		self.segments.is_empty()
	}
}

/// Running totals for the delta-encoded fields.
///
/// The generated column restarts on every line. Everything else carries over
/// from the previous segment anywhere in the map.
#[derive(Debug, Default)]
struct DeltaState {
	source: i64,
	original_line: i64,
	original_column: i64,
	name: i64,
}

fn non_negative(value: i64, field: &'static str, line: usize) -> Result<u32> {
	u32::try_from(value).map_err(|_| SourceMapError::NegativeValue { field, line })
}

/// Decode VLQ-encoded source map mappings string into a per-line table.
///
/// The mappings string format:
/// - Lines are separated by semicolons (;)
/// - Segments within a line are separated by commas (,)
/// - Each segment contains 1, 4, or 5 VLQ-encoded values
///
/// Every `;`-separated element produces a [`Line`], including empty ones, so
/// the table index always equals the generated line number. Single-field
/// segments carry the running source position of the segment before them.
pub fn decode_vlq_mappings(mappings: &str) -> Result<Vec<Line>> {
	let mut lines = Vec::new();
	let mut state = DeltaState::default();

	for (line_no, text) in mappings.split(';').enumerate() {
		let mut line = Line::default();
		let mut generated_column = 0i64;

		for segment in text.split(',') {
			if segment.is_empty() {
				continue;
			}

			let values = decode_vlq_segment(segment)?;
			if values.is_empty() {
				continue;
			}

			generated_column += i64::from(values[0]);

			if values.len() >= 4 {
				state.source += i64::from(values[1]);
				state.original_line += i64::from(values[2]);
				state.original_column += i64::from(values[3]);
			}

			let name_index = if values.len() >= 5 {
				state.name += i64::from(values[4]);
				Some(non_negative(state.name, "name index", line_no)?)
			} else {
				None
			};

			line.segments.push(Segment {
				generated_column: non_negative(generated_column, "generated column", line_no)?,
				source_index: non_negative(state.source, "source index", line_no)?,
				original_line: non_negative(state.original_line, "original line", line_no)?,
				original_column: non_negative(state.original_column, "original column", line_no)?,
				name_index,
			});
		}

		lines.push(line);
	}

	Ok(lines)
}
