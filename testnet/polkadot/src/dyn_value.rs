// Copyright (C) Parity Technologies (UK) Ltd.
// This file is part of Polkadot.

// Polkadot is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Polkadot is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Polkadot.  If not, see <http://www.gnu.org/licenses/>.

//! Path addressed access to untyped JSON documents.
//!
//! Chain specs differ between runtimes in the pallets they configure, so they are edited as
//! [`Value`] trees rather than through a typed schema.

use serde_json::{Map, Value};
use std::fmt;

/// One step of a path: a map key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
	Key(String),
	Index(usize),
}

impl fmt::Display for PathSegment {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			PathSegment::Key(key) => write!(f, "`{key}`"),
			PathSegment::Index(index) => write!(f, "[{index}]"),
		}
	}
}

impl From<&str> for PathSegment {
	fn from(key: &str) -> Self {
		PathSegment::Key(key.into())
	}
}

impl From<String> for PathSegment {
	fn from(key: String) -> Self {
		PathSegment::Key(key)
	}
}

impl From<usize> for PathSegment {
	fn from(index: usize) -> Self {
		PathSegment::Index(index)
	}
}

/// Build a path out of keys and indices: `path!["genesis", "runtime", 0]`.
#[macro_export]
macro_rules! path {
	($($segment:expr),* $(,)?) => {
		vec![$($crate::dyn_value::PathSegment::from($segment)),*]
	};
}

/// Addressing failure, naming the segment that could not be followed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
	#[error("empty path")]
	Empty,
	#[error("segment {position} ({segment}): expected {expected}, found {found}")]
	TypeMismatch { position: usize, segment: PathSegment, expected: &'static str, found: &'static str },
	#[error("segment {position} ({segment}): index out of bounds (length {len})")]
	OutOfBounds { position: usize, segment: PathSegment, len: usize },
	#[error("segment {position} ({segment}): not found")]
	NotFound { position: usize, segment: PathSegment },
}

fn kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "bool",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "sequence",
		Value::Object(_) => "mapping",
	}
}

/// Read the value at `path`.
pub fn get<'a>(document: &'a Value, path: &[PathSegment]) -> Result<&'a Value, PathError> {
	let mut current = document;
	for (position, segment) in path.iter().enumerate() {
		current = match (segment, current) {
			(PathSegment::Key(key), Value::Object(map)) => map
				.get(key)
				.ok_or_else(|| PathError::NotFound { position, segment: segment.clone() })?,
			(PathSegment::Index(index), Value::Array(seq)) => seq.get(*index).ok_or_else(|| {
				PathError::OutOfBounds { position, segment: segment.clone(), len: seq.len() }
			})?,
			(segment, other) => return Err(mismatch(position, segment, other)),
		};
	}
	Ok(current)
}

/// Write `value` at `path`, replacing whatever is there.
///
/// Missing map keys along the way are created as empty maps, and `null` nodes are replaced by
/// maps. Sequences are never grown: an index must address an existing element.
pub fn set(document: &mut Value, value: Value, path: &[PathSegment]) -> Result<(), PathError> {
	let (last, parents) = path.split_last().ok_or(PathError::Empty)?;

	let mut current = document;
	for (position, segment) in parents.iter().enumerate() {
		current = step_or_insert(current, position, segment)?;
	}

	let position = parents.len();
	match (last, current) {
		(PathSegment::Key(key), current) if current.is_null() || current.is_object() => {
			if current.is_null() {
				*current = Value::Object(Map::new());
			}
			if let Value::Object(map) = current {
				map.insert(key.clone(), value);
			}
		},
		(PathSegment::Index(index), Value::Array(seq)) => {
			let len = seq.len();
			let slot = seq
				.get_mut(*index)
				.ok_or_else(|| PathError::OutOfBounds { position, segment: last.clone(), len })?;
			*slot = value;
		},
		(segment, other) => return Err(mismatch(position, segment, other)),
	}
	Ok(())
}

fn step_or_insert<'a>(
	current: &'a mut Value,
	position: usize,
	segment: &PathSegment,
) -> Result<&'a mut Value, PathError> {
	if current.is_null() && matches!(segment, PathSegment::Key(_)) {
		*current = Value::Object(Map::new());
	}
	match (segment, current) {
		(PathSegment::Key(key), Value::Object(map)) =>
			Ok(map.entry(key.clone()).or_insert_with(|| Value::Object(Map::new()))),
		(PathSegment::Index(index), Value::Array(seq)) => {
			let len = seq.len();
			seq.get_mut(*index).ok_or_else(|| PathError::OutOfBounds {
				position,
				segment: segment.clone(),
				len,
			})
		},
		(segment, other) => Err(mismatch(position, segment, other)),
	}
}

fn mismatch(position: usize, segment: &PathSegment, found: &Value) -> PathError {
	let expected = match segment {
		PathSegment::Key(_) => "mapping",
		PathSegment::Index(_) => "sequence",
	};
	PathError::TypeMismatch { position, segment: segment.clone(), expected, found: kind(found) }
}
