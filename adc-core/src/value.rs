//! ABOUTME: Generic structured value tree used for component properties, template
//! ABOUTME: parameters, and rendered outputs, with explicit dot/bracket path operations

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::fmt;

/// A structured, dynamically typed tree of scalars, lists, and maps.
///
/// Component `properties`, capability template parameters, and step
/// inputs/outputs are all opaque to the core engine until a path is
/// evaluated against them. Rather than model this as a closed Rust enum
/// per capability kind, the core carries one generic tree and resolves
/// paths into it at the renderer/workflow boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Value(pub Json);

impl Value {
    #[must_use]
    pub fn null() -> Self {
        Self(Json::Null)
    }

    #[must_use]
    pub fn object() -> Self {
        Self(Json::Object(serde_json::Map::new()))
    }

    #[must_use]
    pub fn as_json(&self) -> &Json {
        &self.0
    }

    #[must_use]
    pub fn into_json(self) -> Json {
        self.0
    }

    /// Resolve a dot/bracket path such as `spec.replicas` or `cmd[1]` against
    /// this tree. Returns `None` when any segment is missing or the wrong
    /// shape, rather than erroring — callers decide whether a missing path
    /// is fatal.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Json> {
        let segments = parse_path(path);
        let mut current = &self.0;
        for segment in segments {
            current = match segment {
                PathSegment::Key(key) => current.as_object()?.get(&key)?,
                PathSegment::Index(idx) => current.as_array()?.get(idx)?,
            };
        }
        Some(current)
    }

    /// Set a value at a dot/bracket path, creating intermediate objects and
    /// extending arrays with `Json::Null` as needed. Array segments require
    /// the parent to already be (or become) an array.
    pub fn set_path(&mut self, path: &str, value: Json) {
        let segments = parse_path(path);
        set_path_segments(&mut self.0, &segments, value);
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        Self(json)
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::null()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Key(String),
    Index(usize),
}

/// Parses `a.b[0].c` into `[Key(a), Key(b), Index(0), Key(c)]`.
fn parse_path(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }
                let mut index_str = String::new();
                for idx_char in chars.by_ref() {
                    if idx_char == ']' {
                        break;
                    }
                    index_str.push(idx_char);
                }
                if let Ok(idx) = index_str.parse::<usize>() {
                    segments.push(PathSegment::Index(idx));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        segments.push(PathSegment::Key(current));
    }
    segments
}

fn set_path_segments(current: &mut Json, segments: &[PathSegment], value: Json) {
    let Some((head, rest)) = segments.split_first() else {
        *current = value;
        return;
    };

    match head {
        PathSegment::Key(key) => {
            if !current.is_object() {
                *current = Json::Object(serde_json::Map::new());
            }
            let map = current.as_object_mut().expect("just ensured object");
            let entry = map.entry(key.clone()).or_insert(Json::Null);
            if rest.is_empty() {
                *entry = value;
            } else {
                set_path_segments(entry, rest, value);
            }
        }
        PathSegment::Index(idx) => {
            if !current.is_array() {
                *current = Json::Array(Vec::new());
            }
            let arr = current.as_array_mut().expect("just ensured array");
            while arr.len() <= *idx {
                arr.push(Json::Null);
            }
            if rest.is_empty() {
                arr[*idx] = value;
            } else {
                set_path_segments(&mut arr[*idx], rest, value);
            }
        }
    }
}
