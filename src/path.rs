//! Location paths inside a [`Value`] and the primitive read/write/delete
//! operations that indexing and update-assignment are built from.

use crate::{
    evaluator::EvalError,
    value::{Map, Value},
};

/// A segment in a navigable path.
///
/// Paths are produced by the `paths` side of filter evaluation and used to
/// locate and modify values during update-assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// Object field access by name
    ///
    /// # Examples
    /// - `.name` → `Field("name")`
    /// - `.["user"].email` → `[Field("user"), Field("email")]`
    Field(String),

    /// Array element access by index
    ///
    /// # Examples
    /// - `.items[0]` → `[Field("items"), Index(0)]`
    /// - `.[-1]` → `Index(-1)` (resolved against the length when applied)
    Index(i64),

    /// Array range (`.[2:4]`); missing bounds mean "from the start"/"to the end"
    Slice { start: Option<i64>, end: Option<i64> },
}

/// A sequence of path segments from the root of a document.
///
/// For `.items[0].price` the path is:
/// - `PathSegment::Field("items")`
/// - `PathSegment::Index(0)`
/// - `PathSegment::Field("price")`
pub type Path = Vec<PathSegment>;

impl PathSegment {
    pub fn to_value(&self) -> Value {
        match self {
            PathSegment::Field(name) => Value::String(name.clone()),
            PathSegment::Index(i) => Value::Number(*i as f64),
            PathSegment::Slice { start, end } => {
                let bound = |b: &Option<i64>| b.map_or(Value::Null, |n| Value::Number(n as f64));
                let mut map = Map::new();
                map.insert("start".to_string(), bound(start));
                map.insert("end".to_string(), bound(end));
                Value::Object(map)
            }
        }
    }

    pub fn from_value(value: &Value) -> Result<PathSegment, EvalError> {
        match value {
            Value::String(s) => Ok(PathSegment::Field(s.clone())),
            Value::Number(n) => Ok(PathSegment::Index(n.floor() as i64)),
            Value::Object(map) if map.contains_key("start") || map.contains_key("end") => {
                let bound = |key: &str| match map.get(key) {
                    Some(Value::Number(n)) => Ok(Some(n.floor() as i64)),
                    Some(Value::Null) | None => Ok(None),
                    Some(other) => Err(EvalError::Type(format!(
                        "Slice bounds must be numbers, got {}",
                        other.type_name()
                    ))),
                };
                Ok(PathSegment::Slice {
                    start: bound("start")?,
                    end: bound("end")?,
                })
            }
            other => Err(EvalError::Type(format!(
                "Path components must be strings, numbers or slices, got {}",
                other.type_name()
            ))),
        }
    }
}

/// Render a path the way the language sees it: an array of keys and indices.
pub fn path_to_value(path: &[PathSegment]) -> Value {
    Value::Array(path.iter().map(PathSegment::to_value).collect())
}

pub fn path_from_value(value: &Value) -> Result<Path, EvalError> {
    match value {
        Value::Array(items) => items.iter().map(PathSegment::from_value).collect(),
        other => Err(EvalError::Type(format!(
            "Path must be specified as an array, got {}",
            other.type_name()
        ))),
    }
}

// ========================================
// Reading
// ========================================

fn cannot_index(target: &Value, key: &Value) -> EvalError {
    match key {
        Value::String(k) => EvalError::Type(format!(
            "Cannot index {} with \"{}\"",
            target.type_name(),
            k
        )),
        _ => EvalError::Type(format!(
            "Cannot index {} with {}",
            target.type_name(),
            key.type_name()
        )),
    }
}

/// Largest index an assignment may grow an array to.
const MAX_ARRAY_INDEX: usize = 536_870_911;

/// Resolve a possibly negative index against `len`. `None` when it wraps
/// below zero.
fn resolve_index(len: usize, index: i64) -> Option<usize> {
    if index < 0 {
        let wrapped = len as i64 + index;
        (wrapped >= 0).then_some(wrapped as usize)
    } else {
        Some(index as usize)
    }
}

/// Clamp slice bounds to `0..=len`, wrapping negative ones.
fn resolve_range(len: usize, start: Option<f64>, end: Option<f64>) -> (usize, usize) {
    let clamp = |bound: f64| {
        let wrapped = if bound < 0.0 { len as f64 + bound } else { bound };
        wrapped.clamp(0.0, len as f64) as usize
    };
    let from = start.map_or(0, |s| clamp(s.floor()));
    let to = end.map_or(len, |e| clamp(e.ceil()));
    (from, to.max(from))
}

/// `target[key]` with the language's rules: negative indices wrap, missing
/// entries are null, and null can be indexed by anything addressable.
pub fn index(target: &Value, key: &Value) -> Result<Value, EvalError> {
    match (target, key) {
        (Value::Object(map), Value::String(k)) => Ok(map.get(k).cloned().unwrap_or_default()),
        (Value::Array(arr), Value::Number(n)) => Ok(resolve_index(arr.len(), n.floor() as i64)
            .and_then(|i| arr.get(i))
            .cloned()
            .unwrap_or_default()),
        (Value::Null, Value::String(_) | Value::Number(_) | Value::Null) => Ok(Value::Null),
        (Value::Array(_) | Value::Null, Value::Object(bounds)) => {
            let start = slice_bound(bounds.get("start"))?;
            let end = slice_bound(bounds.get("end"))?;
            slice(target, start, end)
        }
        _ => Err(cannot_index(target, key)),
    }
}

fn slice_bound(bound: Option<&Value>) -> Result<Option<f64>, EvalError> {
    match bound {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(*n)),
        Some(other) => Err(EvalError::Type(format!(
            "Start and end indices of a slice must be numbers, got {}",
            other.type_name()
        ))),
    }
}

/// Subarray or substring between the given bounds.
pub fn slice(target: &Value, start: Option<f64>, end: Option<f64>) -> Result<Value, EvalError> {
    match target {
        Value::Null => Ok(Value::Null),
        Value::Array(arr) => {
            let (from, to) = resolve_range(arr.len(), start, end);
            Ok(Value::Array(arr[from..to].to_vec()))
        }
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (from, to) = resolve_range(chars.len(), start, end);
            Ok(Value::String(chars[from..to].iter().collect()))
        }
        other => Err(EvalError::Type(format!(
            "Cannot slice {}",
            other.type_name()
        ))),
    }
}

/// Validate that `key` can address into `target` and return the segment.
pub fn segment_for(target: &Value, key: &Value) -> Result<PathSegment, EvalError> {
    match (target, key) {
        (Value::Object(_) | Value::Null, Value::String(k)) => Ok(PathSegment::Field(k.clone())),
        (Value::Array(_) | Value::Null, Value::Number(n)) => Ok(PathSegment::Index(n.floor() as i64)),
        (Value::Array(_) | Value::Null, Value::Object(_)) => PathSegment::from_value(key),
        _ => Err(cannot_index(target, key)),
    }
}

pub fn get(target: &Value, segment: &PathSegment) -> Result<Value, EvalError> {
    match segment {
        PathSegment::Slice { start, end } => slice(
            target,
            start.map(|n| n as f64),
            end.map(|n| n as f64),
        ),
        other => index(target, &other.to_value()),
    }
}

/// Read the value at `path`; anything missing along the way reads as null.
pub fn get_path(root: &Value, path: &[PathSegment]) -> Result<Value, EvalError> {
    let mut current = root.clone();
    for segment in path {
        if current == Value::Null {
            return Ok(Value::Null);
        }
        current = get(&current, segment)?;
    }
    Ok(current)
}

// ========================================
// Writing
// ========================================

/// Write `new` at `path`, creating objects and null-padded arrays as needed.
pub fn set_path(current: &mut Value, path: &[PathSegment], new: Value) -> Result<(), EvalError> {
    let Some((segment, rest)) = path.split_first() else {
        *current = new;
        return Ok(());
    };

    if *current == Value::Null {
        *current = match segment {
            PathSegment::Field(_) => Value::Object(Map::new()),
            _ => Value::Array(Vec::new()),
        };
    }

    match (current, segment) {
        (Value::Object(map), PathSegment::Field(key)) => {
            let child = map.entry(key.clone()).or_insert(Value::Null);
            set_path(child, rest, new)
        }
        (Value::Array(arr), PathSegment::Index(idx)) => {
            let index = resolve_index(arr.len(), *idx)
                .ok_or_else(|| EvalError::Type("Out of bounds negative array index".to_string()))?;
            if index > MAX_ARRAY_INDEX {
                return Err(EvalError::Type("Array index too large".to_string()));
            }
            if index >= arr.len() {
                arr.resize(index + 1, Value::Null);
            }
            set_path(&mut arr[index], rest, new)
        }
        (Value::Array(arr), PathSegment::Slice { start, end }) => {
            let (from, to) = resolve_range(
                arr.len(),
                start.map(|n| n as f64),
                end.map(|n| n as f64),
            );
            let mut replacement = Value::Array(arr[from..to].to_vec());
            set_path(&mut replacement, rest, new)?;
            match replacement {
                Value::Array(items) => {
                    arr.splice(from..to, items);
                    Ok(())
                }
                other => Err(EvalError::Type(format!(
                    "A slice of an array can only be assigned another array, got {}",
                    other.type_name()
                ))),
            }
        }
        (v, segment) => Err(cannot_index(v, &segment.to_value())),
    }
}

/// Remove the value at `path`. Missing locations are a no-op.
pub fn delete_path(current: &mut Value, path: &[PathSegment]) -> Result<(), EvalError> {
    let Some((segment, rest)) = path.split_first() else {
        *current = Value::Null;
        return Ok(());
    };

    match (&mut *current, segment) {
        (Value::Null, _) => Ok(()),
        (Value::Object(map), PathSegment::Field(key)) => {
            if rest.is_empty() {
                map.shift_remove(key);
                Ok(())
            } else if let Some(child) = map.get_mut(key) {
                delete_path(child, rest)
            } else {
                Ok(())
            }
        }
        (Value::Array(arr), PathSegment::Index(idx)) => {
            let Some(index) = resolve_index(arr.len(), *idx).filter(|i| *i < arr.len()) else {
                return Ok(());
            };
            if rest.is_empty() {
                arr.remove(index);
                Ok(())
            } else {
                delete_path(&mut arr[index], rest)
            }
        }
        (Value::Array(arr), PathSegment::Slice { start, end }) => {
            let (from, to) = resolve_range(
                arr.len(),
                start.map(|n| n as f64),
                end.map(|n| n as f64),
            );
            if rest.is_empty() {
                arr.drain(from..to);
                return Ok(());
            }
            let mut sub = Value::Array(arr[from..to].to_vec());
            delete_path(&mut sub, rest)?;
            if let Value::Array(items) = sub {
                arr.splice(from..to, items);
            }
            Ok(())
        }
        (v, segment) => Err(EvalError::Type(format!(
            "Cannot delete field at {} of {}",
            segment.to_value(),
            v.type_name()
        ))),
    }
}

/// Delete several paths at once. Deeper and later locations go first so
/// earlier array positions stay valid.
pub fn delete_paths(root: &mut Value, mut paths: Vec<Path>) -> Result<(), EvalError> {
    paths.sort_by_key(|p| std::cmp::Reverse(path_to_value(p)));
    for path in &paths {
        delete_path(root, path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(text: &str) -> Value {
        Value::from_json_str(text).unwrap()
    }

    #[test]
    fn test_index_wraps_negative() {
        let arr = json("[10, 20, 30]");
        assert_eq!(index(&arr, &Value::from(-1i64)).unwrap(), Value::from(30i64));
        assert_eq!(index(&arr, &Value::from(-4i64)).unwrap(), Value::Null);
    }

    #[test]
    fn test_index_type_error_message() {
        let err = index(&json("[1]"), &Value::from("a")).unwrap_err();
        assert_eq!(err, EvalError::Type("Cannot index array with \"a\"".to_string()));
    }

    #[test]
    fn test_slice_strings_by_char() {
        let s = Value::from("héllo");
        assert_eq!(slice(&s, Some(1.0), Some(3.0)).unwrap(), Value::from("él"));
    }

    #[test]
    fn test_set_path_autovivifies() {
        let mut root = Value::Null;
        let path = vec![PathSegment::Field("a".to_string()), PathSegment::Index(2)];
        set_path(&mut root, &path, Value::from(true)).unwrap();
        assert_eq!(root, json(r#"{"a": [null, null, true]}"#));
    }

    #[test]
    fn test_delete_paths_keeps_positions() {
        let mut root = json("[0, 1, 2, 3]");
        delete_paths(&mut root, vec![vec![PathSegment::Index(1)], vec![PathSegment::Index(2)]]).unwrap();
        assert_eq!(root, json("[0, 3]"));
    }

    #[test]
    fn test_path_value_round_trip() {
        let path = vec![
            PathSegment::Field("a".to_string()),
            PathSegment::Slice { start: Some(1), end: None },
        ];
        assert_eq!(path_from_value(&path_to_value(&path)).unwrap(), path);
    }
}
