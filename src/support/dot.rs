// Copyright 2025 Cowboy AI, LLC.

//! Dot-path access into JSON values
//!
//! An exact key always wins over path splitting, so `{"a.b": 1}` answers
//! `get("a.b")` with `1`. Numeric segments index into arrays.

use serde_json::{Map, Value as Json};

fn child<'a>(node: &'a Json, segment: &str) -> Option<&'a Json> {
    match node {
        Json::Object(map) => map.get(segment),
        Json::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn child_mut<'a>(node: &'a mut Json, segment: &str) -> Option<&'a mut Json> {
    match node {
        Json::Object(map) => map.get_mut(segment),
        Json::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}

/// Look up `path` in `root`
pub fn get<'a>(root: &'a Json, path: &str) -> Option<&'a Json> {
    if let Some(found) = child(root, path) {
        return Some(found);
    }
    if !path.contains('.') {
        return None;
    }
    path.split('.').try_fold(root, |node, segment| child(node, segment))
}

/// Look up `path` in an object map
pub fn get_in<'a>(map: &'a Map<String, Json>, path: &str) -> Option<&'a Json> {
    if let Some(found) = map.get(path) {
        return Some(found);
    }
    let (head, rest) = path.split_once('.')?;
    get(map.get(head)?, rest)
}

/// True when `path` exists, even if it holds null
pub fn has(root: &Json, path: &str) -> bool {
    get(root, path).is_some()
}

/// Write `value` at `path`, creating intermediate objects.
///
/// Non-object intermediates are replaced by objects.
pub fn set(root: &mut Json, path: &str, value: Json) {
    if !root.is_object() {
        *root = Json::Object(Map::new());
    }
    if let Json::Object(map) = root {
        set_in(map, path, value);
    }
}

/// Write `value` at `path` inside an object map
pub fn set_in(map: &mut Map<String, Json>, path: &str, value: Json) {
    match path.split_once('.') {
        None => {
            map.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = map
                .entry(head.to_string())
                .or_insert_with(|| Json::Object(Map::new()));
            set(entry, rest, value);
        }
    }
}

/// Remove `path`; returns the removed value
pub fn forget(root: &mut Json, path: &str) -> Option<Json> {
    match root {
        Json::Object(map) => forget_in(map, path),
        _ => None,
    }
}

/// Remove `path` from an object map
pub fn forget_in(map: &mut Map<String, Json>, path: &str) -> Option<Json> {
    if let Some(removed) = map.remove(path) {
        return Some(removed);
    }
    let (parent_path, leaf) = path.rsplit_once('.')?;
    let (head, rest) = match parent_path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (parent_path, None),
    };
    let mut parent = map.get_mut(head)?;
    if let Some(rest) = rest {
        for segment in rest.split('.') {
            parent = child_mut(parent, segment)?;
        }
    }
    match parent {
        Json::Object(inner) => inner.remove(leaf),
        _ => None,
    }
}
