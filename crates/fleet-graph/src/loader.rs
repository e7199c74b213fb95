//! JSON map document loader.
//!
//! # Document format
//!
//! ```json
//! {
//!   "building_name": "warehouse",
//!   "levels": {
//!     "L1": {
//!       "vertices": [[0.0, 0.0, {"name": "dock"}], [5.0, 0.0, {"is_charger": true}], [5.0, 5.0]],
//!       "lanes":    [[0, 1, {"speed_limit": 0.5}], [1, 0], [1, 2, {"distance": 7.5}]]
//!     }
//!   }
//! }
//! ```
//!
//! - A vertex is `[x, y]` or `[x, y, attrs]`.  Recognised attributes:
//!   `name` (string; empty means unnamed) and `is_charger` / `charger` (bool).
//! - A lane is `[from, to]` or `[from, to, attrs]`.  Recognised attributes:
//!   `distance` (number) and `speed_modifier` / `speed_limit` (number).
//!   Unknown attributes are ignored.
//! - The first level in document order is used unless a level name is given.
//!
//! Use [`load_nav_graph_or_empty`] where a broken map must not stop the
//! process: it logs the failure and returns an empty graph.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_json::{Map, Value};

use fleet_core::VertexId;

use crate::graph::{Lane, NavGraph, NavGraphBuilder, Vertex};
use crate::{GraphError, GraphResult};

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a graph from a JSON file.  `level` selects a level by name; `None`
/// takes the first one.
pub fn load_nav_graph(path: &Path, level: Option<&str>) -> GraphResult<NavGraph> {
    let file = File::open(path)?;
    load_nav_graph_reader(BufReader::new(file), level)
}

/// Like [`load_nav_graph`] but accepts any `Read` source.
pub fn load_nav_graph_reader<R: Read>(reader: R, level: Option<&str>) -> GraphResult<NavGraph> {
    let doc: Value = serde_json::from_reader(reader)?;
    parse_nav_graph(&doc, level)
}

/// Load the first level of `path`, degrading to [`NavGraph::empty`] on any
/// failure.
pub fn load_nav_graph_or_empty(path: &Path) -> NavGraph {
    match load_nav_graph(path, None) {
        Ok(graph) => {
            log::info!(
                "loaded building={:?} level={:?} vertices={} lanes={}",
                graph.building_name,
                graph.level_name,
                graph.vertex_count(),
                graph.lane_count(),
            );
            graph
        }
        Err(e) => {
            log::warn!("could not load navigation graph {}: {e}; using an empty graph", path.display());
            NavGraph::empty()
        }
    }
}

/// Build a graph from an already-parsed document.
pub fn parse_nav_graph(doc: &Value, level: Option<&str>) -> GraphResult<NavGraph> {
    let root = doc
        .as_object()
        .ok_or_else(|| format_err("document root must be an object"))?;

    let building = root
        .get("building_name")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let levels = root
        .get("levels")
        .and_then(Value::as_object)
        .ok_or_else(|| format_err("missing \"levels\" object"))?;

    let (level_name, level_data) = match level {
        Some(name) => levels
            .get(name)
            .map(|data| (name.to_owned(), data))
            .ok_or_else(|| format_err(format!("level {name:?} not found")))?,
        None => levels
            .iter()
            .next()
            .map(|(name, data)| (name.clone(), data))
            .ok_or_else(|| format_err("document has no levels"))?,
    };
    let level_data = level_data
        .as_object()
        .ok_or_else(|| format_err(format!("level {level_name:?} must be an object")))?;

    let vertices = array_field(level_data, "vertices")?;
    let lanes = array_field(level_data, "lanes")?;

    let mut b = NavGraphBuilder::with_capacity(vertices.len(), lanes.len());
    b.names(building, level_name.as_str());

    for (i, raw) in vertices.iter().enumerate() {
        b.add_vertex(parse_vertex(i, raw)?);
    }
    for (i, raw) in lanes.iter().enumerate() {
        b.add_lane(parse_lane(i, raw, vertices.len())?);
    }

    Ok(b.build())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn format_err(msg: impl Into<String>) -> GraphError {
    GraphError::Format(msg.into())
}

/// A missing list is treated as empty; a present non-array is an error.
fn array_field<'a>(obj: &'a Map<String, Value>, key: &str) -> GraphResult<&'a [Value]> {
    match obj.get(key) {
        None => Ok(&[]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(format_err(format!("\"{key}\" must be an array"))),
    }
}

fn parse_vertex(i: usize, raw: &Value) -> GraphResult<Vertex> {
    let items = raw
        .as_array()
        .ok_or_else(|| format_err(format!("vertex {i} must be an array")))?;
    let coord = |k: usize| {
        items
            .get(k)
            .and_then(Value::as_f64)
            .ok_or_else(|| format_err(format!("vertex {i} needs numeric x and y")))
    };
    let mut vertex = Vertex::at(coord(0)?, coord(1)?);

    if let Some(attrs) = items.get(2).and_then(Value::as_object) {
        vertex.name = attrs
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        vertex.is_charger = ["is_charger", "charger"]
            .iter()
            .any(|k| attrs.get(*k).and_then(Value::as_bool).unwrap_or(false));
    }
    Ok(vertex)
}

fn parse_lane(i: usize, raw: &Value, vertex_count: usize) -> GraphResult<Lane> {
    let items = raw
        .as_array()
        .ok_or_else(|| format_err(format!("lane {i} must be an array")))?;
    let endpoint = |k: usize| -> GraphResult<VertexId> {
        let idx = items
            .get(k)
            .and_then(Value::as_u64)
            .ok_or_else(|| format_err(format!("lane {i} needs integer endpoints")))?;
        if idx as usize >= vertex_count {
            return Err(format_err(format!("lane {i} references missing vertex {idx}")));
        }
        Ok(VertexId(idx as u32))
    };
    let mut lane = Lane::new(endpoint(0)?, endpoint(1)?);

    if let Some(attrs) = items.get(2).and_then(Value::as_object) {
        lane.distance = attrs.get("distance").and_then(Value::as_f64);
        lane.speed_modifier = ["speed_modifier", "speed_limit"]
            .iter()
            .find_map(|k| attrs.get(*k).and_then(Value::as_f64));
    }
    Ok(lane)
}
