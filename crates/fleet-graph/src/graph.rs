//! Navigation graph representation and builder.
//!
//! # Data layout
//!
//! Lanes are stored in **Compressed Sparse Row (CSR)** order.  Given a
//! `VertexId v`, its outgoing lanes occupy the slice:
//!
//! ```text
//! lanes[ vertex_out_start[v] .. vertex_out_start[v+1] ]
//! ```
//!
//! The builder sorts lanes by source vertex with a *stable* sort, so within
//! one vertex the lanes keep the order in which they were added.  That order
//! is what [`NavGraph::connected_vertices`] reports and what Dijkstra relaxes.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps map coordinates to the nearest `VertexId`.
//! Front-ends use it to turn a click position into a vertex.

use std::collections::HashMap;

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use fleet_core::{LaneKey, Point2, VertexId};

use crate::router::{self, Route, Traffic};
use crate::GraphResult;

// ── Vertex / Lane ─────────────────────────────────────────────────────────────

/// A waypoint on the map.  Immutable once the graph is built.
#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    pub pos:        Point2,
    pub name:       Option<String>,
    pub is_charger: bool,
}

impl Vertex {
    pub fn at(x: f64, y: f64) -> Self {
        Self { pos: Point2::new(x, y), name: None, is_charger: false }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn charger(mut self) -> Self {
        self.is_charger = true;
        self
    }
}

/// A directed lane between two vertices.
#[derive(Clone, Debug, PartialEq)]
pub struct Lane {
    pub from:           VertexId,
    pub to:             VertexId,
    /// Explicit length; `None` means "Euclidean distance between endpoints".
    pub distance:       Option<f64>,
    /// Multiplier on robot speed while traversing this lane.
    pub speed_modifier: Option<f64>,
}

impl Lane {
    pub fn new(from: VertexId, to: VertexId) -> Self {
        Self { from, to, distance: None, speed_modifier: None }
    }

    #[inline]
    pub fn key(&self) -> LaneKey {
        LaneKey::new(self.from, self.to)
    }
}

// ── R-tree vertex entry ───────────────────────────────────────────────────────

#[derive(Clone)]
struct VertexEntry {
    point: [f64; 2],
    id:    VertexId,
}

impl RTreeObject for VertexEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for VertexEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── NavGraph ──────────────────────────────────────────────────────────────────

/// Directed navigation graph in CSR format plus a spatial index.
///
/// Do not construct directly; use [`NavGraphBuilder`] or the loader.
pub struct NavGraph {
    /// Building the map belongs to (empty for hand-built graphs).
    pub building_name: String,
    /// Level of the building this graph was loaded from.
    pub level_name:    String,

    vertices:         Vec<Vertex>,
    /// CSR row pointer.  Length = `vertex_count + 1`.
    vertex_out_start: Vec<u32>,
    /// Lanes sorted (stably) by source vertex.
    lanes:            Vec<Lane>,
    /// `(from, to)` → position in `lanes`.  The first lane added wins on
    /// duplicates.
    lane_index:       HashMap<LaneKey, usize>,
    spatial_idx:      RTree<VertexEntry>,
}

impl NavGraph {
    /// A graph with no vertices or lanes.  Every routing request against it
    /// returns [`GraphError::NoRoute`](crate::GraphError::NoRoute) or
    /// [`GraphError::VertexNotFound`](crate::GraphError::VertexNotFound).
    pub fn empty() -> Self {
        NavGraphBuilder::new().build()
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn contains(&self, v: VertexId) -> bool {
        v.index() < self.vertices.len()
    }

    // ── Static lookups ────────────────────────────────────────────────────

    pub fn vertex(&self, v: VertexId) -> Option<&Vertex> {
        self.vertices.get(v.index())
    }

    /// All vertices with their ids, in id order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (VertexId(i as u32), v))
    }

    pub fn vertex_pos(&self, v: VertexId) -> Option<Point2> {
        self.vertex(v).map(|vx| vx.pos)
    }

    /// Display name of `v`; falls back to `V<index>` when unnamed.
    pub fn vertex_name(&self, v: VertexId) -> String {
        self.vertex(v)
            .and_then(|vx| vx.name.clone())
            .unwrap_or_else(|| v.to_string())
    }

    /// Vertices that carry an explicit name.
    pub fn named_vertices(&self) -> Vec<(VertexId, &str)> {
        self.vertices()
            .filter_map(|(id, vx)| vx.name.as_deref().map(|n| (id, n)))
            .collect()
    }

    pub fn is_charger(&self, v: VertexId) -> bool {
        self.vertex(v).is_some_and(|vx| vx.is_charger)
    }

    pub fn charger_vertices(&self) -> Vec<VertexId> {
        self.vertices()
            .filter(|(_, vx)| vx.is_charger)
            .map(|(id, _)| id)
            .collect()
    }

    // ── Lanes ─────────────────────────────────────────────────────────────

    /// All lanes, grouped by source vertex.
    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    /// Outgoing lanes of `v` in insertion order.  Empty for unknown vertices.
    #[inline]
    pub fn out_lanes(&self, v: VertexId) -> &[Lane] {
        if !self.contains(v) {
            return &[];
        }
        let start = self.vertex_out_start[v.index()] as usize;
        let end   = self.vertex_out_start[v.index() + 1] as usize;
        &self.lanes[start..end]
    }

    /// Vertices reachable from `v` over one outgoing lane, in insertion order.
    pub fn connected_vertices(&self, v: VertexId) -> Vec<VertexId> {
        self.out_lanes(v).iter().map(|l| l.to).collect()
    }

    pub fn lane(&self, key: LaneKey) -> Option<&Lane> {
        self.lane_index.get(&key).map(|&i| &self.lanes[i])
    }

    pub fn has_lane(&self, key: LaneKey) -> bool {
        self.lane_index.contains_key(&key)
    }

    /// Length of lane `a → b`: the explicit distance if present, otherwise the
    /// Euclidean distance between the endpoints.  `None` if there is no lane.
    pub fn lane_distance(&self, a: VertexId, b: VertexId) -> Option<f64> {
        let lane = self.lane(LaneKey::new(a, b))?;
        Some(self.lane_length(lane))
    }

    /// Speed multiplier for `key`; `1.0` when absent or not a lane.
    pub fn lane_speed_modifier(&self, key: LaneKey) -> f64 {
        self.lane(key)
            .and_then(|l| l.speed_modifier)
            .unwrap_or(1.0)
    }

    #[inline]
    pub(crate) fn lane_length(&self, lane: &Lane) -> f64 {
        match lane.distance {
            Some(d) => d,
            None => self.vertices[lane.from.index()]
                .pos
                .distance(self.vertices[lane.to.index()].pos),
        }
    }

    /// Total length of a vertex path, or `None` if any hop is not a lane.
    pub fn path_cost(&self, path: &[VertexId]) -> Option<f64> {
        LaneKey::along(path)
            .map(|k| self.lane_distance(k.from, k.to))
            .sum()
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// The vertex nearest to `point`, or `None` if the graph has no vertices.
    pub fn nearest_vertex(&self, point: Point2) -> Option<VertexId> {
        self.spatial_idx
            .nearest_neighbor(&[point.x, point.y])
            .map(|e| e.id)
    }

    /// The nearest vertex within `radius` of `point`.
    pub fn vertex_within(&self, point: Point2, radius: f64) -> Option<VertexId> {
        let v = self.nearest_vertex(point)?;
        let pos = self.vertex_pos(v)?;
        (pos.distance(point) <= radius).then_some(v)
    }

    // ── Routing ───────────────────────────────────────────────────────────

    /// See [`router::shortest_path`].
    pub fn shortest_path(
        &self,
        start:   VertexId,
        end:     VertexId,
        traffic: Traffic<'_>,
    ) -> GraphResult<Route> {
        router::shortest_path(self, start, end, traffic)
    }

    /// See [`router::k_shortest_paths`].
    pub fn k_shortest_paths(&self, start: VertexId, end: VertexId, k: usize) -> Vec<Route> {
        router::k_shortest_paths(self, start, end, k)
    }
}

// ── NavGraphBuilder ───────────────────────────────────────────────────────────

/// Construct a [`NavGraph`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use fleet_graph::{NavGraphBuilder, Vertex};
///
/// let mut b = NavGraphBuilder::new();
/// let a = b.add_vertex(Vertex::at(0.0, 0.0));
/// let c = b.add_vertex(Vertex::at(3.0, 4.0).charger());
/// b.add_lane_pair(a, c);
/// let graph = b.build();
/// assert_eq!(graph.lane_count(), 2);
/// assert_eq!(graph.lane_distance(a, c), Some(5.0));
/// ```
#[derive(Default)]
pub struct NavGraphBuilder {
    building_name: String,
    level_name:    String,
    vertices:      Vec<Vertex>,
    lanes:         Vec<Lane>,
}

impl NavGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, lanes: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            lanes:    Vec::with_capacity(lanes),
            ..Self::default()
        }
    }

    pub fn names(&mut self, building: impl Into<String>, level: impl Into<String>) -> &mut Self {
        self.building_name = building.into();
        self.level_name = level.into();
        self
    }

    /// Add a vertex and return its `VertexId` (sequential from 0).
    pub fn add_vertex(&mut self, vertex: Vertex) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(vertex);
        id
    }

    /// Add a **directed** lane.
    pub fn add_lane(&mut self, lane: Lane) {
        self.lanes.push(lane);
    }

    /// Convenience: directed lane with no explicit attributes.
    pub fn add_directed(&mut self, from: VertexId, to: VertexId) {
        self.add_lane(Lane::new(from, to));
    }

    /// Convenience: lanes in **both directions**.
    pub fn add_lane_pair(&mut self, a: VertexId, b: VertexId) {
        self.add_directed(a, b);
        self.add_directed(b, a);
    }

    pub fn vertex_count(&self) -> usize { self.vertices.len() }
    pub fn lane_count(&self) -> usize { self.lanes.len() }

    /// Consume the builder and produce a [`NavGraph`].
    ///
    /// Lanes whose endpoints do not exist are dropped, as are explicit
    /// distances that are negative or not finite (the lane falls back to its
    /// Euclidean length).
    pub fn build(self) -> NavGraph {
        let vertex_count = self.vertices.len();

        let mut lanes: Vec<Lane> = self
            .lanes
            .into_iter()
            .filter(|l| {
                let ok = l.from.index() < vertex_count && l.to.index() < vertex_count;
                if !ok {
                    log::warn!("dropping lane {} with unknown endpoint", l.key());
                }
                ok
            })
            .map(|mut l| {
                if l.distance.is_some_and(|d| !(d.is_finite() && d >= 0.0)) {
                    l.distance = None;
                }
                if l.speed_modifier.is_some_and(|s| !(s.is_finite() && s > 0.0)) {
                    l.speed_modifier = None;
                }
                l
            })
            .collect();

        // Stable: per-vertex lane order is insertion order.
        lanes.sort_by_key(|l| l.from.0);

        let mut vertex_out_start = vec![0u32; vertex_count + 1];
        for l in &lanes {
            vertex_out_start[l.from.index() + 1] += 1;
        }
        for i in 1..=vertex_count {
            vertex_out_start[i] += vertex_out_start[i - 1];
        }
        debug_assert_eq!(vertex_out_start[vertex_count] as usize, lanes.len());

        let mut lane_index = HashMap::with_capacity(lanes.len());
        for (i, l) in lanes.iter().enumerate() {
            lane_index.entry(l.key()).or_insert(i);
        }

        let entries: Vec<VertexEntry> = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, v)| VertexEntry {
                point: [v.pos.x, v.pos.y],
                id:    VertexId(i as u32),
            })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        NavGraph {
            building_name: self.building_name,
            level_name: self.level_name,
            vertices: self.vertices,
            vertex_out_start,
            lanes,
            lane_index,
            spatial_idx,
        }
    }
}
