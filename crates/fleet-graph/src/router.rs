//! Shortest-path and k-shortest-path search over a [`NavGraph`].
//!
//! # Traffic awareness
//!
//! [`shortest_path`] optionally consults a [`LaneOracle`] and multiplies the
//! length of every lane it reports as reserved by a penalty.  Reserved lanes
//! are discouraged, never forbidden: if every alternative is also reserved a
//! path is still returned.
//!
//! # Determinism
//!
//! The frontier is a min-heap keyed on `(distance, VertexId)`, so among equal
//! tentative distances the lowest vertex index is settled first.  Relaxation
//! uses strict `<`, so the first predecessor found for a vertex is kept.  On
//! symmetric graphs this always yields the same path.
//!
//! # k-shortest paths
//!
//! [`k_shortest_paths`] is the spur/root iterative method.  Each spur search
//! runs on a filtered *view* of the graph described by an [`Exclusions`] set;
//! the graph itself is never mutated, so there is nothing to restore.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use ordered_float::OrderedFloat;

use fleet_core::{LaneKey, VertexId};

use crate::graph::NavGraph;
use crate::{GraphError, GraphResult};

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a routing query: the vertices to visit in order (including
/// both endpoints) and the total lane length.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub vertices: Vec<VertexId>,
    /// Sum of lane lengths, *without* traffic penalties.
    pub cost:     f64,
}

impl Route {
    pub fn into_vertices(self) -> Vec<VertexId> {
        self.vertices
    }
}

// ── Traffic ───────────────────────────────────────────────────────────────────

/// Answers "is this lane currently reserved by someone else?".
///
/// The coordinator implements it over its reservation table, excluding the
/// requesting robot's own reservations.  Any `Fn(LaneKey) -> bool` closure is
/// also an oracle.
pub trait LaneOracle {
    fn is_reserved(&self, lane: LaneKey) -> bool;
}

impl<F> LaneOracle for F
where
    F: Fn(LaneKey) -> bool,
{
    fn is_reserved(&self, lane: LaneKey) -> bool {
        self(lane)
    }
}

/// How a search treats reserved lanes.
#[derive(Clone, Copy)]
pub enum Traffic<'a> {
    /// Plain shortest path by lane length.
    Ignore,
    /// Multiply the length of reserved lanes by `multiplier`.
    Penalize {
        oracle:     &'a dyn LaneOracle,
        multiplier: f64,
    },
}

impl Traffic<'_> {
    #[inline]
    fn weight(&self, lane: LaneKey, length: f64) -> f64 {
        match self {
            Traffic::Ignore => length,
            Traffic::Penalize { oracle, multiplier } => {
                if oracle.is_reserved(lane) {
                    length * multiplier
                } else {
                    length
                }
            }
        }
    }
}

// ── Exclusions ────────────────────────────────────────────────────────────────

/// Lanes and vertices hidden from a single search.
#[derive(Default)]
pub(crate) struct Exclusions {
    lanes:    HashSet<LaneKey>,
    vertices: HashSet<VertexId>,
}

impl Exclusions {
    #[inline]
    fn allows(&self, lane: LaneKey) -> bool {
        !self.lanes.contains(&lane) && !self.vertices.contains(&lane.to)
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Dijkstra from `start` to `end`.
///
/// `start == end` returns the single-vertex route immediately.
///
/// # Errors
///
/// - [`GraphError::VertexNotFound`] if either endpoint is not in the graph.
/// - [`GraphError::NoRoute`] if `end` is unreachable.
pub fn shortest_path(
    graph:   &NavGraph,
    start:   VertexId,
    end:     VertexId,
    traffic: Traffic<'_>,
) -> GraphResult<Route> {
    for v in [start, end] {
        if !graph.contains(v) {
            return Err(GraphError::VertexNotFound(v));
        }
    }
    dijkstra(graph, start, end, traffic, &Exclusions::default())
        .ok_or(GraphError::NoRoute { from: start, to: end })
}

/// Up to `k` distinct loopless routes from `start` to `end`, cheapest first.
///
/// The first route is the plain shortest path.  Returns an empty `Vec` when
/// no route exists (or `k == 0`).
pub fn k_shortest_paths(graph: &NavGraph, start: VertexId, end: VertexId, k: usize) -> Vec<Route> {
    if k == 0 {
        return vec![];
    }
    let Ok(first) = shortest_path(graph, start, end, Traffic::Ignore) else {
        return vec![];
    };

    let mut accepted: Vec<Route> = vec![first];
    let mut candidates: Vec<Route> = Vec::new();

    while accepted.len() < k {
        let Some(prev) = accepted.last() else { break };
        let prev = prev.vertices.clone();

        for j in 0..prev.len().saturating_sub(1) {
            let spur = prev[j];
            let root = &prev[..=j];

            let mut excl = Exclusions::default();
            for p in &accepted {
                if p.vertices.len() > j + 1 && &p.vertices[..=j] == root {
                    excl.lanes.insert(LaneKey::new(p.vertices[j], p.vertices[j + 1]));
                }
            }
            // Root vertices before the spur stay off-limits so candidates
            // remain loopless.
            excl.vertices.extend(root[..j].iter().copied());

            let Some(spur_route) = dijkstra(graph, spur, end, Traffic::Ignore, &excl) else {
                continue;
            };

            let mut vertices = root[..j].to_vec();
            vertices.extend(spur_route.vertices);
            let Some(cost) = graph.path_cost(&vertices) else { continue };

            let seen = accepted.iter().chain(candidates.iter()).any(|r| r.vertices == vertices);
            if !seen {
                candidates.push(Route { vertices, cost });
            }
        }

        // Promote the cheapest candidate; ties go to fewer hops, then to the
        // lexicographically smaller vertex sequence.
        let best = candidates
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                OrderedFloat(a.cost)
                    .cmp(&OrderedFloat(b.cost))
                    .then(a.vertices.len().cmp(&b.vertices.len()))
                    .then(a.vertices.cmp(&b.vertices))
            })
            .map(|(i, _)| i);
        match best {
            Some(i) => accepted.push(candidates.swap_remove(i)),
            None => break,
        }
    }

    accepted
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

pub(crate) fn dijkstra(
    graph:   &NavGraph,
    start:   VertexId,
    end:     VertexId,
    traffic: Traffic<'_>,
    excl:    &Exclusions,
) -> Option<Route> {
    if start == end {
        return Some(Route { vertices: vec![start], cost: 0.0 });
    }

    let n = graph.vertex_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut prev = vec![VertexId::INVALID; n];
    dist[start.index()] = 0.0;

    // Reverse makes BinaryHeap (max) behave as a min-heap; the VertexId
    // secondary key gives the lowest-index tie-break.
    let mut heap: BinaryHeap<Reverse<(OrderedFloat<f64>, VertexId)>> = BinaryHeap::new();
    heap.push(Reverse((OrderedFloat(0.0), start)));

    while let Some(Reverse((OrderedFloat(d), v))) = heap.pop() {
        if v == end {
            return Some(reconstruct(graph, &prev, start, end));
        }
        // Skip stale heap entries.
        if d > dist[v.index()] {
            continue;
        }

        for lane in graph.out_lanes(v) {
            let key = lane.key();
            if !excl.allows(key) {
                continue;
            }
            let next = d + traffic.weight(key, graph.lane_length(lane));
            if next < dist[lane.to.index()] {
                dist[lane.to.index()] = next;
                prev[lane.to.index()] = v;
                heap.push(Reverse((OrderedFloat(next), lane.to)));
            }
        }
    }

    None
}

fn reconstruct(graph: &NavGraph, prev: &[VertexId], start: VertexId, end: VertexId) -> Route {
    let mut vertices = vec![end];
    let mut cur = end;
    while cur != start {
        cur = prev[cur.index()];
        vertices.push(cur);
    }
    vertices.reverse();
    let cost = graph.path_cost(&vertices).unwrap_or(f64::INFINITY);
    Route { vertices, cost }
}
