//! Conflict checks and the path escalation policy.
//!
//! # Escalation
//!
//! A path is *clear* for a robot when every lane on it is free for that robot
//! and no other robot stands on any vertex after the first.  Planning tries,
//! in order, and takes the first clear result:
//!
//! 1. the plain shortest path;
//! 2. traffic-aware shortest paths, once per configured penalty multiplier;
//! 3. the k-shortest alternatives other than the plain path.
//!
//! This is an ordered greedy policy.  It finds *a* clear path when one of
//! these searches happens to produce it, not the best assignment for the
//! fleet as a whole.
//!
//! [`TrafficView::plan_path`] falls back to the blocked plain path so the
//! robot can wait on it; [`TrafficView::find_alternative_path`] does not.

use std::collections::BTreeMap;

use fleet_agent::Robot;
use fleet_core::{AgentId, FleetConfig, LaneKey, VertexId};
use fleet_graph::{LaneOracle, NavGraph, Route, Traffic};

use crate::ReservationTable;

/// A planned path and whether it is clear right now.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedPath {
    pub vertices: Vec<VertexId>,
    /// `false` means every search came back blocked and `vertices` is the
    /// plain shortest path, to be waited on.
    pub clear:    bool,
}

/// Read-only view over everything conflict checks need.
pub struct TrafficView<'a> {
    pub graph:        &'a NavGraph,
    pub config:       &'a FleetConfig,
    pub reservations: &'a ReservationTable,
    pub robots:       &'a BTreeMap<AgentId, Robot>,
}

/// Lanes held by anyone but the requester.
struct HeldByOthers<'a> {
    reservations: &'a ReservationTable,
    requester:    AgentId,
}

impl LaneOracle for HeldByOthers<'_> {
    fn is_reserved(&self, lane: LaneKey) -> bool {
        !self.reservations.is_lane_free(lane, self.requester)
    }
}

impl TrafficView<'_> {
    /// A lane is free if unreserved or reserved by `requester`.
    #[inline]
    pub fn is_lane_free(&self, lane: LaneKey, requester: AgentId) -> bool {
        self.reservations.is_lane_free(lane, requester)
    }

    /// Some robot other than `requester` stands on `vertex`.
    pub fn is_vertex_occupied(&self, vertex: VertexId, requester: AgentId) -> bool {
        self.occupant(vertex, requester).is_some()
    }

    /// The lowest-id robot other than `requester` standing on `vertex`.
    pub fn occupant(&self, vertex: VertexId, requester: AgentId) -> Option<AgentId> {
        self.robots
            .values()
            .find(|r| r.id != requester && r.position == vertex)
            .map(|r| r.id)
    }

    /// Every lane free and every vertex after the first unoccupied.
    pub fn is_path_clear(&self, path: &[VertexId], requester: AgentId) -> bool {
        LaneKey::along(path).all(|lane| self.is_lane_free(lane, requester))
            && path.iter().skip(1).all(|&v| !self.is_vertex_occupied(v, requester))
    }

    /// Plan `start → end` for `requester`.
    ///
    /// `None` only when `end` is unreachable.  Otherwise the first clear
    /// path found, or the blocked plain shortest path with `clear == false`.
    pub fn plan_path(&self, start: VertexId, end: VertexId, requester: AgentId) -> Option<PlannedPath> {
        let plain = self.graph.shortest_path(start, end, Traffic::Ignore).ok()?;
        Some(match self.first_clear(start, end, requester, &plain) {
            Some(vertices) => PlannedPath { vertices, clear: true },
            None => PlannedPath { vertices: plain.into_vertices(), clear: false },
        })
    }

    /// Like [`plan_path`](Self::plan_path) but without the blocked fallback.
    pub fn find_alternative_path(
        &self,
        start:     VertexId,
        end:       VertexId,
        requester: AgentId,
    ) -> Option<Vec<VertexId>> {
        let plain = self.graph.shortest_path(start, end, Traffic::Ignore).ok()?;
        self.first_clear(start, end, requester, &plain)
    }

    fn first_clear(
        &self,
        start:     VertexId,
        end:       VertexId,
        requester: AgentId,
        plain:     &Route,
    ) -> Option<Vec<VertexId>> {
        if self.is_path_clear(&plain.vertices, requester) {
            return Some(plain.vertices.clone());
        }

        let oracle = HeldByOthers { reservations: self.reservations, requester };
        for &multiplier in &self.config.penalty_multipliers {
            let traffic = Traffic::Penalize { oracle: &oracle, multiplier };
            let Ok(route) = self.graph.shortest_path(start, end, traffic) else { continue };
            if self.is_path_clear(&route.vertices, requester) {
                log::debug!("{requester}: clear path at penalty x{multiplier}");
                return Some(route.into_vertices());
            }
        }

        let found = self
            .graph
            .k_shortest_paths(start, end, self.config.k_alternatives)
            .into_iter()
            .filter(|r| r.vertices != plain.vertices)
            .find(|r| self.is_path_clear(&r.vertices, requester))
            .map(Route::into_vertices);
        if found.is_some() {
            log::debug!("{requester}: clear path among k-shortest alternatives");
        }
        found
    }
}
