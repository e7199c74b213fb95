//! Unit tests for fleet-graph.
//!
//! All tests use hand-built graphs or inline JSON documents.

#[cfg(test)]
mod helpers {
    use fleet_core::VertexId;

    use crate::{Lane, NavGraph, NavGraphBuilder, Vertex};

    pub fn lane(from: u32, to: u32, distance: f64) -> Lane {
        Lane { distance: Some(distance), ..Lane::new(VertexId(from), VertexId(to)) }
    }

    pub fn v(ids: &[u32]) -> Vec<VertexId> {
        ids.iter().map(|&i| VertexId(i)).collect()
    }

    /// Two routes 0 → 3:
    ///
    /// ```text
    ///   0 ──1──▶ 1 ──1──▶ 3
    ///   │        │0.5     ▲
    ///   └──2──▶  2 ───2───┘
    /// ```
    ///
    /// `[0,1,3]` = 2, `[0,1,2,3]` = 3.5, `[0,2,3]` = 4.
    pub fn two_route_graph() -> NavGraph {
        let mut b = NavGraphBuilder::new();
        for i in 0..4 {
            b.add_vertex(Vertex::at(i as f64, 0.0));
        }
        b.add_lane(lane(0, 1, 1.0));
        b.add_lane(lane(1, 3, 1.0));
        b.add_lane(lane(0, 2, 2.0));
        b.add_lane(lane(2, 3, 2.0));
        b.add_lane(lane(1, 2, 0.5));
        b.build()
    }

    /// Symmetric diamond with Euclidean lengths; `0→2` is added before `0→1`.
    pub fn diamond() -> NavGraph {
        let mut b = NavGraphBuilder::new();
        let v0 = b.add_vertex(Vertex::at(0.0, 0.0));
        let v1 = b.add_vertex(Vertex::at(1.0, 1.0));
        let v2 = b.add_vertex(Vertex::at(1.0, -1.0));
        let v3 = b.add_vertex(Vertex::at(2.0, 0.0));
        b.add_directed(v0, v2);
        b.add_directed(v0, v1);
        b.add_directed(v1, v3);
        b.add_directed(v2, v3);
        b.build()
    }
}

// ── Builder & static lookups ──────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use fleet_core::{LaneKey, Point2, VertexId};

    use super::helpers::{lane, v};
    use crate::{Lane, NavGraph, NavGraphBuilder, Vertex};

    #[test]
    fn empty_build() {
        let g = NavGraph::empty();
        assert_eq!(g.vertex_count(), 0);
        assert_eq!(g.lane_count(), 0);
        assert!(g.is_empty());
        assert!(g.connected_vertices(VertexId(0)).is_empty());
        assert!(g.nearest_vertex(Point2::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn connected_vertices_keep_insertion_order() {
        let mut b = NavGraphBuilder::new();
        for i in 0..4 {
            b.add_vertex(Vertex::at(i as f64, 0.0));
        }
        b.add_directed(VertexId(2), VertexId(0));
        b.add_directed(VertexId(0), VertexId(3));
        b.add_directed(VertexId(0), VertexId(1));
        b.add_directed(VertexId(0), VertexId(2));
        let g = b.build();
        assert_eq!(g.connected_vertices(VertexId(0)), v(&[3, 1, 2]));
        assert_eq!(g.connected_vertices(VertexId(2)), v(&[0]));
        assert!(g.connected_vertices(VertexId(1)).is_empty());
    }

    #[test]
    fn lane_distance_explicit_or_euclidean() {
        let mut b = NavGraphBuilder::new();
        let a = b.add_vertex(Vertex::at(0.0, 0.0));
        let c = b.add_vertex(Vertex::at(3.0, 4.0));
        b.add_directed(a, c);
        b.add_lane(lane(1, 0, 12.5));
        let g = b.build();
        assert_eq!(g.lane_distance(a, c), Some(5.0));
        assert_eq!(g.lane_distance(c, a), Some(12.5));
        assert_eq!(g.lane_distance(a, a), None);
    }

    #[test]
    fn lanes_are_directional() {
        let mut b = NavGraphBuilder::new();
        let a = b.add_vertex(Vertex::at(0.0, 0.0));
        let c = b.add_vertex(Vertex::at(1.0, 0.0));
        b.add_directed(a, c);
        let g = b.build();
        assert!(g.has_lane(LaneKey::new(a, c)));
        assert!(!g.has_lane(LaneKey::new(c, a)));
    }

    #[test]
    fn invalid_lanes_and_attributes_are_sanitised() {
        let mut b = NavGraphBuilder::new();
        let a = b.add_vertex(Vertex::at(0.0, 0.0));
        let c = b.add_vertex(Vertex::at(2.0, 0.0));
        b.add_directed(a, VertexId(9));
        b.add_lane(Lane {
            distance:       Some(-1.0),
            speed_modifier: Some(0.0),
            ..Lane::new(a, c)
        });
        let g = b.build();
        assert_eq!(g.lane_count(), 1);
        assert_eq!(g.lane_distance(a, c), Some(2.0));
        assert_eq!(g.lane_speed_modifier(LaneKey::new(a, c)), 1.0);
    }

    #[test]
    fn names_and_chargers() {
        let mut b = NavGraphBuilder::new();
        let dock = b.add_vertex(Vertex::at(0.0, 0.0).named("dock"));
        let plain = b.add_vertex(Vertex::at(1.0, 0.0));
        let pad = b.add_vertex(Vertex::at(2.0, 0.0).named("pad").charger());
        let g = b.build();
        assert_eq!(g.vertex_name(dock), "dock");
        assert_eq!(g.vertex_name(plain), "V1");
        assert_eq!(g.vertex_name(VertexId(40)), "V40");
        assert!(g.is_charger(pad));
        assert!(!g.is_charger(dock));
        assert!(!g.is_charger(VertexId(40)));
        assert_eq!(g.charger_vertices(), vec![pad]);
        assert_eq!(g.named_vertices(), vec![(dock, "dock"), (pad, "pad")]);
    }

    #[test]
    fn nearest_vertex_snaps() {
        let g = super::helpers::diamond();
        assert_eq!(g.nearest_vertex(Point2::new(0.9, 0.8)), Some(VertexId(1)));
        assert_eq!(g.nearest_vertex(Point2::new(2.2, 0.1)), Some(VertexId(3)));
        assert_eq!(g.vertex_within(Point2::new(2.2, 0.1), 0.5), Some(VertexId(3)));
        assert_eq!(g.vertex_within(Point2::new(5.0, 5.0), 0.5), None);
    }

    #[test]
    fn path_cost_sums_lanes() {
        let g = super::helpers::two_route_graph();
        assert_eq!(g.path_cost(&v(&[0, 1, 2, 3])), Some(3.5));
        assert_eq!(g.path_cost(&v(&[2])), Some(0.0));
        assert_eq!(g.path_cost(&v(&[3, 0])), None);
    }
}

// ── Shortest path ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod shortest {
    use std::collections::HashSet;

    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use fleet_core::{LaneKey, VertexId};

    use super::helpers::{diamond, lane, two_route_graph, v};
    use crate::{GraphError, NavGraph, NavGraphBuilder, Traffic, Vertex};

    #[test]
    fn picks_cheapest_route() {
        let g = two_route_graph();
        let r = g.shortest_path(VertexId(0), VertexId(3), Traffic::Ignore).unwrap();
        assert_eq!(r.vertices, v(&[0, 1, 3]));
        assert_eq!(r.cost, 2.0);
    }

    #[test]
    fn same_start_and_end_is_single_vertex() {
        let g = two_route_graph();
        for i in 0..4 {
            let r = g.shortest_path(VertexId(i), VertexId(i), Traffic::Ignore).unwrap();
            assert_eq!(r.vertices, v(&[i]));
            assert_eq!(r.cost, 0.0);
        }
    }

    #[test]
    fn unreachable_is_no_route() {
        let g = two_route_graph();
        let r = g.shortest_path(VertexId(3), VertexId(0), Traffic::Ignore);
        assert!(matches!(r, Err(GraphError::NoRoute { .. })));
    }

    #[test]
    fn unknown_vertex_is_not_found() {
        let g = two_route_graph();
        let r = g.shortest_path(VertexId(0), VertexId(99), Traffic::Ignore);
        assert!(matches!(r, Err(GraphError::VertexNotFound(VertexId(99)))));
        let empty = NavGraph::empty();
        assert!(empty.shortest_path(VertexId(0), VertexId(0), Traffic::Ignore).is_err());
    }

    #[test]
    fn equal_cost_paths_resolve_to_lowest_vertex_index() {
        let g = diamond();
        for _ in 0..5 {
            let r = g.shortest_path(VertexId(0), VertexId(3), Traffic::Ignore).unwrap();
            assert_eq!(r.vertices, v(&[0, 1, 3]));
        }
    }

    #[test]
    fn penalty_steers_around_reserved_lane() {
        let g = two_route_graph();
        let reserved = |l: LaneKey| l == LaneKey::new(VertexId(0), VertexId(1));
        let r = g
            .shortest_path(
                VertexId(0),
                VertexId(3),
                Traffic::Penalize { oracle: &reserved, multiplier: 5.0 },
            )
            .unwrap();
        assert_eq!(r.vertices, v(&[0, 2, 3]));
        // Reported cost is the real length, not the penalised one.
        assert_eq!(r.cost, 4.0);
    }

    #[test]
    fn small_penalty_may_keep_reserved_lane() {
        let g = two_route_graph();
        let reserved = |l: LaneKey| l == LaneKey::new(VertexId(0), VertexId(1));
        let r = g
            .shortest_path(
                VertexId(0),
                VertexId(3),
                Traffic::Penalize { oracle: &reserved, multiplier: 1.5 },
            )
            .unwrap();
        assert_eq!(r.vertices, v(&[0, 1, 3]));
    }

    #[test]
    fn penalty_never_forbids() {
        let g = two_route_graph();
        let everything = |_: LaneKey| true;
        let r = g
            .shortest_path(
                VertexId(0),
                VertexId(3),
                Traffic::Penalize { oracle: &everything, multiplier: 50.0 },
            )
            .unwrap();
        assert_eq!(r.vertices, v(&[0, 1, 3]));
    }

    /// Minimum cost over every simple path, by exhaustive DFS.
    fn brute_force_min(g: &NavGraph, start: VertexId, end: VertexId) -> Option<f64> {
        fn dfs(
            g: &NavGraph,
            cur: VertexId,
            end: VertexId,
            seen: &mut HashSet<VertexId>,
            cost: f64,
            best: &mut Option<f64>,
        ) {
            if cur == end {
                *best = Some(best.map_or(cost, |b| b.min(cost)));
                return;
            }
            for l in g.out_lanes(cur) {
                if seen.insert(l.to) {
                    let d = g.lane_distance(l.from, l.to).unwrap();
                    dfs(g, l.to, end, seen, cost + d, best);
                    seen.remove(&l.to);
                }
            }
        }
        let mut best = None;
        let mut seen = HashSet::from([start]);
        dfs(g, start, end, &mut seen, 0.0, &mut best);
        best
    }

    #[test]
    fn matches_brute_force_on_random_graphs() {
        let mut rng = SmallRng::seed_from_u64(2024);
        for _ in 0..60 {
            let n = rng.gen_range(2..7u32);
            let mut b = NavGraphBuilder::new();
            for i in 0..n {
                b.add_vertex(Vertex::at(i as f64, 0.0));
            }
            for from in 0..n {
                for to in 0..n {
                    if from != to && rng.gen_bool(0.4) {
                        b.add_lane(lane(from, to, rng.gen_range(1..10) as f64));
                    }
                }
            }
            let g = b.build();

            for s in 0..n {
                for e in 0..n {
                    let (s, e) = (VertexId(s), VertexId(e));
                    let expected = brute_force_min(&g, s, e);
                    match g.shortest_path(s, e, Traffic::Ignore) {
                        Ok(r) => {
                            assert_eq!(r.vertices.first(), Some(&s));
                            assert_eq!(r.vertices.last(), Some(&e));
                            let exp = expected.expect("search found a path brute force missed");
                            assert!((r.cost - exp).abs() < 1e-9, "{s}->{e}: {} vs {exp}", r.cost);
                        }
                        Err(GraphError::NoRoute { .. }) => assert!(expected.is_none()),
                        Err(other) => panic!("unexpected error {other}"),
                    }
                }
            }
        }
    }
}

// ── k-shortest paths ──────────────────────────────────────────────────────────

#[cfg(test)]
mod k_shortest {
    use std::collections::HashSet;

    use fleet_core::VertexId;

    use super::helpers::{two_route_graph, v};
    use crate::{NavGraph, NavGraphBuilder, Traffic, Vertex};

    #[test]
    fn lists_routes_cheapest_first() {
        let g = two_route_graph();
        let routes = g.k_shortest_paths(VertexId(0), VertexId(3), 5);
        let paths: Vec<_> = routes.iter().map(|r| r.vertices.clone()).collect();
        assert_eq!(paths, vec![v(&[0, 1, 3]), v(&[0, 1, 2, 3]), v(&[0, 2, 3])]);
        let costs: Vec<_> = routes.iter().map(|r| r.cost).collect();
        assert_eq!(costs, vec![2.0, 3.5, 4.0]);
    }

    #[test]
    fn honours_k() {
        let g = two_route_graph();
        assert_eq!(g.k_shortest_paths(VertexId(0), VertexId(3), 2).len(), 2);
        assert!(g.k_shortest_paths(VertexId(0), VertexId(3), 0).is_empty());
    }

    #[test]
    fn first_route_is_the_shortest_path() {
        let g = two_route_graph();
        let shortest = g.shortest_path(VertexId(0), VertexId(3), Traffic::Ignore).unwrap();
        let routes = g.k_shortest_paths(VertexId(0), VertexId(3), 3);
        assert_eq!(routes[0], shortest);
    }

    #[test]
    fn unreachable_yields_nothing() {
        let g = two_route_graph();
        assert!(g.k_shortest_paths(VertexId(3), VertexId(0), 5).is_empty());
        assert!(NavGraph::empty().k_shortest_paths(VertexId(0), VertexId(1), 5).is_empty());
    }

    #[test]
    fn routes_are_distinct_and_loopless_on_a_grid() {
        // 3×3 grid, lanes both ways between 4-neighbours.
        let mut b = NavGraphBuilder::new();
        for y in 0..3 {
            for x in 0..3 {
                b.add_vertex(Vertex::at(x as f64, y as f64));
            }
        }
        for y in 0..3u32 {
            for x in 0..3u32 {
                let id = VertexId(y * 3 + x);
                if x < 2 { b.add_lane_pair(id, VertexId(y * 3 + x + 1)); }
                if y < 2 { b.add_lane_pair(id, VertexId((y + 1) * 3 + x)); }
            }
        }
        let g = b.build();

        let routes = g.k_shortest_paths(VertexId(0), VertexId(8), 8);
        assert_eq!(routes.len(), 8);
        let unique: HashSet<_> = routes.iter().map(|r| r.vertices.clone()).collect();
        assert_eq!(unique.len(), routes.len());
        for r in &routes {
            let verts: HashSet<_> = r.vertices.iter().collect();
            assert_eq!(verts.len(), r.vertices.len(), "loop in {:?}", r.vertices);
            assert_eq!(g.path_cost(&r.vertices), Some(r.cost));
        }
        for pair in routes.windows(2) {
            assert!(pair[0].cost <= pair[1].cost);
        }
        // Six monotone 4-hop routes exist before any 6-hop detour.
        assert!(routes[..6].iter().all(|r| r.vertices.len() == 5));
    }

    #[test]
    fn graph_is_untouched_after_search() {
        let g = two_route_graph();
        let lanes_before = g.lanes().to_vec();
        let _ = g.k_shortest_paths(VertexId(0), VertexId(3), 5);
        assert_eq!(g.lanes(), lanes_before.as_slice());
        let r = g.shortest_path(VertexId(0), VertexId(3), Traffic::Ignore).unwrap();
        assert_eq!(r.vertices, v(&[0, 1, 3]));
    }
}

// ── Loader ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use std::io::{Cursor, Write};
    use std::path::Path;

    use fleet_core::{LaneKey, VertexId};

    use crate::{GraphError, load_nav_graph, load_nav_graph_or_empty, load_nav_graph_reader};

    const DOC: &str = r#"{
        "building_name": "depot",
        "levels": {
            "ground": {
                "vertices": [
                    [0.0, 0.0, {"name": "dock"}],
                    [3.0, 4.0, {"name": "", "is_charger": true}],
                    [6.0, 8.0]
                ],
                "lanes": [
                    [0, 1, {"speed_limit": 0.5}],
                    [1, 0],
                    [1, 2, {"distance": 7.5, "graph_idx": 2}]
                ]
            },
            "mezzanine": {
                "vertices": [[0.0, 0.0, {"charger": true}]],
                "lanes": []
            }
        }
    }"#;

    #[test]
    fn parses_first_level() {
        let g = load_nav_graph_reader(Cursor::new(DOC), None).unwrap();
        assert_eq!(g.building_name, "depot");
        assert_eq!(g.level_name, "ground");
        assert_eq!(g.vertex_count(), 3);
        assert_eq!(g.lane_count(), 3);
        assert_eq!(g.vertex_name(VertexId(0)), "dock");
        assert_eq!(g.vertex_name(VertexId(1)), "V1");
        assert!(g.is_charger(VertexId(1)));
        assert_eq!(g.lane_distance(VertexId(0), VertexId(1)), Some(5.0));
        assert_eq!(g.lane_distance(VertexId(1), VertexId(2)), Some(7.5));
        assert_eq!(g.lane_speed_modifier(LaneKey::new(VertexId(0), VertexId(1))), 0.5);
        assert_eq!(g.lane_speed_modifier(LaneKey::new(VertexId(1), VertexId(0))), 1.0);
    }

    #[test]
    fn selects_named_level() {
        let g = load_nav_graph_reader(Cursor::new(DOC), Some("mezzanine")).unwrap();
        assert_eq!(g.level_name, "mezzanine");
        assert_eq!(g.vertex_count(), 1);
        assert!(g.is_charger(VertexId(0)));
        assert!(load_nav_graph_reader(Cursor::new(DOC), Some("roof")).is_err());
    }

    #[test]
    fn structural_errors_are_reported() {
        let cases = [
            r#"[]"#,
            r#"{"levels": {}}"#,
            r#"{"building_name": "x"}"#,
            r#"{"levels": {"a": {"vertices": [[0.0]]}}}"#,
            r#"{"levels": {"a": {"vertices": [[0.0, 0.0]], "lanes": [[0, 5]]}}}"#,
        ];
        for doc in cases {
            let r = load_nav_graph_reader(Cursor::new(doc), None);
            assert!(matches!(r, Err(GraphError::Format(_))), "{doc}");
        }
        let bad_json = load_nav_graph_reader(Cursor::new("{ nope"), None);
        assert!(matches!(bad_json, Err(GraphError::Json(_))));
    }

    #[test]
    fn missing_lists_are_empty() {
        let g = load_nav_graph_reader(Cursor::new(r#"{"levels": {"a": {}}}"#), None).unwrap();
        assert!(g.is_empty());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOC.as_bytes()).unwrap();
        let g = load_nav_graph(file.path(), None).unwrap();
        assert_eq!(g.vertex_count(), 3);
        let g = load_nav_graph_or_empty(file.path());
        assert_eq!(g.lane_count(), 3);
    }

    #[test]
    fn missing_or_broken_file_degrades_to_empty() {
        let g = load_nav_graph_or_empty(Path::new("/definitely/not/here.json"));
        assert!(g.is_empty());
        assert_eq!(g.lane_count(), 0);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"levels\": 3}").unwrap();
        assert!(load_nav_graph_or_empty(file.path()).is_empty());
    }
}
