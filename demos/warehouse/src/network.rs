//! Built-in warehouse floor used when no map document is given.
//!
//! ```text
//!   dock ───── aisle_w ───── aisle_e ───── packing
//!                 │             │
//!              shelf_a ──────▶ shelf_b        (one-way)
//!                 │             │
//!             charger_1     charger_2
//! ```

use fleet_core::VertexId;
use fleet_graph::{Lane, NavGraph, NavGraphBuilder, Vertex};

/// Handles to the named vertices of [`build_warehouse`].
#[derive(Copy, Clone, Debug)]
pub struct Floor {
    pub dock:      VertexId,
    pub aisle_w:   VertexId,
    pub aisle_e:   VertexId,
    pub packing:   VertexId,
    pub shelf_a:   VertexId,
    pub shelf_b:   VertexId,
    pub charger_1: VertexId,
    pub charger_2: VertexId,
}

pub fn build_warehouse() -> (NavGraph, Floor) {
    let mut b = NavGraphBuilder::new();
    b.names("demo_warehouse", "L1");

    let dock      = b.add_vertex(Vertex::at(0.0, 0.0).named("dock"));
    let aisle_w   = b.add_vertex(Vertex::at(4.0, 0.0).named("aisle_w"));
    let aisle_e   = b.add_vertex(Vertex::at(8.0, 0.0).named("aisle_e"));
    let packing   = b.add_vertex(Vertex::at(12.0, 0.0).named("packing"));
    let shelf_a   = b.add_vertex(Vertex::at(4.0, 4.0).named("shelf_a"));
    let shelf_b   = b.add_vertex(Vertex::at(8.0, 4.0).named("shelf_b"));
    let charger_1 = b.add_vertex(Vertex::at(4.0, 8.0).named("charger_1").charger());
    let charger_2 = b.add_vertex(Vertex::at(8.0, 8.0).named("charger_2").charger());

    b.add_lane_pair(dock, aisle_w);
    b.add_lane_pair(aisle_w, aisle_e);
    b.add_lane_pair(aisle_e, packing);
    b.add_lane_pair(aisle_w, shelf_a);
    b.add_lane_pair(aisle_e, shelf_b);
    b.add_lane_pair(shelf_a, charger_1);
    b.add_lane_pair(shelf_b, charger_2);

    // Narrow cross-aisle: half speed.
    b.add_lane(Lane { speed_modifier: Some(0.5), ..Lane::new(shelf_a, shelf_b) });

    let floor = Floor { dock, aisle_w, aisle_e, packing, shelf_a, shelf_b, charger_1, charger_2 };
    (b.build(), floor)
}
