//! `fleet-graph` — navigation graph, map loading, and routing.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                        |
//! |-------------|-----------------------------------------------------------------|
//! | [`graph`]   | `NavGraph` (CSR lanes + R-tree), `NavGraphBuilder`, `Vertex`, `Lane` |
//! | [`router`]  | `Route`, `Traffic`, `LaneOracle`, Dijkstra and k-shortest paths |
//! | [`loader`]  | JSON map document loading (strict and degrade-to-empty)         |
//! | [`error`]   | `GraphError`, `GraphResult<T>`                                  |
//!
//! # Failure model
//!
//! "No path" is a normal outcome ([`GraphError::NoRoute`]), and a map that
//! cannot be read degrades to an empty graph through
//! [`load_nav_graph_or_empty`].  Nothing in this crate panics on bad input.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on `fleet-core` types.     |

pub mod error;
pub mod graph;
pub mod loader;
pub mod router;

#[cfg(test)]
mod tests;

pub use error::{GraphError, GraphResult};
pub use graph::{Lane, NavGraph, NavGraphBuilder, Vertex};
pub use loader::{load_nav_graph, load_nav_graph_or_empty, load_nav_graph_reader, parse_nav_graph};
pub use router::{LaneOracle, Route, Traffic, k_shortest_paths, shortest_path};
