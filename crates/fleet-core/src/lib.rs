//! `fleet-core` — foundational types for the fleet traffic coordinator.
//!
//! This crate is a dependency of every other `fleet-*` crate.  It has no
//! `fleet-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `VertexId`, `LaneKey`                      |
//! | [`geo`]         | `Point2`, Euclidean distance, linear interpolation    |
//! | [`time`]        | `SimClock` (simulated time units + tick counter)      |
//! | [`rng`]         | `SimRng`, `Rgb` display colours                       |
//! | [`config`]      | `FleetConfig` and its validation                      |
//! | [`error`]       | `FleetError`, `FleetResult`                           |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::FleetConfig;
pub use error::{FleetError, FleetResult};
pub use geo::Point2;
pub use ids::{AgentId, LaneKey, VertexId};
pub use rng::{Rgb, SimRng};
pub use time::SimClock;
