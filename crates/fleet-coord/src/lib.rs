//! `fleet-coord` — the lane-reservation fleet coordinator.
//!
//! # Crate layout
//!
//! | Module            | Contents                                                       |
//! |-------------------|----------------------------------------------------------------|
//! | [`coordinator`]   | `FleetCoordinator` — commands, tick loop, reconciliation       |
//! | [`planner`]       | `TrafficView` — conflict checks and path escalation            |
//! | [`reservation`]   | `ReservationTable` — one owner per lane, TTL expiry            |
//! | [`waiting`]       | `WaitingQueue` — robots parked per vertex                      |
//! | [`observer`]      | `FleetObserver`, `FleetEvent`, `NoopObserver`, `LogObserver`   |
//! | [`builder`]       | `FleetBuilder`                                                 |
//! | [`error`]         | `CoordError`, `CoordResult<T>`                                 |
//!
//! # Conflict model
//!
//! Robots claim lanes, not vertices.  A robot starts a task only once the
//! first lane of its path is reserved for it, and keeps that claim until it
//! stops (idle, task complete, or charging) or the claim outlives the TTL.
//! Later lanes are never claimed and a moving robot is never halted
//! mid-route.  A robot standing on a vertex blocks paths through that vertex
//! without reserving anything.
//!
//! Blocked robots are parked in `Waiting` and re-checked against the current
//! reservations on every tick, trying their recorded path first and then the
//! planner's alternatives.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                   |
//! |------------|----------------------------------------------------------|
//! | `serde`    | `Serialize` on events, reservations, and robot snapshots |
//! | `parallel` | Ticks robots on Rayon's thread pool                      |
//! | `fx-hash`  | FxHash for the reservation table                         |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use fleet_coord::{FleetBuilder, LogObserver};
//! use fleet_core::VertexId;
//!
//! let mut fleet = FleetBuilder::new().graph(graph).observer(LogObserver).build()?;
//! let robot = fleet.spawn(VertexId(0))?;
//! fleet.assign_task(robot, VertexId(7))?;
//! for _ in 0..600 {
//!     fleet.update_tick(1.0 / 60.0);
//! }
//! ```

pub mod builder;
pub mod coordinator;
pub mod error;
pub mod observer;
pub mod planner;
pub mod reservation;
pub mod waiting;


pub use builder::FleetBuilder;
pub use coordinator::{Assignment, FleetCoordinator};
pub use error::{CoordError, CoordResult};
pub use observer::{FleetEvent, FleetObserver, LogObserver, NoopObserver, TickReport};
pub use planner::{PlannedPath, TrafficView};
pub use reservation::{Reservation, ReservationTable};
pub use waiting::WaitingQueue;
