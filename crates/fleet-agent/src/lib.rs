//! `fleet-agent` — per-robot state machine.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`status`]  | `RobotStatus` — the closed set of robot states + status colour |
//! | [`battery`] | `BatteryModel` — drain and charge rates                       |
//! | [`robot`]   | `Robot` — position, path, lane progress, `tick`, easing       |
//!
//! # State machine
//!
//! ```text
//! Idle ──assign_task──▶ Moving ──last lane done──▶ TaskComplete ──▶ Idle | Charging
//!                        │  ▲                                          │
//!        battery empty / │  │ resume (coordinator only)                ▼
//!        deferred task   ▼  │                                   Charging ──full──▶ Idle
//!                       Waiting
//! ```
//!
//! A robot never leaves `Waiting` on its own.  [`Robot::tick`] reports
//! whether status, position, or lane changed; that boolean is the
//! coordinator's cue to redo reservation bookkeeping.
//!
//! Robots know nothing about reservations or other robots.  All conflict
//! handling lives in `fleet-coord`.

pub mod battery;
pub mod robot;
pub mod status;


pub use battery::{BatteryModel, FULL_CHARGE};
pub use robot::{Robot, ease_in_out};
pub use status::RobotStatus;
