//! Operational event stream.
//!
//! The coordinator reports what it does as [`FleetEvent`]s to a
//! [`FleetObserver`] it owns.  Observers only watch: nothing they do feeds
//! back into coordination.

use std::fmt;

use fleet_agent::RobotStatus;
use fleet_core::{AgentId, SimClock, VertexId};

// ── Events ────────────────────────────────────────────────────────────────────

/// Something worth recording happened.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum FleetEvent {
    SystemStart {
        building: String,
        level:    String,
        vertices: usize,
        lanes:    usize,
        chargers: usize,
    },
    AgentSpawned {
        agent:  AgentId,
        vertex: VertexId,
        name:   String,
    },
    AgentSelected {
        agent:   AgentId,
        vertex:  VertexId,
        status:  RobotStatus,
        battery: f64,
    },
    TaskAssigned {
        agent: AgentId,
        from:  VertexId,
        to:    VertexId,
        path:  Vec<VertexId>,
    },
    /// Accepted but parked: the path is blocked for now.
    TaskDeferred {
        agent: AgentId,
        from:  VertexId,
        to:    VertexId,
        path:  Vec<VertexId>,
    },
    TaskFailed {
        agent:  AgentId,
        to:     VertexId,
        reason: String,
    },
    LowBatteryRouting {
        agent:   AgentId,
        battery: f64,
        charger: VertexId,
    },
    ArrivedAndCharging {
        agent:   AgentId,
        vertex:  VertexId,
        battery: f64,
    },
    ChargingStarted {
        agent:  AgentId,
        vertex: VertexId,
    },
    /// More than one robot is queued at `vertex`.
    TrafficConflict {
        vertex:  VertexId,
        waiting: Vec<AgentId>,
    },
    InvariantRepaired {
        agent:  AgentId,
        detail: String,
    },
}

impl FleetEvent {
    pub fn name(&self) -> &'static str {
        match self {
            FleetEvent::SystemStart { .. }        => "system_start",
            FleetEvent::AgentSpawned { .. }       => "agent_spawned",
            FleetEvent::AgentSelected { .. }      => "agent_selected",
            FleetEvent::TaskAssigned { .. }       => "task_assigned",
            FleetEvent::TaskDeferred { .. }       => "task_deferred",
            FleetEvent::TaskFailed { .. }         => "task_failed",
            FleetEvent::LowBatteryRouting { .. }  => "low_battery_routing",
            FleetEvent::ArrivedAndCharging { .. } => "arrived_and_charging",
            FleetEvent::ChargingStarted { .. }    => "charging_started",
            FleetEvent::TrafficConflict { .. }    => "traffic_conflict",
            FleetEvent::InvariantRepaired { .. }  => "invariant_repaired",
        }
    }
}

struct Joined<'a, T>(&'a [T]);

impl<T: fmt::Display> fmt::Display for Joined<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

/// `name key=value key=value ...`
impl fmt::Display for FleetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        match self {
            FleetEvent::SystemStart { building, level, vertices, lanes, chargers } => write!(
                f,
                " building={building:?} level={level:?} vertices={vertices} lanes={lanes} chargers={chargers}"
            ),
            FleetEvent::AgentSpawned { agent, vertex, name } => {
                write!(f, " agent={agent} vertex={vertex} name={name:?}")
            }
            FleetEvent::AgentSelected { agent, vertex, status, battery } => {
                write!(f, " agent={agent} vertex={vertex} status={status} battery={battery:.1}")
            }
            FleetEvent::TaskAssigned { agent, from, to, path }
            | FleetEvent::TaskDeferred { agent, from, to, path } => {
                write!(f, " agent={agent} from={from} to={to} path={}", Joined(path))
            }
            FleetEvent::TaskFailed { agent, to, reason } => {
                write!(f, " agent={agent} to={to} reason={reason:?}")
            }
            FleetEvent::LowBatteryRouting { agent, battery, charger } => {
                write!(f, " agent={agent} battery={battery:.1} charger={charger}")
            }
            FleetEvent::ArrivedAndCharging { agent, vertex, battery } => {
                write!(f, " agent={agent} vertex={vertex} battery={battery:.1}")
            }
            FleetEvent::ChargingStarted { agent, vertex } => {
                write!(f, " agent={agent} vertex={vertex}")
            }
            FleetEvent::TrafficConflict { vertex, waiting } => {
                write!(f, " vertex={vertex} waiting={}", Joined(waiting))
            }
            FleetEvent::InvariantRepaired { agent, detail } => {
                write!(f, " agent={agent} detail={detail:?}")
            }
        }
    }
}

// ── Tick report ───────────────────────────────────────────────────────────────

/// Bookkeeping counts for one `update_tick`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TickReport {
    /// Robots whose status, position, or lane changed.
    pub changed: usize,
    /// Waiting robots set moving by reconciliation.
    pub resumed: usize,
    /// Reservations dropped for exceeding the TTL.
    pub expired: usize,
}

// ── Observers ─────────────────────────────────────────────────────────────────

/// Callbacks invoked by the coordinator.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example
///
/// ```rust,ignore
/// struct ConflictCounter(usize);
///
/// impl FleetObserver for ConflictCounter {
///     fn on_event(&mut self, event: &FleetEvent) {
///         if matches!(event, FleetEvent::TrafficConflict { .. }) {
///             self.0 += 1;
///         }
///     }
/// }
/// ```
pub trait FleetObserver {
    fn on_event(&mut self, _event: &FleetEvent) {}

    /// Called at the end of every `update_tick`.
    fn on_tick_end(&mut self, _clock: &SimClock, _report: &TickReport) {}
}

/// A [`FleetObserver`] that does nothing.
#[derive(Default, Clone, Copy, Debug)]
pub struct NoopObserver;

impl FleetObserver for NoopObserver {}

/// Forwards every event to the `log` facade at `info` level.
#[derive(Default, Clone, Copy, Debug)]
pub struct LogObserver;

impl FleetObserver for LogObserver {
    fn on_event(&mut self, event: &FleetEvent) {
        log::info!(target: "fleet::event", "{event}");
    }
}

/// Collects events in memory.
impl FleetObserver for Vec<FleetEvent> {
    fn on_event(&mut self, event: &FleetEvent) {
        self.push(event.clone());
    }
}
