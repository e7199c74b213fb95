//! A single robot and its tick function.

use fleet_core::{AgentId, LaneKey, Point2, Rgb, VertexId};
use fleet_graph::NavGraph;

use crate::{BatteryModel, FULL_CHARGE, RobotStatus};

/// One robot in the fleet.
///
/// A robot always stands on `position` unless it is `Moving`, in which case
/// it is between `current_lane.from` (== `position`) and `current_lane.to`,
/// `progress` of the way along.
///
/// While moving, `path[0]` is the vertex the robot last reached and `path[1]`
/// the one it is heading to.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Robot {
    pub id:           AgentId,
    pub position:     VertexId,
    pub status:       RobotStatus,
    pub destination:  Option<VertexId>,
    /// Remaining path including the current position.
    pub path:         Vec<VertexId>,
    pub current_lane: Option<LaneKey>,
    /// Fraction of `current_lane` covered, in `[0.0, 1.0)`.
    pub progress:     f64,
    /// Battery level in percent.
    pub battery:      f64,
    /// Time units spent `Waiting` since the last task was assigned.
    pub waiting_time: f64,
    pub color:        Rgb,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub battery_model: BatteryModel,
}

impl Robot {
    /// An idle robot with a full battery standing on `position`.
    pub fn new(id: AgentId, position: VertexId, color: Rgb, battery_model: BatteryModel) -> Self {
        Self {
            id,
            position,
            status:       RobotStatus::Idle,
            destination:  None,
            path:         Vec::new(),
            current_lane: None,
            progress:     0.0,
            battery:      FULL_CHARGE,
            waiting_time: 0.0,
            color,
            battery_model,
        }
    }

    #[inline]
    pub fn is_depleted(&self) -> bool {
        self.battery <= 0.0
    }

    /// The lane the path starts with, if the path has one.
    #[inline]
    pub fn first_lane(&self) -> Option<LaneKey> {
        LaneKey::along(&self.path).next()
    }

    pub fn status_color(&self) -> Rgb {
        self.status.color()
    }

    // ── Commands ──────────────────────────────────────────────────────────

    /// Start following `path` towards `destination`.
    ///
    /// Always switches to `Moving`.  A path with fewer than two vertices
    /// leaves `current_lane` empty, which the next tick repairs to `Idle`.
    pub fn assign_task(&mut self, destination: VertexId, path: Vec<VertexId>) {
        self.destination  = Some(destination);
        self.path         = path;
        self.status       = RobotStatus::Moving;
        self.progress     = 0.0;
        self.waiting_time = 0.0;
        self.current_lane = self.first_lane();
    }

    /// Record a task that cannot start yet and park in `Waiting`.
    pub fn defer_task(&mut self, destination: VertexId, path: Vec<VertexId>) {
        self.destination  = Some(destination);
        self.path         = path;
        self.status       = RobotStatus::Waiting;
        self.progress     = 0.0;
        self.waiting_time = 0.0;
        self.current_lane = None;
    }

    /// Leave `Waiting` and start along the first lane of the stored path.
    ///
    /// Returns `false` (and changes nothing) unless the robot is waiting and
    /// its path has at least one lane.
    pub fn resume(&mut self) -> bool {
        if self.status != RobotStatus::Waiting {
            return false;
        }
        let Some(lane) = self.first_lane() else { return false };
        self.status       = RobotStatus::Moving;
        self.current_lane = Some(lane);
        self.progress     = 0.0;
        true
    }

    /// Switch to `Charging`.  Returns `false` if already charging.
    ///
    /// Whether the robot stands on a charger is the coordinator's concern.
    pub fn start_charging(&mut self) -> bool {
        if self.status == RobotStatus::Charging {
            return false;
        }
        self.status       = RobotStatus::Charging;
        self.current_lane = None;
        self.progress     = 0.0;
        true
    }

    /// Drop any task and stand idle.
    pub fn reset_to_idle(&mut self) {
        self.status       = RobotStatus::Idle;
        self.path.clear();
        self.current_lane = None;
        self.progress     = 0.0;
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Advance the robot by `dt` time units at `speed` lane-fractions per
    /// time unit.
    ///
    /// Returns `true` if status, position, or current lane changed.
    pub fn tick(&mut self, dt: f64, speed: f64) -> bool {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let moving = self.status == RobotStatus::Moving;
        self.battery = self.battery_model.drain(self.battery, moving, dt);

        if moving && self.is_depleted() {
            log::debug!("{} battery depleted on {:?}; waiting", self.id, self.current_lane);
            self.status = RobotStatus::Waiting;
            return true;
        }

        match self.status {
            RobotStatus::Waiting => {
                self.waiting_time += dt;
                false
            }
            RobotStatus::Charging => {
                self.battery = self.battery_model.charge(self.battery, dt);
                if self.battery >= FULL_CHARGE {
                    self.status = RobotStatus::Idle;
                    return true;
                }
                false
            }
            RobotStatus::Idle | RobotStatus::TaskComplete => false,
            RobotStatus::Moving => self.advance(speed * dt),
        }
    }

    fn advance(&mut self, step: f64) -> bool {
        let Some(lane) = self.current_lane else {
            log::warn!("{} was moving without a lane; reset to idle", self.id);
            self.status = RobotStatus::Idle;
            return true;
        };

        self.progress += step;
        if self.progress < 1.0 {
            return false;
        }

        self.position = lane.to;
        self.progress = 0.0;
        if !self.path.is_empty() {
            self.path.remove(0);
        }

        match self.first_lane() {
            Some(next) => self.current_lane = Some(next),
            None => {
                self.status       = RobotStatus::TaskComplete;
                self.current_lane = None;
                self.waiting_time = 0.0;
            }
        }
        true
    }

    // ── Rendering ─────────────────────────────────────────────────────────

    /// World coordinates, eased along the current lane while moving.
    ///
    /// `None` only if `position` is not a vertex of `graph`.
    pub fn world_position(&self, graph: &NavGraph) -> Option<Point2> {
        let here = graph.vertex_pos(self.position);
        if self.status != RobotStatus::Moving {
            return here;
        }
        let Some(lane) = self.current_lane else { return here };
        match (graph.vertex_pos(lane.from), graph.vertex_pos(lane.to)) {
            (Some(a), Some(b)) => Some(a.lerp(b, ease_in_out(self.progress))),
            _ => here,
        }
    }
}

/// Quadratic ease-in/ease-out on `[0, 1]`.
#[inline]
pub fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}
