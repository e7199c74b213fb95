//! The `FleetCoordinator` and its tick loop.

use std::collections::BTreeMap;

use fleet_agent::{BatteryModel, Robot, RobotStatus};
use fleet_core::{AgentId, FleetConfig, LaneKey, SimClock, SimRng, VertexId};
use fleet_graph::{NavGraph, Traffic};

use crate::{
    CoordError, CoordResult, FleetEvent, FleetObserver, NoopObserver, PlannedPath,
    ReservationTable, TickReport, TrafficView, WaitingQueue,
};

/// Outcome of an accepted [`FleetCoordinator::assign_task`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Assignment {
    /// The first lane was reserved and the robot is on its way.
    Moving,
    /// The path is blocked.  The robot waits at its vertex and is retried
    /// every tick.
    Waiting,
}

/// What a robot looked like before its tick, for robots whose tick reported
/// a change.
struct Changed {
    agent:       AgentId,
    was_status:  RobotStatus,
    was_lane:    Option<LaneKey>,
}

/// Single owner of the fleet, the lane reservations, and the waiting queue.
///
/// Every mutation goes through `&mut self`, so a coordinator step is one
/// exclusive section.  Wrap the whole coordinator in a `Mutex` to share it
/// across threads.
///
/// # Tick
///
/// [`update_tick`](Self::update_tick):
///
/// 1. ticks every robot (on Rayon's pool with the `parallel` feature);
/// 2. for robots that changed, in ascending id order: starts charging on
///    arrival at a charger, releases the lanes of robots that stopped, and
///    queues robots that started waiting;
/// 3. reconciles the waiting queue if anything was released;
/// 4. routes idle low-battery robots to the nearest free charger;
/// 5. reconciles the waiting queue again if it is not empty;
/// 6. purges reservations older than the TTL.
///
/// Create via [`FleetBuilder`][crate::FleetBuilder] or [`FleetCoordinator::new`].
pub struct FleetCoordinator<O: FleetObserver = NoopObserver> {
    graph:        NavGraph,
    config:       FleetConfig,
    clock:        SimClock,
    robots:       BTreeMap<AgentId, Robot>,
    reservations: ReservationTable,
    waiting:      WaitingQueue,
    rng:          SimRng,
    battery:      BatteryModel,
    next_id:      u32,

    /// Receives every [`FleetEvent`].
    pub observer: O,
}

impl FleetCoordinator<NoopObserver> {
    /// A coordinator with the default configuration and no observer.
    pub fn new(graph: NavGraph) -> Self {
        Self::from_parts(graph, FleetConfig::default(), NoopObserver)
    }
}

impl<O: FleetObserver> FleetCoordinator<O> {
    /// `config` must already be validated.
    pub(crate) fn from_parts(graph: NavGraph, config: FleetConfig, observer: O) -> Self {
        Self {
            rng:          SimRng::new(config.seed),
            battery:      BatteryModel::from_config(&config),
            graph,
            config,
            clock:        SimClock::new(),
            robots:       BTreeMap::new(),
            reservations: ReservationTable::new(),
            waiting:      WaitingQueue::new(),
            next_id:      0,
            observer,
        }
    }

    // ── Read access ───────────────────────────────────────────────────────

    pub fn graph(&self) -> &NavGraph {
        &self.graph
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Robots in ascending id order.
    pub fn robots(&self) -> impl Iterator<Item = &Robot> + '_ {
        self.robots.values()
    }

    pub fn robot(&self, agent: AgentId) -> Option<&Robot> {
        self.robots.get(&agent)
    }

    pub fn robot_count(&self) -> usize {
        self.robots.len()
    }

    pub fn reservations(&self) -> &ReservationTable {
        &self.reservations
    }

    pub fn waiting(&self) -> &WaitingQueue {
        &self.waiting
    }

    /// A read-only view for conflict queries.
    pub fn traffic(&self) -> TrafficView<'_> {
        TrafficView {
            graph:        &self.graph,
            config:       &self.config,
            reservations: &self.reservations,
            robots:       &self.robots,
        }
    }

    pub fn is_lane_free(&self, lane: LaneKey, requester: AgentId) -> bool {
        self.traffic().is_lane_free(lane, requester)
    }

    pub fn is_vertex_occupied(&self, vertex: VertexId, requester: AgentId) -> bool {
        self.traffic().is_vertex_occupied(vertex, requester)
    }

    pub fn is_path_clear(&self, path: &[VertexId], requester: AgentId) -> bool {
        self.traffic().is_path_clear(path, requester)
    }

    pub fn plan_path(&self, start: VertexId, end: VertexId, requester: AgentId) -> Option<PlannedPath> {
        self.traffic().plan_path(start, end, requester)
    }

    pub fn find_alternative_path(
        &self,
        start:     VertexId,
        end:       VertexId,
        requester: AgentId,
    ) -> Option<Vec<VertexId>> {
        self.traffic().find_alternative_path(start, end, requester)
    }

    #[cfg(test)]
    pub(crate) fn robot_mut(&mut self, agent: AgentId) -> Option<&mut Robot> {
        self.robots.get_mut(&agent)
    }

    #[cfg(test)]
    pub(crate) fn reservations_mut(&mut self) -> &mut ReservationTable {
        &mut self.reservations
    }

    // ── Commands ──────────────────────────────────────────────────────────

    /// Place a new idle robot on `position`.
    ///
    /// # Errors
    ///
    /// [`CoordError::VertexNotFound`], or [`CoordError::VertexOccupied`] if
    /// another robot stands there.
    pub fn spawn(&mut self, position: VertexId) -> CoordResult<AgentId> {
        if !self.graph.contains(position) {
            return Err(CoordError::VertexNotFound(position));
        }
        if let Some(by) = self.traffic().occupant(position, AgentId::INVALID) {
            return Err(CoordError::VertexOccupied { vertex: position, by });
        }

        let id = AgentId(self.next_id);
        self.next_id += 1;
        let color = self.rng.vivid_color();
        self.robots.insert(id, Robot::new(id, position, color, self.battery));

        let name = self.graph.vertex_name(position);
        self.emit(FleetEvent::AgentSpawned { agent: id, vertex: position, name });
        Ok(id)
    }

    /// Send `agent` to `destination`.
    ///
    /// A new task replaces any current one.  When every planned path is
    /// blocked the task is still accepted: the robot records it, waits at its
    /// vertex, and is retried by reconciliation ([`Assignment::Waiting`]).
    ///
    /// # Errors
    ///
    /// Rejections leave the robot untouched: unknown agent or vertex,
    /// [`CoordError::AlreadyAtDestination`],
    /// [`CoordError::DestinationOccupied`], and [`CoordError::NoPath`].
    pub fn assign_task(&mut self, agent: AgentId, destination: VertexId) -> CoordResult<Assignment> {
        let result = self.try_assign(agent, destination);
        if let Err(e) = &result {
            if !matches!(e, CoordError::AgentNotFound(_)) {
                let reason = e.to_string();
                self.emit(FleetEvent::TaskFailed { agent, to: destination, reason });
            }
        }
        result
    }

    fn try_assign(&mut self, agent: AgentId, destination: VertexId) -> CoordResult<Assignment> {
        let from = self.robots.get(&agent).ok_or(CoordError::AgentNotFound(agent))?.position;
        if !self.graph.contains(destination) {
            return Err(CoordError::VertexNotFound(destination));
        }
        if from == destination {
            return Err(CoordError::AlreadyAtDestination { agent, vertex: destination });
        }
        if let Some(by) = self.traffic().occupant(destination, agent) {
            return Err(CoordError::DestinationOccupied { vertex: destination, by });
        }
        let plan = self
            .plan_path(from, destination, agent)
            .ok_or(CoordError::NoPath { from, to: destination })?;

        let first = LaneKey::along(&plan.vertices).next();
        let first_free = first.is_none_or(|lane| self.reservations.is_lane_free(lane, agent));

        // Any earlier task is superseded.
        let released = self.reservations.release_owned_by(agent);
        self.waiting.remove(agent);

        let Some(robot) = self.robots.get_mut(&agent) else {
            return Err(CoordError::AgentNotFound(agent));
        };

        if !plan.clear || !first_free {
            robot.defer_task(destination, plan.vertices.clone());
            self.emit(FleetEvent::TaskDeferred { agent, from, to: destination, path: plan.vertices });
            self.enqueue_waiting(from, agent);
            if released > 0 {
                self.reconcile_waiting();
            }
            return Ok(Assignment::Waiting);
        }

        robot.assign_task(destination, plan.vertices.clone());
        if let Some(lane) = first {
            self.reservations.reserve(lane, agent, self.clock.now);
        }
        self.emit(FleetEvent::TaskAssigned { agent, from, to: destination, path: plan.vertices });
        self.reconcile_waiting();
        Ok(Assignment::Moving)
    }

    /// Start charging a robot that stands on a charger.
    ///
    /// # Errors
    ///
    /// [`CoordError::InTransit`] while moving, [`CoordError::NotAtCharger`],
    /// or [`CoordError::AlreadyCharging`].
    pub fn start_charging(&mut self, agent: AgentId) -> CoordResult<()> {
        let robot = self.robots.get(&agent).ok_or(CoordError::AgentNotFound(agent))?;
        let vertex = robot.position;
        match robot.status {
            RobotStatus::Moving => return Err(CoordError::InTransit(agent)),
            RobotStatus::Charging => return Err(CoordError::AlreadyCharging(agent)),
            _ => {}
        }
        if !self.graph.is_charger(vertex) {
            return Err(CoordError::NotAtCharger { agent, vertex });
        }

        if let Some(robot) = self.robots.get_mut(&agent) {
            robot.start_charging();
        }
        self.waiting.remove(agent);
        let released = self.reservations.release_owned_by(agent);
        self.emit(FleetEvent::ChargingStarted { agent, vertex });
        if released > 0 {
            self.reconcile_waiting();
        }
        Ok(())
    }

    /// Report that a front-end selected `agent`.
    pub fn select_agent(&mut self, agent: AgentId) -> CoordResult<&Robot> {
        let robot = self.robots.get(&agent).ok_or(CoordError::AgentNotFound(agent))?;
        let event = FleetEvent::AgentSelected {
            agent,
            vertex:  robot.position,
            status:  robot.status,
            battery: robot.battery,
        };
        self.emit(event);
        self.robots.get(&agent).ok_or(CoordError::AgentNotFound(agent))
    }

    /// Take `agent` out of the fleet, releasing everything it holds.
    pub fn remove(&mut self, agent: AgentId) -> CoordResult<Robot> {
        let robot = self.robots.remove(&agent).ok_or(CoordError::AgentNotFound(agent))?;
        self.waiting.remove(agent);
        if self.reservations.release_owned_by(agent) > 0 {
            self.reconcile_waiting();
        }
        Ok(robot)
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Advance the fleet by `dt` time units.
    pub fn update_tick(&mut self, dt: f64) -> TickReport {
        self.clock.advance(dt);
        let mut report = TickReport::default();

        let changed = self.tick_robots(dt);
        report.changed = changed.len();

        let mut released = 0;
        for change in changed {
            released += self.settle(change);
        }
        if released > 0 {
            report.resumed += self.reconcile_waiting();
        }

        self.route_low_battery();
        if !self.waiting.is_empty() {
            report.resumed += self.reconcile_waiting();
        }

        report.expired = self
            .reservations
            .purge_expired(&self.clock, self.config.reservation_ttl)
            .len();

        self.observer.on_tick_end(&self.clock, &report);
        report
    }

    fn tick_robots(&mut self, dt: f64) -> Vec<Changed> {
        let graph = &self.graph;
        let speed = self.config.robot_speed;

        let step = |robot: &mut Robot| {
            let was_status = robot.status;
            let was_lane = robot.current_lane;
            let lane_speed = was_lane.map_or(speed, |lane| speed * graph.lane_speed_modifier(lane));
            robot
                .tick(dt, lane_speed)
                .then_some(Changed { agent: robot.id, was_status, was_lane })
        };

        #[cfg(not(feature = "parallel"))]
        {
            self.robots.values_mut().filter_map(step).collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            // Indexed collect keeps ascending id order.
            let changes: Vec<Option<Changed>> = self.robots.par_iter_mut().map(|(_, r)| step(r)).collect();
            changes.into_iter().flatten().collect()
        }
    }

    /// Reservation and queue bookkeeping for one changed robot.  Returns the
    /// number of lanes released.
    fn settle(&mut self, change: Changed) -> usize {
        let agent = change.agent;
        let Some(robot) = self.robots.get_mut(&agent) else { return 0 };

        if change.was_status == RobotStatus::Moving
            && change.was_lane.is_none()
            && robot.status == RobotStatus::Idle
        {
            self.emit(FleetEvent::InvariantRepaired {
                agent,
                detail: "moving without a lane".into(),
            });
            return self.reservations.release_owned_by(agent);
        }

        if robot.status == RobotStatus::TaskComplete {
            let vertex = robot.position;
            if self.config.auto_charge_on_arrival && self.graph.is_charger(vertex) {
                robot.start_charging();
                let battery = robot.battery;
                self.emit(FleetEvent::ArrivedAndCharging { agent, vertex, battery });
            }
        }

        let Some((status, position)) = self.robots.get(&agent).map(|r| (r.status, r.position)) else {
            return 0;
        };
        match status {
            RobotStatus::Waiting => {
                self.enqueue_waiting(position, agent);
                0
            }
            status if status.releases_lanes() => self.reservations.release_owned_by(agent),
            // A moving robot keeps the lane it was granted until it stops.
            _ => 0,
        }
    }

    /// Send idle robots below the battery threshold to the nearest free
    /// charger.
    fn route_low_battery(&mut self) {
        if !self.config.auto_route_low_battery {
            return;
        }
        let threshold = self.config.low_battery_threshold;
        let candidates: Vec<(AgentId, VertexId, f64)> = self
            .robots
            .values()
            .filter(|r| matches!(r.status, RobotStatus::Idle | RobotStatus::TaskComplete))
            .filter(|r| r.battery < threshold && !r.is_depleted())
            .filter(|r| !self.graph.is_charger(r.position))
            .map(|r| (r.id, r.position, r.battery))
            .collect();

        for (agent, from, battery) in candidates {
            let Some(charger) = self.nearest_free_charger(from, agent) else { continue };
            if self.assign_task(agent, charger).is_ok() {
                self.emit(FleetEvent::LowBatteryRouting { agent, battery, charger });
            }
        }
    }

    /// Cheapest reachable charger nobody else stands on; ties go to the
    /// lower vertex id.
    fn nearest_free_charger(&self, from: VertexId, agent: AgentId) -> Option<VertexId> {
        let traffic = self.traffic();
        self.graph
            .charger_vertices()
            .into_iter()
            .filter(|&c| !traffic.is_vertex_occupied(c, agent))
            .filter_map(|c| {
                let route = self.graph.shortest_path(from, c, Traffic::Ignore).ok()?;
                Some((route.cost, c))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, c)| c)
    }

    // ── Reconciliation ────────────────────────────────────────────────────

    /// One pass over the waiting queue.  Returns how many robots resumed.
    ///
    /// Each robot is checked against the reservations as they stand at that
    /// moment, including lanes granted earlier in the same pass.  A robot
    /// that stays blocked is retried on the next call; this never recurses.
    pub fn reconcile_waiting(&mut self) -> usize {
        let mut resumed = 0;
        for (vertex, agents) in self.waiting.snapshot() {
            for agent in agents {
                if self.reconcile_one(vertex, agent) {
                    resumed += 1;
                }
            }
        }
        resumed
    }

    fn reconcile_one(&mut self, vertex: VertexId, agent: AgentId) -> bool {
        let Some(robot) = self.robots.get(&agent) else {
            self.waiting.remove_at(vertex, agent);
            return false;
        };
        if robot.status != RobotStatus::Waiting || robot.position != vertex {
            self.waiting.remove_at(vertex, agent);
            return false;
        }
        if robot.path.len() < 2 {
            self.waiting.remove_at(vertex, agent);
            if let Some(robot) = self.robots.get_mut(&agent) {
                robot.reset_to_idle();
            }
            self.reservations.release_owned_by(agent);
            log::warn!("{agent} was waiting on a degenerate path; reset to idle");
            self.emit(FleetEvent::InvariantRepaired { agent, detail: "degenerate waiting path".into() });
            return false;
        }
        if robot.is_depleted() {
            return false;
        }

        let starts_here = robot.path.first() == Some(&vertex);
        let new_path = if starts_here && self.traffic().is_path_clear(&robot.path, agent) {
            None
        } else {
            let target = robot.destination.or(robot.path.last().copied()).unwrap_or(vertex);
            match self.find_alternative_path(vertex, target, agent) {
                Some(path) if path.len() >= 2 => Some(path),
                _ => return false,
            }
        };

        let Some(robot) = self.robots.get_mut(&agent) else { return false };
        if let Some(path) = new_path {
            robot.path = path;
        }
        let Some(lane) = robot.first_lane() else { return false };
        if !self.reservations.reserve(lane, agent, self.clock.now) {
            return false;
        }
        robot.resume();
        self.reservations.release_owned_by_except(agent, Some(lane));
        self.waiting.remove_at(vertex, agent);
        log::debug!("{agent} resumed from {vertex} via {lane}");
        true
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn enqueue_waiting(&mut self, vertex: VertexId, agent: AgentId) {
        if !self.waiting.enqueue(vertex, agent) {
            return;
        }
        let queued = self.waiting.at(vertex);
        if queued.len() > 1 {
            let waiting = queued.to_vec();
            self.emit(FleetEvent::TrafficConflict { vertex, waiting });
        }
    }

    fn emit(&mut self, event: FleetEvent) {
        self.observer.on_event(&event);
    }
}
