//! warehouse — headless demo for the fleet traffic coordinator.
//!
//! Spawns a handful of robots on a warehouse floor, replays a short command
//! script, and streams every coordinator event to stdout as one JSON object
//! per line.  Diagnostics go to stderr.
//!
//! ```text
//! warehouse [MAP.json [CONFIG.json]]
//! ```
//!
//! Without a map the built-in floor from `network.rs` is used.  `FLEET_LOG`
//! takes an `env_logger` filter such as `debug` or `fleet_coord=trace`.

mod network;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use serde_json::json;

use fleet_coord::{FleetBuilder, FleetCoordinator, FleetEvent, FleetObserver, TickReport};
use fleet_core::{AgentId, FleetConfig, SimClock, VertexId};
use fleet_graph::{NavGraph, load_nav_graph};

use network::build_warehouse;

// ── Constants ─────────────────────────────────────────────────────────────────

const DT:            f64   = 0.5;
const TICKS:         u64   = 240;
const ROBOTS_ON_MAP: usize = 4;

// ── Logging ───────────────────────────────────────────────────────────────────

fn init_logging() {
    let env = env_logger::Env::new().filter_or("FLEET_LOG", "info");
    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();
}

// ── JSON-lines event sink ─────────────────────────────────────────────────────

/// Writes each event, and each tick that did something, as a JSON line.
struct JsonLines<W: Write> {
    out:    W,
    events: usize,
    error:  Option<anyhow::Error>,
}

impl<W: Write> JsonLines<W> {
    fn new(out: W) -> Self {
        Self { out, events: 0, error: None }
    }

    fn write_line<T: serde::Serialize + ?Sized>(&mut self, value: &T) {
        if self.error.is_some() {
            return;
        }
        let result = serde_json::to_writer(&mut self.out, value)
            .map_err(anyhow::Error::from)
            .and_then(|()| self.out.write_all(b"\n").map_err(anyhow::Error::from));
        if let Err(e) = result {
            self.error = Some(e);
        }
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e.context("writing event stream"));
        }
        self.out.flush().context("flushing event stream")
    }
}

impl<W: Write> FleetObserver for JsonLines<W> {
    fn on_event(&mut self, event: &FleetEvent) {
        self.events += 1;
        self.write_line(event);
    }

    fn on_tick_end(&mut self, clock: &SimClock, report: &TickReport) {
        if *report == TickReport::default() {
            return;
        }
        self.write_line(&json!({
            "event":   "tick",
            "tick":    clock.tick,
            "now":     clock.now,
            "changed": report.changed,
            "resumed": report.resumed,
            "expired": report.expired,
        }));
    }
}

// ── Command script ────────────────────────────────────────────────────────────

/// Robot indices refer to spawn order.
#[derive(Copy, Clone, Debug)]
enum Step {
    Assign(usize, VertexId),
    Select(usize),
    Charge(usize),
}

struct Scenario {
    graph:  NavGraph,
    spawns: Vec<VertexId>,
    script: Vec<(u64, Step)>,
}

fn built_in() -> Scenario {
    let (graph, f) = build_warehouse();
    Scenario {
        graph,
        spawns: vec![f.dock, f.packing, f.charger_1, f.shelf_b],
        script: vec![
            (0, Step::Assign(0, f.aisle_e)),
            (0, Step::Assign(1, f.aisle_w)),
            // Occupied: rejected with a task_failed event.
            (0, Step::Assign(2, f.shelf_b)),
            (0, Step::Assign(3, f.charger_2)),
            (5, Step::Charge(2)),
            (40, Step::Assign(2, f.shelf_b)),
            (60, Step::Select(0)),
            (60, Step::Assign(0, f.shelf_a)),
            (90, Step::Assign(1, f.packing)),
            (150, Step::Assign(0, f.dock)),
        ],
    }
}

/// Spawn on the first free vertices and send robot `i` towards the far end
/// of the vertex list, then back.
fn from_map(graph: NavGraph) -> Scenario {
    let n = graph.vertex_count();
    let count = ROBOTS_ON_MAP.min(n);
    let spawns: Vec<VertexId> = (0..count).map(|i| VertexId(i as u32)).collect();
    let mut script = Vec::new();
    for (i, &home) in spawns.iter().enumerate() {
        script.push((0, Step::Assign(i, VertexId((n - 1 - i) as u32))));
        script.push((TICKS / 2, Step::Assign(i, home)));
    }
    script.sort_by_key(|&(at, _)| at);
    Scenario { graph, spawns, script }
}

fn run_step<O: FleetObserver>(fleet: &mut FleetCoordinator<O>, robots: &[AgentId], step: Step) {
    let agent = |i: usize| robots.get(i).copied().unwrap_or(AgentId::INVALID);
    let result = match step {
        Step::Assign(i, to) => fleet.assign_task(agent(i), to).map(|a| log::debug!("{}: {a:?}", agent(i))),
        Step::Select(i) => fleet.select_agent(agent(i)).map(|_| ()),
        Step::Charge(i) => fleet.start_charging(agent(i)),
    };
    if let Err(e) = result {
        log::info!("{step:?} rejected: {e}");
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    init_logging();
    let mut args = std::env::args().skip(1);

    let scenario = match args.next() {
        Some(map) => {
            let graph = load_nav_graph(Path::new(&map), None)
                .with_context(|| format!("loading map {map}"))?;
            from_map(graph)
        }
        None => built_in(),
    };

    let config = match args.next() {
        Some(path) => {
            let file = File::open(&path).with_context(|| format!("opening config {path}"))?;
            serde_json::from_reader::<_, FleetConfig>(BufReader::new(file))
                .with_context(|| format!("parsing config {path}"))?
        }
        None => FleetConfig::default(),
    };

    let stdout = io::stdout();
    let sink = JsonLines::new(BufWriter::new(stdout.lock()));
    let mut fleet = FleetBuilder::new()
        .graph(scenario.graph)
        .config(config)
        .observer(sink)
        .build()?;

    let mut robots = Vec::with_capacity(scenario.spawns.len());
    for &vertex in &scenario.spawns {
        match fleet.spawn(vertex) {
            Ok(id) => robots.push(id),
            Err(e) => log::warn!("spawn at {vertex} failed: {e}"),
        }
    }

    let t0 = Instant::now();
    let mut script = scenario.script.iter().peekable();
    for tick in 0..TICKS {
        while let Some(&(_, step)) = script.next_if(|(at, _)| *at <= tick) {
            run_step(&mut fleet, &robots, step);
        }
        fleet.update_tick(DT);
    }
    fleet.observer.finish()?;

    // ── Summary (stderr; stdout carries the event stream) ─────────────────
    eprintln!();
    eprintln!(
        "{} ticks in {:.3} ms, {} events, {} lanes still reserved",
        TICKS,
        t0.elapsed().as_secs_f64() * 1e3,
        fleet.observer.events,
        fleet.reservations().len(),
    );
    eprintln!("{:<6} {:<14} {:<14} {:>8}", "Robot", "Status", "Vertex", "Battery");
    eprintln!("{}", "-".repeat(45));
    for robot in fleet.robots() {
        eprintln!(
            "{:<6} {:<14} {:<14} {:>7.1}%",
            robot.id.to_string(),
            robot.status.as_str(),
            fleet.graph().vertex_name(robot.position),
            robot.battery,
        );
    }
    Ok(())
}
