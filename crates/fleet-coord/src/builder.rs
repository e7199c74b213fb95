//! Fluent builder for constructing a [`FleetCoordinator`].

use fleet_core::FleetConfig;
use fleet_graph::NavGraph;

use crate::{CoordResult, FleetCoordinator, FleetEvent, FleetObserver, NoopObserver};

/// Fluent builder for [`FleetCoordinator<O>`].
///
/// # Optional inputs (have defaults)
///
/// | Method           | Default                  |
/// |------------------|--------------------------|
/// | `.graph(g)`      | `NavGraph::empty()`      |
/// | `.config(c)`     | `FleetConfig::default()` |
/// | `.observer(o)`   | `NoopObserver`           |
///
/// # Example
///
/// ```rust,ignore
/// let mut fleet = FleetBuilder::new()
///     .graph(load_nav_graph_or_empty(path))
///     .config(config)
///     .observer(LogObserver)
///     .build()?;
/// let robot = fleet.spawn(VertexId(0))?;
/// ```
pub struct FleetBuilder<O: FleetObserver = NoopObserver> {
    graph:    Option<NavGraph>,
    config:   FleetConfig,
    observer: O,
}

impl Default for FleetBuilder<NoopObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl FleetBuilder<NoopObserver> {
    pub fn new() -> Self {
        Self {
            graph:    None,
            config:   FleetConfig::default(),
            observer: NoopObserver,
        }
    }
}

impl<O: FleetObserver> FleetBuilder<O> {
    /// The map to coordinate on.  Without one the fleet has nowhere to go.
    pub fn graph(mut self, graph: NavGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn config(mut self, config: FleetConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the observer, changing the coordinator's observer type.
    pub fn observer<P: FleetObserver>(self, observer: P) -> FleetBuilder<P> {
        FleetBuilder {
            graph:  self.graph,
            config: self.config,
            observer,
        }
    }

    /// Validate the configuration and return a coordinator with no robots.
    ///
    /// Emits [`FleetEvent::SystemStart`] with the graph statistics.
    pub fn build(self) -> CoordResult<FleetCoordinator<O>> {
        self.config.validate()?;

        let graph = self.graph.unwrap_or_else(NavGraph::empty);
        if graph.is_empty() {
            log::warn!("fleet built on an empty graph");
        }
        let start = FleetEvent::SystemStart {
            building: graph.building_name.clone(),
            level:    graph.level_name.clone(),
            vertices: graph.vertex_count(),
            lanes:    graph.lane_count(),
            chargers: graph.charger_vertices().len(),
        };

        let mut fleet = FleetCoordinator::from_parts(graph, self.config, self.observer);
        fleet.observer.on_event(&start);
        Ok(fleet)
    }
}
