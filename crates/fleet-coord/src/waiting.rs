//! `WaitingQueue` — robots parked at a vertex until their way is clear.
//!
//! Keyed by vertex in a `BTreeMap`, so reconciliation visits vertices in
//! ascending order and, within a vertex, robots in arrival order.  A robot is
//! listed under at most one vertex.

use std::collections::BTreeMap;

use fleet_core::{AgentId, VertexId};

#[derive(Default, Clone, Debug)]
pub struct WaitingQueue {
    inner: BTreeMap<VertexId, Vec<AgentId>>,
}

impl WaitingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of queued robots.
    pub fn len(&self) -> usize {
        self.inner.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Queue `agent` at `vertex`.
    ///
    /// Idempotent.  An entry under any other vertex is moved here.  Returns
    /// `true` if the robot was not already queued at `vertex`.
    pub fn enqueue(&mut self, vertex: VertexId, agent: AgentId) -> bool {
        if self.at(vertex).contains(&agent) {
            return false;
        }
        self.remove(agent);
        self.inner.entry(vertex).or_default().push(agent);
        true
    }

    /// Remove `agent` wherever it is queued.
    pub fn remove(&mut self, agent: AgentId) -> bool {
        let Some(vertex) = self.vertex_of(agent) else { return false };
        self.remove_at(vertex, agent)
    }

    /// Remove `agent` from the list at `vertex`; empty lists are dropped.
    pub fn remove_at(&mut self, vertex: VertexId, agent: AgentId) -> bool {
        let Some(list) = self.inner.get_mut(&vertex) else { return false };
        let before = list.len();
        list.retain(|&a| a != agent);
        let removed = list.len() != before;
        if list.is_empty() {
            self.inner.remove(&vertex);
        }
        removed
    }

    pub fn contains(&self, agent: AgentId) -> bool {
        self.vertex_of(agent).is_some()
    }

    /// The vertex `agent` is queued at.
    pub fn vertex_of(&self, agent: AgentId) -> Option<VertexId> {
        self.inner
            .iter()
            .find(|(_, list)| list.contains(&agent))
            .map(|(v, _)| *v)
    }

    /// Robots queued at `vertex`, in arrival order.
    pub fn at(&self, vertex: VertexId) -> &[AgentId] {
        self.inner.get(&vertex).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (VertexId, &[AgentId])> + '_ {
        self.inner.iter().map(|(v, list)| (*v, list.as_slice()))
    }

    /// An owned copy of every list, for passes that mutate the queue while
    /// walking it.
    pub fn snapshot(&self) -> Vec<(VertexId, Vec<AgentId>)> {
        self.inner.iter().map(|(v, list)| (*v, list.clone())).collect()
    }
}
