//! `ReservationTable` — exclusive, time-stamped lane claims.
//!
//! A lane maps to at most one [`Reservation`], so two robots can never hold
//! the same lane at once.  Reservations on `a→b` say nothing about `b→a`.
//!
//! Timestamps are simulated time units from the coordinator's clock.
//! [`ReservationTable::purge_expired`] drops claims older than the TTL so a
//! robot that stalls mid-lane cannot block it forever.

use fleet_core::{AgentId, LaneKey, SimClock};

#[cfg(feature = "fx-hash")]
type LaneMap<V> = rustc_hash::FxHashMap<LaneKey, V>;
#[cfg(not(feature = "fx-hash"))]
type LaneMap<V> = std::collections::HashMap<LaneKey, V>;

/// Who holds a lane and since when.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Reservation {
    pub owner: AgentId,
    pub since: f64,
}

#[derive(Default, Clone, Debug)]
pub struct ReservationTable {
    inner: LaneMap<Reservation>,
}

impl ReservationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get(&self, lane: LaneKey) -> Option<&Reservation> {
        self.inner.get(&lane)
    }

    pub fn owner(&self, lane: LaneKey) -> Option<AgentId> {
        self.inner.get(&lane).map(|r| r.owner)
    }

    /// Unreserved, or reserved by `requester` itself.
    #[inline]
    pub fn is_lane_free(&self, lane: LaneKey, requester: AgentId) -> bool {
        self.inner.get(&lane).is_none_or(|r| r.owner == requester)
    }

    /// Claim `lane` for `owner` at time `now`.
    ///
    /// Returns `false` if another robot holds it.  Re-reserving a lane the
    /// owner already holds keeps the original timestamp.
    pub fn reserve(&mut self, lane: LaneKey, owner: AgentId, now: f64) -> bool {
        let entry = self.inner.entry(lane).or_insert(Reservation { owner, since: now });
        if entry.owner == owner {
            log::debug!("reserve {lane} for {owner}");
            true
        } else {
            false
        }
    }

    /// Drop every lane `owner` holds except `keep`.  Returns how many went.
    pub fn release_owned_by_except(&mut self, owner: AgentId, keep: Option<LaneKey>) -> usize {
        let before = self.inner.len();
        self.inner.retain(|lane, r| r.owner != owner || Some(*lane) == keep);
        let released = before - self.inner.len();
        if released > 0 {
            log::debug!("released {released} lane(s) from {owner}");
        }
        released
    }

    /// Drop every lane `owner` holds.  Returns how many went.
    pub fn release_owned_by(&mut self, owner: AgentId) -> usize {
        self.release_owned_by_except(owner, None)
    }

    /// Drop reservations more than `ttl` time units older than `clock`.
    ///
    /// Returns the purged lanes, sorted.
    pub fn purge_expired(&mut self, clock: &SimClock, ttl: f64) -> Vec<LaneKey> {
        let mut expired: Vec<LaneKey> = self
            .inner
            .iter()
            .filter(|(_, r)| clock.since(r.since) > ttl)
            .map(|(lane, _)| *lane)
            .collect();
        expired.sort_unstable();
        for lane in &expired {
            if let Some(r) = self.inner.remove(lane) {
                log::debug!("expired {lane} held by {} since {:.2}", r.owner, r.since);
            }
        }
        expired
    }

    /// Lanes held by `owner`, sorted.
    pub fn lanes_owned_by(&self, owner: AgentId) -> Vec<LaneKey> {
        let mut lanes: Vec<LaneKey> = self
            .inner
            .iter()
            .filter(|(_, r)| r.owner == owner)
            .map(|(lane, _)| *lane)
            .collect();
        lanes.sort_unstable();
        lanes
    }

    /// All reservations in lane order.
    pub fn sorted(&self) -> Vec<(LaneKey, Reservation)> {
        let mut all: Vec<_> = self.inner.iter().map(|(l, r)| (*l, *r)).collect();
        all.sort_unstable_by_key(|(l, _)| *l);
        all
    }
}
