//! Strongly typed, zero-cost identifier wrappers.
//!
//! Robots and vertices are keyed by plain integers; lanes by their ordered
//! endpoint pair.  `Display` gives the short forms used in logs and events:
//! `R007`, `V12`, `V3->V4`.

use std::fmt;

/// Typed `u32` id with an all-ones `INVALID` sentinel as its default.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub u32);

        impl $name {
            pub const INVALID: $name = $name(u32::MAX);

            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }
    };
}

typed_id! {
    /// Stable identity of a robot.  Allocated sequentially by the coordinator
    /// and never reused, so it is safe to hold across removals.
    pub struct AgentId;
}

typed_id! {
    /// Index of a vertex in the navigation graph.
    pub struct VertexId;
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{:03}", self.0)
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.0)
    }
}

// ── LaneKey ───────────────────────────────────────────────────────────────────

/// A directed lane identified by its endpoints.  The unit of reservation.
///
/// `LaneKey::new(a, b)` and `LaneKey::new(b, a)` are different lanes.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneKey {
    pub from: VertexId,
    pub to:   VertexId,
}

impl LaneKey {
    #[inline]
    pub fn new(from: VertexId, to: VertexId) -> Self {
        Self { from, to }
    }

    /// Consecutive lanes of a vertex path (`[a, b, c]` → `a→b`, `b→c`).
    pub fn along(path: &[VertexId]) -> impl Iterator<Item = LaneKey> + '_ {
        path.windows(2).map(|w| LaneKey::new(w[0], w[1]))
    }
}

impl fmt::Display for LaneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}
