//! Per-domain vector clock
//!
//! One counter per configured replica. A replica only ever advances its own
//! slot; clocks are never merged across replicas.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VectorClock(Vec<u32>);

impl VectorClock {
    /// All-zero clock with `replicas` slots
    pub fn new(replicas: usize) -> Self {
        Self(vec![0; replicas])
    }

    /// Advance `slot` by one and return the new value.
    ///
    /// # Panics
    /// If `slot` is outside the clock; slots come from the validated topology.
    pub fn tick(&mut self, slot: usize) -> u32 {
        self.0[slot] += 1;
        self.0[slot]
    }

    pub fn get(&self, slot: usize) -> Option<u32> {
        self.0.get(slot).copied()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u32> {
        self.0
    }
}

impl From<Vec<u32>> for VectorClock {
    fn from(counters: Vec<u32>) -> Self {
        Self(counters)
    }
}

impl fmt::Display for VectorClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
