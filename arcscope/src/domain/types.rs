//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers prevent passing a thread ID where a process ID is
//! expected when grouping CPU activity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp or duration in microseconds, as emitted by the trace producer
pub type Micros = i64;

/// Process ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID:{}", self.0)
    }
}

/// Thread ID
///
/// `Tid(0)` is the idle task: a CPU whose active thread is 0 is idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tid(pub u32);

impl Tid {
    pub const IDLE: Tid = Tid(0);

    /// Returns true for the idle task
    #[must_use]
    pub fn is_idle(self) -> bool {
        self == Self::IDLE
    }
}

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TID:{}", self.0)
    }
}
