// Wall-clock access

use std::time::SystemTime;

/// Source of the current time used for age calculations
pub trait Clock {
    fn now(&self) -> SystemTime;
}

/// Reads the system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}
