// Process table monitoring module

mod clock;
mod proc_table;
mod snapshot;

pub use clock::{Clock, SystemClock};
pub use proc_table::{ProcHandle, ProcfsReader};
pub use snapshot::{ProcessSnapshot, ScanEntry, SnapshotError, SnapshotReader};
