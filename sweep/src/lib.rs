pub mod config;
pub mod error;
pub mod grid;
pub mod preview;
pub mod report;
pub mod sweep;

pub use config::{FlattenSource, SweepConfig};
pub use error::{Result, SweepErr};
pub use report::{BestRun, ResultsTable, SweepRow};
pub use sweep::{SweepOutcome, prepare, run};
