pub mod loader;
pub mod types;
pub mod validate;
pub mod variable;

pub use loader::{DataLoader, DirectoryLoader, MemoryLoader};
pub use types::{Sample, SeriesSet, TimeSeries};
pub use validate::{validate_series, DataWarning};
pub use variable::EnvironmentalVariable;
