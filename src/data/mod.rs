//! Data module - CSV loading, merging and date handling

pub mod columns;
mod dates;
mod loader;
mod pipeline;
mod processor;

pub use dates::{normalize_dates, DateBounds, DateError, RentalFrameFilterExt, DATE_FORMAT};
pub use loader::{DataLoader, LoaderError};
pub use pipeline::{PipelineError, RentalTables};
pub use processor::{DataProcessor, ProcessorError, JOIN_KEYS, LEFT_SUFFIX, RIGHT_SUFFIX};
