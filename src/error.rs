use crate::data::PipelineError;
use crate::report::{OutputError, ReportError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Output(#[from] OutputError),
}
