use std::process::ExitStatus;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image listing: {0}")]
    Listing(#[from] csv::Error),

    #[error("workflow serialization: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no resource request set, call set_resource before run")]
    NoResource,

    #[error("workflow runner exited with {status}: {stderr}")]
    Runner { status: ExitStatus, stderr: String },
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
