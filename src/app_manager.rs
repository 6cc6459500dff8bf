use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::Command;

use serde::Serialize;

use crate::entk::{Pipeline, ResourceRequest};
use crate::error::{WorkflowError, WorkflowResult};

/// One submission to the workflow service: the session's allocation
/// request plus the pipeline set.
#[derive(Debug, Serialize)]
struct WorkflowDescription<'a> {
    session: &'a str,
    resource: &'a ResourceRequest,
    pipelines: &'a [Pipeline],
}

/// Client for the workflow-execution service. Owns a named session on the
/// service broker and hands workflow descriptions to the service CLI;
/// scheduling, staging and fault tolerance happen on the service side.
///
/// A session stays allocated across submissions so the discovery workflow
/// and the per-image batch reuse one resource allocation; call
/// `resource_terminate` when done with it.
pub struct AppManager {
    name: String,
    hostname: String,
    port: u16,
    runner: String,
    workflow_dir: PathBuf,
    resource: Option<ResourceRequest>,
    submissions: u32,
}

impl AppManager {
    pub fn new(name: &str, hostname: &str, port: u16, runner: &str) -> AppManager {
        AppManager {
            name: name.to_string(),
            hostname: hostname.to_string(),
            port,
            runner: runner.to_string(),
            workflow_dir: PathBuf::from("."),
            resource: None,
            submissions: 0,
        }
    }

    pub fn set_resource(&mut self, resource: ResourceRequest) {
        self.resource = Some(resource);
    }

    /// Directory the workflow descriptions are written to. Defaults to
    /// the working directory.
    pub fn set_workflow_dir<P: Into<PathBuf>>(&mut self, dir: P) {
        self.workflow_dir = dir.into();
    }

    /// Submits one workflow and blocks until the service reports it done.
    /// Each submission's description is kept on disk next to the session
    /// for provenance, numbered in submission order.
    pub fn run(&mut self, pipelines: &[Pipeline]) -> WorkflowResult<()> {
        let resource = self.resource.as_ref().ok_or(WorkflowError::NoResource)?;

        self.submissions += 1;
        let workflow_path = self
            .workflow_dir
            .join(format!("{}-{:02}.workflow.json", self.name, self.submissions));

        let description = WorkflowDescription {
            session: &self.name,
            resource,
            pipelines,
        };
        let file = File::create(&workflow_path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &description)?;

        log::info!(
            "submitting {} pipeline(s) from {}",
            pipelines.len(),
            workflow_path.display()
        );
        let output = Command::new(&self.runner)
            .arg("run")
            .arg("--session")
            .arg(&self.name)
            .arg("--hostname")
            .arg(&self.hostname)
            .arg("--port")
            .arg(self.port.to_string())
            .arg("--keep-alive")
            .arg(&workflow_path)
            .output()?;

        if !output.status.success() {
            return Err(WorkflowError::Runner {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }

    /// Releases the session's remote allocation. Failures are logged, not
    /// raised; shutdown continues either way.
    pub fn resource_terminate(&self) {
        let result = Command::new(&self.runner)
            .arg("terminate")
            .arg("--session")
            .arg(&self.name)
            .output();

        match result {
            Ok(output) if output.status.success() => {}
            Ok(output) => log::warn!(
                "terminate failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ),
            Err(e) => log::warn!("could not invoke {}: {}", self.runner, e),
        }
    }
}
