use std::path::Path;

use serde::Deserialize;

use crate::config::SiteConfig;
use crate::entk::{CpuReqs, Pipeline, Stage, Task};
use crate::error::WorkflowResult;
use crate::sites::SitePrep;

/// Name of the listing the discovery job stages back to the submission
/// host. The per-image pipelines are parameterized from it.
pub const IMAGE_LISTING: &str = "images.csv";

/// One row of the discovery listing. Size is MB.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageRecord {
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "Size")]
    pub size: u64,
}

/// Builds the pipeline that lists the imagery under `input_dir` on the
/// resource and stages the listing back.
pub fn generate_discover_pipeline(
    input_dir: &str,
    config: &SiteConfig,
    prep: &SitePrep,
) -> Pipeline {
    let task = Task {
        name: "Disc-T0".to_string(),
        executable: "python".to_string(),
        pre_exec: prep.python.clone(),
        arguments: vec![
            "image_disc.py".to_string(),
            input_dir.to_string(),
            format!("--filename={}", IMAGE_LISTING),
            "--filesize".to_string(),
        ],
        upload_input_data: vec![config.discovery_script.clone()],
        download_output_data: vec![IMAGE_LISTING.to_string()],
        cpu_reqs: CpuReqs {
            processes: 1,
            threads_per_process: 1,
            process_type: None,
            thread_type: Some("OpenMP".to_string()),
        },
        ..Task::default()
    };

    let mut stage = Stage::new("Disc-S0");
    stage.add_task(task);
    let mut pipeline = Pipeline::new("Disc");
    pipeline.add_stage(stage);
    pipeline
}

/// Reads the listing the discovery job brought back.
pub fn read_image_listing<P: AsRef<Path>>(path: P) -> WorkflowResult<Vec<ImageRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}
