use serde::{Deserialize, Serialize};

/// Per-task CPU requirements in the execution framework's terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuReqs {
    pub processes: u32,
    pub threads_per_process: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_type: Option<String>,
}

impl Default for CpuReqs {
    fn default() -> CpuReqs {
        CpuReqs {
            processes: 1,
            threads_per_process: 1,
            process_type: None,
            thread_type: None,
        }
    }
}

/// A single external-executable invocation together with its staging
/// directives and resource requirements. Staging lists hold paths on the
/// submission host (`upload_input_data`), paths on the resource's shared
/// filesystem (`link_input_data`) and names of products to bring back
/// (`download_output_data`). The framework owns the transfers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub executable: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_exec: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upload_input_data: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link_input_data: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub download_output_data: Vec<String>,
    #[serde(default)]
    pub cpu_reqs: CpuReqs,
    /// Node-local scratch in MB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lfs_per_process: Option<u64>,
    /// Name of an earlier task whose node this task must land on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// An ordered step within a pipeline. All tasks of a stage may run
/// concurrently; the next stage starts once they have all finished.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Stage {
    pub fn new(name: &str) -> Stage {
        Stage {
            name: name.to_string(),
            tasks: Vec::new(),
        }
    }

    pub fn add_task(&mut self, task: Task) {
        self.tasks.push(task);
    }
}

/// An ordered sequence of stages describing one unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,
    #[serde(default)]
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(name: &str) -> Pipeline {
        Pipeline {
            name: name.to_string(),
            stages: Vec::new(),
        }
    }

    pub fn add_stage(&mut self, stage: Stage) {
        self.stages.push(stage);
    }
}

/// Allocation request submitted alongside the pipeline set. Walltime is
/// in minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub resource: String,
    pub walltime: u32,
    pub cpus: u32,
    pub schema: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
}

/// Formats an upload entry that lands under a different name on the
/// remote side, using the framework's `"source > target"` convention.
pub fn staged(src: &str, dst: &str) -> String {
    format!("{} > {}", src, dst)
}
