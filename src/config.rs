use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::error::WorkflowResult;
use crate::sites::{site_prep, SitePrep};

/// Site deployment description: where the staged tool payloads live on
/// the submission host and how to reach the workflow service. Every field
/// has a default matching the Bridges deployment, so a config file only
/// needs the entries it overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Workflow service CLI, resolved through PATH.
    pub runner: String,
    /// Broker endpoint of the workflow service.
    pub hostname: String,
    pub port: u16,
    /// Discovery helper uploaded for the listing job.
    pub discovery_script: String,
    /// Orthorectification entry script.
    pub ortho_script: String,
    /// Support modules staged next to the ortho script under lib/.
    pub ortho_libs: Vec<String>,
    /// Classification entry point, staged as WV_Processing.m.
    pub classify_script: String,
    /// Decision-tree filter staged alongside the classifier.
    pub classify_filter: String,
    /// Extra prep profiles, consulted before the built-in site table.
    pub sites: HashMap<String, SitePrep>,
}

impl Default for SiteConfig {
    fn default() -> SiteConfig {
        SiteConfig {
            runner: "entk".to_string(),
            hostname: "two.radical-project.org".to_string(),
            port: 33235,
            discovery_script: "scripts/image_disc.py".to_string(),
            ortho_script: "../pgc_duplication/pgc_ortho.py".to_string(),
            ortho_libs: vec![
                "../pgc_duplication/lib/__init__.py".to_string(),
                "../pgc_duplication/lib/mosaic.py".to_string(),
                "../pgc_duplication/lib/orto_utils.py".to_string(),
            ],
            classify_script: "../wv_classify/wv_classify.m".to_string(),
            classify_filter: "../wv_classify/DT_Filter.m".to_string(),
            sites: HashMap::new(),
        }
    }
}

impl SiteConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> WorkflowResult<SiteConfig> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader)?;
        Ok(config)
    }

    /// Prep profile for a resource, config overrides winning over the
    /// built-in table.
    pub fn prep(&self, resource: &str) -> SitePrep {
        match self.sites.get(resource) {
            Some(prep) => prep.clone(),
            None => site_prep(resource),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_from_file_partial_override() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("site.json");
        let mut file = File::create(&file_path).unwrap();

        let config_data = r#"
    {
        "runner": "/opt/entk/bin/entk",
        "port": 5672,
        "ortho_script": "/home/tools/pgc/pgc_ortho.py"
    }
    "#;
        file.write_all(config_data.as_bytes()).unwrap();

        let config = SiteConfig::from_file(&file_path).unwrap();
        assert_eq!(config.runner, "/opt/entk/bin/entk");
        assert_eq!(config.port, 5672);
        assert_eq!(config.ortho_script, "/home/tools/pgc/pgc_ortho.py");
        // untouched entries keep their defaults
        assert_eq!(config.hostname, "two.radical-project.org");
        assert_eq!(config.ortho_libs.len(), 3);
    }

    #[test]
    fn test_from_file_rejects_malformed_json() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("site.json");
        let mut file = File::create(&file_path).unwrap();
        file.write_all(b"{ not json").unwrap();

        assert!(SiteConfig::from_file(&file_path).is_err());
    }

    #[test]
    fn test_prep_prefers_config_profile() {
        let config_data = r#"
    {
        "sites": {
            "xsede.bridges": { "python": ["module load anaconda3"] }
        }
    }
    "#;
        let config: SiteConfig = serde_json::from_str(config_data).unwrap();

        let prep = config.prep("xsede.bridges");
        assert_eq!(prep.python, vec!["module load anaconda3".to_string()]);
        assert!(prep.matlab.is_empty());

        // resources absent from the override map still hit the built-ins
        let fallback = config.prep("xsede.stampede2");
        assert!(fallback.python.is_empty());
    }
}
