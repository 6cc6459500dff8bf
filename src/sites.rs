use std::collections::HashMap;

use lazy_static::lazy_static;
use maplit::hashmap;
use serde::Deserialize;

/// Environment preparation lines prepended to every task on a resource:
/// module loads, virtualenv activation, PYTHONPATH for the OSGeo stack.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SitePrep {
    #[serde(default)]
    pub python: Vec<String>,
    #[serde(default)]
    pub matlab: Vec<String>,
}

lazy_static! {
    static ref SITES: HashMap<&'static str, SitePrep> = hashmap! {
        "xsede.bridges" => SitePrep {
            python: vec![
                "module load python2/2.7.11_gcc_np1.11".to_string(),
                "source /pylon5/mc3bggp/paraskev/GulfCoastWorking/bin/activate".to_string(),
                "export PYTHONPATH=/pylon5/mc3bggp/paraskev/GulfCoastWorking/lib/python2.7/site-packages/osgeo/:/pylon5/mc3bggp/paraskev/GulfCoastWorking/lib/python2.7/site-packages/:$PYTHONPATH".to_string(),
            ],
            matlab: vec![
                "module load matlab".to_string(),
            ],
        },
    };
}

/// Looks up the prep profile for a resource. Resources without one get an
/// empty profile and the tasks run with whatever the login environment
/// provides.
pub fn site_prep(resource: &str) -> SitePrep {
    match SITES.get(resource) {
        Some(prep) => prep.clone(),
        None => {
            log::warn!("no environment prep profile for {}", resource);
            SitePrep::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridges_profile() {
        let prep = site_prep("xsede.bridges");
        assert_eq!(prep.python.len(), 3);
        assert!(prep.python[0].starts_with("module load python2"));
        assert_eq!(prep.matlab, vec!["module load matlab".to_string()]);
    }

    #[test]
    fn test_unknown_resource_is_empty() {
        let prep = site_prep("xsede.comet");
        assert!(prep.python.is_empty());
        assert!(prep.matlab.is_empty());
    }
}
