use crate::config::SiteConfig;
use crate::discovery::ImageRecord;
use crate::entk::{staged, CpuReqs, Pipeline, Stage, Task};
use crate::sites::SitePrep;

/// Basename of `path` cut at the first dot, the stem the ortho tool uses
/// to name its products.
fn image_stem(path: &str) -> &str {
    let base = match path.rfind('/') {
        Some(slash) => &path[slash + 1..],
        None => path,
    };
    match base.find('.') {
        Some(dot) => &base[..dot],
        None => base,
    }
}

/// `path` with everything from the basename's first dot stripped. The
/// `.ntf`/`.xml` pair of an image sits at `<base>.ntf` / `<base>.xml`.
fn sidecar_base(path: &str) -> &str {
    let start = path.rfind('/').map_or(0, |slash| slash + 1);
    match path[start..].find('.') {
        Some(dot) => &path[..start + dot],
        None => path,
    }
}

fn ortho_uploads(config: &SiteConfig) -> Vec<String> {
    let mut uploads = vec![staged(&config.ortho_script, "pgc_ortho.py")];
    for lib in &config.ortho_libs {
        let base = lib.rsplit('/').next().unwrap_or(lib);
        uploads.push(staged(lib, &format!("lib/{}", base)));
    }
    uploads
}

/// Builds the two-stage pipeline for one image: orthorectification into
/// node-local scratch, then classification of the result. The second task
/// is tagged with the first task's name so the framework places it on the
/// node holding the intermediate product.
pub fn generate_image_pipeline(
    name: &str,
    image: &ImageRecord,
    config: &SiteConfig,
    prep: &SitePrep,
) -> Pipeline {
    let stem = image_stem(&image.filename);
    let base = sidecar_base(&image.filename);

    let mut pipeline = Pipeline::new(name);

    let mut stage0 = Stage::new(&format!("{}-S0", name));
    let ortho_name = format!("{}-T0", stage0.name);
    let ortho = Task {
        name: ortho_name.clone(),
        executable: "python".to_string(),
        pre_exec: prep.python.clone(),
        arguments: vec![
            "pgc_ortho.py".to_string(),
            "-p".to_string(),
            "4326".to_string(),
            "-c".to_string(),
            "ns".to_string(),
            "-t".to_string(),
            "UInt16".to_string(),
            "-f".to_string(),
            "GTiff".to_string(),
            "--no_pyramids".to_string(),
            image.filename.clone(),
            format!("$NODE_LFS_PATH/{}", ortho_name),
        ],
        upload_input_data: ortho_uploads(config),
        link_input_data: vec![format!("{}.ntf", base), format!("{}.xml", base)],
        cpu_reqs: CpuReqs {
            processes: 1,
            threads_per_process: 1,
            process_type: None,
            thread_type: Some("OpenMP".to_string()),
        },
        lfs_per_process: Some(image.size),
        ..Task::default()
    };
    stage0.add_task(ortho);
    pipeline.add_stage(stage0);

    let mut stage1 = Stage::new(&format!("{}-S1", name));
    let classify = Task {
        name: format!("{}-T1", stage1.name),
        executable: "matlab".to_string(),
        pre_exec: prep.matlab.clone(),
        arguments: vec![
            "-nodisplay".to_string(),
            "-nodesktop".to_string(),
            "-singleCompThread".to_string(),
            "-r".to_string(),
            format!(
                "WV_Processing('$NODE_LFS_PATH/{}/{}_u16ns4326.tif', '{}', '{}.xml', \
                 'EPSG:4326', '2', '3', 'NSF_CETX', 1, './', './'); exit",
                ortho_name, stem, stem, stem
            ),
        ],
        upload_input_data: vec![
            config.classify_filter.clone(),
            staged(&config.classify_script, "WV_Processing.m"),
        ],
        link_input_data: vec![format!("{}.xml", base)],
        cpu_reqs: CpuReqs {
            processes: 4,
            threads_per_process: 1,
            process_type: None,
            thread_type: Some("OpenMP".to_string()),
        },
        tag: Some(ortho_name),
        ..Task::default()
    };
    stage1.add_task(classify);
    pipeline.add_stage(stage1);

    pipeline
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(filename: &str, size: u64) -> ImageRecord {
        ImageRecord {
            filename: filename.to_string(),
            size,
        }
    }

    #[test]
    fn test_image_stem() {
        assert_eq!(image_stem("/pylon5/data/gulf/WV02_A.ntf"), "WV02_A");
        assert_eq!(image_stem("/pylon5/data/gulf/WV02_A.r1.ntf"), "WV02_A");
        assert_eq!(image_stem("WV02_A.ntf"), "WV02_A");
        assert_eq!(image_stem("WV02_A"), "WV02_A");
    }

    #[test]
    fn test_sidecar_base() {
        assert_eq!(
            sidecar_base("/pylon5/data/gulf/WV02_A.ntf"),
            "/pylon5/data/gulf/WV02_A"
        );
        assert_eq!(
            sidecar_base("/pylon5/data.v2/gulf/WV02_A.r1.ntf"),
            "/pylon5/data.v2/gulf/WV02_A"
        );
        assert_eq!(sidecar_base("WV02_A.ntf"), "WV02_A");
        assert_eq!(sidecar_base("/pylon5/data/gulf/WV02_A"), "/pylon5/data/gulf/WV02_A");
    }

    #[test]
    fn test_pipeline_wiring() {
        let config = SiteConfig::default();
        let prep = config.prep("xsede.bridges");
        let image = record("/pylon5/data/gulf/WV02_A.ntf", 2048);
        let pipeline = generate_image_pipeline("P007", &image, &config, &prep);

        assert_eq!(pipeline.name, "P007");
        assert_eq!(pipeline.stages.len(), 2);
        assert_eq!(pipeline.stages[0].name, "P007-S0");
        assert_eq!(pipeline.stages[1].name, "P007-S1");

        let ortho = &pipeline.stages[0].tasks[0];
        assert_eq!(ortho.name, "P007-S0-T0");
        assert_eq!(ortho.executable, "python");
        assert_eq!(ortho.lfs_per_process, Some(2048));
        assert_eq!(
            ortho.arguments.last().unwrap(),
            "$NODE_LFS_PATH/P007-S0-T0"
        );
        assert_eq!(
            ortho.link_input_data,
            vec![
                "/pylon5/data/gulf/WV02_A.ntf".to_string(),
                "/pylon5/data/gulf/WV02_A.xml".to_string(),
            ]
        );

        let classify = &pipeline.stages[1].tasks[0];
        assert_eq!(classify.name, "P007-S1-T1");
        assert_eq!(classify.executable, "matlab");
        assert_eq!(classify.cpu_reqs.processes, 4);
        assert_eq!(classify.tag.as_deref(), Some("P007-S0-T0"));
        assert_eq!(
            classify.link_input_data,
            vec!["/pylon5/data/gulf/WV02_A.xml".to_string()]
        );
    }

    #[test]
    fn test_classify_command_points_at_ortho_product() {
        let config = SiteConfig::default();
        let prep = SitePrep::default();
        let image = record("/pylon5/data/gulf/WV02_A.ntf", 512);
        let pipeline = generate_image_pipeline("P000", &image, &config, &prep);

        let command = pipeline.stages[1].tasks[0].arguments.last().unwrap();
        assert!(command.starts_with("WV_Processing("));
        assert!(command.contains("$NODE_LFS_PATH/P000-S0-T0/WV02_A_u16ns4326.tif"));
        assert!(command.contains("'WV02_A', 'WV02_A.xml'"));
        assert!(command.contains("'EPSG:4326'"));
        assert!(command.ends_with("exit"));
    }

    #[test]
    fn test_ortho_uploads_rename_into_place() {
        let config = SiteConfig::default();
        let uploads = ortho_uploads(&config);
        assert_eq!(
            uploads[0],
            "../pgc_duplication/pgc_ortho.py > pgc_ortho.py"
        );
        assert!(uploads
            .iter()
            .any(|u| u.ends_with("lib/mosaic.py") && u.contains(" > ")));
        assert_eq!(uploads.len(), 1 + config.ortho_libs.len());
    }
}
