extern crate clap;

use clap::Parser;
use rayon::prelude::*;

use pelican::app_manager::AppManager;
use pelican::config::SiteConfig;
use pelican::discovery::{generate_discover_pipeline, read_image_listing, IMAGE_LISTING};
use pelican::entk::{Pipeline, ResourceRequest};
use pelican::error::WorkflowResult;
use pelican::gulf_coast::generate_image_pipeline;

/// Submits the Gulf Coast imagery workflow: a discovery job over the
/// input directory, then one orthorectify+classify pipeline per image.
#[derive(Parser)]
#[clap(name = "gulf_coast")]
struct Opts {
    /// Images input directory on the selected resource
    #[clap(short, long)]
    input_dir: String,

    /// HPC resource on which the workflow will run
    #[clap(short, long)]
    resource: String,

    /// The number of CPUs required for execution
    #[clap(short, long, default_value = "1")]
    cpus: u32,

    /// The amount of time resources are requested, in minutes
    #[clap(short, long)]
    walltime: u32,

    /// The project that will be charged
    #[clap(short, long)]
    project: Option<String>,

    /// The queue from which resources are requested
    #[clap(short, long)]
    queue: Option<String>,

    /// Name of the execution; has to be unique per session
    #[clap(long)]
    name: String,

    /// Path to a site configuration JSON; built-in defaults when absent
    #[clap(long)]
    config: Option<String>,
}

fn submit(opts: &Opts, config: &SiteConfig, appman: &mut AppManager) -> WorkflowResult<()> {
    let prep = config.prep(&opts.resource);

    let discovery = generate_discover_pipeline(&opts.input_dir, config, &prep);
    appman.run(std::slice::from_ref(&discovery))?;
    log::info!("discovery finished");

    let images = read_image_listing(IMAGE_LISTING)?;
    log::info!("images found: {}", images.len());

    let pipelines: Vec<Pipeline> = images
        .par_iter()
        .enumerate()
        .map(|(idx, image)| {
            generate_image_pipeline(&format!("P{:03}", idx), image, config, &prep)
        })
        .collect();
    appman.run(&pipelines)?;

    log::info!("done");
    Ok(())
}

fn main() {
    env_logger::init();
    let opts: Opts = Opts::parse();

    let config = match &opts.config {
        Some(path) => match SiteConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("could not load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => SiteConfig::default(),
    };

    let mut appman = AppManager::new(&opts.name, &config.hostname, config.port, &config.runner);
    appman.set_resource(ResourceRequest {
        resource: opts.resource.clone(),
        walltime: opts.walltime,
        cpus: opts.cpus,
        schema: "gsissh".to_string(),
        project: opts.project.clone(),
        queue: opts.queue.clone(),
    });

    // any failure ends the run; the allocation is released either way
    if let Err(e) = submit(&opts, &config, &mut appman) {
        log::error!("caught error: {}", e);
    }

    log::info!("closing resources");
    appman.resource_terminate();
}
