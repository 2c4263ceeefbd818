mod cli;
mod session;

use std::error::Error;
use std::fs;

use clap::Parser;

fn main() -> Result<(), Box<dyn Error>> {
    let args = cli::Args::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = &args.log_level {
        logger.parse_filters(level);
    }
    logger.init();

    let params = args.load_params()?;
    let summary = session::run(&params, &args.session_options())?;
    log::info!(
        target: "session",
        "{} chunks, {} visible, {} colliders, {} height jobs, {} mesh jobs, {} lost",
        summary.chunks,
        summary.visible,
        summary.colliders,
        summary.height_jobs,
        summary.mesh_jobs,
        summary.lost_jobs
    );
    for entry in &summary.meshes {
        log::info!(target: "session", "lod {}: {} meshes shown", entry.lod, entry.shown);
    }

    if let Some(path) = &args.report {
        fs::write(path, toml::to_string_pretty(&summary)?)?;
        log::info!(target: "session", "wrote report to {}", path.display());
    }
    Ok(())
}
