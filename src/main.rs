use anyhow::Context;
use clap::Parser;

use manga_segmenter::cli::Cli;
use manga_segmenter::{Pipeline, SegmenterConfig};

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => SegmenterConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SegmenterConfig::default(),
    };

    if let Some(jobs) = cli.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("configuring worker pool")?;
    }

    let pipeline = Pipeline::new(config);
    let report = pipeline.run(&cli.input, &cli.output)?;

    println!(
        "Done: {} files ({} skipped), {} pages ({} blank), {} panels, {} balloons",
        report.files,
        report.skipped_files,
        report.pages,
        report.blank_pages,
        report.panel_count,
        report.balloon_count
    );
    Ok(())
}
