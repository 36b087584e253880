//! Pipeline orchestration: folder walk, per-sheet fan-out, output sink.
//!
//! Sheets are processed on independent rayon workers; each worker owns its
//! page rasters exclusively and writes only its own output files, so no
//! stage shares mutable state. Per-file read failures are logged and
//! skipped; only a missing input folder is fatal.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::balloon_detect::BalloonDetector;
use crate::config::SegmenterConfig;
use crate::false_positive::FalsePositiveFilter;
use crate::page_classify::{PageClassifier, PageKind};
use crate::page_cut::split_spread;
use crate::panel_detect::PanelDetector;
use crate::types::{Balloon, Panel};

/// Error type for the segmentation pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input folder not found: {0}")]
    InputNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Summary of one run, persisted as `report.json` next to the outputs.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: String,
    pub finished_at: String,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Source files found.
    pub files: usize,
    /// Files that could not be read and were skipped.
    pub skipped_files: usize,
    /// Single pages after spread splitting.
    pub pages: usize,
    /// Pages dropped as blank/black filler.
    pub blank_pages: usize,
    pub panel_count: usize,
    pub balloon_count: usize,
}

/// Segmentation results for one page.
#[derive(Debug, Default)]
pub struct PageSegments {
    pub panels: Vec<Panel>,
    pub balloons: Vec<Balloon>,
}

#[derive(Debug, Default)]
struct FileOutcome {
    skipped: bool,
    pages: usize,
    blank_pages: usize,
    panels: usize,
    balloons: usize,
}

/// The full detection pipeline, page in, panel/balloon cutouts out.
pub struct Pipeline {
    config: SegmenterConfig,
    classifier: PageClassifier,
    panel_detector: PanelDetector,
    balloon_detector: BalloonDetector,
    filter: FalsePositiveFilter,
}

impl Pipeline {
    pub fn new(config: SegmenterConfig) -> Self {
        let classifier = PageClassifier::new(config.page.clone());
        let panel_detector = PanelDetector::new(config.panel.clone());
        let balloon_detector = BalloonDetector::new(config.balloon.clone());
        let filter = FalsePositiveFilter::new(config.filter.clone());
        Self {
            config,
            classifier,
            panel_detector,
            balloon_detector,
            filter,
        }
    }

    /// Process every image in `input`, writing panel and balloon cutouts
    /// under `output` and returning the run summary.
    pub fn run(&self, input: &Path, output: &Path) -> Result<RunReport, PipelineError> {
        if !input.is_dir() {
            return Err(PipelineError::InputNotFound(input.to_path_buf()));
        }
        let started_at = chrono::Utc::now().to_rfc3339();

        let panels_dir = output.join("panels");
        let balloons_dir = output.join("balloons");
        std::fs::create_dir_all(&panels_dir)?;
        std::fs::create_dir_all(&balloons_dir)?;

        let files = image_paths(input)?;
        // Progress and per-page lines go to stdout.
        let bar = ProgressBar::with_draw_target(
            Some(files.len() as u64),
            ProgressDrawTarget::stdout(),
        );
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let outcomes: Vec<FileOutcome> = files
            .par_iter()
            .enumerate()
            .map(|(page_idx, path)| {
                let outcome =
                    self.process_file(page_idx, path, &panels_dir, &balloons_dir, &bar);
                bar.inc(1);
                outcome
            })
            .collect();
        bar.finish_and_clear();

        let report = RunReport {
            started_at,
            finished_at: chrono::Utc::now().to_rfc3339(),
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            files: files.len(),
            skipped_files: outcomes.iter().filter(|o| o.skipped).count(),
            pages: outcomes.iter().map(|o| o.pages).sum(),
            blank_pages: outcomes.iter().map(|o| o.blank_pages).sum(),
            panel_count: outcomes.iter().map(|o| o.panels).sum(),
            balloon_count: outcomes.iter().map(|o| o.balloons).sum(),
        };
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(output.join("report.json"), json)?;
        Ok(report)
    }

    /// Segment one page: detect panels, then balloons per panel, then run
    /// false-positive suppression. `panel_base` is the run-wide index of
    /// this page's first panel.
    pub fn segment_page(
        &self,
        page: &DynamicImage,
        page_idx: usize,
        subpage_idx: usize,
        panel_base: usize,
    ) -> PageSegments {
        let mut segments = PageSegments::default();

        for (panel_idx, region) in self.panel_detector.detect(page).into_iter().enumerate() {
            let candidates = self.balloon_detector.detect(&region.image);
            // A flood of candidates means the panel binarized into noise;
            // emit the panel but no balloons.
            let accepted = if candidates.len() > self.config.balloon.max_candidates {
                Vec::new()
            } else {
                self.filter.filter(candidates)
            };

            let owning_panel = panel_base + segments.panels.len();
            segments.panels.push(Panel {
                region,
                page_idx,
                subpage_idx,
                panel_idx,
            });
            segments.balloons.extend(accepted.into_iter().map(|candidate| Balloon {
                candidate,
                panel_idx: owning_panel,
            }));
        }
        segments
    }

    fn process_file(
        &self,
        page_idx: usize,
        path: &Path,
        panels_dir: &Path,
        balloons_dir: &Path,
        bar: &ProgressBar,
    ) -> FileOutcome {
        let mut outcome = FileOutcome::default();

        let sheet = match image::open(path) {
            Ok(img) => img,
            Err(e) => {
                bar.println(format!("Skipping {}: {}", path.display(), e));
                outcome.skipped = true;
                return outcome;
            }
        };

        for (subpage_idx, page) in split_spread(&sheet).into_iter().enumerate() {
            outcome.pages += 1;
            if self.classifier.classify(&page.to_luma8()) == PageKind::Blank {
                outcome.blank_pages += 1;
                bar.println(format!(
                    "Page {:03}_{}: blank, skipped",
                    page_idx, subpage_idx
                ));
                continue;
            }

            let segments = self.segment_page(&page, page_idx, subpage_idx, outcome.panels);
            let mut balloons_by_panel = vec![0usize; segments.panels.len()];

            for panel in &segments.panels {
                let name = format!(
                    "{:03}_{}_{}.png",
                    panel.page_idx, panel.subpage_idx, panel.panel_idx
                );
                if let Err(e) = panel.region.image.save(panels_dir.join(&name)) {
                    bar.println(format!("Failed to write {}: {}", name, e));
                }
            }
            for balloon in &segments.balloons {
                let local = balloon.panel_idx - outcome.panels;
                let panel = &segments.panels[local];
                let name = format!(
                    "{:03}_{}_{}_{:02}.png",
                    panel.page_idx,
                    panel.subpage_idx,
                    panel.panel_idx,
                    balloons_by_panel[local]
                );
                balloons_by_panel[local] += 1;
                if let Err(e) = balloon.candidate.image.save(balloons_dir.join(&name)) {
                    bar.println(format!("Failed to write {}: {}", name, e));
                }
            }

            bar.println(format!(
                "Page {:03}_{}: {} panels, {} balloons",
                page_idx,
                subpage_idx,
                segments.panels.len(),
                segments.balloons.len()
            ));
            outcome.panels += segments.panels.len();
            outcome.balloons += segments.balloons.len();
        }
        outcome
    }
}

/// Page-sheet images in `dir`, lexicographic by file name.
fn image_paths(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| {
                    let e = e.to_ascii_lowercase();
                    e == "jpg" || e == "jpeg" || e == "png"
                })
                .unwrap_or(false)
        })
        .collect();
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_missing_input_is_fatal() {
        let pipeline = Pipeline::new(SegmenterConfig::default());
        let out = tempfile::tempdir().unwrap();
        let err = pipeline.run(Path::new("/no/such/folder"), out.path());
        assert!(matches!(err, Err(PipelineError::InputNotFound(_))));
    }

    #[test]
    fn test_empty_folder_reports_zero_counts() {
        let pipeline = Pipeline::new(SegmenterConfig::default());
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let report = pipeline.run(input.path(), out.path()).unwrap();
        assert_eq!(report.files, 0);
        assert_eq!(report.panel_count, 0);
        assert_eq!(report.balloon_count, 0);
        assert!(out.path().join("panels").is_dir());
        assert!(out.path().join("balloons").is_dir());
        assert!(out.path().join("report.json").is_file());
    }

    #[test]
    fn test_blank_pages_are_dropped() {
        let pipeline = Pipeline::new(SegmenterConfig::default());
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        // One dark portrait sheet: a single blank page.
        let dark = image::RgbImage::from_pixel(100, 140, Rgb([40, 40, 40]));
        dark.save(input.path().join("000.png")).unwrap();

        let report = pipeline.run(input.path(), out.path()).unwrap();
        assert_eq!(report.files, 1);
        assert_eq!(report.pages, 1);
        assert_eq!(report.blank_pages, 1);
        assert_eq!(report.panel_count, 0);
    }

    #[test]
    fn test_segment_page_empty_on_white() {
        let pipeline = Pipeline::new(SegmenterConfig::default());
        let white = image::RgbImage::from_pixel(300, 300, Rgb([255, 255, 255]));
        let segments =
            pipeline.segment_page(&DynamicImage::ImageRgb8(white), 0, 0, 0);
        assert!(segments.panels.is_empty());
        assert!(segments.balloons.is_empty());
    }

    #[test]
    fn test_image_paths_sorted_and_filtered() {
        let input = tempfile::tempdir().unwrap();
        for name in ["b.jpg", "a.png", "c.txt", "d.JPG"] {
            std::fs::write(input.path().join(name), b"x").unwrap();
        }
        let paths = image_paths(input.path()).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.jpg", "d.JPG"]);
    }
}
