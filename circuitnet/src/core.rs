//! File-level entry points shared by the CLI and library users.
//! Everything below this layer works on in-memory values.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::detection::{load_detections, ComponentRecord};
use crate::extract::debug::{render_detections, render_nodes, render_regions};
use crate::extract::{extract, Extraction, ExtractionOptions, NodeAssignment};
use crate::netlist::Netlist;
use crate::verify::{find_correspondence, Correspondence, VerifyOptions};

#[derive(Debug, thiserror::Error)]
pub enum CircuitNetError {
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Detection file error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

/// Netlist extracted from one image
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub image: PathBuf,
    pub components: usize,
    pub assignment: NodeAssignment,
    /// Debug rasters written for this image
    pub artifacts: Vec<PathBuf>,
}

impl ExtractionResult {
    pub fn netlist(&self) -> &Netlist {
        &self.assignment.netlist
    }
}

/// Outcome of comparing one generated netlist with its ground truth
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub generated: PathBuf,
    pub ground_truth: PathBuf,
    pub equivalent: bool,
    pub correspondence: Option<Correspondence>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Compared(Comparison),
    /// No ground-truth file with the same name
    Skipped { generated: PathBuf },
    /// Either file could not be read or parsed
    Failed { generated: PathBuf, error: String },
}

/// Directory-pair comparison
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn compared(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Compared(_)))
            .count()
    }

    pub fn equivalent(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Compared(c) if c.equivalent))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Skipped { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Failed { .. }))
            .count()
    }

    /// Share of compared netlists that are equivalent, in percent
    pub fn accuracy(&self) -> f64 {
        let compared = self.compared();
        if compared == 0 {
            return 0.0;
        }
        self.equivalent() as f64 / compared as f64 * 100.0
    }
}

/// Netlist text files (`*.txt`) directly inside `dir`, sorted by name
pub fn discover_netlists(dir: &Path) -> Result<Vec<PathBuf>, CircuitNetError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("txt") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Core API used by the CLI.
pub struct CircuitNetCore;

impl CircuitNetCore {
    /// Extract the netlist of one image given its detector output.
    /// With `debug_dir`, the debug rasters are written there.
    pub fn extract_file(
        image_path: &Path,
        detections_path: &Path,
        options: &ExtractionOptions,
        debug_dir: Option<&Path>,
    ) -> Result<ExtractionResult, CircuitNetError> {
        let image = image::open(image_path)?;
        let components = load_detections(detections_path)?;
        tracing::info!(
            "Extracting {} ({}x{}, {} detections)",
            image_path.display(),
            image.width(),
            image.height(),
            components.len()
        );

        let extraction = extract(&image, &components, options);
        let artifacts = match debug_dir {
            Some(dir) => Self::write_artifacts(dir, &image, &components, &extraction)?,
            None => Vec::new(),
        };

        Ok(ExtractionResult {
            image: image_path.to_path_buf(),
            components: components.len(),
            assignment: extraction.assignment,
            artifacts,
        })
    }

    fn write_artifacts(
        dir: &Path,
        image: &image::DynamicImage,
        components: &[ComponentRecord],
        extraction: &Extraction,
    ) -> Result<Vec<PathBuf>, CircuitNetError> {
        std::fs::create_dir_all(dir)?;

        let annotated = dir.join("annotated.png");
        render_detections(image, components).save(&annotated)?;

        let region_image = dir.join("region_image.png");
        render_regions(&extraction.regions, &extraction.assignment).save(&region_image)?;

        let labeled = dir.join("labeled_nodes_image.png");
        render_nodes(&extraction.mask, &extraction.regions, &extraction.assignment)
            .save(&labeled)?;

        tracing::debug!("Wrote debug images to {}", dir.display());
        Ok(vec![annotated, region_image, labeled])
    }

    /// Write a netlist in the text format, creating parent directories.
    pub fn write_netlist(path: &Path, netlist: &Netlist) -> Result<(), CircuitNetError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        netlist.write(path)?;
        tracing::debug!("Wrote {} components to {}", netlist.len(), path.display());
        Ok(())
    }

    /// Compare a generated netlist file with its ground-truth file.
    pub fn compare_files(
        generated: &Path,
        ground_truth: &Path,
        options: &VerifyOptions,
    ) -> Result<Comparison, CircuitNetError> {
        let test = Netlist::read(generated)?;
        let truth = Netlist::read(ground_truth)?;

        let correspondence = find_correspondence(&truth, &test, options);
        Ok(Comparison {
            generated: generated.to_path_buf(),
            ground_truth: ground_truth.to_path_buf(),
            equivalent: correspondence.is_some(),
            correspondence,
        })
    }

    /// Compare every generated netlist with the same-named ground-truth file.
    /// Missing ground truth is skipped; unreadable files are recorded, not fatal.
    pub fn compare_directories(
        generated_dir: &Path,
        ground_truth_dir: &Path,
        options: &VerifyOptions,
    ) -> Result<BatchReport, CircuitNetError> {
        let mut report = BatchReport::default();

        for generated in discover_netlists(generated_dir)? {
            let Some(name) = generated.file_name() else {
                continue;
            };
            let ground_truth = ground_truth_dir.join(name);
            if !ground_truth.is_file() {
                tracing::warn!(
                    "Skipping {}: ground truth file not found",
                    generated.display()
                );
                report.outcomes.push(FileOutcome::Skipped { generated });
                continue;
            }

            match Self::compare_files(&generated, &ground_truth, options) {
                Ok(comparison) => {
                    tracing::info!(
                        "{}: {}",
                        generated.display(),
                        if comparison.equivalent { "match" } else { "no match" }
                    );
                    report.outcomes.push(FileOutcome::Compared(comparison));
                }
                Err(e) => {
                    tracing::warn!("Failed to compare {}: {}", generated.display(), e);
                    report.outcomes.push(FileOutcome::Failed {
                        generated,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comparison(equivalent: bool) -> FileOutcome {
        FileOutcome::Compared(Comparison {
            generated: PathBuf::from("a.txt"),
            ground_truth: PathBuf::from("b.txt"),
            equivalent,
            correspondence: None,
        })
    }

    #[test]
    fn test_accuracy_counts_only_compared() {
        let report = BatchReport {
            outcomes: vec![
                comparison(true),
                comparison(false),
                comparison(true),
                comparison(true),
                FileOutcome::Skipped {
                    generated: PathBuf::from("c.txt"),
                },
            ],
        };

        assert_eq!(report.compared(), 4);
        assert_eq!(report.equivalent(), 3);
        assert_eq!(report.skipped(), 1);
        assert!((report.accuracy() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_accuracy_of_empty_report() {
        assert_eq!(BatchReport::default().accuracy(), 0.0);
    }
}
