//! Merge service - drives the word processor through one merge.

use crate::automation::{AutomationError, AutomationProvider, AutomationSession, KeepFlags, SaveFormat};
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use std::time::Instant;
use thiserror::Error;

/// Everything needed to run one merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    /// Where the merged document is saved
    pub output_path: Utf8PathBuf,
    /// Input documents in merge order
    pub inputs: Vec<Utf8PathBuf>,
    /// Formatting preserved for each inserted file
    pub keep: KeepFlags,
    /// Also export a PDF next to the output
    pub export_pdf: bool,
}

/// Files produced by a successful merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub output: Utf8PathBuf,
    pub pdf: Option<Utf8PathBuf>,
}

/// Step of the merge that talks to the word processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStep {
    Open,
    MoveToEnd,
    Insert,
    Save,
    ExportPdf,
}

impl fmt::Display for MergeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "Opening",
            Self::MoveToEnd => "Moving to document end before inserting",
            Self::Insert => "Inserting",
            Self::Save => "Saving",
            Self::ExportPdf => "Exporting PDF to",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during a merge
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("No files to merge")]
    NoInputs,

    #[error("File not found: {0}")]
    FileNotFound(Utf8PathBuf),

    #[error("Cannot resolve path {path}: {reason}")]
    InvalidPath { path: Utf8PathBuf, reason: String },

    #[error("Could not start the word processor: {0}")]
    Startup(#[source] AutomationError),

    #[error("{step} {path} failed")]
    StepFailed { step: MergeStep, path: Utf8PathBuf },

    #[error("{step} {path} failed: {source}")]
    StepError {
        step: MergeStep,
        path: Utf8PathBuf,
        #[source]
        source: AutomationError,
    },
}

impl MergeError {
    /// The step that failed, if the failure came from the word processor
    pub fn step(&self) -> Option<MergeStep> {
        match self {
            Self::StepFailed { step, .. } | Self::StepError { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// Drives the word processor through a merge.
///
/// The service is stateless: each call acquires its own automation session from the
/// provider and releases it before returning, whatever the outcome. The sequence is:
///
/// 1. open the first input as the active document
/// 2. for each remaining input: check it exists, move to document end, insert it
/// 3. save to the output path
/// 4. optionally save a PDF copy next to the output
///
/// Any step that raises or reports failure aborts the merge. Nothing is rolled back.
#[derive(Debug, Default)]
pub struct MergeService;

impl MergeService {
    pub fn new() -> Self {
        Self
    }

    /// Merge `request.inputs` into `request.output_path`.
    pub fn merge(
        &self,
        provider: &dyn AutomationProvider,
        request: &MergeRequest,
    ) -> Result<MergeOutcome, MergeError> {
        let Some((first, rest)) = request.inputs.split_first() else {
            return Err(MergeError::NoInputs);
        };

        let first = absolute(first)?;
        if !first.exists() {
            return Err(MergeError::FileNotFound(first));
        }
        let output = absolute(&request.output_path)?;

        let started = Instant::now();
        tracing::info!(
            "Merging {} file(s) into {} (keep: {:?}, pdf: {})",
            request.inputs.len(),
            output,
            request.keep,
            request.export_pdf
        );

        let mut session = AutomationSession::acquire(provider).map_err(MergeError::Startup)?;

        // Opening the first file (rather than inserting it into a blank document)
        // avoids an empty leading page
        check(MergeStep::Open, &first, session.open(&first))?;
        tracing::debug!("Opened {}", first);

        for path in rest {
            let path = absolute(path)?;
            if !path.exists() {
                return Err(MergeError::FileNotFound(path));
            }

            check(MergeStep::MoveToEnd, &path, session.move_to_doc_end())?;
            check(MergeStep::Insert, &path, session.insert_file(&path, request.keep))?;
            tracing::debug!("Inserted {}", path);
        }

        let format = SaveFormat::from_path(&output).unwrap_or(SaveFormat::Hwp);
        check(MergeStep::Save, &output, session.save_as(&output, format))?;
        tracing::info!("Saved merged document to {}", output);

        let pdf = if request.export_pdf {
            let pdf_path = pdf_path_for(&output);
            check(
                MergeStep::ExportPdf,
                &pdf_path,
                session.save_as(&pdf_path, SaveFormat::Pdf),
            )?;
            tracing::info!("Exported PDF to {}", pdf_path);
            Some(pdf_path)
        } else {
            None
        };

        tracing::info!("Merge finished in {:?}", started.elapsed());

        Ok(MergeOutcome { output, pdf })
    }
}

/// Path of the PDF exported alongside `output`.
pub fn pdf_path_for(output: &Utf8Path) -> Utf8PathBuf {
    output.with_extension("pdf")
}

fn check(
    step: MergeStep,
    path: &Utf8Path,
    result: Result<bool, AutomationError>,
) -> Result<(), MergeError> {
    match result {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::error!("{} {} reported failure", step, path);
            Err(MergeError::StepFailed {
                step,
                path: path.to_path_buf(),
            })
        }
        Err(source) => {
            tracing::error!("{} {} raised: {}", step, path, source);
            Err(MergeError::StepError {
                step,
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

fn absolute(path: &Utf8Path) -> Result<Utf8PathBuf, MergeError> {
    let invalid = |reason: String| MergeError::InvalidPath {
        path: path.to_path_buf(),
        reason,
    };
    let resolved = std::path::absolute(path).map_err(|e| invalid(e.to_string()))?;
    Utf8PathBuf::try_from(resolved).map_err(|e| invalid(e.to_string()))
}
