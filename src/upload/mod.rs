pub mod clipboard;
pub mod error;
pub mod pipeline;
pub mod poll;
pub mod report;
pub mod selector;

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::api::VideoApi;

use clipboard::Clipboard;
use error::UploadError;
use pipeline::{BatchOutcome, PipelineOptions, run_batch};
use report::{Report, build_report};
use selector::{Prompter, select_files};

pub enum UploadRun {
    /// The path and filter matched nothing; no API call was made.
    NoFiles,
    Finished {
        outcome: BatchOutcome,
        report: Option<Report>,
        copied: bool,
    },
}

/// File selection, the upload batch, then aggregation of whatever succeeded.
pub async fn upload(
    api: Arc<dyn VideoApi>,
    path: &Path,
    filter: &str,
    options: &PipelineOptions,
    prompter: &dyn Prompter,
    clipboard: Option<&mut dyn Clipboard>,
) -> Result<UploadRun, UploadError> {
    let files = select_files(path, filter, prompter)?;
    if files.is_empty() {
        info!(path = %path.display(), filter, "no files matched");
        return Ok(UploadRun::NoFiles);
    }

    info!(
        files = files.len(),
        concurrency = options.concurrency,
        policy = %options.policy,
        "starting uploads"
    );
    let outcome = run_batch(api, files, options).await;
    let report = build_report(&outcome);

    let mut copied = false;
    if let (Some(report), Some(clipboard)) = (&report, clipboard) {
        match clipboard.copy(&report.clipboard) {
            Ok(()) => copied = true,
            Err(e) => warn!(error = %e, "could not copy to clipboard"),
        }
    }

    Ok(UploadRun::Finished {
        outcome,
        report,
        copied,
    })
}
