use std::fs;
use std::path::{Path, PathBuf};

use dialoguer::MultiSelect;
use dialoguer::theme::ColorfulTheme;
use regex::{Regex, RegexBuilder};
use tracing::debug;

use super::error::UploadError;

/// Confirms which of several candidate files should be uploaded.
pub trait Prompter {
    fn confirm_files(&self, candidates: &[PathBuf]) -> Result<Vec<PathBuf>, UploadError>;
}

pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm_files(&self, candidates: &[PathBuf]) -> Result<Vec<PathBuf>, UploadError> {
        let items: Vec<String> = candidates.iter().map(|p| display_name(p)).collect();
        let defaults = vec![true; items.len()];

        let chosen = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt("Select files to upload")
            .items(&items)
            .defaults(&defaults)
            .interact()?;

        Ok(chosen.into_iter().map(|i| candidates[i].clone()).collect())
    }
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn build_filter(filter: &str) -> Result<Regex, UploadError> {
    Ok(RegexBuilder::new(filter).case_insensitive(true).build()?)
}

/// Lists the files under `base` (or `base` itself) whose names match `filter`.
///
/// Directories are not walked recursively and sub-directories are skipped.
/// Results are sorted by name.
pub fn find_candidates(base: &Path, filter: &Regex) -> Result<Vec<PathBuf>, UploadError> {
    let fs_err = |source| UploadError::Filesystem {
        path: base.to_path_buf(),
        source,
    };

    let meta = fs::metadata(base).map_err(fs_err)?;
    if !meta.is_dir() {
        let name = display_name(base);
        return Ok(if filter.is_match(&name) {
            vec![base.to_path_buf()]
        } else {
            vec![]
        });
    }

    let mut candidates = Vec::new();
    for entry in fs::read_dir(base).map_err(fs_err)? {
        let entry = entry.map_err(fs_err)?;
        let path = entry.path();
        if !path.is_file() {
            debug!(path = %path.display(), "skipping non-file entry");
            continue;
        }
        if filter.is_match(&entry.file_name().to_string_lossy()) {
            candidates.push(path);
        }
    }
    candidates.sort();
    Ok(candidates)
}

/// Resolves the final upload list. More than one candidate goes through the
/// prompter; zero or one never does.
pub fn select_files(
    base: &Path,
    filter: &str,
    prompter: &dyn Prompter,
) -> Result<Vec<PathBuf>, UploadError> {
    let filter = build_filter(filter)?;
    let candidates = find_candidates(base, &filter)?;
    if candidates.len() <= 1 {
        return Ok(candidates);
    }
    prompter.confirm_files(&candidates)
}
