use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

const NEWSLETTER_STEM: &str = "newsletter";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// `newsletter.txt`, or `newsletter-<stamp>.txt` with filesystem-hostile characters replaced.
pub fn newsletter_filename(stamp: Option<&str>) -> String {
    match stamp.map(sanitize_stamp).filter(|stamp| !stamp.is_empty()) {
        Some(stamp) => format!("{NEWSLETTER_STEM}-{stamp}.txt"),
        None => format!("{NEWSLETTER_STEM}.txt"),
    }
}

fn sanitize_stamp(stamp: &str) -> String {
    stamp
        .trim()
        .chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect()
}

/// Writes finished newsletters into one directory, atomically.
pub struct NewsletterWriter {
    dir: PathBuf,
}

impl NewsletterWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Write `content` to `{dir}/{filename}` via a temp file and rename.
    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        if !content.ends_with('\n') {
            tmp.write_all(b"\n")?;
        }
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // Replace existing file if present; rename does not overwrite on every platform.
        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}
