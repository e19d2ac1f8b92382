use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::services::export::ArtifactSink;
use crate::utils::safe_file_name;
use crate::{ClientError, ClientResult};

const STAGING_PREFIX: &str = ".transcript-";
const STAGING_SUFFIX: &str = ".part";

/// Saves exported artifacts into a directory.
///
/// Bytes are staged in a temporary file next to the target and moved into place
/// once fully written. The staging file is removed when it goes out of scope,
/// so a failed save never leaves a partial file behind.
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// First free path for `name`; taken names get a timestamp suffix
    fn unique_target(&self, name: &str) -> PathBuf {
        let candidate = self.dir.join(name);
        if !candidate.exists() {
            return candidate;
        }

        let (stem, ext) = match name.rfind('.') {
            Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
            _ => (name, ""),
        };
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");

        let mut counter = 0u32;
        loop {
            let suffixed = if counter == 0 {
                format!("{}_{}{}", stem, timestamp, ext)
            } else {
                format!("{}_{}_{}{}", stem, timestamp, counter, ext)
            };
            let candidate = self.dir.join(suffixed);
            if !candidate.exists() {
                return candidate;
            }
            counter += 1;
        }
    }
}

impl ArtifactSink for FileSink {
    fn persist_artifact(&self, bytes: &[u8], filename: &str) -> ClientResult<PathBuf> {
        let name = safe_file_name(filename).unwrap_or_else(|| "transcript".to_string());

        fs_err::create_dir_all(&self.dir).map_err(|e| ClientError::Save(e.to_string()))?;

        let staged = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(STAGING_SUFFIX)
            .tempfile_in(&self.dir)
            .map_err(|e| ClientError::Save(e.to_string()))?;

        let target = self.unique_target(&name);
        commit_staged(staged, bytes, &target)?;

        Ok(target)
    }
}

/// Write `bytes` into the staging file and move it to `target`.
///
/// Never replaces an existing file. On any failure the staging file is dropped,
/// which deletes it.
fn commit_staged(mut staged: NamedTempFile, bytes: &[u8], target: &Path) -> ClientResult<()> {
    staged
        .write_all(bytes)
        .and_then(|_| staged.flush())
        .map_err(|e| ClientError::Save(e.to_string()))?;

    tracing::debug!("Moving {} to {}", staged.path().display(), target.display());

    staged
        .persist_noclobber(target)
        .map_err(|e| ClientError::Save(format!("{}: {}", target.display(), e.error)))?;

    Ok(())
}
