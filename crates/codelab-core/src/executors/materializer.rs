//! Writes a submission to a uniquely named file the interpreter can run.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempPath};
use uuid::Uuid;

use crate::errors::ExecutionError;

const SOURCE_PREFIX: &str = "submission-";
const SOURCE_SUFFIX: &str = ".py";

/// A materialized submission on disk.
///
/// The backing file is removed by `release`, or on drop if `release` was
/// never reached, so every exit path of the owning request cleans up.
#[derive(Debug)]
pub struct SourceHandle {
    path: PathBuf,
    id: Uuid,
    file: Option<TempPath>,
}

impl SourceHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifier embedded in the file name, used in log lines.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_released(&self) -> bool {
        self.file.is_none()
    }

    /// Remove the backing file. Safe to call more than once, and succeeds if
    /// something else already deleted the file.
    pub fn release(&mut self) -> std::io::Result<()> {
        match self.file.take() {
            Some(file) => match file.close() {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e),
            },
            None => Ok(()),
        }
    }
}

/// Write `code` verbatim to a fresh file under `dir`.
///
/// The file is created exclusively with a UUID in its name, and is flushed and
/// closed before the handle is returned.
pub async fn materialize(code: &str, dir: &Path) -> Result<SourceHandle, ExecutionError> {
    let code = code.as_bytes().to_vec();
    let dir = dir.to_path_buf();

    tokio::task::spawn_blocking(move || write_source(&code, &dir))
        .await
        .map_err(|e| ExecutionError::Materialization(format!("writer task failed: {}", e)))?
}

fn write_source(code: &[u8], dir: &Path) -> Result<SourceHandle, ExecutionError> {
    let materialization = |e: std::io::Error| {
        ExecutionError::Materialization(format!("{} ({})", e, dir.display()))
    };

    std::fs::create_dir_all(dir).map_err(materialization)?;

    let id = Uuid::new_v4();
    let prefix = format!("{}{}-", SOURCE_PREFIX, id);
    let mut file = Builder::new()
        .prefix(&prefix)
        .suffix(SOURCE_SUFFIX)
        .tempfile_in(dir)
        .map_err(materialization)?;

    file.write_all(code).map_err(materialization)?;
    file.flush().map_err(materialization)?;
    file.as_file().sync_all().map_err(materialization)?;

    let file = file.into_temp_path();
    let path = file.to_path_buf();
    log::debug!("Materialized submission {} at {}", id, path.display());

    Ok(SourceHandle {
        path,
        id,
        file: Some(file),
    })
}
