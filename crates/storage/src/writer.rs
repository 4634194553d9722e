//! Atomic GeoTIFF writes into the output layout.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use raster_common::Grid;

use crate::error::{StorageError, StorageResult};
use crate::geotiff::write_grid;
use crate::layout::{OutputKey, OutputLayout};

/// What happened to one output key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written { path: PathBuf, attempts: u32 },
    /// Resume mode: the file was already there.
    SkippedExisting { path: PathBuf },
}

impl WriteOutcome {
    pub fn path(&self) -> &Path {
        match self {
            WriteOutcome::Written { path, .. } | WriteOutcome::SkippedExisting { path } => path,
        }
    }
}

/// Writes summary grids as GeoTIFFs.
///
/// Each file is written to a temporary sibling and renamed into place, so a
/// final path never holds a partial file.
#[derive(Debug, Clone)]
pub struct RasterWriter {
    layout: OutputLayout,
    overwrite: bool,
}

impl RasterWriter {
    pub fn new(layout: OutputLayout, overwrite: bool) -> Self {
        Self { layout, overwrite }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Write one grid, retrying once on failure.
    pub fn write(&self, key: &OutputKey, grid: &Grid) -> StorageResult<WriteOutcome> {
        let path = self.layout.path_for(key);

        if !self.overwrite && path.exists() {
            debug!(key = %key, path = %path.display(), "Output exists, skipping");
            return Ok(WriteOutcome::SkippedExisting { path });
        }

        match write_atomic(&path, grid) {
            Ok(()) => Ok(WriteOutcome::Written { path, attempts: 1 }),
            Err(e) => {
                warn!(key = %key, error = %e, "Write failed, retrying once");
                write_atomic(&path, grid)?;
                Ok(WriteOutcome::Written { path, attempts: 2 })
            }
        }
    }
}

fn write_atomic(path: &Path, grid: &Grid) -> StorageResult<()> {
    let parent = path.parent().ok_or_else(|| {
        StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} has no parent directory", path.display()),
        ))
    })?;
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write_grid(&mut writer, grid)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}
