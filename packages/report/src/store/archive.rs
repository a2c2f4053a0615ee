use std::fs::File;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::StoreError;

/// Zip a file or directory tree into memory.
///
/// Directory entries are named relative to `path`, `/`-separated, and
/// visited in file-name order. A single file is stored under its own file
/// name.
pub async fn zip_path(path: PathBuf) -> Result<Vec<u8>, StoreError> {
    tokio::task::spawn_blocking(move || zip_path_blocking(&path))
        .await
        .map_err(|e| StoreError::Io(io::Error::other(e)))?
}

fn zip_path_blocking(path: &Path) -> Result<Vec<u8>, StoreError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    if path.is_dir() {
        for entry in WalkDir::new(path).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            let name = entry_name(path, entry.path())?;
            if entry.file_type().is_dir() {
                writer.add_directory(format!("{name}/"), options)?;
            } else if entry.file_type().is_file() {
                writer.start_file(name, options)?;
                io::copy(&mut File::open(entry.path())?, &mut writer)?;
            }
        }
    } else {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no file name", path.display()),
                )
            })?;
        writer.start_file(name, options)?;
        io::copy(&mut File::open(path)?, &mut writer)?;
    }

    Ok(writer.finish()?.into_inner())
}

fn entry_name(root: &Path, entry: &Path) -> Result<String, StoreError> {
    let relative = entry
        .strip_prefix(root)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}
