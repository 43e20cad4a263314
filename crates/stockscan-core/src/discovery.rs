use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::MediaFormat;

/// Collect photos from the given paths. Files are taken as-is, directories
/// are walked for files with a supported image extension.
pub fn discover_images<P: AsRef<Path>>(paths: &[P], config: &Config) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    for path in paths {
        let path = path.as_ref();
        if path.is_dir() {
            images.extend(discover_images_in_directory(path, config)?);
        } else if path.exists() {
            images.push(path.to_path_buf());
        } else {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
    }

    Ok(images)
}

/// Discover images in a single directory, sorted for stable output
fn discover_images_in_directory(directory: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    if !directory.exists() {
        return Err(Error::FileNotFound(directory.to_path_buf()));
    }

    let max_depth = config.max_depth.unwrap_or(usize::MAX);

    let mut image_files: Vec<PathBuf> = WalkDir::new(directory)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_image_path(p))
        .collect();

    image_files.sort();
    Ok(image_files)
}

/// Returns if the given path has an extension the pipeline can handle
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(MediaFormat::from_extension)
        .map(|format| format.is_natively_decodable() || format == MediaFormat::Heic)
        .unwrap_or(false)
}

// -- Tests --
