use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::CASCADE_BASE_URL;

#[derive(Error, Debug)]
pub enum CascadeResolveError {
    #[error("failed to create cascade cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write cascade to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cascade cache directory")]
    NoCacheDir,
}

/// Resolves a haarcascade XML file by name (without the `.xml` suffix).
///
/// Resolution order:
/// 1. `cascade_dir`, when given (pre-provisioned installs, tests)
/// 2. user cache directory
/// 3. download from the OpenCV data repository into the cache
pub fn resolve(name: &str, cascade_dir: Option<&Path>) -> Result<PathBuf, CascadeResolveError> {
    let file_name = format!("{name}.xml");

    if let Some(dir) = cascade_dir {
        let provided = dir.join(&file_name);
        if provided.exists() {
            return Ok(provided);
        }
    }

    let cache_dir = cascade_cache_dir()?;
    let cached = cache_dir.join(&file_name);
    if cached.exists() {
        return Ok(cached);
    }

    fs::create_dir_all(&cache_dir).map_err(CascadeResolveError::CacheDir)?;
    let url = cascade_url(name);
    log::info!("Fetching {file_name} from {url}");
    download(&url, &cached)?;
    Ok(cached)
}

/// Platform cache location for downloaded cascade files, e.g.
/// `~/.cache/videoanon/cascades/` on Linux.
pub fn cascade_cache_dir() -> Result<PathBuf, CascadeResolveError> {
    dirs::cache_dir()
        .map(|d| d.join("videoanon").join("cascades"))
        .ok_or(CascadeResolveError::NoCacheDir)
}

fn cascade_url(name: &str) -> String {
    format!("{CASCADE_BASE_URL}/{name}.xml")
}

fn download(url: &str, dest: &Path) -> Result<(), CascadeResolveError> {
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|source| CascadeResolveError::Download {
            url: url.to_string(),
            source,
        })?;
    let body = response
        .bytes()
        .map_err(|source| CascadeResolveError::Download {
            url: url.to_string(),
            source,
        })?;
    fs::write(dest, &body).map_err(|source| CascadeResolveError::Write {
        path: dest.to_path_buf(),
        source,
    })?;
    Ok(())
}
