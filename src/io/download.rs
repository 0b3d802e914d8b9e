use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Download `url` to `dest` unless `dest` already exists.
///
/// There is no freshness check: an existing file is returned as is. The body is
/// written to a temporary file beside `dest` and renamed into place once complete.
pub fn download(url: &str, dest: &Path) -> Result<PathBuf> {
    if dest.exists() {
        debug!("{} already present, skipping download", dest.display());
        return Ok(dest.to_path_buf());
    }

    info!("Downloading {}", url);

    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;

    let mut response = reqwest::blocking::get(url)
        .with_context(|| format!("GET {}", url))?
        .error_for_status()
        .with_context(|| format!("GET {} returned error status", url))?;

    let mut tmp = NamedTempFile::new_in(dir).context("create temp file")?;
    let bytes = std::io::copy(&mut response, tmp.as_file_mut())
        .with_context(|| format!("write {}", dest.display()))?;
    tmp.persist(dest)
        .with_context(|| format!("rename to {}", dest.display()))?;

    info!("Saved {} bytes to {}", bytes, dest.display());
    Ok(dest.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_file_is_not_downloaded() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("rashuiot.csv");
        fs::write(&dest, "cached").unwrap();

        // Unroutable URL: any request attempt would fail
        let path = download("http://127.0.0.1:9/rashuiot.csv", &dest).unwrap();
        assert_eq!(path, dest);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "cached");
    }
}
