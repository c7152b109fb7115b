use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::ScanError;
use crate::scan::natural::NaturalKey;

/// An image file found during a scan, with its natural sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFileEntry {
    path: PathBuf,
    key: NaturalKey,
}

impl ImageFileEntry {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let key = NaturalKey::new(&file_name_of(&path));
        Self { path, key }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name used for ordering and progress output
    pub fn file_name(&self) -> &str {
        self.key.as_str()
    }

    pub fn sort_key(&self) -> &NaturalKey {
        &self.key
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Case-insensitive set of accepted file extensions
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
}

impl ExtensionFilter {
    /// Extensions may be given with or without the leading dot
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { extensions }
    }

    pub fn matches<P: AsRef<Path>>(&self, path: P) -> bool {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some(ext) => {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|accepted| *accepted == ext)
            }
            None => false,
        }
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::new(["jpg", "jpeg", "png", "bmp"])
    }
}

/// List the images in `directory` (not recursing) in natural filename order.
pub fn scan_directory<P: AsRef<Path>>(
    directory: P,
    filter: &ExtensionFilter,
) -> Result<Vec<ImageFileEntry>, ScanError> {
    let directory = directory.as_ref();
    let dir_name = directory.display().to_string();

    if !directory.exists() {
        return Err(ScanError::InputNotFound { path: dir_name });
    }

    let scan_failure = |e: std::io::Error| ScanError::ScanFailure {
        path: dir_name.clone(),
        reason: e.to_string(),
    };

    let mut entries = Vec::new();
    for entry in std::fs::read_dir(directory).map_err(scan_failure)? {
        let path = entry.map_err(scan_failure)?.path();

        // Follows symlinks, so a link to an image counts as an image
        if !path.is_file() {
            warn!("Skipping non-file entry: {}", path.display());
            continue;
        }

        if filter.matches(&path) {
            entries.push(ImageFileEntry::new(path));
        } else {
            debug!("Ignoring file with unsupported extension: {}", path.display());
        }
    }

    if entries.is_empty() {
        return Err(ScanError::NoValidImages { path: dir_name });
    }

    entries.sort_by(|a, b| a.key.cmp(&b.key));

    info!("Found {} images in {}", entries.len(), dir_name);
    Ok(entries)
}
