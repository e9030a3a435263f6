use std::fmt;
use std::path::{Path, PathBuf};

pub const FILE_SCHEME: &str = "dicomfile:";
pub const URL_SCHEME: &str = "wadouri:";

/// Opaque locator of one 2D image. Position in a stack defines slice order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageId(String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn from_url(url: &str) -> Self {
        Self(format!("{URL_SCHEME}{url}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the bytes behind an [`ImageId`] live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    File(PathBuf),
    Url(String),
}

/// Hands out `dicomfile:` identifiers for files picked by the user. Numbers
/// keep increasing across [`FileManager::clear`], so an identifier is never
/// reused for a different file.
#[derive(Debug, Default)]
pub struct FileManager {
    files: Vec<PathBuf>,
    first_index: usize,
}

impl FileManager {
    pub fn add(&mut self, path: &Path) -> ImageId {
        let index = self.first_index + self.files.len();
        self.files.push(path.to_path_buf());
        ImageId(format!("{FILE_SCHEME}{index}"))
    }

    pub fn get(&self, id: &ImageId) -> Option<&Path> {
        let index: usize = id.as_str().strip_prefix(FILE_SCHEME)?.parse().ok()?;
        self.files
            .get(index.checked_sub(self.first_index)?)
            .map(PathBuf::as_path)
    }

    /// Forgets every registered path.
    pub fn clear(&mut self) {
        self.first_index += self.files.len();
        self.files.clear();
    }

    pub fn resolve(&self, id: &ImageId) -> Option<ImageSource> {
        if let Some(url) = id.as_str().strip_prefix(URL_SCHEME) {
            return Some(ImageSource::Url(url.to_string()));
        }
        self.get(id).map(|path| ImageSource::File(path.to_path_buf()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
