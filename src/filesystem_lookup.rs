use std::fs::File;
use std::io::{Error, ErrorKind, Result};
use std::path::{Path, PathBuf};

use relative_path::RelativePath;

use crate::*;

/// A lookup which is backed by a given root directory.
///
/// Locators are `/`-separated paths relative to the root, such as `icons/print.png`; a leading `/` is ignored.  Like
/// class-path resources, they never escape the root: a locator whose `..` segments would leave it is refused, primarily
/// as a measure to detect bugs.
#[derive(Debug)]
pub struct FilesystemLookup {
    root_path: PathBuf,
}

impl FilesystemLookup {
    pub fn new(root_path: &Path) -> FilesystemLookup {
        FilesystemLookup {
            root_path: root_path.to_path_buf(),
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Map a locator to the file it names under the root.
    pub fn path_for(&self, locator: &Locator) -> Result<PathBuf> {
        let relative = RelativePath::new(locator.as_str().trim_start_matches('/'));
        let absolute = relative.to_logical_path(&self.root_path);
        if !absolute.starts_with(&self.root_path) {
            return Err(Error::new(
                ErrorKind::PermissionDenied,
                format!("{} is outside the lookup root", locator),
            ));
        }
        Ok(absolute)
    }
}

impl ResourceLookup for FilesystemLookup {
    type Reader = File;

    fn open(&self, locator: &Locator) -> Result<File> {
        File::open(self.path_for(locator)?)
    }
}
