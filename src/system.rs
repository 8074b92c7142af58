use crate::common::{path_to_string, LookupError};
use fs_err as fs;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Caches the content of already scanned directories, to avoid repeated filesystem access
///
/// Each directory is listed once, on first use, and its files are indexed by their ASCII-lowercased
/// name, so that lookups follow Windows' case-insensitive semantics. Directories are assumed not
/// to change during a run: the cache is never invalidated.
#[derive(Debug, Default)]
pub struct DirectoryIndex {
    files_in_dirs: HashMap<PathBuf, HashMap<String, String>>,
}

impl DirectoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of directories scanned so far
    pub fn len(&self) -> usize {
        self.files_in_dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files_in_dirs.is_empty()
    }

    /// Find `filename` in the first directory containing it
    ///
    /// A name missing from all directories is not an error at this level: `Ok(None)` is returned,
    /// while failures to list a directory are reported as errors.
    pub fn lookup<P: AsRef<Path>>(
        &mut self,
        directories: &[P],
        filename: &str,
    ) -> Result<Option<PathBuf>, LookupError> {
        let key = filename.to_ascii_lowercase();
        for dir in directories {
            let dir = dir.as_ref();
            if let Some(actual_filename) = self.scan_folder(dir)?.get(&key) {
                return Ok(Some(dir.join(actual_filename)));
            }
        }
        Ok(None)
    }

    /// Like `lookup`, with a missing file turned into `LookupError::NotFound`
    pub fn resolve<P: AsRef<Path>>(
        &mut self,
        directories: &[P],
        filename: &str,
    ) -> Result<PathBuf, LookupError> {
        self.lookup(directories, filename)?
            .ok_or_else(|| LookupError::NotFound(filename.to_owned()))
    }

    /// Index the files in `folder`, unless that was already done
    ///
    /// A folder that doesn't exist (or isn't a folder) is indexed as empty.
    pub fn scan_folder(&mut self, folder: &Path) -> Result<&HashMap<String, String>, LookupError> {
        if !self.files_in_dirs.contains_key(folder) {
            let files = Self::list_files(folder)?;
            self.files_in_dirs.insert(folder.to_owned(), files);
        }
        self.files_in_dirs.get(folder).ok_or_else(|| {
            LookupError::ScanError(format!(
                "Could not scan directory {}",
                path_to_string(folder)
            ))
        })
    }

    fn list_files(folder: &Path) -> Result<HashMap<String, String>, LookupError> {
        if !folder.is_dir() {
            log::debug!("skipping non-existing directory {}", path_to_string(folder));
            return Ok(HashMap::new());
        }

        let mut files = HashMap::new();
        for entry in fs::read_dir(folder)? {
            let entry = entry?;
            // follows symlinks, which sysroots use for versioned DLLs
            if !entry.path().is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => {
                    files.insert(name.to_ascii_lowercase(), name);
                }
                Err(name) => log::warn!(
                    "skipping non UTF-8 file name {:?} in {}",
                    name,
                    path_to_string(folder)
                ),
            }
        }
        log::debug!(
            "indexed {} files in {}",
            files.len(),
            path_to_string(folder)
        );
        Ok(files)
    }
}
