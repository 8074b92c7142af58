use crate::query::SearchPathSettings;
use std::path::PathBuf;

/// Directory to be searched, and where it came from
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum LookupPathEntry {
    /// Binary directory of the MinGW sysroot matching the image bitness
    DefaultDir(PathBuf),
    /// Additional path entries specified by the user
    UserPath(PathBuf),
    /// Working directory of the process
    WorkingDir(PathBuf),
    /// PATH as specified by the system (value of the PATH variable in the calling shell)
    SystemPath(PathBuf),
}

impl LookupPathEntry {
    pub fn get_path(&self) -> &PathBuf {
        match self {
            Self::DefaultDir(p) | Self::UserPath(p) | Self::WorkingDir(p) | Self::SystemPath(p) => p,
        }
    }
}

/// Sorted list of directories to be looked up when searching for a DLL
///
/// It depends on the bitness of the image whose imports are resolved: 32 and 64-bit DLLs live in
/// separate sysroots.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LookupPath {
    pub entries: Vec<LookupPathEntry>,
}

impl LookupPath {
    pub fn deduce(settings: &SearchPathSettings, is_64: bool) -> Self {
        let base = if !settings.user_path.is_empty() {
            Self::user_path_entries(settings)
        } else if settings.use_default_path {
            let default_dir = if is_64 {
                &settings.default_path_64
            } else {
                &settings.default_path_32
            };
            vec![LookupPathEntry::DefaultDir(default_dir.clone())]
        } else {
            Vec::new()
        };

        let working_dir_entry = settings
            .working_dir
            .iter()
            .map(|p| LookupPathEntry::WorkingDir(p.clone()))
            .collect::<Vec<_>>();

        Self {
            entries: [
                base,
                working_dir_entry,
                Self::system_path_entries(settings),
            ]
            .concat(),
        }
    }

    fn user_path_entries(settings: &SearchPathSettings) -> Vec<LookupPathEntry> {
        settings
            .user_path
            .iter()
            .map(|p| LookupPathEntry::UserPath(p.clone()))
            .collect()
    }

    fn system_path_entries(settings: &SearchPathSettings) -> Vec<LookupPathEntry> {
        settings
            .system_path
            .iter()
            .map(|p| LookupPathEntry::SystemPath(p.clone()))
            .collect()
    }

    // linearize the lookup path into a single vector of directories
    pub fn search_path(&self) -> Vec<PathBuf> {
        self.entries.iter().map(|e| e.get_path().clone()).collect()
    }
}
