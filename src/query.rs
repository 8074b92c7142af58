//! Data structures that must be filled with the input and the parameters for the DLL scan

use std::collections::HashSet;
use std::path::PathBuf;

/// Binary directory of the 64-bit MinGW sysroot (Fedora layout)
pub const MINGW64_SEARCH_PATH: &str = "/usr/x86_64-w64-mingw32/sys-root/mingw/bin";
/// Binary directory of the 32-bit MinGW sysroot (Fedora layout)
pub const MINGW32_SEARCH_PATH: &str = "/usr/i686-w64-mingw32/sys-root/mingw/bin";

// lower-case because windows is case insensitive
const DEFAULT_WHITELIST: [&str; 4] = ["advapi32.dll", "kernel32.dll", "msvcrt.dll", "user32.dll"];

#[derive(Clone, Debug, Default)]
pub struct LookupTarget {
    /// Executables or DLLs whose dependencies are listed
    pub files: Vec<PathBuf>,
}

#[derive(Clone, Debug, Default)]
pub struct LookupParameters {
    /// Resolve DLL names to files through the search path
    pub resolve: bool,
    /// Also list the dependencies of the resolved DLLs (only effective when resolving)
    pub transitive: bool,
    /// Include the target files themselves in the result
    pub include_originals: bool,
    /// Skip files that can't be parsed and DLLs that can't be found, instead of failing
    pub ignore_errors: bool,
}

/// Where DLLs are looked for
#[derive(Clone, Debug)]
pub struct SearchPathSettings {
    /// Directories specified by the user; if any, the architecture default is not used
    pub user_path: Vec<PathBuf>,
    /// Working directory, searched after the user path
    pub working_dir: Option<PathBuf>,
    /// PATH entries, searched last
    pub system_path: Vec<PathBuf>,
    /// Fall back to the sysroot matching the image bitness when no user path is given
    pub use_default_path: bool,
    pub default_path_64: PathBuf,
    pub default_path_32: PathBuf,
}

impl Default for SearchPathSettings {
    fn default() -> Self {
        Self {
            user_path: Vec::new(),
            working_dir: None,
            system_path: Vec::new(),
            use_default_path: true,
            default_path_64: PathBuf::from(MINGW64_SEARCH_PATH),
            default_path_32: PathBuf::from(MINGW32_SEARCH_PATH),
        }
    }
}

impl SearchPathSettings {
    /// Add the entries of the PATH environment variable
    pub fn add_env_path(&mut self) {
        if let Some(path) = std::env::var_os("PATH") {
            self.system_path.extend(
                std::env::split_paths(&path).filter(|p| !p.as_os_str().is_empty()),
            );
        }
    }
}

/// DLL names (stored lowercase) that are neither reported nor traversed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Whitelist {
    entries: HashSet<String>,
}

impl Default for Whitelist {
    fn default() -> Self {
        DEFAULT_WHITELIST.iter().copied().collect()
    }
}

impl Whitelist {
    pub fn empty() -> Self {
        Self {
            entries: HashSet::new(),
        }
    }

    pub fn insert(&mut self, name: &str) {
        self.entries.insert(name.to_ascii_lowercase());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for Whitelist {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut ret = Self::empty();
        for name in iter {
            ret.insert(name);
        }
        ret
    }
}

/// Complete specification of a search task
#[derive(Clone, Debug, Default)]
pub struct LookupQuery {
    pub target: LookupTarget,
    pub parameters: LookupParameters,
    pub search_path: SearchPathSettings,
    pub whitelist: Whitelist,
}

impl LookupQuery {
    /// List the direct imports of the given files, with the default settings
    pub fn new<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            target: LookupTarget {
                files: files.into_iter().map(Into::into).collect(),
            },
            ..Self::default()
        }
    }
}
