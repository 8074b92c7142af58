use crate::common::{file_name_of, path_to_string, LookupError};
use crate::lookup_path::LookupPath;
use crate::pe;
use crate::query::LookupQuery;
use crate::report::Report;
use crate::system::DirectoryIndex;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug)]
struct Job {
    /// File name, as seen on the command line or in the importer's import table
    pub dllname: String,
    pub path: PathBuf,
}

/// Lists the dependencies of the target files, following them transitively if requested
///
/// Every file name is processed at most once, so cycles and diamonds in the dependency graph are
/// harmless. The order of the worklist doesn't matter since the results are sorted.
pub(crate) struct Runner<'q> {
    query: &'q LookupQuery,
    index: DirectoryIndex,
    known_files: HashMap<String, PathBuf>, // lowercase file name as key, as Windows does
    executables_to_lookup: Vec<Job>,
    report: Report,
}

impl<'q> Runner<'q> {
    pub(crate) fn new(query: &'q LookupQuery) -> Self {
        Self {
            query,
            index: DirectoryIndex::new(),
            known_files: HashMap::new(),
            executables_to_lookup: Vec::new(),
            report: Report::new(),
        }
    }

    // files already known (enqueued or processed) are skipped; returns whether the file was new
    fn enqueue(&mut self, dllname: &str, path: PathBuf) -> bool {
        let key = dllname.to_ascii_lowercase();
        if self.known_files.contains_key(&key) {
            return false;
        }
        self.known_files.insert(key, path.clone());
        self.executables_to_lookup.push(Job {
            dllname: dllname.to_owned(),
            path,
        });
        true
    }

    fn pop(&mut self) -> Option<Job> {
        self.executables_to_lookup.pop()
    }

    // swallow the error if the user asked so
    fn recover(&self, e: LookupError) -> Result<(), LookupError> {
        if self.query.parameters.ignore_errors {
            log::warn!("ignoring error: {}", e);
            Ok(())
        } else {
            Err(e)
        }
    }

    fn seed(&mut self) -> Result<(), LookupError> {
        let query = self.query;
        for file in &query.target.files {
            let dllname = file_name_of(file)?;
            if self.enqueue(&dllname, file.clone()) && query.parameters.include_originals {
                self.report.results.insert(path_to_string(file));
            }
        }
        Ok(())
    }

    fn process(&mut self, job: Job) -> Result<(), LookupError> {
        let query = self.query;
        let resolve = query.parameters.resolve || query.parameters.transitive;

        log::debug!("reading imports of {}", path_to_string(&job.path));
        let modules = match pe::read_dependencies_from_file(&job.path) {
            Ok(modules) => modules,
            Err(e) => return self.recover(e),
        };
        self.report.processed.insert(job.dllname.clone());

        let search_path = if resolve {
            let lookup_path = LookupPath::deduce(&query.search_path, modules.is_64);
            let search_path = lookup_path.search_path();
            log::debug!(
                "search path for {} ({}-bit): {:?}",
                job.dllname,
                if modules.is_64 { 64 } else { 32 },
                search_path
            );
            search_path
        } else {
            Vec::new()
        };

        for name in modules.names {
            if query.whitelist.contains(&name) {
                continue;
            }
            self.report
                .imports
                .insert(job.dllname.clone(), name.clone());

            if !resolve {
                self.report.results.insert(name);
                continue;
            }

            match self.index.resolve(&search_path, &name) {
                Ok(resolved) => {
                    self.report.results.insert(path_to_string(&resolved));
                    if query.parameters.transitive {
                        self.enqueue(&name, resolved);
                    }
                }
                Err(e) if e.is_resolution_failure() => self.recover(e)?,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub(crate) fn run(&mut self) -> Result<Report, LookupError> {
        self.seed()?;
        while let Some(job) = self.pop() {
            self.process(job)?;
        }
        Ok(std::mem::take(&mut self.report))
    }
}

/// Find the dependencies of the files in the query
pub fn run(query: &LookupQuery) -> Result<Report, LookupError> {
    Runner::new(query).run()
}
