use multimap::MultiMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Result of a dependency scan
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Module names, or resolved paths when resolving, sorted and without duplicates
    pub results: BTreeSet<String>,
    /// File names of the executables whose import tables were read
    pub processed: BTreeSet<String>,
    /// Non-whitelisted DLL names imported by each processed file, keyed by file name
    pub imports: MultiMap<String, String>,
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    results: &'a BTreeSet<String>,
    processed: &'a BTreeSet<String>,
    imports: BTreeMap<&'a str, &'a [String]>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(String::as_str)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let doc = ReportDocument {
            results: &self.results,
            processed: &self.processed,
            imports: self
                .imports
                .iter_all()
                .map(|(k, v)| (k.as_str(), v.as_slice()))
                .collect(),
        };
        serde_json::to_string_pretty(&doc)
    }
}
