//! List the DLLs a Windows executable or DLL depends on, optionally resolving them to files
//! through a search path and following them transitively.
//!
//! Well-known system DLLs are ignored via a whitelist, so what is left is what must be shipped
//! next to a cross-compiled artifact.

extern crate thiserror;

mod runner;

pub mod common;
pub mod image;
pub mod lookup_path;
pub mod pe;
pub mod query;
pub mod report;
pub mod system;

#[cfg(test)]
mod testing;

pub use common::{path_to_string, LookupError};
pub use lookup_path::{LookupPath, LookupPathEntry};
pub use query::{LookupParameters, LookupQuery, LookupTarget, SearchPathSettings, Whitelist};
pub use report::Report;
pub use system::DirectoryIndex;

pub fn lookup(query: &LookupQuery) -> Result<Report, LookupError> {
    runner::run(query)
}
