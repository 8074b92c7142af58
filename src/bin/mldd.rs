extern crate mingw_deps;

use anyhow::Context;
use clap::Parser;
use fs_err as fs;
use mingw_deps::{lookup, path_to_string, LookupQuery, Whitelist};
use std::io::Write;
use std::path::PathBuf;

/// ldd for cross-compiled Windows binaries: list the DLLs a PE file needs, minus the system ones
#[derive(Parser, Debug)]
#[command(name = "mldd", version, about)]
struct Args {
    /// Target files (.exe or .dll); glob patterns are expanded
    #[arg(required = true, value_name = "FILE")]
    files: Vec<String>,

    /// Resolve the DLL names to files using the search path
    #[arg(short, long)]
    resolve: bool,

    /// List the dependencies transitively (implies --resolve)
    #[arg(short, long)]
    transitive: bool,

    /// Same as --transitive --include-main
    #[arg(short, long)]
    all: bool,

    /// Include the target files in the output
    #[arg(long)]
    include_main: bool,

    /// Add a directory to the search path (replaces the default MinGW sysroot)
    #[arg(short, long = "path", value_name = "DIR")]
    path: Vec<PathBuf>,

    /// Never search the MinGW sysroot matching the target's bitness
    #[arg(long)]
    no_default_path: bool,

    /// Add the entries of the PATH environment variable to the search path
    #[arg(long)]
    env_path: bool,

    /// Add the current working directory to the search path
    #[arg(long)]
    cwd: bool,

    /// Whitelist a DLL name (replaces the default whitelist unless --keep-default-wlist)
    #[arg(short, long = "wlist", value_name = "NAME")]
    wlist: Vec<String>,

    /// Add the --wlist entries to the default whitelist instead of replacing it
    #[arg(long)]
    keep_default_wlist: bool,

    /// Start from an empty whitelist
    #[arg(long, conflicts_with = "keep_default_wlist")]
    clear_wlist: bool,

    /// Skip unresolved DLLs and unreadable files instead of failing
    #[arg(short, long)]
    ignore_errors: bool,

    /// Path for output in JSON format
    #[arg(short = 'j', long, value_name = "OUTPUT_JSON_PATH")]
    output_json_path: Option<PathBuf>,

    /// Verbosity level (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn whitelist(&self) -> Whitelist {
        let mut whitelist = if self.clear_wlist || (!self.wlist.is_empty() && !self.keep_default_wlist)
        {
            Whitelist::empty()
        } else {
            Whitelist::default()
        };
        for name in &self.wlist {
            whitelist.insert(name);
        }
        whitelist
    }

    fn query(&self) -> anyhow::Result<LookupQuery> {
        let mut query = LookupQuery::new(expand_inputs(&self.files)?);

        query.parameters.transitive = self.transitive || self.all;
        query.parameters.resolve = self.resolve || query.parameters.transitive;
        query.parameters.include_originals = self.include_main || self.all;
        query.parameters.ignore_errors = self.ignore_errors;

        query.search_path.user_path = self.path.clone();
        query.search_path.use_default_path = !self.no_default_path;
        if self.cwd {
            query.search_path.working_dir = Some(std::env::current_dir()?);
        }
        if self.env_path {
            query.search_path.add_env_path();
        }
        query.whitelist = self.whitelist();
        Ok(query)
    }
}

fn log_level(verbosity: u8) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

fn init_logger(verbosity: u8) {
    env_logger::Builder::new()
        .filter_level(log_level(verbosity))
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .init();
}

fn is_pattern(s: &str) -> bool {
    s.contains(&['*', '?', '['][..])
}

// a pattern matching nothing may still be a literal file name, like `app[1].exe`
fn expand_inputs(inputs: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let literal = PathBuf::from(input);
        if !is_pattern(input) {
            files.push(literal);
            continue;
        }
        let matches = match glob::glob(input) {
            Ok(paths) => paths.collect::<Result<Vec<_>, _>>()?,
            Err(_) if literal.exists() => Vec::new(),
            Err(e) => return Err(e).with_context(|| format!("invalid pattern `{}`", input)),
        };
        if !matches.is_empty() {
            files.extend(matches);
        } else if literal.exists() {
            files.push(literal);
        } else {
            anyhow::bail!("pattern `{}` did not match any file", input);
        }
    }
    Ok(files)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let query = args.query()?;

    if query.parameters.resolve {
        if !query.search_path.user_path.is_empty() {
            log::info!("User path: {:?}", query.search_path.user_path);
        } else if query.search_path.use_default_path {
            log::info!(
                "User path not specified, using the MinGW sysroots {} (64-bit) and {} (32-bit)",
                path_to_string(&query.search_path.default_path_64),
                path_to_string(&query.search_path.default_path_32)
            );
        }
        if let Some(wd) = &query.search_path.working_dir {
            log::info!("Working directory: {}", path_to_string(wd));
        }
        if !query.search_path.system_path.is_empty() {
            log::info!("PATH entries: {:?}", query.search_path.system_path);
        }
    }

    let report = lookup(&query)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for line in report.lines() {
        writeln!(out, "{}", line)?;
    }
    out.flush()?;

    if let Some(json_output_path) = &args.output_json_path {
        let js = report.to_json().context("Error serializing")?;
        fs::write(json_output_path, js)
            .with_context(|| format!("couldn't write to {}", json_output_path.display()))?;
        log::info!("successfully wrote to {}", json_output_path.display());
    }

    Ok(())
}
