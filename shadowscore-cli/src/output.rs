//! Writing command results to a file or stdout.

use eyre::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Write `contents` to `path`, or to stdout when no path is given.
pub fn emit(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => {
            tracing::info!(path = ?path.display(), "write json file");
            std::fs::write(path, contents)
                .wrap_err_with(|| format!("failed to write output: {:?}", path.display()))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{contents}").wrap_err("failed to write to stdout")
        }
    }
}
