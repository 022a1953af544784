//! Built-in entity types.
//!
//! Each type is both the [`EntityDiscovery`](crate::analyzer::EntityDiscovery)
//! for its entities and their [`UsageSource`](crate::entity::UsageSource):
//!
//! | type     | discovered from                        | example name     |
//! |----------|----------------------------------------|------------------|
//! | `Routes` | `->name('x')` / `'as' => 'x'` in routes | `users.show`     |
//! | `Views`  | template files under the views dir     | `emails.welcome` |
//! | `Assets` | static files under the public dir      | `css/app.css`    |
//!
//! Discovery is regex and filesystem glue; the needles are what matter.

pub mod assets;
pub mod routes;
pub mod views;

pub use assets::Assets;
pub use routes::Routes;
pub use views::Views;

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{JanitorError, JanitorResult};

/// Files under `dir` whose name ends with one of `suffixes`, name-sorted.
///
/// A missing directory yields no files.
pub(crate) fn files_with_suffix(dir: &Path, suffixes: &[&str]) -> JanitorResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            JanitorError::io(
                path,
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop")),
            )
        })?;
        let name = entry.file_name().to_string_lossy();
        if entry.file_type().is_file() && suffixes.iter().any(|s| name.ends_with(s)) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Regex fragment matching `text` inside single or double quotes.
pub(crate) fn quoted(text: &str) -> String {
    format!(r#"['"]{}['"]"#, regex::escape(text))
}
