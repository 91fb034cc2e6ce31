//! Premium user allow-list
//!
//! Plain text files with one user name per line; `#` starts a comment.
//! Directories contribute every file they contain.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

fn parse_names(content: &str) -> impl Iterator<Item = String> + '_ {
    content.lines().filter_map(|line| {
        let name = line.split('#').next().unwrap_or_default().trim();
        (!name.is_empty()).then(|| name.to_lowercase())
    })
}

fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect(),
        Err(e) => {
            log::error!("❌ Cannot read premium user dir <{}>: {}", dir.display(), e);
            Vec::new()
        }
    };
    files.sort();
    files
}

/// Lower-cased names from all given directories and files
pub fn load_premium_users<D, F>(dirs: &[D], files: &[F]) -> HashSet<String>
where
    D: AsRef<Path>,
    F: AsRef<Path>,
{
    let mut paths: Vec<PathBuf> = dirs.iter().flat_map(|dir| files_in(dir.as_ref())).collect();
    paths.extend(files.iter().map(|f| f.as_ref().to_path_buf()));

    let mut users = HashSet::new();
    for path in paths {
        match fs::read_to_string(&path) {
            Ok(content) => users.extend(parse_names(&content)),
            Err(e) => log::error!("❌ Cannot read premium users <{}>: {}", path.display(), e),
        }
    }

    if !users.is_empty() {
        log::info!("👑 Loaded {} premium user(s)", users.len());
    }
    users
}
