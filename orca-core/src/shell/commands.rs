//! The set of executable names reachable through `PATH`.
//!
//! The parser consults it to decide whether a leading identifier starts a
//! shell command.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::trace;

/// Names of external commands
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSet {
    names: HashSet<String>,
}

static PROCESS_COMMANDS: OnceLock<CommandSet> = OnceLock::new();

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.is_file() && metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(metadata: &fs::Metadata) -> bool {
    metadata.is_file()
}

impl CommandSet {
    /// A set that recognizes nothing; every command must then be found by
    /// the parser's fallback
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSet {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Scan every directory of a `PATH`-style list for executable files
    pub fn scan(path_var: &str) -> Self {
        let mut set = CommandSet::empty();
        for dir in std::env::split_paths(path_var) {
            set.add_dir(&dir);
        }
        trace!(count = set.len(), "scanned PATH for commands");
        set
    }

    /// The process-wide set, scanned from `$PATH` on first use
    pub fn from_env() -> &'static CommandSet {
        PROCESS_COMMANDS.get_or_init(|| match std::env::var("PATH") {
            Ok(path) => CommandSet::scan(&path),
            Err(_) => CommandSet::empty(),
        })
    }

    fn add_dir(&mut self, dir: &Path) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return,
        };

        for entry in entries.flatten() {
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            // follows symlinks
            let executable = fs::metadata(entry.path())
                .map(|metadata| is_executable(&metadata))
                .unwrap_or(false);
            if executable {
                self.names.insert(name);
            }
        }
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_names() {
        let set = CommandSet::from_names(["ls", "cat"]);
        assert!(set.contains("ls"));
        assert!(!set.contains("grep"));
        assert_eq!(set.len(), 2);
        assert!(CommandSet::empty().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_finds_only_executables() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("mytool");
        let notes = dir.path().join("notes.txt");
        fs::write(&tool, "#!/bin/sh\n").unwrap();
        fs::write(&notes, "hello").unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        fs::set_permissions(&notes, fs::Permissions::from_mode(0o644)).unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();

        let set = CommandSet::scan(dir.path().to_str().unwrap());
        assert!(set.contains("mytool"));
        assert!(!set.contains("notes.txt"));
        assert!(!set.contains("subdir"));
    }

    #[test]
    fn test_scan_ignores_missing_directories() {
        let set = CommandSet::scan("/definitely/not/a/real/dir");
        assert!(set.is_empty());
    }
}
