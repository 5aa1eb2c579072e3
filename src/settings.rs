use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const SIGMAFOX_FILE_EXTENSION: &str = "fox";
pub const PROJECT_FILE_NAME: &str = "sigmafox.toml";
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

pub const DEFAULT_OUTPUT_NAME: &str = "main";
pub const DEFAULT_TAB_SIZE: u32 = 4;

// Rough allocation guesses so the hot vecs don't reallocate constantly on
// ordinary module sizes. Tuned against the sample programs, not science.
pub const SRC_TO_TOKEN_RATIO: usize = 6;
pub const TOKEN_TO_NODE_RATIO: usize = 4;
pub const MINIMUM_STRING_TABLE_CAPACITY: usize = 64;

/// Resolved per-compilation configuration. The CLI (or a test harness)
/// fills this in; `sigmafox.toml` next to the entry file supplies defaults
/// for anything the command line leaves unset.
#[derive(Debug, Clone)]
pub struct Config {
    pub entry_path: PathBuf,
    pub output_name: String,
    pub output_directory: PathBuf,
    pub tab_size: u32,
    pub compile: bool,
    pub strip_comments: bool,
    pub warnings_as_errors: bool,
    pub memory_limit: Option<u64>,
    pub string_pool_limit: Option<u64>,
}

impl Config {
    pub fn new(entry_path: PathBuf) -> Self {
        Config {
            entry_path,
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            output_directory: PathBuf::from("./"),
            tab_size: DEFAULT_TAB_SIZE,
            compile: false,
            strip_comments: false,
            warnings_as_errors: false,
            memory_limit: None,
            string_pool_limit: None,
        }
    }

    /// Merge defaults from a `sigmafox.toml` sitting next to the entry
    /// file. Only fields the caller has not already overridden are taken,
    /// so explicit CLI options always win.
    pub fn apply_project_file(&mut self, overridden: &ConfigOverrides) {
        let Some(dir) = self.entry_path.parent() else {
            return;
        };

        let project_path = dir.join(PROJECT_FILE_NAME);
        let Ok(raw) = fs::read_to_string(&project_path) else {
            return;
        };

        let parsed: ProjectFile = match toml::from_str(&raw) {
            Ok(parsed) => parsed,
            Err(_) => return,
        };

        if !overridden.output_name
            && let Some(name) = parsed.output_name
        {
            self.output_name = name;
        }

        if !overridden.output_directory
            && let Some(directory) = parsed.output_directory
        {
            self.output_directory = PathBuf::from(directory);
        }

        if let Some(tab_size) = parsed.tab_size {
            self.tab_size = tab_size;
        }

        if let Some(warnings_as_errors) = parsed.warnings_as_errors {
            self.warnings_as_errors = warnings_as_errors;
        }
    }
}

/// Which config fields the command line set explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigOverrides {
    pub output_name: bool,
    pub output_directory: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProjectFile {
    pub output_name: Option<String>,
    pub output_directory: Option<String>,
    pub tab_size: Option<u32>,
    pub warnings_as_errors: Option<bool>,
}

/// Parse a human byte size: a bare count or a `KB`/`MB`/`GB` suffix
/// (case-insensitive, powers of 1024).
pub fn parse_byte_size(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    let upper = trimmed.to_ascii_uppercase();

    let (digits, multiplier) = if let Some(stripped) = upper.strip_suffix("KB") {
        (stripped, 1024u64)
    } else if let Some(stripped) = upper.strip_suffix("MB") {
        (stripped, 1024u64 * 1024)
    } else if let Some(stripped) = upper.strip_suffix("GB") {
        (stripped, 1024u64 * 1024 * 1024)
    } else {
        (upper.as_str(), 1u64)
    };

    let count: u64 = digits.trim().parse().ok()?;
    count.checked_mul(multiplier)
}

pub fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case(SIGMAFOX_FILE_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_sizes_accept_suffixes() {
        assert_eq!(parse_byte_size("512"), Some(512));
        assert_eq!(parse_byte_size("4KB"), Some(4 * 1024));
        assert_eq!(parse_byte_size("4kb"), Some(4 * 1024));
        assert_eq!(parse_byte_size("2MB"), Some(2 * 1024 * 1024));
        assert_eq!(parse_byte_size("1GB"), Some(1024 * 1024 * 1024));
        assert_eq!(parse_byte_size("ten"), None);
    }

    #[test]
    fn source_extension_is_case_insensitive() {
        assert!(has_source_extension(Path::new("main.fox")));
        assert!(has_source_extension(Path::new("MAIN.FOX")));
        assert!(!has_source_extension(Path::new("main.cpp")));
    }
}
