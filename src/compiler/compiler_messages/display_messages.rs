use crate::compiler::compiler_messages::compiler_errors::{
    CompilerError, CompilerMessages, ErrorMetaDataKey,
};
use crate::compiler::compiler_messages::compiler_warnings::CompilerWarning;
use saying::say;
use std::path::{Path, PathBuf};
use std::{env, fs};

fn relative_display_path(path: &Path) -> String {
    match env::current_dir() {
        Ok(dir) => path
            .strip_prefix(&dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string(),
        Err(_) => path.to_string_lossy().to_string(),
    }
}

/// Pull the offending line out of the source file for context. Missing or
/// unreadable files just drop the snippet.
fn source_line(path: &PathBuf, row: u32) -> Option<String> {
    if row == 0 {
        return None;
    }

    let file = fs::read_to_string(path).ok()?;
    file.lines().nth(row as usize - 1).map(|line| line.to_string())
}

pub fn print_compiler_messages(messages: &CompilerMessages) {
    for warning in &messages.warnings {
        print_formatted_warning(warning);
    }

    for error in &messages.errors {
        print_formatted_error(error);
    }
}

pub fn print_formatted_error(e: &CompilerError) {
    let relative_path = relative_display_path(&e.location.path);

    say!(Red Bold "\n", e.error_type.heading(), Red " [", e.code.as_str(), "]");
    say!(
        "  --> ",
        relative_path,
        ":",
        e.location.row.to_string(),
        ":",
        e.location.column.to_string()
    );
    say!("  ", e.msg);

    if let Some(line) = source_line(&e.location.path, e.location.row) {
        say!(Bright Black "  | ", line);
    }

    if let Some(suggestion) = e.metadata.get(&ErrorMetaDataKey::PrimarySuggestion) {
        say!(Cyan "  help: ", *suggestion);
    }
}

pub fn print_formatted_warning(w: &CompilerWarning) {
    let relative_path = relative_display_path(&w.location.path);

    say!(Yellow Bold "\nWarning", Yellow " [", w.kind.code().as_str(), "]");
    say!(
        "  --> ",
        relative_path,
        ":",
        w.location.row.to_string(),
        ":",
        w.location.column.to_string()
    );
    say!("  ", w.msg);
}
