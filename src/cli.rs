use crate::compiler::compiler_messages::compiler_errors::{
    CompilerError, DiagnosticCode, ErrorLocation, ErrorType,
};
use crate::settings::{parse_byte_size, Config, ConfigOverrides};
use saying::say;
use std::path::PathBuf;

/// What the command line asked for.
#[derive(Debug)]
pub enum CliCommand {
    Compile(Box<Config>),
    Help,
}

/// Parse everything after the program name. Grammar: switches (`-c`,
/// `-t`, `-h`, `--warnings-as-errors`), named options with a value, and
/// exactly one positional entry path.
pub fn parse_arguments(arguments: &[String]) -> Result<CliCommand, CompilerError> {
    let mut entry_path: Option<PathBuf> = None;
    let mut output_name: Option<String> = None;
    let mut output_directory: Option<PathBuf> = None;
    let mut memory_limit: Option<u64> = None;
    let mut string_pool_limit: Option<u64> = None;
    let mut compile = false;
    let mut strip_comments = false;
    let mut warnings_as_errors = false;

    let mut index = 0;
    while index < arguments.len() {
        let argument = arguments[index].as_str();
        match argument {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "-c" => compile = true,
            "-t" => strip_comments = true,
            "--warnings-as-errors" => warnings_as_errors = true,

            "--output-name" => {
                output_name = Some(named_value(arguments, &mut index, argument)?);
            }
            "--output-directory" => {
                output_directory = Some(PathBuf::from(named_value(arguments, &mut index, argument)?));
            }
            "--memory-limit" => {
                memory_limit = Some(size_value(arguments, &mut index, argument)?);
            }
            "--string-pool-limit" => {
                string_pool_limit = Some(size_value(arguments, &mut index, argument)?);
            }

            _ if argument.starts_with('-') => {
                return Err(argument_error(format!("Unknown option '{argument}'")));
            }

            _ => {
                if entry_path.is_some() {
                    return Err(argument_error(format!(
                        "Unexpected extra positional argument '{argument}'"
                    )));
                }
                entry_path = Some(PathBuf::from(argument));
            }
        }
        index += 1;
    }

    let Some(entry_path) = entry_path else {
        return Err(argument_error("No entry source file was given"));
    };

    let mut config = Config::new(entry_path);
    let mut overridden = ConfigOverrides::default();
    if let Some(output_name) = output_name {
        config.output_name = output_name;
        overridden.output_name = true;
    }
    if let Some(output_directory) = output_directory {
        config.output_directory = output_directory;
        overridden.output_directory = true;
    }
    config.compile = compile;
    config.strip_comments = strip_comments;
    config.warnings_as_errors = warnings_as_errors;
    config.memory_limit = memory_limit;
    config.string_pool_limit = string_pool_limit;
    config.apply_project_file(&overridden);

    Ok(CliCommand::Compile(Box::new(config)))
}

fn named_value(
    arguments: &[String],
    index: &mut usize,
    option: &str,
) -> Result<String, CompilerError> {
    *index += 1;
    arguments
        .get(*index)
        .map(|value| value.to_string())
        .ok_or_else(|| argument_error(format!("Option '{option}' expects a value")))
}

fn size_value(arguments: &[String], index: &mut usize, option: &str) -> Result<u64, CompilerError> {
    let raw = named_value(arguments, index, option)?;
    parse_byte_size(&raw).ok_or_else(|| {
        argument_error(format!(
            "Option '{option}' expects a byte size such as 512, 64KB, 8MB or 1GB, found '{raw}'"
        ))
    })
}

fn argument_error(msg: impl Into<String>) -> CompilerError {
    CompilerError::new(
        DiagnosticCode::Internal,
        msg,
        ErrorLocation::default(),
        ErrorType::Config,
    )
}

pub fn print_help() {
    say!(Green Bold "The SigmaFox transpiler");
    say!("Usage: sigmafox <entry file> [options]");
    say!(Green Bold "\nSwitches:");
    say!("  -c                        Also compile the generated sources");
    say!("  -t                        Strip comments");
    say!("  -h                        Show this help text");
    say!("  --warnings-as-errors      Promote warnings to errors");
    say!(Green Bold "\nOptions:");
    say!("  --output-name <name>      Name of the emitted main file (default: main)");
    say!("  --output-directory <dir>  Where generated files land (default: ./)");
    say!("  --memory-limit <size>     Cap on loaded source bytes (KB/MB/GB suffixes)");
    say!("  --string-pool-limit <size> String interner budget (KB/MB/GB suffixes)");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn positional_and_defaults() {
        let CliCommand::Compile(config) = parse_arguments(&args(&["main.fox"])).unwrap() else {
            panic!("expected a compile command");
        };
        assert_eq!(config.entry_path, PathBuf::from("main.fox"));
        assert_eq!(config.output_name, "main");
        assert!(!config.compile);
        assert!(config.memory_limit.is_none());
    }

    #[test]
    fn switches_and_options() {
        let CliCommand::Compile(config) = parse_arguments(&args(&[
            "-c",
            "prog.fox",
            "-t",
            "--output-name",
            "solver",
            "--output-directory",
            "build",
            "--memory-limit",
            "8MB",
            "--string-pool-limit",
            "64KB",
        ]))
        .unwrap() else {
            panic!("expected a compile command");
        };

        assert!(config.compile);
        assert!(config.strip_comments);
        assert_eq!(config.output_name, "solver");
        assert_eq!(config.output_directory, PathBuf::from("build"));
        assert_eq!(config.memory_limit, Some(8 * 1024 * 1024));
        assert_eq!(config.string_pool_limit, Some(64 * 1024));
    }

    #[test]
    fn help_wins() {
        assert!(matches!(
            parse_arguments(&args(&["-h"])).unwrap(),
            CliCommand::Help
        ));
    }

    #[test]
    fn bad_arguments_are_config_errors() {
        assert!(parse_arguments(&args(&[])).is_err());
        assert!(parse_arguments(&args(&["a.fox", "b.fox"])).is_err());
        assert!(parse_arguments(&args(&["--output-name"])).is_err());
        assert!(parse_arguments(&args(&["--memory-limit", "lots", "a.fox"])).is_err());
        assert!(parse_arguments(&args(&["--frobnicate", "a.fox"])).is_err());
    }
}
