use saying::say;
use sigmafox::cli::{parse_arguments, print_help, CliCommand};
use sigmafox::compiler::compiler_messages::compiler_errors::{
    CompilerMessages, DiagnosticCode, ErrorType,
};
use sigmafox::compiler::compiler_messages::display_messages::{
    print_compiler_messages, print_formatted_error,
};
use std::env;
use std::process::ExitCode;

// Exit codes: 0 success, then argument error, missing entry file,
// scan/parse error, semantic error, I/O error.
const EXIT_ARGUMENT: u8 = 1;
const EXIT_MISSING_FILE: u8 = 2;
const EXIT_PARSE: u8 = 3;
const EXIT_SEMANTIC: u8 = 4;
const EXIT_IO: u8 = 5;

fn main() -> ExitCode {
    let arguments: Vec<String> = env::args().skip(1).collect();

    if arguments.is_empty() {
        print_help();
        return ExitCode::from(EXIT_ARGUMENT);
    }

    let config = match parse_arguments(&arguments) {
        Ok(CliCommand::Help) => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Ok(CliCommand::Compile(config)) => config,
        Err(error) => {
            print_formatted_error(&error);
            print_help();
            return ExitCode::from(EXIT_ARGUMENT);
        }
    };

    let result = sigmafox::compile(*config);
    print_compiler_messages(&result.messages);

    if result.success {
        for output in &result.outputs {
            say!(Green "Emitted: ", output.display().to_string());
        }
        return ExitCode::SUCCESS;
    }

    ExitCode::from(exit_code_for(&result.messages))
}

fn exit_code_for(messages: &CompilerMessages) -> u8 {
    let Some(worst) = messages.worst_error_type() else {
        return EXIT_IO;
    };

    match worst {
        ErrorType::Config => EXIT_ARGUMENT,
        ErrorType::Lexical | ErrorType::Syntax => EXIT_PARSE,
        ErrorType::Semantic => EXIT_SEMANTIC,
        ErrorType::File => {
            let only_missing = messages
                .errors
                .iter()
                .filter(|error| error.error_type == ErrorType::File)
                .all(|error| error.code == DiagnosticCode::MissingFile);
            if only_missing { EXIT_MISSING_FILE } else { EXIT_IO }
        }
        ErrorType::Internal => EXIT_IO,
    }
}
