//! End-to-end transpilation scenarios: real files in, C++ files and a
//! manifest out.

use sigmafox::compiler::compiler_messages::compiler_errors::DiagnosticCode;
use sigmafox::{compile, CompilationResult, Config};
use std::fs;
use std::path::{Path, PathBuf};

fn write_source(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn compile_entry(entry: &Path, output: &Path) -> CompilationResult {
    let mut config = Config::new(entry.to_path_buf());
    config.output_directory = output.to_path_buf();
    compile(config)
}

fn read_output(output: &Path, name: &str) -> String {
    fs::read_to_string(output.join(name)).unwrap()
}

#[test]
fn trivial_program_prints_inline_values() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let entry = write_source(dir.path(), "main.fox", "begin ; write 1 2 3; end;");

    let result = compile_entry(&entry, &out);
    assert!(result.success, "{:?}", result.messages.errors);

    let main_cpp = read_output(&out, "main.cpp");
    assert!(main_cpp.contains("#include <iostream>"));
    assert!(main_cpp.contains("#include <complex>"));
    assert!(main_cpp.contains("main(int argc, char **argv)"));
    assert!(main_cpp.contains("std::cout << 1 << 2 << 3;"));
    assert!(main_cpp.contains("return 0;"));

    let manifest = read_output(&out, "manifest.json");
    assert!(manifest.contains("main.cpp"));
    assert!(manifest.contains("\"role\": \"main\""));
}

#[test]
fn cyclic_includes_produce_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let entry = write_source(dir.path(), "a.fox", "include 'b.fox';\nbegin;\nend;\n");
    write_source(dir.path(), "b.fox", "include 'a.fox';\n");

    let result = compile_entry(&entry, &out);
    assert!(!result.success);
    assert!(result
        .messages
        .errors
        .iter()
        .any(|error| error.code == DiagnosticCode::CyclicInclude));
    assert!(result.outputs.is_empty());
    assert!(!out.join("main.cpp").exists());
}

#[test]
fn mixed_arithmetic_promotes_to_real() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let entry = write_source(
        dir.path(),
        "main.fox",
        "begin;\nvariable x 8;\nx := 1 + 2.5;\nwrite 6 x;\nend;\n",
    );

    let result = compile_entry(&entry, &out);
    assert!(result.success, "{:?}", result.messages.errors);

    let main_cpp = read_output(&out, "main.cpp");
    assert!(main_cpp.contains("double x;"));
    assert!(main_cpp.contains("x = 1 + 2.5;"));
}

#[test]
fn counted_loops_save_and_restore_the_iterator() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let entry = write_source(
        dir.path(),
        "main.fox",
        "begin;\nloop i 0 10 1;\nwrite 6 i;\nendloop;\nend;\n",
    );

    let result = compile_entry(&entry, &out);
    assert!(result.success, "{:?}", result.messages.errors);

    let main_cpp = read_output(&out, "main.cpp");
    assert!(main_cpp.contains("for (int64_t i = 0; i < 10; i += 1)"));
    assert!(main_cpp.contains("int64_t i_save = i;"));
    assert!(main_cpp.contains("<< i;"));
    assert!(main_cpp.contains("i = i_save;"));
}

#[test]
fn undeclared_identifiers_stop_the_build() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let entry = write_source(dir.path(), "main.fox", "begin; write 6 q; end;");

    let result = compile_entry(&entry, &out);
    assert!(!result.success);
    assert_eq!(result.messages.errors.len(), 1);

    let error = &result.messages.errors[0];
    assert_eq!(error.code, DiagnosticCode::UndeclaredIdentifier);
    assert_eq!(error.location.row, 1);
    assert_eq!(error.location.column, 16);
    assert!(!out.join("main.cpp").exists());
}

#[test]
fn recursive_functions_are_diagnosed_and_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let entry = write_source(
        dir.path(),
        "main.fox",
        "function f a;\nf := f(a);\nendfunction;\nbegin;\nvariable x 8 := f(1);\nend;\n",
    );

    let result = compile_entry(&entry, &out);
    assert!(!result.success);

    let recursion_count = result
        .messages
        .errors
        .iter()
        .filter(|error| error.code == DiagnosticCode::DirectRecursion)
        .count();
    assert_eq!(recursion_count, 1);
}

#[test]
fn included_module_becomes_a_guarded_header() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    write_source(
        dir.path(),
        "math.fox",
        "function square a;\nsquare := a * a;\nendfunction;\n",
    );
    let entry = write_source(
        dir.path(),
        "main.fox",
        "include 'math.fox';\nbegin;\nvariable x 8 := square(2);\nwrite 6 x;\nend;\n",
    );

    let result = compile_entry(&entry, &out);
    assert!(result.success, "{:?}", result.messages.errors);

    let header = read_output(&out, "math.hpp");
    assert!(header.contains("#ifndef SIGMAFOX_MODULE_"));
    assert!(header.contains("#define SIGMAFOX_MODULE_"));
    assert!(header.contains("#endif"));
    assert!(header.contains("square(int64_t a)"));
    assert!(header.contains("square_result"));
    assert!(header.contains("return square_result;"));

    let main_cpp = read_output(&out, "main.cpp");
    assert!(main_cpp.contains("#include \"math.hpp\""));
    assert!(main_cpp.contains("int64_t x = square(2);"));

    let manifest = read_output(&out, "manifest.json");
    assert!(manifest.contains("math.hpp"));
    assert!(manifest.contains("\"role\": \"module\""));
}

#[test]
fn include_guards_are_stable_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    write_source(dir.path(), "math.fox", "function id a;\nid := a;\nendfunction;\n");
    let entry = write_source(
        dir.path(),
        "main.fox",
        "include 'math.fox';\nbegin;\nend;\n",
    );

    let out_one = dir.path().join("one");
    let out_two = dir.path().join("two");
    assert!(compile_entry(&entry, &out_one).success);
    assert!(compile_entry(&entry, &out_two).success);

    let guard_line = |text: &str| {
        text.lines()
            .find(|line| line.starts_with("#ifndef SIGMAFOX_MODULE_"))
            .unwrap()
            .to_string()
    };
    assert_eq!(
        guard_line(&read_output(&out_one, "math.hpp")),
        guard_line(&read_output(&out_two, "math.hpp"))
    );
}

#[test]
fn duplicate_includes_warn_but_compile() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    write_source(dir.path(), "util.fox", "procedure noop;\nendprocedure;\n");
    let entry = write_source(
        dir.path(),
        "main.fox",
        "include 'util.fox';\ninclude 'util.fox';\nbegin;\nnoop();\nend;\n",
    );

    let result = compile_entry(&entry, &out);
    assert!(result.success, "{:?}", result.messages.errors);
    assert_eq!(result.messages.warnings.len(), 1);

    // Only one header and only one include directive despite two includes.
    let main_cpp = read_output(&out, "main.cpp");
    assert_eq!(main_cpp.matches("#include \"util.hpp\"").count(), 1);
}

#[test]
fn warnings_as_errors_blocks_generation() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    write_source(dir.path(), "util.fox", "procedure noop;\nendprocedure;\n");
    let entry = write_source(
        dir.path(),
        "main.fox",
        "include 'util.fox';\ninclude 'util.fox';\nbegin;\nend;\n",
    );

    let mut config = Config::new(entry);
    config.output_directory = out.clone();
    config.warnings_as_errors = true;
    let result = compile(config);

    assert!(!result.success);
    assert!(result
        .messages
        .errors
        .iter()
        .any(|error| error.code == DiagnosticCode::DuplicateInclude));
    assert!(!out.join("main.cpp").exists());
}

#[test]
fn shared_inclusion_is_not_a_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    write_source(dir.path(), "shared.fox", "function twice a;\ntwice := a + a;\nendfunction;\n");
    write_source(dir.path(), "mid.fox", "include 'shared.fox';\n");
    let entry = write_source(
        dir.path(),
        "main.fox",
        "include 'mid.fox';\ninclude 'shared.fox';\nbegin;\nvariable x 8 := twice(4);\nend;\n",
    );

    let result = compile_entry(&entry, &out);
    assert!(result.success, "{:?}", result.messages.errors);
    assert!(out.join("shared.hpp").exists());
    assert!(out.join("mid.hpp").exists());
}

#[test]
fn missing_entry_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let result = compile_entry(&dir.path().join("absent.fox"), dir.path());

    assert!(!result.success);
    assert_eq!(result.messages.errors[0].code, DiagnosticCode::MissingFile);
}

#[test]
fn strings_and_complex_literals_emit_cpp_forms() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let entry = write_source(
        dir.path(),
        "main.fox",
        "begin;\nvariable z 8 := 4i;\nwrite 6 'result' z;\nend;\n",
    );

    let result = compile_entry(&entry, &out);
    assert!(result.success, "{:?}", result.messages.errors);

    let main_cpp = read_output(&out, "main.cpp");
    assert!(main_cpp.contains("std::complex<double> z = std::complex<double>(0.0, 4.0);"));
    assert!(main_cpp.contains("<< \"result\""));
}

#[test]
fn conditional_chains_emit_else_if() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let entry = write_source(
        dir.path(),
        "main.fox",
        "begin;\nvariable x 8 := 5;\nif x < 3;\nwrite 6 1;\nelseif x > 4;\nwrite 6 2;\nendif;\nend;\n",
    );

    let result = compile_entry(&entry, &out);
    assert!(result.success, "{:?}", result.messages.errors);

    let main_cpp = read_output(&out, "main.cpp");
    assert!(main_cpp.contains("if (x < 3)"));
    assert!(main_cpp.contains("else if (x > 4)"));
}

#[test]
fn arrays_emit_nested_vectors_and_indexing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let entry = write_source(
        dir.path(),
        "main.fox",
        "begin;\nvariable grid 8 3 4;\ngrid(1, 2) := 2.5;\nwrite 6 grid(1, 2);\nend;\n",
    );

    let result = compile_entry(&entry, &out);
    assert!(result.success, "{:?}", result.messages.errors);

    let main_cpp = read_output(&out, "main.cpp");
    assert!(main_cpp.contains("std::vector<std::vector<double>> grid(3, std::vector<double>(4));"));
    assert!(main_cpp.contains("grid[1][2] = 2.5;"));
}

#[test]
fn magnitude_emits_std_pow() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let entry = write_source(
        dir.path(),
        "main.fox",
        "begin;\nvariable x 8 := 2 ^ 10;\nwrite 6 x;\nend;\n",
    );

    let result = compile_entry(&entry, &out);
    assert!(result.success, "{:?}", result.messages.errors);
    assert!(read_output(&out, "main.cpp").contains("std::pow(2, 10)"));
}
