use crate::compiler::ast::{
    accept, ComparisonOp, EqualityOp, FactorOp, Literal, NodeId, NodeKind, SyntaxNode, SyntaxTree,
    SyntaxVisitor, TermOp,
};
use crate::compiler::codegen::manifest::{BuildManifest, ManifestRole};
use crate::compiler::codegen::source_file::GeneratedFile;
use crate::compiler::compiler_messages::compiler_errors::{
    CompilerError, DiagnosticCode, ErrorLocation, ErrorType,
};
use crate::compiler::datatypes::{DataKind, StructureKind};
use crate::compiler::string_interning::StringId;
use crate::compiler::symbols::fnv1a_32;
use crate::compiler::CompilationContext;
use crate::settings::MANIFEST_FILE_NAME;
use crate::{codegen_log, return_internal_error};
use std::fs;
use std::path::{Path, PathBuf};

/// One emitted file paired with the module it came from.
pub struct GeneratedOutput {
    pub module: PathBuf,
    pub file: GeneratedFile,
    pub role: ManifestRole,
}

/// Walk the dependency graph in reverse post-order (leaves first) and
/// produce one header per included module plus the main translation unit.
pub fn generate(ctx: &CompilationContext) -> Result<Vec<GeneratedOutput>, CompilerError> {
    let Some(entry_path) = ctx.graph.entry_path().map(Path::to_path_buf) else {
        return_internal_error!(
            "Generation was requested without an entry module",
            ErrorLocation::default(),
        )
    };
    let entry_dir = entry_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let tab_size = ctx.config.tab_size as usize;

    let mut outputs: Vec<GeneratedOutput> = Vec::new();

    for module_path in ctx.graph.deps_recursive(&entry_path) {
        let source = ctx
            .graph
            .source_for(&module_path)
            .expect("graph nodes always carry a source handle");
        let module = &ctx.modules[&source];
        let rel = output_relative(&entry_dir, &module_path).with_extension("hpp");
        codegen_log!("Generating module: ", rel.display().to_string());

        let mut file = GeneratedFile::new(rel.clone(), tab_size);
        emit_module_head(ctx, &mut file, &module.tree, &module_path, &rel, &entry_dir);

        file.push_region_as_foot();
        file.insert_blank_line();
        file.insert_line("#endif");
        file.pop_region();

        file.push_region_as_body();
        let mut generator = CppGenerator::new(ctx, file);
        if let Some(root) = module.tree.root {
            accept(&module.tree, root, &mut generator);
        }
        let mut file = generator.into_file();
        file.pop_region();

        outputs.push(GeneratedOutput {
            module: module_path,
            file,
            role: ManifestRole::Module,
        });
    }

    // The entry module becomes <output-name>.cpp at the output root.
    let entry_source = ctx
        .graph
        .source_for(&entry_path)
        .expect("entry module is always registered");
    let entry_module = &ctx.modules[&entry_source];
    let rel = PathBuf::from(format!("{}.cpp", ctx.config.output_name));
    codegen_log!("Generating main: ", rel.display().to_string());

    let mut file = GeneratedFile::new(rel.clone(), tab_size);
    emit_main_head(ctx, &mut file, &entry_module.tree, &entry_path, &entry_dir);

    file.push_region_as_body();
    let mut generator = CppGenerator::new(ctx, file);
    if let Some(root) = entry_module.tree.root {
        accept(&entry_module.tree, root, &mut generator);
    }
    let mut file = generator.into_file();
    file.pop_region();

    outputs.push(GeneratedOutput {
        module: entry_path,
        file,
        role: ManifestRole::Main,
    });

    Ok(outputs)
}

/// Write every generated file under the output directory, creating parent
/// directories as needed and overwriting what is there, then write the
/// build manifest beside them.
pub fn commit(
    ctx: &CompilationContext,
    outputs: Vec<GeneratedOutput>,
) -> Result<Vec<PathBuf>, CompilerError> {
    let mut manifest = BuildManifest {
        entry: ctx.config.entry_path.clone(),
        output_name: ctx.config.output_name.clone(),
        output_directory: ctx.config.output_directory.clone(),
        compile: ctx.config.compile,
        strip_comments: ctx.config.strip_comments,
        files: Vec::new(),
    };

    let mut written: Vec<PathBuf> = Vec::new();
    for output in &outputs {
        let target = ctx.config.output_directory.join(output.file.filename());
        write_output(&target, &output.file.generate())?;
        manifest.add_entry(&output.module, output.file.filename(), output.role);
        written.push(target);
    }

    let manifest_path = ctx.config.output_directory.join(MANIFEST_FILE_NAME);
    let manifest_json = manifest.to_json().map_err(|error| {
        CompilerError::new(
            DiagnosticCode::Internal,
            format!("Unable to serialize the build manifest: {error}"),
            ErrorLocation::default(),
            ErrorType::Internal,
        )
    })?;
    write_output(&manifest_path, &manifest_json)?;
    written.push(manifest_path);

    Ok(written)
}

fn write_output(target: &Path, contents: &str) -> Result<(), CompilerError> {
    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
        && let Err(error) = fs::create_dir_all(parent)
    {
        return Err(CompilerError::new(
            DiagnosticCode::UnwritableOutput,
            format!(
                "Unable to create output directory {}: {}",
                parent.display(),
                error
            ),
            ErrorLocation::new(parent.to_path_buf(), 0, 0),
            ErrorType::File,
        ));
    }

    fs::write(target, contents).map_err(|error| {
        CompilerError::new(
            DiagnosticCode::UnwritableOutput,
            format!("Unable to write {}: {}", target.display(), error),
            ErrorLocation::new(target.to_path_buf(), 0, 0),
            ErrorType::File,
        )
    })
}

/// A module's emitted path mirrors its location relative to the entry
/// file's directory; modules from elsewhere fall back to their file name.
fn output_relative(entry_dir: &Path, module_path: &Path) -> PathBuf {
    module_path
        .strip_prefix(entry_dir)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| {
            PathBuf::from(
                module_path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "module".to_string()),
            )
        })
}

/// Quoted-include path from one emitted file to another, both relative to
/// the output root.
fn relative_include(from_rel: &Path, to_rel: &Path) -> String {
    let base: Vec<_> = from_rel
        .parent()
        .map(|parent| parent.components().collect())
        .unwrap_or_default();
    let target: Vec<_> = to_rel.components().collect();

    let mut shared = 0;
    while shared < base.len() && shared < target.len() && base[shared] == target[shared] {
        shared += 1;
    }

    let mut parts: Vec<String> = vec!["..".to_string(); base.len() - shared];
    parts.extend(
        target[shared..]
            .iter()
            .map(|component| component.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

/// Stable include-guard symbol derived from the module's canonical path.
fn include_guard(module_path: &Path) -> String {
    let hash = fnv1a_32(module_path.to_string_lossy().as_bytes());
    format!("SIGMAFOX_MODULE_{hash:08X}_HPP")
}

const STD_INCLUDES: [&str; 5] = [
    "#include <iostream>",
    "#include <complex>",
    "#include <vector>",
    "#include <string>",
    "#include <cstdint>",
];

fn emit_module_head(
    ctx: &CompilationContext,
    file: &mut GeneratedFile,
    tree: &SyntaxTree,
    module_path: &Path,
    rel: &Path,
    entry_dir: &Path,
) {
    let guard = include_guard(module_path);

    file.push_region_as_head();
    file.insert_line(&format!("#ifndef {guard}"));
    file.insert_line(&format!("#define {guard}"));
    emit_std_includes(file);
    emit_helper_block(file);
    emit_dependency_includes(ctx, file, module_path, rel, entry_dir);
    emit_forward_declarations(ctx, file, tree);
    file.insert_blank_line();
    file.pop_region();
}

fn emit_main_head(
    ctx: &CompilationContext,
    file: &mut GeneratedFile,
    tree: &SyntaxTree,
    entry_path: &Path,
    entry_dir: &Path,
) {
    let rel = file.filename().to_path_buf();

    file.push_region_as_head();
    emit_std_includes(file);
    emit_helper_block(file);
    emit_dependency_includes(ctx, file, entry_path, &rel, entry_dir);
    emit_forward_declarations(ctx, file, tree);
    file.pop_region();
}

fn emit_std_includes(file: &mut GeneratedFile) {
    for include in STD_INCLUDES {
        file.insert_line(include);
    }
    file.insert_blank_line();
}

/// Small helpers the emitted code leans on for stringification and vector
/// concatenation. The heavier numeric machinery (extraction, derivation)
/// lives in the external runtime; only its prototypes appear here.
fn emit_helper_block(file: &mut GeneratedFile) {
    file.insert_line("#ifndef SIGMAFOX_RUNTIME_HELPERS");
    file.insert_line("#define SIGMAFOX_RUNTIME_HELPERS");
    file.insert_line("static inline std::string sfx_str(const std::string &value) { return value; }");
    file.insert_line("static inline std::string sfx_str(int64_t value) { return std::to_string(value); }");
    file.insert_line("static inline std::string sfx_str(double value) { return std::to_string(value); }");
    file.insert_line(
        "static inline std::string sfx_str(std::complex<double> value) \
         { return std::to_string(value.real()) + \"+\" + std::to_string(value.imag()) + \"i\"; }",
    );
    file.insert_line("template <typename T>");
    file.insert_line(
        "static inline std::vector<T> sfx_concat(std::vector<T> lhs, const std::vector<T> &rhs) \
         { lhs.insert(lhs.end(), rhs.begin(), rhs.end()); return lhs; }",
    );
    file.insert_line("template <typename T>");
    file.insert_line(
        "static inline std::vector<T> sfx_concat(T lhs, std::vector<T> rhs) \
         { rhs.insert(rhs.begin(), lhs); return rhs; }",
    );
    file.insert_line("template <typename T>");
    file.insert_line(
        "static inline std::vector<T> sfx_concat(std::vector<T> lhs, T rhs) \
         { lhs.push_back(rhs); return lhs; }",
    );
    file.insert_line("template <typename T>");
    file.insert_line(
        "static inline std::vector<T> sfx_concat(T lhs, T rhs) { return std::vector<T>{lhs, rhs}; }",
    );
    file.insert_line("template <typename T, typename U> T sfx_extract(const T &lhs, const U &rhs);");
    file.insert_line("template <typename T, typename U> T sfx_derive(const T &lhs, const U &rhs);");
    file.insert_line("#endif");
    file.insert_blank_line();
}

fn emit_dependency_includes(
    ctx: &CompilationContext,
    file: &mut GeneratedFile,
    module_path: &Path,
    rel: &Path,
    entry_dir: &Path,
) {
    let deps = ctx.graph.deps(module_path);
    for dep in &deps {
        let dep_rel = output_relative(entry_dir, dep).with_extension("hpp");
        file.insert_line(&format!(
            "#include \"{}\"",
            relative_include(rel, &dep_rel)
        ));
    }
    if !deps.is_empty() {
        file.insert_blank_line();
    }
}

fn emit_forward_declarations(ctx: &CompilationContext, file: &mut GeneratedFile, tree: &SyntaxTree) {
    let Some(root) = tree.root else {
        return;
    };
    let globals = match &tree.node(root).kind {
        NodeKind::Root { globals, .. } | NodeKind::Module { globals } => globals.clone(),
        _ => return,
    };

    let mut any = false;
    for global in globals {
        if let Some(signature) = callable_signature(ctx, tree, global) {
            file.insert_line(&format!("{signature};"));
            any = true;
        }
    }
    if any {
        file.insert_blank_line();
    }
}

fn callable_signature(
    ctx: &CompilationContext,
    tree: &SyntaxTree,
    id: NodeId,
) -> Option<String> {
    let node = tree.node(id);
    let (identifier, parameters, return_type) = match &node.kind {
        NodeKind::FunctionStatement {
            identifier,
            parameters,
            ..
        } => (identifier, parameters, cpp_value_type(node)),
        NodeKind::ProcedureStatement {
            identifier,
            parameters,
            ..
        } => (identifier, parameters, "void".to_string()),
        _ => return None,
    };

    let rendered: Vec<String> = parameters
        .iter()
        .map(|&parameter| cpp_value_type(tree.node(parameter)))
        .collect();

    Some(format!(
        "inline {} {}({})",
        return_type,
        ctx.strings.resolve(*identifier),
        rendered.join(", ")
    ))
}

fn cpp_scalar_type(kind: DataKind) -> &'static str {
    match kind {
        DataKind::Real => "double",
        DataKind::Complex => "std::complex<double>",
        DataKind::String => "std::string",
        DataKind::Void => "void",
        // COSY variables are numeric unless told otherwise.
        DataKind::Integer | DataKind::Unknown | DataKind::Error => "int64_t",
    }
}

/// The C++ type of a value with this node's stamped kind and structure.
fn cpp_value_type(node: &SyntaxNode) -> String {
    match node.structure {
        StructureKind::Vector => format!("std::vector<{}>", cpp_scalar_type(node.datatype)),
        StructureKind::String => "std::string".to_string(),
        _ => cpp_scalar_type(node.datatype).to_string(),
    }
}

fn escape_cpp_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// The C++ generation visitor. Statements open lines on the active file,
/// expressions append to the current line.
pub struct CppGenerator<'a> {
    ctx: &'a CompilationContext,
    file: GeneratedFile,

    /// Innermost-last stack of (callable identifier, result variable);
    /// reads and writes of the callable's own name become the result
    /// variable inside its body.
    callable_stack: Vec<(StringId, String)>,

    /// Nonzero while emitting inside a statement body; callables found
    /// there become lambdas instead of free functions.
    statement_depth: usize,
}

impl<'a> CppGenerator<'a> {
    pub fn new(ctx: &'a CompilationContext, file: GeneratedFile) -> CppGenerator<'a> {
        CppGenerator {
            ctx,
            file,
            callable_stack: Vec::new(),
            statement_depth: 0,
        }
    }

    pub fn into_file(self) -> GeneratedFile {
        self.file
    }

    fn emit_identifier(&mut self, identifier: StringId) {
        for (callable, result) in self.callable_stack.iter().rev() {
            if *callable == identifier {
                let result = result.clone();
                self.file.append(&result);
                return;
            }
        }
        let name = self.ctx.strings.resolve(identifier).to_string();
        self.file.append(&name);
    }

    fn emit_block(&mut self, tree: &SyntaxTree, children: &[NodeId]) {
        self.file.push_tabs();
        self.statement_depth += 1;
        for &child in children {
            accept(tree, child, self);
        }
        self.statement_depth -= 1;
        self.file.pop_tabs();
    }

    fn emit_arguments(&mut self, tree: &SyntaxTree, arguments: &[NodeId]) {
        for (index, &argument) in arguments.iter().enumerate() {
            if index > 0 {
                self.file.append(", ");
            }
            accept(tree, argument, self);
        }
    }

    fn emit_callable(&mut self, tree: &SyntaxTree, id: NodeId) {
        let node = tree.node(id);
        let (identifier, parameters, children, is_function) = match &node.kind {
            NodeKind::FunctionStatement {
                identifier,
                parameters,
                children,
            } => (*identifier, parameters.clone(), children.clone(), true),
            NodeKind::ProcedureStatement {
                identifier,
                parameters,
                children,
            } => (*identifier, parameters.clone(), children.clone(), false),
            _ => return,
        };

        let name = self.ctx.strings.resolve(identifier).to_string();
        let return_type = if is_function {
            cpp_value_type(node)
        } else {
            "void".to_string()
        };
        let rendered: Vec<String> = parameters
            .iter()
            .map(|&parameter| {
                let parameter_node = tree.node(parameter);
                let NodeKind::Parameter {
                    identifier: parameter_name,
                } = &parameter_node.kind
                else {
                    return String::new();
                };
                format!(
                    "{} {}",
                    cpp_value_type(parameter_node),
                    self.ctx.strings.resolve(*parameter_name)
                )
            })
            .collect();
        let parameter_list = rendered.join(", ");

        let nested = self.statement_depth > 0;
        self.file.insert_blank_line();
        if nested {
            // C++ has no nested functions; a capturing lambda keeps the
            // surrounding scope visible the way SigmaFox expects.
            self.file.insert_line(&format!(
                "auto {name} = [&]({parameter_list}) -> {return_type}"
            ));
        } else {
            self.file.insert_line(&format!("inline {return_type}"));
            self.file.insert_line(&format!("{name}({parameter_list})"));
        }
        self.file.insert_line("{");
        self.file.push_tabs();

        if is_function {
            self.callable_stack.push((identifier, format!("{name}_result")));
            self.file
                .insert_line(&format!("{return_type} {name}_result{{}};"));
        }

        let previous_depth = self.statement_depth;
        self.statement_depth = 1;
        for &child in &children {
            accept(tree, child, self);
        }
        self.statement_depth = previous_depth;

        if is_function {
            self.file.insert_line(&format!("return {name}_result;"));
            self.callable_stack.pop();
        }

        self.file.pop_tabs();
        if nested {
            self.file.insert_line("};");
        } else {
            self.file.insert_line("}");
        }
    }
}

impl SyntaxVisitor for CppGenerator<'_> {
    fn visit_root(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Root { globals, main } = &tree.node(id).kind else {
            return;
        };
        for &global in globals {
            accept(tree, global, self);
        }
        accept(tree, *main, self);
    }

    fn visit_module(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Module { globals } = &tree.node(id).kind else {
            return;
        };
        for &global in globals {
            accept(tree, global, self);
        }
    }

    fn visit_main(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Main { children } = &tree.node(id).kind else {
            return;
        };

        self.file.insert_blank_line();
        self.file.insert_line("int");
        self.file.insert_line("main(int argc, char **argv)");
        self.file.insert_line("{");
        self.emit_block(tree, children);
        self.file.push_tabs();
        self.file.insert_line("return 0;");
        self.file.pop_tabs();
        self.file.insert_line("}");
    }

    fn visit_include_statement(&mut self, _tree: &SyntaxTree, _id: NodeId) {
        // Include directives are part of the head region.
    }

    fn visit_function_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.emit_callable(tree, id);
    }

    fn visit_procedure_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.emit_callable(tree, id);
    }

    fn visit_expression_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::ExpressionStatement { expression } = &tree.node(id).kind else {
            return;
        };
        self.file.begin_line();
        accept(tree, *expression, self);
        self.file.append(";");
    }

    fn visit_procedure_call_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::ProcedureCallStatement {
            identifier,
            arguments,
        } = &tree.node(id).kind
        else {
            return;
        };
        let arguments = arguments.clone();
        let identifier = *identifier;

        self.file.begin_line();
        self.emit_identifier(identifier);
        self.file.append("(");
        self.emit_arguments(tree, &arguments);
        self.file.append(");");
    }

    fn visit_while_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::WhileStatement {
            condition,
            children,
        } = &tree.node(id).kind
        else {
            return;
        };
        let condition = *condition;
        let children = children.clone();

        self.file.begin_line();
        self.file.append("while (");
        accept(tree, condition, self);
        self.file.append(")");
        self.file.insert_line("{");
        self.emit_block(tree, &children);
        self.file.insert_line("}");
    }

    fn visit_loop_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.emit_counted_loop(tree, id);
    }

    fn visit_ploop_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        // No defined parallel semantics; emitted as a plain counted loop.
        self.emit_counted_loop(tree, id);
    }

    fn visit_variable_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        let node = tree.node(id);
        let NodeKind::VariableStatement {
            identifier,
            dimensions,
            initializer,
            ..
        } = &node.kind
        else {
            return;
        };
        let identifier = *identifier;
        let dimensions = dimensions.clone();
        let initializer = *initializer;
        let element_type = cpp_scalar_type(node.datatype).to_string();
        let name = self.ctx.strings.resolve(identifier).to_string();

        self.file.begin_line();
        if dimensions.is_empty() {
            let declared_type = cpp_value_type(node);
            self.file.append(&format!("{declared_type} {name}"));
            if let Some(initializer) = initializer {
                self.file.append(" = ");
                accept(tree, initializer, self);
            }
            self.file.append(";");
            return;
        }

        // Arrays become nested std::vector declarations sized by their
        // dimension expressions.
        let mut vector_type = element_type.clone();
        for _ in 0..dimensions.len() {
            vector_type = format!("std::vector<{vector_type}>");
        }
        self.file.append(&format!("{vector_type} {name}("));
        self.emit_vector_extents(tree, &dimensions, &element_type);
        self.file.append(");");
    }

    fn visit_scope_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::ScopeStatement { children } = &tree.node(id).kind else {
            return;
        };
        let children = children.clone();

        self.file.insert_blank_line();
        self.file.insert_line("{");
        self.emit_block(tree, &children);
        self.file.insert_line("}");
    }

    fn visit_conditional_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::ConditionalStatement {
            condition,
            children,
            next,
        } = &tree.node(id).kind
        else {
            return;
        };
        let condition = *condition;
        let children = children.clone();
        let mut link = *next;

        self.file.begin_line();
        self.file.append("if (");
        accept(tree, condition, self);
        self.file.append(")");
        self.file.insert_line("{");
        self.emit_block(tree, &children);
        self.file.insert_line("}");

        while let Some(current) = link {
            let NodeKind::ConditionalStatement {
                condition,
                children,
                next,
            } = &tree.node(current).kind
            else {
                break;
            };
            let condition = *condition;
            let children = children.clone();
            link = *next;

            self.file.begin_line();
            self.file.append("else if (");
            accept(tree, condition, self);
            self.file.append(")");
            self.file.insert_line("{");
            self.emit_block(tree, &children);
            self.file.insert_line("}");
        }
    }

    fn visit_read_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::ReadStatement { identifier, .. } = &tree.node(id).kind else {
            return;
        };
        let identifier = *identifier;

        // The unit expression selects the stream; console input is all
        // the generated program supports.
        self.file.begin_line();
        self.file.append("std::cin >> ");
        self.emit_identifier(identifier);
        self.file.append(";");
    }

    fn visit_write_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::WriteStatement { expressions } = &tree.node(id).kind else {
            return;
        };
        let expressions = expressions.clone();

        self.file.begin_line();
        self.file.append("std::cout");
        for expression in expressions {
            self.file.append(" << ");
            accept(tree, expression, self);
        }
        self.file.append(";");
    }

    fn visit_assignment(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Assignment { left, right } = &tree.node(id).kind else {
            return;
        };
        let (left, right) = (*left, *right);

        accept(tree, left, self);
        self.file.append(" = ");
        accept(tree, right, self);
    }

    fn visit_equality(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Equality {
            operation,
            left,
            right,
        } = &tree.node(id).kind
        else {
            return;
        };
        let operator = match operation {
            EqualityOp::Equals => " == ",
            EqualityOp::NotEquals => " != ",
        };
        let (left, right) = (*left, *right);

        accept(tree, left, self);
        self.file.append(operator);
        accept(tree, right, self);
    }

    fn visit_comparison(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Comparison {
            operation,
            left,
            right,
        } = &tree.node(id).kind
        else {
            return;
        };
        let operator = match operation {
            ComparisonOp::LessThan => " < ",
            ComparisonOp::LessThanEquals => " <= ",
            ComparisonOp::GreaterThan => " > ",
            ComparisonOp::GreaterThanEquals => " >= ",
        };
        let (left, right) = (*left, *right);

        accept(tree, left, self);
        self.file.append(operator);
        accept(tree, right, self);
    }

    fn visit_concatenation(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Concatenation { left, right } = &tree.node(id).kind else {
            return;
        };
        let (left, right) = (*left, *right);

        // The helper family picks the right overload for vectors; a
        // string left-operand stringifies whatever is on the right.
        if tree.node(left).datatype == DataKind::String {
            self.file.append("(");
            accept(tree, left, self);
            self.file.append(" + sfx_str(");
            accept(tree, right, self);
            self.file.append("))");
        } else {
            self.file.append("sfx_concat(");
            accept(tree, left, self);
            self.file.append(", ");
            accept(tree, right, self);
            self.file.append(")");
        }
    }

    fn visit_term(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Term {
            operation,
            left,
            right,
        } = &tree.node(id).kind
        else {
            return;
        };
        let operator = match operation {
            TermOp::Addition => " + ",
            TermOp::Subtraction => " - ",
        };
        let (left, right) = (*left, *right);

        accept(tree, left, self);
        self.file.append(operator);
        accept(tree, right, self);
    }

    fn visit_factor(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Factor {
            operation,
            left,
            right,
        } = &tree.node(id).kind
        else {
            return;
        };
        let operator = match operation {
            FactorOp::Multiplication => " * ",
            FactorOp::Division => " / ",
        };
        let (left, right) = (*left, *right);

        accept(tree, left, self);
        self.file.append(operator);
        accept(tree, right, self);
    }

    fn visit_magnitude(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Magnitude { left, right } = &tree.node(id).kind else {
            return;
        };
        let (left, right) = (*left, *right);

        self.file.append("std::pow(");
        accept(tree, left, self);
        self.file.append(", ");
        accept(tree, right, self);
        self.file.append(")");
    }

    fn visit_extraction(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Extraction { left, right } = &tree.node(id).kind else {
            return;
        };
        let (left, right) = (*left, *right);

        self.file.append("sfx_extract(");
        accept(tree, left, self);
        self.file.append(", ");
        accept(tree, right, self);
        self.file.append(")");
    }

    fn visit_derivation(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Derivation { left, right } = &tree.node(id).kind else {
            return;
        };
        let (left, right) = (*left, *right);

        self.file.append("sfx_derive(");
        accept(tree, left, self);
        self.file.append(", ");
        accept(tree, right, self);
        self.file.append(")");
    }

    fn visit_unary(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Unary { operand } = &tree.node(id).kind else {
            return;
        };
        let operand = *operand;

        self.file.append("-");
        accept(tree, operand, self);
    }

    fn visit_function_call(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::FunctionCall {
            identifier,
            arguments,
        } = &tree.node(id).kind
        else {
            return;
        };
        let identifier = *identifier;
        let arguments = arguments.clone();

        self.emit_identifier(identifier);
        self.file.append("(");
        self.emit_arguments(tree, &arguments);
        self.file.append(")");
    }

    fn visit_array_index(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::ArrayIndex {
            identifier,
            indices,
        } = &tree.node(id).kind
        else {
            return;
        };
        let identifier = *identifier;
        let indices = indices.clone();

        self.emit_identifier(identifier);
        for index in indices {
            self.file.append("[");
            accept(tree, index, self);
            self.file.append("]");
        }
    }

    fn visit_primary(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Primary { literal } = &tree.node(id).kind else {
            return;
        };

        match *literal {
            Literal::Integer(value) => self.file.append(&value.to_string()),
            Literal::Real(value) => self.file.append(&format!("{value:?}")),
            Literal::Complex(value) => self
                .file
                .append(&format!("std::complex<double>(0.0, {value:?})")),
            Literal::String(value) => {
                let escaped = escape_cpp_string(self.ctx.strings.resolve(value));
                self.file.append(&format!("\"{escaped}\""));
            }
            Literal::Identifier(value) => self.emit_identifier(value),
        }
    }

    fn visit_grouping(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Grouping { expression } = &tree.node(id).kind else {
            return;
        };
        let expression = *expression;

        self.file.append("( ");
        accept(tree, expression, self);
        self.file.append(" )");
    }
}

impl CppGenerator<'_> {
    /// Constructor extents for a nested `std::vector` declaration: each
    /// dimension expression sizes one nesting level.
    fn emit_vector_extents(&mut self, tree: &SyntaxTree, dimensions: &[NodeId], element_type: &str) {
        accept(tree, dimensions[0], self);
        if dimensions.len() > 1 {
            let mut inner = element_type.to_string();
            for _ in 0..dimensions.len() - 1 {
                inner = format!("std::vector<{inner}>");
            }
            self.file.append(&format!(", {inner}("));
            self.emit_vector_extents(tree, &dimensions[1..], element_type);
            self.file.append(")");
        }
    }

    fn emit_counted_loop(&mut self, tree: &SyntaxTree, id: NodeId) {
        let (iterator, start, end, step, children) = match &tree.node(id).kind {
            NodeKind::LoopStatement {
                iterator,
                start,
                end,
                step,
                children,
            }
            | NodeKind::PloopStatement {
                iterator,
                start,
                end,
                step,
                children,
            } => (*iterator, *start, *end, *step, children.clone()),
            _ => return,
        };
        let name = self.ctx.strings.resolve(iterator).to_string();

        self.file.begin_line();
        self.file.append(&format!("for (int64_t {name} = "));
        accept(tree, start, self);
        self.file.append(&format!("; {name} < "));
        accept(tree, end, self);
        self.file.append(&format!("; {name} += "));
        match step {
            Some(step) => accept(tree, step, self),
            None => self.file.append("1"),
        }
        self.file.append(")");
        self.file.insert_line("{");

        // Save/restore pair: the iterator leaves each iteration holding
        // the value it entered with, whatever the body did to it.
        self.file.push_tabs();
        self.file
            .insert_line(&format!("int64_t {name}_save = {name};"));
        self.statement_depth += 1;
        for &child in &children {
            accept(tree, child, self);
        }
        self.statement_depth -= 1;
        self.file.insert_line(&format!("{name} = {name}_save;"));
        self.file.pop_tabs();
        self.file.insert_line("}");
    }
}
