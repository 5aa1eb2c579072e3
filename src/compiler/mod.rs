pub mod ast;
pub mod datatypes;
pub mod dependency_graph;
pub mod environment;
pub mod reference_printer;
pub mod source_registry;
pub mod string_interning;
pub mod symbols;
pub mod validator;

pub mod tokenizer {
    pub mod scanner;
    pub mod tokens;
}

pub mod parser {
    pub mod expressions;
    pub mod parser;
    pub mod statements;
}

pub mod codegen {
    pub mod generator;
    pub mod manifest;
    pub mod source_file;
}

pub mod compiler_messages {
    pub mod compiler_errors;
    pub mod compiler_warnings;
    pub mod dev_logging;
    pub mod display_messages;
}

use crate::compiler::ast::SyntaxTree;
use crate::compiler::compiler_messages::compiler_errors::{CompilerMessages, ErrorLocation};
use crate::compiler::dependency_graph::DependencyGraph;
use crate::compiler::parser::parser::Parser;
use crate::compiler::source_registry::{SourceId, SourceRegistry};
use crate::compiler::string_interning::StringTable;
use crate::compiler::symbols::NodeRef;
use crate::settings::Config;
use crate::timer_log;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::PathBuf;

/// A finished (possibly failed) parse of one module. The tree's arena
/// keeps every node alive for the compilation's lifetime; symbols point
/// into it by index.
#[derive(Debug)]
pub struct ParsedModule {
    pub tree: SyntaxTree,
    pub error_count: usize,
}

impl ParsedModule {
    /// A module with any recorded error is unusable for generation.
    pub fn parsed_clean(&self) -> bool {
        self.error_count == 0
    }
}

/// Everything one compilation owns, threaded through the driver, the
/// parsers and the generator in place of the original's process-wide
/// singletons.
pub struct CompilationContext {
    pub registry: SourceRegistry,
    pub graph: DependencyGraph,
    pub modules: FxHashMap<SourceId, ParsedModule>,
    pub strings: StringTable,
    pub config: Config,
    pub messages: CompilerMessages,

    /// Where the first `begin` block was declared; `begin` may appear at
    /// most once across all modules of a compilation.
    pub main_declared: Option<ErrorLocation>,

    /// Function nodes already reported as directly recursive, so each one
    /// is diagnosed once rather than per call site.
    pub recursion_reported: FxHashSet<NodeRef>,
}

impl CompilationContext {
    pub fn new(config: Config) -> CompilationContext {
        let string_capacity = config
            .string_pool_limit
            .map(|limit| (limit / 16) as usize)
            .unwrap_or(crate::settings::MINIMUM_STRING_TABLE_CAPACITY);

        CompilationContext {
            registry: SourceRegistry::new(config.memory_limit),
            graph: DependencyGraph::new(),
            modules: FxHashMap::default(),
            strings: StringTable::with_capacity(string_capacity),
            config,
            messages: CompilerMessages::new(),
            main_declared: None,
            recursion_reported: FxHashSet::default(),
        }
    }
}

/// Outcome of a full compilation, ready for the driver to display and
/// turn into an exit code.
pub struct CompilationResult {
    pub messages: CompilerMessages,
    pub outputs: Vec<PathBuf>,
    pub success: bool,
}

/// Run the whole pipeline: register the entry file, parse the module tree
/// depth-first, then (only if every module parsed clean) generate the C++
/// files and the build manifest.
pub fn compile(config: Config) -> CompilationResult {
    let timer = std::time::Instant::now();
    let mut ctx = CompilationContext::new(config);

    // Entry registration; a bad path is fatal before any parsing.
    let entry_source = match ctx.registry.create(&ctx.config.entry_path.clone()) {
        Ok(source) => source,
        Err(error) => {
            ctx.messages.errors.push(error);
            return CompilationResult {
                messages: ctx.messages,
                outputs: Vec::new(),
                success: false,
            };
        }
    };

    let entry_path = ctx.registry.path(entry_source).to_path_buf();
    ctx.graph.set_entry(entry_path.clone(), entry_source);

    match Parser::new(&mut ctx, entry_source) {
        Ok(parser) => {
            let module = parser.parse_as_root(&mut ctx);
            ctx.modules.insert(entry_source, module);
        }
        Err(error) => ctx.messages.errors.push(error),
    }
    timer_log!(timer, "Parsing finished: ");

    if ctx.config.warnings_as_errors {
        ctx.messages.promote_warnings();
    }

    if ctx.messages.has_errors() {
        return CompilationResult {
            messages: ctx.messages,
            outputs: Vec::new(),
            success: false,
        };
    }

    // Every module parsed clean; walk the graph leaves-first and emit.
    let generated = codegen::generator::generate(&ctx);
    let outputs = match generated {
        Ok(files) => match codegen::generator::commit(&ctx, files) {
            Ok(outputs) => outputs,
            Err(error) => {
                ctx.messages.errors.push(error);
                return CompilationResult {
                    messages: ctx.messages,
                    outputs: Vec::new(),
                    success: false,
                };
            }
        },
        Err(error) => {
            ctx.messages.errors.push(error);
            return CompilationResult {
                messages: ctx.messages,
                outputs: Vec::new(),
                success: false,
            };
        }
    };
    timer_log!(timer, "Generation finished: ");

    CompilationResult {
        messages: ctx.messages,
        outputs,
        success: true,
    }
}
