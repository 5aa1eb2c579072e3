use crate::compiler::ast::{NodeId, NodeKind, SyntaxNode, SyntaxTree};
use crate::compiler::compiler_messages::compiler_errors::{
    CompilerError, DiagnosticCode, ErrorLocation, ErrorType,
};
use crate::compiler::compiler_messages::compiler_warnings::CompilerWarning;
use crate::compiler::environment::SymbolEnvironment;
use crate::compiler::source_registry::SourceId;
use crate::compiler::string_interning::StringId;
use crate::compiler::tokenizer::scanner::Tokenizer;
use crate::compiler::tokenizer::tokens::{Token, TokenKind};
use crate::compiler::{CompilationContext, ParsedModule};
use crate::{ast_log, return_syntax_error};
use std::path::PathBuf;

/// Recursive-descent parser for one module. Owns its tokenizer, its node
/// arena and its symbol environment; child modules reached through
/// `include` get their own parser and their own environment.
pub struct Parser {
    pub(crate) source: SourceId,
    pub(crate) path: PathBuf,
    pub(crate) directory: PathBuf,
    pub(crate) tokenizer: Tokenizer,
    pub(crate) tree: SyntaxTree,
    pub(crate) environment: SymbolEnvironment,
    pub(crate) error_count: usize,

    /// Identifiers of functions whose bodies are still being parsed; a
    /// call to one of these is direct recursion.
    pub(crate) open_callables: Vec<StringId>,
}

impl Parser {
    pub fn new(ctx: &mut CompilationContext, source: SourceId) -> Result<Parser, CompilerError> {
        let text = ctx.registry.load(source)?;
        let path = ctx.registry.path(source).to_path_buf();
        let directory = path
            .parent()
            .map(|parent| parent.to_path_buf())
            .unwrap_or_default();

        Ok(Parser {
            source,
            path: path.clone(),
            directory,
            tokenizer: Tokenizer::new(source, text),
            tree: SyntaxTree::new(source, path),
            environment: SymbolEnvironment::new(),
            error_count: 0,
            open_callables: Vec::new(),
        })
    }

    /// Entry point for the entry file: an optional prelude of globals,
    /// then the `begin ... end` block, then end of file.
    pub fn parse_as_root(mut self, ctx: &mut CompilationContext) -> ParsedModule {
        ast_log!("Parsing root module: ", self.path.display().to_string());
        let mut globals: Vec<NodeId> = Vec::new();

        loop {
            match self.tokenizer.current().kind {
                TokenKind::Include | TokenKind::Function | TokenKind::Procedure => {
                    match self.match_global_statement(ctx) {
                        Ok(node) => globals.push(node),
                        Err(error) => {
                            self.report(ctx, error);
                            self.synchronize_through(TokenKind::Semicolon);
                        }
                    }
                }
                TokenKind::Begin | TokenKind::Eof => break,
                _ => {
                    let error = self.unexpected_token_error(
                        "Expected an include, function, procedure or the begin block \
                         at the top level of the entry file",
                    );
                    self.report(ctx, error);
                    self.synchronize_through(TokenKind::Semicolon);
                }
            }
        }

        let main = if self.tokenizer.current_is(TokenKind::Begin) {
            match self.match_main_statement(ctx) {
                Ok(main) => main,
                Err(error) => {
                    self.report(ctx, error);
                    self.synchronize_up_to(TokenKind::Eof);
                    self.empty_main_node()
                }
            }
        } else {
            let error = self.unexpected_token_error("The entry file must contain a begin block");
            self.report(ctx, error);
            self.empty_main_node()
        };

        // A second begin block is diagnosed as a duplicate, not a parse
        // failure; its statements are walked and discarded.
        while self.tokenizer.current_is(TokenKind::Begin) {
            if let Err(error) = self.match_main_statement(ctx) {
                self.report(ctx, error);
                self.synchronize_up_to(TokenKind::Eof);
            }
        }

        if !self.tokenizer.current_is(TokenKind::Eof) {
            let error =
                self.unexpected_token_error("Expected end of file after the end of the begin block");
            self.report(ctx, error);
        }

        let token = self.tokenizer.current();
        let root = self.tree.push(SyntaxNode::new(
            NodeKind::Root { globals, main },
            token.row,
            token.column,
        ));
        self.tree.root = Some(root);

        ParsedModule {
            tree: self.tree,
            error_count: self.error_count,
        }
    }

    /// Entry point for included modules: globals only, no begin block.
    pub fn parse_as_module(mut self, ctx: &mut CompilationContext) -> ParsedModule {
        ast_log!("Parsing included module: ", self.path.display().to_string());
        let mut globals: Vec<NodeId> = Vec::new();

        loop {
            match self.tokenizer.current().kind {
                TokenKind::Include | TokenKind::Function | TokenKind::Procedure => {
                    match self.match_global_statement(ctx) {
                        Ok(node) => globals.push(node),
                        Err(error) => {
                            self.report(ctx, error);
                            self.synchronize_through(TokenKind::Semicolon);
                        }
                    }
                }
                TokenKind::Eof => break,
                TokenKind::Begin => {
                    let error = self.unexpected_token_error(
                        "Included modules contribute globals only and cannot contain a begin block",
                    );
                    self.report(ctx, error);
                    self.synchronize_up_to(TokenKind::Eof);
                }
                _ => {
                    let error = self.unexpected_token_error(
                        "Expected an include, function or procedure in an included module",
                    );
                    self.report(ctx, error);
                    self.synchronize_through(TokenKind::Semicolon);
                }
            }
        }

        let token = self.tokenizer.current();
        let root = self.tree.push(SyntaxNode::new(
            NodeKind::Module { globals },
            token.row,
            token.column,
        ));
        self.tree.root = Some(root);

        ParsedModule {
            tree: self.tree,
            error_count: self.error_count,
        }
    }

    pub(crate) fn empty_main_node(&mut self) -> NodeId {
        let token = self.tokenizer.current();
        self.tree.push(SyntaxNode::new(
            NodeKind::Main {
                children: Vec::new(),
            },
            token.row,
            token.column,
        ))
    }

    // --- Diagnostics ---------------------------------------------------------

    pub(crate) fn location_of(&self, token: &Token) -> ErrorLocation {
        ErrorLocation::new(self.path.clone(), token.row, token.column)
    }

    pub(crate) fn current_location(&self) -> ErrorLocation {
        let token = self.tokenizer.current();
        self.location_of(&token)
    }

    pub(crate) fn report(&mut self, ctx: &mut CompilationContext, error: CompilerError) {
        self.error_count += 1;
        ctx.messages.errors.push(error);
    }

    pub(crate) fn report_warning(&mut self, ctx: &mut CompilationContext, warning: CompilerWarning) {
        ctx.messages.warnings.push(warning);
    }

    pub(crate) fn unexpected_token_error(&self, detail: &str) -> CompilerError {
        let token = self.tokenizer.current();
        CompilerError::new(
            DiagnosticCode::UnexpectedToken,
            format!("Unexpected {}. {}", token.kind.describe(), detail),
            self.location_of(&token),
            ErrorType::Syntax,
        )
    }

    /// Turn an undefined token into the lexical diagnostic it stands for.
    /// The scanner only records the failure shape; the first byte of the
    /// lexeme recovers what was being scanned.
    pub(crate) fn undefined_token_error(&self, token: &Token) -> CompilerError {
        let lexeme = self.tokenizer.lexeme(token);
        let first = lexeme.as_bytes().first().copied();

        let (code, msg) = match token.kind {
            TokenKind::UndefinedEol => (
                DiagnosticCode::UnterminatedStringAtEol,
                "String literal is not terminated before the end of the line".to_string(),
            ),
            TokenKind::UndefinedEof => match first {
                Some(b'{') => (
                    DiagnosticCode::UnterminatedComment,
                    "Comment block is not terminated before the end of the file".to_string(),
                ),
                _ => (
                    DiagnosticCode::UnterminatedString,
                    "String literal is not terminated before the end of the file".to_string(),
                ),
            },
            _ => match first {
                Some(byte) if byte.is_ascii_digit() => (
                    DiagnosticCode::MalformedNumber,
                    format!("Malformed numeric literal '{lexeme}'"),
                ),
                _ => (
                    DiagnosticCode::UnknownCharacter,
                    format!("Unrecognized character sequence '{lexeme}'"),
                ),
            },
        };

        CompilerError::new(code, msg, self.location_of(token), ErrorType::Lexical)
    }

    // --- Token plumbing ------------------------------------------------------

    /// Consume the current token if it matches, otherwise produce a
    /// missing-delimiter diagnostic.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token, CompilerError> {
        let token = self.tokenizer.current();
        if token.kind == kind {
            self.tokenizer.shift();
            return Ok(token);
        }

        if token.kind.is_undefined() {
            return Err(self.undefined_token_error(&token));
        }

        return_syntax_error!(
            MissingDelimiter,
            format!(
                "Expected {} but found {}",
                kind.describe(),
                token.kind.describe()
            ),
            self.location_of(&token),
            {
                CompilationStage => "Parsing",
            }
        )
    }

    /// Intern the current token's lexeme and consume it. The token must be
    /// an identifier.
    pub(crate) fn expect_identifier(
        &mut self,
        ctx: &mut CompilationContext,
    ) -> Result<(Token, StringId), CompilerError> {
        let token = self.tokenizer.current();
        if token.kind != TokenKind::Identifier {
            if token.kind.is_undefined() {
                return Err(self.undefined_token_error(&token));
            }
            return_syntax_error!(
                UnexpectedToken,
                format!("Expected an identifier but found {}", token.kind.describe()),
                self.location_of(&token),
                {
                    CompilationStage => "Parsing",
                }
            )
        }

        let identifier = ctx.strings.intern(self.tokenizer.lexeme(&token));
        self.tokenizer.shift();
        Ok((token, identifier))
    }

    // --- Synchronization -----------------------------------------------------

    /// Consume tokens until the chosen delimiter is the current token.
    pub(crate) fn synchronize_up_to(&mut self, kind: TokenKind) {
        while !self.tokenizer.current_is(kind) && !self.tokenizer.current_is(TokenKind::Eof) {
            self.tokenizer.shift();
        }
    }

    /// Consume tokens through the chosen delimiter.
    pub(crate) fn synchronize_through(&mut self, kind: TokenKind) {
        self.synchronize_up_to(kind);
        if self.tokenizer.current_is(kind) {
            self.tokenizer.shift();
        }
    }

    /// Statement-level recovery inside a block: consume through the next
    /// `;`, but never past the block's terminator keyword.
    pub(crate) fn synchronize_statement(&mut self, terminators: &[TokenKind]) {
        loop {
            let kind = self.tokenizer.current().kind;
            if kind == TokenKind::Eof || terminators.contains(&kind) {
                return;
            }
            if kind == TokenKind::Semicolon {
                self.tokenizer.shift();
                return;
            }
            self.tokenizer.shift();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ast::NodeKind;
    use crate::compiler::compiler_messages::compiler_errors::DiagnosticCode;
    use crate::compiler::datatypes::{DataKind, StructureKind};
    use crate::compiler::CompilationContext;
    use crate::settings::Config;

    struct Parse {
        _dir: tempfile::TempDir,
        ctx: CompilationContext,
        module: ParsedModule,
    }

    fn parse_root(source: &str) -> Parse {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.fox");
        std::fs::write(&path, source).unwrap();

        let mut ctx = CompilationContext::new(Config::new(path.clone()));
        let entry = ctx.registry.create(&path).unwrap();
        let entry_path = ctx.registry.path(entry).to_path_buf();
        ctx.graph.set_entry(entry_path, entry);

        let parser = Parser::new(&mut ctx, entry).unwrap();
        let module = parser.parse_as_root(&mut ctx);

        Parse {
            _dir: dir,
            ctx,
            module,
        }
    }

    fn error_codes(parse: &Parse) -> Vec<DiagnosticCode> {
        parse.ctx.messages.errors.iter().map(|e| e.code).collect()
    }

    fn find_variable(parse: &Parse, name: &str) -> Option<(DataKind, StructureKind, i64)> {
        let wanted = parse.ctx.strings.get_existing(name)?;
        parse.module.tree.nodes().find_map(|(_, node)| match &node.kind {
            NodeKind::VariableStatement { identifier, .. } if *identifier == wanted => {
                Some((node.datatype, node.structure, node.structure_length))
            }
            _ => None,
        })
    }

    #[test]
    fn trivial_program_parses_clean() {
        let parse = parse_root("begin; write 6 1 2 3; end;");
        assert!(parse.module.parsed_clean(), "{:?}", parse.ctx.messages.errors);
        assert!(parse.module.tree.root.is_some());
    }

    #[test]
    fn assignment_promotes_the_variable_kind() {
        let parse = parse_root("begin; variable x 8; x := 1 + 2.5; end;");
        assert!(parse.module.parsed_clean(), "{:?}", parse.ctx.messages.errors);
        let (datatype, structure, _) = find_variable(&parse, "x").unwrap();
        assert_eq!(datatype, DataKind::Real);
        assert_eq!(structure, StructureKind::Scalar);
    }

    #[test]
    fn complex_literals_need_adjacency() {
        let parse = parse_root("begin; variable z 8 := 4i; end;");
        assert!(parse.module.parsed_clean(), "{:?}", parse.ctx.messages.errors);
        let (datatype, _, _) = find_variable(&parse, "z").unwrap();
        assert_eq!(datatype, DataKind::Complex);

        // With a space the `i` is a plain (undeclared) identifier.
        let spaced = parse_root("begin; variable z 8 := 4 i; end;");
        assert!(!spaced.module.parsed_clean());
    }

    #[test]
    fn undeclared_identifier_is_a_single_semantic_error() {
        let parse = parse_root("begin; write 6 q; end;");
        assert_eq!(error_codes(&parse), vec![DiagnosticCode::UndeclaredIdentifier]);

        let error = &parse.ctx.messages.errors[0];
        assert_eq!(error.location.row, 1);
        assert_eq!(error.location.column, 16);
    }

    #[test]
    fn invalid_assignment_targets_are_syntax_errors() {
        let parse = parse_root("begin; 1 + 2 := 3; end;");
        assert!(error_codes(&parse).contains(&DiagnosticCode::InvalidAssignment));
    }

    #[test]
    fn statement_errors_recover_at_the_semicolon() {
        let parse = parse_root("begin; ?! ; write 6 1; end;");
        assert!(!parse.module.parsed_clean());
        // The write statement after the bad one still parsed.
        let has_write = parse
            .module
            .tree
            .nodes()
            .any(|(_, node)| matches!(node.kind, NodeKind::WriteStatement { .. }));
        assert!(has_write);
    }

    #[test]
    fn missing_block_terminator_stops_at_end() {
        let parse = parse_root("begin; while 1; write 6 1; end;");
        assert!(!parse.module.parsed_clean());
    }

    #[test]
    fn redeclaration_is_an_error_and_shadowing_a_warning() {
        let redeclared = parse_root("begin; variable x 8; variable x 8; end;");
        assert!(error_codes(&redeclared).contains(&DiagnosticCode::RedeclaredIdentifier));

        let shadowed = parse_root("begin; variable x 8; scope; variable x 8; endscope; end;");
        assert!(shadowed.module.parsed_clean());
        assert_eq!(shadowed.ctx.messages.warnings.len(), 1);
    }

    #[test]
    fn arity_mismatch_on_function_calls() {
        let parse = parse_root(
            "function f a b; f := a + b; endfunction; \
             begin; variable x 8 := f(1); end;",
        );
        assert!(error_codes(&parse).contains(&DiagnosticCode::ArityMismatch));
    }

    #[test]
    fn call_sites_type_the_parameters_and_the_return() {
        let parse = parse_root(
            "function f a b; f := a + b; endfunction; \
             begin; variable x 8 := f(1, 2.5); end;",
        );
        assert!(parse.module.parsed_clean(), "{:?}", parse.ctx.messages.errors);
        let (datatype, _, _) = find_variable(&parse, "x").unwrap();
        assert_eq!(datatype, DataKind::Real);
    }

    #[test]
    fn direct_recursion_is_reported_once_and_skipped() {
        let parse = parse_root(
            "function f a; f := f(a); endfunction; \
             begin; variable x 8 := f(1); end;",
        );
        let recursion_errors = error_codes(&parse)
            .iter()
            .filter(|code| **code == DiagnosticCode::DirectRecursion)
            .count();
        assert_eq!(recursion_errors, 1);
    }

    #[test]
    fn array_indexing_checks_rank_and_index_kinds() {
        let wrong_rank = parse_root("begin; variable a 8 4; variable x 8 := a(1, 2); end;");
        assert!(error_codes(&wrong_rank).contains(&DiagnosticCode::ArityMismatch));

        let bad_index = parse_root("begin; variable a 8 4; variable x 8 := a(1.5); end;");
        assert!(error_codes(&bad_index).contains(&DiagnosticCode::KindMismatch));

        let not_array = parse_root("begin; variable s 8; variable x 8 := s(1); end;");
        assert!(error_codes(&not_array).contains(&DiagnosticCode::KindMismatch));
    }

    #[test]
    fn vector_lengths_must_agree_elementwise() {
        let parse =
            parse_root("begin; variable a 8 3; variable b 8 4; variable c 8 := a + b; end;");
        assert!(error_codes(&parse).contains(&DiagnosticCode::LengthMismatch));
    }

    #[test]
    fn concatenation_sums_vector_lengths() {
        let parse =
            parse_root("begin; variable a 8 3; variable b 8 4; variable c 8 := a & b; end;");
        assert!(parse.module.parsed_clean(), "{:?}", parse.ctx.messages.errors);
        let (_, structure, length) = find_variable(&parse, "c").unwrap();
        assert_eq!(structure, StructureKind::Vector);
        assert_eq!(length, 7);
    }

    #[test]
    fn left_string_concatenation_stringifies() {
        let parse = parse_root("begin; variable s 8 := 'count: ' & 3; end;");
        assert!(parse.module.parsed_clean(), "{:?}", parse.ctx.messages.errors);
        let (datatype, _, _) = find_variable(&parse, "s").unwrap();
        assert_eq!(datatype, DataKind::String);

        let backwards = parse_root("begin; variable s 8 := 3 & 'count'; end;");
        assert!(error_codes(&backwards).contains(&DiagnosticCode::KindMismatch));
    }

    #[test]
    fn second_begin_block_is_a_duplicate_main_warning() {
        let parse = parse_root("begin; end; begin; end;");
        assert!(parse.module.parsed_clean(), "{:?}", parse.ctx.messages.errors);
        assert_eq!(parse.ctx.messages.warnings.len(), 1);
    }

    #[test]
    fn modules_reject_begin_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mod.fox");
        std::fs::write(&path, "begin; end;").unwrap();

        let mut ctx = CompilationContext::new(Config::new(path.clone()));
        let entry = ctx.registry.create(&path).unwrap();
        let entry_path = ctx.registry.path(entry).to_path_buf();
        ctx.graph.set_entry(entry_path, entry);

        let parser = Parser::new(&mut ctx, entry).unwrap();
        let module = parser.parse_as_module(&mut ctx);
        assert!(!module.parsed_clean());
    }
}
