use crate::compiler::ast::{Literal, NodeId, NodeKind};
use crate::compiler::compiler_messages::compiler_errors::{
    CompilerError, DiagnosticCode, ErrorType,
};
use crate::compiler::compiler_messages::compiler_warnings::{CompilerWarning, WarningKind};
use crate::compiler::datatypes::{DataKind, StructureKind};
use crate::compiler::dependency_graph::InsertOutcome;
use crate::compiler::parser::parser::Parser;
use crate::compiler::source_registry::SourceId;
use crate::compiler::string_interning::StringId;
use crate::compiler::symbols::{NodeRef, Symbol, SymbolKind};
use crate::compiler::tokenizer::tokens::TokenKind;
use crate::compiler::CompilationContext;
use crate::{ast_log, return_semantic_error, return_syntax_error};
use std::path::PathBuf;

impl Parser {
    // --- Globals -------------------------------------------------------------

    pub(crate) fn match_global_statement(
        &mut self,
        ctx: &mut CompilationContext,
    ) -> Result<NodeId, CompilerError> {
        match self.tokenizer.current().kind {
            TokenKind::Include => self.match_include_statement(ctx),
            TokenKind::Function => self.match_function_statement(ctx, true),
            TokenKind::Procedure => self.match_procedure_statement(ctx, true),
            _ => Err(self.unexpected_token_error("Expected a global statement")),
        }
    }

    /// `include 'path' ;` - registers the edge in the dependency graph and
    /// recursively parses the included module the first time it is seen.
    pub(crate) fn match_include_statement(
        &mut self,
        ctx: &mut CompilationContext,
    ) -> Result<NodeId, CompilerError> {
        let keyword = self.expect(TokenKind::Include)?;

        let path_token = self.tokenizer.current();
        if path_token.kind != TokenKind::String {
            return_syntax_error!(
                UnexpectedToken,
                format!(
                    "Expected a quoted module path after 'include' but found {}",
                    path_token.kind.describe()
                ),
                self.location_of(&path_token),
                {
                    CompilationStage => "Parsing",
                    PrimarySuggestion => "Write the module path as a single-quoted string",
                }
            )
        }
        let literal = self.tokenizer.lexeme(&path_token).to_string();
        self.tokenizer.shift();

        if literal.is_empty() {
            return_syntax_error!(
                MalformedExpression,
                "Include path must not be empty",
                self.location_of(&path_token),
            )
        }

        // Canonicalize the literal against this module's directory.
        let raw = PathBuf::from(&literal);
        let joined = if raw.is_absolute() {
            raw
        } else {
            self.directory.join(raw)
        };
        let child_source = ctx.registry.create(&joined)?;
        let child_path = ctx.registry.path(child_source).to_path_buf();

        let module = match ctx
            .graph
            .insert(&self.path, child_path.clone(), child_source)
        {
            InsertOutcome::Cycle => {
                let error = CompilerError::new(
                    DiagnosticCode::CyclicInclude,
                    format!(
                        "Including '{}' creates an include cycle",
                        child_path.display()
                    ),
                    self.location_of(&path_token),
                    ErrorType::Semantic,
                );
                self.report(ctx, error);
                None
            }
            InsertOutcome::Duplicate => {
                let warning = CompilerWarning::new(
                    format!("'{}' is already included by this module", child_path.display()),
                    self.location_of(&path_token),
                    WarningKind::DuplicateInclude,
                );
                self.report_warning(ctx, warning);
                None
            }
            InsertOutcome::Shared => {
                // Someone else already parsed this module; only its symbols
                // need to be brought into our scope.
                self.register_module_globals(ctx, child_source);
                Some(child_source)
            }
            InsertOutcome::New => {
                let child_parser = Parser::new(ctx, child_source)?;
                let parsed = child_parser.parse_as_module(ctx);
                self.error_count += parsed.error_count;
                ctx.modules.insert(child_source, parsed);
                self.register_module_globals(ctx, child_source);
                Some(child_source)
            }
        };

        self.expect(TokenKind::Semicolon)?;

        Ok(self.push_node(
            NodeKind::IncludeStatement {
                path: child_path,
                module,
            },
            &keyword,
        ))
    }

    /// Bring an included module's top-level callables into this module's
    /// global scope, walking through its own includes transitively.
    fn register_module_globals(&mut self, ctx: &mut CompilationContext, child: SourceId) {
        let mut incoming: Vec<(StringId, SymbolKind, u32, NodeRef, u32, u32)> = Vec::new();
        self.collect_module_globals(ctx, child, &mut incoming);

        for (identifier, kind, arity, node, row, column) in incoming {
            if let Some(existing) = self.environment.get_global(&ctx.strings, identifier) {
                if existing.node == node {
                    // Diamond inclusion; the symbol is already ours.
                    continue;
                }
                let error = CompilerError::new(
                    DiagnosticCode::RedeclaredIdentifier,
                    format!(
                        "'{}' is already defined in this scope by another module",
                        ctx.strings.resolve(identifier)
                    ),
                    crate::compiler::compiler_messages::compiler_errors::ErrorLocation::new(
                        self.path.clone(),
                        row,
                        column,
                    ),
                    ErrorType::Semantic,
                );
                self.report(ctx, error);
                continue;
            }

            self.environment
                .insert_globally(&ctx.strings, Symbol::new(identifier, kind, arity, node));
        }
    }

    fn collect_module_globals(
        &self,
        ctx: &CompilationContext,
        child: SourceId,
        incoming: &mut Vec<(StringId, SymbolKind, u32, NodeRef, u32, u32)>,
    ) {
        let Some(module) = ctx.modules.get(&child) else {
            return;
        };
        let Some(root) = module.tree.root else {
            return;
        };
        let NodeKind::Module { globals } = &module.tree.node(root).kind else {
            return;
        };

        for &global in globals {
            let node = module.tree.node(global);
            match &node.kind {
                NodeKind::FunctionStatement {
                    identifier,
                    parameters,
                    ..
                } => incoming.push((
                    *identifier,
                    SymbolKind::Function,
                    parameters.len() as u32,
                    NodeRef {
                        module: child,
                        node: global,
                    },
                    node.row,
                    node.column,
                )),
                NodeKind::ProcedureStatement {
                    identifier,
                    parameters,
                    ..
                } => incoming.push((
                    *identifier,
                    SymbolKind::Procedure,
                    parameters.len() as u32,
                    NodeRef {
                        module: child,
                        node: global,
                    },
                    node.row,
                    node.column,
                )),
                NodeKind::IncludeStatement {
                    module: Some(grandchild),
                    ..
                } => self.collect_module_globals(ctx, *grandchild, incoming),
                _ => {}
            }
        }
    }

    /// `begin ; body* end ;` - at most one per compilation.
    pub(crate) fn match_main_statement(
        &mut self,
        ctx: &mut CompilationContext,
    ) -> Result<NodeId, CompilerError> {
        let keyword = self.expect(TokenKind::Begin)?;
        self.expect(TokenKind::Semicolon)?;

        let begin_location = self.location_of(&keyword);
        if ctx.main_declared.is_some() {
            let warning = CompilerWarning::new(
                "A begin block was already declared in this compilation",
                begin_location,
                WarningKind::DuplicateMain,
            );
            self.report_warning(ctx, warning);
        } else {
            ctx.main_declared = Some(begin_location);
        }

        self.environment.push_scope();
        let children = self.match_block(ctx, &[TokenKind::End]);
        self.environment.pop_scope();

        self.expect(TokenKind::End)?;
        self.expect(TokenKind::Semicolon)?;

        Ok(self.push_node(NodeKind::Main { children }, &keyword))
    }

    // --- Statement blocks ----------------------------------------------------

    /// Parse statements until one of the terminator keywords (or EOF)
    /// becomes current. Errors recover at statement granularity without
    /// consuming the terminator.
    pub(crate) fn match_block(
        &mut self,
        ctx: &mut CompilationContext,
        terminators: &[TokenKind],
    ) -> Vec<NodeId> {
        let mut children: Vec<NodeId> = Vec::new();

        loop {
            let kind = self.tokenizer.current().kind;
            if kind == TokenKind::Eof || terminators.contains(&kind) {
                break;
            }

            match self.match_local_statement(ctx) {
                Ok(node) => children.push(node),
                Err(error) => {
                    self.report(ctx, error);
                    self.synchronize_statement(terminators);
                }
            }
        }

        children
    }

    pub(crate) fn match_local_statement(
        &mut self,
        ctx: &mut CompilationContext,
    ) -> Result<NodeId, CompilerError> {
        ast_log!(
            "Parsing statement at ",
            self.tokenizer.current().row.to_string()
        );

        match self.tokenizer.current().kind {
            TokenKind::Variable => self.match_variable_statement(ctx),
            TokenKind::Scope => self.match_scope_statement(ctx),
            TokenKind::While => self.match_while_statement(ctx),
            TokenKind::Loop => self.match_loop_statement(ctx, false),
            TokenKind::Ploop => self.match_loop_statement(ctx, true),
            TokenKind::Function => self.match_function_statement(ctx, false),
            TokenKind::Procedure => self.match_procedure_statement(ctx, false),
            TokenKind::If => self.match_conditional_if_statement(ctx),
            TokenKind::Read => self.match_read_statement(ctx),
            TokenKind::Write => self.match_write_statement(ctx),
            TokenKind::Identifier if self.starts_procedure_call(ctx) => {
                self.match_procedure_call_statement(ctx)
            }
            _ => self.match_expression_statement(ctx),
        }
    }

    fn starts_procedure_call(&self, ctx: &CompilationContext) -> bool {
        if !self.tokenizer.next_is(TokenKind::LeftParenthesis) {
            return false;
        }

        let token = self.tokenizer.current();
        let Some(identifier) = ctx.strings.get_existing(self.tokenizer.lexeme(&token)) else {
            return false;
        };

        self.environment
            .get(&ctx.strings, identifier)
            .is_some_and(|symbol| symbol.kind == SymbolKind::Procedure)
    }

    fn match_expression_statement(
        &mut self,
        ctx: &mut CompilationContext,
    ) -> Result<NodeId, CompilerError> {
        let token = self.tokenizer.current();
        let expression = self.parse_checked_expression(ctx)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(self.push_node(NodeKind::ExpressionStatement { expression }, &token))
    }

    /// `variable name storage dim* (:= initializer)? ;`
    pub(crate) fn match_variable_statement(
        &mut self,
        ctx: &mut CompilationContext,
    ) -> Result<NodeId, CompilerError> {
        let keyword = self.expect(TokenKind::Variable)?;
        let (name_token, identifier) = self.expect_identifier(ctx)?;

        let storage = self.parse_checked_expression(ctx)?;
        self.expect_integer_expression(ctx, storage, "The storage size of a variable");

        let mut dimensions: Vec<NodeId> = Vec::new();
        while !matches!(
            self.tokenizer.current().kind,
            TokenKind::ColonEquals | TokenKind::Semicolon | TokenKind::Eof
        ) {
            let dimension = self.parse_checked_expression(ctx)?;
            self.expect_integer_expression(ctx, dimension, "An array dimension");
            dimensions.push(dimension);
        }

        let initializer = if self.tokenizer.current_is(TokenKind::ColonEquals) {
            self.tokenizer.shift();
            Some(self.parse_checked_expression(ctx)?)
        } else {
            None
        };

        self.expect(TokenKind::Semicolon)?;

        // Structure facts: a dimensioned variable is a vector; a known
        // literal length is tracked statically.
        let arity = dimensions.len() as u32;
        let (structure, structure_length) = if dimensions.is_empty() {
            match initializer {
                Some(init) => {
                    let init_node = self.tree.node(init);
                    (init_node.structure, init_node.structure_length)
                }
                None => (StructureKind::Scalar, 0),
            }
        } else {
            let length = if dimensions.len() == 1 {
                match self.tree.node(dimensions[0]).kind {
                    NodeKind::Primary {
                        literal: Literal::Integer(value),
                    } => value,
                    _ => 0,
                }
            } else {
                0
            };
            (StructureKind::Vector, length)
        };

        let datatype = match initializer {
            Some(init) => self.tree.node(init).datatype,
            None => DataKind::Unknown,
        };

        let node = self.push_node(
            NodeKind::VariableStatement {
                identifier,
                storage,
                dimensions,
                initializer,
            },
            &keyword,
        );
        {
            let variable = self.tree.node_mut(node);
            variable.datatype = datatype;
            variable.structure = structure;
            variable.structure_length = structure_length;
        }

        // Scoping: local redefinition is an error, shadowing a warning.
        if self.environment.exists_locally(&ctx.strings, identifier) {
            let error = CompilerError::new(
                DiagnosticCode::RedeclaredIdentifier,
                format!(
                    "'{}' is already declared in this scope",
                    ctx.strings.resolve(identifier)
                ),
                self.location_of(&name_token),
                ErrorType::Semantic,
            );
            self.report(ctx, error);
            return Ok(node);
        }

        if self.environment.exists_but_not_locally(&ctx.strings, identifier) {
            let warning = CompilerWarning::new(
                format!(
                    "'{}' shadows a declaration from an enclosing scope",
                    ctx.strings.resolve(identifier)
                ),
                self.location_of(&name_token),
                WarningKind::ShadowedIdentifier,
            );
            self.report_warning(ctx, warning);
        }

        let kind = if arity > 0 {
            SymbolKind::Array
        } else {
            SymbolKind::Variable
        };
        self.environment.insert_locally(
            &ctx.strings,
            Symbol::new(
                identifier,
                kind,
                arity,
                NodeRef {
                    module: self.source,
                    node,
                },
            ),
        );

        Ok(node)
    }

    /// `scope ; body* endscope ;`
    fn match_scope_statement(
        &mut self,
        ctx: &mut CompilationContext,
    ) -> Result<NodeId, CompilerError> {
        let keyword = self.expect(TokenKind::Scope)?;
        self.expect(TokenKind::Semicolon)?;

        self.environment.push_scope();
        let children = self.match_block(ctx, &[TokenKind::Endscope]);
        self.environment.pop_scope();

        self.expect(TokenKind::Endscope)?;
        self.expect(TokenKind::Semicolon)?;

        Ok(self.push_node(NodeKind::ScopeStatement { children }, &keyword))
    }

    /// `while condition ; body* endwhile ;`
    fn match_while_statement(
        &mut self,
        ctx: &mut CompilationContext,
    ) -> Result<NodeId, CompilerError> {
        let keyword = self.expect(TokenKind::While)?;
        let condition = self.parse_checked_expression(ctx)?;
        self.expect(TokenKind::Semicolon)?;

        self.environment.push_scope();
        let children = self.match_block(ctx, &[TokenKind::Endwhile]);
        self.environment.pop_scope();

        self.expect(TokenKind::Endwhile)?;
        self.expect(TokenKind::Semicolon)?;

        Ok(self.push_node(NodeKind::WhileStatement { condition, children }, &keyword))
    }

    /// `loop i start end step? ; body* endloop ;` - `ploop` shares the
    /// shape; its parallel semantics are undefined so it runs sequentially.
    fn match_loop_statement(
        &mut self,
        ctx: &mut CompilationContext,
        parallel: bool,
    ) -> Result<NodeId, CompilerError> {
        let (open, close) = if parallel {
            (TokenKind::Ploop, TokenKind::Endploop)
        } else {
            (TokenKind::Loop, TokenKind::Endloop)
        };

        let keyword = self.expect(open)?;
        let (_name_token, iterator) = self.expect_identifier(ctx)?;

        let start = self.parse_checked_expression(ctx)?;
        self.expect_integer_expression(ctx, start, "A loop bound");
        let end = self.parse_checked_expression(ctx)?;
        self.expect_integer_expression(ctx, end, "A loop bound");

        let step = if self.tokenizer.current_is(TokenKind::Semicolon) {
            None
        } else {
            let step = self.parse_checked_expression(ctx)?;
            self.expect_integer_expression(ctx, step, "A loop step");
            Some(step)
        };

        self.expect(TokenKind::Semicolon)?;

        // The node exists before the body parses so the iterator symbol
        // can reference it; children are patched in afterwards.
        let make_kind = |children: Vec<NodeId>| {
            if parallel {
                NodeKind::PloopStatement {
                    iterator,
                    start,
                    end,
                    step,
                    children,
                }
            } else {
                NodeKind::LoopStatement {
                    iterator,
                    start,
                    end,
                    step,
                    children,
                }
            }
        };
        let node = self.push_node(make_kind(Vec::new()), &keyword);
        {
            let loop_node = self.tree.node_mut(node);
            loop_node.datatype = DataKind::Integer;
            loop_node.structure = StructureKind::Scalar;
        }

        self.environment.push_scope();
        self.environment.insert_locally(
            &ctx.strings,
            Symbol::new(
                iterator,
                SymbolKind::Variable,
                0,
                NodeRef {
                    module: self.source,
                    node,
                },
            ),
        );

        let children = self.match_block(ctx, &[close]);
        self.environment.pop_scope();

        self.expect(close)?;
        self.expect(TokenKind::Semicolon)?;

        match &mut self.tree.node_mut(node).kind {
            NodeKind::LoopStatement { children: slot, .. }
            | NodeKind::PloopStatement { children: slot, .. } => *slot = children,
            _ => unreachable!("loop node kind cannot change while parsing its body"),
        }

        Ok(node)
    }

    /// `function name param* ; body* endfunction ;`
    pub(crate) fn match_function_statement(
        &mut self,
        ctx: &mut CompilationContext,
        is_global: bool,
    ) -> Result<NodeId, CompilerError> {
        self.match_callable_statement(ctx, is_global, false)
    }

    /// `procedure name param* ; body* endprocedure ;`
    pub(crate) fn match_procedure_statement(
        &mut self,
        ctx: &mut CompilationContext,
        is_global: bool,
    ) -> Result<NodeId, CompilerError> {
        self.match_callable_statement(ctx, is_global, true)
    }

    fn match_callable_statement(
        &mut self,
        ctx: &mut CompilationContext,
        is_global: bool,
        is_procedure: bool,
    ) -> Result<NodeId, CompilerError> {
        let (open, close) = if is_procedure {
            (TokenKind::Procedure, TokenKind::EndProcedure)
        } else {
            (TokenKind::Function, TokenKind::EndFunction)
        };

        let keyword = self.expect(open)?;
        let (name_token, identifier) = self.expect_identifier(ctx)?;

        let mut parameters: Vec<NodeId> = Vec::new();
        let mut parameter_names: Vec<StringId> = Vec::new();
        while self.tokenizer.current_is(TokenKind::Identifier) {
            let (parameter_token, parameter) = self.expect_identifier(ctx)?;
            if parameter_names.contains(&parameter) {
                return_semantic_error!(
                    RedeclaredIdentifier,
                    format!(
                        "Parameter '{}' is listed twice",
                        ctx.strings.resolve(parameter)
                    ),
                    self.location_of(&parameter_token),
                )
            }
            parameter_names.push(parameter);
            parameters.push(self.push_node(
                NodeKind::Parameter {
                    identifier: parameter,
                },
                &parameter_token,
            ));
        }
        self.expect(TokenKind::Semicolon)?;

        let make_kind = |parameters: Vec<NodeId>, children: Vec<NodeId>| {
            if is_procedure {
                NodeKind::ProcedureStatement {
                    identifier,
                    parameters,
                    children,
                }
            } else {
                NodeKind::FunctionStatement {
                    identifier,
                    parameters,
                    children,
                }
            }
        };
        let node = self.push_node(make_kind(parameters.clone(), Vec::new()), &keyword);
        if is_procedure {
            self.tree.node_mut(node).datatype = DataKind::Void;
        }

        // Register the callable before its body parses; a call to it from
        // inside that body is how direct recursion shows up.
        let symbol = Symbol::new(
            identifier,
            if is_procedure {
                SymbolKind::Procedure
            } else {
                SymbolKind::Function
            },
            parameters.len() as u32,
            NodeRef {
                module: self.source,
                node,
            },
        );

        let redeclared = if is_global {
            self.environment.exists_globally(&ctx.strings, identifier)
        } else {
            self.environment.exists_locally(&ctx.strings, identifier)
        };
        if redeclared {
            let error = CompilerError::new(
                DiagnosticCode::RedeclaredIdentifier,
                format!(
                    "'{}' is already declared in this scope",
                    ctx.strings.resolve(identifier)
                ),
                self.location_of(&name_token),
                ErrorType::Semantic,
            );
            self.report(ctx, error);
        } else if is_global {
            self.environment.insert_globally(&ctx.strings, symbol);
        } else {
            if self.environment.exists_but_not_locally(&ctx.strings, identifier) {
                let warning = CompilerWarning::new(
                    format!(
                        "'{}' shadows a declaration from an enclosing scope",
                        ctx.strings.resolve(identifier)
                    ),
                    self.location_of(&name_token),
                    WarningKind::ShadowedIdentifier,
                );
                self.report_warning(ctx, warning);
            }
            self.environment.insert_locally(&ctx.strings, symbol);
        }

        self.environment.push_scope();
        for (index, &parameter) in parameters.iter().enumerate() {
            self.environment.insert_locally(
                &ctx.strings,
                Symbol::new(
                    parameter_names[index],
                    SymbolKind::Variable,
                    0,
                    NodeRef {
                        module: self.source,
                        node: parameter,
                    },
                ),
            );
        }

        self.open_callables.push(identifier);
        let children = self.match_block(ctx, &[close]);
        self.open_callables.pop();

        self.environment.pop_scope();
        self.expect(close)?;
        self.expect(TokenKind::Semicolon)?;

        match &mut self.tree.node_mut(node).kind {
            NodeKind::FunctionStatement { children: slot, .. }
            | NodeKind::ProcedureStatement { children: slot, .. } => *slot = children,
            _ => unreachable!("callable node kind cannot change while parsing its body"),
        }

        Ok(node)
    }

    /// `if condition ; body* (elseif condition ; body*)* endif ;`
    fn match_conditional_if_statement(
        &mut self,
        ctx: &mut CompilationContext,
    ) -> Result<NodeId, CompilerError> {
        let keyword = self.expect(TokenKind::If)?;
        let condition = self.parse_checked_expression(ctx)?;
        self.expect(TokenKind::Semicolon)?;

        self.environment.push_scope();
        let children = self.match_block(ctx, &[TokenKind::Elseif, TokenKind::Endif]);
        self.environment.pop_scope();

        let next = if self.tokenizer.current_is(TokenKind::Elseif) {
            Some(self.match_conditional_elseif_statement(ctx)?)
        } else {
            None
        };

        // Only the head of the chain consumes the terminator.
        self.expect(TokenKind::Endif)?;
        self.expect(TokenKind::Semicolon)?;

        Ok(self.push_node(
            NodeKind::ConditionalStatement {
                condition,
                children,
                next,
            },
            &keyword,
        ))
    }

    fn match_conditional_elseif_statement(
        &mut self,
        ctx: &mut CompilationContext,
    ) -> Result<NodeId, CompilerError> {
        let keyword = self.expect(TokenKind::Elseif)?;
        let condition = self.parse_checked_expression(ctx)?;
        self.expect(TokenKind::Semicolon)?;

        self.environment.push_scope();
        let children = self.match_block(ctx, &[TokenKind::Elseif, TokenKind::Endif]);
        self.environment.pop_scope();

        let next = if self.tokenizer.current_is(TokenKind::Elseif) {
            Some(self.match_conditional_elseif_statement(ctx)?)
        } else {
            None
        };

        Ok(self.push_node(
            NodeKind::ConditionalStatement {
                condition,
                children,
                next,
            },
            &keyword,
        ))
    }

    /// `read unit target ;`
    fn match_read_statement(
        &mut self,
        ctx: &mut CompilationContext,
    ) -> Result<NodeId, CompilerError> {
        let keyword = self.expect(TokenKind::Read)?;
        let unit = self.parse_checked_expression(ctx)?;
        let (name_token, identifier) = self.expect_identifier(ctx)?;
        self.expect(TokenKind::Semicolon)?;

        if !self.environment.exists(&ctx.strings, identifier) {
            let error = CompilerError::new(
                DiagnosticCode::UndeclaredIdentifier,
                format!(
                    "'{}' is not declared and cannot be read into",
                    ctx.strings.resolve(identifier)
                ),
                self.location_of(&name_token),
                ErrorType::Semantic,
            );
            self.report(ctx, error);
        }

        Ok(self.push_node(NodeKind::ReadStatement { unit, identifier }, &keyword))
    }

    /// `write e0 e1 ... ;` - every operand is stream-inserted in order.
    fn match_write_statement(
        &mut self,
        ctx: &mut CompilationContext,
    ) -> Result<NodeId, CompilerError> {
        let keyword = self.expect(TokenKind::Write)?;

        let mut expressions: Vec<NodeId> = Vec::new();
        while !matches!(
            self.tokenizer.current().kind,
            TokenKind::Semicolon | TokenKind::Eof
        ) {
            expressions.push(self.parse_checked_expression(ctx)?);
        }

        if expressions.is_empty() {
            return_syntax_error!(
                MalformedExpression,
                "A write statement needs at least one value",
                self.location_of(&keyword),
            )
        }

        self.expect(TokenKind::Semicolon)?;

        Ok(self.push_node(NodeKind::WriteStatement { expressions }, &keyword))
    }

    /// `name ( arguments ) ;` where `name` resolves to a procedure.
    fn match_procedure_call_statement(
        &mut self,
        ctx: &mut CompilationContext,
    ) -> Result<NodeId, CompilerError> {
        let (token, identifier) = self.expect_identifier(ctx)?;
        self.expect(TokenKind::LeftParenthesis)?;

        let mut arguments: Vec<NodeId> = Vec::new();
        if !self.tokenizer.current_is(TokenKind::RightParenthesis) {
            loop {
                arguments.push(self.match_expression(ctx)?);
                if self.tokenizer.current_is(TokenKind::Comma) {
                    self.tokenizer.shift();
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RightParenthesis)?;
        self.expect(TokenKind::Semicolon)?;

        let node = self.push_node(
            NodeKind::ProcedureCallStatement {
                identifier,
                arguments,
            },
            &token,
        );
        self.tree.node_mut(node).datatype = DataKind::Void;
        self.run_evaluator(ctx, node);

        Ok(node)
    }

    /// Storage sizes, array dimensions and loop bounds must evaluate to
    /// integers.
    fn expect_integer_expression(
        &mut self,
        ctx: &mut CompilationContext,
        node: NodeId,
        what: &str,
    ) {
        let evaluated = self.tree.node(node);
        if matches!(
            evaluated.datatype,
            DataKind::Integer | DataKind::Unknown | DataKind::Error
        ) {
            return;
        }

        let error = CompilerError::new(
            DiagnosticCode::KindMismatch,
            format!(
                "{} must be an integer, found {}",
                what,
                evaluated.datatype.describe()
            ),
            crate::compiler::compiler_messages::compiler_errors::ErrorLocation::new(
                self.path.clone(),
                evaluated.row,
                evaluated.column,
            ),
            ErrorType::Semantic,
        );
        self.report(ctx, error);
    }
}
