use crate::compiler::ast::{
    ComparisonOp, EqualityOp, FactorOp, Literal, NodeId, NodeKind, SyntaxNode, TermOp,
};
use crate::compiler::compiler_messages::compiler_errors::CompilerError;
use crate::compiler::parser::parser::Parser;
use crate::compiler::symbols::SymbolKind;
use crate::compiler::tokenizer::tokens::{Token, TokenKind};
use crate::compiler::validator::Validator;
use crate::compiler::CompilationContext;
use crate::return_syntax_error;

impl Parser {
    pub(crate) fn push_node(&mut self, kind: NodeKind, token: &Token) -> NodeId {
        self.tree
            .push(SyntaxNode::new(kind, token.row, token.column))
    }

    /// Parse one expression and immediately run the semantic evaluator
    /// over it, stamping data kind, structure kind and structure length
    /// into every node of the subtree. Evaluation failures are recorded
    /// but do not abort the enclosing statement.
    pub(crate) fn parse_checked_expression(
        &mut self,
        ctx: &mut CompilationContext,
    ) -> Result<NodeId, CompilerError> {
        let node = self.match_expression(ctx)?;
        self.run_evaluator(ctx, node);
        Ok(node)
    }

    pub(crate) fn run_evaluator(&mut self, ctx: &mut CompilationContext, node: NodeId) {
        let collected = {
            let mut validator = Validator::new(
                &mut self.tree,
                &mut self.environment,
                &ctx.strings,
                &mut ctx.modules,
                &mut ctx.recursion_reported,
                &self.open_callables,
            );
            validator.evaluate(node);
            validator.take_errors()
        };

        for error in collected {
            self.report(ctx, error);
        }
    }

    // --- Precedence chain ----------------------------------------------------
    //
    // assignment -> equality -> comparison -> concatenation -> term ->
    // factor -> magnitude -> extraction -> derivation -> unary ->
    // call/index -> primary. Everything is left associative except
    // magnitude and assignment.

    pub(crate) fn match_expression(
        &mut self,
        ctx: &mut CompilationContext,
    ) -> Result<NodeId, CompilerError> {
        self.match_assignment(ctx)
    }

    fn match_assignment(&mut self, ctx: &mut CompilationContext) -> Result<NodeId, CompilerError> {
        let left = self.match_equality(ctx)?;

        if self.tokenizer.current_is(TokenKind::ColonEquals) {
            let operator = self.tokenizer.current();

            // Only a bare identifier or an array index may be assigned to.
            let assignable = matches!(
                self.tree.node(left).kind,
                NodeKind::Primary {
                    literal: Literal::Identifier(_)
                } | NodeKind::ArrayIndex { .. }
            );
            if !assignable {
                return_syntax_error!(
                    InvalidAssignment,
                    "The left side of ':=' must be a variable or an array element",
                    self.location_of(&operator),
                    {
                        CompilationStage => "Parsing",
                        PrimarySuggestion => "Assign to a plain identifier or an indexed array element",
                    }
                )
            }

            self.tokenizer.shift();
            let right = self.match_assignment(ctx)?;
            return Ok(self.push_node(NodeKind::Assignment { left, right }, &operator));
        }

        Ok(left)
    }

    fn match_equality(&mut self, ctx: &mut CompilationContext) -> Result<NodeId, CompilerError> {
        let mut left = self.match_comparison(ctx)?;

        loop {
            let operator = self.tokenizer.current();
            let operation = match operator.kind {
                TokenKind::Equals => EqualityOp::Equals,
                TokenKind::Hash => EqualityOp::NotEquals,
                _ => return Ok(left),
            };

            self.tokenizer.shift();
            let right = self.match_comparison(ctx)?;
            left = self.push_node(
                NodeKind::Equality {
                    operation,
                    left,
                    right,
                },
                &operator,
            );
        }
    }

    fn match_comparison(&mut self, ctx: &mut CompilationContext) -> Result<NodeId, CompilerError> {
        let mut left = self.match_concatenation(ctx)?;

        loop {
            let operator = self.tokenizer.current();
            let operation = match operator.kind {
                TokenKind::LessThan => ComparisonOp::LessThan,
                TokenKind::LessThanEquals => ComparisonOp::LessThanEquals,
                TokenKind::GreaterThan => ComparisonOp::GreaterThan,
                TokenKind::GreaterThanEquals => ComparisonOp::GreaterThanEquals,
                _ => return Ok(left),
            };

            self.tokenizer.shift();
            let right = self.match_concatenation(ctx)?;
            left = self.push_node(
                NodeKind::Comparison {
                    operation,
                    left,
                    right,
                },
                &operator,
            );
        }
    }

    fn match_concatenation(
        &mut self,
        ctx: &mut CompilationContext,
    ) -> Result<NodeId, CompilerError> {
        let mut left = self.match_term(ctx)?;

        while self.tokenizer.current_is(TokenKind::Ampersand) {
            let operator = self.tokenizer.current();
            self.tokenizer.shift();
            let right = self.match_term(ctx)?;
            left = self.push_node(NodeKind::Concatenation { left, right }, &operator);
        }

        Ok(left)
    }

    fn match_term(&mut self, ctx: &mut CompilationContext) -> Result<NodeId, CompilerError> {
        let mut left = self.match_factor(ctx)?;

        loop {
            let operator = self.tokenizer.current();
            let operation = match operator.kind {
                TokenKind::Plus => TermOp::Addition,
                TokenKind::Minus => TermOp::Subtraction,
                _ => return Ok(left),
            };

            self.tokenizer.shift();
            let right = self.match_factor(ctx)?;
            left = self.push_node(
                NodeKind::Term {
                    operation,
                    left,
                    right,
                },
                &operator,
            );
        }
    }

    fn match_factor(&mut self, ctx: &mut CompilationContext) -> Result<NodeId, CompilerError> {
        let mut left = self.match_magnitude(ctx)?;

        loop {
            let operator = self.tokenizer.current();
            let operation = match operator.kind {
                TokenKind::Star => FactorOp::Multiplication,
                TokenKind::ForwardSlash => FactorOp::Division,
                _ => return Ok(left),
            };

            self.tokenizer.shift();
            let right = self.match_magnitude(ctx)?;
            left = self.push_node(
                NodeKind::Factor {
                    operation,
                    left,
                    right,
                },
                &operator,
            );
        }
    }

    // Right associative: a ^ b ^ c groups as a ^ (b ^ c).
    fn match_magnitude(&mut self, ctx: &mut CompilationContext) -> Result<NodeId, CompilerError> {
        let left = self.match_extraction(ctx)?;

        if self.tokenizer.current_is(TokenKind::Caret) {
            let operator = self.tokenizer.current();
            self.tokenizer.shift();
            let right = self.match_magnitude(ctx)?;
            return Ok(self.push_node(NodeKind::Magnitude { left, right }, &operator));
        }

        Ok(left)
    }

    fn match_extraction(&mut self, ctx: &mut CompilationContext) -> Result<NodeId, CompilerError> {
        let mut left = self.match_derivation(ctx)?;

        while self.tokenizer.current_is(TokenKind::Pipe) {
            let operator = self.tokenizer.current();
            self.tokenizer.shift();
            let right = self.match_derivation(ctx)?;
            left = self.push_node(NodeKind::Extraction { left, right }, &operator);
        }

        Ok(left)
    }

    fn match_derivation(&mut self, ctx: &mut CompilationContext) -> Result<NodeId, CompilerError> {
        let mut left = self.match_unary(ctx)?;

        while self.tokenizer.current_is(TokenKind::Percent) {
            let operator = self.tokenizer.current();
            self.tokenizer.shift();
            let right = self.match_unary(ctx)?;
            left = self.push_node(NodeKind::Derivation { left, right }, &operator);
        }

        Ok(left)
    }

    fn match_unary(&mut self, ctx: &mut CompilationContext) -> Result<NodeId, CompilerError> {
        if self.tokenizer.current_is(TokenKind::Minus) {
            let operator = self.tokenizer.current();
            self.tokenizer.shift();
            let operand = self.match_unary(ctx)?;
            return Ok(self.push_node(NodeKind::Unary { operand }, &operator));
        }

        self.match_call_or_index(ctx)
    }

    /// `identifier ( ... )` is a function call or an array index; the two
    /// share a surface syntax and are told apart by the symbol kind.
    fn match_call_or_index(
        &mut self,
        ctx: &mut CompilationContext,
    ) -> Result<NodeId, CompilerError> {
        if self.tokenizer.current_is(TokenKind::Identifier)
            && self.tokenizer.next_is(TokenKind::LeftParenthesis)
        {
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

            let is_array = self
                .environment
                .get(&ctx.strings, identifier)
                .is_some_and(|symbol| symbol.kind == SymbolKind::Array);

            let kind = if is_array {
                NodeKind::ArrayIndex {
                    identifier,
                    indices: arguments,
                }
            } else {
                NodeKind::FunctionCall {
                    identifier,
                    arguments,
                }
            };
            return Ok(self.push_node(kind, &token));
        }

        self.match_primary(ctx)
    }

    fn match_primary(&mut self, ctx: &mut CompilationContext) -> Result<NodeId, CompilerError> {
        let token = self.tokenizer.current();

        match token.kind {
            TokenKind::Integer | TokenKind::Real => self.match_number(token),

            TokenKind::String => {
                let literal = Literal::String(ctx.strings.intern(self.tokenizer.lexeme(&token)));
                self.tokenizer.shift();
                Ok(self.push_node(NodeKind::Primary { literal }, &token))
            }

            TokenKind::Identifier => {
                let literal =
                    Literal::Identifier(ctx.strings.intern(self.tokenizer.lexeme(&token)));
                self.tokenizer.shift();
                Ok(self.push_node(NodeKind::Primary { literal }, &token))
            }

            TokenKind::LeftParenthesis => {
                self.tokenizer.shift();
                let expression = self.match_expression(ctx)?;
                self.expect(TokenKind::RightParenthesis)?;
                Ok(self.push_node(NodeKind::Grouping { expression }, &token))
            }

            kind if kind.is_undefined() => {
                let error = self.undefined_token_error(&token);
                self.tokenizer.shift();
                Err(error)
            }

            _ => {
                return_syntax_error!(
                    MalformedExpression,
                    format!(
                        "Expected a value, variable or parenthesized expression but found {}",
                        token.kind.describe()
                    ),
                    self.location_of(&token),
                    {
                        CompilationStage => "Parsing",
                    }
                )
            }
        }
    }

    /// A numeric literal immediately followed (no whitespace) by the
    /// identifier `i` is a complex literal: `4i`, `2.5I`. Adjacency is
    /// checked with byte offsets so `write 6 i` keeps its two operands.
    fn match_number(&mut self, token: Token) -> Result<NodeId, CompilerError> {
        let lexeme = self.tokenizer.lexeme(&token).to_string();

        let suffix = self.tokenizer.next_token();
        let is_complex = suffix.kind == TokenKind::Identifier
            && suffix.offset == token.end_offset()
            && {
                let suffix_lexeme = self.tokenizer.lexeme(&suffix);
                suffix_lexeme == "i" || suffix_lexeme == "I"
            };

        if is_complex {
            let Ok(value) = lexeme.parse::<f64>() else {
                return_syntax_error!(
                    MalformedNumber,
                    format!("Complex literal magnitude '{lexeme}' is out of range"),
                    self.location_of(&token),
                )
            };
            self.tokenizer.shift();
            self.tokenizer.shift();
            return Ok(self.push_node(
                NodeKind::Primary {
                    literal: Literal::Complex(value),
                },
                &token,
            ));
        }

        let literal = match token.kind {
            TokenKind::Integer => match lexeme.parse::<i64>() {
                Ok(value) => Literal::Integer(value),
                Err(_) => {
                    return_syntax_error!(
                        MalformedNumber,
                        format!("Integer literal '{lexeme}' is out of range"),
                        self.location_of(&token),
                    )
                }
            },
            _ => match lexeme.parse::<f64>() {
                Ok(value) => Literal::Real(value),
                Err(_) => {
                    return_syntax_error!(
                        MalformedNumber,
                        format!("Real literal '{lexeme}' is out of range"),
                        self.location_of(&token),
                    )
                }
            },
        };

        self.tokenizer.shift();
        Ok(self.push_node(NodeKind::Primary { literal }, &token))
    }
}
