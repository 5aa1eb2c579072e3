use crate::compiler::ast::{Literal, NodeId, NodeKind, SyntaxTree};
use crate::compiler::compiler_messages::compiler_errors::{
    CompilerError, DiagnosticCode, ErrorLocation, ErrorType,
};
use crate::compiler::datatypes::{DataKind, StructureKind};
use crate::compiler::environment::SymbolEnvironment;
use crate::compiler::source_registry::SourceId;
use crate::compiler::string_interning::{StringId, StringTable};
use crate::compiler::symbols::{NodeRef, Symbol, SymbolKind};
use crate::compiler::ParsedModule;
use crate::eval_log;
use rustc_hash::{FxHashMap, FxHashSet};

/// The facts computed for one expression subtree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub datatype: DataKind,
    pub structure: StructureKind,
    pub length: i64,
}

impl Evaluation {
    fn new(datatype: DataKind, structure: StructureKind, length: i64) -> Evaluation {
        Evaluation {
            datatype,
            structure,
            length,
        }
    }

    fn scalar(datatype: DataKind) -> Evaluation {
        Evaluation::new(datatype, StructureKind::Scalar, 0)
    }

    fn error() -> Evaluation {
        Evaluation::new(DataKind::Error, StructureKind::Unknown, 0)
    }

    /// Operand element count for vector concatenation.
    fn element_count(&self) -> i64 {
        match self.structure {
            StructureKind::Vector => self.length,
            _ => 1,
        }
    }
}

/// The semantic evaluator. Walks expression subtrees bottom-up, stamping
/// (data kind, structure kind, structure length) into every node, resolves
/// identifier uses through the environment, and validates calls - typing
/// formal parameters from the call site and simulating the callee body the
/// way the original block validator does.
pub struct Validator<'a> {
    local: &'a mut SyntaxTree,
    env: &'a mut SymbolEnvironment,
    strings: &'a StringTable,
    modules: &'a mut FxHashMap<SourceId, ParsedModule>,
    recursion_reported: &'a mut FxHashSet<NodeRef>,

    /// Identifiers of callables whose bodies are open above us: seeded
    /// with the parser's in-progress callables, growing as call-site body
    /// validation descends.
    call_stack: Vec<StringId>,

    /// True while re-walking a callee body from a call site. Errors that
    /// do not depend on call-site types were already reported when that
    /// body was first parsed and are suppressed here.
    revalidating: bool,

    errors: Vec<CompilerError>,
}

impl<'a> Validator<'a> {
    pub fn new(
        local: &'a mut SyntaxTree,
        env: &'a mut SymbolEnvironment,
        strings: &'a StringTable,
        modules: &'a mut FxHashMap<SourceId, ParsedModule>,
        recursion_reported: &'a mut FxHashSet<NodeRef>,
        open_callables: &[StringId],
    ) -> Validator<'a> {
        Validator {
            local,
            env,
            strings,
            modules,
            recursion_reported,
            call_stack: open_callables.to_vec(),
            revalidating: false,
            errors: Vec::new(),
        }
    }

    /// Evaluate one expression of the local module.
    pub fn evaluate(&mut self, node: NodeId) -> Evaluation {
        let source = self.local.source;
        self.eval_at(NodeRef {
            module: source,
            node,
        })
    }

    pub fn take_errors(self) -> Vec<CompilerError> {
        self.errors
    }

    // --- Tree plumbing -------------------------------------------------------

    fn tree(&self, module: SourceId) -> &SyntaxTree {
        if module == self.local.source {
            self.local
        } else {
            &self.modules[&module].tree
        }
    }

    fn tree_mut(&mut self, module: SourceId) -> &mut SyntaxTree {
        if module == self.local.source {
            self.local
        } else {
            &mut self
                .modules
                .get_mut(&module)
                .expect("referenced module must be parsed")
                .tree
        }
    }

    fn kind_of(&self, at: NodeRef) -> NodeKind {
        self.tree(at.module).node(at.node).kind.clone()
    }

    fn location_of(&self, at: NodeRef) -> ErrorLocation {
        let tree = self.tree(at.module);
        let node = tree.node(at.node);
        ErrorLocation::new(tree.path.clone(), node.row, node.column)
    }

    fn stamp(&mut self, at: NodeRef, evaluation: Evaluation) {
        let node = self.tree_mut(at.module).node_mut(at.node);
        node.datatype = evaluation.datatype;
        node.structure = evaluation.structure;
        node.structure_length = evaluation.length;
    }

    fn report(&mut self, code: DiagnosticCode, msg: String, at: NodeRef) {
        if self.revalidating
            && !matches!(
                code,
                DiagnosticCode::KindMismatch
                    | DiagnosticCode::LengthMismatch
                    | DiagnosticCode::DirectRecursion
            )
        {
            return;
        }

        self.errors.push(CompilerError::new(
            code,
            msg,
            self.location_of(at),
            ErrorType::Semantic,
        ));
    }

    // --- Expression evaluation -----------------------------------------------

    fn eval_at(&mut self, at: NodeRef) -> Evaluation {
        let kind = self.kind_of(at);

        let evaluation = match kind {
            NodeKind::Primary { literal } => self.eval_primary(at, literal),
            NodeKind::Grouping { expression } => self.eval_at(at.with(expression)),
            NodeKind::Unary { operand } => self.eval_unary(at, operand),

            NodeKind::Term { left, right, .. }
            | NodeKind::Factor { left, right, .. }
            | NodeKind::Magnitude { left, right }
            | NodeKind::Extraction { left, right }
            | NodeKind::Derivation { left, right } => self.eval_binary_numeric(at, left, right),

            NodeKind::Equality { left, right, .. } | NodeKind::Comparison { left, right, .. } => {
                self.eval_relational(at, left, right)
            }

            NodeKind::Concatenation { left, right } => self.eval_concatenation(at, left, right),
            NodeKind::Assignment { left, right } => self.eval_assignment(at, left, right),
            NodeKind::FunctionCall {
                identifier,
                ref arguments,
            } => self.eval_call(at, identifier, arguments),
            NodeKind::ArrayIndex {
                identifier,
                ref indices,
            } => self.eval_index(at, identifier, indices),
            NodeKind::ProcedureCallStatement {
                identifier,
                ref arguments,
            } => self.eval_procedure_call(at, identifier, arguments),

            _ => Evaluation::new(DataKind::Unknown, StructureKind::Unknown, 0),
        };

        eval_log!(
            "eval -> ",
            evaluation.datatype.describe(),
            ":",
            evaluation.structure.describe()
        );
        self.stamp(at, evaluation);
        evaluation
    }

    fn eval_primary(&mut self, at: NodeRef, literal: Literal) -> Evaluation {
        match literal {
            Literal::Integer(_) => Evaluation::scalar(DataKind::Integer),
            Literal::Real(_) => Evaluation::scalar(DataKind::Real),
            Literal::Complex(_) => Evaluation::scalar(DataKind::Complex),
            Literal::String(id) => Evaluation::new(
                DataKind::String,
                StructureKind::String,
                self.strings.resolve(id).len() as i64,
            ),
            Literal::Identifier(identifier) => {
                let Some(symbol) = self.env.get(self.strings, identifier) else {
                    self.report(
                        DiagnosticCode::UndeclaredIdentifier,
                        format!("'{}' is not declared", self.strings.resolve(identifier)),
                        at,
                    );
                    return Evaluation::error();
                };

                let defining = symbol.node;
                let node = self.tree(defining.module).node(defining.node);
                Evaluation::new(node.datatype, node.structure, node.structure_length)
            }
        }
    }

    fn eval_unary(&mut self, at: NodeRef, operand: NodeId) -> Evaluation {
        let inner = self.eval_at(at.with(operand));
        if inner.datatype == DataKind::Error {
            return Evaluation::error();
        }

        if !inner.datatype.is_numeric() && inner.datatype != DataKind::Unknown {
            self.report(
                DiagnosticCode::KindMismatch,
                format!("Cannot negate a {} value", inner.datatype.describe()),
                at,
            );
            return Evaluation::error();
        }

        inner
    }

    /// Element-wise binary operators over the numeric kinds. Vector
    /// operands must agree in length; a scalar operand broadcasts.
    fn eval_binary_numeric(&mut self, at: NodeRef, left: NodeId, right: NodeId) -> Evaluation {
        let l = self.eval_at(at.with(left));
        let r = self.eval_at(at.with(right));
        if l.datatype == DataKind::Error || r.datatype == DataKind::Error {
            return Evaluation::error();
        }

        let datatype = l.datatype.promote(r.datatype);
        if datatype == DataKind::Error {
            self.report(
                DiagnosticCode::KindMismatch,
                format!(
                    "Operands of kind {} and {} cannot be combined",
                    l.datatype.describe(),
                    r.datatype.describe()
                ),
                at,
            );
            return Evaluation::error();
        }

        match (l.structure, r.structure) {
            (StructureKind::Vector, StructureKind::Vector) => {
                if l.length > 0 && r.length > 0 && l.length != r.length {
                    self.report(
                        DiagnosticCode::LengthMismatch,
                        format!(
                            "Vector operands have different lengths ({} and {})",
                            l.length, r.length
                        ),
                        at,
                    );
                    return Evaluation::error();
                }
                Evaluation::new(datatype, StructureKind::Vector, l.length.max(r.length))
            }
            (StructureKind::Vector, _) => Evaluation::new(datatype, StructureKind::Vector, l.length),
            (_, StructureKind::Vector) => Evaluation::new(datatype, StructureKind::Vector, r.length),
            _ => Evaluation::scalar(datatype),
        }
    }

    /// `=`, `#` and the ordering operators produce an integer truth value.
    fn eval_relational(&mut self, at: NodeRef, left: NodeId, right: NodeId) -> Evaluation {
        let l = self.eval_at(at.with(left));
        let r = self.eval_at(at.with(right));
        if l.datatype == DataKind::Error || r.datatype == DataKind::Error {
            return Evaluation::error();
        }

        if l.datatype.promote(r.datatype) == DataKind::Error {
            self.report(
                DiagnosticCode::KindMismatch,
                format!(
                    "Cannot compare {} with {}",
                    l.datatype.describe(),
                    r.datatype.describe()
                ),
                at,
            );
            return Evaluation::error();
        }

        Evaluation::scalar(DataKind::Integer)
    }

    /// `&`: string concatenation (a string left stringifies the right),
    /// or numeric vector concatenation with summed lengths. Complex
    /// vectors are rejected.
    fn eval_concatenation(&mut self, at: NodeRef, left: NodeId, right: NodeId) -> Evaluation {
        let l = self.eval_at(at.with(left));
        let r = self.eval_at(at.with(right));
        if l.datatype == DataKind::Error || r.datatype == DataKind::Error {
            return Evaluation::error();
        }

        if l.datatype == DataKind::String {
            // Left-string concatenation casts the right side to string.
            if r.datatype == DataKind::Void {
                self.report(
                    DiagnosticCode::KindMismatch,
                    "Cannot concatenate a void value onto a string".to_string(),
                    at,
                );
                return Evaluation::error();
            }
            return Evaluation::new(DataKind::String, StructureKind::String, 0);
        }

        // Numeric (or still-unknown) operands concatenate into a vector
        // whose length is the sum of the operand element counts.
        let left_numericish = l.datatype.is_numeric() || l.datatype == DataKind::Unknown;
        let right_numericish = r.datatype.is_numeric() || r.datatype == DataKind::Unknown;
        if left_numericish && right_numericish {
            if l.datatype == DataKind::Complex || r.datatype == DataKind::Complex {
                self.report(
                    DiagnosticCode::KindMismatch,
                    "Complex values cannot be concatenated into a vector".to_string(),
                    at,
                );
                return Evaluation::error();
            }

            let datatype = l.datatype.promote(r.datatype);
            return Evaluation::new(
                datatype,
                StructureKind::Vector,
                l.element_count() + r.element_count(),
            );
        }

        if l.datatype == DataKind::Unknown || r.datatype == DataKind::Unknown {
            return Evaluation::new(DataKind::Unknown, StructureKind::Unknown, 0);
        }

        self.report(
            DiagnosticCode::KindMismatch,
            format!(
                "Cannot concatenate {} with {}",
                l.datatype.describe(),
                r.datatype.describe()
            ),
            at,
        );
        Evaluation::error()
    }

    /// Assignment stamps the right side's kind onto the target's defining
    /// node, so a variable's emitted type reflects everything assigned to
    /// it. The assignment itself yields the assigned value.
    fn eval_assignment(&mut self, at: NodeRef, left: NodeId, right: NodeId) -> Evaluation {
        let target = self.eval_at(at.with(left));
        let value = self.eval_at(at.with(right));
        if value.datatype == DataKind::Error {
            return Evaluation::error();
        }

        let target_identifier = match self.kind_of(at.with(left)) {
            NodeKind::Primary {
                literal: Literal::Identifier(identifier),
            } => Some((identifier, false)),
            NodeKind::ArrayIndex { identifier, .. } => Some((identifier, true)),
            _ => None,
        };

        if target.datatype != DataKind::Unknown
            && target.datatype != DataKind::Error
            && target.datatype.promote(value.datatype) == DataKind::Error
        {
            self.report(
                DiagnosticCode::KindMismatch,
                format!(
                    "Cannot assign a {} value to a {} target",
                    value.datatype.describe(),
                    target.datatype.describe()
                ),
                at,
            );
            return Evaluation::error();
        }

        if let Some((identifier, indexed)) = target_identifier
            && let Some(symbol) = self.env.get(self.strings, identifier)
        {
            let defining = symbol.node;
            let symbol_kind = symbol.kind;
            let previous = self.tree(defining.module).node(defining.node).datatype;
            let promoted = previous.promote(value.datatype);
            let stamped = if promoted == DataKind::Error {
                value.datatype
            } else {
                promoted
            };

            let node = self.tree_mut(defining.module).node_mut(defining.node);
            node.datatype = stamped;

            // A scalar target takes on the assigned structure as well;
            // indexed element writes leave the array's shape alone.
            if !indexed && symbol_kind == SymbolKind::Variable {
                if value.structure != StructureKind::Unknown {
                    node.structure = value.structure;
                    node.structure_length = value.length;
                }
            }
        }

        value
    }

    fn eval_index(&mut self, at: NodeRef, identifier: StringId, indices: &[NodeId]) -> Evaluation {
        let Some(symbol) = self.env.get(self.strings, identifier).copied() else {
            self.report(
                DiagnosticCode::UndeclaredIdentifier,
                format!("'{}' is not declared", self.strings.resolve(identifier)),
                at,
            );
            return Evaluation::error();
        };

        if symbol.kind != SymbolKind::Array || symbol.arity == 0 {
            self.report(
                DiagnosticCode::NotAnArray,
                format!(
                    "'{}' is not an array and cannot be indexed",
                    self.strings.resolve(identifier)
                ),
                at,
            );
            return Evaluation::error();
        }

        if indices.len() as u32 != symbol.arity {
            self.report(
                DiagnosticCode::ArityMismatch,
                format!(
                    "'{}' has rank {} but {} indices were supplied",
                    self.strings.resolve(identifier),
                    symbol.arity,
                    indices.len()
                ),
                at,
            );
            return Evaluation::error();
        }

        let mut failed = false;
        for &index in indices {
            let evaluated = self.eval_at(at.with(index));
            if !matches!(
                evaluated.datatype,
                DataKind::Integer | DataKind::Unknown | DataKind::Error
            ) {
                self.report(
                    DiagnosticCode::KindMismatch,
                    format!(
                        "Array indices must be integers, found {}",
                        evaluated.datatype.describe()
                    ),
                    at.with(index),
                );
                failed = true;
            }
        }
        if failed {
            return Evaluation::error();
        }

        let element = self.tree(symbol.node.module).node(symbol.node.node).datatype;
        Evaluation::scalar(element)
    }

    fn eval_call(&mut self, at: NodeRef, identifier: StringId, arguments: &[NodeId]) -> Evaluation {
        let Some(symbol) = self.env.get(self.strings, identifier).copied() else {
            self.report(
                DiagnosticCode::UndeclaredIdentifier,
                format!("'{}' is not declared", self.strings.resolve(identifier)),
                at,
            );
            return Evaluation::error();
        };

        match symbol.kind {
            SymbolKind::Function => {}
            SymbolKind::Procedure => {
                self.report(
                    DiagnosticCode::KindMismatch,
                    format!(
                        "'{}' is a procedure and yields no value",
                        self.strings.resolve(identifier)
                    ),
                    at,
                );
                return Evaluation::error();
            }
            _ => {
                self.report(
                    DiagnosticCode::KindMismatch,
                    format!(
                        "'{}' is not callable",
                        self.strings.resolve(identifier)
                    ),
                    at,
                );
                return Evaluation::error();
            }
        }

        if self.check_call_shape(at, &symbol, arguments).is_err() {
            return Evaluation::error();
        }

        self.validate_callable_body(at, identifier, &symbol, arguments);

        let node = self.tree(symbol.node.module).node(symbol.node.node);
        Evaluation::new(node.datatype, node.structure, node.structure_length)
    }

    fn eval_procedure_call(
        &mut self,
        at: NodeRef,
        identifier: StringId,
        arguments: &[NodeId],
    ) -> Evaluation {
        let Some(symbol) = self.env.get(self.strings, identifier).copied() else {
            self.report(
                DiagnosticCode::UndeclaredIdentifier,
                format!("'{}' is not declared", self.strings.resolve(identifier)),
                at,
            );
            return Evaluation::error();
        };

        if symbol.kind != SymbolKind::Procedure {
            self.report(
                DiagnosticCode::KindMismatch,
                format!(
                    "'{}' is not a procedure",
                    self.strings.resolve(identifier)
                ),
                at,
            );
            return Evaluation::error();
        }

        if self.check_call_shape(at, &symbol, arguments).is_err() {
            return Evaluation::error();
        }

        self.validate_callable_body(at, identifier, &symbol, arguments);
        Evaluation::new(DataKind::Void, StructureKind::Unknown, 0)
    }

    /// Arity check plus argument evaluation and parameter typing. The
    /// formal parameter kind is the promotion of every argument kind seen
    /// so far across call sites.
    fn check_call_shape(
        &mut self,
        at: NodeRef,
        symbol: &Symbol,
        arguments: &[NodeId],
    ) -> Result<(), ()> {
        if arguments.len() as u32 != symbol.arity {
            self.report(
                DiagnosticCode::ArityMismatch,
                format!(
                    "'{}' takes {} arguments but {} were supplied",
                    self.strings.resolve(symbol.identifier),
                    symbol.arity,
                    arguments.len()
                ),
                at,
            );
            return Err(());
        }

        let parameters = match self.kind_of(symbol.node) {
            NodeKind::FunctionStatement { parameters, .. }
            | NodeKind::ProcedureStatement { parameters, .. } => parameters,
            _ => return Err(()),
        };

        let mut failed = false;
        for (index, &argument) in arguments.iter().enumerate() {
            let evaluated = self.eval_at(at.with(argument));
            if evaluated.datatype == DataKind::Error {
                failed = true;
                continue;
            }

            let parameter = symbol.node.with(parameters[index]);
            let formal = self.tree(parameter.module).node(parameter.node).datatype;
            let widened = formal.promote(evaluated.datatype);
            if widened == DataKind::Error {
                self.report(
                    DiagnosticCode::KindMismatch,
                    format!(
                        "Argument {} of '{}' is {} but the parameter is {}",
                        index + 1,
                        self.strings.resolve(symbol.identifier),
                        evaluated.datatype.describe(),
                        formal.describe()
                    ),
                    at.with(argument),
                );
                failed = true;
                continue;
            }

            let node = self.tree_mut(parameter.module).node_mut(parameter.node);
            node.datatype = widened;
            node.structure = evaluated.structure;
            node.structure_length = evaluated.length;
        }

        if failed { Err(()) } else { Ok(()) }
    }

    /// Simulate the callee's body with the freshly typed parameters so the
    /// return kind reflects this call. A callable already on the stack is
    /// direct recursion: diagnosed once, body skipped.
    fn validate_callable_body(
        &mut self,
        at: NodeRef,
        identifier: StringId,
        symbol: &Symbol,
        _arguments: &[NodeId],
    ) {
        if self.call_stack.contains(&identifier) {
            if self.recursion_reported.insert(symbol.node) {
                self.report(
                    DiagnosticCode::DirectRecursion,
                    format!(
                        "'{}' calls itself; recursion is not supported",
                        self.strings.resolve(identifier)
                    ),
                    at,
                );
            }
            return;
        }

        let (parameters, children) = match self.kind_of(symbol.node) {
            NodeKind::FunctionStatement {
                parameters,
                children,
                ..
            }
            | NodeKind::ProcedureStatement {
                parameters,
                children,
                ..
            } => (parameters, children),
            _ => return,
        };

        self.env.push_scope();
        for &parameter in &parameters {
            let NodeKind::Parameter {
                identifier: parameter_name,
            } = self.kind_of(symbol.node.with(parameter))
            else {
                continue;
            };
            if !self.env.exists_locally(self.strings, parameter_name) {
                self.env.insert_locally(
                    self.strings,
                    Symbol::new(
                        parameter_name,
                        SymbolKind::Variable,
                        0,
                        symbol.node.with(parameter),
                    ),
                );
            }
        }

        self.call_stack.push(identifier);
        let was_revalidating = self.revalidating;
        self.revalidating = true;
        for &child in &children {
            self.validate_statement(symbol.node.with(child));
        }
        self.revalidating = was_revalidating;
        self.call_stack.pop();
        self.env.pop_scope();
    }

    // --- Statement-level validation (callee body simulation) -----------------

    fn validate_statement(&mut self, at: NodeRef) {
        match self.kind_of(at) {
            NodeKind::VariableStatement {
                identifier,
                initializer,
                dimensions,
                ..
            } => {
                let evaluated = initializer.map(|init| self.eval_at(at.with(init)));

                if let Some(evaluation) = evaluated
                    && evaluation.datatype != DataKind::Error
                {
                    let node = self.tree_mut(at.module).node_mut(at.node);
                    node.datatype = node.datatype.promote(evaluation.datatype);
                }

                if !self.env.exists_locally(self.strings, identifier) {
                    let kind = if dimensions.is_empty() {
                        SymbolKind::Variable
                    } else {
                        SymbolKind::Array
                    };
                    self.env.insert_locally(
                        self.strings,
                        Symbol::new(identifier, kind, dimensions.len() as u32, at),
                    );
                }
            }

            NodeKind::ExpressionStatement { expression } => {
                self.eval_at(at.with(expression));
            }

            NodeKind::ProcedureCallStatement { .. } => {
                self.eval_at(at);
            }

            NodeKind::WhileStatement {
                condition,
                children,
            } => {
                self.eval_at(at.with(condition));
                self.env.push_scope();
                for &child in &children {
                    self.validate_statement(at.with(child));
                }
                self.env.pop_scope();
            }

            NodeKind::ConditionalStatement {
                condition,
                children,
                next,
            } => {
                self.eval_at(at.with(condition));
                self.env.push_scope();
                for &child in &children {
                    self.validate_statement(at.with(child));
                }
                self.env.pop_scope();
                if let Some(next) = next {
                    self.validate_statement(at.with(next));
                }
            }

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
            } => {
                self.eval_at(at.with(start));
                self.eval_at(at.with(end));
                if let Some(step) = step {
                    self.eval_at(at.with(step));
                }

                self.env.push_scope();
                if !self.env.exists_locally(self.strings, iterator) {
                    self.env.insert_locally(
                        self.strings,
                        Symbol::new(iterator, SymbolKind::Variable, 0, at),
                    );
                }
                for &child in &children {
                    self.validate_statement(at.with(child));
                }
                self.env.pop_scope();
            }

            NodeKind::ScopeStatement { children } => {
                self.env.push_scope();
                for &child in &children {
                    self.validate_statement(at.with(child));
                }
                self.env.pop_scope();
            }

            NodeKind::WriteStatement { expressions } => {
                for &expression in &expressions {
                    self.eval_at(at.with(expression));
                }
            }

            NodeKind::ReadStatement { unit, .. } => {
                self.eval_at(at.with(unit));
            }

            NodeKind::FunctionStatement {
                identifier,
                parameters,
                ..
            } => {
                // Nested callable: make it resolvable, validate at calls.
                if !self.env.exists_locally(self.strings, identifier) {
                    self.env.insert_locally(
                        self.strings,
                        Symbol::new(
                            identifier,
                            SymbolKind::Function,
                            parameters.len() as u32,
                            at,
                        ),
                    );
                }
            }

            NodeKind::ProcedureStatement {
                identifier,
                parameters,
                ..
            } => {
                if !self.env.exists_locally(self.strings, identifier) {
                    self.env.insert_locally(
                        self.strings,
                        Symbol::new(
                            identifier,
                            SymbolKind::Procedure,
                            parameters.len() as u32,
                            at,
                        ),
                    );
                }
            }

            _ => {}
        }
    }
}

impl NodeRef {
    /// Another node in the same module's arena.
    pub(crate) fn with(self, node: NodeId) -> NodeRef {
        NodeRef {
            module: self.module,
            node,
        }
    }
}
