use crate::compiler::datatypes::{DataKind, StructureKind};
use crate::compiler::source_registry::SourceId;
use crate::compiler::string_interning::StringId;
use std::path::PathBuf;

/// Index into a parser's node arena. Node identity is only meaningful
/// together with the tree that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn from_usize(index: usize) -> NodeId {
        NodeId(index as u32)
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqualityOp {
    Equals,
    NotEquals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    LessThan,
    LessThanEquals,
    GreaterThan,
    GreaterThanEquals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermOp {
    Addition,
    Subtraction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorOp {
    Multiplication,
    Division,
}

/// Primary literal payloads. Complex literals are a numeric magnitude with
/// an adjacent `i` suffix; only the imaginary part is stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Integer(i64),
    Real(f64),
    Complex(f64),
    String(StringId),
    Identifier(StringId),
}

/// One variant per construct of the grammar. Children are arena indices;
/// the parent logically owns them, and the arena keeps every node alive
/// for the parser's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root {
        globals: Vec<NodeId>,
        main: NodeId,
    },
    Module {
        globals: Vec<NodeId>,
    },
    Main {
        children: Vec<NodeId>,
    },
    IncludeStatement {
        path: PathBuf,
        /// The included module's source handle once its parse succeeded.
        module: Option<SourceId>,
    },
    Parameter {
        identifier: StringId,
    },
    FunctionStatement {
        identifier: StringId,
        parameters: Vec<NodeId>,
        children: Vec<NodeId>,
    },
    ProcedureStatement {
        identifier: StringId,
        parameters: Vec<NodeId>,
        children: Vec<NodeId>,
    },
    ExpressionStatement {
        expression: NodeId,
    },
    ProcedureCallStatement {
        identifier: StringId,
        arguments: Vec<NodeId>,
    },
    WhileStatement {
        condition: NodeId,
        children: Vec<NodeId>,
    },
    LoopStatement {
        iterator: StringId,
        start: NodeId,
        end: NodeId,
        step: Option<NodeId>,
        children: Vec<NodeId>,
    },
    /// Parallel loop; no parallel semantics are defined yet, so it carries
    /// the same shape as a counted loop and is emitted as one.
    PloopStatement {
        iterator: StringId,
        start: NodeId,
        end: NodeId,
        step: Option<NodeId>,
        children: Vec<NodeId>,
    },
    VariableStatement {
        identifier: StringId,
        storage: NodeId,
        dimensions: Vec<NodeId>,
        initializer: Option<NodeId>,
    },
    ScopeStatement {
        children: Vec<NodeId>,
    },
    ConditionalStatement {
        condition: NodeId,
        children: Vec<NodeId>,
        /// The elseif chain, each link another conditional.
        next: Option<NodeId>,
    },
    ReadStatement {
        unit: NodeId,
        identifier: StringId,
    },
    WriteStatement {
        expressions: Vec<NodeId>,
    },
    Assignment {
        left: NodeId,
        right: NodeId,
    },
    Equality {
        operation: EqualityOp,
        left: NodeId,
        right: NodeId,
    },
    Comparison {
        operation: ComparisonOp,
        left: NodeId,
        right: NodeId,
    },
    Concatenation {
        left: NodeId,
        right: NodeId,
    },
    Term {
        operation: TermOp,
        left: NodeId,
        right: NodeId,
    },
    Factor {
        operation: FactorOp,
        left: NodeId,
        right: NodeId,
    },
    Magnitude {
        left: NodeId,
        right: NodeId,
    },
    Extraction {
        left: NodeId,
        right: NodeId,
    },
    Derivation {
        left: NodeId,
        right: NodeId,
    },
    Unary {
        operand: NodeId,
    },
    FunctionCall {
        identifier: StringId,
        arguments: Vec<NodeId>,
    },
    ArrayIndex {
        identifier: StringId,
        indices: Vec<NodeId>,
    },
    Primary {
        literal: Literal,
    },
    Grouping {
        expression: NodeId,
    },
}

/// A node plus the semantic facts validation stamps onto it.
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub row: u32,
    pub column: u32,
    pub datatype: DataKind,
    pub structure: StructureKind,
    pub structure_length: i64,
}

impl SyntaxNode {
    pub fn new(kind: NodeKind, row: u32, column: u32) -> SyntaxNode {
        SyntaxNode {
            kind,
            row,
            column,
            datatype: DataKind::Unknown,
            structure: StructureKind::Unknown,
            structure_length: 0,
        }
    }
}

/// The per-module node arena. The parser pushes every node it creates
/// here, so a tree's lifetime is exactly its arena's.
#[derive(Debug)]
pub struct SyntaxTree {
    pub source: SourceId,
    pub path: PathBuf,
    nodes: Vec<SyntaxNode>,
    pub root: Option<NodeId>,
}

impl SyntaxTree {
    pub fn new(source: SourceId, path: PathBuf) -> SyntaxTree {
        SyntaxTree {
            source,
            path,
            nodes: Vec::new(),
            root: None,
        }
    }

    pub fn push(&mut self, node: SyntaxNode) -> NodeId {
        let id = NodeId::from_usize(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.as_usize()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SyntaxNode {
        &mut self.nodes[id.as_usize()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every node in creation order, with its id.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SyntaxNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId::from_usize(index), node))
    }
}

/// Double-dispatch surface for read-only traversals. Implementors override
/// the variants they care about; everything else defaults to a no-op, so a
/// visitor drives its own recursion through [`accept`].
#[allow(unused_variables)]
pub trait SyntaxVisitor {
    fn visit_root(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_module(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_main(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_include_statement(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_parameter(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_function_statement(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_procedure_statement(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_expression_statement(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_procedure_call_statement(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_while_statement(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_loop_statement(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_ploop_statement(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_variable_statement(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_scope_statement(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_conditional_statement(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_read_statement(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_write_statement(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_assignment(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_equality(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_comparison(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_concatenation(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_term(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_factor(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_magnitude(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_extraction(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_derivation(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_unary(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_function_call(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_array_index(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_primary(&mut self, tree: &SyntaxTree, id: NodeId) {}
    fn visit_grouping(&mut self, tree: &SyntaxTree, id: NodeId) {}
}

/// Dispatch a node to the visitor method for its variant.
pub fn accept(tree: &SyntaxTree, id: NodeId, visitor: &mut dyn SyntaxVisitor) {
    match tree.node(id).kind {
        NodeKind::Root { .. } => visitor.visit_root(tree, id),
        NodeKind::Module { .. } => visitor.visit_module(tree, id),
        NodeKind::Main { .. } => visitor.visit_main(tree, id),
        NodeKind::IncludeStatement { .. } => visitor.visit_include_statement(tree, id),
        NodeKind::Parameter { .. } => visitor.visit_parameter(tree, id),
        NodeKind::FunctionStatement { .. } => visitor.visit_function_statement(tree, id),
        NodeKind::ProcedureStatement { .. } => visitor.visit_procedure_statement(tree, id),
        NodeKind::ExpressionStatement { .. } => visitor.visit_expression_statement(tree, id),
        NodeKind::ProcedureCallStatement { .. } => {
            visitor.visit_procedure_call_statement(tree, id)
        }
        NodeKind::WhileStatement { .. } => visitor.visit_while_statement(tree, id),
        NodeKind::LoopStatement { .. } => visitor.visit_loop_statement(tree, id),
        NodeKind::PloopStatement { .. } => visitor.visit_ploop_statement(tree, id),
        NodeKind::VariableStatement { .. } => visitor.visit_variable_statement(tree, id),
        NodeKind::ScopeStatement { .. } => visitor.visit_scope_statement(tree, id),
        NodeKind::ConditionalStatement { .. } => visitor.visit_conditional_statement(tree, id),
        NodeKind::ReadStatement { .. } => visitor.visit_read_statement(tree, id),
        NodeKind::WriteStatement { .. } => visitor.visit_write_statement(tree, id),
        NodeKind::Assignment { .. } => visitor.visit_assignment(tree, id),
        NodeKind::Equality { .. } => visitor.visit_equality(tree, id),
        NodeKind::Comparison { .. } => visitor.visit_comparison(tree, id),
        NodeKind::Concatenation { .. } => visitor.visit_concatenation(tree, id),
        NodeKind::Term { .. } => visitor.visit_term(tree, id),
        NodeKind::Factor { .. } => visitor.visit_factor(tree, id),
        NodeKind::Magnitude { .. } => visitor.visit_magnitude(tree, id),
        NodeKind::Extraction { .. } => visitor.visit_extraction(tree, id),
        NodeKind::Derivation { .. } => visitor.visit_derivation(tree, id),
        NodeKind::Unary { .. } => visitor.visit_unary(tree, id),
        NodeKind::FunctionCall { .. } => visitor.visit_function_call(tree, id),
        NodeKind::ArrayIndex { .. } => visitor.visit_array_index(tree, id),
        NodeKind::Primary { .. } => visitor.visit_primary(tree, id),
        NodeKind::Grouping { .. } => visitor.visit_grouping(tree, id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_tree() -> SyntaxTree {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ast.fox");
        std::fs::write(&path, "").unwrap();
        let mut registry = crate::compiler::source_registry::SourceRegistry::new(None);
        let source = registry.create(&path).unwrap();
        SyntaxTree::new(source, path)
    }

    #[derive(Default)]
    struct CountingVisitor {
        primaries: usize,
        terms: usize,
    }

    impl SyntaxVisitor for CountingVisitor {
        fn visit_term(&mut self, tree: &SyntaxTree, id: NodeId) {
            self.terms += 1;
            if let NodeKind::Term { left, right, .. } = tree.node(id).kind {
                accept(tree, left, self);
                accept(tree, right, self);
            }
        }

        fn visit_primary(&mut self, _tree: &SyntaxTree, _id: NodeId) {
            self.primaries += 1;
        }
    }

    #[test]
    fn accept_dispatches_by_variant_with_noop_defaults() {
        let mut tree = test_tree();
        let one = tree.push(SyntaxNode::new(
            NodeKind::Primary {
                literal: Literal::Integer(1),
            },
            1,
            1,
        ));
        let two = tree.push(SyntaxNode::new(
            NodeKind::Primary {
                literal: Literal::Integer(2),
            },
            1,
            5,
        ));
        let sum = tree.push(SyntaxNode::new(
            NodeKind::Term {
                operation: TermOp::Addition,
                left: one,
                right: two,
            },
            1,
            3,
        ));
        // A node the visitor does not override: dispatch must be a no-op.
        let grouping = tree.push(SyntaxNode::new(NodeKind::Grouping { expression: sum }, 1, 1));

        let mut visitor = CountingVisitor::default();
        accept(&tree, sum, &mut visitor);
        accept(&tree, grouping, &mut visitor);

        assert_eq!(visitor.terms, 1);
        assert_eq!(visitor.primaries, 2);
    }

    #[test]
    fn nodes_default_to_unknown_semantics() {
        let mut tree = test_tree();
        let id = tree.push(SyntaxNode::new(
            NodeKind::Primary {
                literal: Literal::Real(2.5),
            },
            3,
            7,
        ));

        let node = tree.node(id);
        assert_eq!(node.datatype, DataKind::Unknown);
        assert_eq!(node.structure, StructureKind::Unknown);
        assert_eq!((node.row, node.column), (3, 7));
    }
}
