use crate::compiler::ast::{
    accept, ComparisonOp, EqualityOp, FactorOp, Literal, NodeId, NodeKind, SyntaxTree,
    SyntaxVisitor, TermOp,
};
use crate::compiler::string_interning::StringTable;

/// Renders a syntax tree in the uppercase block format used for compiler
/// debugging (`--show-ast` style output). Also the simplest exerciser of
/// the visitor protocol.
pub struct ReferencePrinter<'a> {
    strings: &'a StringTable,
    out: String,
    tabs: usize,
    tab_size: usize,
}

impl<'a> ReferencePrinter<'a> {
    pub fn new(strings: &'a StringTable, tab_size: usize) -> ReferencePrinter<'a> {
        ReferencePrinter {
            strings,
            out: String::new(),
            tabs: 0,
            tab_size,
        }
    }

    pub fn render(mut self, tree: &SyntaxTree) -> String {
        if let Some(root) = tree.root {
            accept(tree, root, &mut self);
        }
        self.out
    }

    fn print_tabs(&mut self) {
        for _ in 0..self.tabs {
            self.out.push(' ');
        }
    }

    fn push_tabs(&mut self) {
        self.tabs += self.tab_size;
    }

    fn pop_tabs(&mut self) {
        self.tabs = self.tabs.saturating_sub(self.tab_size);
    }

    fn line(&mut self, text: &str) {
        self.print_tabs();
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn children(&mut self, tree: &SyntaxTree, children: &[NodeId]) {
        self.push_tabs();
        for &child in children {
            accept(tree, child, self);
        }
        self.pop_tabs();
    }
}

impl SyntaxVisitor for ReferencePrinter<'_> {
    fn visit_root(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Root { globals, main } = &tree.node(id).kind else {
            return;
        };
        self.line(&format!("ROOT {}", tree.path.display()));
        self.children(tree, globals);
        self.push_tabs();
        accept(tree, *main, self);
        self.pop_tabs();
        self.line("ENDROOT");
    }

    fn visit_module(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Module { globals } = &tree.node(id).kind else {
            return;
        };
        self.line(&format!("MODULE {}", tree.path.display()));
        self.children(tree, globals);
        self.line("ENDMODULE");
    }

    fn visit_main(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Main { children } = &tree.node(id).kind else {
            return;
        };
        self.line("BEGIN");
        self.children(tree, children);
        self.line("END");
    }

    fn visit_include_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::IncludeStatement { path, .. } = &tree.node(id).kind else {
            return;
        };
        self.line(&format!("INCLUDE {}", path.display()));
    }

    fn visit_parameter(&mut self, tree: &SyntaxTree, id: NodeId) {
        let node = tree.node(id);
        let NodeKind::Parameter { identifier } = &node.kind else {
            return;
        };
        self.out.push_str(&format!(
            "{} [TYPE: {}:{}:{}] ",
            self.strings.resolve(*identifier),
            node.datatype.describe(),
            node.structure.describe(),
            node.structure_length
        ));
    }

    fn visit_function_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        let node = tree.node(id);
        let NodeKind::FunctionStatement {
            identifier,
            parameters,
            children,
        } = &node.kind
        else {
            return;
        };

        self.print_tabs();
        self.out.push_str(&format!(
            "FUNCTION {} [TYPE: {}:{}:{}] ",
            self.strings.resolve(*identifier),
            node.datatype.describe(),
            node.structure.describe(),
            node.structure_length
        ));
        for &parameter in parameters {
            accept(tree, parameter, self);
        }
        self.out.push('\n');

        self.children(tree, children);
        self.line("ENDFUNCTION");
    }

    fn visit_procedure_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        let node = tree.node(id);
        let NodeKind::ProcedureStatement {
            identifier,
            parameters,
            children,
        } = &node.kind
        else {
            return;
        };

        self.print_tabs();
        self.out
            .push_str(&format!("PROCEDURE {} ", self.strings.resolve(*identifier)));
        for &parameter in parameters {
            accept(tree, parameter, self);
        }
        self.out.push('\n');

        self.children(tree, children);
        self.line("ENDPROCEDURE");
    }

    fn visit_expression_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::ExpressionStatement { expression } = &tree.node(id).kind else {
            return;
        };
        self.print_tabs();
        accept(tree, *expression, self);
        self.out.push_str(";\n");
    }

    fn visit_procedure_call_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::ProcedureCallStatement {
            identifier,
            arguments,
        } = &tree.node(id).kind
        else {
            return;
        };
        self.print_tabs();
        self.out
            .push_str(&format!("CALL {}(", self.strings.resolve(*identifier)));
        for (index, &argument) in arguments.iter().enumerate() {
            if index > 0 {
                self.out.push_str(", ");
            }
            accept(tree, argument, self);
        }
        self.out.push_str(");\n");
    }

    fn visit_while_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::WhileStatement {
            condition,
            children,
        } = &tree.node(id).kind
        else {
            return;
        };
        self.print_tabs();
        self.out.push_str("WHILE ");
        accept(tree, *condition, self);
        self.out.push('\n');
        self.children(tree, children);
        self.line("ENDWHILE");
    }

    fn visit_loop_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::LoopStatement {
            iterator,
            start,
            end,
            step,
            children,
        } = &tree.node(id).kind
        else {
            return;
        };
        self.print_tabs();
        self.out
            .push_str(&format!("LOOP {} ", self.strings.resolve(*iterator)));
        accept(tree, *start, self);
        self.out.push(' ');
        accept(tree, *end, self);
        if let Some(step) = step {
            self.out.push(' ');
            accept(tree, *step, self);
        }
        self.out.push('\n');
        self.children(tree, children);
        self.line("ENDLOOP");
    }

    fn visit_ploop_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::PloopStatement {
            iterator,
            start,
            end,
            step,
            children,
        } = &tree.node(id).kind
        else {
            return;
        };
        self.print_tabs();
        self.out
            .push_str(&format!("PLOOP {} ", self.strings.resolve(*iterator)));
        accept(tree, *start, self);
        self.out.push(' ');
        accept(tree, *end, self);
        if let Some(step) = step {
            self.out.push(' ');
            accept(tree, *step, self);
        }
        self.out.push('\n');
        self.children(tree, children);
        self.line("ENDPLOOP");
    }

    fn visit_variable_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        let node = tree.node(id);
        let NodeKind::VariableStatement {
            identifier,
            storage,
            dimensions,
            initializer,
        } = &node.kind
        else {
            return;
        };

        self.print_tabs();
        self.out.push_str(&format!(
            "VARIABLE [TYPE: {}:{}:{}] {} ",
            node.datatype.describe(),
            node.structure.describe(),
            node.structure_length,
            self.strings.resolve(*identifier)
        ));
        accept(tree, *storage, self);
        for &dimension in dimensions {
            self.out.push_str(" [");
            accept(tree, dimension, self);
            self.out.push(']');
        }
        if let Some(initializer) = initializer {
            self.out.push_str(" = ");
            accept(tree, *initializer, self);
        }
        self.out.push_str(";\n");
    }

    fn visit_scope_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::ScopeStatement { children } = &tree.node(id).kind else {
            return;
        };
        self.line("SCOPE");
        self.children(tree, children);
        self.line("ENDSCOPE");
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
        self.print_tabs();
        self.out.push_str("IF ");
        accept(tree, *condition, self);
        self.out.push('\n');
        self.children(tree, children);

        let mut link = *next;
        while let Some(current) = link {
            let NodeKind::ConditionalStatement {
                condition,
                children,
                next,
            } = &tree.node(current).kind
            else {
                break;
            };
            self.print_tabs();
            self.out.push_str("ELSEIF ");
            accept(tree, *condition, self);
            self.out.push('\n');
            self.children(tree, children);
            link = *next;
        }

        self.line("ENDIF");
    }

    fn visit_read_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::ReadStatement { unit, identifier } = &tree.node(id).kind else {
            return;
        };
        self.print_tabs();
        self.out.push_str("READ ");
        accept(tree, *unit, self);
        self.out
            .push_str(&format!(" TO {};\n", self.strings.resolve(*identifier)));
    }

    fn visit_write_statement(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::WriteStatement { expressions } = &tree.node(id).kind else {
            return;
        };
        self.print_tabs();
        self.out.push_str("WRITE");
        for &expression in expressions {
            self.out.push(' ');
            accept(tree, expression, self);
        }
        self.out.push_str(";\n");
    }

    fn visit_assignment(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Assignment { left, right } = &tree.node(id).kind else {
            return;
        };
        accept(tree, *left, self);
        self.out.push_str(" = ");
        accept(tree, *right, self);
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
        accept(tree, *left, self);
        self.out.push_str(match operation {
            EqualityOp::Equals => " == ",
            EqualityOp::NotEquals => " != ",
        });
        accept(tree, *right, self);
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
        accept(tree, *left, self);
        self.out.push_str(match operation {
            ComparisonOp::LessThan => " < ",
            ComparisonOp::LessThanEquals => " <= ",
            ComparisonOp::GreaterThan => " > ",
            ComparisonOp::GreaterThanEquals => " >= ",
        });
        accept(tree, *right, self);
    }

    fn visit_concatenation(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Concatenation { left, right } = &tree.node(id).kind else {
            return;
        };
        accept(tree, *left, self);
        self.out.push_str(" & ");
        accept(tree, *right, self);
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
        accept(tree, *left, self);
        self.out.push_str(match operation {
            TermOp::Addition => " + ",
            TermOp::Subtraction => " - ",
        });
        accept(tree, *right, self);
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
        accept(tree, *left, self);
        self.out.push_str(match operation {
            FactorOp::Multiplication => " * ",
            FactorOp::Division => " / ",
        });
        accept(tree, *right, self);
    }

    fn visit_magnitude(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Magnitude { left, right } = &tree.node(id).kind else {
            return;
        };
        accept(tree, *left, self);
        self.out.push_str(" ^ ");
        accept(tree, *right, self);
    }

    fn visit_extraction(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Extraction { left, right } = &tree.node(id).kind else {
            return;
        };
        accept(tree, *left, self);
        self.out.push_str(" | ");
        accept(tree, *right, self);
    }

    fn visit_derivation(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Derivation { left, right } = &tree.node(id).kind else {
            return;
        };
        accept(tree, *left, self);
        self.out.push_str(" % ");
        accept(tree, *right, self);
    }

    fn visit_unary(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Unary { operand } = &tree.node(id).kind else {
            return;
        };
        self.out.push('-');
        accept(tree, *operand, self);
    }

    fn visit_function_call(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::FunctionCall {
            identifier,
            arguments,
        } = &tree.node(id).kind
        else {
            return;
        };
        self.out
            .push_str(&format!("{}(", self.strings.resolve(*identifier)));
        for (index, &argument) in arguments.iter().enumerate() {
            if index > 0 {
                self.out.push_str(", ");
            }
            accept(tree, argument, self);
        }
        self.out.push(')');
    }

    fn visit_array_index(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::ArrayIndex {
            identifier,
            indices,
        } = &tree.node(id).kind
        else {
            return;
        };
        self.out
            .push_str(&format!("{}[", self.strings.resolve(*identifier)));
        for (index, &element) in indices.iter().enumerate() {
            if index > 0 {
                self.out.push_str(", ");
            }
            accept(tree, element, self);
        }
        self.out.push(']');
    }

    fn visit_primary(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Primary { literal } = &tree.node(id).kind else {
            return;
        };
        match literal {
            Literal::Integer(value) => self.out.push_str(&value.to_string()),
            Literal::Real(value) => self.out.push_str(&value.to_string()),
            Literal::Complex(value) => self.out.push_str(&format!("{value}i")),
            Literal::String(value) => self
                .out
                .push_str(&format!("'{}'", self.strings.resolve(*value))),
            Literal::Identifier(value) => self.out.push_str(self.strings.resolve(*value)),
        }
    }

    fn visit_grouping(&mut self, tree: &SyntaxTree, id: NodeId) {
        let NodeKind::Grouping { expression } = &tree.node(id).kind else {
            return;
        };
        self.out.push('(');
        accept(tree, *expression, self);
        self.out.push(')');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parser::parser::Parser;
    use crate::compiler::CompilationContext;
    use crate::settings::Config;

    #[test]
    fn renders_the_block_structure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.fox");
        std::fs::write(
            &path,
            "begin;\nvariable x 8 := 1 + 2;\nloop i 0 4;\nwrite 6 i x;\nendloop;\nend;\n",
        )
        .unwrap();

        let mut ctx = CompilationContext::new(Config::new(path.clone()));
        let entry = ctx.registry.create(&path).unwrap();
        let entry_path = ctx.registry.path(entry).to_path_buf();
        ctx.graph.set_entry(entry_path, entry);

        let parser = Parser::new(&mut ctx, entry).unwrap();
        let module = parser.parse_as_root(&mut ctx);
        assert!(module.parsed_clean(), "{:?}", ctx.messages.errors);

        let rendered = ReferencePrinter::new(&ctx.strings, 4).render(&module.tree);
        assert!(rendered.contains("BEGIN"));
        assert!(rendered.contains("VARIABLE [TYPE: integer:scalar:0] x 8 = 1 + 2;"));
        assert!(rendered.contains("LOOP i 0 4"));
        assert!(rendered.contains("WRITE 6 i x;"));
        assert!(rendered.contains("ENDLOOP"));
        assert!(rendered.contains("END"));
    }
}
