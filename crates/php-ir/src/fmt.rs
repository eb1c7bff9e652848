//! PHP-like pretty printer for the IR.
//!
//! The output is meant for reading and for test snapshots, not for
//! reproducing the source: layout is normalized, trivia is dropped and
//! string values are quoted again from their interpreted form.

use std::fmt;

use crate::ir::*;

const INDENT: &str = "    ";

/// Print a node as it would appear in an expression or statement position.
pub fn print(node: &Node) -> String {
    let mut printer = Printer::default();
    printer.node(node);
    printer.out
}

/// Print a whole file, starting with `<?php`.
pub fn print_root(root: &Root) -> String {
    let mut printer = Printer::default();
    printer.root(root);
    printer.out
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&print(self))
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&print_root(self))
    }
}

#[derive(Default)]
struct Printer {
    out: String,
    depth: usize,
}

impl Printer {
    fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
    }

    fn join<T>(&mut self, items: &[T], glue: &str, mut print: impl FnMut(&mut Self, &T)) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.write(glue);
            }
            print(self, item);
        }
    }

    fn nodes(&mut self, nodes: &[Node], glue: &str) {
        self.join(nodes, glue, Self::node);
    }

    // =========================================================================
    // Blocks
    // =========================================================================

    fn root(&mut self, root: &Root) {
        self.write("<?php");
        self.stmts(&root.stmts);
        self.out.push('\n');
    }

    /// Each statement on its own line at the current depth.
    fn stmts(&mut self, stmts: &[Node]) {
        for stmt in stmts {
            self.newline();
            self.node(stmt);
        }
    }

    fn indented(&mut self, stmts: &[Node]) {
        self.depth += 1;
        self.stmts(stmts);
        self.depth -= 1;
    }

    /// `{}` or a brace block with one indented statement per line.
    fn block(&mut self, stmts: &[Node]) {
        self.write("{");
        self.indented(stmts);
        if !stmts.is_empty() {
            self.newline();
        }
        self.write("}");
    }

    /// The body of a control statement, after its header.
    fn body(&mut self, stmt: &Node) {
        match stmt {
            Node::StmtList(list) => {
                self.write(" ");
                self.block(&list.stmts);
            }
            Node::NopStmt(_) => self.write(";"),
            other => {
                self.depth += 1;
                self.newline();
                self.node(other);
                self.depth -= 1;
            }
        }
    }

    /// The body of an alternative-syntax statement, after its `:`.
    fn alt_body(&mut self, stmt: &Node) {
        match stmt {
            Node::StmtList(list) => self.indented(&list.stmts),
            other => self.indented(std::slice::from_ref(other)),
        }
    }

    fn alt_end(&mut self, keyword: &str) {
        self.newline();
        self.write(keyword);
        self.write(";");
    }

    // =========================================================================
    // Leaves and typed children
    // =========================================================================

    fn identifier(&mut self, identifier: &Identifier) {
        self.write(&identifier.value);
    }

    fn modifiers(&mut self, modifiers: &[Identifier]) {
        for modifier in modifiers {
            self.identifier(modifier);
            self.write(" ");
        }
    }

    fn simple_var(&mut self, var: &SimpleVar) {
        self.write("$");
        self.write(&var.name);
    }

    fn arguments(&mut self, list: &ArgumentList) {
        self.write("(");
        self.join(&list.arguments, ", ", Self::argument);
        self.write(")");
    }

    fn argument(&mut self, argument: &Argument) {
        if argument.variadic {
            self.write("...");
        }
        if argument.is_reference {
            self.write("&");
        }
        self.node(&argument.expr);
    }

    fn parameters(&mut self, params: &[Parameter]) {
        self.write("(");
        self.join(params, ", ", Self::parameter);
        self.write(")");
    }

    fn parameter(&mut self, param: &Parameter) {
        if let Some(variable_type) = &param.variable_type {
            self.node(variable_type);
            self.write(" ");
        }
        if param.by_ref {
            self.write("&");
        }
        if param.variadic {
            self.write("...");
        }
        self.simple_var(&param.variable);
        if let Some(default) = &param.default_value {
            self.write(" = ");
            self.node(default);
        }
    }

    fn return_type(&mut self, return_type: &Option<Box<Node>>) {
        if let Some(return_type) = return_type {
            self.write(": ");
            self.node(return_type);
        }
    }

    fn array_items(&mut self, items: &[ArrayItemExpr]) {
        self.join(items, ", ", |p, item| {
            if item.unpack {
                p.write("...");
            }
            if let Some(key) = &item.key {
                p.node(key);
                p.write(" => ");
            }
            if let Some(val) = &item.val {
                p.node(val);
            }
        });
    }

    fn constant(&mut self, constant: &ConstantStmt) {
        self.identifier(&constant.constant_name);
        self.write(" = ");
        self.node(&constant.expr);
    }

    fn class_tail(
        &mut self,
        extends: &Option<ClassExtendsStmt>,
        implements: &Option<ClassImplementsStmt>,
        stmts: &[Node],
    ) {
        if let Some(extends) = extends {
            self.write(" extends ");
            self.node(&extends.class_name);
        }
        if let Some(implements) = implements {
            self.write(" implements ");
            self.nodes(&implements.interface_names, ", ");
        }
        self.write(" ");
        self.block(stmts);
    }

    fn method_ref(&mut self, method_ref: &TraitMethodRefStmt) {
        if let Some(trait_name) = &method_ref.trait_name {
            self.node(trait_name);
            self.write("::");
        }
        self.identifier(&method_ref.method);
    }

    fn use_clause(&mut self, clause: &UseStmt) {
        if let Some(use_type) = &clause.use_type {
            self.identifier(use_type);
            self.write(" ");
        }
        self.node(&clause.use_name);
        if let Some(alias) = &clause.alias {
            self.write(" as ");
            self.identifier(alias);
        }
    }

    fn if_branches(&mut self, else_if: &[ElseIfStmt], else_stmt: &Option<ElseStmt>) {
        for branch in else_if {
            self.newline();
            self.else_if(branch);
        }
        if let Some(else_stmt) = else_stmt {
            self.newline();
            self.else_stmt(else_stmt);
        }
    }

    fn else_if(&mut self, branch: &ElseIfStmt) {
        self.write("elseif (");
        self.node(&branch.cond);
        self.write(")");
        if branch.alt_syntax {
            self.write(":");
            self.alt_body(&branch.stmt);
        } else {
            self.body(&branch.stmt);
        }
    }

    fn else_stmt(&mut self, branch: &ElseStmt) {
        self.write("else");
        if branch.alt_syntax {
            self.write(":");
            self.alt_body(&branch.stmt);
        } else {
            self.body(&branch.stmt);
        }
    }

    fn cases(&mut self, list: &CaseListStmt) {
        self.indented(&list.cases);
    }

    fn catch(&mut self, catch: &CatchStmt) {
        self.write("catch (");
        self.nodes(&catch.types, " | ");
        self.write(" ");
        self.simple_var(&catch.variable);
        self.write(") ");
        self.block(&catch.stmts);
    }

    fn parts(&mut self, parts: &[Node]) {
        for part in parts {
            match part {
                Node::EncapsedStringPart(text) => self.write(&text.value),
                other => {
                    self.write("{");
                    self.node(other);
                    self.write("}");
                }
            }
        }
    }

    fn string(&mut self, value: &str, double_quotes: bool) {
        if !double_quotes {
            self.write("'");
            for c in value.chars() {
                if matches!(c, '\'' | '\\') {
                    self.out.push('\\');
                }
                self.out.push(c);
            }
            self.write("'");
            return;
        }
        self.write("\"");
        for c in value.chars() {
            match c {
                '"' => self.write("\\\""),
                '\\' => self.write("\\\\"),
                '$' => self.write("\\$"),
                '\n' => self.write("\\n"),
                '\r' => self.write("\\r"),
                '\t' => self.write("\\t"),
                '\x0B' => self.write("\\v"),
                '\x1B' => self.write("\\e"),
                '\x0C' => self.write("\\f"),
                c if c.is_ascii_control() => self.write(&format!("\\x{:02x}", c as u32)),
                c => self.out.push(c),
            }
        }
        self.write("\"");
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    fn node(&mut self, node: &Node) {
        match node {
            Node::Root(root) => self.root(root),
            Node::BadExpr(_) => self.write("/* bad expression */"),
            Node::BadStmt(_) => self.write("/* bad statement */"),

            Node::Identifier(n) => self.identifier(n),
            Node::Name(n) => self.write(&n.value),
            Node::Nullable(n) => {
                self.write("?");
                self.node(&n.expr);
            }
            Node::Parameter(n) => self.parameter(n),
            Node::Argument(n) => self.argument(n),
            Node::ArgumentList(n) => self.arguments(n),

            Node::Lnumber(n) => self.write(&n.value),
            Node::Dnumber(n) => self.write(&n.value),
            Node::StringLiteral(n) => self.string(&n.value, n.double_quotes),
            Node::BadString(n) => {
                let quote = if n.double_quotes { "\"" } else { "'" };
                self.write(quote);
                self.write(&n.value);
                self.write(quote);
            }
            Node::Encapsed(n) => {
                self.write("\"");
                self.parts(&n.parts);
                self.write("\"");
            }
            Node::EncapsedStringPart(n) => self.write(&n.value),
            Node::Heredoc(n) => {
                self.write(&n.label);
                self.out.push('\n');
                self.parts(&n.parts);
                self.write(n.label.trim_start_matches('<').trim_matches(['"', '\'']));
            }
            Node::MagicConstant(n) => self.write(&n.value),

            Node::SimpleVar(n) => self.simple_var(n),
            Node::Var(n) => match &*n.expr {
                inner @ (Node::SimpleVar(_) | Node::Var(_)) => {
                    self.write("$");
                    self.node(inner);
                }
                inner => {
                    self.write("${");
                    self.node(inner);
                    self.write("}");
                }
            },

            Node::ArrayExpr(n) => {
                self.write(if n.short_syntax { "[" } else { "array(" });
                self.array_items(&n.items);
                self.write(if n.short_syntax { "]" } else { ")" });
            }
            Node::ArrayItemExpr(n) => self.array_items(std::slice::from_ref(n)),
            Node::ListExpr(n) => {
                self.write(if n.short_syntax { "[" } else { "list(" });
                self.array_items(&n.items);
                self.write(if n.short_syntax { "]" } else { ")" });
            }
            Node::ArrayDimFetchExpr(n) => {
                self.node(&n.variable);
                self.write(if n.curly_brace { "{" } else { "[" });
                if let Some(dim) = &n.dim {
                    self.node(dim);
                }
                self.write(if n.curly_brace { "}" } else { "]" });
            }
            Node::AnonClassExpr(n) => {
                self.write("class");
                if let Some(arguments) = &n.argument_list {
                    self.arguments(arguments);
                }
                self.class_tail(&n.extends, &n.implements, &n.stmts);
            }
            Node::ArrowFunctionExpr(n) => {
                if n.is_static {
                    self.write("static ");
                }
                self.write("fn ");
                if n.returns_ref {
                    self.write("&");
                }
                self.parameters(&n.params);
                self.return_type(&n.return_type);
                self.write(" => ");
                self.node(&n.expr);
            }
            Node::ClosureExpr(n) => {
                if n.is_static {
                    self.write("static ");
                }
                self.write("function ");
                if n.returns_ref {
                    self.write("&");
                }
                self.parameters(&n.params);
                if let Some(closure_use) = &n.closure_use {
                    self.write(" use (");
                    self.nodes(&closure_use.uses, ", ");
                    self.write(")");
                }
                self.return_type(&n.return_type);
                self.write(" ");
                self.block(&n.stmts);
            }
            Node::ClosureUseExpr(n) => {
                self.write("use (");
                self.nodes(&n.uses, ", ");
                self.write(")");
            }

            Node::UnaryPrefixExpr(n) => {
                self.write(n.op.as_str());
                self.node(&n.expr);
            }
            Node::UnaryPostfixExpr(n) => {
                self.node(&n.variable);
                self.write(n.op.as_str());
            }

            Node::ClassConstFetchExpr(n) => {
                self.node(&n.class);
                self.write("::");
                self.identifier(&n.constant_name);
            }
            Node::CloneExpr(n) => {
                self.write("clone ");
                self.node(&n.expr);
            }
            Node::ConstFetchExpr(n) => self.node(&n.constant),
            Node::EmptyExpr(n) => {
                self.write("empty(");
                self.node(&n.expr);
                self.write(")");
            }
            Node::ErrorSuppressExpr(n) => {
                self.write("@");
                self.node(&n.expr);
            }
            Node::EvalExpr(n) => {
                self.write("eval(");
                self.node(&n.expr);
                self.write(")");
            }
            Node::ExitExpr(n) => {
                self.write(if n.die { "die" } else { "exit" });
                if let Some(expr) = &n.expr {
                    self.write("(");
                    self.node(expr);
                    self.write(")");
                }
            }
            Node::FunctionCallExpr(n) => {
                self.node(&n.function);
                self.arguments(&n.argument_list);
            }
            Node::ImportExpr(n) => {
                self.write(&n.func);
                self.write(" ");
                self.node(&n.expr);
            }
            Node::InstanceOfExpr(n) => {
                self.node(&n.expr);
                self.write(" instanceof ");
                self.node(&n.class);
            }
            Node::IssetExpr(n) => {
                self.write("isset(");
                self.nodes(&n.variables, ", ");
                self.write(")");
            }
            Node::MethodCallExpr(n) => {
                self.node(&n.variable);
                self.write("->");
                self.node(&n.method);
                self.arguments(&n.argument_list);
            }
            Node::NewExpr(n) => {
                self.write("new ");
                self.node(&n.class);
                if let Some(arguments) = &n.argument_list {
                    self.arguments(arguments);
                }
            }
            Node::ParenExpr(n) => {
                self.write("(");
                self.node(&n.expr);
                self.write(")");
            }
            Node::PrintExpr(n) => {
                self.write("print ");
                self.node(&n.expr);
            }
            Node::PropertyFetchExpr(n) => {
                self.node(&n.variable);
                self.write("->");
                self.node(&n.property);
            }
            Node::ReferenceExpr(n) => {
                self.write("&");
                self.node(&n.variable);
            }
            Node::ShellExecExpr(n) => {
                self.write("`");
                self.parts(&n.parts);
                self.write("`");
            }
            Node::StaticCallExpr(n) => {
                self.node(&n.class);
                self.write("::");
                self.node(&n.call);
                self.arguments(&n.argument_list);
            }
            Node::StaticPropertyFetchExpr(n) => {
                self.node(&n.class);
                self.write("::");
                self.node(&n.property);
            }
            Node::TernaryExpr(n) => {
                self.node(&n.condition);
                match &n.if_true {
                    Some(if_true) => {
                        self.write(" ? ");
                        self.node(if_true);
                        self.write(" : ");
                    }
                    None => self.write(" ?: "),
                }
                self.node(&n.if_false);
            }
            Node::YieldExpr(n) => {
                self.write("yield");
                if let Some(key) = &n.key {
                    self.write(" ");
                    self.node(key);
                    self.write(" =>");
                }
                if let Some(value) = &n.value {
                    self.write(" ");
                    self.node(value);
                }
            }
            Node::YieldFromExpr(n) => {
                self.write("yield from ");
                self.node(&n.expr);
            }

            Node::Assign(n) => {
                self.node(&n.variable);
                self.write(" ");
                self.write(n.op.as_str());
                self.write(" ");
                self.node(&n.expression);
            }
            Node::AssignReference(n) => {
                self.node(&n.variable);
                self.write(" =& ");
                self.node(&n.expression);
            }
            Node::BinaryExpr(n) => {
                self.node(&n.left);
                self.write(" ");
                self.write(n.op.as_str());
                self.write(" ");
                self.node(&n.right);
            }
            Node::TypeCastExpr(n) => {
                self.write("(");
                self.write(&n.type_name);
                self.write(")");
                self.node(&n.expr);
            }
            Node::UnsetCastExpr(n) => {
                self.write("(unset)");
                self.node(&n.expr);
            }

            Node::BreakStmt(n) => self.jump("break", &n.expr),
            Node::ContinueStmt(n) => self.jump("continue", &n.expr),
            Node::ReturnStmt(n) => self.jump("return", &n.expr),
            Node::CaseStmt(n) => {
                self.write("case ");
                self.node(&n.cond);
                self.write(":");
                self.indented(&n.stmts);
            }
            Node::DefaultStmt(n) => {
                self.write("default:");
                self.indented(&n.stmts);
            }
            Node::CaseListStmt(n) => self.cases(n),
            Node::CatchStmt(n) => self.catch(n),
            Node::ClassStmt(n) => {
                self.modifiers(&n.modifiers);
                self.write("class ");
                self.identifier(&n.class_name);
                self.class_tail(&n.extends, &n.implements, &n.stmts);
            }
            Node::ClassConstListStmt(n) => {
                self.modifiers(&n.modifiers);
                self.write("const ");
                self.join(&n.consts, ", ", Self::constant);
                self.write(";");
            }
            Node::ClassExtendsStmt(n) => {
                self.write("extends ");
                self.node(&n.class_name);
            }
            Node::ClassImplementsStmt(n) => {
                self.write("implements ");
                self.nodes(&n.interface_names, ", ");
            }
            Node::ClassMethodStmt(n) => {
                self.modifiers(&n.modifiers);
                self.write("function ");
                if n.returns_ref {
                    self.write("&");
                }
                self.identifier(&n.method_name);
                self.parameters(&n.params);
                self.return_type(&n.return_type);
                match &*n.stmt {
                    Node::StmtList(list) => {
                        self.write(" ");
                        self.block(&list.stmts);
                    }
                    _ => self.write(";"),
                }
            }
            Node::ConstListStmt(n) => {
                self.write("const ");
                self.join(&n.consts, ", ", Self::constant);
                self.write(";");
            }
            Node::ConstantStmt(n) => self.constant(n),
            Node::DeclareStmt(n) => {
                self.write("declare(");
                self.join(&n.consts, ", ", Self::constant);
                self.write(")");
                if n.alt_syntax {
                    self.write(":");
                    self.alt_body(&n.stmt);
                    self.alt_end("enddeclare");
                } else {
                    self.body(&n.stmt);
                }
            }
            Node::DoStmt(n) => {
                self.write("do");
                self.body(&n.stmt);
                if matches!(&*n.stmt, Node::StmtList(_)) {
                    self.write(" ");
                } else {
                    self.newline();
                }
                self.write("while (");
                self.node(&n.cond);
                self.write(");");
            }
            Node::EchoStmt(n) => {
                self.write("echo ");
                self.nodes(&n.exprs, ", ");
                self.write(";");
            }
            Node::ElseStmt(n) => self.else_stmt(n),
            Node::ElseIfStmt(n) => self.else_if(n),
            Node::ExpressionStmt(n) => {
                self.node(&n.expr);
                self.write(";");
            }
            Node::FinallyStmt(n) => {
                self.write("finally ");
                self.block(&n.stmts);
            }
            Node::ForStmt(n) => {
                self.write("for (");
                self.nodes(&n.init, ", ");
                self.write("; ");
                self.nodes(&n.cond, ", ");
                self.write("; ");
                self.nodes(&n.step, ", ");
                self.write(")");
                if n.alt_syntax {
                    self.write(":");
                    self.alt_body(&n.stmt);
                    self.alt_end("endfor");
                } else {
                    self.body(&n.stmt);
                }
            }
            Node::ForeachStmt(n) => {
                self.write("foreach (");
                self.node(&n.expr);
                self.write(" as ");
                if let Some(key) = &n.key {
                    self.node(key);
                    self.write(" => ");
                }
                self.node(&n.variable);
                self.write(")");
                if n.alt_syntax {
                    self.write(":");
                    self.alt_body(&n.stmt);
                    self.alt_end("endforeach");
                } else {
                    self.body(&n.stmt);
                }
            }
            Node::FunctionStmt(n) => {
                self.write("function ");
                if n.returns_ref {
                    self.write("&");
                }
                self.identifier(&n.function_name);
                self.parameters(&n.params);
                self.return_type(&n.return_type);
                self.write(" ");
                self.block(&n.stmts);
            }
            Node::GlobalStmt(n) => {
                self.write("global ");
                self.nodes(&n.vars, ", ");
                self.write(";");
            }
            Node::GotoStmt(n) => {
                self.write("goto ");
                self.identifier(&n.label);
                self.write(";");
            }
            Node::GroupUseStmt(n) => {
                self.write("use ");
                if let Some(use_type) = &n.use_type {
                    self.identifier(use_type);
                    self.write(" ");
                }
                self.node(&n.prefix);
                self.write("\\{");
                self.join(&n.use_list, ", ", Self::use_clause);
                self.write("};");
            }
            Node::HaltCompilerStmt(_) => self.write("__halt_compiler();"),
            Node::IfStmt(n) => {
                self.write("if (");
                self.node(&n.cond);
                self.write(")");
                if n.alt_syntax {
                    self.write(":");
                    self.alt_body(&n.stmt);
                    self.if_branches(&n.else_if, &n.else_stmt);
                    self.alt_end("endif");
                } else {
                    self.body(&n.stmt);
                    self.if_branches(&n.else_if, &n.else_stmt);
                }
            }
            Node::InlineHtmlStmt(n) => {
                self.write("?>");
                self.write(&n.value);
                self.write("<?php");
            }
            Node::InterfaceStmt(n) => {
                self.write("interface ");
                self.identifier(&n.interface_name);
                if let Some(extends) = &n.extends {
                    self.write(" extends ");
                    self.nodes(&extends.interface_names, ", ");
                }
                self.write(" ");
                self.block(&n.stmts);
            }
            Node::InterfaceExtendsStmt(n) => {
                self.write("extends ");
                self.nodes(&n.interface_names, ", ");
            }
            Node::LabelStmt(n) => {
                self.identifier(&n.label_name);
                self.write(":");
            }
            Node::NamespaceStmt(n) => {
                self.write("namespace");
                if let Some(name) = &n.namespace_name {
                    self.write(" ");
                    self.node(name);
                }
                match &n.stmts {
                    Some(stmts) => {
                        self.write(" ");
                        self.block(stmts);
                    }
                    None => self.write(";"),
                }
            }
            Node::NopStmt(_) => self.write(";"),
            Node::PropertyStmt(n) => self.property(n),
            Node::PropertyListStmt(n) => {
                self.modifiers(&n.modifiers);
                if let Some(property_type) = &n.property_type {
                    self.node(property_type);
                    self.write(" ");
                }
                self.join(&n.properties, ", ", Self::property);
                self.write(";");
            }
            Node::StaticStmt(n) => {
                self.write("static ");
                self.join(&n.vars, ", ", Self::static_var);
                self.write(";");
            }
            Node::StaticVarStmt(n) => self.static_var(n),
            Node::StmtList(n) => self.block(&n.stmts),
            Node::SwitchStmt(n) => {
                self.write("switch (");
                self.node(&n.cond);
                self.write(")");
                if n.alt_syntax {
                    self.write(":");
                    self.cases(&n.case_list);
                    self.alt_end("endswitch");
                } else {
                    self.write(" ");
                    self.block(&n.case_list.cases);
                }
            }
            Node::ThrowStmt(n) => {
                self.write("throw ");
                self.node(&n.expr);
                self.write(";");
            }
            Node::TraitStmt(n) => {
                self.write("trait ");
                self.identifier(&n.trait_name);
                self.write(" ");
                self.block(&n.stmts);
            }
            Node::TraitAdaptationListStmt(n) => self.block(&n.adaptations),
            Node::TraitMethodRefStmt(n) => self.method_ref(n),
            Node::TraitUseStmt(n) => {
                self.write("use ");
                self.nodes(&n.traits, ", ");
                match &*n.adaptation_list {
                    Node::TraitAdaptationListStmt(list) => {
                        self.write(" ");
                        self.block(&list.adaptations);
                    }
                    _ => self.write(";"),
                }
            }
            Node::TraitUseAliasStmt(n) => {
                self.method_ref(&n.trait_ref);
                self.write(" as");
                if let Some(modifier) = &n.modifier {
                    self.write(" ");
                    self.identifier(modifier);
                }
                if let Some(alias) = &n.alias {
                    self.write(" ");
                    self.identifier(alias);
                }
                self.write(";");
            }
            Node::TraitUsePrecedenceStmt(n) => {
                self.method_ref(&n.trait_ref);
                self.write(" insteadof ");
                self.nodes(&n.insteadof, ", ");
                self.write(";");
            }
            Node::TryStmt(n) => {
                self.write("try ");
                self.block(&n.stmts);
                for catch in &n.catches {
                    self.write(" ");
                    self.catch(catch);
                }
                if let Some(finally) = &n.finally {
                    self.write(" finally ");
                    self.block(&finally.stmts);
                }
            }
            Node::UnsetStmt(n) => {
                self.write("unset(");
                self.nodes(&n.vars, ", ");
                self.write(");");
            }
            Node::UseStmt(n) => self.use_clause(n),
            Node::UseListStmt(n) => {
                self.write("use ");
                if let Some(use_type) = &n.use_type {
                    self.identifier(use_type);
                    self.write(" ");
                }
                self.join(&n.uses, ", ", Self::use_clause);
                self.write(";");
            }
            Node::WhileStmt(n) => {
                self.write("while (");
                self.node(&n.cond);
                self.write(")");
                if n.alt_syntax {
                    self.write(":");
                    self.alt_body(&n.stmt);
                    self.alt_end("endwhile");
                } else {
                    self.body(&n.stmt);
                }
            }
        }
    }

    fn jump(&mut self, keyword: &str, expr: &Option<Box<Node>>) {
        self.write(keyword);
        if let Some(expr) = expr {
            self.write(" ");
            self.node(expr);
        }
        self.write(";");
    }

    fn property(&mut self, property: &PropertyStmt) {
        self.simple_var(&property.variable);
        if let Some(expr) = &property.expr {
            self.write(" = ");
            self.node(expr);
        }
    }

    fn static_var(&mut self, var: &StaticVarStmt) {
        self.simple_var(&var.variable);
        if let Some(expr) = &var.expr {
            self.write(" = ");
            self.node(expr);
        }
    }
}
