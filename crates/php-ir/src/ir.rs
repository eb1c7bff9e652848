//! Canonical IR: the surface tree with operator, cast, include, array and
//! alternative-syntax spellings folded into a single node type each.

use std::fmt;

use php_ast::{AstNode, Collection, Position, Visitor, Walk, WalkField};
use serde::Serialize;

use crate::irutil::Detach;
use crate::shape::Shape;

macro_rules! operators {
    ($(
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),* $(,)? }
    )*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
            pub enum $name {
                $(#[serde(rename = $text)] $variant,)*
            }

            impl $name {
                pub fn as_str(self) -> &'static str {
                    match self {
                        $($name::$variant => $text,)*
                    }
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl Shape for $name {
                fn same_shape(&self, other: &Self) -> bool {
                    self == other
                }

                fn write_key(&self, out: &mut String) {
                    out.push_str(self.as_str());
                }
            }

            impl Detach for $name {
                fn detach(&mut self) {}
            }

            php_ast::walk_leaf!($name);
        )*
    };
}

operators! {
    /// Operator of an [`Assign`]: plain `=` or a compound spelling.
    AssignOp {
        Assign => "=",
        BitwiseAnd => "&=",
        BitwiseOr => "|=",
        BitwiseXor => "^=",
        Coalesce => "??=",
        Concat => ".=",
        Div => "/=",
        Minus => "-=",
        Mod => "%=",
        Mul => "*=",
        Plus => "+=",
        Pow => "**=",
        ShiftLeft => "<<=",
        ShiftRight => ">>=",
    }

    BinaryOp {
        BitwiseAnd => "&",
        BitwiseOr => "|",
        BitwiseXor => "^",
        BooleanAnd => "&&",
        BooleanOr => "||",
        Coalesce => "??",
        Concat => ".",
        Div => "/",
        Equal => "==",
        Greater => ">",
        GreaterOrEqual => ">=",
        Identical => "===",
        LogicalAnd => "and",
        LogicalOr => "or",
        LogicalXor => "xor",
        Minus => "-",
        Mod => "%",
        Mul => "*",
        NotEqual => "!=",
        NotIdentical => "!==",
        Plus => "+",
        Pow => "**",
        ShiftLeft => "<<",
        ShiftRight => ">>",
        Smaller => "<",
        SmallerOrEqual => "<=",
        Spaceship => "<=>",
    }

    UnaryOp {
        Minus => "-",
        Plus => "+",
        BooleanNot => "!",
        BitwiseNot => "~",
        Increment => "++",
        Decrement => "--",
    }
}

macro_rules! ir_nodes {
    ($(
        $(#[$meta:meta])*
        $name:ident { $($field:ident : $ty:ty),* $(,)? }
    )*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Serialize)]
            pub struct $name {
                $(pub $field: $ty,)*
                pub position: Position,
                #[serde(skip_serializing_if = "Collection::is_empty")]
                pub free_floating: Collection,
            }

            impl $name {
                pub const TYPE_NAME: &'static str = stringify!($name);
            }

            impl<'a> Walk<'a, NodeRef<'a>> for $name {
                #[allow(unused_variables)]
                fn walk<V: Visitor<NodeRef<'a>> + ?Sized>(&'a self, visitor: &mut V) {
                    let node = NodeRef::$name(self);
                    if visitor.enter_node(node) {
                        $(WalkField::walk_field(&self.$field, visitor, node, stringify!($field));)*
                    }
                    visitor.leave_node(node);
                }
            }

            impl<'a> WalkField<'a, NodeRef<'a>> for $name {
                fn walk_field<V: Visitor<NodeRef<'a>> + ?Sized>(
                    &'a self,
                    visitor: &mut V,
                    parent: NodeRef<'a>,
                    key: &'static str,
                ) {
                    visitor.enter_child(key, parent);
                    self.walk(visitor);
                    visitor.leave_child(key, parent);
                }
            }

            impl Shape for $name {
                #[allow(unused_variables)]
                fn same_shape(&self, other: &Self) -> bool {
                    true $(&& self.$field.same_shape(&other.$field))*
                }

                fn write_key(&self, out: &mut String) {
                    out.push('(');
                    out.push_str(stringify!($name));
                    $(
                        out.push_str(concat!(" :", stringify!($field), " "));
                        self.$field.write_key(out);
                    )*
                    out.push(')');
                }
            }

            impl Detach for $name {
                fn detach(&mut self) {
                    $(self.$field.detach();)*
                    self.position = Position::NONE;
                    self.free_floating = Collection::new();
                }
            }

            impl From<$name> for Node {
                fn from(node: $name) -> Node {
                    Node::$name(node)
                }
            }

            php_ast::impl_ast_node!($name);
        )*

        /// Any IR node.
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(tag = "type")]
        pub enum Node {
            $($name($name),)*
        }

        /// Borrowed view of an IR node, handed to visitors.
        #[derive(Debug, Clone, Copy)]
        pub enum NodeRef<'a> {
            $($name(&'a $name),)*
        }

        impl Node {
            pub fn type_name(&self) -> &'static str {
                match self {
                    $(Node::$name(_) => stringify!($name),)*
                }
            }

            pub fn as_node_ref(&self) -> NodeRef<'_> {
                match self {
                    $(Node::$name(n) => NodeRef::$name(n),)*
                }
            }
        }

        impl AstNode for Node {
            fn position(&self) -> Position {
                match self {
                    $(Node::$name(n) => n.position,)*
                }
            }

            fn set_position(&mut self, position: Position) {
                match self {
                    $(Node::$name(n) => n.position = position,)*
                }
            }

            fn free_floating(&self) -> &Collection {
                match self {
                    $(Node::$name(n) => &n.free_floating,)*
                }
            }

            fn free_floating_mut(&mut self) -> &mut Collection {
                match self {
                    $(Node::$name(n) => &mut n.free_floating,)*
                }
            }
        }

        impl Shape for Node {
            fn same_shape(&self, other: &Self) -> bool {
                match (self, other) {
                    $((Node::$name(a), Node::$name(b)) => a.same_shape(b),)*
                    _ => false,
                }
            }

            fn write_key(&self, out: &mut String) {
                match self {
                    $(Node::$name(n) => n.write_key(out),)*
                }
            }
        }

        impl Detach for Node {
            fn detach(&mut self) {
                match self {
                    $(Node::$name(n) => n.detach(),)*
                }
            }
        }

        impl<'a> NodeRef<'a> {
            pub fn type_name(self) -> &'static str {
                match self {
                    $(NodeRef::$name(_) => stringify!($name),)*
                }
            }

            /// [`Shape::same_shape`] against an owned node.
            pub fn same_shape_as(self, other: &Node) -> bool {
                match (self, other) {
                    $((NodeRef::$name(a), Node::$name(b)) => a.same_shape(b),)*
                    _ => false,
                }
            }

            pub fn position(self) -> Position {
                match self {
                    $(NodeRef::$name(n) => n.position,)*
                }
            }

            pub fn free_floating(self) -> &'a Collection {
                match self {
                    $(NodeRef::$name(n) => &n.free_floating,)*
                }
            }
        }

        impl<'a> Walk<'a, NodeRef<'a>> for Node {
            fn walk<V: Visitor<NodeRef<'a>> + ?Sized>(&'a self, visitor: &mut V) {
                match self {
                    $(Node::$name(n) => n.walk(visitor),)*
                }
            }
        }

        impl<'a> WalkField<'a, NodeRef<'a>> for Node {
            fn walk_field<V: Visitor<NodeRef<'a>> + ?Sized>(
                &'a self,
                visitor: &mut V,
                parent: NodeRef<'a>,
                key: &'static str,
            ) {
                match self {
                    $(Node::$name(n) => n.walk_field(visitor, parent, key),)*
                }
            }
        }
    };
}

ir_nodes! {
    // =========================================================================
    // Structure
    // =========================================================================

    Root { stmts: Vec<Node> }

    /// Stands in for an expression the parser could not recover.
    BadExpr {}
    /// Stands in for a statement the parser skipped.
    BadStmt {}

    Identifier { value: String }
    /// A name as one string: `Foo\Bar`, or `\Foo\Bar` when fully qualified.
    /// `namespace\Foo` is resolved against the enclosing namespace and is
    /// always fully qualified.
    Name { value: String }
    Nullable { expr: Box<Node> }

    Parameter {
        by_ref: bool,
        variadic: bool,
        variable_type: Option<Box<Node>>,
        variable: SimpleVar,
        default_value: Option<Box<Node>>,
    }

    Argument { variadic: bool, is_reference: bool, expr: Box<Node> }
    ArgumentList { arguments: Vec<Argument> }

    // =========================================================================
    // Scalars
    // =========================================================================

    Lnumber { value: String }
    Dnumber { value: String }
    /// `value` is the string after escape interpretation, without quotes.
    StringLiteral { value: String, double_quotes: bool }
    /// A literal with an escape PHP rejects. `value` is the body as written
    /// and `error` says what is wrong with it.
    BadString { value: String, error: String, double_quotes: bool }
    Encapsed { parts: Vec<Node> }
    EncapsedStringPart { value: String }
    Heredoc { label: String, parts: Vec<Node> }
    MagicConstant { value: String }

    // =========================================================================
    // Variables
    // =========================================================================

    SimpleVar { name: String }
    Var { expr: Box<Node> }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// `array(...)` or `[...]`.
    ArrayExpr { items: Vec<ArrayItemExpr>, short_syntax: bool }
    ArrayItemExpr { key: Option<Box<Node>>, val: Option<Box<Node>>, unpack: bool }
    /// `list(...)` or `[...]` as an assignment target.
    ListExpr { items: Vec<ArrayItemExpr>, short_syntax: bool }
    ArrayDimFetchExpr { variable: Box<Node>, dim: Option<Box<Node>>, curly_brace: bool }

    /// `new class(...) extends A implements B { ... }`.
    AnonClassExpr {
        doc_comment: String,
        argument_list: Option<ArgumentList>,
        extends: Option<ClassExtendsStmt>,
        implements: Option<ClassImplementsStmt>,
        stmts: Vec<Node>,
    }

    ArrowFunctionExpr {
        returns_ref: bool,
        is_static: bool,
        doc_comment: String,
        params: Vec<Parameter>,
        return_type: Option<Box<Node>>,
        expr: Box<Node>,
    }

    ClosureExpr {
        returns_ref: bool,
        is_static: bool,
        doc_comment: String,
        params: Vec<Parameter>,
        closure_use: Option<ClosureUseExpr>,
        return_type: Option<Box<Node>>,
        stmts: Vec<Node>,
    }
    ClosureUseExpr { uses: Vec<Node> }

    UnaryPrefixExpr { op: UnaryOp, expr: Box<Node> }
    UnaryPostfixExpr { op: UnaryOp, variable: Box<Node> }

    ClassConstFetchExpr { class: Box<Node>, constant_name: Identifier }
    CloneExpr { expr: Box<Node> }
    ConstFetchExpr { constant: Box<Node> }
    EmptyExpr { expr: Box<Node> }
    ErrorSuppressExpr { expr: Box<Node> }
    EvalExpr { expr: Box<Node> }
    ExitExpr { die: bool, expr: Option<Box<Node>> }
    FunctionCallExpr { function: Box<Node>, argument_list: ArgumentList }
    /// `func` is one of `include`, `include_once`, `require`, `require_once`.
    ImportExpr { func: String, expr: Box<Node> }
    InstanceOfExpr { expr: Box<Node>, class: Box<Node> }
    IssetExpr { variables: Vec<Node> }
    MethodCallExpr { variable: Box<Node>, method: Box<Node>, argument_list: ArgumentList }
    NewExpr { class: Box<Node>, argument_list: Option<ArgumentList> }
    ParenExpr { expr: Box<Node> }
    PrintExpr { expr: Box<Node> }
    PropertyFetchExpr { variable: Box<Node>, property: Box<Node> }
    ReferenceExpr { variable: Box<Node> }
    ShellExecExpr { parts: Vec<Node> }
    StaticCallExpr { class: Box<Node>, call: Box<Node>, argument_list: ArgumentList }
    StaticPropertyFetchExpr { class: Box<Node>, property: Box<Node> }
    TernaryExpr { condition: Box<Node>, if_true: Option<Box<Node>>, if_false: Box<Node> }
    YieldExpr { key: Option<Box<Node>>, value: Option<Box<Node>> }
    YieldFromExpr { expr: Box<Node> }

    Assign { op: AssignOp, variable: Box<Node>, expression: Box<Node> }
    AssignReference { variable: Box<Node>, expression: Box<Node> }
    BinaryExpr { op: BinaryOp, left: Box<Node>, right: Box<Node> }

    /// `type_name` is one of `int`, `float`, `string`, `bool`, `array`,
    /// `object`.
    TypeCastExpr { type_name: String, expr: Box<Node> }
    UnsetCastExpr { expr: Box<Node> }

    // =========================================================================
    // Statements
    // =========================================================================

    BreakStmt { expr: Option<Box<Node>> }
    CaseStmt { cond: Box<Node>, stmts: Vec<Node> }
    CaseListStmt { cases: Vec<Node> }
    CatchStmt { types: Vec<Node>, variable: SimpleVar, stmts: Vec<Node> }
    ClassStmt {
        doc_comment: String,
        class_name: Identifier,
        modifiers: Vec<Identifier>,
        extends: Option<ClassExtendsStmt>,
        implements: Option<ClassImplementsStmt>,
        stmts: Vec<Node>,
    }
    ClassConstListStmt { doc_comment: String, modifiers: Vec<Identifier>, consts: Vec<ConstantStmt> }
    ClassExtendsStmt { class_name: Box<Node> }
    ClassImplementsStmt { interface_names: Vec<Node> }
    ClassMethodStmt {
        returns_ref: bool,
        doc_comment: String,
        method_name: Identifier,
        modifiers: Vec<Identifier>,
        params: Vec<Parameter>,
        return_type: Option<Box<Node>>,
        stmt: Box<Node>,
    }
    ConstListStmt { consts: Vec<ConstantStmt> }
    ConstantStmt { doc_comment: String, constant_name: Identifier, expr: Box<Node> }
    ContinueStmt { expr: Option<Box<Node>> }
    DeclareStmt { consts: Vec<ConstantStmt>, stmt: Box<Node>, alt_syntax: bool }
    DefaultStmt { stmts: Vec<Node> }
    DoStmt { stmt: Box<Node>, cond: Box<Node> }
    EchoStmt { exprs: Vec<Node> }
    ElseStmt { stmt: Box<Node>, alt_syntax: bool }
    ElseIfStmt { cond: Box<Node>, stmt: Box<Node>, alt_syntax: bool }
    ExpressionStmt { expr: Box<Node> }
    FinallyStmt { stmts: Vec<Node> }
    ForStmt { init: Vec<Node>, cond: Vec<Node>, step: Vec<Node>, stmt: Box<Node>, alt_syntax: bool }
    ForeachStmt {
        expr: Box<Node>,
        key: Option<Box<Node>>,
        variable: Box<Node>,
        stmt: Box<Node>,
        alt_syntax: bool,
    }
    FunctionStmt {
        returns_ref: bool,
        doc_comment: String,
        function_name: Identifier,
        params: Vec<Parameter>,
        return_type: Option<Box<Node>>,
        stmts: Vec<Node>,
    }
    GlobalStmt { vars: Vec<Node> }
    GotoStmt { label: Identifier }
    GroupUseStmt { use_type: Option<Identifier>, prefix: Box<Node>, use_list: Vec<UseStmt> }
    HaltCompilerStmt {}
    IfStmt {
        cond: Box<Node>,
        stmt: Box<Node>,
        else_if: Vec<ElseIfStmt>,
        else_stmt: Option<ElseStmt>,
        alt_syntax: bool,
    }
    InlineHtmlStmt { value: String }
    InterfaceStmt {
        doc_comment: String,
        interface_name: Identifier,
        extends: Option<InterfaceExtendsStmt>,
        stmts: Vec<Node>,
    }
    InterfaceExtendsStmt { interface_names: Vec<Node> }
    LabelStmt { label_name: Identifier }
    NamespaceStmt { namespace_name: Option<Box<Node>>, stmts: Option<Vec<Node>> }
    NopStmt {}
    PropertyStmt { doc_comment: String, variable: SimpleVar, expr: Option<Box<Node>> }
    PropertyListStmt {
        doc_comment: String,
        modifiers: Vec<Identifier>,
        property_type: Option<Box<Node>>,
        properties: Vec<PropertyStmt>,
    }
    ReturnStmt { expr: Option<Box<Node>> }
    StaticStmt { vars: Vec<StaticVarStmt> }
    StaticVarStmt { variable: SimpleVar, expr: Option<Box<Node>> }
    StmtList { stmts: Vec<Node> }
    SwitchStmt { cond: Box<Node>, case_list: CaseListStmt, alt_syntax: bool }
    ThrowStmt { expr: Box<Node> }
    TraitStmt { doc_comment: String, trait_name: Identifier, stmts: Vec<Node> }
    TraitAdaptationListStmt { adaptations: Vec<Node> }
    TraitMethodRefStmt { trait_name: Option<Box<Node>>, method: Identifier }
    TraitUseStmt { traits: Vec<Node>, adaptation_list: Box<Node> }
    TraitUseAliasStmt { trait_ref: TraitMethodRefStmt, modifier: Option<Identifier>, alias: Option<Identifier> }
    TraitUsePrecedenceStmt { trait_ref: TraitMethodRefStmt, insteadof: Vec<Node> }
    TryStmt { stmts: Vec<Node>, catches: Vec<CatchStmt>, finally: Option<FinallyStmt> }
    UnsetStmt { vars: Vec<Node> }
    UseStmt { use_type: Option<Identifier>, use_name: Box<Node>, alias: Option<Identifier> }
    UseListStmt { use_type: Option<Identifier>, uses: Vec<UseStmt> }
    WhileStmt { cond: Box<Node>, stmt: Box<Node>, alt_syntax: bool }
}

impl Name {
    pub fn is_fully_qualified(&self) -> bool {
        self.value.starts_with('\\')
    }

    fn unqualified(&self) -> &str {
        self.value.strip_prefix('\\').unwrap_or(&self.value)
    }

    pub fn num_parts(&self) -> usize {
        self.unqualified().split('\\').count()
    }

    /// `Foo` for `\Foo\Bar\Baz`.
    pub fn first_part(&self) -> &str {
        self.head_tail().0
    }

    /// `Bar\Baz` for `\Foo\Bar\Baz`; empty for a single part.
    pub fn rest_parts(&self) -> &str {
        self.head_tail().1
    }

    pub fn head_tail(&self) -> (&str, &str) {
        let name = self.unqualified();
        name.split_once('\\').unwrap_or((name, ""))
    }

    /// `Baz` for `\Foo\Bar\Baz`.
    pub fn last_part(&self) -> &str {
        let name = self.unqualified();
        name.rsplit_once('\\').map_or(name, |(_, last)| last)
    }
}
