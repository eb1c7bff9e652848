//! Surface syntax tree: one node type per concrete PHP spelling, as built by
//! the PHP 5 and PHP 7 grammars.

use serde::Serialize;

use crate::impl_ast_node;
use crate::node::AstNode;
use crate::position::Position;
use crate::trivia::Collection;
use crate::visitor::{Visitor, Walk, WalkField};

macro_rules! surface_nodes {
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

            impl From<$name> for Node {
                fn from(node: $name) -> Node {
                    Node::$name(node)
                }
            }

            impl_ast_node!($name);
        )*

        /// Any surface node.
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(tag = "type")]
        pub enum Node {
            $($name($name),)*
        }

        /// Borrowed view of a surface node, handed to visitors.
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

        impl<'a> NodeRef<'a> {
            pub fn type_name(self) -> &'static str {
                match self {
                    $(NodeRef::$name(_) => stringify!($name),)*
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

surface_nodes! {
    // =========================================================================
    // Structure
    // =========================================================================

    Root { stmts: Vec<Node> }

    /// Placeholder for a construct the parser could not recover. `statement`
    /// is set when it stands in a statement list.
    Bad { statement: bool }

    Identifier { value: String }
    NamePart { value: String }
    Name { parts: Vec<NamePart> }
    FullyQualified { parts: Vec<NamePart> }
    Relative { parts: Vec<NamePart> }
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
    /// Quoted string without interpolation; `value` is the raw source text,
    /// quotes included.
    StringLiteral { value: String }
    /// Interpolated double-quoted string.
    Encapsed { parts: Vec<Node> }
    EncapsedStringPart { value: String }
    Heredoc { label: String, parts: Vec<Node> }
    MagicConstant { value: String }

    // =========================================================================
    // Variables
    // =========================================================================

    /// `$name`; `name` excludes the dollar.
    SimpleVar { name: String }
    /// `$$expr` and `${expr}`.
    Var { expr: Box<Node> }

    // =========================================================================
    // Expressions
    // =========================================================================

    ArrayExpr { items: Vec<ArrayItemExpr> }
    ShortArrayExpr { items: Vec<ArrayItemExpr> }
    /// An empty slot (`list(, $b)`) has neither key nor value and carries
    /// `Position::NONE`.
    ArrayItemExpr { key: Option<Box<Node>>, val: Option<Box<Node>>, unpack: bool }
    ListExpr { items: Vec<ArrayItemExpr> }
    ShortListExpr { items: Vec<ArrayItemExpr> }
    ArrayDimFetchExpr { variable: Box<Node>, dim: Option<Box<Node>>, curly_brace: bool }

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

    BitwiseNotExpr { expr: Box<Node> }
    BooleanNotExpr { expr: Box<Node> }
    UnaryMinusExpr { expr: Box<Node> }
    UnaryPlusExpr { expr: Box<Node> }
    PreIncExpr { variable: Box<Node> }
    PreDecExpr { variable: Box<Node> }
    PostIncExpr { variable: Box<Node> }
    PostDecExpr { variable: Box<Node> }

    ClassConstFetchExpr { class: Box<Node>, constant_name: Identifier }
    CloneExpr { expr: Box<Node> }
    ConstFetchExpr { constant: Box<Node> }
    EmptyExpr { expr: Box<Node> }
    ErrorSuppressExpr { expr: Box<Node> }
    EvalExpr { expr: Box<Node> }
    ExitExpr { die: bool, expr: Option<Box<Node>> }
    FunctionCallExpr { function: Box<Node>, argument_list: ArgumentList }
    IncludeExpr { expr: Box<Node> }
    IncludeOnceExpr { expr: Box<Node> }
    RequireExpr { expr: Box<Node> }
    RequireOnceExpr { expr: Box<Node> }
    InstanceOfExpr { expr: Box<Node>, class: Box<Node> }
    IssetExpr { variables: Vec<Node> }
    MethodCallExpr { variable: Box<Node>, method: Box<Node>, argument_list: ArgumentList }
    /// `class` is a `ClassStmt` for `new class {}`.
    NewExpr { class: Box<Node>, argument_list: Option<ArgumentList> }
    ParenExpr { expr: Box<Node> }
    PrintExpr { expr: Box<Node> }
    PropertyFetchExpr { variable: Box<Node>, property: Box<Node> }
    ReferenceExpr { variable: Box<Node> }
    ShellExecExpr { parts: Vec<Node> }
    StaticCallExpr { class: Box<Node>, call: Box<Node>, argument_list: ArgumentList }
    StaticPropertyFetchExpr { class: Box<Node>, property: Box<Node> }
    /// `if_true` is absent for `?:`.
    TernaryExpr { condition: Box<Node>, if_true: Option<Box<Node>>, if_false: Box<Node> }
    YieldExpr { key: Option<Box<Node>>, value: Option<Box<Node>> }
    YieldFromExpr { expr: Box<Node> }

    // -------------------------------------------------------------------------
    // Assignment, one type per operator
    // -------------------------------------------------------------------------

    Assign { variable: Box<Node>, expression: Box<Node> }
    AssignReference { variable: Box<Node>, expression: Box<Node> }
    AssignBitwiseAnd { variable: Box<Node>, expression: Box<Node> }
    AssignBitwiseOr { variable: Box<Node>, expression: Box<Node> }
    AssignBitwiseXor { variable: Box<Node>, expression: Box<Node> }
    AssignCoalesce { variable: Box<Node>, expression: Box<Node> }
    AssignConcat { variable: Box<Node>, expression: Box<Node> }
    AssignDiv { variable: Box<Node>, expression: Box<Node> }
    AssignMinus { variable: Box<Node>, expression: Box<Node> }
    AssignMod { variable: Box<Node>, expression: Box<Node> }
    AssignMul { variable: Box<Node>, expression: Box<Node> }
    AssignPlus { variable: Box<Node>, expression: Box<Node> }
    AssignPow { variable: Box<Node>, expression: Box<Node> }
    AssignShiftLeft { variable: Box<Node>, expression: Box<Node> }
    AssignShiftRight { variable: Box<Node>, expression: Box<Node> }

    // -------------------------------------------------------------------------
    // Binary operators, one type per operator
    // -------------------------------------------------------------------------

    BitwiseAndExpr { left: Box<Node>, right: Box<Node> }
    BitwiseOrExpr { left: Box<Node>, right: Box<Node> }
    BitwiseXorExpr { left: Box<Node>, right: Box<Node> }
    BooleanAndExpr { left: Box<Node>, right: Box<Node> }
    BooleanOrExpr { left: Box<Node>, right: Box<Node> }
    CoalesceExpr { left: Box<Node>, right: Box<Node> }
    ConcatExpr { left: Box<Node>, right: Box<Node> }
    DivExpr { left: Box<Node>, right: Box<Node> }
    EqualExpr { left: Box<Node>, right: Box<Node> }
    GreaterExpr { left: Box<Node>, right: Box<Node> }
    GreaterOrEqualExpr { left: Box<Node>, right: Box<Node> }
    IdenticalExpr { left: Box<Node>, right: Box<Node> }
    LogicalAndExpr { left: Box<Node>, right: Box<Node> }
    LogicalOrExpr { left: Box<Node>, right: Box<Node> }
    LogicalXorExpr { left: Box<Node>, right: Box<Node> }
    MinusExpr { left: Box<Node>, right: Box<Node> }
    ModExpr { left: Box<Node>, right: Box<Node> }
    MulExpr { left: Box<Node>, right: Box<Node> }
    NotEqualExpr { left: Box<Node>, right: Box<Node> }
    NotIdenticalExpr { left: Box<Node>, right: Box<Node> }
    PlusExpr { left: Box<Node>, right: Box<Node> }
    PowExpr { left: Box<Node>, right: Box<Node> }
    ShiftLeftExpr { left: Box<Node>, right: Box<Node> }
    ShiftRightExpr { left: Box<Node>, right: Box<Node> }
    SmallerExpr { left: Box<Node>, right: Box<Node> }
    SmallerOrEqualExpr { left: Box<Node>, right: Box<Node> }
    SpaceshipExpr { left: Box<Node>, right: Box<Node> }

    // -------------------------------------------------------------------------
    // Casts, one type per spelling family
    // -------------------------------------------------------------------------

    CastArray { expr: Box<Node> }
    CastBool { expr: Box<Node> }
    CastDouble { expr: Box<Node> }
    CastInt { expr: Box<Node> }
    CastObject { expr: Box<Node> }
    CastString { expr: Box<Node> }
    CastUnset { expr: Box<Node> }

    // =========================================================================
    // Statements
    // =========================================================================

    AltIfStmt {
        cond: Box<Node>,
        stmt: Box<Node>,
        else_if: Vec<AltElseIfStmt>,
        else_stmt: Option<AltElseStmt>,
    }
    AltElseIfStmt { cond: Box<Node>, stmt: Box<Node> }
    AltElseStmt { stmt: Box<Node> }
    AltForStmt { init: Vec<Node>, cond: Vec<Node>, step: Vec<Node>, stmt: Box<Node> }
    AltForeachStmt { expr: Box<Node>, key: Option<Box<Node>>, variable: Box<Node>, stmt: Box<Node> }
    AltSwitchStmt { cond: Box<Node>, case_list: CaseListStmt }
    AltWhileStmt { cond: Box<Node>, stmt: Box<Node> }

    BreakStmt { expr: Option<Box<Node>> }
    CaseStmt { cond: Box<Node>, stmts: Vec<Node> }
    CaseListStmt { cases: Vec<Node> }
    CatchStmt { types: Vec<Node>, variable: SimpleVar, stmts: Vec<Node> }

    /// Named class declaration, or the body of `new class {}` when
    /// `class_name` is absent.
    ClassStmt {
        doc_comment: String,
        class_name: Option<Identifier>,
        modifiers: Vec<Identifier>,
        argument_list: Option<ArgumentList>,
        extends: Option<ClassExtendsStmt>,
        implements: Option<ClassImplementsStmt>,
        stmts: Vec<Node>,
    }
    ClassConstListStmt { doc_comment: String, modifiers: Vec<Identifier>, consts: Vec<ConstantStmt> }
    ClassExtendsStmt { class_name: Box<Node> }
    ClassImplementsStmt { interface_names: Vec<Node> }
    /// `stmt` is a `StmtList` for a body and a `NopStmt` for `;`.
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
    DeclareStmt { consts: Vec<ConstantStmt>, stmt: Box<Node>, alt: bool }
    DefaultStmt { stmts: Vec<Node> }
    DoStmt { stmt: Box<Node>, cond: Box<Node> }
    EchoStmt { exprs: Vec<Node> }
    ElseStmt { stmt: Box<Node> }
    ElseIfStmt { cond: Box<Node>, stmt: Box<Node> }
    ExpressionStmt { expr: Box<Node> }
    FinallyStmt { stmts: Vec<Node> }
    ForStmt { init: Vec<Node>, cond: Vec<Node>, step: Vec<Node>, stmt: Box<Node> }
    ForeachStmt { expr: Box<Node>, key: Option<Box<Node>>, variable: Box<Node>, stmt: Box<Node> }
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
    /// `stmts` is absent for `namespace A;` and present (maybe empty) for
    /// the braced form.
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
    SwitchStmt { cond: Box<Node>, case_list: CaseListStmt }
    ThrowStmt { expr: Box<Node> }
    TraitStmt { doc_comment: String, trait_name: Identifier, stmts: Vec<Node> }
    TraitAdaptationListStmt { adaptations: Vec<Node> }
    TraitMethodRefStmt { trait_name: Option<Box<Node>>, method: Identifier }
    /// `adaptation_list` is a `TraitAdaptationListStmt` for `{ ... }` and a
    /// `NopStmt` for `;`.
    TraitUseStmt { traits: Vec<Node>, adaptation_list: Box<Node> }
    TraitUseAliasStmt { trait_ref: TraitMethodRefStmt, modifier: Option<Identifier>, alias: Option<Identifier> }
    TraitUsePrecedenceStmt { trait_ref: TraitMethodRefStmt, insteadof: Vec<Node> }
    TryStmt { stmts: Vec<Node>, catches: Vec<CatchStmt>, finally: Option<FinallyStmt> }
    UnsetStmt { vars: Vec<Node> }
    UseStmt { use_type: Option<Identifier>, use_name: Box<Node>, alias: Option<Identifier> }
    UseListStmt { use_type: Option<Identifier>, uses: Vec<UseStmt> }
    WhileStmt { cond: Box<Node>, stmt: Box<Node> }
}

impl Node {
    pub fn bad(position: Position) -> Node {
        Node::Bad(Bad {
            statement: false,
            position,
            free_floating: Collection::new(),
        })
    }

    pub fn bad_stmt(position: Position) -> Node {
        Node::Bad(Bad {
            statement: true,
            position,
            free_floating: Collection::new(),
        })
    }

    pub fn is_bad(&self) -> bool {
        matches!(self, Node::Bad(_))
    }
}

impl Identifier {
    pub fn new(value: impl Into<String>, position: Position) -> Self {
        Self {
            value: value.into(),
            position,
            free_floating: Collection::new(),
        }
    }
}

impl SimpleVar {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
            free_floating: Collection::new(),
        }
    }
}

impl StmtList {
    /// A synthetic empty list that has no source text.
    pub fn empty() -> Self {
        Self {
            stmts: Vec::new(),
            position: Position::NONE,
            free_floating: Collection::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        let node = Node::bad(Position::NONE);
        assert_eq!(node.type_name(), "Bad");
        assert_eq!(node.as_node_ref().type_name(), "Bad");
        assert_eq!(ArrayDimFetchExpr::TYPE_NAME, "ArrayDimFetchExpr");
        assert!(matches!(Node::bad_stmt(Position::NONE), Node::Bad(Bad { statement: true, .. })));
    }

    #[test]
    fn test_serialize_skips_empty_trivia() {
        let var = Node::SimpleVar(SimpleVar::new("a", Position::new(1, 1, 6, 8)));
        let json = serde_json::to_value(&var).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "SimpleVar",
                "name": "a",
                "position": {
                    "start_line": 1,
                    "end_line": 1,
                    "start_offset": 6,
                    "end_offset": 8
                }
            })
        );
    }

    #[test]
    fn test_absent_and_empty_lists_differ() {
        let absent = NamespaceStmt {
            namespace_name: None,
            stmts: None,
            position: Position::NONE,
            free_floating: Collection::new(),
        };
        let mut empty = absent.clone();
        empty.stmts = Some(Vec::new());
        assert_ne!(absent, empty);
    }

    #[test]
    fn test_set_position_through_node() {
        let mut node: Node = Identifier::new("x", Position::NONE).into();
        node.set_position(Position::new(2, 2, 10, 11));
        assert_eq!(node.position(), Position::new(2, 2, 10, 11));
    }
}
