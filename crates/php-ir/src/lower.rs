//! Surface tree to IR.
//!
//! Lowering is total over parser output, recovered syntax errors included:
//! every surface node type has an IR counterpart, positions and trivia move
//! over unchanged, and spelling variants collapse into one IR node with an
//! operator or flag field.

use php_ast::{self as ast, Collection, InvalidPosition, Position};
use php_lexer::{split_literal, unescape, Quote};
use thiserror::Error;

use crate::ir::{self, AssignOp, BinaryOp, UnaryOp};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LowerError {
    /// A node of a type the IR slot it was found in cannot hold.
    #[error("cannot lower {type_name} at offset {}", position.start_offset)]
    UnhandledNode {
        type_name: &'static str,
        position: Position,
    },
    #[error(transparent)]
    InvalidPosition(#[from] InvalidPosition),
}

/// State carried through the lowering of one file.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Current namespace, e.g. `App\Models`; `None` in the global namespace.
    namespace: Option<String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

/// Conversion of a surface value into its IR form.
pub trait Lower {
    type Output;

    fn lower(self, cx: &mut Context) -> Result<Self::Output, LowerError>;
}

/// Lower a whole file. Any [`LowerError`] aborts the file: no partial tree
/// is returned.
#[tracing::instrument(skip_all)]
pub fn lower(root: ast::Root) -> Result<ir::Root, LowerError> {
    root.lower(&mut Context::new())
}

fn check_position(position: Position) -> Result<Position, LowerError> {
    Ok(position.validate()?)
}

impl<T: Lower> Lower for Box<T> {
    type Output = Box<T::Output>;

    fn lower(self, cx: &mut Context) -> Result<Self::Output, LowerError> {
        (*self).lower(cx).map(Box::new)
    }
}

impl<T: Lower> Lower for Option<T> {
    type Output = Option<T::Output>;

    fn lower(self, cx: &mut Context) -> Result<Self::Output, LowerError> {
        self.map(|inner| inner.lower(cx)).transpose()
    }
}

impl<T: Lower> Lower for Vec<T> {
    type Output = Vec<T::Output>;

    fn lower(self, cx: &mut Context) -> Result<Self::Output, LowerError> {
        self.into_iter().map(|item| item.lower(cx)).collect()
    }
}

impl Lower for String {
    type Output = String;

    fn lower(self, _cx: &mut Context) -> Result<String, LowerError> {
        Ok(self)
    }
}

impl Lower for bool {
    type Output = bool;

    fn lower(self, _cx: &mut Context) -> Result<bool, LowerError> {
        Ok(self)
    }
}

// =============================================================================
// Field-by-field lowerings
// =============================================================================

/// `Src { a, b }` lowers to `ir::Src { a, b }`; `Src as Dst { a, b }` to
/// `ir::Dst`. Entries after `;` set IR-only fields.
macro_rules! lower_fields {
    ($(
        $src:ident $(as $dst:ident)? { $($field:ident),* $(; $($flag:ident = $value:expr),+)? }
    )*) => {
        $(
            lower_fields!(@impl $src [$($dst)?] { $($field),* } [$($($flag = $value),+)?]);
        )*
    };
    (@impl $src:ident [] { $($field:ident),* } [$($flag:ident = $value:expr),*]) => {
        lower_fields!(@impl $src [$src] { $($field),* } [$($flag = $value),*]);
    };
    (@impl $src:ident [$dst:ident] { $($field:ident),* } [$($flag:ident = $value:expr),*]) => {
        impl Lower for ast::$src {
            type Output = ir::$dst;

            #[allow(unused_variables)]
            fn lower(self, cx: &mut Context) -> Result<ir::$dst, LowerError> {
                let position = check_position(self.position)?;
                Ok(ir::$dst {
                    $($field: self.$field.lower(cx)?,)*
                    $($flag: $value,)*
                    position,
                    free_floating: self.free_floating,
                })
            }
        }
    };
}

lower_fields! {
    Root { stmts }
    Identifier { value }
    Nullable { expr }
    Parameter { by_ref, variadic, variable_type, variable, default_value }
    Argument { variadic, is_reference, expr }
    ArgumentList { arguments }

    Lnumber { value }
    Dnumber { value }
    Encapsed { parts }
    EncapsedStringPart { value }
    Heredoc { label, parts }
    MagicConstant { value }

    SimpleVar { name }
    Var { expr }

    ArrayExpr { items; short_syntax = false }
    ShortArrayExpr as ArrayExpr { items; short_syntax = true }
    ArrayItemExpr { key, val, unpack }
    ListExpr { items; short_syntax = false }
    ShortListExpr as ListExpr { items; short_syntax = true }
    ArrayDimFetchExpr { variable, dim, curly_brace }
    ArrowFunctionExpr { returns_ref, is_static, doc_comment, params, return_type, expr }
    ClosureExpr { returns_ref, is_static, doc_comment, params, closure_use, return_type, stmts }
    ClosureUseExpr { uses }

    BitwiseNotExpr as UnaryPrefixExpr { expr; op = UnaryOp::BitwiseNot }
    BooleanNotExpr as UnaryPrefixExpr { expr; op = UnaryOp::BooleanNot }
    UnaryMinusExpr as UnaryPrefixExpr { expr; op = UnaryOp::Minus }
    UnaryPlusExpr as UnaryPrefixExpr { expr; op = UnaryOp::Plus }
    PostIncExpr as UnaryPostfixExpr { variable; op = UnaryOp::Increment }
    PostDecExpr as UnaryPostfixExpr { variable; op = UnaryOp::Decrement }

    ClassConstFetchExpr { class, constant_name }
    CloneExpr { expr }
    ConstFetchExpr { constant }
    EmptyExpr { expr }
    ErrorSuppressExpr { expr }
    EvalExpr { expr }
    ExitExpr { die, expr }
    FunctionCallExpr { function, argument_list }
    IncludeExpr as ImportExpr { expr; func = "include".to_string() }
    IncludeOnceExpr as ImportExpr { expr; func = "include_once".to_string() }
    RequireExpr as ImportExpr { expr; func = "require".to_string() }
    RequireOnceExpr as ImportExpr { expr; func = "require_once".to_string() }
    InstanceOfExpr { expr, class }
    IssetExpr { variables }
    MethodCallExpr { variable, method, argument_list }
    NewExpr { class, argument_list }
    ParenExpr { expr }
    PrintExpr { expr }
    PropertyFetchExpr { variable, property }
    ReferenceExpr { variable }
    ShellExecExpr { parts }
    StaticCallExpr { class, call, argument_list }
    StaticPropertyFetchExpr { class, property }
    TernaryExpr { condition, if_true, if_false }
    YieldExpr { key, value }
    YieldFromExpr { expr }

    Assign { variable, expression; op = AssignOp::Assign }
    AssignReference { variable, expression }
    AssignBitwiseAnd as Assign { variable, expression; op = AssignOp::BitwiseAnd }
    AssignBitwiseOr as Assign { variable, expression; op = AssignOp::BitwiseOr }
    AssignBitwiseXor as Assign { variable, expression; op = AssignOp::BitwiseXor }
    AssignCoalesce as Assign { variable, expression; op = AssignOp::Coalesce }
    AssignConcat as Assign { variable, expression; op = AssignOp::Concat }
    AssignDiv as Assign { variable, expression; op = AssignOp::Div }
    AssignMinus as Assign { variable, expression; op = AssignOp::Minus }
    AssignMod as Assign { variable, expression; op = AssignOp::Mod }
    AssignMul as Assign { variable, expression; op = AssignOp::Mul }
    AssignPlus as Assign { variable, expression; op = AssignOp::Plus }
    AssignPow as Assign { variable, expression; op = AssignOp::Pow }
    AssignShiftLeft as Assign { variable, expression; op = AssignOp::ShiftLeft }
    AssignShiftRight as Assign { variable, expression; op = AssignOp::ShiftRight }

    BitwiseAndExpr as BinaryExpr { left, right; op = BinaryOp::BitwiseAnd }
    BitwiseOrExpr as BinaryExpr { left, right; op = BinaryOp::BitwiseOr }
    BitwiseXorExpr as BinaryExpr { left, right; op = BinaryOp::BitwiseXor }
    BooleanAndExpr as BinaryExpr { left, right; op = BinaryOp::BooleanAnd }
    BooleanOrExpr as BinaryExpr { left, right; op = BinaryOp::BooleanOr }
    CoalesceExpr as BinaryExpr { left, right; op = BinaryOp::Coalesce }
    ConcatExpr as BinaryExpr { left, right; op = BinaryOp::Concat }
    DivExpr as BinaryExpr { left, right; op = BinaryOp::Div }
    EqualExpr as BinaryExpr { left, right; op = BinaryOp::Equal }
    GreaterExpr as BinaryExpr { left, right; op = BinaryOp::Greater }
    GreaterOrEqualExpr as BinaryExpr { left, right; op = BinaryOp::GreaterOrEqual }
    IdenticalExpr as BinaryExpr { left, right; op = BinaryOp::Identical }
    LogicalAndExpr as BinaryExpr { left, right; op = BinaryOp::LogicalAnd }
    LogicalOrExpr as BinaryExpr { left, right; op = BinaryOp::LogicalOr }
    LogicalXorExpr as BinaryExpr { left, right; op = BinaryOp::LogicalXor }
    MinusExpr as BinaryExpr { left, right; op = BinaryOp::Minus }
    ModExpr as BinaryExpr { left, right; op = BinaryOp::Mod }
    MulExpr as BinaryExpr { left, right; op = BinaryOp::Mul }
    NotEqualExpr as BinaryExpr { left, right; op = BinaryOp::NotEqual }
    NotIdenticalExpr as BinaryExpr { left, right; op = BinaryOp::NotIdentical }
    PlusExpr as BinaryExpr { left, right; op = BinaryOp::Plus }
    PowExpr as BinaryExpr { left, right; op = BinaryOp::Pow }
    ShiftLeftExpr as BinaryExpr { left, right; op = BinaryOp::ShiftLeft }
    ShiftRightExpr as BinaryExpr { left, right; op = BinaryOp::ShiftRight }
    SmallerExpr as BinaryExpr { left, right; op = BinaryOp::Smaller }
    SmallerOrEqualExpr as BinaryExpr { left, right; op = BinaryOp::SmallerOrEqual }
    SpaceshipExpr as BinaryExpr { left, right; op = BinaryOp::Spaceship }

    CastArray as TypeCastExpr { expr; type_name = "array".to_string() }
    CastBool as TypeCastExpr { expr; type_name = "bool".to_string() }
    CastDouble as TypeCastExpr { expr; type_name = "float".to_string() }
    CastInt as TypeCastExpr { expr; type_name = "int".to_string() }
    CastObject as TypeCastExpr { expr; type_name = "object".to_string() }
    CastString as TypeCastExpr { expr; type_name = "string".to_string() }
    CastUnset as UnsetCastExpr { expr }

    AltIfStmt as IfStmt { cond, stmt, else_if, else_stmt; alt_syntax = true }
    AltElseIfStmt as ElseIfStmt { cond, stmt; alt_syntax = true }
    AltElseStmt as ElseStmt { stmt; alt_syntax = true }
    AltForStmt as ForStmt { init, cond, step, stmt; alt_syntax = true }
    AltForeachStmt as ForeachStmt { expr, key, variable, stmt; alt_syntax = true }
    AltSwitchStmt as SwitchStmt { cond, case_list; alt_syntax = true }
    AltWhileStmt as WhileStmt { cond, stmt; alt_syntax = true }

    BreakStmt { expr }
    CaseStmt { cond, stmts }
    CaseListStmt { cases }
    CatchStmt { types, variable, stmts }
    ClassConstListStmt { doc_comment, modifiers, consts }
    ClassExtendsStmt { class_name }
    ClassImplementsStmt { interface_names }
    ClassMethodStmt { returns_ref, doc_comment, method_name, modifiers, params, return_type, stmt }
    ConstListStmt { consts }
    ConstantStmt { doc_comment, constant_name, expr }
    ContinueStmt { expr }
    DefaultStmt { stmts }
    DoStmt { stmt, cond }
    EchoStmt { exprs }
    ElseStmt { stmt; alt_syntax = false }
    ElseIfStmt { cond, stmt; alt_syntax = false }
    ExpressionStmt { expr }
    FinallyStmt { stmts }
    ForStmt { init, cond, step, stmt; alt_syntax = false }
    ForeachStmt { expr, key, variable, stmt; alt_syntax = false }
    FunctionStmt { returns_ref, doc_comment, function_name, params, return_type, stmts }
    GlobalStmt { vars }
    GotoStmt { label }
    GroupUseStmt { use_type, prefix, use_list }
    HaltCompilerStmt {}
    IfStmt { cond, stmt, else_if, else_stmt; alt_syntax = false }
    InlineHtmlStmt { value }
    InterfaceStmt { doc_comment, interface_name, extends, stmts }
    InterfaceExtendsStmt { interface_names }
    LabelStmt { label_name }
    NopStmt {}
    PropertyStmt { doc_comment, variable, expr }
    PropertyListStmt { doc_comment, modifiers, property_type, properties }
    ReturnStmt { expr }
    StaticStmt { vars }
    StaticVarStmt { variable, expr }
    StmtList { stmts }
    SwitchStmt { cond, case_list; alt_syntax = false }
    ThrowStmt { expr }
    TraitStmt { doc_comment, trait_name, stmts }
    TraitAdaptationListStmt { adaptations }
    TraitMethodRefStmt { trait_name, method }
    TraitUseStmt { traits, adaptation_list }
    TraitUseAliasStmt { trait_ref, modifier, alias }
    TraitUsePrecedenceStmt { trait_ref, insteadof }
    TryStmt { stmts, catches, finally }
    UnsetStmt { vars }
    UseStmt { use_type, use_name, alias }
    UseListStmt { use_type, uses }
    WhileStmt { cond, stmt; alt_syntax = false }
}

// =============================================================================
// Lowerings that inspect their input
// =============================================================================

impl Lower for ast::Bad {
    type Output = ir::Node;

    fn lower(self, _cx: &mut Context) -> Result<ir::Node, LowerError> {
        let position = check_position(self.position)?;
        let free_floating = self.free_floating;
        Ok(if self.statement {
            ir::BadStmt {
                position,
                free_floating,
            }
            .into()
        } else {
            ir::BadExpr {
                position,
                free_floating,
            }
            .into()
        })
    }
}

/// Join `parts` with `\` into one name. The parts' trivia is appended to the
/// name's own, keeping source order.
fn flatten_name(
    position: Position,
    mut free_floating: Collection,
    parts: Vec<ast::NamePart>,
    qualify: impl FnOnce(String) -> String,
) -> Result<ir::Name, LowerError> {
    let position = check_position(position)?;
    let mut value = String::new();
    for part in parts {
        check_position(part.position)?;
        if !value.is_empty() {
            value.push('\\');
        }
        value.push_str(&part.value);
        for (key, trivia) in part.free_floating.iter() {
            free_floating.push(key, trivia.clone());
        }
    }
    Ok(ir::Name {
        value: qualify(value),
        position,
        free_floating,
    })
}

impl Lower for ast::NamePart {
    type Output = ir::Name;

    fn lower(self, _cx: &mut Context) -> Result<ir::Name, LowerError> {
        Ok(ir::Name {
            value: self.value,
            position: check_position(self.position)?,
            free_floating: self.free_floating,
        })
    }
}

impl Lower for ast::Name {
    type Output = ir::Name;

    fn lower(self, _cx: &mut Context) -> Result<ir::Name, LowerError> {
        flatten_name(self.position, self.free_floating, self.parts, |name| name)
    }
}

impl Lower for ast::FullyQualified {
    type Output = ir::Name;

    fn lower(self, _cx: &mut Context) -> Result<ir::Name, LowerError> {
        flatten_name(self.position, self.free_floating, self.parts, |name| {
            format!("\\{name}")
        })
    }
}

impl Lower for ast::Relative {
    type Output = ir::Name;

    fn lower(self, cx: &mut Context) -> Result<ir::Name, LowerError> {
        let namespace = cx.namespace.as_deref();
        flatten_name(self.position, self.free_floating, self.parts, |name| match namespace {
            Some(namespace) => format!("\\{namespace}\\{name}"),
            None => format!("\\{name}"),
        })
    }
}

impl Lower for ast::NamespaceStmt {
    type Output = ir::NamespaceStmt;

    fn lower(self, cx: &mut Context) -> Result<ir::NamespaceStmt, LowerError> {
        let position = check_position(self.position)?;
        let namespace_name = self.namespace_name.lower(cx)?;
        let name = match namespace_name.as_deref() {
            Some(ir::Node::Name(name)) => Some(name.value.clone()),
            None | Some(ir::Node::BadExpr(_)) => None,
            Some(other) => {
                return Err(LowerError::UnhandledNode {
                    type_name: other.type_name(),
                    position: ast::AstNode::position(other),
                })
            }
        };

        // `namespace A;` holds until the next namespace statement, a braced
        // body only for itself.
        let stmts = match self.stmts {
            Some(stmts) => {
                let outer = std::mem::replace(&mut cx.namespace, name);
                let stmts = stmts.lower(cx);
                cx.namespace = outer;
                Some(stmts?)
            }
            None => {
                cx.namespace = name;
                None
            }
        };

        Ok(ir::NamespaceStmt {
            namespace_name,
            stmts,
            position,
            free_floating: self.free_floating,
        })
    }
}

impl Lower for ast::StringLiteral {
    type Output = ir::Node;

    fn lower(self, _cx: &mut Context) -> Result<ir::Node, LowerError> {
        let position = check_position(self.position)?;
        let free_floating = self.free_floating;
        let interpreted = split_literal(&self.value).map(|(body, quote)| {
            let value = unescape(body, quote).map_err(|err| (body.to_string(), err.to_string()));
            (quote == Quote::Double, value)
        });

        Ok(match interpreted {
            // The bare offset of `"$a[key]"` has no quotes to strip.
            None => ir::StringLiteral {
                value: self.value,
                double_quotes: false,
                position,
                free_floating,
            }
            .into(),
            Some((double_quotes, Ok(value))) => ir::StringLiteral {
                value,
                double_quotes,
                position,
                free_floating,
            }
            .into(),
            Some((double_quotes, Err((value, error)))) => ir::BadString {
                value,
                error,
                double_quotes,
                position,
                free_floating,
            }
            .into(),
        })
    }
}

impl Lower for ast::ClassStmt {
    type Output = ir::Node;

    fn lower(self, cx: &mut Context) -> Result<ir::Node, LowerError> {
        let position = check_position(self.position)?;
        let Some(class_name) = self.class_name else {
            return Ok(ir::AnonClassExpr {
                doc_comment: self.doc_comment,
                argument_list: self.argument_list.lower(cx)?,
                extends: self.extends.lower(cx)?,
                implements: self.implements.lower(cx)?,
                stmts: self.stmts.lower(cx)?,
                position,
                free_floating: self.free_floating,
            }
            .into());
        };
        Ok(ir::ClassStmt {
            doc_comment: self.doc_comment,
            class_name: class_name.lower(cx)?,
            modifiers: self.modifiers.lower(cx)?,
            extends: self.extends.lower(cx)?,
            implements: self.implements.lower(cx)?,
            stmts: self.stmts.lower(cx)?,
            position,
            free_floating: self.free_floating,
        }
        .into())
    }
}

impl Lower for ast::PreIncExpr {
    type Output = ir::UnaryPrefixExpr;

    fn lower(self, cx: &mut Context) -> Result<ir::UnaryPrefixExpr, LowerError> {
        let position = check_position(self.position)?;
        Ok(ir::UnaryPrefixExpr {
            op: UnaryOp::Increment,
            expr: self.variable.lower(cx)?,
            position,
            free_floating: self.free_floating,
        })
    }
}

impl Lower for ast::PreDecExpr {
    type Output = ir::UnaryPrefixExpr;

    fn lower(self, cx: &mut Context) -> Result<ir::UnaryPrefixExpr, LowerError> {
        let position = check_position(self.position)?;
        Ok(ir::UnaryPrefixExpr {
            op: UnaryOp::Decrement,
            expr: self.variable.lower(cx)?,
            position,
            free_floating: self.free_floating,
        })
    }
}

impl Lower for ast::DeclareStmt {
    type Output = ir::DeclareStmt;

    fn lower(self, cx: &mut Context) -> Result<ir::DeclareStmt, LowerError> {
        let position = check_position(self.position)?;
        Ok(ir::DeclareStmt {
            consts: self.consts.lower(cx)?,
            stmt: self.stmt.lower(cx)?,
            alt_syntax: self.alt,
            position,
            free_floating: self.free_floating,
        })
    }
}

// =============================================================================
// Node dispatch
// =============================================================================

macro_rules! lower_node {
    ($node:expr, $cx:expr; $($variant:ident),* $(,)?) => {
        match $node {
            $(ast::Node::$variant(n) => n.lower($cx).map(ir::Node::from),)*
        }
    };
}

impl Lower for ast::Node {
    type Output = ir::Node;

    fn lower(self, cx: &mut Context) -> Result<ir::Node, LowerError> {
        lower_node!(self, cx;
            Root, Bad, Identifier, NamePart, Name, FullyQualified, Relative, Nullable, Parameter,
            Argument, ArgumentList,
            Lnumber, Dnumber, StringLiteral, Encapsed, EncapsedStringPart, Heredoc, MagicConstant,
            SimpleVar, Var,
            ArrayExpr, ShortArrayExpr, ArrayItemExpr, ListExpr, ShortListExpr, ArrayDimFetchExpr,
            ArrowFunctionExpr, ClosureExpr, ClosureUseExpr,
            BitwiseNotExpr, BooleanNotExpr, UnaryMinusExpr, UnaryPlusExpr,
            PreIncExpr, PreDecExpr, PostIncExpr, PostDecExpr,
            ClassConstFetchExpr, CloneExpr, ConstFetchExpr, EmptyExpr, ErrorSuppressExpr,
            EvalExpr, ExitExpr, FunctionCallExpr,
            IncludeExpr, IncludeOnceExpr, RequireExpr, RequireOnceExpr,
            InstanceOfExpr, IssetExpr, MethodCallExpr, NewExpr, ParenExpr, PrintExpr,
            PropertyFetchExpr, ReferenceExpr, ShellExecExpr, StaticCallExpr,
            StaticPropertyFetchExpr, TernaryExpr, YieldExpr, YieldFromExpr,
            Assign, AssignReference, AssignBitwiseAnd, AssignBitwiseOr, AssignBitwiseXor,
            AssignCoalesce, AssignConcat, AssignDiv, AssignMinus, AssignMod, AssignMul,
            AssignPlus, AssignPow, AssignShiftLeft, AssignShiftRight,
            BitwiseAndExpr, BitwiseOrExpr, BitwiseXorExpr, BooleanAndExpr, BooleanOrExpr,
            CoalesceExpr, ConcatExpr, DivExpr, EqualExpr, GreaterExpr, GreaterOrEqualExpr,
            IdenticalExpr, LogicalAndExpr, LogicalOrExpr, LogicalXorExpr, MinusExpr, ModExpr,
            MulExpr, NotEqualExpr, NotIdenticalExpr, PlusExpr, PowExpr, ShiftLeftExpr,
            ShiftRightExpr, SmallerExpr, SmallerOrEqualExpr, SpaceshipExpr,
            CastArray, CastBool, CastDouble, CastInt, CastObject, CastString, CastUnset,
            AltIfStmt, AltElseIfStmt, AltElseStmt, AltForStmt, AltForeachStmt, AltSwitchStmt,
            AltWhileStmt,
            BreakStmt, CaseStmt, CaseListStmt, CatchStmt, ClassStmt, ClassConstListStmt,
            ClassExtendsStmt, ClassImplementsStmt, ClassMethodStmt, ConstListStmt, ConstantStmt,
            ContinueStmt, DeclareStmt, DefaultStmt, DoStmt, EchoStmt, ElseStmt, ElseIfStmt,
            ExpressionStmt, FinallyStmt, ForStmt, ForeachStmt, FunctionStmt, GlobalStmt,
            GotoStmt, GroupUseStmt, HaltCompilerStmt, IfStmt, InlineHtmlStmt, InterfaceStmt,
            InterfaceExtendsStmt, LabelStmt, NamespaceStmt, NopStmt, PropertyStmt,
            PropertyListStmt, ReturnStmt, StaticStmt, StaticVarStmt, StmtList, SwitchStmt,
            ThrowStmt, TraitStmt, TraitAdaptationListStmt, TraitMethodRefStmt, TraitUseStmt,
            TraitUseAliasStmt, TraitUsePrecedenceStmt, TryStmt, UnsetStmt, UseStmt, UseListStmt,
            WhileStmt,
        )
    }
}
