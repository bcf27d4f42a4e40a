use std::fmt;

use crate::{
    ast::{AssignOperator, BinaryOperator, Expr, ExprKind, UnaryOperator},
    symbols::SymbolTable,
};

/// The type of a value. Both are held in a 64-bit word; a `bool` is always 0
/// or 1.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Bool,
}

impl Type {
    /// Looks up the type written in an annotation.
    pub fn from_name(name: &str) -> Option<Type> {
        match name {
            "int" => Some(Type::Int),
            "bool" => Some(Type::Bool),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("int"),
            Type::Bool => f.write_str("bool"),
        }
    }
}

/// What a binary operator accepts on both sides.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operands {
    /// Arithmetic and ordering.
    Int,
    /// `and`, `or` and `xor`.
    Bool,
    /// Equality: anything, as long as both sides agree.
    Same,
}

pub fn operands(op: BinaryOperator) -> Operands {
    use BinaryOperator::*;
    match op {
        Add | Sub | Mul | Div | Mod | Lt | Le | Gt | Ge => Operands::Int,
        And | Or | Xor => Operands::Bool,
        Eq | Ne => Operands::Same,
    }
}

pub fn binary_result(op: BinaryOperator) -> Type {
    use BinaryOperator::*;
    match op {
        Add | Sub | Mul | Div | Mod => Type::Int,
        Eq | Ne | Lt | Le | Gt | Ge | And | Or | Xor => Type::Bool,
    }
}

/// Checks the operand types of `op`, returning the type of the result.
pub fn check_binary(op: BinaryOperator, lhs: Type, rhs: Type) -> Option<Type> {
    let accepted = match operands(op) {
        Operands::Int => lhs == Type::Int && rhs == Type::Int,
        Operands::Bool => lhs == Type::Bool && rhs == Type::Bool,
        Operands::Same => lhs == rhs,
    };
    accepted.then(|| binary_result(op))
}

/// The operand type of a unary operator, which is also its result type.
pub fn unary_operand(op: UnaryOperator) -> Type {
    match op {
        UnaryOperator::Neg => Type::Int,
        UnaryOperator::Not => Type::Bool,
    }
}

/// Computes the type `expr` would have, without checking its operands.
///
/// Names that don't resolve are taken as `int`; emission reports them.
pub fn infer(expr: &Expr, symbols: &SymbolTable) -> Type {
    match &expr.kind {
        ExprKind::Assignment { target, .. } => symbols
            .resolve(target)
            .map_or(Type::Int, |symbol| symbol.ty),
        ExprKind::Unary { op, .. } => unary_operand(*op),
        ExprKind::Binary { op, .. } => binary_result(*op),
        ExprKind::Paren(inner) => infer(inner, symbols),
        ExprKind::Id(ident) => symbols.resolve(ident).map_or(Type::Int, |symbol| symbol.ty),
        ExprKind::Int(_) => Type::Int,
        ExprKind::Bool(_) => Type::Bool,
    }
}

/// Checks a compound assignment such as `x += v`, returning the type stored.
pub fn check_assign(op: AssignOperator, target: Type, value: Type) -> Option<Type> {
    match op {
        AssignOperator::Assign => (target == value).then_some(target),
        AssignOperator::Compound(op) => {
            check_binary(op, target, value).filter(|result| *result == target)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOperator::*;

    #[test]
    fn test_binary_operands() {
        assert_eq!(check_binary(Add, Type::Int, Type::Int), Some(Type::Int));
        assert_eq!(check_binary(Lt, Type::Int, Type::Int), Some(Type::Bool));
        assert_eq!(check_binary(And, Type::Bool, Type::Bool), Some(Type::Bool));
        assert_eq!(check_binary(Eq, Type::Bool, Type::Bool), Some(Type::Bool));

        assert_eq!(check_binary(Add, Type::Bool, Type::Int), None);
        assert_eq!(check_binary(Ge, Type::Int, Type::Bool), None);
        assert_eq!(check_binary(Xor, Type::Int, Type::Int), None);
        assert_eq!(check_binary(Ne, Type::Int, Type::Bool), None);
    }

    #[test]
    fn test_assign() {
        use AssignOperator::*;
        assert_eq!(check_assign(Assign, Type::Bool, Type::Bool), Some(Type::Bool));
        assert_eq!(check_assign(Assign, Type::Int, Type::Bool), None);
        assert_eq!(check_assign(Compound(Mul), Type::Int, Type::Int), Some(Type::Int));
        assert_eq!(check_assign(Compound(Add), Type::Bool, Type::Bool), None);
    }

    #[test]
    fn test_annotation_names() {
        assert_eq!(Type::from_name("int"), Some(Type::Int));
        assert_eq!(Type::from_name("bool"), Some(Type::Bool));
        assert_eq!(Type::from_name("Int"), None);
        assert_eq!(Type::Bool.to_string(), "bool");
    }
}
