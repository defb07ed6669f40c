//! Recognition and rewriting of day-difference idioms.
//!
//! PostgreSQL has no `DATEDIFF`; the benchmark queries compute a number of
//! days between two dates in one of three ways:
//!
//! - `CAST(EXTRACT(EPOCH FROM (x - y)) / 86400 AS BIGINT)`
//! - `ABS(x - y)`
//! - `(x - y)`
//!
//! When such an expression is compared against a number of days, it is
//! replaced with `DATEDIFF(x, y)` (keeping the `ABS` wrapper when there was
//! one).

use sqlparser::ast::{
    BinaryOperator, CastKind, DataType, DateTimeField, Expr, Function, FunctionArg,
    FunctionArgExpr, FunctionArgumentList, FunctionArguments, Ident, ObjectName, ObjectNamePart,
    TimezoneInfo, UnaryOperator, Value,
};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// The two date-like operands of a day difference, in source order.
///
/// No attempt is made to find out which one is the later date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Operands<'a> {
    pub minuend: &'a Expr,
    pub subtrahend: &'a Expr,
}

/// A recognized day-difference expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DayDiffIdiom<'a> {
    /// `CAST(EXTRACT(EPOCH FROM x - y) / 86400 AS BIGINT)`
    EpochDivision(Operands<'a>),
    /// `ABS(x - y)`
    AbsSub(Operands<'a>),
    /// `x - y`
    BareSub(Operands<'a>),
}

impl<'a> DayDiffIdiom<'a> {
    pub fn operands(&self) -> Operands<'a> {
        match self {
            DayDiffIdiom::EpochDivision(operands)
            | DayDiffIdiom::AbsSub(operands)
            | DayDiffIdiom::BareSub(operands) => *operands,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DayDiffIdiom::EpochDivision(_) => "epoch_division",
            DayDiffIdiom::AbsSub(_) => "abs_sub",
            DayDiffIdiom::BareSub(_) => "bare_sub",
        }
    }
}

/// Comparison operators whose left side may hold a day difference.
pub fn is_comparison(op: &BinaryOperator) -> bool {
    matches!(
        op,
        BinaryOperator::Lt
            | BinaryOperator::LtEq
            | BinaryOperator::Gt
            | BinaryOperator::GtEq
            | BinaryOperator::Eq
            | BinaryOperator::NotEq
    )
}

/// Whether an expression is a number of days.
///
/// That's a numeric literal (optionally signed), a query parameter, or either
/// of those in a cast. Parameters compared to a day difference are always
/// day counts in the benchmark queries, so they count as numeric.
pub fn is_numeric(expr: &Expr) -> bool {
    match expr {
        Expr::Value(_) => is_number_or_placeholder(expr),
        Expr::UnaryOp {
            op: UnaryOperator::Minus | UnaryOperator::Plus,
            expr,
        } => is_number(expr),
        Expr::Cast { expr, .. } => is_number_or_placeholder(expr),
        _ => false,
    }
}

fn is_number(expr: &Expr) -> bool {
    matches!(expr, Expr::Value(v) if matches!(v.value, Value::Number(..)))
}

fn is_number_or_placeholder(expr: &Expr) -> bool {
    matches!(expr, Expr::Value(v) if matches!(v.value, Value::Number(..) | Value::Placeholder(_)))
}

/// Find the day-difference idiom of the left side of a comparison.
///
/// Idioms are tried in a fixed order: epoch division, then `ABS`, then the
/// bare subtraction.
pub fn recognize(expr: &Expr) -> Option<DayDiffIdiom<'_>> {
    epoch_division(expr)
        .map(DayDiffIdiom::EpochDivision)
        .or_else(|| abs_subtraction(expr).map(DayDiffIdiom::AbsSub))
        .or_else(|| subtraction(expr).map(DayDiffIdiom::BareSub))
}

/// Build the `DATEDIFF` replacement for a recognized idiom.
pub fn rewrite(idiom: DayDiffIdiom<'_>) -> Expr {
    match idiom {
        DayDiffIdiom::EpochDivision(operands) | DayDiffIdiom::BareSub(operands) => {
            date_diff(operands)
        }
        DayDiffIdiom::AbsSub(operands) => function_call("ABS", vec![date_diff(operands)]),
    }
}

fn date_diff(operands: Operands<'_>) -> Expr {
    function_call(
        "DATEDIFF",
        vec![operands.minuend.clone(), operands.subtrahend.clone()],
    )
}

fn function_call(name: &str, args: Vec<Expr>) -> Expr {
    let args = FunctionArguments::List(FunctionArgumentList {
        args: args
            .into_iter()
            .map(|arg| FunctionArg::Unnamed(FunctionArgExpr::Expr(arg)))
            .collect(),
        clauses: vec![],
        duplicate_treatment: None,
    });

    Expr::Function(Function {
        name: ObjectName(vec![ObjectNamePart::Identifier(Ident::new(name))]),
        args,
        over: None,
        filter: None,
        null_treatment: None,
        within_group: vec![],
        parameters: FunctionArguments::None,
        uses_odbc_syntax: false,
    })
}

/// `CAST(EXTRACT(EPOCH FROM x - y) / 86400 AS BIGINT)`, or the `::bigint`
/// spelling of it. The divisor must be exactly [SECONDS_PER_DAY].
fn epoch_division(expr: &Expr) -> Option<Operands<'_>> {
    let Expr::Cast {
        kind: CastKind::Cast | CastKind::DoubleColon,
        expr,
        data_type,
        ..
    } = expr
    else {
        return None;
    };
    if !is_integer_type(data_type) {
        return None;
    }

    let Expr::BinaryOp {
        left,
        op: BinaryOperator::Divide,
        right,
    } = unwrap_nested(expr)
    else {
        return None;
    };
    if !is_seconds_per_day(right) {
        return None;
    }

    let Expr::Extract { field, expr, .. } = unwrap_nested(left) else {
        return None;
    };
    if !is_epoch(field) {
        return None;
    }

    subtraction(expr)
}

/// `ABS(x - y)` or `ABS((x - y))`.
fn abs_subtraction(expr: &Expr) -> Option<Operands<'_>> {
    let Expr::Function(function) = expr else {
        return None;
    };
    if !is_plain_call(function, "ABS") {
        return None;
    }

    let FunctionArguments::List(list) = &function.args else {
        return None;
    };
    let [FunctionArg::Unnamed(FunctionArgExpr::Expr(arg))] = list.args.as_slice() else {
        return None;
    };

    subtraction(arg)
}

/// `x - y`, in any number of parentheses. `TIMESTAMP` casts directly around
/// either operand are dropped.
fn subtraction(expr: &Expr) -> Option<Operands<'_>> {
    let Expr::BinaryOp {
        left,
        op: BinaryOperator::Minus,
        right,
    } = unwrap_nested(expr)
    else {
        return None;
    };

    Some(Operands {
        minuend: unwrap_timestamp_cast(left),
        subtrahend: unwrap_timestamp_cast(right),
    })
}

fn unwrap_nested(mut expr: &Expr) -> &Expr {
    while let Expr::Nested(inner) = expr {
        expr = &**inner;
    }
    expr
}

fn unwrap_timestamp_cast(expr: &Expr) -> &Expr {
    match expr {
        Expr::Cast {
            kind: CastKind::Cast | CastKind::DoubleColon,
            expr: inner,
            data_type: DataType::Timestamp(_, TimezoneInfo::None | TimezoneInfo::WithoutTimeZone),
            ..
        } => &**inner,
        _ => expr,
    }
}

fn is_integer_type(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::BigInt(_)
            | DataType::Int(_)
            | DataType::Integer(_)
            | DataType::Int8(_)
            | DataType::Int4(_)
    )
}

fn is_seconds_per_day(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Value(v) if matches!(&v.value, Value::Number(n, _) if n.parse::<i64>() == Ok(SECONDS_PER_DAY))
    )
}

fn is_epoch(field: &DateTimeField) -> bool {
    match field {
        DateTimeField::Epoch => true,
        // `EXTRACT('epoch' FROM ...)`
        DateTimeField::Custom(ident) => ident.value.eq_ignore_ascii_case("epoch"),
        _ => false,
    }
}

/// A call of `name` with no window, filter or other decoration.
fn is_plain_call(function: &Function, name: &str) -> bool {
    let is_named = matches!(
        function.name.0.as_slice(),
        [ObjectNamePart::Identifier(ident)] if ident.value.eq_ignore_ascii_case(name)
    );
    is_named && function.over.is_none() && function.filter.is_none()
}
