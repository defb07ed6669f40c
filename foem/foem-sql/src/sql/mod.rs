//! Backend for rendering parsed statements as SQL of a target dialect.
//!
//! [sqlparser] renders every tree the same way regardless of dialect, so
//! before rendering we normalise the surface syntax that the target dialect
//! spells differently (see [DialectHandler]), and reject constructs it has no
//! spelling for.

mod dialect;

use std::ops::ControlFlow;

use itertools::Itertools;
use sqlformat::{FormatOptions, QueryParams};
use sqlparser::ast::{
    CastKind, Distinct, Expr, Ident, JoinConstraint, JoinOperator, ObjectName, ObjectNamePart,
    Query, SelectItem, SelectItemQualifiedWildcardKind, SetExpr, Statement, TableAlias,
    TableFactor, VisitMut, VisitorMut,
};

pub use dialect::Dialect;
pub(crate) use dialect::DialectHandler;

use crate::{Error, Options, Result};

/// Render statements in the target dialect of `options`.
///
/// Statements are separated by `;` and a new line. No trailing `;` is emitted.
pub(crate) fn render(mut statements: Vec<Statement>, options: &Options) -> Result<String> {
    let mut normalizer = SurfaceNormalizer {
        handler: options.target.handler(),
        dialect: options.target,
    };

    for statement in &mut statements {
        if let ControlFlow::Break(error) = statement.visit(&mut normalizer) {
            return Err(error);
        }
    }

    let sql = statements.iter().map(|s| s.to_string()).join(";\n");

    let sql = if options.format {
        sqlformat::format(&sql, &QueryParams::None, &FormatOptions::default())
    } else {
        sql
    };

    Ok(if options.signature_comment {
        format!(
            "{sql}\n\n-- Transpiled by foem-sql {} ({} -> {})\n",
            crate::version(),
            options.source,
            options.target
        )
    } else {
        sql
    })
}

/// Rewrites the tree in place so that its [Display](std::fmt::Display) output
/// is valid SQL for `dialect`.
struct SurfaceNormalizer {
    handler: Box<dyn DialectHandler>,
    dialect: Dialect,
}

impl SurfaceNormalizer {
    fn requote(&self, ident: &mut Ident) {
        if let (Some(_), Some(quote)) = (ident.quote_style, self.handler.ident_quote()) {
            ident.quote_style = Some(quote);
        }
    }

    fn requote_object_name(&self, name: &mut ObjectName) {
        for part in &mut name.0 {
            if let ObjectNamePart::Identifier(ident) = part {
                self.requote(ident);
            }
        }
    }

    fn requote_table_alias(&self, alias: &mut TableAlias) {
        self.requote(&mut alias.name);
        for column in &mut alias.columns {
            self.requote(&mut column.name);
        }
    }

    fn check_set_expr(&mut self, set_expr: &mut SetExpr) -> ControlFlow<Error> {
        match set_expr {
            SetExpr::Select(select) => {
                if matches!(select.distinct, Some(Distinct::On(_)))
                    && !self.handler.supports_distinct_on()
                {
                    return ControlFlow::Break(Error::new_unsupported(
                        "DISTINCT ON",
                        self.dialect,
                    ));
                }
                for item in &mut select.projection {
                    match item {
                        SelectItem::ExprWithAlias { alias, .. } => self.requote(alias),
                        SelectItem::QualifiedWildcard(
                            SelectItemQualifiedWildcardKind::ObjectName(name),
                            _,
                        ) => self.requote_object_name(name),
                        _ => {}
                    }
                }
                for join in select.from.iter_mut().flat_map(|t| &mut t.joins) {
                    if let Some(JoinConstraint::Using(columns)) =
                        join_constraint(&mut join.join_operator)
                    {
                        for column in columns {
                            self.requote_object_name(column);
                        }
                    }
                }
            }
            SetExpr::SetOperation { left, right, .. } => {
                self.check_set_expr(left)?;
                self.check_set_expr(right)?;
            }
            _ => {}
        }
        ControlFlow::Continue(())
    }
}

fn join_constraint(operator: &mut JoinOperator) -> Option<&mut JoinConstraint> {
    match operator {
        JoinOperator::Join(constraint)
        | JoinOperator::Inner(constraint)
        | JoinOperator::Left(constraint)
        | JoinOperator::LeftOuter(constraint)
        | JoinOperator::Right(constraint)
        | JoinOperator::RightOuter(constraint)
        | JoinOperator::FullOuter(constraint) => Some(constraint),
        _ => None,
    }
}

impl VisitorMut for SurfaceNormalizer {
    type Break = Error;

    fn pre_visit_query(&mut self, query: &mut Query) -> ControlFlow<Self::Break> {
        if let Some(with) = &mut query.with {
            for cte in &mut with.cte_tables {
                self.requote_table_alias(&mut cte.alias);
            }
        }
        self.check_set_expr(&mut query.body)
    }

    fn pre_visit_relation(&mut self, relation: &mut ObjectName) -> ControlFlow<Self::Break> {
        self.requote_object_name(relation);
        ControlFlow::Continue(())
    }

    fn pre_visit_table_factor(
        &mut self,
        table_factor: &mut TableFactor,
    ) -> ControlFlow<Self::Break> {
        match table_factor {
            TableFactor::Table { alias, .. } | TableFactor::Derived { alias, .. } => {
                if let Some(alias) = alias {
                    self.requote_table_alias(alias);
                }
            }
            _ => {}
        }
        ControlFlow::Continue(())
    }

    fn post_visit_expr(&mut self, expr: &mut Expr) -> ControlFlow<Self::Break> {
        match expr {
            Expr::Identifier(ident) => self.requote(ident),
            Expr::CompoundIdentifier(idents) => {
                for ident in idents {
                    self.requote(ident);
                }
            }
            Expr::Function(function) => self.requote_object_name(&mut function.name),
            Expr::Cast { kind, .. } => {
                if *kind == CastKind::DoubleColon && !self.handler.supports_double_colon_cast() {
                    *kind = CastKind::Cast;
                }
            }
            _ => {}
        }
        ControlFlow::Continue(())
    }
}
