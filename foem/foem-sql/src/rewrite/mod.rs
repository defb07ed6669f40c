//! Tree rewrites applied between parsing and rendering.

pub mod date_diff;

use std::convert::Infallible;
use std::ops::ControlFlow;

use sqlparser::ast::{Expr, Statement, VisitMut, VisitorMut};

use self::date_diff::{is_comparison, is_numeric, recognize, rewrite};
use crate::debug;

/// Replaces day-difference idioms on the left side of comparisons with
/// `DATEDIFF` calls.
///
/// Expressions are visited post-order, so a replacement is never visited
/// again. Only the left child of a comparison is ever replaced.
#[derive(Debug, Default)]
pub struct DateDiffRewriter {
    rewrites: usize,
}

impl DateDiffRewriter {
    /// Number of comparisons rewritten so far.
    pub fn rewrites(&self) -> usize {
        self.rewrites
    }
}

impl VisitorMut for DateDiffRewriter {
    type Break = Infallible;

    fn post_visit_expr(&mut self, expr: &mut Expr) -> ControlFlow<Self::Break> {
        let Expr::BinaryOp { left, op, right } = expr else {
            return ControlFlow::Continue(());
        };
        if !is_comparison(op) || !is_numeric(right) {
            return ControlFlow::Continue(());
        }
        let Some(idiom) = recognize(left) else {
            return ControlFlow::Continue(());
        };

        let name = idiom.name();
        let replacement = rewrite(idiom);

        log::debug!("rewrote {name}: `{left}` -> `{replacement}`");
        debug::log_entry(|| debug::DebugEntryKind::Rewrite {
            idiom: name.to_string(),
            before: left.to_string(),
            after: replacement.to_string(),
        });

        **left = replacement;
        self.rewrites += 1;
        ControlFlow::Continue(())
    }
}

/// Rewrite every day-difference comparison in `statements`, returning how
/// many were rewritten.
pub fn rewrite_date_diffs(statements: &mut [Statement]) -> usize {
    let mut rewriter = DateDiffRewriter::default();
    for statement in statements {
        match statement.visit(&mut rewriter) {
            ControlFlow::Continue(()) => {}
            ControlFlow::Break(never) => match never {},
        }
    }
    rewriter.rewrites()
}
