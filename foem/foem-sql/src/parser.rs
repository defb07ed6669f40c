//! Parsing of source queries, delegated to [sqlparser].

use sqlparser::ast::Statement;
use sqlparser::parser::Parser;

use crate::sql::Dialect;
use crate::{Error, Reason, Result};

/// Parse SQL text written in `dialect` into statements.
///
/// Fails if the text does not parse, or if it contains no statement at all.
pub fn parse(sql: &str, dialect: Dialect) -> Result<Vec<Statement>> {
    let statements = Parser::parse_sql(dialect.parser().as_ref(), sql)
        .map_err(|e| Error::new_parse(dialect, e))?;

    if statements.is_empty() {
        return Err(Error::new(Reason::Empty));
    }

    log::debug!("parsed {} statement(s) as {dialect}", statements.len());
    Ok(statements)
}
