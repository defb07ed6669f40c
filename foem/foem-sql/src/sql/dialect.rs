//! Feature map for SQL dialects.
//!
//! Parsing is delegated to the matching [sqlparser] dialect. Rendering is
//! dialect-agnostic in [sqlparser], so each dialect also gets a
//! [DialectHandler] listing the surface conventions of its SQL that differ
//! from the generic rendering: how identifiers are quoted, whether `x::t`
//! casts exist, and which constructs it cannot express at all.
//!
//! Dialect-specifics should be added only if the generic rendering is not
//! accepted by the dialect. Type names, functions and everything else are
//! passed through as parsed.
use core::fmt::Debug;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlparser::dialect as parser_dialect;

use crate::WithErrorInfo;

/// SQL dialect.
///
/// Used both to pick the parser of the source query and to pick the
/// rendering conventions of the target query.
#[derive(
    Debug,
    PartialEq,
    Eq,
    Hash,
    Clone,
    Copy,
    Serialize,
    Default,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::VariantNames,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Ansi,
    BigQuery,
    Databricks,
    DuckDb,
    #[default]
    Generic,
    Hive,
    MsSql,
    MySql,
    Postgres,
    Redshift,
    Snowflake,
    SQLite,
}

impl Dialect {
    /// Names of all dialects, as accepted by [Dialect::from_name].
    pub fn names() -> &'static [&'static str] {
        <Dialect as strum::VariantNames>::VARIANTS
    }

    /// Look up a dialect by name, case-insensitively. `postgresql` is accepted
    /// as an alias of `postgres`.
    pub fn from_name(name: &str) -> crate::Result<Dialect> {
        let normalized = name.trim().to_lowercase();
        let normalized = match normalized.as_str() {
            "postgresql" => "postgres",
            other => other,
        };

        Dialect::from_str(normalized).map_err(|_| {
            crate::Error::new(crate::Reason::NotFound {
                name: format!("{name:?}"),
                namespace: "dialect".to_string(),
            })
            .push_hint(format!("available dialects: {}", Dialect::names().join(", ")))
        })
    }

    pub(crate) fn handler(&self) -> Box<dyn DialectHandler> {
        match self {
            Dialect::Databricks | Dialect::Hive => Box::new(DatabricksDialect),
            Dialect::BigQuery => Box::new(BigQueryDialect),
            Dialect::MySql => Box::new(MySqlDialect),
            Dialect::Postgres | Dialect::Redshift => Box::new(PostgresDialect),
            Dialect::DuckDb => Box::new(DuckDbDialect),
            Dialect::Snowflake => Box::new(SnowflakeDialect),
            Dialect::MsSql | Dialect::SQLite | Dialect::Ansi => Box::new(AnsiDialect),
            Dialect::Generic => Box::new(GenericDialect),
        }
    }

    /// The [sqlparser] dialect used to parse queries written in this dialect.
    pub(crate) fn parser(&self) -> Box<dyn parser_dialect::Dialect> {
        match self {
            Dialect::Ansi => Box::new(parser_dialect::AnsiDialect {}),
            Dialect::BigQuery => Box::new(parser_dialect::BigQueryDialect {}),
            Dialect::Databricks => Box::new(parser_dialect::DatabricksDialect {}),
            Dialect::DuckDb => Box::new(parser_dialect::DuckDbDialect {}),
            Dialect::Generic => Box::new(parser_dialect::GenericDialect {}),
            Dialect::Hive => Box::new(parser_dialect::HiveDialect {}),
            Dialect::MsSql => Box::new(parser_dialect::MsSqlDialect {}),
            Dialect::MySql => Box::new(parser_dialect::MySqlDialect {}),
            Dialect::Postgres => Box::new(parser_dialect::PostgreSqlDialect {}),
            Dialect::Redshift => Box::new(parser_dialect::RedshiftSqlDialect {}),
            Dialect::Snowflake => Box::new(parser_dialect::SnowflakeDialect {}),
            Dialect::SQLite => Box::new(parser_dialect::SQLiteDialect {}),
        }
    }
}

#[derive(Debug)]
pub struct GenericDialect;
#[derive(Debug)]
pub struct AnsiDialect;
#[derive(Debug)]
pub struct PostgresDialect;
#[derive(Debug)]
pub struct DatabricksDialect;
#[derive(Debug)]
pub struct BigQueryDialect;
#[derive(Debug)]
pub struct MySqlDialect;
#[derive(Debug)]
pub struct DuckDbDialect;
#[derive(Debug)]
pub struct SnowflakeDialect;

pub(crate) trait DialectHandler: Debug {
    /// Quote character for quoted identifiers. `None` keeps whatever quoting
    /// the source query used.
    fn ident_quote(&self) -> Option<char> {
        Some('"')
    }

    /// Support for the `expr::type` cast shorthand.
    /// When not supported, we fallback to `CAST(expr AS type)`.
    fn supports_double_colon_cast(&self) -> bool {
        false
    }

    /// Support for `SELECT DISTINCT ON (...)`.
    /// There is no fallback; a query using it cannot be rendered.
    fn supports_distinct_on(&self) -> bool {
        false
    }
}

impl DialectHandler for GenericDialect {
    fn ident_quote(&self) -> Option<char> {
        None
    }

    fn supports_double_colon_cast(&self) -> bool {
        true
    }

    fn supports_distinct_on(&self) -> bool {
        true
    }
}

impl DialectHandler for AnsiDialect {}

impl DialectHandler for PostgresDialect {
    fn supports_double_colon_cast(&self) -> bool {
        true
    }

    fn supports_distinct_on(&self) -> bool {
        true
    }
}

// https://docs.databricks.com/en/sql/language-manual/sql-ref-identifiers.html
impl DialectHandler for DatabricksDialect {
    fn ident_quote(&self) -> Option<char> {
        Some('`')
    }
}

impl DialectHandler for BigQueryDialect {
    fn ident_quote(&self) -> Option<char> {
        Some('`')
    }
}

impl DialectHandler for MySqlDialect {
    fn ident_quote(&self) -> Option<char> {
        Some('`')
    }
}

impl DialectHandler for DuckDbDialect {
    fn supports_double_colon_cast(&self) -> bool {
        true
    }

    fn supports_distinct_on(&self) -> bool {
        true
    }
}

// https://docs.snowflake.com/en/sql-reference/functions/cast
impl DialectHandler for SnowflakeDialect {
    fn supports_double_colon_cast(&self) -> bool {
        true
    }
}
