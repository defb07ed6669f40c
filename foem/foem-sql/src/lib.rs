//! # foem-sql
//!
//! Transpiler for the SQL of the FOEM benchmark queries. The queries are
//! written for PostgreSQL; this crate turns them into SQL that Databricks
//! accepts, rewriting the PostgreSQL ways of computing a number of days
//! between two dates into `DATEDIFF`.
//!
//! You probably want to start with the [transpile] function.
//!
//! ```ascii
//!              source SQL
//!
//!                  │ params::normalize_pyformat
//!                  ▼
//!          (parse) │ parser::parse
//!                  ▼
//!
//!          sqlparser::ast::Statement
//!
//!        (rewrite) │ rewrite::rewrite_date_diffs
//!                  │ (postgres -> databricks only)
//!                  ▼
//!         (render) │ DialectHandler + Display
//!                  ▼
//!
//!              target SQL
//! ```
//!
//! ## Common use-cases
//!
//! - Transpile a query at run time.
//!
//!   ```
//!   # fn main() -> Result<(), foem_sql::Error> {
//!   use foem_sql::Dialect;
//!
//!   let sql = foem_sql::transpile(
//!       "SELECT person_id FROM visit_occurrence WHERE (visit_end_date - visit_start_date) > 30",
//!       Dialect::Postgres,
//!       Dialect::Databricks,
//!   )?;
//!   assert_eq!(
//!       sql,
//!       "SELECT person_id FROM visit_occurrence WHERE DATEDIFF(visit_end_date, visit_start_date) > 30"
//!   );
//!   # Ok(())
//!   # }
//!   ```
//!
//! - Transpile query files from the command line.
//!
//!   ```sh
//!   $ foem-sql transpile query.sql query.databricks.sql --from postgres --to databricks
//!   ```
//!
//! ## Feature flags
//!
//! * `cli`: enables the `foem-sql` CLI binary. This is enabled by default. When
//!   consuming this crate from another rust library, it can be disabled.

#![forbid(unsafe_code)]

use std::path::Path;
use std::sync::OnceLock;

use semver::Version;
use serde::{Deserialize, Serialize};

pub use error::{Error, ErrorSource, Reason, WithErrorInfo};
pub use sql::Dialect;

/// Alias of [Error], for callers that import several crates' errors.
pub type TranspileError = Error;

pub mod debug;
mod error;
pub mod params;
pub mod parser;
pub mod rewrite;
pub mod sql;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Get the version of the transpiler. This is determined by, in order:
/// - An optional environment variable `FOEM_VERSION_OVERRIDE`. Note that this
///   needs to be set the first time this function is called, since it's stored
///   in a static.
/// - The version in the cargo manifest
pub fn version() -> &'static Version {
    static VERSION: OnceLock<Version> = OnceLock::new();
    VERSION.get_or_init(|| {
        let cargo_version = Version::new(
            env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or_default(),
            env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or_default(),
            env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or_default(),
        );
        match std::env::var("FOEM_VERSION_OVERRIDE") {
            Ok(version_override) => Version::parse(&version_override).unwrap_or_else(|e| {
                log::warn!("Could not parse foem-sql version {version_override}\n{e}");
                cargo_version
            }),
            Err(_) => cargo_version,
        }
    })
}

/// Transpilation options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Options {
    /// Dialect the input is written in.
    ///
    /// Defaults to postgres.
    pub source: Dialect,

    /// Dialect to produce.
    ///
    /// Defaults to databricks.
    pub target: Dialect,

    /// Pass generated SQL string trough a formatter that splits it
    /// into multiple lines and prettifies indentation and spacing.
    ///
    /// Defaults to false.
    pub format: bool,

    /// Emits the transpiler signature as a comment after generated SQL
    ///
    /// Defaults to false.
    pub signature_comment: bool,

    /// Rewrite `%(name)s` parameter markers to `:name` before parsing.
    ///
    /// Defaults to true.
    pub pyformat_params: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            source: Dialect::Postgres,
            target: Dialect::Databricks,
            format: false,
            signature_comment: false,
            pyformat_params: true,
        }
    }
}

impl Options {
    pub fn with_source(mut self, source: Dialect) -> Self {
        self.source = source;
        self
    }

    pub fn with_target(mut self, target: Dialect) -> Self {
        self.target = target;
        self
    }

    pub fn with_format(mut self, format: bool) -> Self {
        self.format = format;
        self
    }

    pub fn no_format(self) -> Self {
        self.with_format(false)
    }

    pub fn with_signature_comment(mut self, signature_comment: bool) -> Self {
        self.signature_comment = signature_comment;
        self
    }

    pub fn with_pyformat_params(mut self, pyformat_params: bool) -> Self {
        self.pyformat_params = pyformat_params;
        self
    }

    /// Day-difference idioms are only rewritten from postgres to databricks.
    /// Any other pair of dialects is passed through the parser and renderer
    /// alone.
    pub fn rewrites_date_diffs(&self) -> bool {
        self.source == Dialect::Postgres && self.target == Dialect::Databricks
    }
}

/// Transpile `sql` from the `source` dialect to the `target` dialect.
///
/// This is [transpile_with] with default [Options] for everything but the
/// dialects.
pub fn transpile(sql: &str, source: Dialect, target: Dialect) -> Result<String> {
    let options = Options::default().with_source(source).with_target(target);
    transpile_with(sql, &options)
}

/// Transpile `sql` as configured by `options`.
///
/// This is a wrapper for:
/// - [params::normalize_pyformat], if enabled
/// - [parser::parse] in the source dialect
/// - [rewrite::rewrite_date_diffs], for postgres to databricks
/// - rendering in the target dialect
pub fn transpile_with(sql: &str, options: &Options) -> Result<String> {
    debug::log_stage(debug::Stage::Parsing);
    debug::log_entry(|| debug::DebugEntryKind::ReprSource(sql.to_string()));

    let source = if options.pyformat_params {
        params::normalize_pyformat(sql)
    } else {
        sql.into()
    };

    let mut statements = parser::parse(&source, options.source).map_err(|e| {
        if !options.pyformat_params && params::has_pyformat(&source) {
            e.push_hint("the query contains `%(name)s` markers; enable pyformat params to parse them")
        } else {
            e
        }
    })?;
    debug::log_entry(|| debug::DebugEntryKind::ReprAst(statements.clone()));

    if options.rewrites_date_diffs() {
        debug::log_stage(debug::Stage::Rewriting);
        let rewrites = rewrite::rewrite_date_diffs(&mut statements);
        log::debug!("rewrote {rewrites} day difference(s)");
    }

    debug::log_stage(debug::Stage::Rendering);
    let target = sql::render(statements, options)?;
    debug::log_entry(|| debug::DebugEntryKind::ReprSql(target.clone()));

    Ok(target)
}

/// Transpile the query in the file at `input`.
///
/// When `output` is given, the result is also written there, creating missing
/// parent directories. The transpiled SQL is returned either way.
pub fn transpile_file(
    input: &Path,
    output: Option<&Path>,
    source: Dialect,
    target: Dialect,
) -> Result<String> {
    let sql = std::fs::read_to_string(input).map_err(|e| Error::new_io(input, e))?;

    let transpiled = transpile(&sql, source, target)?;

    if let Some(output) = output {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::new_io(parent, e))?;
        }
        std::fs::write(output, &transpiled).map_err(|e| Error::new_io(output, e))?;
        log::info!("transpiled SQL saved to {}", output.display());
    }

    Ok(transpiled)
}
