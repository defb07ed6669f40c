use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use sqlparser::parser::ParserError;

use crate::sql::Dialect;

/// A transpiler error.
///
/// There is a single error type for the whole pipeline. It always keeps the
/// error that caused it (see [ErrorSource]), so a caller can tell malformed
/// source SQL apart from a construct the target dialect cannot express.
///
/// Recognizer misses are never errors; an expression that doesn't match one of
/// the day-difference idioms is passed through unchanged.
#[derive(Debug)]
pub struct Error {
    pub reason: Reason,
    pub hints: Vec<String>,
    pub source: ErrorSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    /// The parser of the source dialect rejected the query.
    Parse { dialect: Dialect },
    /// The input contains no statements.
    Empty,
    /// The target dialect has no way of expressing a construct of the query.
    Unsupported { construct: String, dialect: Dialect },
    Io { path: PathBuf },
    NotFound { name: String, namespace: String },
}

/// The underlying cause of an [Error].
#[derive(Debug, Default)]
pub enum ErrorSource {
    Parser(ParserError),
    Io(std::io::Error),
    #[default]
    None,
}

impl Error {
    pub fn new(reason: Reason) -> Self {
        Error {
            reason,
            hints: Vec::new(),
            source: ErrorSource::None,
        }
    }

    pub fn new_parse(dialect: Dialect, error: ParserError) -> Self {
        Error::new(Reason::Parse { dialect }).with_source(ErrorSource::Parser(error))
    }

    pub fn new_io<P: Into<PathBuf>>(path: P, error: std::io::Error) -> Self {
        Error::new(Reason::Io { path: path.into() }).with_source(ErrorSource::Io(error))
    }

    pub fn new_unsupported<S: ToString>(construct: S, dialect: Dialect) -> Self {
        Error::new(Reason::Unsupported {
            construct: construct.to_string(),
            dialect,
        })
    }

    /// Whether the error was raised while parsing the source query, as opposed
    /// to while rendering it or doing IO.
    pub fn is_parse_error(&self) -> bool {
        matches!(self.reason, Reason::Parse { .. } | Reason::Empty)
    }
}

impl Display for Reason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Parse { dialect } => write!(f, "invalid {dialect} SQL"),
            Reason::Empty => f.write_str("no statement was parsed"),
            Reason::Unsupported { construct, dialect } => {
                write!(f, "`{construct}` cannot be expressed in {dialect}")
            }
            Reason::Io { path } => write!(f, "cannot access `{}`", path.display()),
            Reason::NotFound { name, namespace } => write!(f, "{namespace} `{name}` not found"),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Error transpiling query: {}", self.reason)?;
        match &self.source {
            ErrorSource::Parser(e) => write!(f, ": {e}")?,
            ErrorSource::Io(e) => write!(f, ": {e}")?,
            ErrorSource::None => {}
        }
        for hint in &self.hints {
            write!(f, "\n↳ Hint: {hint}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.source {
            ErrorSource::Parser(e) => Some(e),
            ErrorSource::Io(e) => Some(e),
            ErrorSource::None => None,
        }
    }
}

pub trait WithErrorInfo: Sized {
    fn push_hint<S: Into<String>>(self, hint: S) -> Self;

    fn with_source(self, source: ErrorSource) -> Self;
}

impl WithErrorInfo for Error {
    fn push_hint<S: Into<String>>(mut self, hint: S) -> Self {
        self.hints.push(hint.into());
        self
    }

    fn with_source(mut self, source: ErrorSource) -> Self {
        self.source = source;
        self
    }
}

impl<T, E: WithErrorInfo> WithErrorInfo for Result<T, E> {
    fn push_hint<S: Into<String>>(self, hint: S) -> Self {
        self.map_err(|e| e.push_hint(hint))
    }

    fn with_source(self, source: ErrorSource) -> Self {
        self.map_err(|e| e.with_source(source))
    }
}
