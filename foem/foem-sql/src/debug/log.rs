//! Collection of debug information about a single transpilation.
#![doc(hidden)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockWriteGuard};
use std::time::SystemTime;

use chrono::prelude::*;
use serde::Serialize;
use sqlparser::ast::Statement;
use strum_macros::AsRefStr;

/// Stores debug info about current transpilation.
/// Is reset by [log_start] and [log_finish].
static CURRENT_LOG: RwLock<Option<DebugLog>> = RwLock::new(None);

/// Mirrors `CURRENT_LOG.is_some()`, so transpilations without a log never
/// touch the lock.
static LOG_ENABLED: AtomicBool = AtomicBool::new(false);

fn current_log() -> RwLockWriteGuard<'static, Option<DebugLog>> {
    CURRENT_LOG.write().unwrap_or_else(PoisonError::into_inner)
}

/// Start collecting a log. A log that is already being collected is kept.
pub fn log_start() {
    let mut lock = current_log();
    if lock.is_some() {
        return;
    }

    let started_at: DateTime<Utc> = SystemTime::now().into();
    let started_at = format!("{}", started_at.format("%+"));

    *lock = Some(DebugLog {
        started_at,
        version: crate::version().to_string(),
        entries: Vec::new(),

        current_stage: Stage::Parsing,
    });
    LOG_ENABLED.store(true, Ordering::Release);
}

pub fn log_finish() -> Option<DebugLog> {
    let mut lock = current_log();
    LOG_ENABLED.store(false, Ordering::Release);
    lock.take()
}

pub fn log_is_enabled() -> bool {
    LOG_ENABLED.load(Ordering::Acquire)
}

pub fn log_stage(stage: Stage) {
    if !log_is_enabled() {
        return;
    }
    if let Some(log) = current_log().as_mut() {
        log.current_stage = stage;
    }
}

/// Append an entry to the current log. `entry` is not called when no log is
/// being collected.
pub fn log_entry(entry: impl FnOnce() -> DebugEntryKind) {
    if !log_is_enabled() {
        return;
    }
    if let Some(log) = current_log().as_mut() {
        let entry = DebugEntry {
            stage: log.current_stage,
            kind: entry(),
        };
        log.entries.push(entry);
    }
}

#[derive(Serialize)]
pub struct DebugLog {
    pub started_at: String,
    pub version: String,
    pub entries: Vec<DebugEntry>,

    #[serde(skip)]
    current_stage: Stage,
}

#[derive(Serialize)]
pub struct DebugEntry {
    pub stage: Stage,
    pub kind: DebugEntryKind,
}

#[derive(Serialize, AsRefStr)]
pub enum DebugEntryKind {
    ReprSource(String),
    ReprAst(Vec<Statement>),
    Rewrite {
        idiom: String,
        before: String,
        after: String,
    },
    ReprSql(String),
    Message(Message),
}

#[derive(Serialize)]
pub struct Message {
    pub level: String,
    pub module_path: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub text: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, AsRefStr)]
pub enum Stage {
    Parsing,
    Rewriting,
    Rendering,
}
