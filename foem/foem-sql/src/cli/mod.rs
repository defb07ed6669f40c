#![cfg(not(target_family = "wasm"))]

use std::env;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::exit;
use std::sync::OnceLock;

use anstream::eprintln;
use anstream::println;
use anyhow::anyhow;
use anyhow::Result;
use clap::{Parser, Subcommand, ValueHint};
use clap_verbosity_flag::LogLevel;
use clio::Output;
use is_terminal::IsTerminal;

use foem_sql::debug;
use foem_sql::{parser, transpile_with, Dialect, Options};

/// Entrypoint called by [`crate::main`]
pub fn main() -> color_eyre::eyre::Result<()> {
    let mut cli = Cli::parse();

    // everything reaches the logger; it decides what to echo and what to keep
    // in the [debug::DebugLog]
    static LOGGER: OnceLock<debug::MessageLogger> = OnceLock::new();
    let echo = cli.verbose.log_level_filter();
    log::set_logger(LOGGER.get_or_init(|| debug::MessageLogger::new(echo)))
        .map(|()| log::set_max_level(log::LevelFilter::Trace))?;

    color_eyre::install()?;
    cli.color.write_global();

    if let Err(error) = cli.command.run() {
        eprintln!("{error}");
        // Copied from
        // https://doc.rust-lang.org/src/std/backtrace.rs.html#1-504, since it's private
        fn backtrace_enabled() -> bool {
            match env::var("RUST_LIB_BACKTRACE") {
                Ok(s) => s != "0",
                Err(_) => match env::var("RUST_BACKTRACE") {
                    Ok(s) => s != "0",
                    Err(_) => false,
                },
            }
        }
        if backtrace_enabled() {
            eprintln!("{:#}", error.backtrace());
        }

        exit(1)
    }

    Ok(())
}

#[derive(Parser, Debug, Clone)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    #[command(flatten)]
    color: colorchoice_clap::Color,

    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity<LoggingHelp>,
}

#[derive(Subcommand, Debug, Clone)]
#[command(name = env!("CARGO_PKG_NAME"), about, version)]
enum Command {
    /// Parse, rewrite day differences & render SQL in another dialect
    Transpile {
        #[command(flatten)]
        io_args: IoArgs,

        /// Dialect of the input
        #[arg(long, default_value = "postgres", env = "FOEM_SOURCE_DIALECT")]
        from: String,

        /// Dialect to transpile to
        #[arg(long, default_value = "databricks", env = "FOEM_TARGET_DIALECT")]
        to: String,

        /// Split the output over multiple lines
        #[arg(long)]
        format: bool,

        /// Append a comment naming the transpiler version and dialects
        #[arg(long)]
        signature_comment: bool,

        /// Keep `%(name)s` markers instead of rewriting them to `:name`
        #[arg(long = "no-pyformat", action = clap::ArgAction::SetFalse)]
        pyformat_params: bool,

        /// On failure, warn and emit the input unchanged
        #[arg(long)]
        lenient: bool,

        /// File path into which to write the debug log to.
        #[arg(long, env = "FOEM_DEBUG_LOG")]
        debug_log: Option<PathBuf>,
    },

    /// Parse into the SQL AST
    Parse {
        #[command(flatten)]
        io_args: IoArgs,

        /// Dialect of the input
        #[arg(long, default_value = "postgres", env = "FOEM_SOURCE_DIALECT")]
        from: String,

        #[arg(value_enum, long, default_value = "yaml")]
        format: Format,
    },

    /// Show available dialect names
    #[command(name = "list-dialects")]
    ListDialects,
}

#[derive(clap::Args, Default, Debug, Clone)]
pub struct IoArgs {
    #[arg(value_parser, default_value = "-", value_hint(ValueHint::FilePath))]
    input: clio::ClioPath,

    #[arg(value_parser, default_value = "-", value_hint(ValueHint::FilePath))]
    output: Output,
}

#[derive(Copy, Clone, Debug, Default)]
struct LoggingHelp;

impl LogLevel for LoggingHelp {
    /// By default, this will only report errors.
    fn default() -> Option<log::Level> {
        Some(log::Level::Error)
    }
    fn verbose_help() -> Option<&'static str> {
        Some("Increase logging verbosity")
    }

    fn verbose_long_help() -> Option<&'static str> {
        Some(
            r#"More `v`s, More verbose logging:
-v shows warnings
-vv shows info
-vvv shows debug
-vvvv shows trace"#,
        )
    }

    fn quiet_help() -> Option<&'static str> {
        Some("Silences logging output")
    }

    fn quiet_long_help() -> Option<&'static str> {
        Some("Silences logging output")
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum Format {
    Json,
    Yaml,
}

impl Command {
    /// Entrypoint called by [`main`]
    pub fn run(&mut self) -> Result<()> {
        match self {
            Command::ListDialects => {
                println!("{}", Dialect::names().join("\n"));
                Ok(())
            }
            _ => self.run_io_command(),
        }
    }

    fn run_io_command(&mut self) -> Result<()> {
        let source = self.read_input()?;

        self.execute(&source)
            .and_then(|buf| Ok(self.write_output(&buf)?))
    }

    fn execute(&self, source: &str) -> Result<Vec<u8>> {
        Ok(match self {
            Command::Parse { from, format, .. } => {
                let statements = parser::parse(source, Dialect::from_name(from)?)?;
                match format {
                    Format::Json => serde_json::to_string_pretty(&statements)?.into_bytes(),
                    Format::Yaml => serde_yaml::to_string(&statements)?.into_bytes(),
                }
            }
            Command::Transpile {
                from,
                to,
                format,
                signature_comment,
                pyformat_params,
                lenient,
                debug_log,
                ..
            } => {
                if debug_log.is_some() {
                    debug::log_start();
                }

                let res = Dialect::from_name(from)
                    .and_then(|source_dialect| {
                        Ok(Options::default()
                            .with_source(source_dialect)
                            .with_target(Dialect::from_name(to)?)
                            .with_format(*format)
                            .with_signature_comment(*signature_comment)
                            .with_pyformat_params(*pyformat_params))
                    })
                    .and_then(|opts| transpile_with(source, &opts));

                if let Some(path) = debug_log {
                    write_log(path)?;
                }

                let sql = match res {
                    Ok(sql) => sql,
                    Err(error) if *lenient => {
                        log::warn!("{error}; emitting the query unchanged");
                        source.to_string()
                    }
                    Err(error) => return Err(error.into()),
                };
                sql.into_bytes()
            }
            Command::ListDialects => unreachable!("Other commands shouldn't reach `execute`"),
        })
    }

    fn read_input(&mut self) -> Result<String> {
        let io_args = match self {
            Command::Transpile { io_args, .. } | Command::Parse { io_args, .. } => io_args,
            Command::ListDialects => unreachable!(),
        };
        let input = &io_args.input;

        // Don't wait without a prompt when reading a query from a terminal.
        if input.path() == Path::new("-") && std::io::stdin().is_terminal() {
            #[cfg(unix)]
            eprintln!("Enter SQL, then press ctrl-d to transpile:\n");
            #[cfg(windows)]
            eprintln!("Enter SQL, then press ctrl-z to transpile:\n");
        }

        let mut source = String::new();
        input.clone().open()?.read_to_string(&mut source)?;
        Ok(source)
    }

    fn write_output(&mut self, data: &[u8]) -> std::io::Result<()> {
        let mut output = match self {
            Command::Transpile { io_args, .. } | Command::Parse { io_args, .. } => {
                io_args.output.clone()
            }
            Command::ListDialects => unreachable!(),
        };
        output.write_all(data)
    }
}

pub fn write_log(path: &Path) -> Result<()> {
    let debug_log = if let Some(debug_log) = debug::log_finish() {
        debug_log
    } else {
        return Err(anyhow!(
            "debug log was started, but it cannot be found after transpilation"
        ));
    };
    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let file = BufWriter::new(File::create(path)?);
            serde_json::to_writer(file, &debug_log)?;
        }
        _ => {
            return Err(anyhow!("unknown debug log format for file {path:?}"));
        }
    }
    Ok(())
}
