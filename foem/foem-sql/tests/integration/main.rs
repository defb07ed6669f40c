mod cli;
mod sql;
