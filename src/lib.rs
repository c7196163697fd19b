//! A small line-oriented interactive shell.
//!
//! This crate reads one command line at a time, recognizes a handful of
//! built-in commands (`cd`, `pwd`, `history`, `exit`) and otherwise launches
//! external programs, optionally connected by a single pipe (`|`), optionally
//! run in the background (`&`), or chained as two commands with the
//! short-circuiting sequential operator (`&&`). It is intentionally small and
//! easy to read, suitable for experiments with process management and command
//! parsing.
//!
//! The main entry point is [`Interpreter`], which owns the [`Session`] state
//! (environment and command history) and drives the read-eval loop. The public
//! modules [`command`], [`env`] and [`history`] expose the traits and types
//! the interpreter is built from.

mod builtin;
pub mod command;
pub mod env;
mod external;
pub mod history;
mod interpreter;
mod lexer;
mod parser;

/// Convenient re-exports of the interactive command runner and its state.
pub use interpreter::{Interpreter, Session};
