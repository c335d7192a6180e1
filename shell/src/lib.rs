//! A small framework for nested, line-oriented command shells.
//!
//! A shell is a named set of commands. Each input line is split into shell words, the words
//! after the command name are sorted into positional and `key=value` arguments, and the
//! matching handler runs with the bound arguments. A handler may enter another shell; the
//! prompt then shows the whole nesting path (`root.sub.subsub> `) until that shell exits.
//!
//! The main entry points are [`Shell`], which owns a shell's state and its [`Registry`] of
//! commands, and [`Session`], which carries the [`ShellStack`], the line reader and the output
//! streams through every nested shell.
//!
//! ```no_run
//! use nested_shell::{Command, Flow, Registry, Session, Shell};
//!
//! let commands = Registry::new().command(
//!     Command::new("greet", |_: &mut (), session: &mut Session, args| {
//!         session.print(format!("hello, {}", args.get("who").unwrap_or("world")));
//!         Ok(Flow::Continue)
//!     })
//!     .optional("who")
//!     .describe("say hello"),
//! );
//! let mut session = Session::interactive()?;
//! session.enter(&mut Shell::new("root", (), commands));
//! # Ok::<(), anyhow::Error>(())
//! ```

mod builtin;
pub mod command;
pub mod completion;
pub mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod parser;
pub mod signal;
pub mod stack;

pub use command::{ArgumentError, Args, Command, Flow, Registry, Signature};
pub use interpreter::{DispatchError, ProcessExit, RecordExit, Session, Shell, Terminate};
pub use io_adapters::{EditorInput, Input, LineReader, MemWriter, ScriptedInput};
pub use parser::{Line, ParsedCommand};
pub use stack::{Frame, ShellStack, StackGuard};
