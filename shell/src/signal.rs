//! Graceful exit on interrupt and termination requests.
//!
//! Ctrl-C typed while a line is being edited reaches the dispatch loop as an interrupted read
//! and is handled there. Signals that arrive at any other time (SIGINT while a command runs,
//! SIGTERM from outside) are caught by a `ctrlc` handler thread. Both paths print the same
//! notice, pop the current shell and exit with [`ABORT_STATUS`].
//!
//! The handler thread exits the process without unwinding the line editor, so it puts the
//! terminal back into the mode it had when the handler was installed.

use crate::stack::ShellStack;
use log::debug;

/// Printed before the process goes down.
pub const ABORT_NOTICE: &str = "exiting the shell";

/// Process exit status after an abort.
pub const ABORT_STATUS: i32 = 1;

#[cfg(unix)]
mod terminal {
    use nix::sys::termios::{self, SetArg, Termios};
    use std::io;

    /// Settings of the terminal on standard input, if there is one.
    pub struct SavedTerminal(Option<Termios>);

    impl SavedTerminal {
        pub fn capture() -> Self {
            Self(termios::tcgetattr(io::stdin()).ok())
        }

        pub fn is_terminal(&self) -> bool {
            self.0.is_some()
        }

        pub fn restore(&self) {
            if let Some(saved) = &self.0 {
                let _ = termios::tcsetattr(io::stdin(), SetArg::TCSANOW, saved);
            }
        }
    }
}

#[cfg(not(unix))]
mod terminal {
    pub struct SavedTerminal;

    impl SavedTerminal {
        pub fn capture() -> Self {
            Self
        }

        pub fn is_terminal(&self) -> bool {
            false
        }

        pub fn restore(&self) {}
    }
}

use terminal::SavedTerminal;

/// Install the process-wide signal handler for `stack`.
///
/// Only one handler can exist per process; a second call keeps the first handler and succeeds.
pub fn install(stack: ShellStack) -> Result<(), ctrlc::Error> {
    let terminal = SavedTerminal::capture();
    debug!("terminal settings saved: {}", terminal.is_terminal());

    let result = ctrlc::set_handler(move || {
        terminal.restore();
        println!("{}", ABORT_NOTICE);
        stack.pop();
        std::process::exit(ABORT_STATUS);
    });
    match result {
        Ok(()) => {
            debug!("signal handler installed");
            Ok(())
        }
        Err(ctrlc::Error::MultipleHandlers) => {
            debug!("signal handler already installed");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_twice_keeps_first_handler() {
        let first = ShellStack::new();
        let _root = first.push("root", "root");
        assert!(install(first.clone()).is_ok());

        let second = ShellStack::new();
        assert!(install(second).is_ok());

        // Installing must leave the stack alone.
        assert_eq!(first.prompt(), "root> ");
    }

    #[test]
    fn test_restore_without_terminal_is_harmless() {
        let terminal = SavedTerminal::capture();
        terminal.restore();
        terminal.restore();
    }
}
