use crate::builtin;
use crate::command::{ArgumentError, Command, Flow, Registry};
use crate::completion::Complete;
use crate::io_adapters::{EditorInput, Input, LineReader};
use crate::lexer;
use crate::parser::{self, HELP, Line, ParsedCommand};
use crate::signal;
use crate::stack::ShellStack;
use log::{debug, warn};
use std::cell::Cell;
use std::fmt::Display;
use std::io::{self, Write};
use std::rc::Rc;
use thiserror::Error;

/// Prefix of every diagnostic line a session writes.
pub const DIAGNOSTIC_PREFIX: &str = "[shell] ";

/// Ends the process after an abort.
pub trait Terminate {
    fn terminate(&mut self, code: i32);
}

/// The production terminator: `std::process::exit`.
pub struct ProcessExit;

impl Terminate for ProcessExit {
    fn terminate(&mut self, code: i32) {
        std::process::exit(code)
    }
}

/// Terminator that only remembers the requested exit status.
#[derive(Debug, Clone, Default)]
pub struct RecordExit {
    code: Rc<Cell<Option<i32>>>,
}

impl RecordExit {
    pub fn new() -> Self {
        Self::default()
    }

    /// The status passed to the last `terminate` call, if any.
    pub fn code(&self) -> Option<i32> {
        self.code.get()
    }
}

impl Terminate for RecordExit {
    fn terminate(&mut self, code: i32) {
        self.code.set(Some(code));
    }
}

/// Why a line was not (successfully) executed. Every variant is reported and the loop goes on.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No command (or help topic) of that name.
    #[error("invalid command")]
    UnknownCommand(String),
    /// The arguments do not fit the command's declared parameters.
    #[error("{command}: {source}")]
    Arguments {
        command: String,
        source: ArgumentError,
    },
    /// The handler itself returned an error.
    #[error("{command}: {error:#}")]
    Failed {
        command: String,
        error: anyhow::Error,
    },
}

/// State shared by all shells nested in one interactive session.
///
/// The session is passed explicitly to every handler; a handler enters a nested shell with
/// [`Session::enter`], which returns only after the nested shell has exited.
pub struct Session {
    stack: ShellStack,
    input: Box<dyn LineReader>,
    out: Box<dyn Write>,
    diag: Box<dyn Write>,
    terminator: Box<dyn Terminate>,
}

impl Session {
    /// Create a session reading from `input`, printing to stdout, reporting to stderr and
    /// exiting the process on abort.
    pub fn new(input: Box<dyn LineReader>) -> Self {
        Self {
            stack: ShellStack::new(),
            input,
            out: Box::new(io::stdout()),
            diag: Box::new(io::stderr()),
            terminator: Box::new(ProcessExit),
        }
    }

    /// A terminal session with line editing, tab-completion and signal handling.
    pub fn interactive() -> anyhow::Result<Self> {
        let session = Self::new(Box::new(EditorInput::new()?));
        signal::install(session.stack.clone())?;
        Ok(session)
    }

    pub fn with_output(mut self, out: impl Write + 'static) -> Self {
        self.out = Box::new(out);
        self
    }

    pub fn with_diagnostics(mut self, diag: impl Write + 'static) -> Self {
        self.diag = Box::new(diag);
        self
    }

    pub fn with_terminator(mut self, terminator: impl Terminate + 'static) -> Self {
        self.terminator = Box::new(terminator);
        self
    }

    pub fn with_stack(mut self, stack: ShellStack) -> Self {
        self.stack = stack;
        self
    }

    pub fn stack(&self) -> &ShellStack {
        &self.stack
    }

    /// Output stream for command results.
    pub fn out(&mut self) -> &mut dyn Write {
        &mut *self.out
    }

    /// Write one line of regular output.
    pub fn print(&mut self, text: impl Display) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            warn!("failed to write output: {}", e);
        }
    }

    /// Write one `[shell] ` diagnostic line.
    pub fn report(&mut self, message: impl Display) {
        if let Err(e) = writeln!(self.diag, "{}{}", DIAGNOSTIC_PREFIX, message) {
            warn!("failed to write diagnostic: {}", e);
        }
    }

    /// Run `shell` as the innermost shell of this session.
    ///
    /// Its frame is pushed before the motd is shown and popped when its loop ends, however it
    /// ends. Returns [`Flow::Continue`] after a regular exit, so the calling shell keeps going,
    /// and [`Flow::Abort`] after an abort.
    pub fn enter<S: 'static>(&mut self, shell: &mut Shell<S>) -> Flow {
        let frame = self.stack.push(shell.segment.as_str(), shell.name.as_str());
        debug!("entered shell {:?} at depth {}", shell.name, frame.depth());
        if let Some(motd) = shell.motd.clone() {
            self.print(motd);
        }

        let flow = shell.cmdloop(self);
        drop(frame);
        debug!("left shell {:?} ({:?})", shell.name, flow);

        match flow {
            Flow::Abort => Flow::Abort,
            Flow::Continue | Flow::Exit => Flow::Continue,
        }
    }

    /// Interrupt while reading: notice, pop, terminate.
    fn abort(&mut self) -> Flow {
        self.print(signal::ABORT_NOTICE);
        self.stack.pop();
        self.terminator.terminate(signal::ABORT_STATUS);
        Flow::Abort
    }
}

/// One (possibly nested) shell: a name, an optional greeting, user state and commands.
pub struct Shell<S> {
    name: String,
    segment: String,
    motd: Option<String>,
    state: S,
    registry: Rc<Registry<S>>,
}

impl<S: 'static> Shell<S> {
    /// Create a shell; `clear`, `exit` and `quit` are added unless `registry` defines them.
    pub fn new(name: impl Into<String>, state: S, mut registry: Registry<S>) -> Self {
        builtin::install(&mut registry);
        let name = name.into();
        Self {
            segment: name.clone(),
            name,
            motd: None,
            state,
            registry: Rc::new(registry),
        }
    }

    /// Greeting printed when the shell is entered.
    pub fn with_motd(mut self, motd: impl Into<String>) -> Self {
        self.motd = Some(motd.into());
        self
    }

    /// Prompt segment, if it should differ from the name.
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = segment.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }

    pub fn registry(&self) -> &Registry<S> {
        &self.registry
    }

    /// Candidates for tab-completing `line` in this shell.
    pub fn complete(&self, line: &str) -> Vec<String> {
        self.registry.complete(line)
    }

    /// The dispatch loop: prompt, read, execute, until a command asks to leave.
    fn cmdloop(&mut self, session: &mut Session) -> Flow {
        let completer: Rc<dyn Complete> = self.registry.clone();
        loop {
            let prompt = session.stack.prompt();
            let flow = match session.input.read_line(&prompt, &completer) {
                Ok(Input::Line(line)) => self.onecmd(session, &line),
                Ok(Input::Eof) => Flow::Exit,
                Ok(Input::Interrupted) => session.abort(),
                Err(e) => {
                    session.report(format_args!("input error: {}", e));
                    Flow::Exit
                }
            };
            if flow != Flow::Continue {
                return flow;
            }
        }
    }

    /// Execute a single line. Failures are reported and answered with [`Flow::Continue`].
    pub fn onecmd(&mut self, session: &mut Session, line: &str) -> Flow {
        match self.dispatch(session, line) {
            Ok(flow) => flow,
            Err(e) => {
                debug!("line {:?} failed: {:?}", line, e);
                session.report(e);
                Flow::Continue
            }
        }
    }

    fn dispatch(&mut self, session: &mut Session, line: &str) -> Result<Flow, DispatchError> {
        match parser::parse_line(lexer::tokenize(line)) {
            Line::Empty => Ok(Flow::Continue),
            Line::Help(topic) => {
                let text = self
                    .registry
                    .get(&topic)
                    .and_then(Command::description)
                    .ok_or(DispatchError::UnknownCommand(topic.clone()))?;
                session.print(format_args!("\n{}\n", text));
                Ok(Flow::Continue)
            }
            Line::Command(cmd) => self.execute(session, &cmd),
        }
    }

    fn execute(&mut self, session: &mut Session, cmd: &ParsedCommand) -> Result<Flow, DispatchError> {
        let Some(command) = self.registry.get(&cmd.name) else {
            if cmd.name == HELP {
                session.print(builtin::listing(&self.registry));
                return Ok(Flow::Continue);
            }
            return Err(DispatchError::UnknownCommand(cmd.name.clone()));
        };

        let args = command
            .signature()
            .bind(cmd)
            .map_err(|source| DispatchError::Arguments {
                command: cmd.name.clone(),
                source,
            })?;

        debug!("dispatching {:?}", cmd.name);
        command
            .invoke(&mut self.state, session, &args)
            .map_err(|error| DispatchError::Failed {
                command: cmd.name.clone(),
                error,
            })
    }
}
