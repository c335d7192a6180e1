use crate::completion::{Complete, ShellHelper};
use rustyline::config::{CompletionType, Config};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Result as IoResult, Write};
use std::rc::Rc;

/// One result of waiting for user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A complete line, without the trailing newline.
    Line(String),
    /// The user pressed Ctrl-C while the line was being edited.
    Interrupted,
    /// End of input (Ctrl-D, closed pipe, exhausted script).
    Eof,
}

/// The blocking "read one line" step of the dispatch loop.
///
/// `completer` is the current shell's completion source; readers that support tab-completion
/// consult it while the line is being edited.
pub trait LineReader {
    fn read_line(&mut self, prompt: &str, completer: &Rc<dyn Complete>) -> IoResult<Input>;
}

/// Terminal input backed by a rustyline editor, shared by all nested shells of a session.
pub struct EditorInput {
    editor: Editor<ShellHelper, DefaultHistory>,
}

impl EditorInput {
    pub fn new() -> rustyline::Result<Self> {
        let config = Config::builder()
            .completion_type(CompletionType::List)
            .build();
        let editor = Editor::with_config(config)?;
        Ok(Self { editor })
    }
}

fn readline_to_io(err: ReadlineError) -> io::Error {
    match err {
        ReadlineError::Io(e) => e,
        other => io::Error::other(other.to_string()),
    }
}

impl LineReader for EditorInput {
    fn read_line(&mut self, prompt: &str, completer: &Rc<dyn Complete>) -> IoResult<Input> {
        self.editor
            .set_helper(Some(ShellHelper::new(Rc::clone(completer))));
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor
                        .add_history_entry(line.as_str())
                        .map_err(readline_to_io)?;
                }
                Ok(Input::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::Eof),
            Err(err) => Err(readline_to_io(err)),
        }
    }
}

/// Scripted input for driving a session without a terminal.
///
/// Every prompt the loop displays is recorded, so callers can check which shell was current
/// when each line was read. Once the script runs out the reader reports [`Input::Eof`].
pub struct ScriptedInput {
    script: VecDeque<Input>,
    prompts: Rc<RefCell<Vec<String>>>,
}

impl ScriptedInput {
    /// Create a reader that returns `lines` one by one.
    pub fn new<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            script: lines.into_iter().map(|l| Input::Line(l.into())).collect(),
            prompts: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Append an arbitrary input event to the script.
    pub fn then(mut self, input: Input) -> Self {
        self.script.push_back(input);
        self
    }

    /// Shared handle to the prompts seen so far.
    pub fn prompts(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.prompts)
    }
}

impl LineReader for ScriptedInput {
    fn read_line(&mut self, prompt: &str, _completer: &Rc<dyn Complete>) -> IoResult<Input> {
        self.prompts.borrow_mut().push(prompt.to_string());
        Ok(self.script.pop_front().unwrap_or(Input::Eof))
    }
}

/// Memory-backed writer for capturing shell output.
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl Default for MemWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl MemWriter {
    pub fn new() -> Self {
        Self {
            buf: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Return inner Rc so caller can read collected bytes after the session ran.
    pub fn into_inner(self) -> Rc<RefCell<Vec<u8>>> {
        self.buf
    }

    /// Convenience: create writer and return (writer, rc_handle).
    pub fn with_handle() -> (Self, Rc<RefCell<Vec<u8>>>) {
        let mw = MemWriter::new();
        let rc = mw.buf.clone();
        (mw, rc)
    }

    /// Lossy UTF-8 view of everything written through `handle`.
    pub fn text(handle: &Rc<RefCell<Vec<u8>>>) -> String {
        String::from_utf8_lossy(&handle.borrow()).into_owned()
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}
