use crate::interpreter::Session;
use crate::parser::{ParsedCommand, RAW};
use anyhow::Result;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// What a handler asks its dispatch loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading lines in the current shell.
    Continue,
    /// Leave the current shell and return to its parent.
    Exit,
    /// An abort was requested; every shell on the stack unwinds.
    Abort,
}

impl From<bool> for Flow {
    /// `true` is the conventional "stop" answer of a handler.
    fn from(stop: bool) -> Self {
        if stop { Flow::Exit } else { Flow::Continue }
    }
}

/// Why a parsed line could not be bound to a command's declared parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("missing argument '{0}'")]
    Missing(String),
    #[error("unexpected argument '{0}'")]
    Unexpected(String),
    #[error("unexpected keyword argument '{0}'")]
    UnexpectedKeyword(String),
    #[error("multiple values for argument '{0}'")]
    Duplicate(String),
}

/// A declared parameter of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub required: bool,
}

/// The parameter list a command accepts.
///
/// Positional arguments fill the declared parameters in order; a named argument binds to the
/// parameter of the same name. The reserved `raw` argument is always accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    params: Vec<Param>,
    variadic: bool,
    open: bool,
}

impl Signature {
    /// Names of the declared parameters, in declaration order.
    pub fn names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name.clone()).collect()
    }

    fn declares(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }

    /// Binds a parsed line to this signature.
    pub fn bind(&self, cmd: &ParsedCommand) -> Result<Args, ArgumentError> {
        let mut values = HashMap::new();
        for (param, value) in self.params.iter().zip(&cmd.args) {
            values.insert(param.name.clone(), value.clone());
        }

        let rest: Vec<String> = cmd.args.iter().skip(self.params.len()).cloned().collect();
        if let Some(first) = rest.first() {
            if !self.variadic {
                return Err(ArgumentError::Unexpected(first.clone()));
            }
        }

        // Sorted so that the reported key does not depend on hash order.
        let mut keys: Vec<&String> = cmd.kwargs.keys().filter(|k| *k != RAW).collect();
        keys.sort();

        let mut named = HashMap::new();
        for key in keys {
            let value = cmd.kwargs[key].clone();
            if self.declares(key) {
                if values.contains_key(key) {
                    return Err(ArgumentError::Duplicate(key.clone()));
                }
                values.insert(key.clone(), value);
            } else if self.open {
                named.insert(key.clone(), value);
            } else {
                return Err(ArgumentError::UnexpectedKeyword(key.clone()));
            }
        }

        if let Some(missing) = self
            .params
            .iter()
            .find(|p| p.required && !values.contains_key(&p.name))
        {
            return Err(ArgumentError::Missing(missing.name.clone()));
        }

        Ok(Args {
            values,
            rest,
            named,
            raw: cmd.raw().to_string(),
        })
    }
}

/// Arguments bound to a command's [`Signature`], as seen by its handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    values: HashMap<String, String>,
    rest: Vec<String>,
    named: HashMap<String, String>,
    raw: String,
}

impl Args {
    /// Value of a declared parameter; `None` for an optional one that was not given.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Positional arguments beyond the declared ones (variadic commands only).
    pub fn rest(&self) -> &[String] {
        &self.rest
    }

    /// Named arguments that match no declared parameter (open commands only).
    pub fn named(&self) -> &HashMap<String, String> {
        &self.named
    }

    /// The unparsed remainder of the line after the command name.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Handler invoked with the shell's state, the session and the bound arguments.
pub type Handler<S> = dyn Fn(&mut S, &mut Session, &Args) -> Result<Flow>;

/// Custom completion logic; receives the partially typed line, already parsed.
pub type CompletionProvider = dyn Fn(&ParsedCommand) -> Vec<String>;

/// One entry of a [`Registry`].
pub struct Command<S> {
    name: String,
    signature: Signature,
    invoke: Box<Handler<S>>,
    complete: Option<Box<CompletionProvider>>,
    describe: Option<String>,
}

impl<S> Command<S> {
    /// Create a command that takes no parameters.
    pub fn new<F>(name: impl Into<String>, invoke: F) -> Self
    where
        F: Fn(&mut S, &mut Session, &Args) -> Result<Flow> + 'static,
    {
        Self {
            name: name.into(),
            signature: Signature::default(),
            invoke: Box::new(invoke),
            complete: None,
            describe: None,
        }
    }

    /// Declare a required parameter.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.signature.params.push(Param {
            name: name.into(),
            required: true,
        });
        self
    }

    /// Declare an optional parameter.
    pub fn optional(mut self, name: impl Into<String>) -> Self {
        self.signature.params.push(Param {
            name: name.into(),
            required: false,
        });
        self
    }

    /// Accept any number of extra positional arguments.
    pub fn variadic(mut self) -> Self {
        self.signature.variadic = true;
        self
    }

    /// Accept named arguments that match no declared parameter.
    pub fn open(mut self) -> Self {
        self.signature.open = true;
        self
    }

    /// Text printed by `help <name>`.
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.describe = Some(text.into());
        self
    }

    /// Replace parameter-name completion with custom candidates.
    pub fn complete<F>(mut self, provider: F) -> Self
    where
        F: Fn(&ParsedCommand) -> Vec<String> + 'static,
    {
        self.complete = Some(Box::new(provider));
        self
    }

    /// Name the command is typed as.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameters.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Help text, if the command was described.
    pub fn description(&self) -> Option<&str> {
        self.describe.as_deref()
    }

    /// Candidates from the custom completion provider, if the command has one.
    pub fn completions(&self, cmd: &ParsedCommand) -> Option<Vec<String>> {
        self.complete.as_ref().map(|provider| provider(cmd))
    }

    pub(crate) fn invoke(&self, state: &mut S, session: &mut Session, args: &Args) -> Result<Flow> {
        (self.invoke)(state, session, args)
    }
}

/// The commands of one shell, keyed by name.
///
/// Populated once, before the shell is constructed; a shell never changes its commands while
/// it runs.
pub struct Registry<S> {
    commands: BTreeMap<String, Command<S>>,
}

impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self {
            commands: BTreeMap::new(),
        }
    }
}

impl<S> Registry<S> {
    /// An empty registry. [`Shell::new`](crate::Shell::new) adds the built-ins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command, replacing any previous command of the same name.
    pub fn command(mut self, command: Command<S>) -> Self {
        self.register(command);
        self
    }

    /// In-place form of [`Registry::command`].
    pub fn register(&mut self, command: Command<S>) {
        self.commands.insert(command.name.clone(), command);
    }

    /// Add a command only if the name is still free.
    pub(crate) fn register_default(&mut self, command: Command<S>) {
        self.commands.entry(command.name.clone()).or_insert(command);
    }

    /// The command registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Command<S>> {
        self.commands.get(name)
    }

    /// Command names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Commands in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Command<S>> {
        self.commands.values()
    }
}
