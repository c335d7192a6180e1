//! Tab-completion: resolving candidates for a partially typed line.

use crate::command::Registry;
use crate::lexer;
use crate::parser::{self, HELP, Line};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::rc::Rc;

/// Source of completion candidates for the line typed so far.
pub trait Complete {
    fn complete(&self, line: &str) -> Vec<String>;
}

impl<S> Complete for Registry<S> {
    fn complete(&self, line: &str) -> Vec<String> {
        complete_line(self, line)
    }
}

/// Command names of `registry` starting with `prefix`, including the loop's own `help`.
fn command_names<S>(registry: &Registry<S>, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = registry.names().map(str::to_string).collect();
    if registry.get(HELP).is_none() {
        names.push(HELP.to_string());
        names.sort();
    }
    names.retain(|n| n.starts_with(prefix));
    names
}

/// Candidates for the partial `line` (everything left of the cursor).
///
/// While the first word is being typed the candidates are command names, and so is the
/// single word after `help`. After that, a command with a completion provider answers with
/// the provider's candidates for the parsed line, and any other known command offers its
/// declared parameter names. Unknown commands and malformed lines get no candidates.
pub fn complete_line<S>(registry: &Registry<S>, line: &str) -> Vec<String> {
    let Ok(tokens) = lexer::split_into_tokens(line) else {
        return Vec::new();
    };
    let word_finished = line.ends_with(lexer::is_separator);

    match tokens.len() {
        0 => return command_names(registry, ""),
        1 if !word_finished => return command_names(registry, &tokens[0]),
        _ => {}
    }

    let count = tokens.len();
    match parser::parse_line(tokens) {
        Line::Empty => command_names(registry, ""),
        // Only the first word after `help` is a topic.
        Line::Help(topic) if count == 2 && !word_finished => command_names(registry, &topic),
        Line::Help(_) => Vec::new(),
        Line::Command(cmd) if cmd.name == HELP && count == 1 => command_names(registry, ""),
        Line::Command(cmd) => match registry.get(&cmd.name) {
            Some(command) => command
                .completions(&cmd)
                .unwrap_or_else(|| command.signature().names()),
            None => Vec::new(),
        },
    }
}

/// rustyline helper that forwards completion to the current shell.
pub struct ShellHelper {
    completer: Rc<dyn Complete>,
}

impl ShellHelper {
    pub fn new(completer: Rc<dyn Complete>) -> Self {
        Self { completer }
    }

    /// Replacement start and candidates for the word under the cursor at `pos`.
    ///
    /// Words are delimited by spaces only, so `key=value` stays a single word.
    pub fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<String>) {
        let before = &line[..pos];
        let start = before.rfind(' ').map(|i| i + 1).unwrap_or(0);
        let word = &before[start..];
        let candidates = self
            .completer
            .complete(before)
            .into_iter()
            .filter(|c| c.starts_with(word))
            .collect();
        (start, candidates)
    }
}

impl Helper for ShellHelper {}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, candidates) = self.candidates(line, pos);
        let pairs = candidates
            .into_iter()
            .map(|c| Pair {
                display: c.clone(),
                replacement: c,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, Flow};

    fn registry() -> Registry<()> {
        Registry::new()
            .command(
                Command::new("connect", |_, _, _| Ok(Flow::Continue))
                    .param("host")
                    .optional("port"),
            )
            .command(Command::new("copy", |_, _, _| Ok(Flow::Continue)).variadic())
            .command(
                Command::new("color", |_, _, _| Ok(Flow::Continue))
                    .param("name")
                    .complete(|cmd| {
                        let typed = cmd.args.first().map(String::as_str).unwrap_or("");
                        ["red", "green", "blue"]
                            .iter()
                            .filter(|c| c.starts_with(typed))
                            .map(|c| c.to_string())
                            .collect()
                    }),
            )
    }

    #[test]
    fn test_declared_parameters_without_provider() {
        assert_eq!(complete_line(&registry(), "connect "), vec!["host", "port"]);
    }

    #[test]
    fn test_provider_gets_parsed_arguments() {
        assert_eq!(complete_line(&registry(), "color gr"), vec!["green"]);
        assert_eq!(
            complete_line(&registry(), "color "),
            vec!["red", "green", "blue"]
        );
    }

    #[test]
    fn test_no_parameters_means_no_candidates() {
        assert!(complete_line(&registry(), "copy ").is_empty());
    }

    #[test]
    fn test_unknown_command_yields_nothing() {
        assert!(complete_line(&registry(), "launch ").is_empty());
    }

    #[test]
    fn test_command_names() {
        assert_eq!(complete_line(&registry(), "co"), vec!["color", "connect", "copy"]);
        assert_eq!(
            complete_line(&registry(), ""),
            vec!["color", "connect", "copy", "help"]
        );
        assert_eq!(complete_line(&registry(), "help con"), vec!["connect"]);
    }

    #[test]
    fn test_help_topics() {
        assert_eq!(
            complete_line(&registry(), "help "),
            vec!["color", "connect", "copy", "help"]
        );
        assert_eq!(complete_line(&registry(), "help  c"), vec!["color", "connect", "copy"]);
        assert!(complete_line(&registry(), "help connect ").is_empty());
        assert!(complete_line(&registry(), "help con x").is_empty());
    }

    #[test]
    fn test_helper_completes_help_topic() {
        let helper = ShellHelper::new(Rc::new(registry()));
        assert_eq!(
            helper.candidates("help col", 8),
            (5, vec!["color".to_string()])
        );
        assert_eq!(helper.candidates("help ", 5).1.len(), 4);
    }

    #[test]
    fn test_unbalanced_quote_yields_nothing() {
        assert!(complete_line(&registry(), "connect 'half").is_empty());
    }

    #[test]
    fn test_helper_filters_by_current_word() {
        let helper = ShellHelper::new(Rc::new(registry()));
        assert_eq!(helper.candidates("connect ho", 10), (8, vec!["host".to_string()]));
        assert_eq!(
            helper.candidates("co", 2),
            (0, vec!["color".to_string(), "connect".to_string(), "copy".to_string()])
        );
    }
}
