use std::collections::HashMap;

/// Reserved named argument that carries the unparsed tail of the line.
pub const RAW: &str = "raw";

/// The command word that switches a line into help-topic lookup.
pub const HELP: &str = "help";

/// A single command invocation produced from one input line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedCommand {
    /// The command name (`argv[0]`).
    pub name: String,
    /// Positional arguments in the order they were typed.
    pub args: Vec<String>,
    /// Named `key=value` arguments; the raw tail is always present under [`RAW`].
    pub kwargs: HashMap<String, String>,
}

impl ParsedCommand {
    /// Everything after the command name, re-joined with single spaces.
    pub fn raw(&self) -> &str {
        self.kwargs.get(RAW).map(String::as_str).unwrap_or_default()
    }
}

/// What a tokenized line asks the shell to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Nothing was typed; the loop just prompts again.
    Empty,
    /// `help <topic>`: show the description of `topic` instead of dispatching.
    Help(String),
    /// An ordinary command invocation.
    Command(ParsedCommand),
}

/// Returns `Some((key, value))` when `token` contains exactly one `=`.
fn split_named(token: &str) -> Option<(&str, &str)> {
    let (key, value) = token.split_once('=')?;
    if value.contains('=') {
        None
    } else {
        Some((key, value))
    }
}

/// Partitions the tokens following the command name into positional and named arguments.
///
/// A token is named iff it contains exactly one `=`; later duplicates of a key win.
pub fn classify<S: AsRef<str>>(rest: &[S]) -> (Vec<String>, HashMap<String, String>) {
    let mut args = Vec::new();
    let mut kwargs = HashMap::new();
    for token in rest {
        let token = token.as_ref();
        match split_named(token) {
            Some((key, value)) => {
                kwargs.insert(key.to_string(), value.to_string());
            }
            None => args.push(token.to_string()),
        }
    }
    (args, kwargs)
}

/// Builds a [`Line`] from the tokens of one input line.
pub fn parse_line(tokens: Vec<String>) -> Line {
    let mut tokens = tokens.into_iter();
    let Some(name) = tokens.next() else {
        return Line::Empty;
    };
    let rest: Vec<String> = tokens.collect();

    if name == HELP {
        if let Some(topic) = rest.first() {
            return Line::Help(topic.clone());
        }
    }

    let (args, mut kwargs) = classify(&rest);
    kwargs.insert(RAW.to_string(), rest.join(" "));
    Line::Command(ParsedCommand { name, args, kwargs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn command(line: &str) -> ParsedCommand {
        match parse_line(tokenize(line)) {
            Line::Command(cmd) => cmd,
            other => panic!("Expected Line::Command, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_by_equal_count() {
        let (args, kwargs) = classify(&["a=b", "c", "d=e=f"]);
        assert_eq!(args, vec!["c", "d=e=f"]);
        assert_eq!(kwargs.len(), 1);
        assert_eq!(kwargs["a"], "b");
    }

    #[test]
    fn test_classify_empty_value_and_empty_key() {
        let (args, kwargs) = classify(&["key=", "=value"]);
        assert!(args.is_empty());
        assert_eq!(kwargs["key"], "");
        assert_eq!(kwargs[""], "value");
    }

    #[test]
    fn test_later_duplicate_wins() {
        let (_, kwargs) = classify(&["k=1", "k=2"]);
        assert_eq!(kwargs["k"], "2");
    }

    #[test]
    fn test_empty_line() {
        assert_eq!(parse_line(Vec::new()), Line::Empty);
        assert_eq!(parse_line(tokenize("   ")), Line::Empty);
    }

    #[test]
    fn test_raw_tail_is_injected() {
        let cmd = command("connect  host 'port=80' user=me");
        assert_eq!(cmd.name, "connect");
        assert_eq!(cmd.args, vec!["host"]);
        assert_eq!(cmd.kwargs["port"], "80");
        assert_eq!(cmd.kwargs["user"], "me");
        assert_eq!(cmd.raw(), "host port=80 user=me");
    }

    #[test]
    fn test_raw_overrides_user_supplied_raw() {
        let cmd = command("echo raw=mine");
        assert_eq!(cmd.raw(), "raw=mine");
    }

    #[test]
    fn test_raw_empty_without_arguments() {
        let cmd = command("exit");
        assert!(cmd.args.is_empty());
        assert_eq!(cmd.raw(), "");
    }

    #[test]
    fn test_help_with_topic() {
        assert_eq!(
            parse_line(tokenize("help connect extra")),
            Line::Help("connect".to_string())
        );
    }

    #[test]
    fn test_bare_help_is_a_command() {
        let cmd = command("help");
        assert_eq!(cmd.name, HELP);
        assert!(cmd.args.is_empty());
    }
}
