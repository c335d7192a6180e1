use crate::command::{Args, Command, Flow, Registry};
use crate::interpreter::Session;
use anyhow::Result;
use std::io::Write;

/// ANSI sequence: clear the screen and move the cursor home.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Adds the commands every shell provides, unless the shell registered its own version.
pub(crate) fn install<S: 'static>(registry: &mut Registry<S>) {
    registry.register_default(
        Command::new("clear", clear)
            .variadic()
            .open()
            .describe("clear the console"),
    );
    for name in ["exit", "quit"] {
        registry.register_default(
            Command::new(name, exit)
                .variadic()
                .open()
                .describe("exit the shell"),
        );
    }
}

fn clear<S>(_state: &mut S, session: &mut Session, _args: &Args) -> Result<Flow> {
    let out = session.out();
    write!(out, "{}", CLEAR_SCREEN)?;
    out.flush()?;
    Ok(Flow::Continue)
}

/// The frame itself is popped by the loop once it returns to its caller.
fn exit<S>(_state: &mut S, _session: &mut Session, _args: &Args) -> Result<Flow> {
    Ok(Flow::Exit)
}

fn section(out: &mut String, header: &str, names: &[&str]) {
    if names.is_empty() {
        return;
    }
    out.push_str(header);
    out.push('\n');
    out.push_str(&"=".repeat(header.len()));
    out.push('\n');
    out.push_str(&names.join("  "));
    out.push_str("\n\n");
}

/// Text printed by a bare `help`: documented and undocumented command names.
pub(crate) fn listing<S>(registry: &Registry<S>) -> String {
    let (documented, undocumented): (Vec<&Command<S>>, Vec<&Command<S>>) =
        registry.iter().partition(|c| c.description().is_some());
    let documented: Vec<&str> = documented.into_iter().map(|c| c.name()).collect();
    let undocumented: Vec<&str> = undocumented.into_iter().map(|c| c.name()).collect();

    let mut out = String::from("\n");
    section(&mut out, "Documented commands (type help <topic>):", &documented);
    section(&mut out, "Undocumented commands:", &undocumented);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::{MemWriter, ScriptedInput};

    fn registry() -> Registry<()> {
        let mut registry = Registry::new()
            .command(Command::new("quit", |_, _, _| Ok(Flow::Continue)))
            .command(Command::new("zap", |_, _, _| Ok(Flow::Continue)));
        install(&mut registry);
        registry
    }

    #[test]
    fn test_builtins_present() {
        let registry = registry();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["clear", "exit", "quit", "zap"]);
        assert_eq!(
            registry.get("exit").and_then(Command::description),
            Some("exit the shell")
        );
    }

    #[test]
    fn test_user_command_overrides_builtin() {
        assert_eq!(registry().get("quit").and_then(Command::description), None);
    }

    #[test]
    fn test_builtins_accept_any_arguments() {
        let registry = registry();
        let cmd = match crate::parser::parse_line(vec![
            "exit".into(),
            "now".into(),
            "code=3".into(),
        ]) {
            crate::parser::Line::Command(cmd) => cmd,
            other => panic!("Expected Line::Command, got {:?}", other),
        };
        assert!(registry.get("exit").unwrap().signature().bind(&cmd).is_ok());
    }

    #[test]
    fn test_clear_writes_escape_sequence() {
        let (out, handle) = MemWriter::with_handle();
        let mut session = Session::new(Box::new(ScriptedInput::new(Vec::<String>::new())))
            .with_output(out);
        let flow = clear(&mut (), &mut session, &Args::default()).unwrap();
        assert_eq!(flow, Flow::Continue);
        assert_eq!(MemWriter::text(&handle), CLEAR_SCREEN);
    }

    #[test]
    fn test_listing_sections() {
        let text = listing(&registry());
        let documented = "Documented commands (type help <topic>):";
        let undocumented = "Undocumented commands:";
        assert!(text.contains(&format!(
            "{}\n{}\nclear  exit\n\n",
            documented,
            "=".repeat(documented.len())
        )));
        assert!(text.contains(&format!(
            "{}\n{}\nquit  zap\n\n",
            undocumented,
            "=".repeat(undocumented.len())
        )));
    }
}
