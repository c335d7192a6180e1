use crate::env::Environment;
use anyhow::{Context, Result};
use nested_shell::{Args, Command, Flow, ParsedCommand, Registry, Session, Shell};
use std::env as stdenv;

/// A demo shell named `name` working on `env`.
pub fn shell(name: &str, env: Environment) -> Shell<Environment> {
    Shell::new(name, env, registry())
}

fn registry() -> Registry<Environment> {
    Registry::new()
        .command(
            Command::new("echo", echo)
                .variadic()
                .open()
                .describe("write the arguments to standard output"),
        )
        .command(Command::new("pwd", pwd).describe("print the current working directory"))
        .command(
            Command::new("cd", cd)
                .optional("target")
                .describe("change the working directory; defaults to $HOME")
                .complete(complete_dirs),
        )
        .command(
            Command::new("set", set)
                .open()
                .describe("set variables: set KEY=VALUE [KEY=VALUE ...]"),
        )
        .command(Command::new("get", get).param("name").describe("print a variable"))
        .command(
            Command::new("enter", enter)
                .param("name")
                .describe("start a nested shell; its changes are dropped on exit"),
        )
        .command(Command::new("stack", stack).describe("list the nested shells"))
}

fn echo(_env: &mut Environment, session: &mut Session, args: &Args) -> Result<Flow> {
    session.print(args.raw());
    Ok(Flow::Continue)
}

fn pwd(env: &mut Environment, session: &mut Session, _args: &Args) -> Result<Flow> {
    session.print(env.current_dir.display());
    Ok(Flow::Continue)
}

fn cd(env: &mut Environment, _session: &mut Session, args: &Args) -> Result<Flow> {
    let target = env.resolve_dir(args.get("target"))?;
    stdenv::set_current_dir(&target)
        .with_context(|| format!("can't chdir to {}", target.display()))?;
    env.current_dir = target;
    Ok(Flow::Continue)
}

/// Subdirectories of the process working directory matching the typed path.
fn complete_dirs(cmd: &ParsedCommand) -> Vec<String> {
    let typed = cmd.args.first().map(String::as_str).unwrap_or_default();
    let (parent, fragment) = match typed.rfind('/') {
        Some(i) => (&typed[..=i], &typed[i + 1..]),
        None => ("", typed),
    };
    let Ok(cwd) = stdenv::current_dir() else {
        return Vec::new();
    };
    Environment::subdirs(&cwd.join(parent), fragment)
        .into_iter()
        .map(|name| format!("{}{}/", parent, name))
        .collect()
}

fn set(env: &mut Environment, _session: &mut Session, args: &Args) -> Result<Flow> {
    if args.named().is_empty() {
        anyhow::bail!("expected KEY=VALUE");
    }
    for (key, value) in args.named() {
        env.set_var(key.clone(), value.clone());
    }
    Ok(Flow::Continue)
}

fn get(env: &mut Environment, session: &mut Session, args: &Args) -> Result<Flow> {
    let name = args.get("name").unwrap_or_default();
    match env.get_var(name) {
        Some(value) => session.print(value),
        None => anyhow::bail!("{} is not set", name),
    }
    Ok(Flow::Continue)
}

fn enter(env: &mut Environment, session: &mut Session, args: &Args) -> Result<Flow> {
    let name = args.get("name").unwrap_or_default();
    let mut child = shell(name, env.clone())
        .with_motd(format!("entering {}, type exit to return", name));
    let flow = session.enter(&mut child);

    // The nested shell may have moved the process; put it back where this shell is.
    if child.state().current_dir != env.current_dir {
        stdenv::set_current_dir(&env.current_dir)
            .with_context(|| format!("can't chdir back to {}", env.current_dir.display()))?;
    }
    Ok(flow)
}

fn stack(_env: &mut Environment, session: &mut Session, _args: &Args) -> Result<Flow> {
    for (depth, frame) in session.stack().frames_snapshot().iter().enumerate() {
        session.print(format_args!("{} {}", depth, frame.segment));
    }
    Ok(Flow::Continue)
}
