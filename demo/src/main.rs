use anyhow::Context;
use argh::FromArgs;
use log::error;
use nested_shell::interpreter::DIAGNOSTIC_PREFIX;
use nested_shell::signal::ABORT_STATUS;
use nested_shell::{Flow, Session};
use std::io::Write;
use std::process::exit;

mod commands;
mod env;

use env::Environment;

const MOTD: &str = "nested shell demo: type `help` for commands, `enter NAME` to nest, `exit` to leave";

#[derive(FromArgs)]
/// An interactive shell that can nest further shells.
struct Options {
    #[argh(option, short = 'n', default = "String::from(\"root\")")]
    /// prompt segment of the outermost shell
    name: String,

    #[argh(switch, short = 'q')]
    /// do not print the welcome message
    quiet: bool,

    #[argh(switch, short = 'v')]
    /// trace dispatching to standard error
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| writeln!(buf, "{}{}", DIAGNOSTIC_PREFIX, record.args()))
        .init();
}

fn run(options: Options) -> anyhow::Result<Flow> {
    let mut session = Session::interactive().context("failed to start the line editor")?;
    let mut root = commands::shell(&options.name, Environment::new());
    if !options.quiet {
        root = root.with_motd(MOTD);
    }
    Ok(session.enter(&mut root))
}

fn main() {
    let options: Options = argh::from_env();
    init_logging(options.verbose);

    match run(options) {
        Ok(Flow::Abort) => exit(ABORT_STATUS),
        Ok(_) => {}
        Err(e) => {
            error!("{:#}", e);
            exit(1);
        }
    }
}
