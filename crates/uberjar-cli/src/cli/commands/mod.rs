use super::args::*;
use crate::exit_codes::EXIT_SUCCESS;

pub(crate) mod build;
pub(crate) mod inspect;

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Build(args) => build::run(args),
        Command::Inspect(args) => inspect::run(args),
        Command::Version => {
            println!("{}", uberjar_core::VERSION);
            Ok(EXIT_SUCCESS)
        }
    }
}

/// Report a pipeline error on stderr and map it to its exit code.
pub(crate) fn report_failure(err: &uberjar_core::AssemblyError) -> i32 {
    eprintln!("error: {err}");
    err.exit_code()
}
