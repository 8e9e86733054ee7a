mod cli;

use clap::Parser;
use graft_foundation::GraftError;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<GraftError>() {
                Some(graft) => eprintln!("[{}] {:#}", graft.code(), e),
                None => eprintln!("{:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}
