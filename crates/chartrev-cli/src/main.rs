use std::process::ExitCode;

use chartrev_cli::{cli, logging, run};

fn main() -> ExitCode {
    let matches = cli::command().get_matches();
    let json_logs = matches
        .subcommand()
        .is_some_and(|(_, args)| args.get_flag("log-json"));

    if let Err(err) = logging::init(json_logs) {
        eprintln!("Error: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(&matches, &mut std::io::stdout().lock()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
