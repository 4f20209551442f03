mod app;
mod cli;
mod config;
mod db;
mod http;
mod logfile;
mod paths;

use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = match cli::parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(code) => return ExitCode::from(code),
    };

    match cli.into_parts() {
        Ok((invocation, config)) => app::run(invocation, config),
        Err(err) => {
            println!("[ERROR] {err:#}");
            ExitCode::from(1)
        }
    }
}
