use clap::Parser;

mod cli;
mod commands;
mod exit_codes;
mod output;
mod pipeline_args;

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    eegband_rs::logging::init(eegband_rs::logging::level_from_verbosity(cli.verbose));

    let exit_code = match cli.command {
        cli::Command::Analyze(args) => commands::analyze::execute(args).await,
        cli::Command::Batch(args) => commands::batch::execute(args),
        cli::Command::Validate(args) => commands::validate::execute(args),
        cli::Command::Formats(args) => commands::formats::execute(args),
    };

    std::process::exit(exit_code);
}
