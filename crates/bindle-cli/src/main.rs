//! bindle - config-driven library bundling on rolldown.

use clap::Parser;

use bindle_cli::{cli, commands, logger, ui};

#[tokio::main]
async fn main() {
    let args = cli::Cli::parse();
    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    match commands::build::execute(&args).await {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
        }
        Err(err) => {
            ui::error(&err.to_string());
            std::process::exit(1);
        }
    }
}
