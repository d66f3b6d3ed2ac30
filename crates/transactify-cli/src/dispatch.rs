use std::path::Path;

use transactify_client::commands;
use transactify_client::commands::convert::ConvertOptions;
use transactify_client::{
    ClientResult, ConsoleReporter, SilentReporter, StatusReporter, SuccessEnvelope,
};

use crate::cli::{Cli, Commands};

pub fn dispatch(cli: &Cli) -> ClientResult<SuccessEnvelope> {
    match &cli.command {
        Commands::Convert {
            path,
            format,
            quiet,
            json,
        } => {
            let reporter: &dyn StatusReporter = if *quiet || *json {
                &SilentReporter
            } else {
                &ConsoleReporter
            };
            commands::convert::run_with_options(ConvertOptions {
                source_dir: path.as_deref().map(Path::new),
                formats: (*format).into(),
                reporter: Some(reporter),
            })
        }
        Commands::Hash { input, .. } => Ok(commands::hash::run(input)),
    }
}
