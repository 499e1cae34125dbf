use std::process::exit;

use cai_emulator::compiler::DebugInfo;
use cai_emulator::load;
use cai_emulator::runtime::Computer;
use camino::Utf8Path;
use miette::NamedSource;
use tracing::{debug, info};

mod completion;
mod print;
mod run;

#[derive(clap::Subcommand)]
pub enum Subcommand {
    /// Load and run a program
    Run(self::run::RunOpt),

    /// Print the program as loaded
    Print(self::print::PrintOpt),

    /// Generate shell completions
    Completion(self::completion::CompletionOpt),
}

impl Subcommand {
    /// Run a subcommand
    pub fn exec(self) -> anyhow::Result<()> {
        match self {
            Self::Run(opt) => opt.exec(),
            Self::Print(opt) => opt.exec(),
            Self::Completion(opt) => opt.exec(),
        }
    }
}

/// Read, parse and compile a program
///
/// Load errors are reported with the offending part of the source, and end the process.
pub(crate) fn load_program(path: &Utf8Path) -> anyhow::Result<(Computer, DebugInfo)> {
    info!(%path, "Reading program");
    let source = std::fs::read_to_string(path)?;

    debug!("Loading program");
    match load(&source) {
        Ok(loaded) => Ok(loaded),
        Err(e) => {
            let report = miette::Report::new(e)
                .with_source_code(NamedSource::new(path.as_str(), source.clone()));
            eprintln!("{report:?}");
            exit(1);
        }
    }
}
