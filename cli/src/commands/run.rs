use cai_emulator::constants::Word;
use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, ValueHint};
use tracing::{debug, error, info};

use super::load_program;
use crate::interactive::run_interactive;

#[derive(Parser, Debug)]
pub struct RunOpt {
    /// Input file
    #[arg(value_hint = ValueHint::FilePath)]
    input: Utf8PathBuf,

    /// Run the program in interactive mode
    #[arg(short, long, action = ArgAction::SetTrue)]
    interactive: bool,

    /// Give up after this number of steps
    #[arg(short, long)]
    max_steps: Option<u64>,

    /// Additional input values, appended to the ones set by the program
    #[arg(long = "input", value_delimiter = ',', allow_negative_numbers = true)]
    extra_input: Vec<Word>,
}

impl RunOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        let (mut computer, debug_info) = load_program(&self.input)?;

        if !self.extra_input.is_empty() {
            debug!(input = ?self.extra_input, "Appending input values");
            computer.input.extend(&self.extra_input);
        }

        info!("Running program");
        if self.interactive {
            run_interactive(&mut computer, debug_info)?;
            return Ok(());
        }

        let res = match self.max_steps {
            Some(limit) => computer.run_bounded(limit),
            None => computer.run(),
        };

        for value in &computer.output {
            info!("out: {value}");
        }

        let snapshot = computer.snapshot();
        if let Err(e) = res {
            error!(steps = snapshot.steps, "{snapshot}");
            return Err(e.into());
        }

        info!(steps = snapshot.steps, "End of program");
        println!("{snapshot}");

        Ok(())
    }
}
