use camino::Utf8PathBuf;
use clap::{Parser, ValueHint};

use super::load_program;

#[derive(Parser, Debug)]
pub struct PrintOpt {
    /// Input file
    #[arg(value_hint = ValueHint::FilePath)]
    input: Utf8PathBuf,
}

impl PrintOpt {
    pub fn exec(&self) -> anyhow::Result<()> {
        let (computer, debug_info) = load_program(&self.input)?;
        print!("{}", debug_info.listing(&computer.program));
        Ok(())
    }
}
