use bitflags::bitflags;

use crate::constants::{LineNumber, Word};

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u8 {
        /// The program ran an `end` instruction or went past its last line
        const ENDED                = 0b01;
        /// The accumulator was sent to the output and not written since
        const ACCUMULATOR_CONSUMED = 0b10;
    }
}

impl Default for Flags {
    fn default() -> Self {
        // A fresh machine is running and its accumulator holds no pending value
        Flags::empty()
    }
}

impl std::fmt::Debug for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl std::fmt::Display for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }

        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                write!(f, "|")?;
            }
            write!(f, "{}", name.to_lowercase())?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Registers {
    /// The accumulator, the only general purpose register
    pub accumulator: Word,

    /// Program counter, as a line number
    pub pc: LineNumber,

    /// Machine state flags
    pub flags: Flags,
}

impl Registers {
    /// Write the accumulator
    pub fn set_accumulator(&mut self, value: Word) {
        self.accumulator = value;
        self.flags.remove(Flags::ACCUMULATOR_CONSUMED);
    }

    /// Read the accumulator and mark it as consumed
    pub fn take_accumulator(&mut self) -> Word {
        self.flags.insert(Flags::ACCUMULATOR_CONSUMED);
        self.accumulator
    }

    #[must_use]
    pub fn has_ended(&self) -> bool {
        self.flags.contains(Flags::ENDED)
    }
}

impl std::fmt::Display for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "%acc = {} | %pc = {} | flags = {}",
            self.accumulator, self.pc, self.flags
        )
    }
}
