use std::collections::VecDeque;

use thiserror::Error;
use tracing::{debug, info, trace};

use crate::constants::{LineNumber, Word};

pub mod arguments;
mod instructions;
mod memory;
mod registers;

pub use self::arguments::{ExtractValue, Operand, OperandParseError, ResolveAddress, Target};
pub use self::instructions::{Instruction, InstructionKind};
pub use self::memory::{Memory, MemoryError};
pub use self::registers::{Flags, Registers};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessorError {
    #[error("invalid memory access: {0}")]
    OutOfBoundsAddress(#[from] MemoryError),

    #[error("read from an empty input queue")]
    EmptyInput,

    #[error("program did not end within {limit} steps")]
    StepLimitExceeded { limit: u64 },
}

type Result<T> = std::result::Result<T, ProcessorError>;

/// A loaded program, indexed by line number
///
/// Lines without an instruction (blank lines and comments) are kept as empty slots so that jump
/// targets keep designating the lines they were written against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    lines: Vec<Option<Instruction>>,
}

impl Program {
    #[must_use]
    pub fn new(lines: Vec<Option<Instruction>>) -> Self {
        Self { lines }
    }

    /// Number of lines, including empty ones
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Get the instruction on a line, if any
    #[must_use]
    pub fn get(&self, line: LineNumber) -> Option<&Instruction> {
        self.lines.get(line).and_then(Option::as_ref)
    }

    /// Iterate over the lines holding an instruction
    pub fn iter(&self) -> impl Iterator<Item = (LineNumber, &Instruction)> {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(line, instruction)| instruction.as_ref().map(|i| (line, i)))
    }
}

impl FromIterator<Option<Instruction>> for Program {
    fn from_iter<T: IntoIterator<Item = Option<Instruction>>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[derive(Default)]
pub struct Computer {
    pub registers: Registers,
    pub memory: Memory,
    pub program: Program,
    pub input: VecDeque<Word>,
    pub output: VecDeque<Word>,
    pub steps: u64,
}

impl std::fmt::Debug for Computer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Computer {{ registers: {:?}, steps: {}, memory: [...] }}",
            self.registers, self.steps
        )
    }
}

impl Computer {
    /// Read the value designated by an operand
    fn word(&self, operand: &Operand) -> Result<Word> {
        let value = operand.extract_word(&self.memory)?;
        trace!(%operand, value, "Resolved operand");
        Ok(value)
    }

    /// Get the cell designated by an operand
    fn slot(&mut self, operand: &Operand) -> Result<&mut Word> {
        let index = operand.resolve_address(&self.memory)?;
        Ok(self.memory.cell_mut(index))
    }

    fn advance(&mut self) {
        self.registers.pc += 1;
    }

    fn jump(&mut self, target: Target) {
        debug!("Jumping to line {}", target);
        self.registers.pc = target.0;
    }

    /// Execute the instruction on the current line
    ///
    /// Going past the last line of the program ends it. Empty lines are skipped without counting
    /// a step. Stepping a machine that already ended does nothing.
    ///
    /// # Errors
    ///
    /// This function will return an error if the instruction faults. The machine is then in an
    /// unspecified state and should not be stepped further.
    #[tracing::instrument(skip(self), level = "debug")]
    pub fn step(&mut self) -> Result<()> {
        if self.registers.has_ended() {
            return Ok(());
        }

        let pc = self.registers.pc;
        if pc >= self.program.len() {
            info!(line = pc, "Reached the end of the program");
            self.registers.flags.insert(Flags::ENDED);
            return Ok(());
        }

        let Some(&instruction) = self.program.get(pc) else {
            trace!(line = pc, "Skipping empty line");
            self.advance();
            return Ok(());
        };

        trace!(line = pc, "Executing instruction \"{}\"", instruction);
        instruction.execute(self)?;
        self.steps += instruction.cost();
        trace!("Register state {}", self.registers);
        Ok(())
    }

    /// Step until the program ends
    ///
    /// # Errors
    ///
    /// This function will return the first error raised by an instruction.
    #[tracing::instrument(skip(self))]
    pub fn run(&mut self) -> Result<()> {
        while !self.registers.has_ended() {
            self.step()?;
        }
        Ok(())
    }

    /// Step until the program ends, or give up after `limit` steps
    ///
    /// # Errors
    ///
    /// This function will return the first error raised by an instruction, or
    /// [`ProcessorError::StepLimitExceeded`] if the program is still running after `limit` steps.
    #[tracing::instrument(skip(self))]
    pub fn run_bounded(&mut self, limit: u64) -> Result<()> {
        let start = self.steps;
        while !self.registers.has_ended() {
            if self.steps - start >= limit {
                return Err(ProcessorError::StepLimitExceeded { limit });
            }
            self.step()?;
        }
        Ok(())
    }

    /// Capture the observable state of the machine
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            accumulator: self.registers.accumulator,
            pc: self.registers.pc,
            ended: self.registers.has_ended(),
            steps: self.steps,
            memory: self.memory.cells().to_vec(),
            output: self.output.iter().copied().collect(),
        }
    }
}

/// Observable state of a machine at a given point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub accumulator: Word,
    pub pc: LineNumber,
    pub ended: bool,
    pub steps: u64,
    pub memory: Vec<Word>,
    pub output: Vec<Word>,
}

impl std::fmt::Display for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ISEND: {} ACC: {}  LINE: {} - MEM: [",
            self.ended, self.accumulator, self.pc
        )?;

        let mut first = true;
        for cell in &self.memory {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{cell}")?;
            first = false;
        }
        write!(f, "]")
    }
}
