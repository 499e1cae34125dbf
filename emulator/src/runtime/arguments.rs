//! Instruction operands
//!
//! Data operands are always at least one memory lookup deep: an operand `5` reads cell 5, `*5`
//! reads the cell whose address is stored in cell 5, and so on. Jump operands are absolute line
//! numbers, resolved from labels when the program is loaded.

use std::str::FromStr;

use nom::combinator::all_consuming;
use nom::Finish;
use parse_display::Display;
use thiserror::Error;

use super::memory::{Memory, MemoryError};
use crate::constants::{LineNumber, Word, INDIRECTION_MARKER};
use crate::parser::line::parse_operand;

/// A memory operand: a base cell followed by a number of pointer hops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operand {
    /// Address of the first cell to read
    pub base: Word,

    /// Number of additional dereferences applied after reading the base cell
    pub indirection: usize,
}

impl Operand {
    #[must_use]
    pub const fn new(base: Word, indirection: usize) -> Self {
        Self { base, indirection }
    }

    /// An operand reading a cell directly
    #[must_use]
    pub const fn direct(base: Word) -> Self {
        Self::new(base, 0)
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for _ in 0..self.indirection {
            write!(f, "{INDIRECTION_MARKER}")?;
        }
        write!(f, "{}", self.base)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not parse operand {0:?}")]
pub struct OperandParseError(pub String);

impl FromStr for Operand {
    type Err = OperandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, operand) = all_consuming(parse_operand::<nom::error::Error<_>>)(s)
            .finish()
            .map_err(|_| OperandParseError(s.to_owned()))?;
        Ok(operand)
    }
}

/// The absolute line a jump instruction transfers control to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("{0}")]
pub struct Target(pub LineNumber);

/// Resolves an operand to the index of the memory cell it designates
pub trait ResolveAddress {
    /// # Errors
    ///
    /// Fails if any cell visited along the way is out of the memory bounds.
    fn resolve_address(&self, memory: &Memory) -> Result<usize, MemoryError>;
}

impl ResolveAddress for Operand {
    fn resolve_address(&self, memory: &Memory) -> Result<usize, MemoryError> {
        let mut index = memory.index(self.base)?;
        for _ in 0..self.indirection {
            index = memory.index(memory.cell(index))?;
        }
        Ok(index)
    }
}

/// Reads the value an operand designates
pub trait ExtractValue {
    /// # Errors
    ///
    /// Fails if the operand does not resolve to a valid cell.
    fn extract_word(&self, memory: &Memory) -> Result<Word, MemoryError>;
}

impl<T: ResolveAddress> ExtractValue for T {
    fn extract_word(&self, memory: &Memory) -> Result<Word, MemoryError> {
        let index = self.resolve_address(memory)?;
        Ok(memory.cell(index))
    }
}
