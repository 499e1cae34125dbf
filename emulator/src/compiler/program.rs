use thiserror::Error;
use tracing::trace;

use super::labels::Labels;
use crate::parser::line::LineContent;
use crate::runtime::{Instruction, InstructionKind, Operand, OperandParseError, Target};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InstructionCompilationError {
    #[error("unknown instruction {0:?}")]
    UnknownOpcode(String),

    #[error("unknown label {0:?}")]
    UnknownLabel(String),

    #[error("invalid number of arguments: expected {expected}, got {got}")]
    InvalidArgumentNumber { expected: usize, got: usize },

    #[error("invalid operand {0:?}")]
    InvalidOperand(String),
}

impl From<OperandParseError> for InstructionCompilationError {
    fn from(OperandParseError(operand): OperandParseError) -> Self {
        Self::InvalidOperand(operand)
    }
}

type Result<T> = std::result::Result<T, InstructionCompilationError>;

fn get_tuple<'a>(args: Vec<&'a str>) -> Result<(&'a str, &'a str)> {
    let [x, y]: [&str; 2] = args.try_into().map_err(|args: Vec<_>| {
        InstructionCompilationError::InvalidArgumentNumber {
            expected: 2,
            got: args.len(),
        }
    })?;

    Ok((x, y))
}

fn get_singleton(args: Vec<&str>) -> Result<&str> {
    let [x]: [&str; 1] = args.try_into().map_err(|args: Vec<_>| {
        InstructionCompilationError::InvalidArgumentNumber {
            expected: 1,
            got: args.len(),
        }
    })?;

    Ok(x)
}

#[allow(clippy::needless_pass_by_value)]
fn get_none(args: Vec<&str>) -> Result<()> {
    if !args.is_empty() {
        return Err(InstructionCompilationError::InvalidArgumentNumber {
            expected: 0,
            got: args.len(),
        });
    }

    Ok(())
}

fn operand(token: &str) -> Result<Operand> {
    Ok(token.parse()?)
}

fn target(labels: &Labels, token: &str) -> Result<Target> {
    labels
        .get(token)
        .map(|&line| Target(line))
        .ok_or_else(|| InstructionCompilationError::UnknownLabel(token.to_owned()))
}

#[tracing::instrument(skip(labels))]
fn compile_instruction(
    kind: InstructionKind,
    arguments: Vec<&str>,
    labels: &Labels,
) -> Result<Instruction> {
    use InstructionKind as K;

    match kind {
        K::Nop => {
            get_none(arguments)?;
            Ok(Instruction::Nop)
        }

        K::Mov => {
            let (a, b) = get_tuple(arguments)?;
            Ok(Instruction::Mov(operand(a)?, operand(b)?))
        }

        K::Cpf => {
            let a = get_singleton(arguments)?;
            Ok(Instruction::Cpf(operand(a)?))
        }

        K::Cpt => {
            let a = get_singleton(arguments)?;
            Ok(Instruction::Cpt(operand(a)?))
        }

        K::Add => {
            let a = get_singleton(arguments)?;
            Ok(Instruction::Add(operand(a)?))
        }

        K::Sub => {
            let a = get_singleton(arguments)?;
            Ok(Instruction::Sub(operand(a)?))
        }

        K::Inc => {
            let a = get_singleton(arguments)?;
            Ok(Instruction::Inc(operand(a)?))
        }

        K::Dec => {
            let a = get_singleton(arguments)?;
            Ok(Instruction::Dec(operand(a)?))
        }

        K::Jmp => {
            let a = get_singleton(arguments)?;
            Ok(Instruction::Jmp(target(labels, a)?))
        }

        K::Jiz => {
            let a = get_singleton(arguments)?;
            Ok(Instruction::Jiz(target(labels, a)?))
        }

        K::Jlz => {
            let a = get_singleton(arguments)?;
            Ok(Instruction::Jlz(target(labels, a)?))
        }

        K::Inp => {
            get_none(arguments)?;
            Ok(Instruction::Inp)
        }

        K::Gis => {
            get_none(arguments)?;
            Ok(Instruction::Gis)
        }

        K::Out => {
            get_none(arguments)?;
            Ok(Instruction::Out)
        }

        K::End => {
            get_none(arguments)?;
            Ok(Instruction::End)
        }
    }
}

/// Compile the content of one line
///
/// Blank lines compile to nothing, label declarations to the no-op [`Instruction::Label`].
pub(crate) fn compile_line(content: &LineContent, labels: &Labels) -> Result<Option<Instruction>> {
    match content {
        LineContent::Empty => Ok(None),
        LineContent::Label(_) => Ok(Some(Instruction::Label)),
        LineContent::Instruction { opcode, arguments } => {
            let kind: InstructionKind = opcode
                .parse()
                .map_err(|_| InstructionCompilationError::UnknownOpcode((*opcode).to_owned()))?;
            let instruction = compile_instruction(kind, arguments.clone(), labels)?;
            trace!(%instruction, "Compiled instruction");
            Ok(Some(instruction))
        }
    }
}
