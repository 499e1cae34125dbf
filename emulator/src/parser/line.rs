//! Program line parsing
//!
//! This module parses a single program line into its syntactic parts: nothing, a label
//! declaration, or an opcode followed by its operand tokens. Operand tokens are kept as-is here,
//! the compiler decides how to read them once the opcode is known.
//!
//! Like the rest of the parser, this does zero copy over the original input, so that the offset of
//! every token in the source can be computed for diagnostics.

use nom::{
    bytes::complete::take_till1,
    character::complete::{char, space0, space1},
    combinator::all_consuming,
    multi::{many0, many0_count},
    sequence::{pair, preceded, terminated},
    Finish, IResult,
};
use thiserror::Error;

use super::{
    text::{clean_line, parse_word},
    ParseError,
};
use crate::constants::{INDIRECTION_MARKER, LABEL_SUFFIX};
use crate::runtime::Operand;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("label name is empty")]
    EmptyLabel,

    #[error("label name {0:?} contains whitespace")]
    InvalidLabel(String),
}

/// Holds the content of a line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineContent<'a> {
    /// Blank or comment-only line
    Empty,
    /// Label declaration, without its trailing colon
    Label(&'a str),
    /// Instruction, with its opcode and raw operand tokens
    Instruction {
        opcode: &'a str,
        arguments: Vec<&'a str>,
    },
}

impl std::fmt::Display for LineContent<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineContent::Empty => Ok(()),
            LineContent::Label(label) => write!(f, "{label}{LABEL_SUFFIX}"),
            LineContent::Instruction { opcode, arguments } => {
                write!(f, "{opcode}")?;
                for argument in arguments {
                    write!(f, " {argument}")?;
                }
                Ok(())
            }
        }
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Parse a whitespace-delimited token
fn parse_token<'a, Error: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, Error> {
    take_till1(is_blank)(input)
}

/// Parse an opcode followed by its operands
fn parse_instruction<'a, Error: ParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, LineContent<'a>, Error> {
    let (rest, opcode) = parse_token(input)?;
    let (rest, arguments) = many0(preceded(space1, parse_token))(rest)?;
    let (rest, _) = space0(rest)?;
    Ok((rest, LineContent::Instruction { opcode, arguments }))
}

/// Parse an operand, with its leading indirection markers
///
/// ```
/// use cai_emulator::parser::line::parse_operand;
/// use cai_emulator::runtime::Operand;
///
/// let res = parse_operand::<()>("**4");
/// assert_eq!(res, Ok(("", Operand::new(4, 2))));
/// ```
///
/// # Errors
///
/// This function will return an error if the input does not start with an operand.
pub fn parse_operand<'a, Error: ParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Operand, Error> {
    let (rest, (indirection, base)) =
        pair(many0_count(char(INDIRECTION_MARKER)), parse_word)(input)?;
    Ok((rest, Operand::new(base, indirection)))
}

/// Parse a label declaration
///
/// Expects a cleaned line ending with the label suffix.
fn parse_label(line: &str) -> Result<LineContent<'_>, LineError> {
    let name = line
        .strip_suffix(LABEL_SUFFIX)
        .map_or(line, |name| name.trim_end_matches(is_blank));

    if name.is_empty() {
        return Err(LineError::EmptyLabel);
    }

    all_consuming(terminated(parse_token::<()>, space0))(name)
        .finish()
        .map(|(_, name)| LineContent::Label(name))
        .map_err(|()| LineError::InvalidLabel(name.to_owned()))
}

/// Parse a raw program line
///
/// The comment and surrounding whitespace are stripped first. The returned content borrows from
/// the line.
///
/// # Errors
///
/// This function will return an error if the line declares a label with an invalid name.
pub fn parse_line(line: &str) -> Result<LineContent<'_>, LineError> {
    let line = clean_line(line);

    if line.is_empty() {
        return Ok(LineContent::Empty);
    }

    if line.ends_with(LABEL_SUFFIX) {
        return parse_label(line);
    }

    // A cleaned, non-empty line always starts with a token
    match all_consuming(parse_instruction::<()>)(line).finish() {
        Ok((_, content)) => Ok(content),
        Err(()) => Ok(LineContent::Instruction {
            opcode: line,
            arguments: Vec::new(),
        }),
    }
}
