//! Program parsing logic
//!
//! A program source is made of an optional configuration block, followed by the program lines,
//! optionally terminated by an end marker. This module splits the source into those parts and
//! parses every line on its own. Resolving what the lines mean (opcodes, labels, operands) is the
//! job of the compiler.
//!
//! The parsing of individual tokens is handled by the `nom` library.

use std::num::ParseIntError;

use miette::{Diagnostic, SourceSpan};
use nom::Offset;
use thiserror::Error;
use tracing::debug;

use self::config::ConfigError;
use self::line::{parse_line, LineContent, LineError};
use self::location::{Locatable, Located};
use self::text::clean_line;
use crate::constants::{LineNumber, CONFIG_END, CONFIG_START, PROGRAM_END};

pub mod config;
pub mod line;
pub mod location;
pub mod text;

pub use self::config::{Config, MachineConfig};

pub trait ParseError<I>:
    nom::error::ParseError<I>
    + nom::error::FromExternalError<I, ParseIntError>
    + nom::error::ContextError<I>
{
}

impl<I, E> ParseError<I> for E where
    E: nom::error::ParseError<I>
        + nom::error::FromExternalError<I, ParseIntError>
        + nom::error::ContextError<I>
{
}

#[derive(Debug, Error, Diagnostic)]
pub enum SourceError {
    #[error("invalid configuration block")]
    #[diagnostic(code(cai::config))]
    Config {
        #[source]
        source: ConfigError,

        #[label("in this line")]
        span: SourceSpan,
    },

    #[error("malformed line {line}")]
    #[diagnostic(code(cai::malformed_line))]
    MalformedLine {
        line: LineNumber,

        #[source]
        source: LineError,

        #[label("this line")]
        span: SourceSpan,
    },
}

/// A parsed program source
///
/// Program lines are numbered from zero, starting right after the configuration block if there is
/// one. Every line of the source up to the end marker is kept, including blank ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source<'a> {
    pub config: Config,
    pub lines: Vec<Located<LineContent<'a>>>,
}

/// Compute the location of a line in the source
fn locate(input: &str, line: &str) -> std::ops::Range<usize> {
    let start = input.offset(line);
    start..start + line.len()
}

/// Parse the configuration block, if the source starts with one
///
/// Returns the parsed configuration and the lines following the block.
fn parse_config<'a, 'b>(
    input: &'a str,
    lines: &'b [&'a str],
) -> Result<(Config, &'b [&'a str]), SourceError> {
    let mut config = Config::default();

    let Some(start) = lines.iter().position(|line| !clean_line(line).is_empty()) else {
        return Ok((config, lines));
    };

    if clean_line(lines[start]) != CONFIG_START {
        return Ok((config, lines));
    }

    let block = &lines[start + 1..];
    let end = block
        .iter()
        .position(|line| clean_line(line) == CONFIG_END)
        .ok_or_else(|| SourceError::Config {
            source: ConfigError::Unterminated,
            span: locate(input, lines[start]).into(),
        })?;

    for line in &block[..end] {
        config
            .apply(line)
            .map_err(|source| SourceError::Config {
                source,
                span: locate(input, line).into(),
            })?;
    }

    debug!(?config, "Parsed configuration block");
    Ok((config, &block[end + 1..]))
}

/// Parse a program source
///
/// # Errors
///
/// This function will return an error if the configuration block is invalid or if a line cannot
/// be parsed
#[tracing::instrument(skip(input))]
pub fn parse(input: &str) -> Result<Source<'_>, SourceError> {
    let all_lines: Vec<&str> = input.lines().collect();
    let (config, program) = parse_config(input, &all_lines)?;

    let lines = program
        .iter()
        .take_while(|line| clean_line(line) != PROGRAM_END)
        .enumerate()
        .map(|(number, line)| {
            let location = locate(input, line);
            parse_line(line)
                .map(|content| content.with_location(location.clone()))
                .map_err(|source| SourceError::MalformedLine {
                    line: number,
                    source,
                    span: location.into(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(lines = lines.len(), "Parsed program");
    Ok(Source { config, lines })
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    fn contents<'a>(source: &Source<'a>) -> Vec<LineContent<'a>> {
        source.lines.iter().map(|line| line.inner.clone()).collect()
    }

    #[test]
    fn parse_without_config_test() {
        let source = parse("add 0\ncpt 1\nend").unwrap();
        assert_eq!(source.config, Config::default());
        assert_eq!(
            contents(&source),
            vec![
                LineContent::Instruction {
                    opcode: "add",
                    arguments: vec!["0"]
                },
                LineContent::Instruction {
                    opcode: "cpt",
                    arguments: vec!["1"]
                },
                LineContent::Instruction {
                    opcode: "end",
                    arguments: vec![]
                },
            ]
        );
        assert_eq!(source.lines[1].location, 6..11);
    }

    #[test]
    fn parse_with_config_test() {
        let input = indoc! {"
            // A program
            ENVDEF
            msize=4
            init=[1, 2]
            ENDENVDEF

            loop:
              jmp loop
            ENDPROGRAM
            this is never parsed:
        "};
        let source = parse(input).unwrap();

        assert_eq!(source.config.memory_size, Some(4));
        assert_eq!(source.config.initial_memory, Some(vec![1, 2]));
        assert_eq!(
            contents(&source),
            vec![
                LineContent::Empty,
                LineContent::Label("loop"),
                LineContent::Instruction {
                    opcode: "jmp",
                    arguments: vec!["loop"]
                },
            ]
        );

        let location = source.lines[1].location.clone();
        assert_eq!(&input[location], "loop:");
    }

    #[test]
    fn config_must_come_first_test() {
        let source = parse("nop\nENVDEF\nENDENVDEF").unwrap();
        assert_eq!(source.lines.len(), 3);
        assert_eq!(
            source.lines[1].inner,
            LineContent::Instruction {
                opcode: "ENVDEF",
                arguments: vec![]
            }
        );
    }

    #[test]
    fn empty_source_test() {
        let source = parse("").unwrap();
        assert!(source.lines.is_empty());
    }

    #[test]
    fn unterminated_config_test() {
        let res = parse("ENVDEF\nmsize=3\nend");
        assert!(matches!(
            res,
            Err(SourceError::Config {
                source: ConfigError::Unterminated,
                ..
            })
        ));
    }

    #[test]
    fn invalid_config_test() {
        let res = parse("ENVDEF\nmsize=3\nspeed=2\nENDENVDEF\nend");
        let Err(SourceError::Config { source, span }) = res else {
            panic!("expected a configuration error");
        };
        assert_eq!(
            source,
            ConfigError::UnknownKey {
                key: "speed".to_owned()
            }
        );
        assert_eq!(span, SourceSpan::from(15..22));
    }

    #[test]
    fn malformed_line_test() {
        let res = parse("nop\nbad label:\nend");
        assert!(matches!(
            res,
            Err(SourceError::MalformedLine {
                line: 1,
                source: LineError::InvalidLabel(_),
                ..
            })
        ));
    }
}
