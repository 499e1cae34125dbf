//! Small text helpers shared by the configuration and line parsers.
//!
//! Integers are plain optionally signed decimal literals. Lists are bracketed and comma
//! separated, with spaces and tabs allowed around every element.

use nom::{
    character::complete::{char, digit1, one_of, space0},
    combinator::{all_consuming, map_res, opt, recognize},
    multi::separated_list0,
    sequence::{delimited, pair},
    Finish, IResult,
};
use thiserror::Error;

use super::ParseError;
use crate::constants::{Word, COMMENT_MARKER};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextError {
    #[error("invalid integer {0:?}")]
    InvalidWord(String),

    #[error("invalid integer list {0:?}")]
    InvalidList(String),
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r'
}

/// Remove a trailing `//` comment
#[must_use]
pub fn strip_comment(line: &str) -> &str {
    match line.find(COMMENT_MARKER) {
        Some(index) => &line[..index],
        None => line,
    }
}

/// Remove the spaces and tabs around a string
#[must_use]
pub fn trim(input: &str) -> &str {
    input.trim_matches(is_blank)
}

/// Remove the comment and surrounding whitespace of a line
#[must_use]
pub fn clean_line(line: &str) -> &str {
    trim(strip_comment(line))
}

/// Split a string on the first occurence of a delimiter
///
/// If the delimiter is absent, the whole string is returned with an empty tail.
#[must_use]
pub fn split_on_first(input: &str, delimiter: char) -> (&str, &str) {
    input.split_once(delimiter).unwrap_or((input, ""))
}

/// Parse an optionally signed decimal integer
pub(crate) fn parse_word<'a, Error: ParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Word, Error> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), str::parse::<Word>)(input)
}

/// Parse a bracketed list of integers
pub(crate) fn parse_word_list<'a, Error: ParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Vec<Word>, Error> {
    delimited(
        pair(char('['), space0),
        separated_list0(delimited(space0, char(','), space0), parse_word),
        pair(space0, char(']')),
    )(input)
}

/// Parse a whole string as an integer
///
/// # Errors
///
/// This function will return an error if the string is not a valid integer.
pub fn word_from_str(input: &str) -> Result<Word, TextError> {
    all_consuming(parse_word::<nom::error::Error<&str>>)(trim(input))
        .finish()
        .map(|(_, word)| word)
        .map_err(|_| TextError::InvalidWord(input.to_owned()))
}

/// Parse a whole string as a bracketed list of integers
///
/// # Errors
///
/// This function will return an error if the string is not a valid list.
pub fn word_list_from_str(input: &str) -> Result<Vec<Word>, TextError> {
    all_consuming(parse_word_list::<nom::error::Error<&str>>)(trim(input))
        .finish()
        .map(|(_, words)| words)
        .map_err(|_| TextError::InvalidList(input.to_owned()))
}
