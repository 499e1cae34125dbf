//! The configuration block
//!
//! A program may start with a block of `key=value` assignments setting up the machine:
//!
//! ```text
//! ENVDEF
//! msize=10        // number of memory cells
//! startreg=0      // initial accumulator value
//! startline=0     // first line to execute
//! init=[1, 2, 3]  // initial memory contents
//! input=[4, 5]    // values available to `inp`
//! ENDENVDEF
//! ```

use std::collections::VecDeque;

use thiserror::Error;
use tracing::debug;

use super::text::{clean_line, split_on_first, trim, word_from_str, word_list_from_str, TextError};
use crate::constants::{LineNumber, Word, CONFIG_END, DEFAULT_MEMORY_SIZE};
use crate::runtime::Memory;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown configuration key {key:?}")]
    UnknownKey { key: String },

    #[error("expected a `key=value` assignment, got {line:?}")]
    MalformedAssignment { line: String },

    #[error("invalid value for {key}")]
    InvalidValue {
        key: &'static str,
        #[source]
        source: TextError,
    },

    #[error("{key} must be {expected}, got {value}")]
    OutOfRange {
        key: &'static str,
        expected: &'static str,
        value: Word,
    },

    #[error("initial memory of {len} cells does not fit in a memory of {size} cells")]
    InitialMemoryTooLarge { len: usize, size: usize },

    #[error("initial memory is empty and no memory size is set")]
    EmptyMemory,

    #[error("configuration block is not closed by {}", CONFIG_END)]
    Unterminated,
}

/// Assignments read from the configuration block
///
/// Every field is optional, defaults are applied by [`Config::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub memory_size: Option<Word>,
    pub start_register: Option<Word>,
    pub start_line: Option<Word>,
    pub initial_memory: Option<Vec<Word>>,
    pub input: Vec<Word>,
}

fn word(key: &'static str, value: &str) -> Result<Word, ConfigError> {
    word_from_str(value).map_err(|source| ConfigError::InvalidValue { key, source })
}

fn word_list(key: &'static str, value: &str) -> Result<Vec<Word>, ConfigError> {
    word_list_from_str(value).map_err(|source| ConfigError::InvalidValue { key, source })
}

impl Config {
    /// Apply a line of the configuration block
    ///
    /// Blank and comment-only lines are ignored. Setting a key twice keeps the last value, except
    /// for `input` which appends.
    ///
    /// # Errors
    ///
    /// This function will return an error if the line is not an assignment, if the key is unknown
    /// or if the value cannot be parsed.
    pub fn apply(&mut self, line: &str) -> Result<(), ConfigError> {
        let line = clean_line(line);
        if line.is_empty() {
            return Ok(());
        }

        if !line.contains('=') {
            return Err(ConfigError::MalformedAssignment {
                line: line.to_owned(),
            });
        }

        let (key, value) = split_on_first(line, '=');
        let (key, value) = (trim(key), trim(value));
        debug!(key, value, "Configuration assignment");

        match key {
            "msize" | "size" => self.memory_size = Some(word("msize", value)?),
            "startreg" => self.start_register = Some(word("startreg", value)?),
            "startline" => self.start_line = Some(word("startline", value)?),
            "init" => self.initial_memory = Some(word_list("init", value)?),
            "input" => self.input.extend(word_list("input", value)?),
            _ => {
                return Err(ConfigError::UnknownKey {
                    key: key.to_owned(),
                })
            }
        }

        Ok(())
    }

    /// Compute the memory size
    ///
    /// An explicit size wins, then the length of the initial memory, then the default size.
    fn memory_size(&self) -> Result<usize, ConfigError> {
        match (self.memory_size, &self.initial_memory) {
            (Some(size), _) => usize::try_from(size)
                .ok()
                .filter(|&size| size > 0)
                .ok_or(ConfigError::OutOfRange {
                    key: "msize",
                    expected: "positive",
                    value: size,
                }),

            (None, Some(initial_memory)) if initial_memory.is_empty() => {
                Err(ConfigError::EmptyMemory)
            }

            (None, Some(initial_memory)) => Ok(initial_memory.len()),

            (None, None) => Ok(DEFAULT_MEMORY_SIZE),
        }
    }

    /// Apply the defaults and check the configuration is consistent
    ///
    /// # Errors
    ///
    /// This function will return an error if the memory size is not positive, if the initial
    /// memory does not fit in it, or if the start line is negative.
    pub fn resolve(self) -> Result<MachineConfig, ConfigError> {
        let memory_size = self.memory_size()?;

        let line_init = match self.start_line {
            Some(line) => usize::try_from(line).map_err(|_| ConfigError::OutOfRange {
                key: "startline",
                expected: "positive or zero",
                value: line,
            })?,
            None => 0,
        };

        let contents = self.initial_memory.unwrap_or_default();
        let memory = Memory::with_contents(memory_size, &contents).map_err(|_| {
            ConfigError::InitialMemoryTooLarge {
                len: contents.len(),
                size: memory_size,
            }
        })?;

        let config = MachineConfig {
            register_init: self.start_register.unwrap_or_default(),
            line_init,
            memory,
            initial_input: self.input.into(),
        };
        debug!(?config, "Resolved machine configuration");
        Ok(config)
    }
}

/// Initial parameters of a machine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineConfig {
    pub register_init: Word,
    pub line_init: LineNumber,
    pub memory: Memory,
    pub initial_input: VecDeque<Word>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn config(lines: &[&str]) -> Result<Config, ConfigError> {
        let mut config = Config::default();
        for line in lines {
            config.apply(line)?;
        }
        Ok(config)
    }

    #[test]
    fn apply_test() {
        let config = config(&[
            "msize = 10",
            "  startreg=-4 // comment",
            "",
            "// just a comment",
            "startline=2",
            "init=[1, 2, 3]",
            "input=[4]",
            "input=[5, 6]",
        ])
        .unwrap();

        assert_eq!(
            config,
            Config {
                memory_size: Some(10),
                start_register: Some(-4),
                start_line: Some(2),
                initial_memory: Some(vec![1, 2, 3]),
                input: vec![4, 5, 6],
            }
        );
    }

    #[test]
    fn size_alias_test() {
        let config = config(&["size=12"]).unwrap();
        assert_eq!(config.memory_size, Some(12));
    }

    #[test]
    fn last_assignment_wins_test() {
        let config = config(&["startreg=1", "startreg=2"]).unwrap();
        assert_eq!(config.start_register, Some(2));
    }

    #[test]
    fn apply_errors_test() {
        assert_eq!(
            config(&["colour=blue"]),
            Err(ConfigError::UnknownKey {
                key: "colour".to_owned()
            })
        );
        assert_eq!(
            config(&["msize 10"]),
            Err(ConfigError::MalformedAssignment {
                line: "msize 10".to_owned()
            })
        );
        assert_eq!(
            config(&["msize=ten"]),
            Err(ConfigError::InvalidValue {
                key: "msize",
                source: TextError::InvalidWord("ten".to_owned())
            })
        );
        assert!(matches!(
            config(&["init=1,2"]),
            Err(ConfigError::InvalidValue { key: "init", .. })
        ));
    }

    #[test]
    fn resolve_defaults_test() {
        assert_eq!(Config::default().resolve(), Ok(MachineConfig::default()));
    }

    #[test]
    fn resolve_memory_size_test() {
        // Derived from the initial memory
        let machine = config(&["init=[1,2,3]"]).unwrap().resolve().unwrap();
        assert_eq!(machine.memory.cells(), &[1, 2, 3]);

        // Explicit size wins
        let machine = config(&["init=[1,2,3]", "msize=8"])
            .unwrap()
            .resolve()
            .unwrap();
        assert_eq!(machine.memory.cells(), &[1, 2, 3, 0, 0, 0, 0, 0]);

        let machine = config(&["msize=4"]).unwrap().resolve().unwrap();
        assert_eq!(machine.memory.cells(), &[0, 0, 0, 0]);
    }

    #[test]
    fn resolve_errors_test() {
        assert_eq!(
            config(&["init=[1,2,3]", "msize=2"]).unwrap().resolve(),
            Err(ConfigError::InitialMemoryTooLarge { len: 3, size: 2 })
        );
        assert_eq!(
            config(&["msize=0"]).unwrap().resolve(),
            Err(ConfigError::OutOfRange {
                key: "msize",
                expected: "positive",
                value: 0
            })
        );
        assert_eq!(
            config(&["init=[]"]).unwrap().resolve(),
            Err(ConfigError::EmptyMemory)
        );
        assert!(matches!(
            config(&["startline=-1"]).unwrap().resolve(),
            Err(ConfigError::OutOfRange {
                key: "startline",
                ..
            })
        ));
    }

    #[test]
    fn resolve_registers_and_input_test() {
        let machine = config(&["startreg=9", "startline=3", "input=[1, 2]"])
            .unwrap()
            .resolve()
            .unwrap();
        assert_eq!(machine.register_init, 9);
        assert_eq!(machine.line_init, 3);
        assert_eq!(machine.initial_input, VecDeque::from(vec![1, 2]));
    }
}
