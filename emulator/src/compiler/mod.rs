use std::collections::BTreeMap;

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;
use tracing::debug;

use crate::constants::LineNumber;
use crate::parser::{config::ConfigError, parse, Source, SourceError};
use crate::runtime::{Computer, Instruction, Program, Registers};

use self::labels::resolve_labels;
use self::program::compile_line;

pub use self::program::InstructionCompilationError;

pub(crate) mod labels;
pub(crate) mod program;

/// Holds informations about the compilation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugInfo {
    /// Map of labels to the line they point to
    pub labels: BTreeMap<String, LineNumber>,
}

impl DebugInfo {
    /// Find the labels pointing to a line
    pub fn labels_for(&self, line: LineNumber) -> impl Iterator<Item = &str> {
        self.labels
            .iter()
            .filter(move |(_, &target)| target == line)
            .map(|(label, _)| label.as_str())
    }

    /// Render a program with its labels
    #[must_use]
    pub fn listing<'a>(&'a self, program: &'a Program) -> Listing<'a> {
        Listing {
            program,
            debug_info: self,
        }
    }
}

/// A printable listing of a program
pub struct Listing<'a> {
    program: &'a Program,
    debug_info: &'a DebugInfo,
}

impl std::fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (line, instruction) in self.program.iter() {
            if let Instruction::Label = instruction {
                for label in self.debug_info.labels_for(line + 1) {
                    writeln!(f, "{label}:")?;
                }
            } else {
                writeln!(f, "{line:>5}    {instruction}")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum CompilationError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] SourceError),

    #[error("invalid configuration")]
    #[diagnostic(code(cai::config))]
    Config(#[from] ConfigError),

    #[error("could not compile line {line}")]
    #[diagnostic(code(cai::instruction))]
    Instruction {
        line: LineNumber,

        #[source]
        source: InstructionCompilationError,

        #[label("in this line")]
        span: SourceSpan,
    },
}

/// Build a machine ready to run a parsed program
///
/// Labels are all resolved before any line is compiled, so every jump target is known before the
/// machine is created.
///
/// # Errors
///
/// This function will return an error if the configuration is inconsistent or if a line does not
/// compile.
#[tracing::instrument(skip(source))]
pub fn compile(source: Source<'_>) -> Result<(Computer, DebugInfo), CompilationError> {
    let machine = source.config.resolve()?;
    let labels = resolve_labels(&source.lines);

    let program = source
        .lines
        .iter()
        .enumerate()
        .map(|(line, content)| {
            compile_line(&content.inner, &labels).map_err(|source| {
                CompilationError::Instruction {
                    line,
                    source,
                    span: content.span(),
                }
            })
        })
        .collect::<Result<Program, _>>()?;
    debug!(lines = program.len(), "Compiled program");

    let computer = Computer {
        registers: Registers {
            accumulator: machine.register_init,
            pc: machine.line_init,
            ..Default::default()
        },
        memory: machine.memory,
        program,
        input: machine.initial_input,
        ..Default::default()
    };

    let debug_info = DebugInfo {
        labels: labels
            .into_iter()
            .map(|(label, line)| (label.to_owned(), line))
            .collect(),
    };

    Ok((computer, debug_info))
}

/// Parse and compile a program source
///
/// # Errors
///
/// This function will return an error if the source does not parse or compile.
pub fn load(input: &str) -> Result<(Computer, DebugInfo), CompilationError> {
    compile(parse(input)?)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::runtime::{Flags, ProcessorError, Target};

    #[test]
    fn load_and_run_test() {
        let input = indoc! {"
            ENVDEF
            init=[7, 0]
            ENDENVDEF
            add 0
            cpt 1
            end
        "};
        let (mut computer, _) = load(input).unwrap();
        computer.run().unwrap();

        assert_eq!(computer.registers.accumulator, 7);
        assert_eq!(computer.memory.cells(), &[7, 7]);
        assert!(computer.registers.flags.contains(Flags::ENDED));
        assert_eq!(computer.steps, 3);
    }

    #[test]
    fn default_configuration_test() {
        let (computer, debug_info) = load("end").unwrap();
        assert_eq!(computer.memory.len(), 100);
        assert_eq!(computer.registers.accumulator, 0);
        assert_eq!(computer.registers.pc, 0);
        assert!(computer.input.is_empty());
        assert!(debug_info.labels.is_empty());
    }

    #[test]
    fn configuration_test() {
        let input = indoc! {"
            ENVDEF
            init=[1,2,3]
            startreg=-5
            startline=1
            input=[10, 20]
            ENDENVDEF
            nop
            end
        "};
        let (computer, _) = load(input).unwrap();

        assert_eq!(computer.memory.len(), 3);
        assert_eq!(computer.memory.cells(), &[1, 2, 3]);
        assert_eq!(computer.registers.accumulator, -5);
        assert_eq!(computer.registers.pc, 1);
        assert_eq!(computer.input, [10, 20]);
    }

    #[test]
    fn startline_past_end_test() {
        let (mut computer, _) = load("ENVDEF\nstartline=50\nENDENVDEF\nnop\nend").unwrap();
        assert_eq!(computer.registers.pc, 50);

        assert_eq!(computer.step(), Ok(()));
        assert!(computer.registers.flags.contains(Flags::ENDED));
        assert_eq!(computer.steps, 0);
    }

    #[test]
    fn labels_test() {
        let input = indoc! {"
            nop
            nop
            nop
            nop
            nop
            loop:
            jmp loop
        "};
        let (computer, debug_info) = load(input).unwrap();

        assert_eq!(debug_info.labels.get("loop"), Some(&6));
        assert_eq!(computer.program.get(6), Some(&Instruction::Jmp(Target(6))));
    }

    #[test]
    fn forward_label_test() {
        let input = indoc! {"
            ENVDEF
            startreg=0
            ENDENVDEF
            jiz skip
            out
            skip:
            end
        "};
        let (mut computer, _) = load(input).unwrap();
        computer.run().unwrap();

        assert!(computer.output.is_empty());
        assert_eq!(computer.registers.pc, 3);
    }

    #[test]
    fn unknown_label_test() {
        let res = load("nop\njmp nowhere\nend");
        let Err(CompilationError::Instruction { line, source, .. }) = res else {
            panic!("expected an instruction error");
        };
        assert_eq!(line, 1);
        assert_eq!(
            source,
            InstructionCompilationError::UnknownLabel("nowhere".to_owned())
        );
    }

    #[test]
    fn unknown_opcode_test() {
        let res = load("nop\n\nhalt");
        assert!(matches!(
            res,
            Err(CompilationError::Instruction {
                line: 2,
                source: InstructionCompilationError::UnknownOpcode(_),
                ..
            })
        ));
    }

    #[test]
    fn config_error_test() {
        let res = load("ENVDEF\ninit=[1,2,3]\nmsize=2\nENDENVDEF\nend");
        assert!(matches!(
            res,
            Err(CompilationError::Config(
                ConfigError::InitialMemoryTooLarge { len: 3, size: 2 }
            ))
        ));

        let res = load("ENVDEF\nmsize=2");
        assert!(matches!(res, Err(CompilationError::Parse(_))));
    }

    #[test]
    fn blank_lines_keep_numbering_test() {
        let input = indoc! {"
            jmp target

            // skipped

            target:
            end
        "};
        let (mut computer, debug_info) = load(input).unwrap();
        assert_eq!(debug_info.labels.get("target"), Some(&5));

        computer.step().unwrap();
        assert_eq!(computer.registers.pc, 5);
        computer.run().unwrap();
        assert_eq!(computer.steps, 2);
    }

    #[test]
    fn io_program_test() {
        let input = indoc! {"
            ENVDEF
            msize=1
            input=[3, 4]
            ENDENVDEF
            inp
            cpt 0
            inp
            add 0
            out
            gis
            out
            end
        "};
        let (mut computer, _) = load(input).unwrap();
        computer.run().unwrap();
        assert_eq!(computer.output, [7, 0]);

        let (mut computer, _) = load("inp\nend").unwrap();
        assert_eq!(computer.run(), Err(ProcessorError::EmptyInput));
    }

    #[test]
    fn listing_test() {
        let input = indoc! {"
            ENVDEF
            init=[3, 1]
            ENDENVDEF
            loop:
              cpf 0
              jiz done
              sub 1
              cpt 0
              jmp loop

            done:
              end
        "};
        let (computer, debug_info) = load(input).unwrap();
        let listing = debug_info.listing(&computer.program).to_string();

        insta::assert_snapshot!(listing, @r###"
        loop:
            1    cpf 0
            2    jiz 8
            3    sub 1
            4    cpt 0
            5    jmp 1
        done:
            8    end
        "###);
    }

    #[test]
    fn countdown_snapshot_test() {
        let input = indoc! {"
            ENVDEF
            init=[3, 1]
            ENDENVDEF
            loop:
              cpf 0
              jiz done
              sub 1
              cpt 0
              jmp loop
            done:
              end
        "};
        let (mut computer, _) = load(input).unwrap();
        computer.run().unwrap();

        insta::assert_snapshot!(computer.snapshot().to_string(), @"ISEND: true ACC: 0  LINE: 7 - MEM: [0, 1]");
    }
}
