use parse_display::{Display, FromStr};
use tracing::{debug, trace};

use super::{
    arguments::{Operand, Target},
    registers::Flags,
    Computer, ProcessorError,
};
use crate::constants::Word;

/// Mnemonics recognized by the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromStr)]
#[display(style = "lowercase")]
pub enum InstructionKind {
    Nop,
    Mov,
    Cpf,
    Cpt,
    Add,
    Sub,
    Inc,
    Dec,
    Jmp,
    Jiz,
    Jlz,
    Inp,
    Gis,
    Out,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Instruction {
    /// No-op
    #[display("nop")]
    Nop,

    /// A label declaration. Behaves like a no-op but does not count as a step
    #[display("(label)")]
    Label,

    /// Copy a memory cell to another
    #[display("mov {0} {1}")]
    Mov(Operand, Operand),

    /// Load the accumulator from memory
    #[display("cpf {0}")]
    Cpf(Operand),

    /// Store the accumulator in memory
    #[display("cpt {0}")]
    Cpt(Operand),

    /// Add a memory cell to the accumulator
    #[display("add {0}")]
    Add(Operand),

    /// Substract a memory cell from the accumulator
    #[display("sub {0}")]
    Sub(Operand),

    /// Increment a memory cell
    #[display("inc {0}")]
    Inc(Operand),

    /// Decrement a memory cell
    #[display("dec {0}")]
    Dec(Operand),

    /// Unconditional jump
    #[display("jmp {0}")]
    Jmp(Target),

    /// Jump if the accumulator is zero
    #[display("jiz {0}")]
    Jiz(Target),

    /// Jump if the accumulator is strictly negative
    #[display("jlz {0}")]
    Jlz(Target),

    /// Pop the next input value into the accumulator
    #[display("inp")]
    Inp,

    /// Load the number of pending input values into the accumulator
    #[display("gis")]
    Gis,

    /// Push the accumulator to the output
    #[display("out")]
    Out,

    /// Stop the machine
    #[display("end")]
    End,
}

impl Instruction {
    /// Execute the instruction
    ///
    /// Every instruction either moves the program counter to the next line or sets it
    /// explicitly, except `end` which stops the machine where it is.
    #[tracing::instrument(skip(computer), level = "trace")]
    pub(crate) fn execute(&self, computer: &mut Computer) -> Result<(), ProcessorError> {
        use Instruction as I;

        match *self {
            I::Nop | I::Label => computer.advance(),

            I::Mov(from, to) => {
                let value = computer.word(&from)?;
                *computer.slot(&to)? = value;
                trace!("{} -> {} = {}", from, to, value);
                computer.advance();
            }

            I::Cpf(operand) => {
                let value = computer.word(&operand)?;
                computer.registers.set_accumulator(value);
                computer.advance();
            }

            I::Cpt(operand) => {
                let value = computer.registers.accumulator;
                *computer.slot(&operand)? = value;
                computer.advance();
            }

            I::Add(operand) => {
                let a = computer.registers.accumulator;
                let b = computer.word(&operand)?;
                let res = a.wrapping_add(b);
                debug!("{} + {} = {}", a, b, res);
                computer.registers.set_accumulator(res);
                computer.advance();
            }

            I::Sub(operand) => {
                let a = computer.registers.accumulator;
                let b = computer.word(&operand)?;
                let res = a.wrapping_sub(b);
                debug!("{} - {} = {}", a, b, res);
                computer.registers.set_accumulator(res);
                computer.advance();
            }

            I::Inc(operand) => {
                let cell = computer.slot(&operand)?;
                *cell = cell.wrapping_add(1);
                computer.advance();
            }

            I::Dec(operand) => {
                let cell = computer.slot(&operand)?;
                *cell = cell.wrapping_sub(1);
                computer.advance();
            }

            I::Jmp(target) => computer.jump(target),

            I::Jiz(target) => {
                if computer.registers.accumulator == 0 {
                    computer.jump(target);
                } else {
                    computer.advance();
                }
            }

            I::Jlz(target) => {
                if computer.registers.accumulator < 0 {
                    computer.jump(target);
                } else {
                    computer.advance();
                }
            }

            I::Inp => {
                let value = computer
                    .input
                    .pop_front()
                    .ok_or(ProcessorError::EmptyInput)?;
                debug!(value, "Read input");
                computer.registers.set_accumulator(value);
                computer.advance();
            }

            I::Gis => {
                let pending = Word::try_from(computer.input.len()).unwrap_or(Word::MAX);
                computer.registers.set_accumulator(pending);
                computer.advance();
            }

            I::Out => {
                let value = computer.registers.take_accumulator();
                debug!(value, "Output");
                computer.output.push_back(value);
                computer.advance();
            }

            I::End => {
                computer.registers.flags.insert(Flags::ENDED);
            }
        };

        Ok(())
    }

    /// Number of steps the instruction accounts for
    pub(crate) const fn cost(&self) -> u64 {
        match self {
            Self::Label => 0,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::memory::MemoryError;

    fn computer(memory: &[Word]) -> Computer {
        let mut computer = Computer::default();
        for (address, value) in (0..).zip(memory) {
            *computer.memory.get_mut(address).unwrap() = *value;
        }
        computer
    }

    #[test]
    fn mov_test() {
        let mut computer = computer(&[7, 0, 1]);
        Instruction::Mov(Operand::direct(0), Operand::direct(1))
            .execute(&mut computer)
            .unwrap();
        assert_eq!(computer.memory.get(1), Ok(7));
        assert_eq!(computer.registers.pc, 1);

        // Through one indirection: cell 2 points to cell 1
        Instruction::Mov(Operand::direct(2), Operand::new(2, 1))
            .execute(&mut computer)
            .unwrap();
        assert_eq!(computer.memory.get(1), Ok(1));

        // Moving a cell onto itself leaves it untouched
        Instruction::Mov(Operand::direct(0), Operand::direct(0))
            .execute(&mut computer)
            .unwrap();
        assert_eq!(computer.memory.get(0), Ok(7));
    }

    #[test]
    fn accumulator_arithmetic_test() {
        let mut computer = computer(&[5, 3]);
        Instruction::Cpf(Operand::direct(0))
            .execute(&mut computer)
            .unwrap();
        assert_eq!(computer.registers.accumulator, 5);

        Instruction::Sub(Operand::direct(1))
            .execute(&mut computer)
            .unwrap();
        assert_eq!(computer.registers.accumulator, 2);

        Instruction::Add(Operand::direct(0))
            .execute(&mut computer)
            .unwrap();
        assert_eq!(computer.registers.accumulator, 7);

        Instruction::Cpt(Operand::direct(2))
            .execute(&mut computer)
            .unwrap();
        assert_eq!(computer.memory.get(2), Ok(7));
        assert_eq!(computer.registers.pc, 4);
    }

    #[test]
    fn overflow_wraps_test() {
        let mut computer = computer(&[1, Word::MAX]);
        computer.registers.accumulator = Word::MAX;
        Instruction::Add(Operand::direct(0))
            .execute(&mut computer)
            .unwrap();
        assert_eq!(computer.registers.accumulator, Word::MIN);

        Instruction::Sub(Operand::direct(0))
            .execute(&mut computer)
            .unwrap();
        assert_eq!(computer.registers.accumulator, Word::MAX);

        Instruction::Inc(Operand::direct(1))
            .execute(&mut computer)
            .unwrap();
        assert_eq!(computer.memory.get(1), Ok(Word::MIN));

        Instruction::Dec(Operand::direct(1))
            .execute(&mut computer)
            .unwrap();
        assert_eq!(computer.memory.get(1), Ok(Word::MAX));

        *computer.memory.get_mut(1).unwrap() = Word::MIN;
        Instruction::Dec(Operand::direct(1))
            .execute(&mut computer)
            .unwrap();
        assert_eq!(computer.memory.get(1), Ok(Word::MAX));
    }

    #[test]
    fn inc_dec_mutate_memory_test() {
        let mut computer = computer(&[2, 0, 10]);
        Instruction::Inc(Operand::new(0, 1))
            .execute(&mut computer)
            .unwrap();
        assert_eq!(computer.memory.get(2), Ok(11));

        Instruction::Dec(Operand::direct(1))
            .execute(&mut computer)
            .unwrap();
        assert_eq!(computer.memory.get(1), Ok(-1));
        assert_eq!(computer.registers.pc, 2);
    }

    #[test]
    fn conditional_jumps_test() {
        let mut computer = Computer::default();

        // jiz takes the jump only on exactly zero
        for (accumulator, expected) in [(0, 42), (1, 1), (-1, 1)] {
            computer.registers.pc = 0;
            computer.registers.accumulator = accumulator;
            Instruction::Jiz(Target(42)).execute(&mut computer).unwrap();
            assert_eq!(computer.registers.pc, expected, "jiz with {accumulator}");
        }

        // jlz takes the jump only on strictly negative values
        for (accumulator, expected) in [(-1, 42), (Word::MIN, 42), (0, 1), (1, 1)] {
            computer.registers.pc = 0;
            computer.registers.accumulator = accumulator;
            Instruction::Jlz(Target(42)).execute(&mut computer).unwrap();
            assert_eq!(computer.registers.pc, expected, "jlz with {accumulator}");
        }

        computer.registers.pc = 3;
        Instruction::Jmp(Target(1)).execute(&mut computer).unwrap();
        assert_eq!(computer.registers.pc, 1);
    }

    #[test]
    fn input_output_test() {
        let mut computer = Computer::default();
        computer.input.extend([4, 5]);

        Instruction::Gis.execute(&mut computer).unwrap();
        assert_eq!(computer.registers.accumulator, 2);

        Instruction::Inp.execute(&mut computer).unwrap();
        assert_eq!(computer.registers.accumulator, 4);

        Instruction::Out.execute(&mut computer).unwrap();
        assert!(computer.registers.flags.contains(Flags::ACCUMULATOR_CONSUMED));
        assert_eq!(computer.output.iter().copied().collect::<Vec<_>>(), vec![4]);
        assert_eq!(computer.registers.pc, 3);

        Instruction::Inp.execute(&mut computer).unwrap();
        assert!(!computer.registers.flags.contains(Flags::ACCUMULATOR_CONSUMED));
        assert_eq!(computer.registers.accumulator, 5);
    }

    #[test]
    fn accumulator_writes_clear_consumed_test() {
        let mut computer = computer(&[3]);
        let writers = [
            Instruction::Cpf(Operand::direct(0)),
            Instruction::Add(Operand::direct(0)),
            Instruction::Sub(Operand::direct(0)),
            Instruction::Gis,
        ];

        for instruction in writers {
            Instruction::Out.execute(&mut computer).unwrap();
            assert!(computer.registers.flags.contains(Flags::ACCUMULATOR_CONSUMED));

            instruction.execute(&mut computer).unwrap();
            assert!(
                !computer.registers.flags.contains(Flags::ACCUMULATOR_CONSUMED),
                "{instruction} should clear the flag"
            );
        }

        // Other instructions leave it alone
        Instruction::Out.execute(&mut computer).unwrap();
        Instruction::Cpt(Operand::direct(0))
            .execute(&mut computer)
            .unwrap();
        Instruction::Inc(Operand::direct(0))
            .execute(&mut computer)
            .unwrap();
        assert!(computer.registers.flags.contains(Flags::ACCUMULATOR_CONSUMED));
    }

    #[test]
    fn empty_input_test() {
        let mut computer = Computer::default();
        computer.registers.accumulator = 12;
        assert_eq!(
            Instruction::Inp.execute(&mut computer),
            Err(ProcessorError::EmptyInput)
        );
        assert_eq!(computer.registers.accumulator, 12);
        assert_eq!(computer.registers.pc, 0);
    }

    #[test]
    fn end_test() {
        let mut computer = Computer::default();
        computer.registers.pc = 5;
        Instruction::End.execute(&mut computer).unwrap();
        assert!(computer.registers.has_ended());
        assert_eq!(computer.registers.pc, 5);
    }

    #[test]
    fn out_of_bounds_test() {
        let mut computer = computer(&[500]);
        assert_eq!(
            Instruction::Cpf(Operand::new(0, 1)).execute(&mut computer),
            Err(ProcessorError::OutOfBoundsAddress(MemoryError::OutOfBounds {
                address: 500,
                size: 100
            }))
        );
    }

    #[test]
    fn display_test() {
        assert_eq!(
            Instruction::Mov(Operand::new(0, 1), Operand::direct(5)).to_string(),
            "mov *0 5"
        );
        assert_eq!(Instruction::Jlz(Target(12)).to_string(), "jlz 12");
        assert_eq!(Instruction::Gis.to_string(), "gis");
    }

    #[test]
    fn instruction_kind_test() {
        assert_eq!(
            "cpf".parse::<InstructionKind>().ok(),
            Some(InstructionKind::Cpf)
        );
        assert_eq!(
            "jlz".parse::<InstructionKind>().ok(),
            Some(InstructionKind::Jlz)
        );
        assert!("CPF".parse::<InstructionKind>().is_err());
        assert!("jin".parse::<InstructionKind>().is_err());
    }
}
