//! This module implements the TTY interactive interface.
//!
//! It is mainly based on two crates:
//!   - rustyline, to handle the line-editting logic
//!   - clap, to handle the parsing of those interactive commands
//!
//! Using Parser to do this is a bit of a hack, and requires some weird options
//! to have it working but works nonetheless.

use std::collections::{BTreeMap, BTreeSet};

use cai_emulator::compiler::DebugInfo;
use cai_emulator::constants::{LineNumber, Word};
use cai_emulator::runtime::{Computer, Instruction, Operand, ProcessorError, ResolveAddress};
use clap::Parser;
use rustyline::history::DefaultHistory;
use rustyline::{Behavior, CompletionType, Config, EditMode, Editor};
use tracing::{debug, info, warn};

mod helper;
mod parse;
use self::helper::RunHelper;
use self::parse::Location;

static HELP: &str = r#"
Run "help [command]" for command-specific help.
An empty line re-runs the last valid command."#;

#[derive(Parser, Clone, Debug)]
#[command(
    help_template = "{about}\n\nCOMMANDS:\n{subcommands}\n{after-help}",
    after_help = HELP,
    disable_version_flag = true,
    infer_subcommands = true,
    no_binary_name = true,
    allow_negative_numbers = true,
)]
/// Interactive mode commands
enum Command {
    /// Execute the next instructions
    #[command(alias = "s")]
    Step {
        /// Number of steps to execute
        #[arg(default_value = "1")]
        number: u64,
    },

    /// Exit the emulator
    Exit,

    /// Show the state of the machine
    State,

    /// Show the content of a block in memory
    Memory {
        /// The first cell to show, with optional indirections (e.g. `4`, `*4`, `**4`)
        operand: Operand,

        /// Number of memory cells to show. Negative values go backwards.
        #[arg(default_value = "1", allow_negative_numbers = true)]
        number: i32,
    },

    /// Set a value in memory
    Set {
        /// The cell to set, with optional indirections
        operand: Operand,

        /// The value to set
        #[arg(allow_negative_numbers = true)]
        value: Word,
    },

    /// Show the next few lines
    List {
        /// Number of lines to show
        #[arg(default_value = "10")]
        number: usize,
    },

    /// Set a breakpoint
    Break {
        /// The line where to set the breakpoint, as a line number or a label
        location: Location,
    },

    /// Remove a breakpoint
    Unbreak {
        /// The line of the breakpoint to remove, as a line number or a label
        location: Location,
    },

    /// Continue the program until the next breakpoint or its end
    #[command(alias = "c")]
    Continue,

    /// Show informations about the current debugging session
    Info {
        #[command(subcommand)]
        sub: Option<InfoCommand>,
    },
}

#[derive(Parser, Clone, Debug)]
enum InfoCommand {
    /// List active breakpoints
    Breakpoints,

    /// List program labels
    Labels,

    /// Show the number of steps executed since the beginning of the program
    Steps,

    /// Show the values output by the program
    Output,
}

/// Why a `continue` command gave the control back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Ended,
    Breakpoint(LineNumber),
}

/// Holds informations about a interactive session
#[derive(Debug, Default)]
struct Session {
    /// List of active breakpoints
    breakpoints: BTreeSet<LineNumber>,

    /// Labels and the lines they point to
    debug_info: DebugInfo,

    /// Current line for the `list` command
    list_line: Option<LineNumber>,
}

impl Session {
    fn from_debug_info(debug_info: DebugInfo) -> Session {
        Session {
            debug_info,
            ..Default::default()
        }
    }

    fn labels(&self) -> &BTreeMap<String, LineNumber> {
        &self.debug_info.labels
    }

    /// Add a breakpoint
    fn add_breakpoint(&mut self, line: LineNumber) {
        if self.breakpoints.insert(line) {
            info!(line, "Setting a breakpoint");
        } else {
            warn!(line, "A breakpoint was already set");
        }
    }

    /// Remove a breakpoint
    fn remove_breakpoint(&mut self, line: LineNumber) {
        if self.breakpoints.remove(&line) {
            info!(line, "Removing breakpoint");
        } else {
            warn!(line, "No breakpoint was set here");
        }
    }

    /// Checks if the given line has a breakpoint
    fn has_breakpoint(&self, line: LineNumber) -> bool {
        self.breakpoints.contains(&line)
    }

    /// Step the computer until it reaches a breakpoint or ends
    ///
    /// At least one step is executed, so continuing from a breakpoint moves past it.
    fn continue_until_breakpoint(&self, computer: &mut Computer) -> Result<Stop, ProcessorError> {
        loop {
            computer.step()?;

            if computer.registers.has_ended() {
                return Ok(Stop::Ended);
            }

            let line = computer.registers.pc;
            if self.has_breakpoint(line) {
                return Ok(Stop::Breakpoint(line));
            }
        }
    }

    /// Reset the `list` command (after running an instruction)
    fn reset_list(&mut self) {
        self.list_line = None;
    }

    /// Offset the `list` command, returns the line to show
    fn offset_list(&mut self, computer: &Computer, offset: usize) -> LineNumber {
        let line = self.list_line.unwrap_or(computer.registers.pc);
        self.list_line = Some(line + offset);
        line
    }

    /// Display the list of breakpoints
    fn display_breakpoints(&self, computer: &Computer) {
        match self.breakpoints.len() {
            0 => info!("No breakpoints"),
            1 => info!("1 breakpoint:"),
            x => info!("{} breakpoints:", x),
        }

        for &line in &self.breakpoints {
            self.display_line(computer, line);
        }
    }

    /// Display the instruction on a line
    fn display_line(&self, computer: &Computer, line: LineNumber) {
        // Compute what is supposed to show in the gutter
        let is_current_line = computer.registers.pc == line;
        let has_breakpoint = self.has_breakpoint(line);

        let gutter = match (has_breakpoint, is_current_line) {
            (true, true) => "B>",
            (true, false) => "B ",
            (false, true) => " >",
            (false, false) => "  ",
        };

        match computer.program.get(line) {
            Some(Instruction::Label) => {
                let labels: Vec<_> = self.debug_info.labels_for(line + 1).collect();
                info!("{:<2} {:>5}    {}:", gutter, line, labels.join(", "));
            }
            Some(instruction) => info!("{:<2} {:>5}    {}", gutter, line, instruction),
            None if line < computer.program.len() => info!("{:<2} {:>5}", gutter, line),
            None => info!("{:<2} {:>5}    –", gutter, line),
        }
    }

    /// Display the list of labels
    fn display_labels(&self) {
        match self.labels().len() {
            0 => info!("No labels"),
            1 => info!("1 label:"),
            x => info!("{} labels:", x),
        }

        for (label, &line) in self.labels() {
            info!("  {} => {}", label, line);
        }
    }

    /// Display the number of steps executed
    fn display_steps(computer: &Computer) {
        info!("Steps: {}", computer.steps);
    }

    /// Display the output queue
    fn display_output(computer: &Computer) {
        match computer.output.len() {
            0 => info!("No output"),
            1 => info!("1 output value:"),
            x => info!("{} output values:", x),
        }

        for value in &computer.output {
            info!("  {}", value);
        }
    }
}

/// Display a block of memory, starting at a resolved address
fn display_memory(computer: &Computer, operand: Operand, number: i32) -> anyhow::Result<()> {
    let start = Word::try_from(operand.resolve_address(&computer.memory)?)?;
    let step = number.signum();

    for i in 0..number.saturating_abs() {
        let address = start.wrapping_add(i * step);
        let value = computer.memory.get(address)?;
        info!(address, value);
    }

    Ok(())
}

#[allow(clippy::too_many_lines)]
pub(crate) fn run_interactive(computer: &mut Computer, debug_info: DebugInfo) -> anyhow::Result<()> {
    info!("Running in interactive mode. Type \"help\" to list available commands.");
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .behavior(Behavior::PreferTerm)
        .auto_add_history(true)
        .build();

    let h: RunHelper<Command> = RunHelper::new(debug_info.labels.keys().cloned().collect());
    let mut session = Session::from_debug_info(debug_info);

    let mut rl: Editor<RunHelper<Command>, DefaultHistory> = Editor::with_config(config)?;
    rl.set_helper(Some(h));

    let mut last_command: Option<Command> = None;
    let mut halted = false;

    'read: loop {
        // A macro to unwrap an error, log it and continue the loop
        macro_rules! warn_and_continue {
            ($e:expr) => {
                match $e {
                    Ok(o) => o,
                    Err(e) => {
                        tracing::warn!(error = %e);
                        continue 'read;
                    }
                }
            };
        }

        let Ok(readline) = rl.readline(">> ") else {
            info!("EOF, exitting");
            return Ok(());
        };

        let command = if readline.is_empty() {
            if let Some(command) = &last_command {
                command.clone()
            } else {
                info!("Type \"help\" to get the list of available commands");
                continue 'read;
            }
        } else {
            let Ok(words) = shell_words::split(readline.as_str()) else {
                warn!("Invalid input");
                continue 'read;
            };

            let command = warn_and_continue!(Command::try_parse_from(words));
            last_command = Some(command.clone());
            command
        };

        debug!("Executing command: {:?}", command);

        match (command, halted) {
            (Command::Exit, _) => break,
            (Command::Step { number }, false) => {
                session.reset_list();

                for _ in 0..number {
                    if computer.registers.has_ended() {
                        info!("The program has ended");
                        continue 'read;
                    }

                    if let Err(e) = computer.step() {
                        warn!(error = &e as &dyn std::error::Error, "Halted");
                        halted = true;
                        continue 'read;
                    }
                }

                session.display_line(computer, computer.registers.pc);
            }

            (Command::State, _) => {
                info!("Registers: {}", computer.registers);
                info!("{}", computer.snapshot());
            }

            (Command::Memory { operand, number }, _) => {
                warn_and_continue!(display_memory(computer, operand, number));
            }

            (Command::Set { operand, value }, false) => {
                let index = warn_and_continue!(operand.resolve_address(&computer.memory));
                info!("Setting memory cell {index} to {value}");
                let address = warn_and_continue!(Word::try_from(index));
                let cell = warn_and_continue!(computer.memory.get_mut(address));
                *cell = value;
            }

            (Command::List { number }, _) => {
                let line = session.offset_list(computer, number);
                for i in 0..number {
                    session.display_line(computer, line + i);
                }
            }

            (Command::Break { location }, false) => {
                let line = warn_and_continue!(location.resolve(session.labels()));
                session.add_breakpoint(line);
            }

            (Command::Unbreak { location }, false) => {
                let line = warn_and_continue!(location.resolve(session.labels()));
                session.remove_breakpoint(line);
            }

            (Command::Continue, false) => {
                session.reset_list();

                match session.continue_until_breakpoint(computer) {
                    Ok(Stop::Ended) => {
                        info!(line = computer.registers.pc, "The program has ended");
                    }
                    Ok(Stop::Breakpoint(line)) => info!(line, "Stopped at a breakpoint"),
                    Err(e) => {
                        warn!(error = &e as &dyn std::error::Error, "Halted");
                        halted = true;
                    }
                }
            }

            (Command::Info { sub }, _) => match sub {
                Some(InfoCommand::Breakpoints) => {
                    session.display_breakpoints(computer);
                }
                Some(InfoCommand::Labels) => {
                    session.display_labels();
                }
                Some(InfoCommand::Steps) => {
                    Session::display_steps(computer);
                }
                Some(InfoCommand::Output) => {
                    Session::display_output(computer);
                }
                None => {
                    session.display_breakpoints(computer);
                    info!("–");
                    session.display_labels();
                    info!("–");
                    Session::display_steps(computer);
                    Session::display_output(computer);
                }
            },

            (_, true) => {
                // Computer is halted but the user asked to continue, we just warn
                warn!("Computer is halted. Use \"exit\" to quit");
            }
        }
    }

    Ok(())
}
