//! An emulator for a small accumulator machine
//!
//! Programs are written in a line-oriented assembly language. A program starts with an optional
//! configuration block setting up the machine, followed by one instruction or label per line.
//! Every data operand designates a memory cell, optionally through several levels of indirection.
//!
//! ```
//! let source = "ENVDEF\ninit=[7, 0]\nENDENVDEF\nadd 0\ncpt 1\nend";
//! let (mut computer, _debug_info) = cai_emulator::load(source).unwrap();
//! computer.run().unwrap();
//! assert_eq!(computer.memory.cells(), &[7, 7]);
//! ```

pub mod compiler;
pub mod constants;
pub mod parser;
pub mod runtime;

pub use self::{
    compiler::{compile, load},
    parser::parse,
};
