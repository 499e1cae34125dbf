/// A machine word, held by the accumulator and by every memory cell
pub type Word = i32;

/// Index of a line in the program, counted from the first line after the configuration block
pub type LineNumber = usize;

/// Memory size used when the configuration block sets neither `msize` nor `init`
pub const DEFAULT_MEMORY_SIZE: usize = 100;

/// Opens the configuration block
pub(crate) const CONFIG_START: &str = "ENVDEF";

/// Closes the configuration block
pub(crate) const CONFIG_END: &str = "ENDENVDEF";

/// Marks the end of the program before the end of the input
pub(crate) const PROGRAM_END: &str = "ENDPROGRAM";

/// Starts a comment running to the end of the line
pub(crate) const COMMENT_MARKER: &str = "//";

/// Suffix of a label declaration
pub(crate) const LABEL_SUFFIX: char = ':';

/// Prefix adding one level of indirection to an operand
pub(crate) const INDIRECTION_MARKER: char = '*';
