//! The assembler module: operand classification, per-line instruction
//! parsing, and the section-aware driver.

use thiserror::Error;

pub mod assembler;
pub mod lexer;
pub mod parser;

pub use assembler::Assembler;

/// An error raised while assembling a single line (or locating sections).
///
/// These are returned as values and packaged into a
/// [`Diagnostic`](crate::plat::Diagnostic) by the driver, which knows the
/// line number; they are never used for control flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsmError {
    #[error("unknown operation: {0}")]
    UnknownMnemonic(String),
    #[error("invalid number of operands for {opcode}. expected {expected}, got {got}")]
    OperandCount {
        opcode: &'static str,
        expected: &'static str,
        got: usize,
    },
    #[error("invalid register. expected r0-r7 or r8-r15 but got r{0}")]
    InvalidRegisterIndex(u32),
    #[error("invalid hexadecimal immediate. expected #0x[0-9a-f] but got {0}")]
    InvalidHexImmediate(String),
    #[error("invalid immediate. expected #0x[0-9a-f] or #[0-9] but got {0}")]
    InvalidImmediate(String),
    #[error("invalid operand: {0}")]
    UnrecognizedOperand(String),
    #[error("operand {position}: expected a register but got {got}")]
    ExpectedRegister { position: usize, got: String },
    #[error("operand {position}: expected an immediate but got {got}")]
    ExpectedImmediate { position: usize, got: String },
    #[error("operand {position}: sp is not allowed here")]
    SpNotAllowed { position: usize },
    #[error("only low registers allowed with immediate operand")]
    HighRegisterWithImmediate,
    #[error("operand {position}: immediate value must be between {min} and {max}, got {got}")]
    ImmediateOutOfRange {
        position: usize,
        min: i64,
        max: i64,
        got: i64,
    },
    #[error("missing .text directive")]
    MissingTextSection,
}
