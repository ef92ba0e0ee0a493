//! Common platform code shared between the assembler and the emulator.
//!
//! The types in this module form the sole contract between the two: the
//! assembler emits a sequence of [`Instruction`]s whose operand counts and
//! kinds have already been checked against the opcode's legal signatures,
//! and the execution engine consumes them without re-validating.

use std::fmt;

use thiserror::Error;

/// The semantic category of a single operand token.
///
/// Registers follow the ARM Thumb bank split: `r0`-`r7` are "low" and may
/// pair freely with immediate encodings, `r8`-`r15` are "high" and may not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    /// `r0`-`r7`.
    LowRegister,
    /// `r8`-`r15`.
    HighRegister,
    /// The stack pointer, `sp`.
    SpRegister,
    /// A hexadecimal immediate, `#0x..`.
    HexImmediate,
    /// A decimal immediate, `#..` (optionally negative).
    DecImmediate,
}

impl OperandKind {
    pub fn is_register(self) -> bool {
        matches!(
            self,
            Self::LowRegister | Self::HighRegister | Self::SpRegister
        )
    }

    pub fn is_immediate(self) -> bool {
        matches!(self, Self::HexImmediate | Self::DecImmediate)
    }
}

/// A classified operand.
///
/// The raw token is retained verbatim so the execution engine can re-derive
/// the numeric value of an immediate and address registers by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub kind: OperandKind,
    pub text: String,
}

impl Operand {
    pub fn new(kind: OperandKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// The numeric value of an immediate operand, parsed per its radix.
    /// `None` for registers and for immediates too large for an `i64`.
    pub fn value(&self) -> Option<i64> {
        match self.kind {
            OperandKind::HexImmediate => {
                i64::from_str_radix(self.text.strip_prefix("#0x")?, 16).ok()
            }
            OperandKind::DecImmediate => self.text.strip_prefix('#')?.parse().ok(),
            _ => None,
        }
    }

    /// The register name (`"r3"`, `"sp"`) of a register operand.
    pub fn register(&self) -> Option<&str> {
        self.kind.is_register().then_some(self.text.as_str())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// The operations the CPU can execute.
///
/// Adding an opcode is a two-site change: its signature set in
/// [`parse_line`](crate::asm::parser::parse_line) and its execution rule in
/// [`Cpu::execute`](crate::emu::cpu::Cpu::execute). Both sites match on this
/// enum exhaustively, so the compiler flags a missing half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Mov,
    Add,
}

impl Opcode {
    /// Looks up a (lowercased) mnemonic.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        match mnemonic {
            "mov" => Some(Self::Mov),
            "add" => Some(Self::Add),
            _ => None,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Mov => "mov",
            Self::Add => "add",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A validated instruction.
///
/// Immutable once produced; the operand count and kinds are guaranteed by
/// the parser to match one of the opcode's legal signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operands: Vec<Operand>,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        for (i, operand) in self.operands.iter().enumerate() {
            if i == 0 {
                write!(f, " {operand}")?;
            } else {
                write!(f, ", {operand}")?;
            }
        }
        Ok(())
    }
}

/// A line-scoped assembly error.
///
/// `line` is a zero-based index into the text-section line array. `column`
/// is always 0: diagnostics are line-granular.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column: 0,
        }
    }
}

/// The outcome of an assembly run: a validated instruction sequence, or the
/// first diagnostic encountered.
pub type Program = Result<Vec<Instruction>, Diagnostic>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediate_values() {
        let hex = Operand::new(OperandKind::HexImmediate, "#0x1f");
        assert_eq!(hex.value(), Some(31));
        let dec = Operand::new(OperandKind::DecImmediate, "#-128");
        assert_eq!(dec.value(), Some(-128));
        let reg = Operand::new(OperandKind::LowRegister, "r3");
        assert_eq!(reg.value(), None);
        assert_eq!(reg.register(), Some("r3"));
    }

    #[test]
    fn test_instruction_display() {
        let ins = Instruction {
            opcode: Opcode::Mov,
            operands: vec![
                Operand::new(OperandKind::LowRegister, "r0"),
                Operand::new(OperandKind::DecImmediate, "#5"),
            ],
        };
        assert_eq!(ins.to_string(), "mov r0, #5");
    }

    #[test]
    fn test_mnemonic_lookup() {
        assert_eq!(Opcode::from_mnemonic("mov"), Some(Opcode::Mov));
        assert_eq!(Opcode::from_mnemonic("add"), Some(Opcode::Add));
        assert_eq!(Opcode::from_mnemonic("sub"), None);
    }
}
