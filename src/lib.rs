//! A restricted ARM Thumb assembler and simulated CPU.
//!
//! Assembly source goes through a two-stage pipeline: the [`asm`] module
//! tokenizes and validates it into a [`Program`], and the [`emu`] module
//! executes the validated instructions against a small CPU (name-keyed
//! register file, flat memory, stack). There is no feedback from execution
//! back into assembly.

pub mod asm;
pub mod emu;
pub mod plat;

pub use asm::Assembler;
pub use emu::{Cpu, CpuConfig, CpuSnapshot};
pub use plat::{Diagnostic, Instruction, Opcode, Operand, OperandKind, Program};
