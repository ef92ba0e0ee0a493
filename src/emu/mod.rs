//! The emulator module: CPU state, the execution engine, and the
//! interactive step debugger.

use thiserror::Error;

pub mod cpu;
pub mod debugger;

pub use cpu::{Cpu, CpuConfig, CpuSnapshot, CpuState};

/// An error raised while driving the CPU.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmuError {
    #[error("program counter {pc} is out of range (program has {len} instructions)")]
    ProgramCounterOutOfRange { pc: usize, len: usize },
}
