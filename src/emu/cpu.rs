//! CPU state and the execution engine.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::asm::Assembler;
use crate::plat::{Diagnostic, Instruction, Opcode, Operand, OperandKind};

use super::EmuError;

/// Every addressable register name: the sixteen general registers plus the
/// stack pointer.
pub const REGISTER_NAMES: [&str; 17] = [
    "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10", "r11", "r12", "r13", "r14",
    "r15", "sp",
];

/// Construction-time sizing. Memory and stack are allocated once and never
/// resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuConfig {
    pub memory_size: usize,
    pub stack_size: usize,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            memory_size: 64,
            stack_size: 64,
        }
    }
}

/// Whether the CPU is currently mid-`run`/`step` or waiting for work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuState {
    Idle,
    Executing,
}

/// A simulated CPU: name-keyed register file, flat memory, stack, and the
/// loaded program.
///
/// The instance exclusively owns all of its arrays; independent CPUs share
/// nothing and may run concurrently.
#[derive(Debug)]
pub struct Cpu {
    regs: FxHashMap<String, u32>,
    memory: Vec<u32>,
    stack: Vec<u32>,
    pc: usize,
    sp: usize,
    program: Vec<Instruction>,
    state: CpuState,
    config: CpuConfig,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new(CpuConfig::default())
    }
}

impl Cpu {
    pub fn new(config: CpuConfig) -> Self {
        Self {
            regs: REGISTER_NAMES
                .iter()
                .map(|name| ((*name).to_owned(), 0))
                .collect(),
            memory: vec![0; config.memory_size],
            stack: vec![0; config.stack_size],
            pc: 0,
            sp: 0,
            program: Vec::new(),
            state: CpuState::Idle,
            config,
        }
    }

    pub fn regs(&self) -> &FxHashMap<String, u32> {
        &self.regs
    }

    pub fn memory(&self) -> &[u32] {
        &self.memory
    }

    pub fn stack(&self) -> &[u32] {
        &self.stack
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn sp(&self) -> usize {
        self.sp
    }

    pub fn state(&self) -> CpuState {
        self.state
    }

    pub fn program(&self) -> &[Instruction] {
        &self.program
    }

    /// Replaces the loaded program. Registers, memory, and the program
    /// counter are left untouched.
    pub fn load(&mut self, program: Vec<Instruction>) {
        self.program = program;
    }

    /// Assembles `source` and loads the result.
    pub fn load_assembly(&mut self, source: &str) -> Result<(), Diagnostic> {
        self.program = Assembler.assemble(source)?;
        Ok(())
    }

    /// Executes every loaded instruction in order. The supported opcode set
    /// has no branches, so this is exactly "execute all, first to last".
    pub fn run(&mut self) {
        self.state = CpuState::Executing;
        let program = std::mem::take(&mut self.program);
        for ins in &program {
            self.execute(ins);
        }
        self.program = program;
        self.state = CpuState::Idle;
    }

    /// Executes the instruction at the program counter, then advances the
    /// counter by one. Stepping past the end of the program is a fault.
    pub fn step(&mut self) -> Result<(), EmuError> {
        if self.pc >= self.program.len() {
            return Err(EmuError::ProgramCounterOutOfRange {
                pc: self.pc,
                len: self.program.len(),
            });
        }
        self.state = CpuState::Executing;
        let ins = self.program[self.pc].clone();
        self.execute(&ins);
        self.pc += 1;
        if self.pc >= self.program.len() {
            self.state = CpuState::Idle;
        }
        Ok(())
    }

    /// Reinitializes registers, memory, stack, and counters to defaults and
    /// clears the loaded program. The configured sizes are kept.
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    /// Interprets one validated instruction.
    ///
    /// All arithmetic is 32-bit unsigned with wraparound. Operand shapes the
    /// parser cannot emit are contract breaches and abort; they are never
    /// coerced into user-facing errors.
    pub fn execute(&mut self, ins: &Instruction) {
        log::trace!("execute: {ins}");
        match ins.opcode {
            Opcode::Mov => match ins.operands.as_slice() {
                [dst, src] => {
                    let value = self.operand_value(src);
                    self.write_reg(dst, value);
                }
                _ => unreachable!("mov must have exactly 2 operands after parsing"),
            },
            Opcode::Add => match ins.operands.as_slice() {
                // rd += rs / #imm, and sp += signed #imm: the immediate is
                // sign-extended, so two's-complement wraparound covers the
                // negative stack adjustments.
                [dst, src] => {
                    let sum = self.read_reg(dst).wrapping_add(self.operand_value(src));
                    self.write_reg(dst, sum);
                }
                // rd = rn + #imm.
                [dst, src, imm] => {
                    let sum = self.read_reg(src).wrapping_add(self.operand_value(imm));
                    self.write_reg(dst, sum);
                }
                _ => unreachable!("add must have 2 or 3 operands after parsing"),
            },
        }
    }

    /// Serializable, order-stable view of the observable state.
    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            regs: self
                .regs
                .iter()
                .map(|(name, value)| (name.clone(), *value))
                .collect(),
            memory: self.memory.clone(),
            stack: self.stack.clone(),
            pc: self.pc,
            sp: self.sp,
        }
    }

    /// The current value of a register operand, or the sign-extended value
    /// of an immediate operand.
    fn operand_value(&self, operand: &Operand) -> u32 {
        match operand.kind {
            OperandKind::LowRegister | OperandKind::HighRegister | OperandKind::SpRegister => {
                self.read_reg(operand)
            }
            OperandKind::HexImmediate | OperandKind::DecImmediate => match operand.value() {
                Some(value) => value as u32,
                None => unreachable!("immediate {operand} validated by the parser"),
            },
        }
    }

    fn read_reg(&self, operand: &Operand) -> u32 {
        match operand.register().and_then(|name| self.regs.get(name)) {
            Some(value) => *value,
            None => unreachable!("register operand {operand} validated by the parser"),
        }
    }

    fn write_reg(&mut self, operand: &Operand, value: u32) {
        match operand
            .register()
            .and_then(|name| self.regs.get_mut(name))
        {
            Some(slot) => *slot = value,
            None => unreachable!("register operand {operand} validated by the parser"),
        }
    }
}

/// A plain, order-stable copy of the observable CPU state, for golden-state
/// comparison and the CLI's JSON dump. Registers serialize through a
/// `BTreeMap` so key order never depends on hashing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSnapshot {
    pub regs: BTreeMap<String, u32>,
    pub memory: Vec<u32>,
    pub stack: Vec<u32>,
    pub pc: usize,
    pub sp: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembled(source: &str) -> Vec<Instruction> {
        Assembler.assemble(source).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let cpu = Cpu::default();
        assert_eq!(cpu.regs().len(), 17);
        assert!(cpu.regs().values().all(|v| *v == 0));
        assert_eq!(cpu.memory().len(), 64);
        assert_eq!(cpu.stack().len(), 64);
        assert_eq!(cpu.pc(), 0);
        assert_eq!(cpu.sp(), 0);
        assert_eq!(cpu.state(), CpuState::Idle);
    }

    #[test]
    fn test_configured_sizes() {
        let cpu = Cpu::new(CpuConfig {
            memory_size: 0,
            stack_size: 8,
        });
        assert!(cpu.memory().is_empty());
        assert_eq!(cpu.stack().len(), 8);
    }

    #[test]
    fn test_run_empty_program() {
        let mut cpu = Cpu::default();
        let before = cpu.snapshot();
        cpu.run();
        assert_eq!(cpu.snapshot(), before);
    }

    #[test]
    fn test_mov_and_add_roundtrip() {
        let mut cpu = Cpu::default();
        cpu.load(assembled(".text\nmov r0, #0x10\nadd r0, #5"));
        cpu.run();
        assert_eq!(cpu.regs()["r0"], 21);
    }

    #[test]
    fn test_mov_register_copy() {
        let mut cpu = Cpu::default();
        cpu.load(assembled(".text\nmov r1, #200\nmov r8, r1\nmov r2, r8"));
        cpu.run();
        assert_eq!(cpu.regs()["r8"], 200);
        assert_eq!(cpu.regs()["r2"], 200);
    }

    #[test]
    fn test_add_register_register() {
        let mut cpu = Cpu::default();
        cpu.load(assembled(".text\nmov r1, #40\nmov r2, #2\nadd r1, r2"));
        cpu.run();
        assert_eq!(cpu.regs()["r1"], 42);
        assert_eq!(cpu.regs()["r2"], 2);
    }

    #[test]
    fn test_add_three_operand() {
        let mut cpu = Cpu::default();
        cpu.load(assembled(".text\nmov r2, #30\nadd r1, r2, #7"));
        cpu.run();
        assert_eq!(cpu.regs()["r1"], 37);
        assert_eq!(cpu.regs()["r2"], 30);
    }

    #[test]
    fn test_sp_adjustment_wraps() {
        let mut cpu = Cpu::default();
        cpu.load(assembled(".text\nadd sp, #-1"));
        cpu.run();
        // 32-bit unsigned wraparound.
        assert_eq!(cpu.regs()["sp"], u32::MAX);

        cpu.reset();
        cpu.load(assembled(".text\nadd sp, #127\nadd sp, #-128"));
        cpu.run();
        assert_eq!(cpu.regs()["sp"], u32::MAX);
    }

    #[test]
    fn test_step_and_out_of_range_fault() {
        let mut cpu = Cpu::default();
        cpu.load(assembled(".text\nmov r0, #1\nadd r0, #2"));
        cpu.step().unwrap();
        assert_eq!(cpu.pc(), 1);
        assert_eq!(cpu.state(), CpuState::Executing);
        cpu.step().unwrap();
        assert_eq!(cpu.pc(), 2);
        assert_eq!(cpu.regs()["r0"], 3);
        assert_eq!(cpu.state(), CpuState::Idle);
        assert_eq!(
            cpu.step(),
            Err(EmuError::ProgramCounterOutOfRange { pc: 2, len: 2 })
        );
    }

    #[test]
    fn test_leading_zero_register_spelling_executes() {
        // Non-canonical spellings assemble to canonical names, so the
        // name-keyed register file resolves them.
        let mut cpu = Cpu::default();
        cpu.load(assembled(".text\nmov r01, #5\nadd r001, #2"));
        cpu.run();
        assert_eq!(cpu.regs()["r1"], 7);
    }

    #[test]
    fn test_load_does_not_reset_state() {
        let mut cpu = Cpu::default();
        cpu.load(assembled(".text\nmov r3, #9"));
        cpu.run();
        cpu.load(assembled(".text\nmov r4, #1"));
        assert_eq!(cpu.regs()["r3"], 9);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut cpu = Cpu::default();
        cpu.load(assembled(".text\nmov r0, #5"));
        cpu.run();
        cpu.reset();
        assert_eq!(cpu.snapshot(), Cpu::default().snapshot());
        assert!(cpu.program().is_empty());
    }

    #[test]
    fn test_load_assembly_surface() {
        let mut cpu = Cpu::default();
        cpu.load_assembly(".text\nmov r0, #1").unwrap();
        assert_eq!(cpu.program().len(), 1);

        let diag = cpu.load_assembly(".text\nmov r8, #5").unwrap_err();
        assert_eq!(
            diag.message,
            "only low registers allowed with immediate operand"
        );
    }

    #[test]
    fn test_snapshot_register_order_stable() {
        let cpu = Cpu::default();
        let names: Vec<String> = cpu.snapshot().regs.into_keys().collect();
        let again: Vec<String> = cpu.snapshot().regs.into_keys().collect();
        assert_eq!(names, again);
        assert_eq!(names.len(), 17);
    }
}
