use std::cell::RefCell;

use anyhow::Result;
use easy_repl::{command, repl::LoopStatus, CommandStatus, Repl};

use super::cpu::Cpu;

/// An interactive single-step REPL over a loaded CPU.
pub struct Debugger<'b> {
    pub cpu: RefCell<&'b mut Cpu>,
}

impl<'b> Debugger<'b> {
    pub fn new(cpu: &'b mut Cpu) -> Self {
        Self {
            cpu: RefCell::new(cpu),
        }
    }

    pub fn repl(&self) -> Result<()> {
        let mut repl = Repl::builder()
            .description("thumbsim debug REPL")
            .add(
                "s",
                command! {
                    "Step one instruction",
                    () => || {
                        let mut cpu = self.cpu.borrow_mut();
                        match cpu.step() {
                            Ok(()) => {}
                            Err(e) => eprintln!("{e}"),
                        }
                        Ok(CommandStatus::Done)
                    }
                },
            )
            .add(
                "c",
                command! {
                    "Step through the remaining instructions",
                    () => || {
                        let mut cpu = self.cpu.borrow_mut();
                        while cpu.pc() < cpu.program().len() {
                            cpu.step()?;
                        }
                        Ok(CommandStatus::Done)
                    }
                },
            )
            .add(
                "pr",
                command! {
                    "Print the value of all registers",
                    () => || {
                        let cpu = self.cpu.borrow();
                        for (name, value) in cpu.snapshot().regs {
                            eprintln!("{name}={value:08X}");
                        }
                        Ok(CommandStatus::Done)
                    }
                },
            )
            .add(
                "peek",
                command! {
                    "Peek a memory cell",
                    (addr: usize) => |addr: usize| {
                        let cpu = self.cpu.borrow();
                        match cpu.memory().get(addr) {
                            Some(value) => eprintln!("mem[{addr}]={value:08X}"),
                            None => eprintln!("mem[{addr}] is out of range"),
                        }
                        Ok(CommandStatus::Done)
                    }
                },
            )
            .add(
                "stack",
                command! {
                    "Peek a stack cell",
                    (addr: usize) => |addr: usize| {
                        let cpu = self.cpu.borrow();
                        match cpu.stack().get(addr) {
                            Some(value) => eprintln!("stack[{addr}]={value:08X}"),
                            None => eprintln!("stack[{addr}] is out of range"),
                        }
                        Ok(CommandStatus::Done)
                    }
                },
            )
            .add(
                "reset",
                command! {
                    "Reset the CPU, discarding the loaded program",
                    () => || {
                        self.cpu.borrow_mut().reset();
                        Ok(CommandStatus::Done)
                    }
                },
            )
            .add(
                "q",
                command! {
                    "Quit",
                    () => || {
                        Ok(CommandStatus::Quit)
                    }
                },
            )
            .build()?;

        eprintln!("thumbsim debug REPL");
        'repl: loop {
            eprintln!();
            {
                let cpu = self.cpu.borrow();
                match cpu.program().get(cpu.pc()) {
                    Some(ins) => eprintln!("[pc={}] --> {}", cpu.pc(), ins),
                    None => eprintln!("[pc={}] end of program", cpu.pc()),
                }
            }

            let status = repl.next()?;
            if let LoopStatus::Break = status {
                break 'repl;
            }
        }
        Ok(())
    }
}
