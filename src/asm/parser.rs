//! Per-line instruction parsing.
//!
//! Consumes one comment-stripped, non-empty, trimmed line and either
//! produces a validated [`Instruction`] or reports the first violated
//! constraint. Checks run left to right over the operands.
//!
//! The kind/range rules here mirror real Thumb encoding constraints
//! (immediates pack into fixed-width fields, and only the low register bank
//! pairs with an immediate encoding), so the parser acts as a partial
//! encoder: anything it cannot encode is rejected up front and the executor
//! never re-validates.

use crate::plat::{Instruction, Opcode, Operand, OperandKind};

use super::{lexer::classify_operand, AsmError};

const MOV_IMM_MIN: i64 = 0;
const MOV_IMM_MAX: i64 = 255;
const ADD_IMM_MIN: i64 = 0;
const ADD_IMM_MAX: i64 = 255;
const ADD_SP_IMM_MIN: i64 = -128;
const ADD_SP_IMM_MAX: i64 = 127;
const ADD3_IMM_MIN: i64 = 0;
const ADD3_IMM_MAX: i64 = 7;

/// Parses one line into a validated instruction.
pub fn parse_line(line: &str) -> Result<Instruction, AsmError> {
    let (mnemonic, rest) = match line.split_once(char::is_whitespace) {
        Some((mnemonic, rest)) => (mnemonic, rest.trim()),
        None => (line, ""),
    };
    let opcode = Opcode::from_mnemonic(mnemonic)
        .ok_or_else(|| AsmError::UnknownMnemonic(mnemonic.to_owned()))?;

    let operands: Vec<&str> = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(',').map(str::trim).collect()
    };

    match opcode {
        Opcode::Mov => parse_mov(&operands),
        Opcode::Add => parse_add(&operands),
    }
}

/// Range-checks a classified immediate operand for one opcode position.
fn check_immediate(
    position: usize,
    operand: &Operand,
    min: i64,
    max: i64,
) -> Result<(), AsmError> {
    // An immediate whose magnitude exceeds an i64 is out of every legal
    // window; saturate it so the diagnostic still names the bound.
    let got = operand.value().unwrap_or(if operand.text.starts_with("#-") {
        i64::MIN
    } else {
        i64::MAX
    });
    if (min..=max).contains(&got) {
        Ok(())
    } else {
        Err(AsmError::ImmediateOutOfRange {
            position,
            min,
            max,
            got,
        })
    }
}

/// `MOV rd, rs` (any banks) or `MOV rd, #imm` (rd low, imm in 0..=255).
fn parse_mov(operands: &[&str]) -> Result<Instruction, AsmError> {
    if operands.len() != 2 {
        return Err(AsmError::OperandCount {
            opcode: "mov",
            expected: "2",
            got: operands.len(),
        });
    }

    let dst = classify_operand(operands[0])?;
    match dst.kind {
        OperandKind::LowRegister | OperandKind::HighRegister => {}
        OperandKind::SpRegister => return Err(AsmError::SpNotAllowed { position: 1 }),
        _ => {
            return Err(AsmError::ExpectedRegister {
                position: 1,
                got: dst.text,
            })
        }
    }

    let src = classify_operand(operands[1])?;
    if src.kind == OperandKind::SpRegister {
        return Err(AsmError::SpNotAllowed { position: 2 });
    }
    if src.kind.is_immediate() {
        if dst.kind == OperandKind::HighRegister {
            return Err(AsmError::HighRegisterWithImmediate);
        }
        check_immediate(2, &src, MOV_IMM_MIN, MOV_IMM_MAX)?;
    }

    Ok(Instruction {
        opcode: Opcode::Mov,
        operands: vec![dst, src],
    })
}

/// `ADD rd, rs` / `ADD rd, #imm` / `ADD sp, #imm` / `ADD rd, rn, #imm`.
fn parse_add(operands: &[&str]) -> Result<Instruction, AsmError> {
    match operands.len() {
        2 => parse_add2(operands),
        3 => parse_add3(operands),
        got => Err(AsmError::OperandCount {
            opcode: "add",
            expected: "2 or 3",
            got,
        }),
    }
}

fn parse_add2(operands: &[&str]) -> Result<Instruction, AsmError> {
    let dst = classify_operand(operands[0])?;
    if !dst.kind.is_register() {
        return Err(AsmError::ExpectedRegister {
            position: 1,
            got: dst.text,
        });
    }

    let src = classify_operand(operands[1])?;
    if dst.kind == OperandKind::SpRegister {
        // Stack adjustment takes a signed 8-bit immediate only.
        if !src.kind.is_immediate() {
            return Err(AsmError::ExpectedImmediate {
                position: 2,
                got: src.text,
            });
        }
        check_immediate(2, &src, ADD_SP_IMM_MIN, ADD_SP_IMM_MAX)?;
    } else if src.kind.is_immediate() {
        if dst.kind == OperandKind::HighRegister {
            return Err(AsmError::HighRegisterWithImmediate);
        }
        check_immediate(2, &src, ADD_IMM_MIN, ADD_IMM_MAX)?;
    } else if src.kind == OperandKind::SpRegister {
        return Err(AsmError::SpNotAllowed { position: 2 });
    }

    Ok(Instruction {
        opcode: Opcode::Add,
        operands: vec![dst, src],
    })
}

fn parse_add3(operands: &[&str]) -> Result<Instruction, AsmError> {
    let dst = classify_operand(operands[0])?;
    if !dst.kind.is_register() {
        return Err(AsmError::ExpectedRegister {
            position: 1,
            got: dst.text,
        });
    }
    // The three-operand form always carries an immediate, so neither of the
    // register positions may use the high bank.
    if dst.kind == OperandKind::HighRegister {
        return Err(AsmError::HighRegisterWithImmediate);
    }

    let src = classify_operand(operands[1])?;
    if !src.kind.is_register() {
        return Err(AsmError::ExpectedRegister {
            position: 2,
            got: src.text,
        });
    }
    if src.kind == OperandKind::HighRegister {
        return Err(AsmError::HighRegisterWithImmediate);
    }

    let imm = classify_operand(operands[2])?;
    if !imm.kind.is_immediate() {
        return Err(AsmError::ExpectedImmediate {
            position: 3,
            got: imm.text,
        });
    }
    check_immediate(3, &imm, ADD3_IMM_MIN, ADD3_IMM_MAX)?;

    Ok(Instruction {
        opcode: Opcode::Add,
        operands: vec![dst, src, imm],
    })
}
