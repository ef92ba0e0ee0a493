//! Operand classification.
//!
//! Maps one trimmed token to an [`OperandKind`] or a typed error. No
//! opcode-specific range checks happen here; legal immediate windows differ
//! per opcode and per operand position, so those belong to the parser.

use nom::{
    bytes::complete::tag,
    character::complete::{digit1, hex_digit1},
    combinator::{all_consuming, map_res, opt, recognize, value},
    sequence::{pair, preceded},
    IResult,
};

use crate::plat::{Operand, OperandKind};

use super::AsmError;

/// `r` followed by a decimal register index.
fn register_index(inp: &str) -> IResult<&str, u32> {
    preceded(tag("r"), map_res(digit1, str::parse))(inp)
}

fn sp_register(inp: &str) -> IResult<&str, OperandKind> {
    value(OperandKind::SpRegister, tag("sp"))(inp)
}

fn hex_immediate(inp: &str) -> IResult<&str, OperandKind> {
    value(
        OperandKind::HexImmediate,
        preceded(tag("#0x"), hex_digit1),
    )(inp)
}

fn dec_immediate(inp: &str) -> IResult<&str, OperandKind> {
    value(
        OperandKind::DecImmediate,
        preceded(tag("#"), recognize(pair(opt(tag("-")), digit1))),
    )(inp)
}

/// Classifies a single trimmed operand token.
///
/// Rules, in priority order: register (`r` + index, 0-7 low, 8-15 high,
/// anything else invalid), `sp`, hexadecimal immediate (`#0x` + hex digits),
/// decimal immediate (`#` + optionally negative digits). Trailing garbage
/// after an otherwise valid token is rejected.
///
/// Register names are stored in canonical form, rebuilt from the parsed
/// index (`r01` stores as `r1`), so the executor's name-keyed register file
/// resolves every spelling the classifier accepts.
pub fn classify_operand(token: &str) -> Result<Operand, AsmError> {
    if let Ok((_, index)) = all_consuming(register_index)(token) {
        return match index {
            0..=7 => Ok(Operand::new(
                OperandKind::LowRegister,
                format!("r{index}"),
            )),
            8..=15 => Ok(Operand::new(
                OperandKind::HighRegister,
                format!("r{index}"),
            )),
            _ => Err(AsmError::InvalidRegisterIndex(index)),
        };
    }
    if let Ok((_, kind)) = all_consuming(sp_register)(token) {
        return Ok(Operand::new(kind, "sp"));
    }
    if let Ok((_, kind)) = all_consuming(hex_immediate)(token) {
        return Ok(Operand::new(kind, token));
    }
    if token.starts_with("#0x") {
        return Err(AsmError::InvalidHexImmediate(token.to_owned()));
    }
    if let Ok((_, kind)) = all_consuming(dec_immediate)(token) {
        return Ok(Operand::new(kind, token));
    }
    if token.starts_with('#') {
        return Err(AsmError::InvalidImmediate(token.to_owned()));
    }
    Err(AsmError::UnrecognizedOperand(token.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of(token: &str) -> Result<OperandKind, AsmError> {
        classify_operand(token).map(|op| op.kind)
    }

    #[test]
    fn test_classify_registers() {
        for index in 0..=7 {
            assert_eq!(
                kind_of(&format!("r{index}")),
                Ok(OperandKind::LowRegister)
            );
        }
        for index in 8..=15 {
            assert_eq!(
                kind_of(&format!("r{index}")),
                Ok(OperandKind::HighRegister)
            );
        }
        assert_eq!(kind_of("r16"), Err(AsmError::InvalidRegisterIndex(16)));
        assert_eq!(kind_of("r100"), Err(AsmError::InvalidRegisterIndex(100)));
    }

    #[test]
    fn test_register_names_canonicalized() {
        // Leading zeros are accepted but the stored name is rebuilt from
        // the parsed index, matching the register file's keys.
        let op = classify_operand("r01").unwrap();
        assert_eq!((op.kind, op.text.as_str()), (OperandKind::LowRegister, "r1"));
        let op = classify_operand("r008").unwrap();
        assert_eq!(
            (op.kind, op.text.as_str()),
            (OperandKind::HighRegister, "r8")
        );
        assert_eq!(classify_operand("r3").unwrap().text, "r3");
    }

    #[test]
    fn test_classify_register_garbage() {
        // Non-numeric or suffixed register indices are not registers at all.
        assert!(matches!(
            classify_operand("r3x"),
            Err(AsmError::UnrecognizedOperand(_))
        ));
        assert!(matches!(
            classify_operand("r-1"),
            Err(AsmError::UnrecognizedOperand(_))
        ));
        assert!(matches!(
            classify_operand("rax"),
            Err(AsmError::UnrecognizedOperand(_))
        ));
    }

    #[test]
    fn test_classify_sp() {
        assert_eq!(kind_of("sp"), Ok(OperandKind::SpRegister));
        assert!(matches!(
            classify_operand("spx"),
            Err(AsmError::UnrecognizedOperand(_))
        ));
    }

    #[test]
    fn test_classify_immediates() {
        assert_eq!(kind_of("#0"), Ok(OperandKind::DecImmediate));
        assert_eq!(kind_of("#255"), Ok(OperandKind::DecImmediate));
        assert_eq!(kind_of("#-128"), Ok(OperandKind::DecImmediate));
        assert_eq!(kind_of("#0x0"), Ok(OperandKind::HexImmediate));
        assert_eq!(kind_of("#0xff"), Ok(OperandKind::HexImmediate));
        assert_eq!(kind_of("#0xFF"), Ok(OperandKind::HexImmediate));
    }

    #[test]
    fn test_classify_bad_immediates() {
        assert_eq!(
            kind_of("#0xzz"),
            Err(AsmError::InvalidHexImmediate("#0xzz".to_owned()))
        );
        assert_eq!(
            kind_of("#0x"),
            Err(AsmError::InvalidHexImmediate("#0x".to_owned()))
        );
        assert_eq!(
            kind_of("#"),
            Err(AsmError::InvalidImmediate("#".to_owned()))
        );
        assert_eq!(
            kind_of("#abc"),
            Err(AsmError::InvalidImmediate("#abc".to_owned()))
        );
        assert_eq!(
            kind_of("#--3"),
            Err(AsmError::InvalidImmediate("#--3".to_owned()))
        );
        assert_eq!(
            kind_of("#12x"),
            Err(AsmError::InvalidImmediate("#12x".to_owned()))
        );
    }

    #[test]
    fn test_classify_unrecognized() {
        assert!(matches!(
            classify_operand("foo"),
            Err(AsmError::UnrecognizedOperand(_))
        ));
        assert!(matches!(
            classify_operand(""),
            Err(AsmError::UnrecognizedOperand(_))
        ));
    }
}
