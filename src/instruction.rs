use crate::error::ProcessorError;
use crate::register::{RegisterFile, RegisterRef};
use regex::Regex;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Mov,
    Add,
    Sub,
}

impl Operation {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Operation::Mov => "MOV",
            Operation::Add => "ADD",
            Operation::Sub => "SUB",
        }
    }
}

/// Every operation takes a destination and a source.
pub const OPERANDS: usize = 2;

impl FromStr for Operation {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MOV" => Ok(Operation::Mov),
            "ADD" => Ok(Operation::Add),
            "SUB" => Ok(Operation::Sub),
            _ => Err(ProcessorError::UnknownOperation(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Register(RegisterRef),
    Immediate(u16),
}

impl Operand {
    /// Register names take precedence; anything else must be an immediate.
    pub fn parse(token: &str) -> Result<Self, ProcessorError> {
        match token.parse::<RegisterRef>() {
            Ok(r) => Ok(Operand::Register(r)),
            Err(_) => parse_immediate(token).map(Operand::Immediate),
        }
    }

    fn value(&self, registers: &RegisterFile) -> u16 {
        match self {
            Operand::Register(r) => registers.get(*r),
            Operand::Immediate(v) => *v,
        }
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Operand::Register(r) => write!(f, "{}", r.name().to_ascii_lowercase()),
            Operand::Immediate(v) => write!(f, "{}", v),
        }
    }
}

/// A decoded `OPERATION DEST, SRC` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub operation: Operation,
    pub dest: RegisterRef,
    pub src: Operand,
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} {}, {}",
            self.operation.mnemonic().to_ascii_lowercase(),
            self.dest.name().to_ascii_lowercase(),
            self.src
        )
    }
}

/// Drops everything from the first `;` and trims the rest.
pub fn strip_comment(line: &str) -> &str {
    match line.split_once(';') {
        Some((code, _)) => code.trim(),
        None => line.trim(),
    }
}

pub fn parse_operands(text: &str) -> Vec<String> {
    text.split(',')
        .map(|operand| operand.trim().to_ascii_uppercase())
        .collect()
}

fn immediate_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:(?P<bin>[01]+)[bB]|(?P<dec>[0-9]+))$").expect("immediate pattern compiles")
    })
}

/// Parses `1010b` as binary and anything else as decimal.
pub fn parse_immediate(token: &str) -> Result<u16, ProcessorError> {
    let invalid = || ProcessorError::InvalidValue(token.to_string());
    let caps = immediate_pattern().captures(token).ok_or_else(invalid)?;

    let parsed = if let Some(bin) = caps.name("bin") {
        u16::from_str_radix(bin.as_str(), 2)
    } else if let Some(dec) = caps.name("dec") {
        dec.as_str().parse::<u16>()
    } else {
        return Err(invalid());
    };
    parsed.map_err(|_| invalid())
}

impl Instruction {
    pub fn decode(line: &str) -> Result<Self, ProcessorError> {
        let line = line.trim();
        let (mnemonic, rest) = line
            .split_once(char::is_whitespace)
            .ok_or_else(|| ProcessorError::MalformedInstruction(line.to_string()))?;

        let operation: Operation = mnemonic.parse()?;
        let operands = parse_operands(rest);
        if operands.len() != OPERANDS {
            return Err(ProcessorError::OperandCountError {
                operation: operation.mnemonic(),
                expected: OPERANDS,
                actual: operands.len(),
            });
        }

        let dest = operands[0].parse::<RegisterRef>()?;
        let src = Operand::parse(&operands[1])?;

        Ok(Self {
            operation,
            dest,
            src,
        })
    }

    /// Applies the instruction to `registers`. On error nothing is written.
    pub fn execute(&self, registers: &mut RegisterFile) -> Result<(), ProcessorError> {
        let value = self.src.value(registers);
        let max = self.dest.max_value();

        // SUB rejects an operand equal to the destination maximum.
        let in_range = match self.operation {
            Operation::Sub => (value as u32) < max,
            Operation::Mov | Operation::Add => (value as u32) <= max,
        };
        if !in_range {
            return Err(self.out_of_range(value as u32));
        }

        match self.operation {
            Operation::Mov => registers.set(self.dest, value),
            Operation::Add => {
                let result = registers.get(self.dest) as u32 + value as u32;
                if result > u16::MAX as u32 {
                    return Err(ProcessorError::OverflowError {
                        dest: self.dest.name().to_string(),
                        value,
                        result,
                    });
                }
                if result > max {
                    return Err(self.out_of_range(result));
                }
                registers.set(self.dest, result as u16);
            }
            Operation::Sub => {
                let result = registers.get(self.dest) as i32 - value as i32;
                if result < 0 {
                    return Err(ProcessorError::UnderflowError {
                        dest: self.dest.name().to_string(),
                        value,
                        result,
                    });
                }
                registers.set(self.dest, result as u16);
            }
        }
        Ok(())
    }

    fn out_of_range(&self, value: u32) -> ProcessorError {
        ProcessorError::ValueOutOfRange {
            dest: self.dest.name().to_string(),
            value,
            max: self.dest.max_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::register::{Part, Register};
    use rstest::rstest;

    fn exec(registers: &mut RegisterFile, line: &str) -> Result<(), ProcessorError> {
        Instruction::decode(line)?.execute(registers)
    }

    fn get(registers: &RegisterFile, name: &str) -> u16 {
        registers.get(name.parse().unwrap())
    }

    #[rstest]
    #[case("MOV AX, 5 ; load", "MOV AX, 5")]
    #[case("   ; only a comment", "")]
    #[case("  ADD BX,1  ", "ADD BX,1")]
    #[case("", "")]
    #[case("SUB CX, 2 ; a ; b", "SUB CX, 2")]
    fn strips_comments(#[case] line: &str, #[case] expected: &str) {
        assert_eq!(strip_comment(line), expected);
    }

    #[test]
    fn operands_are_trimmed_and_uppercased() {
        assert_eq!(parse_operands(" ax , bl"), vec!["AX", "BL"]);
        assert_eq!(parse_operands("ax,1010b"), vec!["AX", "1010B"]);
        assert_eq!(parse_operands("ax"), vec!["AX"]);
    }

    #[rstest]
    #[case("0", 0)]
    #[case("65535", 65535)]
    #[case("1010b", 10)]
    #[case("1111111111111111B", 0xFFFF)]
    #[case("007", 7)]
    fn parses_immediates(#[case] token: &str, #[case] expected: u16) {
        assert_eq!(parse_immediate(token).unwrap(), expected);
    }

    #[rstest]
    #[case("65536")]
    #[case("-1")]
    #[case("0FH")]
    #[case("12h")]
    #[case("102B")]
    #[case("B")]
    #[case("")]
    #[case("0x10")]
    #[case("11111111111111111b")]
    fn rejects_bad_immediates(#[case] token: &str) {
        assert_eq!(
            parse_immediate(token).unwrap_err(),
            ProcessorError::InvalidValue(token.to_string())
        );
    }

    #[test]
    fn decodes_instructions() {
        let instruction = Instruction::decode("mov al, bh").unwrap();
        assert_eq!(instruction.operation, Operation::Mov);
        assert_eq!(
            instruction.dest,
            RegisterRef {
                register: Register::AX,
                part: Part::Low
            }
        );
        assert_eq!(
            instruction.src,
            Operand::Register(RegisterRef {
                register: Register::BX,
                part: Part::High
            })
        );
        assert_eq!(instruction.to_string(), "mov al, bh");

        let instruction = Instruction::decode("ADD DX,101b").unwrap();
        assert_eq!(instruction.src, Operand::Immediate(5));
        assert_eq!(instruction.to_string(), "add dx, 5");
    }

    #[rstest]
    #[case("", ErrorKind::MalformedInstruction)]
    #[case("MOV", ErrorKind::MalformedInstruction)]
    #[case("MOV,AX,1", ErrorKind::MalformedInstruction)]
    #[case("JMP AX, 1", ErrorKind::UnknownOperation)]
    #[case("MOV AX", ErrorKind::OperandCountError)]
    #[case("MOV AX, 1, 2", ErrorKind::OperandCountError)]
    #[case("MOV EX, 1", ErrorKind::UnknownRegister)]
    #[case("MOV 5, AX", ErrorKind::UnknownRegister)]
    #[case("MOV AX, EX", ErrorKind::InvalidValue)]
    #[case("MOV AX, 1Fh", ErrorKind::InvalidValue)]
    #[case("MOV AX,", ErrorKind::InvalidValue)]
    fn decode_failures(#[case] line: &str, #[case] kind: ErrorKind) {
        assert_eq!(Instruction::decode(line).unwrap_err().kind(), kind);
    }

    #[test]
    fn operand_count_error_reports_both_counts() {
        assert_eq!(
            Instruction::decode("sub dx, 1, 2").unwrap_err(),
            ProcessorError::OperandCountError {
                operation: "SUB",
                expected: OPERANDS,
                actual: 3,
            }
        );
    }

    #[test]
    fn mov_add_sub() {
        let mut regs = RegisterFile::new();
        exec(&mut regs, "MOV AX, 5").unwrap();
        exec(&mut regs, "ADD AX, 3").unwrap();
        assert_eq!(get(&regs, "AX"), 8);
        exec(&mut regs, "MOV BX, AX").unwrap();
        exec(&mut regs, "SUB BX, 8").unwrap();
        assert_eq!(get(&regs, "BX"), 0);
        exec(&mut regs, "MOV CH, 1b").unwrap();
        exec(&mut regs, "ADD CL, CH").unwrap();
        assert_eq!(get(&regs, "CX"), 0x0101);
    }

    #[test]
    fn byte_source_is_checked_against_destination_width() {
        let mut regs = RegisterFile::new();
        exec(&mut regs, "MOV BX, 300").unwrap();
        let err = exec(&mut regs, "MOV AL, BX").unwrap_err();
        assert_eq!(
            err,
            ProcessorError::ValueOutOfRange {
                dest: "AL".to_string(),
                value: 300,
                max: 255
            }
        );
        exec(&mut regs, "MOV AX, BL").unwrap();
        assert_eq!(get(&regs, "AX"), 300 & 0xFF);
    }

    #[test]
    fn add_boundaries() {
        let mut regs = RegisterFile::new();
        exec(&mut regs, "MOV AX, 65535").unwrap();
        assert_eq!(
            exec(&mut regs, "ADD AX, 1").unwrap_err().kind(),
            ErrorKind::OverflowError
        );
        assert_eq!(get(&regs, "AX"), 65535);

        exec(&mut regs, "MOV AX, 0").unwrap();
        exec(&mut regs, "MOV AL, 255").unwrap();
        assert_eq!(
            exec(&mut regs, "ADD AL, 1").unwrap_err().kind(),
            ErrorKind::ValueOutOfRange
        );
        assert_eq!(get(&regs, "AX"), 255);
        exec(&mut regs, "ADD AH, 255").unwrap();
        assert_eq!(get(&regs, "AX"), 0xFFFF);
    }

    #[test]
    fn sub_excludes_destination_maximum() {
        let mut regs = RegisterFile::new();
        exec(&mut regs, "MOV AL, 255").unwrap();
        assert_eq!(
            exec(&mut regs, "SUB AL, 255").unwrap_err().kind(),
            ErrorKind::ValueOutOfRange
        );
        exec(&mut regs, "SUB AL, 254").unwrap();
        assert_eq!(get(&regs, "AL"), 1);

        exec(&mut regs, "MOV BX, 65535").unwrap();
        assert_eq!(
            exec(&mut regs, "SUB BX, 65535").unwrap_err().kind(),
            ErrorKind::ValueOutOfRange
        );
    }

    #[test]
    fn sub_underflow_leaves_destination_untouched() {
        let mut regs = RegisterFile::new();
        exec(&mut regs, "MOV BX, 10").unwrap();
        let err = exec(&mut regs, "SUB BX, 20").unwrap_err();
        assert_eq!(
            err,
            ProcessorError::UnderflowError {
                dest: "BX".to_string(),
                value: 20,
                result: -10
            }
        );
        assert_eq!(get(&regs, "BX"), 10);
    }
}
