use thiserror::Error;

/// Errors raised while decoding or executing an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessorError {
    /// The line has no separator between the mnemonic and its operands.
    #[error("malformed instruction: '{0}'")]
    MalformedInstruction(String),
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
    #[error("{operation} expects {expected} operands, got {actual}")]
    OperandCountError {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("unknown register: {0}")]
    UnknownRegister(String),
    /// Immediate token is not a non-negative 16-bit integer in its base.
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("value {value} out of range for {dest} (0..={max})")]
    ValueOutOfRange { dest: String, value: u32, max: u32 },
    #[error("overflow: {dest} + {value} = {result}")]
    OverflowError { dest: String, value: u16, result: u32 },
    #[error("underflow: {dest} - {value} = {result}")]
    UnderflowError { dest: String, value: u16, result: i32 },
}

/// Category of a [`ProcessorError`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedInstruction,
    UnknownOperation,
    OperandCountError,
    UnknownRegister,
    InvalidValue,
    ValueOutOfRange,
    OverflowError,
    UnderflowError,
}

impl ProcessorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcessorError::MalformedInstruction(_) => ErrorKind::MalformedInstruction,
            ProcessorError::UnknownOperation(_) => ErrorKind::UnknownOperation,
            ProcessorError::OperandCountError { .. } => ErrorKind::OperandCountError,
            ProcessorError::UnknownRegister(_) => ErrorKind::UnknownRegister,
            ProcessorError::InvalidValue(_) => ErrorKind::InvalidValue,
            ProcessorError::ValueOutOfRange { .. } => ErrorKind::ValueOutOfRange,
            ProcessorError::OverflowError { .. } => ErrorKind::OverflowError,
            ProcessorError::UnderflowError { .. } => ErrorKind::UnderflowError,
        }
    }
}
