use crate::error::ProcessorError;
use crate::{REGISTERS_W0_HIGH, REGISTERS_W0_LOW, REGISTERS_W1};
use std::fmt::Display;
use std::str::FromStr;

/// The four general purpose 16-bit registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Register {
    AX,
    BX,
    CX,
    DX,
}

impl Register {
    pub const ALL: [Register; 4] = [Register::AX, Register::BX, Register::CX, Register::DX];

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        REGISTERS_W1[self.index()]
    }
}

impl Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which slice of the parent register an operand addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    Full,
    High, // bits 8-15
    Low,  // bits 0-7
}

/// A resolved register operand, e.g. `AH` is `AX` with [`Part::High`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterRef {
    pub register: Register,
    pub part: Part,
}

impl RegisterRef {
    pub fn full(register: Register) -> Self {
        Self {
            register,
            part: Part::Full,
        }
    }

    /// Width in bits of the addressed slice.
    pub fn width(&self) -> u32 {
        match self.part {
            Part::Full => 16,
            Part::High | Part::Low => 8,
        }
    }

    /// Largest value the addressed slice can hold.
    pub fn max_value(&self) -> u32 {
        (1 << self.width()) - 1
    }

    pub fn name(&self) -> &'static str {
        let i = self.register.index();
        match self.part {
            Part::Full => REGISTERS_W1[i],
            Part::High => REGISTERS_W0_HIGH[i],
            Part::Low => REGISTERS_W0_LOW[i],
        }
    }
}

impl Display for RegisterRef {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for RegisterRef {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_uppercase();
        let lookup = |table: &[&str; 4]| table.iter().position(|&r| r == name);

        let (index, part) = if let Some(i) = lookup(&REGISTERS_W1) {
            (i, Part::Full)
        } else if let Some(i) = lookup(&REGISTERS_W0_HIGH) {
            (i, Part::High)
        } else if let Some(i) = lookup(&REGISTERS_W0_LOW) {
            (i, Part::Low)
        } else {
            return Err(ProcessorError::UnknownRegister(s.to_string()));
        };

        Ok(Self {
            register: Register::ALL[index],
            part,
        })
    }
}

/// Register file of four 16-bit cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterFile {
    regs: [u16; 4],
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, r: RegisterRef) -> u16 {
        let value = self.regs[r.register.index()];
        match r.part {
            Part::Full => value,
            Part::High => value >> 8,
            Part::Low => value & 0xFF,
        }
    }

    /// Writes `value` into the addressed slice. Sub-register writes keep
    /// only the low byte of `value` and leave the other byte untouched.
    pub fn set(&mut self, r: RegisterRef, value: u16) {
        let slot = &mut self.regs[r.register.index()];
        *slot = match r.part {
            Part::Full => value,
            Part::High => (*slot & 0x00FF) | ((value & 0xFF) << 8),
            Part::Low => (*slot & 0xFF00) | (value & 0xFF),
        };
    }

    pub fn reset(&mut self) {
        self.regs = [0; 4];
    }

    pub fn iter(&self) -> impl Iterator<Item = (Register, u16)> + '_ {
        Register::ALL.iter().map(|&r| (r, self.regs[r.index()]))
    }
}
