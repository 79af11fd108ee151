//! Program store, program counter and execution control.
//!
//! A [`Processor`] holds a loaded program as normalized text lines and
//! decodes each line only when it is executed, so syntax errors surface
//! at the instruction that contains them.

use crate::error::ProcessorError;
use crate::instruction::{strip_comment, Instruction};
use crate::register::{Register, RegisterFile, RegisterRef};
use log::{debug, trace};
use std::collections::BTreeMap;

/// Where the program counter sits relative to the loaded program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Running,
    Done,
}

#[derive(Debug, Clone, Default)]
pub struct Processor {
    registers: RegisterFile,
    program: Vec<String>,
    pc: usize,
}

impl Processor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the program and rewinds the program counter. Registers keep
    /// their values.
    pub fn load_program<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.program = lines
            .into_iter()
            .map(|line| strip_comment(line.as_ref()).to_string())
            .collect();
        self.pc = 0;
        debug!("loaded program with {} lines", self.program.len());
    }

    /// Executes the instruction at the program counter.
    ///
    /// Returns the new program counter, i.e. the 1-based number of the line
    /// just executed, or `None` when the program has already finished. On
    /// error the program counter stays on the failing line.
    pub fn step(&mut self) -> Result<Option<usize>, ProcessorError> {
        let Some(line) = self.program.get(self.pc) else {
            return Ok(None);
        };

        let result = Instruction::decode(line).and_then(|i| {
            i.execute(&mut self.registers)?;
            Ok(i)
        });
        match result {
            Ok(instruction) => {
                trace!("{:>4}: {}", self.pc, instruction);
                self.pc += 1;
                Ok(Some(self.pc))
            }
            Err(e) => {
                debug!("line {} '{}' failed: {}", self.pc + 1, line, e);
                Err(e)
            }
        }
    }

    /// Runs the whole program from the first line. Effects of lines before a
    /// failing one are kept.
    pub fn run(&mut self) -> Result<(), ProcessorError> {
        self.pc = 0;
        while self.step()?.is_some() {}
        debug!("program finished after {} instructions", self.pc);
        Ok(())
    }

    /// Rewinds to the first line and zeroes all registers. The program is kept.
    pub fn reset(&mut self) {
        self.pc = 0;
        self.registers.reset();
        debug!("processor reset");
    }

    pub fn program_counter(&self) -> usize {
        self.pc
    }

    pub fn state(&self) -> State {
        if self.program.is_empty() || self.pc == 0 {
            State::Idle
        } else if self.pc >= self.program.len() {
            State::Done
        } else {
            State::Running
        }
    }

    pub fn program(&self) -> &[String] {
        &self.program
    }

    /// The normalized line the next `step` will execute.
    pub fn current_instruction(&self) -> Option<&str> {
        self.program.get(self.pc).map(String::as_str)
    }

    pub fn registers(&self) -> BTreeMap<Register, u16> {
        self.registers.iter().collect()
    }

    /// Reads a register or sub-register by name, e.g. `"AX"` or `"al"`.
    pub fn register(&self, name: &str) -> Result<u16, ProcessorError> {
        let r: RegisterRef = name.parse()?;
        Ok(self.registers.get(r))
    }
}
