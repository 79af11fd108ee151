//! Text front-end: register formatting and the interactive debug loop.

use crate::processor::Processor;
use crate::register::Register;
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

/// Renders a register as `AX: 00010010 00110100 (0x1234)`.
pub fn format_register(register: Register, value: u16) -> String {
    let bits = format!("{:016b}", value);
    format!("{}: {} {} (0x{:04X})", register, &bits[..8], &bits[8..], value)
}

pub fn write_registers<W: Write>(out: &mut W, processor: &Processor) -> io::Result<()> {
    for (register, value) in processor.registers() {
        writeln!(out, "{}", format_register(register, value))?;
    }
    Ok(())
}

/// Splits program text into lines. A final line terminator does not start
/// another (empty) line, and `\r\n` endings are accepted.
pub fn split_program(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let text = text.strip_suffix('\n').unwrap_or(text);
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

/// Program text as it is written to disk: comments kept, surrounding
/// whitespace and blank lines trimmed.
pub fn saved_source(text: &str) -> &str {
    text.trim()
}

/// One `exec --trace` line, e.g. `mov ax, 5 ; ax:0x0000->0x0005 ip:0x0->0x1`.
/// Only registers whose value changed are listed.
pub fn format_trace(
    text: &str,
    before: &BTreeMap<Register, u16>,
    after: &BTreeMap<Register, u16>,
    ip_before: usize,
    ip_after: usize,
) -> String {
    let mut line = format!("{} ;", text);
    for (register, old) in before {
        let Some(&new) = after.get(register) else {
            continue;
        };
        if *old != new {
            let name = register.name().to_ascii_lowercase();
            line.push_str(&format!(" {}:0x{:04x}->0x{:04x}", name, old, new));
        }
    }
    line.push_str(&format!(" ip:0x{:x}->0x{:x}", ip_before, ip_after));
    line
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Step,
    Run,
    Clear,
    Registers,
    List,
    Help,
    Quit,
}

fn parse_command(input: &str) -> Option<Command> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" | "s" | "step" => Some(Command::Step),
        "r" | "run" => Some(Command::Run),
        "c" | "clear" => Some(Command::Clear),
        "p" | "regs" => Some(Command::Registers),
        "l" | "list" => Some(Command::List),
        "h" | "help" => Some(Command::Help),
        "q" | "quit" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

const HELP: &str = "commands: s(tep), r(un), c(lear), p (regs), l(ist), h(elp), q(uit)";

/// Drives `processor` from commands read on `input` until `quit` or EOF.
pub fn run_session<R: BufRead, W: Write>(
    processor: &mut Processor,
    mut input: R,
    out: &mut W,
    interactive: bool,
) -> io::Result<()> {
    writeln!(out, "{}", HELP)?;
    write_registers(out, processor)?;

    loop {
        if interactive {
            write!(out, "> ")?;
            out.flush()?;
        }

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let Some(command) = parse_command(&line) else {
            writeln!(out, "unknown command: {}", line.trim())?;
            continue;
        };

        match command {
            Command::Step => match processor.step() {
                Ok(Some(n)) => {
                    writeln!(out, "{:>4}: {}", n, processor.program()[n - 1])?;
                    write_registers(out, processor)?;
                    writeln!(out, "Step: {}", n)?;
                }
                Ok(None) => writeln!(out, "Step: Done!")?,
                Err(e) => writeln!(out, "line {}: {}", processor.program_counter() + 1, e)?,
            },
            Command::Run => match processor.run() {
                Ok(()) => {
                    write_registers(out, processor)?;
                    writeln!(out, "Continuous mode: Done!")?;
                }
                Err(e) => writeln!(out, "line {}: {}", processor.program_counter() + 1, e)?,
            },
            Command::Clear => {
                processor.reset();
                write_registers(out, processor)?;
            }
            Command::Registers => write_registers(out, processor)?,
            Command::List => {
                for (i, text) in processor.program().iter().enumerate() {
                    let marker = if i == processor.program_counter() { '>' } else { ' ' };
                    writeln!(out, "{} {:>4}: {}", marker, i + 1, text)?;
                }
            }
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Quit => break,
        }
    }
    Ok(())
}
