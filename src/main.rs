use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::{eyre, Result, WrapErr};
use log::{info, LevelFilter};
use microsim::instruction::Instruction;
use microsim::processor::Processor;
use microsim::session::{
    format_trace, run_session, saved_source, split_program, write_registers,
};
use simple_logger::SimpleLogger;
use std::fs;
use std::io::{self, IsTerminal, Write};

#[derive(Parser, Debug)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every line of a program in canonical form
    Decode {
        #[arg(short = 'f')]
        file: String,
    },
    /// Run a program to completion and print the final registers
    Exec {
        #[arg(short = 'f')]
        file: String,
        /// Print each executed instruction with its register change
        #[arg(short, long)]
        trace: bool,
    },
    /// Step through a program interactively
    Debug {
        #[arg(short = 'f')]
        file: String,
    },
    /// Write a program back out with surrounding blank lines trimmed
    Save {
        #[arg(short = 'f')]
        file: String,
        #[arg(short = 'o')]
        output: String,
    },
}

fn read_source(file: &str) -> Result<String> {
    fs::read_to_string(file).wrap_err_with(|| format!("failed to read {}", file))
}

fn read_program(file: &str) -> Result<Vec<String>> {
    Ok(split_program(&read_source(file)?))
}

fn exec(processor: &mut Processor, trace: bool) -> Result<()> {
    if !trace {
        processor.run()?;
        return Ok(());
    }

    loop {
        let Some(line) = processor.current_instruction().map(str::to_string) else {
            return Ok(());
        };
        let ip = processor.program_counter();
        let before = processor.registers();
        processor.step()?;
        let after = processor.registers();

        let text = match Instruction::decode(&line) {
            Ok(instruction) => instruction.to_string(),
            Err(_) => line,
        };
        let ip_after = processor.program_counter();
        println!("{}", format_trace(&text, &before, &after, ip, ip_after));
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    SimpleLogger::new().with_level(level).init()?;

    let mut processor = Processor::new();

    match args.command {
        Commands::Decode { file } => {
            for line in read_program(&file)? {
                let code = microsim::instruction::strip_comment(&line);
                if code.is_empty() {
                    println!();
                    continue;
                }
                match Instruction::decode(code) {
                    Ok(instruction) => println!("{}", instruction),
                    Err(e) => println!("; error: {}", e),
                }
            }
        }
        Commands::Exec { file, trace } => {
            processor.load_program(read_program(&file)?);
            info!("executing {}", file);

            let result = exec(&mut processor, trace);
            println!("Final registers:");
            write_registers(&mut io::stdout(), &processor)?;
            println!("ip: {}", processor.program_counter());

            if let Err(e) = result {
                return Err(eyre!("line {}: {}", processor.program_counter() + 1, e));
            }
        }
        Commands::Debug { file } => {
            processor.load_program(read_program(&file)?);
            let stdin = io::stdin();
            let interactive = stdin.is_terminal();
            run_session(&mut processor, stdin.lock(), &mut io::stdout(), interactive)?;
        }
        Commands::Save { file, output } => {
            let source = read_source(&file)?;
            let text = saved_source(&source);
            let mut out = fs::File::create(&output)
                .wrap_err_with(|| format!("failed to create {}", output))?;
            out.write_all(text.as_bytes())?;
            info!("saved {} lines to {}", split_program(text).len(), output);
        }
    }
    Ok(())
}
