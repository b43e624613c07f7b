//! LC-3 VM - CLI Entry Point
//!
//! `lc3-vm <image>` loads a raw binary image at 0x3000 and runs it until the
//! program halts. Program I/O goes to stdin/stdout; diagnostics and logs go
//! to stderr.

use clap::Parser;
use lc3::cpu::StdConsole;
use lc3::{load_image, ByteOrder, Cpu, ORIGIN};
use log::{info, warn, LevelFilter};
use simple_logger::SimpleLogger;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lc3-vm")]
#[command(version)]
#[command(about = "Run a binary image on a 16-bit LC-3 style virtual machine")]
struct Cli {
    /// Path to the binary image to execute
    image: PathBuf,
    /// Load and start offset, added to 0x3000 (decimal or 0x-prefixed hex)
    #[arg(long, default_value_t = 0, value_parser = parse_word)]
    offset: u16,
    /// Byte order of the words in the image file
    #[arg(long, default_value_t = ByteOrder::Little)]
    byte_order: ByteOrder,
    /// Stop after this many instructions even if the program has not halted
    #[arg(long)]
    max_cycles: Option<u64>,
    /// Log every executed instruction to stderr
    #[arg(short, long)]
    trace: bool,
    /// Print the final register file as JSON to stderr
    #[arg(long)]
    dump_registers: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.trace { LevelFilter::Trace } else { LevelFilter::Warn };
    if let Err(e) = SimpleLogger::new().with_level(level).env().init() {
        eprintln!("❌ Failed to initialise logging: {}", e);
    }

    let image = match load_image(&cli.image, cli.byte_order) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let mut cpu = Cpu::new();
    let written = cpu.load_image(&image, cli.offset);
    info!("loaded {} words at {:#06x}", written, ORIGIN.wrapping_add(cli.offset));

    let mut console = StdConsole::stdio();
    let result = match cli.max_cycles {
        Some(max_cycles) => cpu.run_limited(&mut console, max_cycles),
        None => cpu.run(&mut console),
    };

    match result {
        Ok(cycles) => {
            if cpu.is_running() {
                warn!("reached max cycles limit ({}) without halting", cycles);
            } else {
                info!("halted after {} instructions", cycles);
            }
        }
        Err(e) => {
            eprintln!("❌ CPU error at PC={:#06x}: {}", cpu.regs.pc.wrapping_sub(1), e);
            std::process::exit(1);
        }
    }

    if cli.dump_registers {
        match serde_json::to_string_pretty(&cpu.regs) {
            Ok(json) => eprintln!("{}", json),
            Err(e) => eprintln!("❌ Failed to serialise registers: {}", e),
        }
    }
}

/// Parse a 16-bit value written in decimal or with a `0x` prefix.
fn parse_word(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|e| format!("'{}' is not a 16-bit value: {}", s, e))
}
