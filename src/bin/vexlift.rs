//! vexlift inspection tool.
//!
//! Lists the supported guest architectures and shows the engine
//! configuration a lift request would resolve to, without calling the engine.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use vexlift::core::resolve::resolve;
use vexlift::{Arch, ArchDescriptor, LiftRequest};

#[derive(Parser)]
#[command(name = "vexlift", version, about = "Inspect vexlift architectures and request resolution")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List supported architectures.
    Archs,
    /// Show the effective engine configuration for a request.
    Resolve(ResolveArgs),
}

#[derive(Args)]
struct ResolveArgs {
    /// Architecture name (e.g. AMD64, ARMHF, 8086).
    #[arg(long)]
    arch: String,

    /// Code as hex digits; read from FILE or stdin when absent.
    #[arg(long)]
    hex: Option<String>,

    /// Raw code file.
    file: Option<PathBuf>,

    /// Guest address of the first byte.
    #[arg(long, value_parser = parse_u64, default_value = "0")]
    addr: u64,

    #[arg(long)]
    offset: Option<usize>,

    #[arg(long)]
    max_bytes: Option<usize>,

    #[arg(long)]
    max_inst: Option<u32>,

    #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
    opt_level: i32,

    #[arg(long, default_value_t = 0)]
    traceflags: u32,

    /// Let blocks run past the first control-flow instruction.
    #[arg(long)]
    no_strict_block_end: bool,

    #[arg(long)]
    data_refs: bool,

    /// Code segment for 8086 guests.
    #[arg(long, value_parser = parse_u16)]
    cs: Option<u16>,
}

fn parse_u64(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number {:?}: {}", s, e))
}

fn parse_u16(s: &str) -> Result<u16, String> {
    let value = parse_u64(s)?;
    u16::try_from(value).map_err(|_| format!("{} does not fit in 16 bits", s))
}

fn decode_hex(text: &str) -> Result<Vec<u8>, String> {
    let digits: Vec<u8> = text.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err("odd number of hex digits".to_string());
    }
    digits
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).map_err(|e| e.to_string())?;
            u8::from_str_radix(pair, 16).map_err(|e| format!("invalid hex {:?}: {}", pair, e))
        })
        .collect()
}

fn read_code(args: &ResolveArgs) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    if let Some(hex) = &args.hex {
        return Ok(decode_hex(hex)?);
    }
    if let Some(path) = &args.file {
        return Ok(fs::read(path)?);
    }
    let mut buffer = Vec::new();
    io::stdin().read_to_end(&mut buffer)?;
    Ok(buffer)
}

fn list_archs() {
    println!("{:<12} {:<8} {:>5}  {:<7}", "NAME", "VEXARCH", "BITS", "ENDNESS");
    for arch in Arch::ALL {
        println!(
            "{:<12} {:#8x} {:>5}  {:?}",
            arch.name(),
            arch.vex_arch().as_raw(),
            arch.bits(),
            arch.default_endness()
        );
    }
}

fn show_resolution(args: &ResolveArgs) -> Result<(), Box<dyn std::error::Error>> {
    let arch: Arch = args.arch.parse()?;
    let mut descriptor = ArchDescriptor::new(arch);
    if let Some(cs) = args.cs {
        descriptor = descriptor.with_cs_reg(cs);
    }

    let code = read_code(args)?;
    let mut request = LiftRequest::new(&code, args.addr)
        .with_opt_level(args.opt_level)
        .with_traceflags(args.traceflags)
        .with_data_refs(args.data_refs);
    if args.no_strict_block_end {
        request = request.with_strict_block_end(false);
    }
    if let Some(offset) = args.offset {
        request = request.with_offset(offset);
    }
    if let Some(max_bytes) = args.max_bytes {
        request = request.with_max_bytes(max_bytes);
    }
    if let Some(max_inst) = args.max_inst {
        request = request.with_max_inst(max_inst);
    }

    let config = resolve(&request, &descriptor)?;
    println!("arch:                     {} ({:?})", arch, arch.vex_arch());
    println!("address:                  {:#x}", request.addr);
    println!("bytes_offset:             {}", config.bytes_offset);
    println!("max_bytes:                {}", config.max_bytes);
    println!("max_inst:                 {}", config.max_inst);
    println!("opt_level:                {}", config.opt_level);
    println!("traceflags:               {:#x}", config.traceflags);
    println!("allow_arch_optimizations: {}", config.allow_arch_optimizations);
    println!("strict_block_end:         {}", config.strict_block_end);
    println!("collect_data_refs:        {}", config.collect_data_refs);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Archs => {
            list_archs();
            Ok(())
        }
        Command::Resolve(args) => match show_resolution(&args) {
            Ok(()) => Ok(()),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
    }
}
