//! Lists a compiled talk script as offset / mnemonic / operand records.
//!
//! The input is either a raw script file or a library archive plus an
//! item index. Output is a plain listing on stdout, or a YAML dump when
//! an output path is given.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use serde::{Deserialize, Serialize};

use rwou_lib::LibFile;
use rwou_talk::{classify, OpKind, ScriptBuffer, Width};

#[derive(Debug, Serialize, Deserialize)]
pub struct Record {
    address: u32,
    mnemonic: String,
    operands: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Listing {
    source: String,
    item: Option<usize>,
    length: usize,
    records: Vec<Record>,
}

fn printable(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b == 0x0a { '\u{21b5}' } else { b as char })
        .collect()
}

/// Walks a script byte by byte with the interpreter's own classifier, so
/// the listing and the machine never disagree about a byte's band.
pub fn disassemble(bytes: Vec<u8>) -> Vec<Record> {
    let mut s = ScriptBuffer::new(bytes);
    let mut records = Vec::new();
    while !s.overflow(0) {
        let address = s.pos() as u32;
        match classify(s.peek(0)) {
            OpKind::Print => {
                let mut run = Vec::new();
                while !s.overflow(0) && matches!(classify(s.peek(0)), OpKind::Print) {
                    run.push(s.read() as u8);
                }
                records.push(Record {
                    address,
                    mnemonic: "text".to_string(),
                    operands: vec![printable(&run)],
                });
            }
            OpKind::DataSize(w) => {
                s.skip(1);
                let v = match w {
                    Width::One => s.read(),
                    Width::Two => s.read2(),
                    Width::Four => s.read4(),
                };
                records.push(Record {
                    address,
                    mnemonic: format!("push{}", w.bytes() * 8),
                    operands: vec![format!("0x{v:x}")],
                });
            }
            OpKind::Value(op) => {
                s.skip(1);
                records.push(Record {
                    address,
                    mnemonic: op.mnemonic().to_string(),
                    operands: Vec::new(),
                });
            }
            OpKind::Control(op) => {
                s.skip(1);
                records.push(Record {
                    address,
                    mnemonic: op.mnemonic().to_string(),
                    operands: Vec::new(),
                });
            }
            OpKind::UnknownControl | OpKind::Literal => {
                let b = s.read();
                records.push(Record {
                    address,
                    mnemonic: "db".to_string(),
                    operands: vec![format!("0x{b:02x}")],
                });
            }
        }
    }
    records
}

fn write_listing(listing: &Listing, path: &Path) -> Result<()> {
    let mut writer =
        std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_yaml::to_writer(&mut writer, listing)?;
    Ok(())
}

fn print_listing(listing: &Listing) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "; {} ({} bytes)", listing.source, listing.length)?;
    for r in &listing.records {
        writeln!(
            out,
            "{:06x}  {} {}",
            r.address,
            r.mnemonic,
            r.operands.join(" ")
        )?;
    }
    Ok(())
}

#[derive(ClapParser, Debug)]
#[command(version, about = "talk script disassembler", long_about = None)]
struct Args {
    /// A raw script, or a library archive when --item is given.
    #[arg(short, long, required = true)]
    input: PathBuf,

    /// Item index to pull out of a library archive.
    #[arg(short = 'n', long)]
    item: Option<usize>,

    /// Write the listing as YAML instead of printing it.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let bytes = match args.item {
        Some(index) => {
            let lib = LibFile::open(&args.input)
                .with_context(|| format!("opening archive {}", args.input.display()))?;
            log::info!(
                "archive holds {} items ({:?})",
                lib.item_count(),
                lib.compression()
            );
            lib.load(index)
                .with_context(|| format!("loading item {index}"))?
        }
        None => std::fs::read(&args.input)
            .with_context(|| format!("reading {}", args.input.display()))?,
    };

    let listing = Listing {
        source: args.input.display().to_string(),
        item: args.item,
        length: bytes.len(),
        records: disassemble(bytes),
    };

    match args.output {
        Some(path) => write_listing(&listing, &path),
        None => print_listing(&listing),
    }
}
