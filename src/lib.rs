use clap::Parser;
use crate::{constants::HOST_CONSTANTS, gc::PageGeometry};
use std::process::ExitCode;

#[macro_use]
mod macros;

pub mod binding;
pub mod constants;
pub mod error;
pub mod gc;
pub mod native;
pub mod value;

pub use error::{ErrorKind, HeapError};
pub use value::{Extent, RawView, TaggedValue};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Inspect the word, tagging and mark-bitmap layout used by the heap primitives"
)]
pub struct Args {
    /// Heap page size in bytes; must be a power of two
    #[arg(short, long, default_value_t = 4096)]
    pub page_size: usize,
    /// Mark bits per object
    #[arg(short, long, default_value_t = 1)]
    pub bits: u32,
    /// Object addresses (decimal or 0x-prefixed hex) to locate mark slots for
    #[arg(value_name = "ADDRESS", value_parser = parse_address)]
    pub addresses: Vec<usize>,
}

fn parse_address(s: &str) -> Result<usize, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address {s:?}: {e}"))
}

/// Renders the constants, page geometry and the mark slot of each requested address.
/// Only arithmetic is performed; no address is dereferenced.
pub fn describe(args: &Args) -> Result<String, HeapError> {
    let geometry = PageGeometry::new(args.page_size, args.bits)?;
    let mut out = String::new();

    for (name, value) in HOST_CONSTANTS {
        out.push_str(&format!("{name:<12} {value:#x}\n"));
    }
    out.push_str(&format!(
        "page {:#x}, {} bit(s) per object: bitmap {} bytes, objects from +{:#x}\n",
        geometry.page_size(),
        geometry.bit_count(),
        geometry.bitmap_size(),
        geometry.object_start(0)
    ));
    for &addr in &args.addresses {
        let slot = geometry.locate(addr);
        out.push_str(&format!(
            "{addr:#x}: page {:#x}, mark word {:#x}, shift {}\n",
            geometry.page_base(addr),
            slot.word,
            slot.shift
        ));
    }
    Ok(out)
}

pub fn run_cli() -> ExitCode {
    let args = Args::parse();
    match describe(&args) {
        Ok(report) => {
            print!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x1000"), Ok(0x1000));
        assert_eq!(parse_address("4096"), Ok(4096));
        assert!(parse_address("0xzz").is_err());
    }

    #[test]
    fn test_describe_rejects_bad_page_size() {
        let args = Args::parse_from(["heap-rs", "--page-size", "100"]);
        assert_eq!(describe(&args), Err(HeapError::PageSize(100)));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_describe_locates_addresses() {
        let args = Args::parse_from(["heap-rs", "-p", "4096", "-b", "2", "0x100090"]);
        let report = describe(&args).unwrap();
        assert!(report.contains("bitmap 128 bytes, objects from +0x80"), "{report}");
        let line = "0x100090: page 0x100000, mark word 0x100000, shift 4";
        assert!(report.contains(line), "{report}");
    }
}
