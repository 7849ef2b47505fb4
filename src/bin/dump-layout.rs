use clap::Parser;
use heap_rs::{binding::Operation, constants::HOST_CONSTANTS};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Dump the constants and operation signatures exported to the host"
)]
struct Args {
    /// Only print the constants, as `name=value` lines
    #[arg(long)]
    env: bool,
}

fn main() {
    let args = Args::parse();

    if args.env {
        for (name, value) in HOST_CONSTANTS {
            println!("{name}={value}");
        }
        return;
    }

    println!("constants:");
    for (name, value) in HOST_CONSTANTS {
        println!("  {name:<12} {value:>12} ({value:#x})");
    }
    println!("operations:");
    for op in Operation::ALL {
        println!("  {}", op.usage());
    }
}
