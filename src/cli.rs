use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(version, about = None, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Source code input file
    pub input_file: PathBuf,

    /// Print tokens and exit
    #[arg(short, long)]
    pub tokens: bool,

    /// Print the parsed syntax tree and exit
    #[arg(short, long)]
    pub ast: bool,

    /// Print LLVM IR and exit
    #[arg(short, long)]
    pub ir: bool,

    /// Write LLVM IR to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Compile and run with the JIT engine
    #[arg(short, long)]
    pub run: bool,
}
