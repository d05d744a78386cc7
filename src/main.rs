use std::fs;
use std::process::ExitCode;

use clap::Parser;
use inkwell::context::Context;
use miette::Diagnostic;
use thiserror::Error;

use simplelang::codegen::{Codegen, CodegenError};
use simplelang::parsing::{self, ParseError};

mod cli;

/// Everything the driver can fail with, prefixed by its family
#[derive(Debug, Error, Diagnostic)]
enum CompilerError {
    #[error("Parse Error: {0}")]
    Parse(#[from] ParseError),

    #[error("Code Generation Error: {0}")]
    Codegen(#[from] CodegenError),

    #[error("Error: Cannot open file: {0}")]
    CannotOpenFile(String),

    #[error("Error: {0}")]
    Io(#[from] std::io::Error),
}

fn main() -> ExitCode {
    let args = match cli::Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // --help and --version land here too and are not failures
            let code = if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = err.print();
            return code;
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &cli::Args) -> Result<(), CompilerError> {
    let source = fs::read_to_string(&args.input_file)
        .map_err(|_| CompilerError::CannotOpenFile(args.input_file.display().to_string()))?;
    println!("Compiling: {}\n", args.input_file.display());

    let tokens = parsing::tokenize(&source);
    if args.tokens {
        println!("=== TOKENS ===");
        for token in &tokens {
            println!("{token}");
        }
        return Ok(());
    }

    let program = parsing::parse(tokens)?;
    println!("✓ Parsing completed successfully");

    if args.ast {
        println!("=== AST ===");
        program.pretty_print()?;
        return Ok(());
    }

    let context = Context::create();
    let mut codegen = Codegen::new(&context);
    codegen.generate(&program)?;
    println!("✓ Code generation completed successfully");

    if args.ir {
        println!("\n=== LLVM IR ===");
        print!("{}", codegen.dump_ir());
        return Ok(());
    }

    if let Some(output) = &args.output {
        codegen.write_ir_to_file(output)?;
        println!("✓ IR written to {}", output.display());
    }

    if args.run {
        println!("\n=== EXECUTING WITH JIT ===");
        let result = codegen.execute_jit()?;
        println!("Program executed successfully");
        println!("Return value: {result}");
    }

    Ok(())
}
