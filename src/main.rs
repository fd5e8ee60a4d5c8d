// pasfront: Pascal front end with three-address code output

use std::io::IsTerminal;
use std::path::Path;

use crossterm::style::Stylize;

use pasfront::backend::{self, BackendReport};
use pasfront::{compile_file, CompileOptions, CompiledProgram};

/// What to print besides the summary
#[derive(Debug, Default)]
struct Listings {
    symbols: bool,
    tac: bool,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let program_name = args.first().map(|s| s.as_str()).unwrap_or("pasfront");

    let mut options = CompileOptions::new();
    let mut listings = Listings::default();
    let mut paths = Vec::new();

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "-t" => options = options.with_token_trace(),
            "-st" => listings.symbols = true,
            "-tac" => listings.tac = true,
            flag if flag.starts_with('-') => {
                report_error(&format!("unknown option '{}'", flag));
                usage(program_name);
                std::process::exit(1);
            }
            path => paths.push(path),
        }
    }

    let Some(&source) = paths.first() else {
        report_error("no input file provided");
        usage(program_name);
        std::process::exit(1);
    };
    if paths.len() > 1 {
        eprintln!(
            "Warning: only {} is compiled, {} extra file(s) ignored",
            source,
            paths.len() - 1
        );
    }

    if !Path::new(source).exists() {
        report_error(&format!("file '{}' not found", source));
        std::process::exit(1);
    }

    let program = match compile_file(source, &options) {
        Ok(program) => program,
        Err(err) => {
            let message = err.to_string();
            report_error(message.strip_prefix("Error: ").unwrap_or(&message));
            std::process::exit(1);
        }
    };

    let report = backend::generate(&program);
    print_summary(&program, &report);

    if listings.symbols {
        println!();
        println!("Symbols:");
        for line in backend::symbol_listing(&program) {
            println!("  {}", line);
        }
    }

    if listings.tac {
        println!();
        println!("Three-address code:");
        for line in program.listing() {
            let indent = if line.starts_with("label") { "" } else { "  " };
            println!("{}{}", indent, line);
        }
    }
}

fn print_summary(program: &CompiledProgram, report: &BackendReport) {
    println!(
        "Compiled program '{}': {} unit(s), {} instruction(s), {} symbol(s).",
        program.name,
        report.units,
        report.instructions,
        program.symbols.symbol_count()
    );
}

fn report_error(message: &str) {
    if std::io::stderr().is_terminal() {
        eprintln!("{} {}", "Error:".red().bold(), message);
    } else {
        eprintln!("Error: {}", message);
    }
}

fn usage(program_name: &str) {
    eprintln!();
    eprintln!("Usage: {} [-t] [-st] [-tac] <file.pas>", program_name);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -t     trace every token on stderr");
    eprintln!("  -st    print the root symbol table");
    eprintln!("  -tac   print the three-address code");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} demos/overloads.pas", program_name);
    eprintln!("  {} -tac demos/loops.pas", program_name);
}
