//! md2pdf – converts a bilingual (English/Hebrew) markdown file to PDF.
//!
//! Usage:
//!   md2pdf [input.md] [output.pdf]
//!
//! Without arguments the built-in meeting-guide paths in the working
//! directory are used. `RUST_LOG` controls diagnostic logging.

use std::{env, path::PathBuf, process};

use bilingual_pdf::convert::{convert, ConvertConfig};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config = ConvertConfig::default();

    let mut positional = 0usize;
    for arg in args.iter().skip(1) {
        if arg.starts_with('-') && arg.len() > 1 {
            eprintln!("Unknown flag: {arg}");
            print_usage(&args[0]);
            process::exit(1);
        }
        match positional {
            0 => config.input_path = PathBuf::from(arg),
            1 => config.output_path = PathBuf::from(arg),
            _ => {
                eprintln!("Unexpected argument: {arg}");
                print_usage(&args[0]);
                process::exit(1);
            }
        }
        positional += 1;
    }

    println!("Converting markdown to PDF...");
    match convert(&config) {
        Ok(report) => {
            println!("✓ PDF successfully created: {}", report.output_path.display());
            println!("✓ File size: {:.1} KB", report.size_kb());
            println!("✓ Document contains bilingual content (English & Hebrew)");
            println!("✓ Professional formatting applied");
            println!("\nPDF generation complete!");
        }
        Err(e) => {
            println!("✗ Error creating PDF: {e}");
            process::exit(1);
        }
    }
}

fn print_usage(prog: &str) {
    eprintln!("md2pdf – bilingual markdown to PDF converter");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} [input.md] [output.pdf]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [input.md]     Markdown file to convert (default: ABcon_Client_Meeting_Guide.md)");
    eprintln!("  [output.pdf]   Output path (default: ABcon_Client_Meeting_Guide.pdf)");
}
