use std::fs::File;
use std::io::Write;
use std::process;

use xrfc::cli::{help_text, parse_args, version_text, ParseArgsResult};
use xrfc::diagnostics::render_parse_errors;
use xrfc::Error;

// Exit codes: 0 success, 1 file I/O problem, 2 parse errors,
// 3 backend write failure.
fn main() {
    let args: Vec<String> = std::env::args().collect();

    match parse_args(&args) {
        Ok(ParseArgsResult::Help) => {
            print!("{}", help_text());
            process::exit(0);
        }
        Ok(ParseArgsResult::Version) => {
            print!("{}", version_text());
            process::exit(0);
        }
        Ok(ParseArgsResult::Args(cli)) => {
            let source = std::fs::read_to_string(&cli.path).unwrap_or_else(|e| {
                eprintln!("error: cannot read '{}': {}", cli.path.display(), e);
                process::exit(1);
            });

            let text = match xrfc::compile(&source, cli.opt_level) {
                Ok(text) => text,
                Err(Error::Parse(errors)) => {
                    eprint!("{}", render_parse_errors(&errors));
                    process::exit(2);
                }
                Err(e) => {
                    eprintln!("error: {}", e);
                    process::exit(3);
                }
            };

            let mut out = File::create(&cli.output).unwrap_or_else(|e| {
                eprintln!("error: cannot open '{}': {}", cli.output.display(), e);
                process::exit(1);
            });
            if let Err(e) = out.write_all(text.as_bytes()) {
                eprintln!("error: cannot write '{}': {}", cli.output.display(), e);
                process::exit(3);
            }
        }
        Err(msg) => {
            eprintln!("error: {}", msg);
            eprintln!("{}", help_text());
            process::exit(1);
        }
    }
}
