//! CLI argument parsing, exported from the library so integration tests can
//! exercise it.

use std::path::PathBuf;

use crate::OptLevel;

/// Fully-parsed CLI arguments for a compilation request.
#[derive(Debug)]
pub struct CliArgs {
    pub path: PathBuf,
    /// Where the LLIR text goes.
    pub output: PathBuf,
    pub opt_level: OptLevel,
}

/// Result of `parse_args`.
#[derive(Debug)]
pub enum ParseArgsResult {
    /// Normal compilation request.
    Args(CliArgs),
    /// `--help` was present; caller should print usage and exit 0.
    Help,
    /// `--version` was present; caller should print the version and exit 0.
    Version,
}

/// Parses command-line arguments (the full `std::env::args()` slice
/// including `argv[0]`). `-O` accepts both `-O2` and `-O 2` spellings.
pub fn parse_args(args: &[String]) -> Result<ParseArgsResult, String> {
    let mut path: Option<PathBuf> = None;
    let mut output = PathBuf::from("out.ll");
    let mut opt_level = OptLevel::Full;
    let mut i = 1usize;

    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => return Ok(ParseArgsResult::Help),
            "--version" => return Ok(ParseArgsResult::Version),
            "-o" | "--output" => {
                i += 1;
                let file = args
                    .get(i)
                    .ok_or_else(|| "-o requires an argument".to_owned())?;
                output = PathBuf::from(file);
            }
            arg if arg.starts_with("-O") => {
                let digits = if arg.len() > 2 {
                    arg[2..].to_owned()
                } else {
                    i += 1;
                    args.get(i)
                        .cloned()
                        .ok_or_else(|| "-O requires an argument".to_owned())?
                };
                let n = digits
                    .parse::<u32>()
                    .map_err(|_| format!("-O: '{}' is not a valid level", digits))?;
                opt_level = OptLevel::from_arg(n);
            }
            arg if !arg.starts_with('-') => {
                if path.is_some() {
                    return Err(format!("unexpected extra argument: '{}'", arg));
                }
                path = Some(PathBuf::from(arg));
            }
            other => return Err(format!("unknown argument: '{}'", other)),
        }
        i += 1;
    }

    let path = path.ok_or_else(|| "no input file specified".to_owned())?;
    Ok(ParseArgsResult::Args(CliArgs {
        path,
        output,
        opt_level,
    }))
}

/// Returns the usage/help text for the CLI.
pub fn help_text() -> &'static str {
    "xrfc: compiles XRF files\n\
     Usage: xrfc [options] <file.xrf>\n\
     \n\
     Options:\n\
       -o, --output <file>   Write the LLIR module to <file> (default: out.ll)\n\
       -O <n>                Optimization level: 0 = none, 1 = chunk, 2+ = full (default: 2)\n\
       --version             Print the version and exit\n\
       --help, -h            Print this help and exit\n"
}

/// Returns the version line printed by `--version`.
pub fn version_text() -> String {
    format!("xrfc {}\n", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("xrfc")
            .chain(list.iter().copied())
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn defaults() {
        let parsed = parse_args(&args(&["program.xrf"])).unwrap();
        match parsed {
            ParseArgsResult::Args(cli) => {
                assert_eq!(cli.path, PathBuf::from("program.xrf"));
                assert_eq!(cli.output, PathBuf::from("out.ll"));
                assert_eq!(cli.opt_level, OptLevel::Full);
            }
            other => panic!("expected Args, got {:?}", other),
        }
    }

    #[test]
    fn opt_level_spellings() {
        for (argv, expected) in [
            (vec!["-O0", "p.xrf"], OptLevel::None),
            (vec!["-O", "1", "p.xrf"], OptLevel::Chunk),
            (vec!["-O3", "p.xrf"], OptLevel::Full),
        ] {
            match parse_args(&args(&argv)).unwrap() {
                ParseArgsResult::Args(cli) => assert_eq!(cli.opt_level, expected),
                other => panic!("expected Args, got {:?}", other),
            }
        }
    }

    #[test]
    fn version_and_help_short_circuit() {
        assert!(matches!(
            parse_args(&args(&["--version"])).unwrap(),
            ParseArgsResult::Version
        ));
        assert!(matches!(
            parse_args(&args(&["--help"])).unwrap(),
            ParseArgsResult::Help
        ));
    }

    #[test]
    fn missing_input_is_an_error() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["-o", "x.ll"])).is_err());
    }

    #[test]
    fn bad_opt_level_is_an_error() {
        assert!(parse_args(&args(&["-Ofast", "p.xrf"])).is_err());
    }
}
