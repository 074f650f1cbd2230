#![forbid(unsafe_code)]

//! Command-line argument parsing for the showcase.
//!
//! Parses args by hand to keep the binary lean. Environment variables with
//! the `VISTRAL_` prefix provide defaults; explicit flags override them.

use std::env;
use std::path::PathBuf;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HELP_TEXT: &str = "\
Vistral Showcase: temporal binding for the grammar of graphics

USAGE:
    vistral-showcase [OPTIONS]

OPTIONS:
    --screen=N           Start on screen N, 1-indexed (default: 1)
    --seed=N             Seed for synthetic data (default: from clock)
    --frame-ms=N         Animation frame interval in ms (default: 16)
    --exit-after-ms=N    Quit automatically after N ms (0 = never)
    --log-file=PATH      Write tracing output to PATH
    --no-alt-screen      Draw on the main screen instead of the alternate one
    --help, -h           Show this help message
    --version, -V        Show version

SCREENS:
    1  Home               Temporal binding as a new grammar layer
    2  Axis Binding       Case 1: stream through a sliding window
    3  Frame Binding      Case 2: discrete snapshots
    4  Key Updates        Case 3: mutable state by key

KEYBINDINGS:
    1-4             Switch screen
    Tab / Shift-Tab Cycle screens
    ?               Toggle help overlay
    q / Esc / Ctrl+C Quit

ENVIRONMENT VARIABLES:
    VISTRAL_SCREEN            Override --screen
    VISTRAL_SEED              Override --seed
    VISTRAL_FRAME_MS          Override --frame-ms
    VISTRAL_EXIT_AFTER_MS     Override --exit-after-ms
    VISTRAL_LOG_FILE          Override --log-file
    VISTRAL_LOG               Log filter directives (default: info)
    VISTRAL_LOG_JSON          Write the log file as JSON when set to 1
    VISTRAL_JSONL             Emit JSONL diagnostics on stderr when set to 1";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Starting screen (1-indexed).
    pub start_screen: u16,
    /// `None` derives a seed from the clock.
    pub seed: Option<u64>,
    pub frame_ms: u64,
    /// Auto-exit after this many milliseconds (0 = disabled).
    pub exit_after_ms: u64,
    pub log_file: Option<PathBuf>,
    pub log_json: bool,
    pub alt_screen: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            start_screen: 1,
            seed: None,
            frame_ms: 16,
            exit_after_ms: 0,
            log_file: None,
            log_json: false,
            alt_screen: true,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Run(Opts),
    Help,
    Version,
}

fn parse_number<T: std::str::FromStr>(flag: &str, val: &str) -> Result<T, String> {
    val.parse()
        .map_err(|_| format!("Invalid --{flag} value: {val}"))
}

impl Opts {
    /// Parse the process environment and arguments, exiting on `--help`,
    /// `--version` or a malformed flag.
    pub fn parse() -> Self {
        let args: Vec<String> = env::args().skip(1).collect();
        match Self::parse_from(args, |key| env::var(key).ok()) {
            Ok(Parsed::Run(opts)) => opts,
            Ok(Parsed::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Parsed::Version) => {
                println!("vistral-showcase {VERSION}");
                process::exit(0);
            }
            Err(message) => {
                eprintln!("{message}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Parse from explicit inputs. `lookup` resolves environment variables.
    pub fn parse_from<I, F>(args: I, lookup: F) -> Result<Parsed, String>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        // Environment first; malformed numbers are ignored here.
        if let Some(n) = lookup("VISTRAL_SCREEN").and_then(|v| v.parse().ok()) {
            opts.start_screen = n;
        }
        if let Some(n) = lookup("VISTRAL_SEED").and_then(|v| v.parse().ok()) {
            opts.seed = Some(n);
        }
        if let Some(n) = lookup("VISTRAL_FRAME_MS").and_then(|v| v.parse().ok()) {
            opts.frame_ms = n;
        }
        if let Some(n) = lookup("VISTRAL_EXIT_AFTER_MS").and_then(|v| v.parse().ok()) {
            opts.exit_after_ms = n;
        }
        if let Some(path) = lookup("VISTRAL_LOG_FILE").filter(|v| !v.is_empty()) {
            opts.log_file = Some(PathBuf::from(path));
        }
        opts.log_json = lookup("VISTRAL_LOG_JSON").is_some_and(|v| v == "1");

        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Ok(Parsed::Help),
                "--version" | "-V" => return Ok(Parsed::Version),
                "--no-alt-screen" => opts.alt_screen = false,
                other => {
                    if let Some(val) = other.strip_prefix("--screen=") {
                        opts.start_screen = parse_number("screen", val)?;
                    } else if let Some(val) = other.strip_prefix("--seed=") {
                        opts.seed = Some(parse_number("seed", val)?);
                    } else if let Some(val) = other.strip_prefix("--frame-ms=") {
                        opts.frame_ms = parse_number("frame-ms", val)?;
                    } else if let Some(val) = other.strip_prefix("--exit-after-ms=") {
                        opts.exit_after_ms = parse_number("exit-after-ms", val)?;
                    } else if let Some(val) = other.strip_prefix("--log-file=") {
                        opts.log_file = Some(PathBuf::from(val));
                    } else {
                        return Err(format!("Unknown argument: {other}"));
                    }
                }
            }
        }

        opts.frame_ms = opts.frame_ms.max(1);
        Ok(Parsed::Run(opts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(args: &[&str], env: &[(&str, &str)]) -> Result<Parsed, String> {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Opts::parse_from(args.iter().map(|s| s.to_string()), |key| {
            env.get(key).cloned()
        })
    }

    fn run(args: &[&str], env: &[(&str, &str)]) -> Opts {
        match parse(args, env) {
            Ok(Parsed::Run(opts)) => opts,
            other => panic!("expected options, got {other:?}"),
        }
    }

    #[test]
    fn default_opts() {
        let opts = run(&[], &[]);
        assert_eq!(opts, Opts::default());
        assert_eq!(opts.start_screen, 1);
        assert!(opts.alt_screen);
        assert_eq!(opts.exit_after_ms, 0);
    }

    #[test]
    fn flags_override_env() {
        let opts = run(
            &["--screen=3", "--seed=9"],
            &[("VISTRAL_SCREEN", "2"), ("VISTRAL_SEED", "1"), ("VISTRAL_FRAME_MS", "33")],
        );
        assert_eq!(opts.start_screen, 3);
        assert_eq!(opts.seed, Some(9));
        assert_eq!(opts.frame_ms, 33);
    }

    #[test]
    fn log_file_from_env_and_flag() {
        let opts = run(&[], &[("VISTRAL_LOG_FILE", "/tmp/a.log"), ("VISTRAL_LOG_JSON", "1")]);
        assert_eq!(opts.log_file, Some(PathBuf::from("/tmp/a.log")));
        assert!(opts.log_json);
        let opts = run(&["--log-file=b.log", "--no-alt-screen"], &[]);
        assert_eq!(opts.log_file, Some(PathBuf::from("b.log")));
        assert!(!opts.alt_screen);
    }

    #[test]
    fn zero_frame_interval_is_clamped() {
        assert_eq!(run(&["--frame-ms=0"], &[]).frame_ms, 1);
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert_eq!(parse(&["--seed=1", "-h"], &[]), Ok(Parsed::Help));
        assert_eq!(parse(&["-V"], &[]), Ok(Parsed::Version));
    }

    #[test]
    fn bad_input_is_reported() {
        assert_eq!(
            parse(&["--screen=x"], &[]),
            Err("Invalid --screen value: x".to_string())
        );
        assert!(parse(&["--bogus"], &[]).is_err_and(|e| e.contains("--bogus")));
        // Malformed env values fall back to defaults.
        assert_eq!(run(&[], &[("VISTRAL_SCREEN", "nope")]).start_screen, 1);
    }

    #[test]
    fn help_screen_count_matches_all() {
        let screen_count = HELP_TEXT
            .lines()
            .skip_while(|line| !line.starts_with("SCREENS:"))
            .skip(1)
            .take_while(|line| !line.trim().is_empty())
            .count();
        assert_eq!(screen_count, crate::app::ScreenId::ALL.len());
    }

    #[test]
    fn help_text_documents_env_vars() {
        for var in ["VISTRAL_SCREEN", "VISTRAL_SEED", "VISTRAL_EXIT_AFTER_MS", "VISTRAL_JSONL"] {
            assert!(HELP_TEXT.contains(var), "missing {var}");
        }
    }
}
