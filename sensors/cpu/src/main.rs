//! sensu-go-cpu-check: CPU usage check binary.
//!
//! Prints one line of text (or one JSON object) to stdout and exits with the
//! check state: 0 OK, 1 WARNING, 2 CRITICAL, 3 UNKNOWN.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use sensu_check_core::{
    init_logging, log_filter, run_check, CheckConfig, CheckError, CheckState, FileConfig,
    OutputFormat,
};
use sensu_go_cpu_check::{CpuCheck, ProcStat, CHECK_NAME};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the CPU check.
#[derive(Parser)]
#[command(name = "sensu-go-cpu-check")]
#[command(about = "Sensu Go CPU Check")]
#[command(version)]
#[command(author)]
struct Args {
    /// Warning threshold (>=) for CPU usage [default: 80]
    #[arg(short, long, env = "CPU_CHECK_WARNING", allow_negative_numbers = true)]
    warning: Option<i64>,

    /// Critical threshold (>=) for CPU usage [default: 90]
    #[arg(short, long, env = "CPU_CHECK_CRITICAL", allow_negative_numbers = true)]
    critical: Option<i64>,

    /// How long to sleep between CPU usage samples, in seconds [default: 1]
    #[arg(short, long, env = "CPU_CHECK_INTERVAL")]
    interval: Option<u64>,

    /// Config file (default: ~/.config/sensu-go-cpu-check/config.ron)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Log filter for stderr diagnostics, overridden by RUST_LOG [default: warn]
    #[arg(long)]
    log_level: Option<String>,

    /// Verify /proc/stat is readable and exit
    #[arg(long)]
    check: bool,

    /// Generate example config file and exit
    #[arg(long)]
    generate_config: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => Self::Text,
            Format::Json => Self::Json,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            process::exit(usage_exit_code(&e));
        }
    };

    match run(args).await {
        Ok(state) => process::exit(state.exit_code()),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(CheckState::Unknown.exit_code());
        }
    }
}

/// clap exits with 2 on usage errors, which agents would read as CRITICAL.
fn usage_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        CheckState::Unknown.exit_code()
    } else {
        0
    }
}

fn file_config(args: &Args) -> Result<FileConfig, CheckError> {
    match &args.config {
        Some(path) => FileConfig::load_from_file(path),
        None => FileConfig::load(CHECK_NAME),
    }
}

/// Flags and environment variables over the file, the file over defaults.
fn check_config(args: &Args, file: &FileConfig) -> CheckConfig {
    file.to_check_config().apply_overrides(args.warning, args.critical, args.interval)
}

fn log_level<'a>(args: &'a Args, file: &'a FileConfig) -> &'a str {
    args.log_level.as_deref().unwrap_or(&file.log_level)
}

/// Everything that has to be valid before logging starts.
fn prepare(args: &Args) -> Result<(FileConfig, EnvFilter), CheckError> {
    let file = file_config(args)?;
    let filter = log_filter(log_level(args, &file))?;
    Ok((file, filter))
}

async fn run(args: Args) -> anyhow::Result<CheckState> {
    if args.generate_config {
        let path = args
            .config
            .clone()
            .or_else(|| FileConfig::default_config_path(CHECK_NAME))
            .context("Could not determine config directory")?;
        FileConfig::save_example_config_to_file(&path)?;
        println!("Generated example config at: {}", path.display());
        return Ok(CheckState::Ok);
    }

    let format = OutputFormat::from(args.format);
    let mut stdout = io::stdout();

    let (file, filter) = match prepare(&args) {
        Ok(prepared) => prepared,
        Err(err) => {
            writeln!(stdout, "{}", format.render_failure(CHECK_NAME, "error validating input", &err))?;
            return Ok(err.state());
        }
    };
    init_logging(filter)?;

    if args.check {
        let source = ProcStat::new();
        return Ok(match source.check_availability() {
            Ok(()) => {
                println!("CPU counters are available at {}", source.path().display());
                CheckState::Ok
            }
            Err(e) => {
                println!("CPU counters are not available: {e}");
                CheckState::Unknown
            }
        });
    }

    let mut check = CpuCheck::new(check_config(&args, &file));
    let state = run_check(&mut check, format, &mut stdout).await?;
    stdout.flush()?;

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn config_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn parse(file: &NamedTempFile, flags: &[&str]) -> Args {
        let path = file.path().to_str().unwrap();
        let argv = [CHECK_NAME, "--config", path].into_iter().chain(flags.iter().copied());
        Args::try_parse_from(argv).unwrap()
    }

    fn layered(file: &NamedTempFile, flags: &[&str]) -> CheckConfig {
        let args = parse(file, flags);
        let (file_config, _) = prepare(&args).unwrap();
        check_config(&args, &file_config)
    }

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    // CPU_CHECK_WARNING and CPU_CHECK_INTERVAL are only touched by
    // test_env_overrides_file_and_flag_overrides_env, so the tests below
    // only assert on critical.

    #[test]
    fn test_flag_overrides_file() {
        let file = config_file("(critical: 85)");
        let config = layered(&file, &["-c", "95"]);
        assert_eq!(config.thresholds.critical, 95);
    }

    #[test]
    fn test_file_overrides_default() {
        let file = config_file("(critical: 85)");
        assert_eq!(layered(&file, &[]).thresholds.critical, 85);

        let empty = config_file("()");
        assert_eq!(layered(&empty, &[]).thresholds.critical, 90);
    }

    #[test]
    fn test_env_overrides_file_and_flag_overrides_env() {
        let file = config_file("(warning: 70, interval: 3)");
        std::env::set_var("CPU_CHECK_WARNING", "95");
        std::env::set_var("CPU_CHECK_INTERVAL", "7");

        let from_env = layered(&file, &[]);
        let from_flags = layered(&file, &["-w", "60", "-i", "2"]);
        let inverted = layered(&file, &["-c", "90"]);

        std::env::remove_var("CPU_CHECK_WARNING");
        std::env::remove_var("CPU_CHECK_INTERVAL");

        assert_eq!(from_env.thresholds.warning, 95);
        assert_eq!(from_env.interval, Duration::from_secs(7));
        assert_eq!(from_flags.thresholds.warning, 60);
        assert_eq!(from_flags.interval, Duration::from_secs(2));

        let err = inverted.validate().unwrap_err();
        assert!(err.is_config());
        assert_eq!(err.state(), CheckState::Warning);
    }

    #[test]
    fn test_invalid_log_level_flag_is_a_config_error() {
        let file = config_file("()");
        let err = prepare(&parse(&file, &["--log-level", "="])).unwrap_err();

        assert!(err.is_config());
        assert_eq!(err.state(), CheckState::Warning);
        assert!(OutputFormat::Text
            .render_failure(CHECK_NAME, "error validating input", &err)
            .starts_with("error validating input: invalid log level"));
    }

    #[test]
    fn test_invalid_log_level_in_file_is_a_config_error() {
        let file = config_file(r#"(log_level: "=")"#);
        let err = prepare(&parse(&file, &[])).unwrap_err();
        assert_eq!(err.state(), CheckState::Warning);
    }

    #[test]
    fn test_log_level_flag_overrides_file() {
        let file = config_file(r#"(log_level: "error")"#);
        let args = parse(&file, &["--log-level", "debug"]);
        let file_config = file_config(&args).unwrap();
        assert_eq!(log_level(&args, &file_config), "debug");

        let args = parse(&file, &[]);
        assert_eq!(log_level(&args, &file_config), "error");
    }

    #[test]
    fn test_usage_errors_exit_unknown() {
        for argv in [
            vec![CHECK_NAME, "-c", "abc"],
            vec![CHECK_NAME, "--bogus"],
            vec![CHECK_NAME, "--format", "xml"],
        ] {
            let err = Args::try_parse_from(argv).err().unwrap();
            assert_eq!(usage_exit_code(&err), 3);
        }
    }

    #[test]
    fn test_help_and_version_exit_zero() {
        for flag in ["--help", "--version"] {
            let err = Args::try_parse_from([CHECK_NAME, flag]).err().unwrap();
            assert_eq!(usage_exit_code(&err), 0);
        }
    }
}
