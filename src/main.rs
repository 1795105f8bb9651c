use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use cmdrun::{trace, ExecConfig, LauncherKind, RunOptions, Runner};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cmdrun")]
#[command(about = "Run a command, optionally feeding stdin and capturing stdout/stderr", long_about = None)]
#[command(version)]
struct Cli {
    /// Capture the command's standard output and print it after it exits
    #[arg(short = 'o', long)]
    capture_output: bool,

    /// Capture the command's standard error and print it after it exits
    #[arg(short = 'e', long)]
    capture_error: bool,

    /// Text to feed to the command's standard input
    #[arg(long, conflicts_with = "input_file")]
    input: Option<String>,

    /// File whose contents are fed to the command's standard input
    #[arg(long)]
    input_file: Option<PathBuf>,

    /// Launcher to use (auto, native, fallback)
    #[arg(long)]
    launcher: Option<LauncherKind>,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// The command to run. Words are joined with single spaces and split
    /// again on spaces; quoting is not interpreted.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    trace::init(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => ExecConfig::load(path)?,
        None => ExecConfig::default(),
    };
    if let Some(launcher) = cli.launcher {
        config.launcher = launcher;
    }
    let runner = Runner::new(&config)?;

    let mut options = RunOptions::new();
    if let Some(text) = cli.input {
        options = options.with_input(text);
    } else if let Some(path) = &cli.input_file {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?;
        options = options.with_input(bytes);
    }
    if cli.capture_output {
        options = options.capture_output();
    }
    if cli.capture_error {
        options = options.capture_error();
    }

    let output = runner.run(&options, &cli.command.join(" "))?;

    if let Some(bytes) = &output.stdout {
        let mut stdout = io::stdout().lock();
        stdout.write_all(bytes).context("Failed to write captured output")?;
        stdout.flush().context("Failed to flush stdout")?;
    }
    if let Some(bytes) = &output.stderr {
        io::stderr()
            .write_all(bytes)
            .context("Failed to write captured error")?;
    }

    std::process::exit(output.code)
}
