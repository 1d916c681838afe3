use std::path::PathBuf;

use clap::Parser;

/// Module name dumped when a directory is given.
pub const DEFAULT_MODULE: &str = "Assembly-CSharp.dll";

/// typedump - per-type method and field reports for .NET modules
#[derive(Debug, Parser)]
#[command(name = "typedump", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Module file, or a managed folder containing --module.
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Locate the managed folder of this running process instead of passing PATH.
    #[arg(long, value_name = "NAME")]
    pub process: Option<String>,

    /// Module file name inside the managed folder.
    #[arg(long, value_name = "FILE_NAME", default_value = DEFAULT_MODULE)]
    pub module: String,

    /// Keep only types whose name contains this text.
    #[arg(long, value_name = "NAME")]
    pub class: Option<String>,

    /// Keep only methods whose name contains this text.
    #[arg(long, value_name = "NAME")]
    pub method: Option<String>,

    /// Output directory [default: Parsed/<process name or module stem>].
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

/// Options that only affect how the run reports.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Print the run summary as JSON on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log file, truncated at start [default: <temp dir>/typedump.log].
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,
}
