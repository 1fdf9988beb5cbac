use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "nsdeck",
    version,
    about = "A terminal control deck for namespace provisioning and workload status."
)]
pub struct CliArgs {
    /// Base URL of the orchestration backend
    #[arg(long, env = "NSDECK_SERVER")]
    pub server: Option<String>,

    /// Known namespace to offer for selection (repeatable, first is preselected)
    #[arg(short, long = "namespace")]
    pub namespaces: Vec<String>,

    /// Initial container image reference
    #[arg(long)]
    pub image: Option<String>,

    /// Per-request timeout in seconds (no timeout when omitted)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// Write logs to this file instead of discarding them
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
