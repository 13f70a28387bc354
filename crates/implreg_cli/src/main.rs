//! Command-line entry point.
//!
//! # Responsibility
//! - Replay page loads over a generated documentation tree.
//! - Inspect single fragment scripts.
//!
//! # Invariants
//! - Reports are printed as JSON on stdout; diagnostics go to stderr or the
//!   log directory.

use clap::{Parser, Subcommand};
use implreg_core::{
    core_version, init_logging, load_fragment, load_settings, run_session, scan_doc_root,
    BufferPolicy, LoadPlan,
};
use log::info;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "implreg", version, about = "Replay documentation fragment registration")]
struct Cli {
    /// JSON settings file.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Absolute directory for rotating log files; logging is off without it.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load every fragment under a documentation root and report the merge.
    Scan {
        doc_root: PathBuf,

        /// Buffering before consumers attach: queue | single_slot.
        #[arg(long)]
        policy: Option<BufferPolicy>,

        /// Number of fragments that load before the consumers.
        #[arg(long)]
        consumer_after: Option<usize>,

        /// Load fragments in reverse order.
        #[arg(long)]
        reverse: bool,
    },
    /// Parse one fragment script and print its channel and libraries.
    Inspect { fragment: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("implreg: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let settings = load_settings(cli.settings.as_deref()).map_err(|err| err.to_string())?;
    if let Some(log_dir) = &cli.log_dir {
        let log_dir = log_dir
            .to_str()
            .ok_or_else(|| format!("log dir is not valid UTF-8: {}", log_dir.display()))?;
        init_logging(&settings.log_level, log_dir)?;
    }

    let output = match cli.command {
        Command::Scan {
            doc_root,
            policy,
            consumer_after,
            reverse,
        } => {
            let paths = scan_doc_root(&doc_root).map_err(|err| err.to_string())?;
            let plan = LoadPlan {
                policy: policy.unwrap_or(settings.buffer_policy),
                consumer_after,
                reverse,
            };
            info!(
                "event=cli_scan module=cli status=ok root={} fragments={} policy={}",
                doc_root.display(),
                paths.len(),
                plan.policy
            );
            let report = run_session(&paths, &plan);
            json!({
                "core_version": core_version(),
                "doc_root": doc_root,
                "report": report,
            })
        }
        Command::Inspect { fragment } => {
            let loaded = load_fragment(&fragment).map_err(|err| err.to_string())?;
            json!({
                "path": loaded.path,
                "channel": loaded.fragment.channel(),
                "libraries": loaded.fragment.library_names(),
                "entries": loaded.fragment.entry_count(),
            })
        }
    };

    let rendered = serde_json::to_string_pretty(&output).map_err(|err| err.to_string())?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::{CommandFactory, Parser};
    use implreg_core::BufferPolicy;
    use std::path::PathBuf;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn scan_parses_policy_and_ordering_flags() {
        let cli = Cli::try_parse_from([
            "implreg",
            "scan",
            "target/doc",
            "--policy",
            "single-slot",
            "--consumer-after",
            "2",
            "--reverse",
            "--log-dir",
            "/tmp/implreg-logs",
        ])
        .expect("scan arguments parse");

        assert_eq!(cli.log_dir, Some(PathBuf::from("/tmp/implreg-logs")));
        let Command::Scan {
            doc_root,
            policy,
            consumer_after,
            reverse,
        } = cli.command
        else {
            panic!("expected scan command");
        };
        assert_eq!(doc_root, PathBuf::from("target/doc"));
        assert_eq!(policy, Some(BufferPolicy::SingleSlot));
        assert_eq!(consumer_after, Some(2));
        assert!(reverse);
    }

    #[test]
    fn scan_defaults_leave_policy_to_settings() {
        let cli = Cli::try_parse_from(["implreg", "scan", "target/doc"]).expect("parse");
        assert!(matches!(
            cli.command,
            Command::Scan {
                policy: None,
                consumer_after: None,
                reverse: false,
                ..
            }
        ));
        assert_eq!(cli.settings, None);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err = Cli::try_parse_from(["implreg", "scan", "target/doc", "--policy", "stack"])
            .expect_err("unknown policy must fail");
        assert!(err.to_string().contains("unsupported buffer policy"));
    }

    #[test]
    fn inspect_takes_one_fragment_path() {
        let cli = Cli::try_parse_from(["implreg", "inspect", "type.impl/lurk/enum.Stub.js"])
            .expect("parse");
        assert!(matches!(
            cli.command,
            Command::Inspect { ref fragment } if fragment == &PathBuf::from("type.impl/lurk/enum.Stub.js")
        ));
        assert!(Cli::try_parse_from(["implreg", "inspect"]).is_err());
    }
}
