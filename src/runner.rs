//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! handles command execution. Graph construction and validation happen
//! in-process; applying the plan is delegated to the external orchestration
//! engine subprocess, whose output is streamed back to the user.

use crate::cli::{Cli, Commands, UpArgs};
use crate::config::StackConfig;
use crate::graph::StackGraph;
use crate::{plan_gen, stack};
use anyhow::{Context, Result, bail};
use engine_env::{DEFAULT_ENGINE, ENGINE_ENV};
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use tempfile::Builder;
use tracing::{debug, info};

mod report;

pub use report::{ApplyReport, Outcome, ReportError};

/// Execute the parsed [`Cli`] commands.
///
/// # Errors
///
/// Returns an error if configuration loading, graph construction, plan
/// emission, or the engine subprocess fails.
pub fn run(cli: &Cli) -> Result<()> {
    let command = cli
        .command
        .clone()
        .unwrap_or(Commands::Up(UpArgs { emit: None }));
    match command {
        Commands::Up(args) => up(cli, &args),
        Commands::Preview => preview(cli),
        Commands::Graph => {
            let graph = build_graph(cli)?;
            write!(io::stdout(), "{}", plan_gen::dot(&graph)).context("write graph")?;
            Ok(())
        }
        Commands::Plan { file } => {
            let graph = build_graph(cli)?;
            let plan = plan_gen::generate(&graph).context("generating plan")?;
            write_and_log(&file, &plan)?;
            Ok(())
        }
    }
}

/// Load the stack configuration, declare the stack, and validate the graph.
fn build_graph(cli: &Cli) -> Result<StackGraph> {
    let config_path = cli
        .directory
        .as_ref()
        .map_or_else(|| cli.file.clone(), |dir| dir.join(&cli.file));
    let mut config = StackConfig::from_path(&config_path)
        .with_context(|| format!("loading configuration at {}", config_path.display()))?;
    config.overlay_env();

    let mut graph = StackGraph::new(config.stack());
    stack::declare_stack(&config, &mut graph).context("declaring stack")?;
    graph.validate().context("validating graph")?;
    debug!(
        resources = graph.len(),
        stack = graph.stack(),
        "graph validated"
    );
    Ok(graph)
}

fn up(cli: &Cli, args: &UpArgs) -> Result<()> {
    let graph = build_graph(cli)?;
    let plan = plan_gen::generate(&graph).context("generating plan")?;
    let report_file = Builder::new()
        .prefix("kumo.")
        .suffix(".report.json")
        .tempfile()
        .context("create report file")?;

    let engine = engine_program(cli);
    if let Some(path) = &args.emit {
        write_and_log(path, &plan)?;
        run_engine(&engine, cli, path, report_file.path())?;
    } else {
        let tmp = Builder::new()
            .prefix("kumo.")
            .suffix(".plan.json")
            .tempfile()
            .context("create temp file")?;
        write_and_log(tmp.path(), &plan)?;
        run_engine(&engine, cli, tmp.path(), report_file.path())?;
    }

    let report = ApplyReport::from_path(report_file.path())?;
    report.ensure_succeeded()?;
    let mut handle = io::stdout();
    for (label, value) in graph.exports() {
        let resolved = report
            .resolve(value)
            .with_context(|| format!("resolving export '{label}'"))?;
        writeln!(handle, "{label} = {resolved}").context("write exports")?;
    }
    Ok(())
}

/// Print a human summary of the declarations and their dependency edges.
fn preview(cli: &Cli) -> Result<()> {
    let graph = build_graph(cli)?;
    let mut handle = io::stdout();
    writeln!(
        handle,
        "stack {}: {} resources, {} exports",
        graph.stack(),
        graph.len(),
        graph.exports().count(),
    )?;
    for decl in graph.declarations() {
        let mut deps: Vec<&str> = decl
            .dependencies()
            .iter()
            .map(|name| name.as_str())
            .collect();
        deps.dedup();
        if deps.is_empty() {
            writeln!(handle, "  {:<18} {}", decl.kind().token(), decl.name())?;
        } else {
            writeln!(
                handle,
                "  {:<18} {}  (depends on: {})",
                decl.kind().token(),
                decl.name(),
                deps.join(", "),
            )?;
        }
    }
    for (label, _) in graph.exports() {
        writeln!(handle, "  export {label}")?;
    }
    Ok(())
}

/// Write `content` to `path` and log the file's location.
fn write_and_log(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("writing plan to {}", path.display()))?;
    info!("Generated plan at {}", path.display());
    Ok(())
}

/// Resolve the engine executable: `--engine` flag, then the `KUMO_ENGINE`
/// environment variable, then `kumo-engine` on `PATH`.
fn engine_program(cli: &Cli) -> PathBuf {
    cli.engine.clone().unwrap_or_else(|| {
        std::env::var_os(ENGINE_ENV).map_or_else(|| PathBuf::from(DEFAULT_ENGINE), PathBuf::from)
    })
}

fn is_sensitive_key(key: &str) -> bool {
    const SENSITIVE_KEYS: [&str; 5] = ["password", "token", "secret", "api_key", "auth"];
    SENSITIVE_KEYS
        .iter()
        .any(|candidate| key.eq_ignore_ascii_case(candidate))
}

/// Redact sensitive information in a single argument.
///
/// Sensitive values are replaced with `***REDACTED***`, preserving keys.
fn redact_argument(arg: &str) -> String {
    arg.split_once('=').map_or_else(
        || arg.to_owned(),
        |(key, _)| {
            if is_sensitive_key(key.trim()) {
                format!("{}=***REDACTED***", key.trim())
            } else {
                arg.to_owned()
            }
        },
    )
}

/// Redact sensitive information from all `args`.
fn redact_sensitive_args(args: &[String]) -> Vec<String> {
    args.iter().map(|arg| redact_argument(arg)).collect()
}

/// Invoke the engine executable with the provided CLI settings.
///
/// The function forwards the working directory to the engine, names the plan
/// and report files, and streams the engine's standard output and error back
/// to the user.
///
/// # Errors
///
/// Returns an error if the engine fails to spawn or reports a non-zero exit
/// status.
pub fn run_engine(program: &Path, cli: &Cli, plan_file: &Path, report_file: &Path) -> Result<()> {
    let mut cmd = Command::new(program);
    if let Some(dir) = &cli.directory {
        // Canonicalise so the engine receives a stable absolute path even
        // after we change its working directory.
        let dir = fs::canonicalize(dir)
            .with_context(|| format!("resolving directory {}", dir.display()))?;
        cmd.current_dir(dir);
    }
    // Canonicalise the plan path so the engine resolves it correctly from
    // its working directory. Fall back to the original on failure so the
    // engine can surface a meaningful error.
    let plan_path = plan_file
        .canonicalize()
        .unwrap_or_else(|_| plan_file.to_path_buf());
    cmd.arg("apply");
    cmd.arg("--plan").arg(&plan_path);
    cmd.arg("--report").arg(report_file);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let program_name = cmd.get_program().to_string_lossy().into_owned();
    let args: Vec<String> = cmd
        .get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    let redacted_args = redact_sensitive_args(&args);
    info!("Running engine: {} {}", program_name, redacted_args.join(" "));

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning engine {program_name}"))?;
    let stdout = child.stdout.take().context("capture engine stdout")?;
    let stderr = child.stderr.take().context("capture engine stderr")?;

    let out_handle = thread::spawn(move || {
        let reader = BufReader::new(stdout);
        let mut handle = io::stdout();
        for line in reader.lines().map_while(Result::ok) {
            let _ = writeln!(handle, "{line}");
        }
    });
    let err_handle = thread::spawn(move || {
        let reader = BufReader::new(stderr);
        let mut handle = io::stderr();
        for line in reader.lines().map_while(Result::ok) {
            let _ = writeln!(handle, "{line}");
        }
    });

    let status = child.wait().context("waiting for engine")?;
    let _ = out_handle.join();
    let _ = err_handle.join();

    if status.success() {
        Ok(())
    } else {
        bail!("engine exited with {status}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_argument_preserves_non_sensitive_pairs() {
        assert_eq!(redact_argument("password=123"), "password=***REDACTED***");
        assert_eq!(redact_argument("path=/tmp"), "path=/tmp");
        assert_eq!(redact_argument("secrets.json"), "secrets.json");
        assert_eq!(redact_argument("  TOKEN = abc"), "TOKEN=***REDACTED***");
    }

    #[test]
    fn redact_sensitive_args_maps_every_argument() {
        let args = vec![String::from("apply"), String::from("token=abc")];
        let redacted = redact_sensitive_args(&args);
        assert_eq!(redacted, ["apply", "token=***REDACTED***"]);
    }
}
