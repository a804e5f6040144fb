mod config;
mod opener;
mod render;
mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use report::RenderedReport;
use report::link::LinkIndex;
use report::model::ReportDocument;
use viewer::{ChannelEffect, CitationOverlay, LogService};

use crate::config::AppConfig;
use crate::opener::SystemLinkOpener;

const SUBCOMMANDS: &[&str] = &["render", "check", "cite", "progress", "test", "help"];

#[derive(Parser)]
#[command(name = "report", version, about = "Community report viewer")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a report with its footnotes
    Render(RenderArgs),

    /// Report unresolved or malformed footnotes
    Check(CheckArgs),

    /// Show the citation behind footnote N
    Cite(CiteArgs),

    /// Replay recorded progress frames through the progress channel
    Progress(ProgressArgs),

    /// Run .report.md fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RenderArgs {
    /// JSON file with `full_report` and `links` (or `report` and `links`)
    file: String,

    /// Dump the parsed blocks
    #[arg(long)]
    ast: bool,

    /// Print the one-line-per-block outline
    #[arg(long)]
    outline: bool,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// JSON report file
    file: String,
}

#[derive(clap::Args)]
struct CiteArgs {
    /// JSON report file
    file: String,

    /// Footnote number
    number: u64,

    /// Open the source post in the browser
    #[arg(long)]
    open: bool,
}

#[derive(clap::Args)]
struct ProgressArgs {
    /// File with one WebSocket text frame per line; `#close` marks a dropped connection
    frames: String,

    /// Session the frames were recorded for
    #[arg(short, long, default_value = "replay")]
    session: String,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .report.md file or a directory searched recursively
    path: String,
}

/// A report file registered with a codespan file database.
struct LoadedReport {
    document: ReportDocument,
    files: SimpleFiles<String, String>,
    rendered: RenderedReport,
}

fn main() {
    init_tracing();

    // `report file.json` works like `report render file.json`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = first_positional(&args) {
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "render".to_string());
        }
    }

    let cli = Cli::parse_from(&args);

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };
    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    debug!(
        profile = ?config.profile,
        api = config.api_base_url(),
        timeout = ?config.api_timeout(),
        "config loaded"
    );
    let mut log = config.log_service();

    let exit_code = match cli.command {
        Command::Render(args) => do_render(args, color_choice, &mut log),
        Command::Check(args) => do_check(args, color_choice, &mut log),
        Command::Cite(args) => do_cite(args, color_choice, &config, &mut log),
        Command::Progress(args) => do_progress(args, &config, &mut log),
        Command::Test(args) => do_test(args, color_choice),
    };
    process::exit(exit_code);
}

/// Index of the first argument that is not a flag or a flag's value.
fn first_positional(args: &[String]) -> Option<usize> {
    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        if arg == "--config" {
            i += 2;
            continue;
        }
        if !arg.starts_with('-') {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_report(file: &str, log: &mut LogService) -> Result<LoadedReport, String> {
    let content =
        std::fs::read_to_string(file).map_err(|e| format!("cannot read '{}': {}", file, e))?;
    let document: ReportDocument = serde_json::from_str(&content)
        .map_err(|e| format!("'{}' is not a report document: {}", file, e))?;

    let mut files = SimpleFiles::new();
    let file_id = files.add(file.to_string(), document.full_report().to_string());

    let links = LinkIndex::new(document.links());
    let rendered = report::parser::Parser::new(document.full_report().to_string(), file_id)
        .render(&links);

    log.info(
        "report rendered",
        Some(json!({
            "file": file,
            "blocks": rendered.blocks.len(),
            "links": links.len(),
            "unresolved": rendered.unresolved_count(),
        })),
    );

    Ok(LoadedReport {
        document,
        files,
        rendered,
    })
}

fn load_or_exit(file: &str, log: &mut LogService) -> LoadedReport {
    match load_report(file, log) {
        Ok(loaded) => loaded,
        Err(e) => {
            log.error(e.clone(), None);
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

fn emit_warnings(color_choice: ColorChoice, loaded: &LoadedReport) {
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    for warning in &loaded.rendered.warnings {
        let diagnostic = warning.to_diagnostic();
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, &loaded.files, &diagnostic);
    }
}

fn do_render(args: RenderArgs, color_choice: ColorChoice, log: &mut LogService) -> i32 {
    let loaded = load_or_exit(&args.file, log);

    if args.ast {
        println!("{:#?}", loaded.rendered.blocks);
        return 0;
    }
    if args.outline {
        print!("{}", loaded.rendered.outline());
        return 0;
    }

    let stdout = StandardStream::stdout(color_choice);
    let mut out = stdout.lock();
    let written = match loaded.document.report() {
        Some(report) => render::write_header(&mut out, report),
        None => Ok(()),
    }
    .and_then(|()| render::write_report(&mut out, &loaded.rendered));
    drop(out);

    if let Err(e) = written {
        eprintln!("error: cannot write output: {}", e);
        return 1;
    }
    emit_warnings(color_choice, &loaded);
    0
}

fn do_check(args: CheckArgs, color_choice: ColorChoice, log: &mut LogService) -> i32 {
    let loaded = load_or_exit(&args.file, log);
    emit_warnings(color_choice, &loaded);

    let unresolved = loaded.rendered.unresolved_count();
    if unresolved > 0 {
        eprintln!("{} unresolved footnote reference(s)", unresolved);
        return 1;
    }
    eprintln!("ok: {} footnotes resolve", args.file);
    0
}

fn do_cite(
    args: CiteArgs,
    color_choice: ColorChoice,
    config: &AppConfig,
    log: &mut LogService,
) -> i32 {
    if !config.features.citation_details {
        eprintln!("error: citation details are disabled in the config");
        return 1;
    }
    let loaded = load_or_exit(&args.file, log);

    let mut overlay = CitationOverlay::new();
    if !overlay.activate_number(&loaded.rendered, args.number) {
        log.warning(
            "footnote cannot be opened",
            Some(json!({ "number": args.number })),
        );
        eprintln!(
            "footnote [{}] does not appear in the report or has no matching link",
            args.number
        );
        return 1;
    }

    let Some(detail) = overlay.detail() else {
        return 1;
    };
    let stdout = StandardStream::stdout(color_choice);
    if let Err(e) = render::write_detail(&mut stdout.lock(), &detail) {
        eprintln!("error: cannot write output: {}", e);
        return 1;
    }

    if args.open && !opener::open_citation(&overlay, &SystemLinkOpener, log) {
        eprintln!("footnote [{}] has no source URL to open", args.number);
    }
    overlay.dismiss();
    0
}

fn do_progress(args: ProgressArgs, config: &AppConfig, log: &mut LogService) -> i32 {
    let content = match std::fs::read_to_string(&args.frames) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.frames, e);
            return 1;
        }
    };

    let mut channel = config.progress_channel();
    channel.on_progress(|update| {
        println!("[{:>3}%] {}: {}", update.progress, update.stage, update.message);
    });
    channel.on_disconnect(|| eprintln!("-- connection dropped"));

    let mut socket = None;
    for effect in channel.connect(args.session.as_str()) {
        if let ChannelEffect::Open { url, socket: id } = effect {
            eprintln!("-- connecting to {}", url);
            socket = Some(id);
        }
    }
    let Some(mut socket) = socket else {
        return 1;
    };
    channel.on_open(socket);

    let mut bad_frames = 0usize;
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "#close" {
            // Recorded reconnects happen immediately; the delay is only reported.
            if let Some(ChannelEffect::ScheduleReconnect { token, delay }) =
                channel.on_close(socket)
            {
                eprintln!("-- reconnecting after {:?}", delay);
                if let Some(ChannelEffect::Open { socket: id, .. }) =
                    channel.on_reconnect_timer(token)
                {
                    socket = id;
                    channel.on_open(socket);
                }
            }
            continue;
        }
        if let Err(e) = channel.on_message(line) {
            bad_frames += 1;
            log.warning(
                "skipped progress frame",
                Some(json!({ "line": index + 1, "error": e.to_string() })),
            );
        }
    }
    channel.disconnect();

    if bad_frames > 0 {
        eprintln!("{} frame(s) could not be decoded", bad_frames);
        return 1;
    }
    0
}

fn do_test(args: TestArgs, color_choice: ColorChoice) -> i32 {
    let stderr = StandardStream::stderr(color_choice);
    match test_runner::run_tests(Path::new(&args.path), &mut stderr.lock()) {
        Ok(summary) => summary.exit_code(),
        Err(e) => {
            eprintln!("error: cannot write test output: {}", e);
            1
        }
    }
}
