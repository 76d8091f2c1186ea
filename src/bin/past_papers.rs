use std::fs;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use past_papers::app::{App, ProgressSink};
use past_papers::config::ConfigLoader;
use past_papers::domain::{DownloadRecord, FormLevel, ManifestSource, Paper};
use past_papers::downloads::PdfHttpClient;
use past_papers::error::PapersError;
use past_papers::manifest::ManifestHttpClient;
use past_papers::materials::validate_material;
use past_papers::output::{JsonOutput, LogProgress, OutputMode, format_bytes};
use past_papers::state::PapersState;
use past_papers::store::Store;

type HttpApp = App<ManifestHttpClient, PdfHttpClient>;

#[derive(Parser)]
#[command(name = "past-papers")]
#[command(about = "Browse past exam papers and keep offline copies of their PDFs")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true, help = "Config file (defaults to ./past-papers.json when present)")]
    config: Option<String>,

    #[arg(long, global = true, help = "Override the app storage directory")]
    data_dir: Option<Utf8PathBuf>,

    #[arg(long, global = true, help = "Print results as JSON")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Synchronize the paper manifest")]
    Sync,
    #[command(about = "List forms that have papers")]
    Forms,
    #[command(about = "List subjects for a form")]
    Subjects(FormArgs),
    #[command(about = "List years for a form and subject")]
    Years(SubjectArgs),
    #[command(about = "List papers for a form, subject and year")]
    Papers(YearArgs),
    #[command(about = "Search papers by subject")]
    Search { term: String },
    #[command(about = "Show a paper and its offline status")]
    Show { paper_id: String },
    #[command(about = "Download a paper for offline reading")]
    Save { paper_id: String },
    #[command(about = "Remove the offline copy of a paper")]
    Remove { paper_id: String },
    #[command(about = "List offline copies")]
    Downloads,
    #[command(about = "Validate an admin material submission (JSON file)")]
    ValidateMaterial { path: Utf8PathBuf },
}

#[derive(Args)]
struct FormArgs {
    #[arg(long)]
    form: FormLevel,
}

#[derive(Args)]
struct SubjectArgs {
    #[arg(long)]
    form: FormLevel,
    #[arg(long)]
    subject: String,
}

#[derive(Args)]
struct YearArgs {
    #[arg(long)]
    form: FormLevel,
    #[arg(long)]
    subject: String,
    #[arg(long)]
    year: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncSummary<'a> {
    source: ManifestSource,
    updated_at: &'a str,
    papers: usize,
    notice: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PaperDetail<'a> {
    paper: &'a Paper,
    offline: Option<DownloadRecord>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<PapersError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &PapersError) -> u8 {
    match error {
        PapersError::PaperNotFound(_) => 2,
        err if err.is_network() => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    if let Commands::ValidateMaterial { path } = &cli.command {
        return run_validate_material(path);
    }

    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let store = match cli.data_dir.or(config.data_dir) {
        Some(root) => Store::new_with_root(root),
        None => Store::new()?,
    };
    let app = App::new(
        store,
        ManifestHttpClient::new()?,
        PdfHttpClient::new()?,
        config.manifest_url,
    );
    let mut state = PapersState::new();
    let sink = LogProgress;

    match cli.command {
        Commands::Sync => run_sync(&app, &mut state, &sink, mode),
        Commands::Forms => {
            app.refresh(&mut state, &sink);
            let forms: Vec<u8> = state.forms().into_iter().map(FormLevel::get).collect();
            print_list(mode, &forms)
        }
        Commands::Subjects(args) => {
            app.refresh(&mut state, &sink);
            print_list(mode, &state.subjects(args.form))
        }
        Commands::Years(args) => {
            app.refresh(&mut state, &sink);
            print_list(mode, &state.years(args.form, &args.subject))
        }
        Commands::Papers(args) => {
            app.refresh(&mut state, &sink);
            app.load_downloads(&mut state)?;
            let papers = state.papers_for(args.form, &args.subject, args.year);
            print_papers(mode, &state, &papers)
        }
        Commands::Search { term } => {
            app.refresh(&mut state, &sink);
            app.load_downloads(&mut state)?;
            let papers = state.search(&term);
            print_papers(mode, &state, &papers)
        }
        Commands::Show { paper_id } => run_show(&app, &mut state, &sink, mode, &paper_id),
        Commands::Save { paper_id } => {
            app.refresh(&mut state, &sink);
            app.load_downloads(&mut state)?;
            let record = app.save_offline(&mut state, &paper_id, &sink)?;
            print_record(mode, &record)
        }
        Commands::Remove { paper_id } => {
            app.remove_offline(&mut state, &paper_id, &sink)?;
            match mode {
                OutputMode::Json => JsonOutput::print(&serde_json::json!({ "removed": paper_id }))
                    .into_diagnostic(),
                OutputMode::Human => {
                    println!("removed offline copy of {paper_id}");
                    Ok(())
                }
            }
        }
        Commands::Downloads => {
            app.load_downloads(&mut state)?;
            match mode {
                OutputMode::Json => JsonOutput::print(&state.downloads).into_diagnostic(),
                OutputMode::Human => {
                    for record in state.downloads.values() {
                        print_record(mode, record)?;
                    }
                    Ok(())
                }
            }
        }
        Commands::ValidateMaterial { .. } => Ok(()),
    }
}

fn run_sync(
    app: &HttpApp,
    state: &mut PapersState,
    sink: &dyn ProgressSink,
    mode: OutputMode,
) -> miette::Result<()> {
    app.refresh(state, sink);
    let summary = SyncSummary {
        source: state.source,
        updated_at: &state.last_updated_at,
        papers: state.papers.len(),
        notice: state.notice.as_deref(),
    };
    match mode {
        OutputMode::Json => JsonOutput::print(&summary).into_diagnostic(),
        OutputMode::Human => {
            println!("source:  {}", summary.source);
            println!("updated: {}", summary.updated_at);
            println!("papers:  {}", summary.papers);
            if let Some(notice) = summary.notice {
                eprintln!("{notice}");
            }
            Ok(())
        }
    }
}

fn run_show(
    app: &HttpApp,
    state: &mut PapersState,
    sink: &dyn ProgressSink,
    mode: OutputMode,
    paper_id: &str,
) -> miette::Result<()> {
    app.refresh(state, sink);
    let offline = app.offline_record(state, paper_id)?;
    let paper = state
        .paper(paper_id)
        .ok_or_else(|| PapersError::PaperNotFound(paper_id.to_string()))?;

    match mode {
        OutputMode::Json => JsonOutput::print(&PaperDetail { paper, offline }).into_diagnostic(),
        OutputMode::Human => {
            println!("{}", paper.title);
            println!("  id:      {}", paper.id);
            println!("  form:    {}", paper.form);
            println!("  subject: {}", paper.subject);
            println!("  year:    {}", paper.year);
            println!("  size:    {}", format_bytes(paper.size_bytes));
            println!("  updated: {}", paper.updated_at);
            println!("  url:     {}", paper.pdf_url);
            match offline {
                Some(record) => println!("  offline: {} ({})", record.local_uri, record.downloaded_at),
                None => println!("  offline: no"),
            }
            Ok(())
        }
    }
}

fn run_validate_material(path: &Utf8PathBuf) -> miette::Result<()> {
    let content = fs::read_to_string(path.as_std_path())
        .map_err(|err| PapersError::Filesystem(format!("read {path}: {err}")))?;
    let input: serde_json::Value = serde_json::from_str(&content)
        .map_err(|err| PapersError::InvalidMaterial(format!("request body must be valid JSON: {err}")))?;
    let material = validate_material(&input)?;
    JsonOutput::print(&material).into_diagnostic()
}

fn print_list<T: Serialize + std::fmt::Display>(mode: OutputMode, items: &[T]) -> miette::Result<()> {
    match mode {
        OutputMode::Json => JsonOutput::print(items).into_diagnostic(),
        OutputMode::Human => {
            for item in items {
                println!("{item}");
            }
            Ok(())
        }
    }
}

fn print_papers(mode: OutputMode, state: &PapersState, papers: &[&Paper]) -> miette::Result<()> {
    match mode {
        OutputMode::Json => JsonOutput::print(papers).into_diagnostic(),
        OutputMode::Human => {
            for paper in papers {
                let marker = if state.is_saved(&paper.id) { " [offline]" } else { "" };
                println!(
                    "{}  F{} {} {}  {} ({}){marker}",
                    paper.id,
                    paper.form,
                    paper.subject,
                    paper.year,
                    paper.title,
                    format_bytes(paper.size_bytes)
                );
            }
            Ok(())
        }
    }
}

fn print_record(mode: OutputMode, record: &DownloadRecord) -> miette::Result<()> {
    match mode {
        OutputMode::Json => JsonOutput::print(record).into_diagnostic(),
        OutputMode::Human => {
            println!(
                "{}  {}  {}  {}",
                record.paper_id,
                record.local_uri,
                format_bytes(record.size_bytes),
                record.downloaded_at
            );
            Ok(())
        }
    }
}
