use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;
use tracing_subscriber::EnvFilter;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::image::PageContext;
use crate::output::{self, OutputFormat};
use crate::pagination::DEFAULT_MAX_SHOWN;
use crate::query::{self, QueryRequest, DEFAULT_LIMIT};
use crate::store::{RecordSource, RecordStore, DEFAULT_TIMEOUT_SECONDS};

fn print_banner() {
    println!(
        "{} {}",
        "prodlist".bold().white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!();
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

/// Clamps a user supplied page or limit to at least 1.
fn clamp_positive(value: i64) -> usize {
    usize::try_from(value.max(1)).unwrap_or(usize::MAX)
}

fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbose: u8, no_color: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .try_init();
}

#[derive(Clone, Debug)]
struct RunConfig {
    source: RecordSource,
    request: QueryRequest,
    max_shown: usize,
    page_context: PageContext,
    timeout: Duration,
    output: Option<String>,
    output_format: OutputFormat,
    no_color: bool,
    verbose: u8,
}

fn resolve_source(args: &CliArgs, cfg: &ConfigFile) -> Result<RecordSource, String> {
    if let Some(input) = args.input.as_deref() {
        return Ok(RecordSource::FilePath(input.to_string()));
    }
    if let Some(url) = args.url.as_deref() {
        return Ok(RecordSource::Url(url.trim().to_string()));
    }
    match (cfg.input.as_deref(), cfg.url.as_deref()) {
        (Some(_), Some(_)) => Err("config sets both input and url, keep only one".to_string()),
        (Some(input), None) => Ok(RecordSource::FilePath(input.to_string())),
        (None, Some(url)) => Ok(RecordSource::Url(url.trim().to_string())),
        (None, None) => Err(
            "no records source: pass --input or --url (or set input/url in the config)".to_string(),
        ),
    }
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let source = resolve_source(&args, &cfg)?;

    let (sort_field, sort_dir) = query::parse_sort_spec(args.sort.as_deref().unwrap_or_default())
        .map_err(|e| format!("invalid --sort: {e}"))?;
    let page = args.page.map(clamp_positive).unwrap_or(1);
    let limit = match args.limit {
        Some(limit) => clamp_positive(limit),
        None => cfg.limit.unwrap_or(DEFAULT_LIMIT).max(1),
    };
    let request = QueryRequest {
        page,
        limit,
        search: args.search,
        sort_field,
        sort_dir,
    };

    let max_shown = args
        .max_shown
        .or(cfg.max_shown)
        .unwrap_or(DEFAULT_MAX_SHOWN);

    let page_context = match args.origin.or(cfg.origin) {
        Some(origin) => PageContext::from_origin(&origin)?,
        None => PageContext::default(),
    };

    let timeout = args
        .timeout
        .or(cfg.timeout)
        .unwrap_or(DEFAULT_TIMEOUT_SECONDS)
        .max(1);

    let output = args.output.or(cfg.output).filter(|p| !p.trim().is_empty());
    let format_raw = args.output_format.or(cfg.output_format);
    let output_format = match format_raw.as_deref() {
        Some(raw) => OutputFormat::parse(raw)
            .ok_or_else(|| format!("invalid output format '{raw}', expected text, json or html"))?,
        None => output
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or(OutputFormat::Text),
    };

    Ok(RunConfig {
        source,
        request,
        max_shown,
        page_context,
        timeout: Duration::from_secs(timeout as u64),
        output,
        output_format,
        no_color,
        verbose: args.verbose,
    })
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    let now = Instant::now();
    let chatty = run.output.is_some() || run.output_format == OutputFormat::Text;

    if chatty {
        print_banner();
        format_kv_line("Source", &run.source.describe());
        if !run.request.search.is_empty() {
            format_kv_line("Search", &run.request.search);
        }
        if let Some(field) = run.request.sort_field {
            format_kv_line("Sort", &format!("{field:?} {:?}", run.request.sort_dir).to_lowercase());
        }
        format_kv_line(
            "Page",
            &format!("{} (limit {})", run.request.page(), run.request.limit()),
        );
        println!();
    }

    let store = RecordStore::with_timeout(run.source.clone(), run.timeout);
    let result = store.query(&run.request).await;
    let page = output::build_page(&result, &run.request, &run.page_context, run.max_shown);
    let rendered = output::render(&page, run.output_format);

    match run.output.as_ref() {
        Some(outfile_path) => {
            let outfile_path = config::expand_tilde(outfile_path);
            let mut outfile = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&outfile_path)
                .await
                .map_err(|e| format!("failed to open output file: {e}"))?;
            outfile
                .write_all(&rendered)
                .await
                .map_err(|_| "failed to write output file".to_string())?;
            format_kv_line("Output", &outfile_path.display().to_string());
            format_kv_line("Showing", &page.info);
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(&rendered)
                .await
                .map_err(|e| format!("failed to write output: {e}"))?;
            stdout
                .flush()
                .await
                .map_err(|e| format!("failed to write output: {e}"))?;
        }
    }

    if chatty {
        println!();
        println!(
            ":: Completed :: {} of {} products in {}ms ::",
            page.rows.len(),
            page.total,
            now.elapsed().as_millis()
        );
    }

    Ok(())
}

fn init_config_file(args: &CliArgs) -> Result<(), String> {
    let path: PathBuf = match args.config.as_deref() {
        Some(p) => config::expand_tilde(p),
        None => config::default_config_path()
            .ok_or_else(|| "could not determine home directory for config".to_string())?,
    };
    config::ensure_default_config_file(&path)?;
    println!("config: {}", path.display());
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    if args.init_config {
        return init_config_file(&args);
    }

    let cfg = match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    if run.no_color {
        colored::control::set_override(false);
    }
    init_logging(run.verbose, run.no_color);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}
