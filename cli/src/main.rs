use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use genero_core::{
    analysis::{AnalysisContext, Project, check_module, resolve_deferred_searches},
    ast::{ModuleNode, ParseOutput, parse_module},
    config::GeneroConfig,
    context::get_context_members,
    token::{Diagnostic, TokenBuffer, Tokenizer, TokenizerOptions},
};
use serde::Serialize;
use tracing::{debug, info};

const DEFAULT_TRACE_FILTER: &str = "genero_core=info,genero_cli=info";

#[derive(Debug, Parser)]
#[command(name = "genero", author, version, about = "Genero 4GL front end", long_about = None)]
struct CliArgs {
    #[command(subcommand)]
    command: Commands,

    /// Settings file; defaults to `genero.toml` next to the source file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter, e.g. `genero_core=trace`; overrides RUST_LOG
    #[arg(long, global = true, value_name = "FILTER")]
    trace: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Parse and analyse a module, printing every diagnostic.
    Check {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Extra directories searched for `globals "file"` includes
        #[arg(long = "include", short = 'I', value_name = "DIR")]
        include_paths: Vec<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Dump the token stream.
    Tokens {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Keep whitespace, newlines and comments
        #[arg(long)]
        verbatim: bool,
    },
    /// Print the foldable block structure.
    Outline {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// List completion candidates at a byte offset.
    Complete {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        offset: usize,
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(filter: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter_expr = filter.map(str::to_string).or_else(|| std::env::var("RUST_LOG").ok());
    let builder = fmt().with_writer(std::io::stderr).with_target(true);
    let builder = match filter_expr.and_then(|expr| EnvFilter::try_new(expr).ok()) {
        Some(filter) => builder.with_env_filter(filter),
        None => builder.with_env_filter(DEFAULT_TRACE_FILTER),
    };
    let _ = builder.try_init();
}

fn read_file_content(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file '{}'", path.display()))
}

fn load_config(explicit: Option<&Path>, file: &Path) -> anyhow::Result<GeneroConfig> {
    let config = match explicit {
        Some(path) => GeneroConfig::load(path)?,
        None => GeneroConfig::discover(file.parent().unwrap_or(Path::new(".")))?,
    };
    if config.apply_context_map()? {
        info!("using context map from configuration");
    }
    Ok(config)
}

fn parse_file(file: &Path, config: &GeneroConfig) -> anyhow::Result<(String, ParseOutput)> {
    let source = read_file_content(file)?;
    let options = config.parser_options().with_file_path(file.display().to_string());
    let output = parse_module(&source, &options);
    Ok((source, output))
}

fn project_for(file: &Path, config: &GeneroConfig, extra: &[PathBuf]) -> Project {
    let mut search_paths: Vec<PathBuf> = file.parent().map(Path::to_path_buf).into_iter().collect();
    search_paths.extend(config.project.include_paths.iter().cloned());
    search_paths.extend(extra.iter().cloned());
    Project::new("cli")
        .with_search_paths(search_paths)
        .with_parser_options(config.parser_options())
}

#[derive(Serialize)]
struct DiagnosticOut<'a> {
    file: String,
    line: u32,
    column: u32,
    severity: String,
    kind: String,
    message: &'a str,
}

impl<'a> DiagnosticOut<'a> {
    fn new(module: &ModuleNode, file: &Path, diagnostic: &'a Diagnostic) -> Self {
        let location = module.location_of(diagnostic.span.start);
        Self {
            file: file.display().to_string(),
            line: location.line,
            column: location.column,
            severity: diagnostic.severity.to_string(),
            kind: format!("{:?}", diagnostic.kind).to_ascii_lowercase(),
            message: &diagnostic.message,
        }
    }
}

/// Returns whether any problem was found.
fn run_check(file: &Path, config: &GeneroConfig, include_paths: &[PathBuf], json: bool) -> anyhow::Result<bool> {
    let (_, output) = parse_file(file, config)?;
    let ParseOutput { module, mut diagnostics } = output;

    let project = project_for(file, config, include_paths);
    let ctx = AnalysisContext::new(&module)
        .with_project(&project)
        .with_settings(config.analysis_settings());
    let deferred = check_module(&ctx, &mut diagnostics);
    let unresolved = resolve_deferred_searches(deferred, &ctx, &mut diagnostics);
    debug!(unresolved = unresolved.len(), "deferred searches resolved");
    diagnostics.sort_by_key(|d| d.span.start);

    let rows: Vec<DiagnosticOut> = diagnostics.iter().map(|d| DiagnosticOut::new(&module, file, d)).collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in &rows {
            println!("{}:{}:{}: {}: {}", row.file, row.line, row.column, row.severity, row.message);
        }
    }
    Ok(!rows.is_empty())
}

fn run_tokens(file: &Path, verbatim: bool) -> anyhow::Result<()> {
    let source = read_file_content(file)?;
    let options = if verbatim {
        TokenizerOptions::verbatim()
    } else {
        TokenizerOptions::default()
    };
    for token in Tokenizer::tokenize_with(&source, options) {
        println!("{}\t{:?}\t{:?}\t{:?}", token.span, token.category, token.kind, token.value);
    }
    Ok(())
}

fn run_outline(file: &Path, config: &GeneroConfig) -> anyhow::Result<()> {
    let (_, output) = parse_file(file, config)?;
    for region in output.module.outline_regions() {
        let start = output.module.location_of(region.span.start);
        let end = output.module.location_of(region.span.end);
        let marker = if region.is_complete { "" } else { " (incomplete)" };
        println!(
            "{}{} {}-{}{}",
            "  ".repeat(region.depth),
            region.label,
            start.line,
            end.line,
            marker
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct CandidateOut {
    name: String,
    kind: String,
    documentation: String,
}

fn run_complete(file: &Path, offset: usize, config: &GeneroConfig, json: bool) -> anyhow::Result<()> {
    let (source, output) = parse_file(file, config)?;
    if offset > source.len() {
        anyhow::bail!("offset {} is past the end of {} ({} bytes)", offset, file.display(), source.len());
    }
    let tokens = TokenBuffer::from_source(&source);
    let project = project_for(file, config, &[]);
    let ctx = AnalysisContext::new(&output.module)
        .at_offset(offset)
        .with_project(&project)
        .with_settings(config.analysis_settings());
    let candidates: Vec<CandidateOut> = get_context_members(offset, &tokens, &ctx)
        .into_iter()
        .map(|member| CandidateOut {
            kind: format!("{:?}", member.member_type()).to_ascii_lowercase(),
            documentation: member.documentation().to_string(),
            name: member.name,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
    } else {
        for candidate in &candidates {
            println!("{}\t{}", candidate.name, candidate.kind);
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.trace.as_deref());

    match &args.command {
        Commands::Check {
            file,
            include_paths,
            json,
        } => {
            let config = load_config(args.config.as_deref(), file)?;
            if run_check(file, &config, include_paths, *json)? {
                std::process::exit(1);
            }
        }
        Commands::Tokens { file, verbatim } => run_tokens(file, *verbatim)?,
        Commands::Outline { file } => {
            let config = load_config(args.config.as_deref(), file)?;
            run_outline(file, &config)?;
        }
        Commands::Complete { file, offset, json } => {
            let config = load_config(args.config.as_deref(), file)?;
            run_complete(file, *offset, &config, *json)?;
        }
    }
    Ok(())
}
