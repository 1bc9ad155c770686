//! hmm-complexity CLI entry point.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use hc_config::{
    get_preset, list_presets, load_config, validate_search_config, ConfigSource, PresetName,
    RecordFormat, SearchConfig,
};
use hc_core::exit_codes::ExitCode;
use hc_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use hc_core::search::{ComplexityReport, ComplexitySearch, SearchError};
use hc_core::witness::{witness_score_table, ScoreTable};
use hc_core::words::unique_words;
use hc_core::{log_event, HiddenMarkovLayer};
use hc_math::ProbabilityMatrix;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "hmm-complexity")]
#[command(author, version, about = "Estimate the HMM complexity of words", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

#[derive(Args, Debug)]
struct GlobalOpts {
    /// Search config file (TOML or JSON)
    #[arg(long, global = true, conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Start from a named preset (quick, standard, thorough)
    #[arg(long, global = true)]
    preset: Option<PresetName>,

    /// Alphabet size; symbols are the digits 0..size-1
    #[arg(long, global = true)]
    size: Option<usize>,

    /// Seed for the search RNG
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Random restarts per state count
    #[arg(long, global = true)]
    hmm_searches: Option<usize>,

    /// Baum-Welch epochs per restart
    #[arg(long, global = true)]
    epochs: Option<usize>,

    /// Extra single epochs for a layer that is not yet a witness
    #[arg(long, global = true)]
    epoch_searches: Option<usize>,

    /// Slack in the witness test
    #[arg(long, global = true)]
    epsilon: Option<f64>,

    /// Highest state count to try (default: word length)
    #[arg(long, global = true)]
    max_complexity: Option<usize>,

    /// Record store encoding (jsonl, padded)
    #[arg(long, global = true)]
    record_format: Option<RecordFormat>,

    /// Directory for record stores
    #[arg(long, global = true)]
    record_dir: Option<PathBuf>,

    /// Leave witness parameters out of text output
    #[arg(long, global = true)]
    no_witness: bool,

    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the complexity of one word
    Word(WordArgs),
    /// Compute the complexity of every word of a length, up to relabelling symbols
    All(AllArgs),
    /// Score all binary words under the hand-built 0^n 1 layer
    Witness(WitnessArgs),
    /// List search presets
    Presets,
}

#[derive(Args, Debug)]
struct WordArgs {
    /// Word over the digits 0..size-1
    word: String,

    /// Store failed HMMs and re-score this proportion of them after each level
    #[arg(long, num_args = 0..=1, default_missing_value = "0.5", value_name = "PROPORTION")]
    verify: Option<f64>,
}

#[derive(Args, Debug)]
struct AllArgs {
    /// Word length
    n: usize,
}

#[derive(Args, Debug)]
struct WitnessArgs {
    /// Length of the scored words
    #[arg(long)]
    n: usize,

    /// States in the witnessing layer
    #[arg(long)]
    states: usize,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            let _ = err.print();
            std::process::exit(code.as_i32());
        }
    };

    let derived_format = match cli.global.format {
        OutputFormat::Json => Some(LogFormat::Jsonl),
        OutputFormat::Text => None,
    };
    let log_config = LogConfig::from_env(
        cli.global.log_level,
        cli.global.log_format.or(derived_format),
    );
    init_logging(&log_config);

    let ctx = LogContext::new(generate_run_id());
    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_STARTED,
        Stage::Init,
        "hmm-complexity started"
    );

    let exit_code = match &cli.command {
        Commands::Word(args) => run_word(&cli.global, args, &ctx),
        Commands::All(args) => run_all(&cli.global, args, &ctx),
        Commands::Witness(args) => run_witness(&cli.global, args),
        Commands::Presets => run_presets(&cli.global),
    };

    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_FINISHED,
        Stage::Report,
        "hmm-complexity finished",
        exit_code = exit_code.as_i32()
    );
    std::process::exit(exit_code.as_i32());
}

/// Base config (preset or resolved file) with CLI flags applied on top.
fn resolve_search_config(global: &GlobalOpts, ctx: &LogContext) -> Result<SearchConfig, ExitCode> {
    let mut config = match global.preset {
        Some(preset) => get_preset(preset),
        None => {
            let loaded = load_config(global.config.as_deref()).map_err(|e| {
                eprintln!("hmm-complexity: {}", e);
                ExitCode::ConfigError
            })?;
            match loaded.source {
                ConfigSource::BuiltinDefault => log_event!(
                    ctx,
                    DEBUG,
                    event_names::CONFIG_DEFAULT_USED,
                    Stage::Init,
                    "no config file found, using defaults"
                ),
                source => log_event!(
                    ctx,
                    INFO,
                    event_names::CONFIG_LOADED,
                    Stage::Init,
                    "config loaded",
                    source = tracing::field::debug(source),
                    path = tracing::field::debug(&loaded.path)
                ),
            }
            loaded.config
        }
    };

    if let Some(size) = global.size {
        config.size = size;
    }
    if let Some(seed) = global.seed {
        config.seed = Some(seed);
    }
    if let Some(n) = global.hmm_searches {
        config.hmm_searches = n;
    }
    if let Some(n) = global.epochs {
        config.epochs = n;
    }
    if let Some(n) = global.epoch_searches {
        config.epoch_searches = n;
    }
    if let Some(eps) = global.epsilon {
        config.epsilon = eps;
    }
    if let Some(cap) = global.max_complexity {
        config.max_complexity = Some(cap);
    }
    if let Some(format) = global.record_format {
        config.record_format = format;
    }
    if let Some(dir) = &global.record_dir {
        config.record_dir = dir.clone();
    }
    if global.no_witness {
        config.print_witness = false;
    }

    validate_search_config(&config).map_err(|e| {
        eprintln!("hmm-complexity: invalid configuration: {}", e);
        ExitCode::ConfigError
    })?;
    Ok(config)
}

fn fail(err: &SearchError) -> ExitCode {
    eprintln!("hmm-complexity: {}", err);
    err.exit_code()
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::Clean
        }
        Err(e) => {
            eprintln!("hmm-complexity: failed to serialize output: {}", e);
            ExitCode::InternalError
        }
    }
}

fn run_word(global: &GlobalOpts, args: &WordArgs, ctx: &LogContext) -> ExitCode {
    let mut config = match resolve_search_config(global, ctx) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Some(proportion) = args.verify {
        config = config.with_verification(proportion);
        if let Err(e) = validate_search_config(&config) {
            eprintln!("hmm-complexity: invalid configuration: {}", e);
            return ExitCode::ConfigError;
        }
    }

    let print_witness = config.print_witness;
    let mut search = match ComplexitySearch::new(config) {
        Ok(s) => s.with_context(ctx.clone()),
        Err(e) => return fail(&e),
    };
    match search.run(&args.word) {
        Ok(report) => match global.format {
            OutputFormat::Json => print_json(&report),
            OutputFormat::Text => {
                print!("{}", render_report(&report, print_witness));
                ExitCode::Clean
            }
        },
        Err(e) => fail(&e),
    }
}

fn run_all(global: &GlobalOpts, args: &AllArgs, ctx: &LogContext) -> ExitCode {
    let config = match resolve_search_config(global, ctx) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let print_witness = config.print_witness;
    let size = config.size;
    let mut search = match ComplexitySearch::new(config) {
        Ok(s) => s.with_context(ctx.clone()),
        Err(e) => return fail(&e),
    };

    let mut reports = Vec::new();
    for word in unique_words(args.n, size) {
        match search.run_word(&word) {
            Ok(report) => {
                if global.format == OutputFormat::Text {
                    print!("{}", render_report(&report, print_witness));
                    println!("{}", "#".repeat(64));
                }
                reports.push(report);
            }
            Err(e) => return fail(&e),
        }
    }
    match global.format {
        OutputFormat::Json => print_json(&reports),
        OutputFormat::Text => ExitCode::Clean,
    }
}

fn run_witness(global: &GlobalOpts, args: &WitnessArgs) -> ExitCode {
    let table = match witness_score_table(args.n, args.states) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("hmm-complexity: {}", e);
            return ExitCode::ArgsError;
        }
    };
    match global.format {
        OutputFormat::Json => print_json(&table),
        OutputFormat::Text => {
            print!("{}", render_table(&table));
            ExitCode::Clean
        }
    }
}

fn run_presets(global: &GlobalOpts) -> ExitCode {
    let presets = list_presets();
    match global.format {
        OutputFormat::Json => print_json(&presets),
        OutputFormat::Text => {
            for p in presets {
                println!("{:<10} {}", p.name, p.description);
            }
            ExitCode::Clean
        }
    }
}

fn render_report(report: &ComplexityReport, print_witness: bool) -> String {
    let mut out = format!(
        "complexity of {} (alphabet size {}): {}\n",
        report.word, report.size, report.complexity
    );
    if let Some(witness) = report.witness.as_ref().filter(|_| print_witness) {
        out.push_str(&format!(
            "witnessing HMM with {} states:\n",
            witness.layer.n_states()
        ));
        out.push_str(&render_layer(&witness.layer));
        out.push_str(&format!("emission probability: {}\n", witness.score));
    }
    out
}

fn render_layer(layer: &HiddenMarkovLayer) -> String {
    let mut out = String::from("transition matrix\n");
    out.push_str(&render_matrix(layer.transition()));
    out.push_str("\nemission matrix\n");
    out.push_str(&render_matrix(layer.emission()));
    out.push_str("\ninitial state probability\n");
    let labels: Vec<String> = layer
        .initial()
        .labels()
        .iter()
        .map(|l| format!("{:>10}", l))
        .collect();
    let values: Vec<String> = layer
        .initial()
        .values()
        .iter()
        .map(|v| format!("{:>10.6}", v))
        .collect();
    out.push_str(&format!("    {}\n    {}\n\n", labels.concat(), values.concat()));
    out
}

fn render_matrix(matrix: &ProbabilityMatrix) -> String {
    let header: Vec<String> = matrix
        .column_labels()
        .iter()
        .map(|l| format!("{:>10}", l))
        .collect();
    let mut out = format!("    {}\n", header.concat());
    for (label, row) in matrix.row_labels().iter().zip(matrix.rows()) {
        let cells: Vec<String> = row.values().iter().map(|v| format!("{:>10.6}", v)).collect();
        out.push_str(&format!("{:<4}{}\n", label, cells.concat()));
    }
    out
}

fn render_table(table: &ScoreTable) -> String {
    let mut out = String::new();
    for (word, score) in &table.scores {
        out.push_str(&format!("word: {}  score: {}\n", word, score));
    }
    out.push_str(&format!(
        "most probable word: {} with score {}\n",
        table.best, table.best_score
    ));
    out
}
