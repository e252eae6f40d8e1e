use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use dp_aligner::input::parse_dna;
use dp_aligner::{
    compare_modes, Aligner, AlignerConfig, AlignmentMode, AlignmentOutcome, BatchAligner,
    FillStrategy, Score, ScoreMatrix, ScoringScheme, Sequence,
};

#[derive(Parser)]
#[command(name = "dp-aligner")]
#[command(about = "Needleman-Wunsch and Smith-Waterman alignment of DNA sequences")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Align two sequences
    Align {
        seq1: String,
        seq2: String,
        #[command(flatten)]
        overrides: Overrides,
        /// Also print the DP matrix
        #[arg(long)]
        matrix: bool,
        #[arg(long)]
        json: bool,
    },
    /// Run global and local alignment side by side
    Compare {
        seq1: String,
        seq2: String,
        #[command(flatten)]
        overrides: Overrides,
        #[arg(long)]
        json: bool,
    },
    /// Print the matrix fill one cell at a time
    Steps {
        seq1: String,
        seq2: String,
        #[command(flatten)]
        overrides: Overrides,
        /// Stop after this many cells
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Align every pair in a file (two sequences per line)
    Batch {
        input: PathBuf,
        #[command(flatten)]
        overrides: Overrides,
        /// Number of worker threads
        #[arg(short, long)]
        workers: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML
    Config {
        #[command(flatten)]
        overrides: Overrides,
    },
}

#[derive(Args)]
struct Overrides {
    /// Alignment mode: global or local
    #[arg(long)]
    mode: Option<AlignmentMode>,

    /// Score for equal symbols
    #[arg(long = "match", value_parser = ScoringScheme::parse_parameter, allow_hyphen_values = true)]
    match_score: Option<Score>,

    /// Score for unequal symbols
    #[arg(long, value_parser = ScoringScheme::parse_parameter, allow_hyphen_values = true)]
    mismatch: Option<Score>,

    /// Score per gap column
    #[arg(long, value_parser = ScoringScheme::parse_parameter, allow_hyphen_values = true)]
    gap: Option<Score>,

    /// Fill the matrix by anti-diagonals
    #[arg(long)]
    wavefront: bool,
}

impl Overrides {
    fn apply(&self, mut config: AlignerConfig) -> AlignerConfig {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(score) = self.match_score {
            config.scoring.match_score = score;
        }
        if let Some(score) = self.mismatch {
            config.scoring.mismatch = score;
        }
        if let Some(score) = self.gap {
            config.scoring.gap_penalty = score;
        }
        if self.wavefront {
            config.performance.fill_strategy = FillStrategy::Wavefront;
        }
        config
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<AlignerConfig> {
    let config = match path {
        Some(path) => AlignerConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AlignerConfig::default(),
    };
    let config = overrides.apply(config);
    config.validate()?;
    Ok(config)
}

fn read_pair(seq1: &str, seq2: &str) -> Result<(Sequence, Sequence)> {
    let seq1 = parse_dna(seq1).context("first sequence")?;
    let seq2 = parse_dna(seq2).context("second sequence")?;
    Ok((seq1, seq2))
}

fn read_batch_file(path: &Path) -> Result<Vec<(Sequence, Sequence)>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut pairs = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [seq1, seq2] = fields.as_slice() else {
            bail!("{}:{}: expected two sequences, found {}", path.display(), line_no + 1, fields.len());
        };
        pairs.push(
            read_pair(seq1, seq2).with_context(|| format!("{}:{}", path.display(), line_no + 1))?,
        );
    }
    Ok(pairs)
}

fn format_matrix(matrix: &ScoreMatrix, seq1: &[u8], seq2: &[u8]) -> String {
    let width = matrix
        .iter_rows()
        .flatten()
        .map(|v| v.to_string().len())
        .max()
        .unwrap_or(1)
        .max(2);
    let mut out = format!("{:>width$} {:>width$}", "", "-");
    for &symbol in seq2 {
        out.push_str(&format!(" {:>width$}", symbol as char));
    }
    out.push('\n');
    for (i, row) in matrix.iter_rows().enumerate() {
        let label = if i == 0 { '-' } else { seq1[i - 1] as char };
        out.push_str(&format!("{label:>width$}"));
        for value in row {
            out.push_str(&format!(" {value:>width$}"));
        }
        out.push('\n');
    }
    out
}

fn print_outcome(outcome: &AlignmentOutcome) {
    let (line1, line2) = outcome.alignment.aligned_strings();
    let stats = &outcome.stats;
    println!("Mode:       {}", outcome.mode);
    println!("Score:      {}", outcome.score());
    println!("Alignment:  {line1}");
    println!("            {}", outcome.alignment.markup());
    println!("            {line2}");
    println!(
        "Region:     {} -> {}",
        outcome.alignment.start_position, outcome.alignment.end_position
    );
    println!(
        "Matches: {}  Mismatches: {}  Gaps: {}  Identity: {:.1}%",
        stats.matches, stats.mismatches, stats.gaps, stats.identity
    );
    if let Some(divergence) = stats.score_divergence() {
        println!("Note: column-wise score differs from the matrix score by {divergence}");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match &cli.command {
        Commands::Align {
            seq1,
            seq2,
            overrides,
            matrix,
            json,
        } => {
            let config = load_config(cli.config.as_deref(), overrides)?;
            let (seq1, seq2) = read_pair(seq1, seq2)?;
            let outcome = Aligner::from_config(&config).align(&seq1, &seq2)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                if *matrix {
                    print!("{}", format_matrix(&outcome.matrix, seq1.as_bytes(), seq2.as_bytes()));
                    println!();
                }
                print_outcome(&outcome);
            }
        }
        Commands::Compare {
            seq1,
            seq2,
            overrides,
            json,
        } => {
            let config = load_config(cli.config.as_deref(), overrides)?;
            let (seq1, seq2) = read_pair(seq1, seq2)?;
            let comparison = compare_modes(&Aligner::from_config(&config), &seq1, &seq2)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&comparison)?);
            } else {
                print_outcome(&comparison.global);
                println!();
                print_outcome(&comparison.local);
                println!();
                println!("Verdict:        {:?}", comparison.verdict);
                println!("Recommendation: {:?}", comparison.recommendation);
            }
        }
        Commands::Steps {
            seq1,
            seq2,
            overrides,
            limit,
            json,
        } => {
            let config = load_config(cli.config.as_deref(), overrides)?;
            let (seq1, seq2) = read_pair(seq1, seq2)?;
            let aligner = Aligner::from_config(&config);
            let steps = aligner.steps(seq1.as_bytes(), seq2.as_bytes())?;
            let total = steps.len();
            for step in steps.take(limit.unwrap_or(usize::MAX)) {
                if *json {
                    println!("{}", serde_json::to_string(&step)?);
                    continue;
                }
                let c = step.candidates;
                println!(
                    "Step {}/{}: cell {} {} vs {} ({})  diagonal {}  up {}  left {}  -> {}{}",
                    step.step + 1,
                    total,
                    step.position,
                    step.symbols.0 as char,
                    step.symbols.1 as char,
                    if step.is_match() { "match" } else { "mismatch" },
                    c.diagonal,
                    c.up,
                    c.left,
                    step.value,
                    if step.is_new_best { "  (new best)" } else { "" }
                );
            }
        }
        Commands::Batch {
            input,
            overrides,
            workers,
            json,
        } => {
            let mut config = load_config(cli.config.as_deref(), overrides)?;
            if let Some(workers) = workers {
                config.performance.workers = *workers;
            }
            config.validate()?;
            let pairs = read_batch_file(input)?;
            info!("aligning {} pairs on {} workers", pairs.len(), config.performance.workers);

            let mut batch = BatchAligner::from_config(&config)?;
            let outcomes = batch.align_all(pairs)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&outcomes)?);
            } else {
                for (index, outcome) in outcomes.iter().enumerate() {
                    let (line1, line2) = outcome.alignment.aligned_strings();
                    println!(
                        "{}\t{}\t{}\t{}\t{:.1}",
                        index + 1,
                        outcome.score(),
                        line1,
                        line2,
                        outcome.stats.identity
                    );
                }
            }
        }
        Commands::Config { overrides } => {
            let config = load_config(cli.config.as_deref(), overrides)?;
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}
