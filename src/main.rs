//! intent-netting CLI
//!
//! Net circular obligations from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Net intents from a JSON file
//! intent-netting net --input intents.json
//!
//! # Output as JSON, with a custom cycle bound
//! intent-netting net --input intents.json --format json --max-cycle-length 6
//!
//! # List the cycles that would be netted
//! intent-netting cycles --input intents.json
//!
//! # Generate a random network for testing
//! intent-netting generate --parties 10 --intents 30 --tokens ETH,USDC
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use intent_netting::core::intent::Intent;
use intent_netting::core::token::TokenId;
use intent_netting::graph::cycle_detection::{CycleEnumerator, CyclePolicy};
use intent_netting::graph::obligation_graph::ObligationGraph;
use intent_netting::graph::scc::find_sccs;
use intent_netting::optimization::netting::{
    calculate_netting_amount, tokens_on_cycle, NettingConfig, NettingEngine,
};
use intent_netting::simulation::stress_test::{generate_random_network, NetworkConfig};
use std::fs;
use std::path::{Path, PathBuf};

/// Multi-token obligation netting: cancel circular debt between parties.
#[derive(Parser)]
#[command(name = "intent-netting", version, about)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run cycle netting on an intent file and print the residual intents
    Net {
        /// Path to the JSON intents file
        #[arg(long)]
        input: PathBuf,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        #[command(flatten)]
        tuning: Tuning,
    },

    /// List nettable components and the cycles found in them
    Cycles {
        /// Path to the JSON intents file
        #[arg(long)]
        input: PathBuf,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        #[command(flatten)]
        tuning: Tuning,
    },

    /// Generate a random intent network
    Generate {
        /// Number of parties
        #[arg(long, default_value_t = 10)]
        parties: usize,

        /// Number of intents
        #[arg(long, default_value_t = 30)]
        intents: usize,

        /// Comma-separated token identifiers
        #[arg(long, default_value = "ETH", value_delimiter = ',')]
        tokens: Vec<String>,

        /// Seed for a reproducible network
        #[arg(long)]
        seed: Option<u64>,

        /// Write to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Netting configuration: a JSON file, then individual overrides.
#[derive(clap::Args)]
struct Tuning {
    /// JSON file with a NettingConfig
    #[arg(long)]
    config: Option<PathBuf>,

    /// Longest cycle to look for, in edges
    #[arg(long)]
    max_cycle_length: Option<usize>,

    /// Abort once a component yields more cycles than this
    #[arg(long)]
    max_cycles: Option<usize>,

    /// Net every rotation of a cycle instead of one canonical rotation
    #[arg(long)]
    every_rotation: bool,
}

impl Tuning {
    fn resolve(&self) -> Result<NettingConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("reading config '{}'", path.display()))?;
                serde_json::from_str(&content)
                    .with_context(|| format!("parsing config '{}'", path.display()))?
            }
            None => NettingConfig::default(),
        };
        if let Some(len) = self.max_cycle_length {
            config.max_cycle_length = len;
        }
        if let Some(max) = self.max_cycles {
            config.max_cycles = Some(max);
        }
        if self.every_rotation {
            config.cycle_policy = CyclePolicy::EveryRotation;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(serde::Deserialize, serde::Serialize)]
struct IntentsFile {
    intents: Vec<Intent>,
}

#[derive(serde::Serialize)]
struct CycleOutput {
    parties: Vec<String>,
    /// Amount each nettable token could cancel, before any netting.
    nettable: Vec<(String, u64)>,
}

fn load_intents(path: &Path) -> Result<Vec<Intent>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading intents '{}'", path.display()))?;
    let file: IntentsFile = serde_json::from_str(&content).with_context(|| {
        format!(
            "parsing '{}', expected {{\"intents\": [{{\"sender\", \"receiver\", \"token\", \"amount\"}}]}}",
            path.display()
        )
    })?;
    Ok(file.intents)
}

fn cmd_net(input: &Path, format: Format, tuning: &Tuning) -> Result<()> {
    let intents = load_intents(input)?;
    let report = NettingEngine::new(tuning.resolve()?).run(&intents)?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Text => print!("{}", report),
    }
    Ok(())
}

fn cmd_cycles(input: &Path, format: Format, tuning: &Tuning) -> Result<()> {
    let intents = load_intents(input)?;
    let config = tuning.resolve()?;
    let graph = ObligationGraph::from_intents(&intents)?;
    let enumerator = CycleEnumerator::new(config.max_cycle_length)
        .with_max_cycles(config.max_cycles)
        .with_policy(config.cycle_policy);

    let mut components = Vec::new();
    for scc in find_sccs(&graph) {
        let cycles = enumerator.enumerate(&graph, &scc)?;
        let outputs: Vec<CycleOutput> = cycles
            .iter()
            .map(|cycle| CycleOutput {
                parties: cycle.party_ids(&graph).iter().map(|p| p.to_string()).collect(),
                nettable: tokens_on_cycle(&graph, cycle)
                    .into_iter()
                    .filter_map(|token: TokenId| {
                        calculate_netting_amount(&graph, cycle, &token)
                            .map(|amount| (token.to_string(), amount))
                    })
                    .collect(),
            })
            .collect();
        components.push(outputs);
    }

    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(&components)?);
        return Ok(());
    }

    let mut total = 0;
    for (i, cycles) in components.iter().enumerate() {
        println!("Component {} ({} cycles)", i, cycles.len());
        for cycle in cycles {
            println!("  {} -> (back to start)", cycle.parties.join(" -> "));
            for (token, amount) in &cycle.nettable {
                println!("    {:<10} up to {}", token, amount);
            }
        }
        total += cycles.len();
    }
    if total == 0 {
        println!("No cycles detected.");
    } else {
        println!("\nTotal cycles: {}", total);
    }
    Ok(())
}

fn cmd_generate(
    parties: usize,
    intents: usize,
    tokens: &[String],
    seed: Option<u64>,
    output: Option<&Path>,
) -> Result<()> {
    if parties < 2 {
        bail!("--parties must be at least 2");
    }
    let config = NetworkConfig {
        party_count: parties,
        tokens: tokens.iter().map(|t| TokenId::new(t.trim())).collect(),
        intent_count: Some(intents),
        seed,
        ..Default::default()
    };
    let set = generate_random_network(&config);
    let json = serde_json::to_string_pretty(&IntentsFile {
        intents: set.intents().to_vec(),
    })?;

    match output {
        Some(path) => {
            fs::write(path, &json)
                .with_context(|| format!("writing to '{}'", path.display()))?;
            let tokens: Vec<String> = set.tokens().iter().map(|t| t.to_string()).collect();
            eprintln!(
                "Generated {} intents between {} of {} parties in [{}] -> {}",
                set.len(),
                set.parties().len(),
                parties,
                tokens.join(", "),
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match &cli.command {
        Command::Net {
            input,
            format,
            tuning,
        } => cmd_net(input, *format, tuning),
        Command::Cycles {
            input,
            format,
            tuning,
        } => cmd_cycles(input, *format, tuning),
        Command::Generate {
            parties,
            intents,
            tokens,
            seed,
            output,
        } => cmd_generate(*parties, *intents, tokens, *seed, output.as_deref()),
    }
}
