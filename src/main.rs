use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use vertalloc::allocator::parse_sector_arg;
use vertalloc::field::{self, FieldFormat};
use vertalloc::{AllocationConfig, SectorAssignment, VerticalAllocator, table};

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "vertalloc")]
#[command(about = "Allocate single-layer gridded fields onto model layers", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate a single-layer field across the target layers.
    Allocate {
        /// Allocation job (JSON).
        #[arg(long)]
        config: PathBuf,

        #[arg(short = 'i', long)]
        input: PathBuf,

        #[arg(long)]
        input_format: Option<String>,

        #[arg(short = 'o', long)]
        output: PathBuf,

        /// NAME=VAR,VAR or bare NAME for the default sector. Replaces the job's sectors.
        #[arg(long = "sector")]
        sectors: Vec<String>,

        /// Keep layers that receive no weight.
        #[arg(long)]
        no_prune: bool,

        /// Remove an existing output before writing.
        #[arg(long)]
        overwrite: bool,
    },

    /// Write the interpolated profile as CSV.
    Profile {
        #[arg(long)]
        config: PathBuf,

        /// Output path; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,

        #[arg(long)]
        no_prune: bool,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &Path, no_prune: bool) -> Result<AllocationConfig> {
    let mut cfg = AllocationConfig::load_from(path)
        .with_context(|| format!("load allocation config {}", path.display()))?;
    if no_prune {
        cfg.prune = false;
    }
    Ok(cfg)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.cmd {
        Commands::Allocate {
            config,
            input,
            input_format,
            output,
            sectors,
            no_prune,
            overwrite,
        } => {
            let mut cfg = load_config(&config, no_prune)?;
            if overwrite {
                cfg.save.overwrite = true;
            }

            // 1) Sectors: command line wins over the job file.
            let assignment = if sectors.is_empty() {
                cfg.sector_assignment()?
            } else {
                let parsed = sectors
                    .iter()
                    .map(|s| parse_sector_arg(s))
                    .collect::<vertalloc::Result<Vec<_>>>()?;
                SectorAssignment::new(parsed)?
            };

            // 2) Build the resident profile.
            let allocator = VerticalAllocator::from_config(&cfg)
                .with_context(|| format!("build profile from {}", cfg.table.display()))?;

            // 3) Allocate + save.
            let format = match input_format {
                Some(name) => name.parse::<FieldFormat>()?,
                None => cfg.input_format,
            };
            let field = field::open_field(&input, format)
                .with_context(|| format!("open field {}", input.display()))?;
            let out = allocator.allocate(&field, &assignment)?;
            let written = field::save_field(&out, &output, &cfg.save)
                .with_context(|| format!("save field {}", output.display()))?;
            println!("Wrote {}", written.display());
        }
        Commands::Profile {
            config,
            out,
            no_prune,
        } => {
            let cfg = load_config(&config, no_prune)?;
            let allocator = VerticalAllocator::from_config(&cfg)
                .with_context(|| format!("build profile from {}", cfg.table.display()))?;
            table::write_table(allocator.profile().table(), out.as_deref())?;
        }
    }

    Ok(())
}
