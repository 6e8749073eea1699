use clap::{Parser, Subcommand};
use nifgraph::summary::{BlockSummary, FileSummary};
use nifgraph::{NifFile, SaveOptions};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nifgraph", about = "Inspect and re-save NetImmerse/Gamebryo NIF files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show header fields and block statistics
    Info {
        input: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// List every block with its references
    Blocks {
        input: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Report (and count) dangling block and string references
    Validate {
        input: PathBuf,
    },
    /// Load and save again, optionally pruning and compacting
    Resave {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Drop blocks not reachable from the roots
        #[arg(long)]
        prune: bool,
        /// Deduplicate the string table
        #[arg(long)]
        compact_strings: bool,
    },
    /// Verify that load then save reproduces the input byte for byte
    Check {
        input: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    match Cli::parse().command {

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input, json } => {
            let file = NifFile::open(&input)?;
            let summary = FileSummary::of(&file);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            println!("── NIF File ─────────────────────────────────────────────");
            println!("  Path           {}", input.display());
            println!("  Header         {}", summary.description);
            println!("  File version   {}", summary.file_version);
            println!("  User version   {}", summary.user_version);
            println!("  Stream version {}", summary.stream_version);
            println!("  Blocks         {} ({} reachable)", summary.blocks, summary.reachable);
            println!("  Strings        {}", summary.strings);
            println!("  Roots          {:?}", summary.roots);
            println!("  Block types ({}):", summary.block_types.len());
            for (name, count) in &summary.block_types {
                println!("    {:<40} {:>6}", name, count);
            }
            for diagnostic in &summary.diagnostics {
                println!("  warning: {diagnostic}");
            }
        }

        // ── Blocks ───────────────────────────────────────────────────────────
        Commands::Blocks { input, json } => {
            let file = NifFile::open(&input)?;
            let blocks = BlockSummary::all(&file);
            if json {
                println!("{}", serde_json::to_string_pretty(&blocks)?);
                return Ok(());
            }

            println!("{:>6}  {:<36} {:<20} {:<20} Strings", "Index", "Type", "Children", "Pointers");
            for b in &blocks {
                println!("{:>6}  {:<36} {:<20} {:<20} {:?}",
                    b.index, b.type_name, format!("{:?}", b.children), format!("{:?}", b.pointers), b.strings);
                if let Some(raw) = &b.raw {
                    println!("{:>6}  raw {raw}…", "");
                }
            }
        }

        // ── Validate ─────────────────────────────────────────────────────────
        Commands::Validate { input } => {
            let mut file = NifFile::open(&input)?;
            let found = file.validate();
            for diagnostic in file.diagnostics() {
                println!("{diagnostic}");
            }
            if found.is_empty() {
                println!("OK: every reference resolves");
            } else {
                println!("{} dangling reference(s)", found.len());
                std::process::exit(1);
            }
        }

        // ── Resave ───────────────────────────────────────────────────────────
        Commands::Resave { input, output, prune, compact_strings } => {
            let mut file = NifFile::open(&input)?;
            let before = file.len();
            let opts = SaveOptions { prune_unreachable: prune, compact_strings };
            file.save_file(&output, &opts)?;
            println!("Saved: {} ({} → {} blocks)", output.display(), before, file.len());
        }

        // ── Check ────────────────────────────────────────────────────────────
        Commands::Check { input } => {
            let original = std::fs::read(&input)?;
            let mut file = NifFile::load(original.as_slice())?;
            let saved = file.to_bytes(&SaveOptions::default())?;
            if saved == original {
                println!("OK: {} bytes reproduced exactly", original.len());
            } else {
                let at = saved.iter().zip(&original).position(|(a, b)| a != b)
                    .unwrap_or_else(|| saved.len().min(original.len()));
                println!("MISMATCH at byte {at} (original {} bytes, saved {} bytes)", original.len(), saved.len());
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
