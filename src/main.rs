// Offline tooling over persisted thought trees
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use thought_beam::extract::{
    best_leaf, extract_preferences, extract_sft_with, DatasetFormat, DatasetWriter, SftOptions,
};
use thought_beam::logging::setup_logging;
use thought_beam::tree::{encode_flat, load_tree};
use thought_beam::{Result, ThoughtBeamError, ThoughtTree};

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatasetFormatCli {
    Jsonl,
    Csv,
}

impl From<DatasetFormatCli> for DatasetFormat {
    fn from(cli: DatasetFormatCli) -> Self {
        match cli {
            DatasetFormatCli::Jsonl => DatasetFormat::Jsonl,
            DatasetFormatCli::Csv => DatasetFormat::Csv,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "thought_beam", version, about)]
struct Config {
    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Write rotating log files here instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a summary of a saved tree and its best trajectory
    Inspect {
        #[arg(short = 't', long)]
        tree: PathBuf,
    },

    /// Extract best-path instruction/response pairs
    Sft {
        /// Tree file or glob pattern
        #[arg(short = 't', long)]
        tree: String,

        #[arg(short = 'o', long)]
        out: PathBuf,

        /// Defaults to the output file extension
        #[arg(long, value_enum)]
        format: Option<DatasetFormatCli>,

        /// Leaves within this distance of the best value count as tied
        #[arg(long, default_value_t = 0.0)]
        tolerance: f64,
    },

    /// Extract sibling preference pairs
    Preferences {
        /// Tree file or glob pattern
        #[arg(short = 't', long)]
        tree: String,

        #[arg(short = 'o', long)]
        out: PathBuf,

        #[arg(long, value_enum)]
        format: Option<DatasetFormatCli>,

        /// Minimum value margin, strictly between 0 and 1
        #[arg(long, default_value_t = 0.2)]
        threshold: f64,
    },

    /// Rewrite a saved tree in the flat id-linked form
    Flatten {
        #[arg(short = 't', long)]
        tree: PathBuf,

        #[arg(short = 'o', long)]
        out: PathBuf,
    },
}

fn main() -> ExitCode {
    let config = Config::parse();
    let _logger = match setup_logging(&config.log_level, config.log_dir.as_deref()) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to start logger: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(config.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Inspect { tree } => inspect(&load_tree(&tree)?),
        Command::Sft {
            tree,
            out,
            format,
            tolerance,
        } => {
            let options = SftOptions { tolerance };
            let mut writer = DatasetWriter::create(&out, resolve_format(format, &out))?;
            for path in expand_inputs(&tree)? {
                let records = extract_sft_with(&load_tree(&path)?, &options);
                writer.write_all(&records)?;
                log::info!("{}: {} SFT pair(s)", path.display(), records.len());
            }
            writer.flush()?;
            println!("Wrote {} SFT pair(s) to {}", writer.written(), out.display());
            Ok(())
        }
        Command::Preferences {
            tree,
            out,
            format,
            threshold,
        } => {
            let mut writer = DatasetWriter::create(&out, resolve_format(format, &out))?;
            for path in expand_inputs(&tree)? {
                let records = extract_preferences(&load_tree(&path)?, threshold)?;
                writer.write_all(&records)?;
                log::info!("{}: {} preference pair(s)", path.display(), records.len());
            }
            writer.flush()?;
            println!(
                "Wrote {} preference pair(s) to {}",
                writer.written(),
                out.display()
            );
            Ok(())
        }
        Command::Flatten { tree, out } => {
            let flat = encode_flat(&load_tree(&tree)?);
            let file = std::io::BufWriter::new(std::fs::File::create(&out)?);
            serde_json::to_writer_pretty(file, &flat)?;
            println!("Wrote {} flat node(s) to {}", flat.nodes.len(), out.display());
            Ok(())
        }
    }
}

fn inspect(tree: &ThoughtTree) -> Result<()> {
    let root = tree.root_node();
    let scored = tree.iter().filter(|(_, n)| n.value().is_some()).count();
    println!("Question : {}", root.content());
    println!("Nodes    : {} ({} scored)", tree.len(), scored);
    println!("Leaves   : {}", tree.leaves().len());
    println!("Depth    : {}", tree.max_depth());

    match best_leaf(tree) {
        Some(id) => {
            let node = tree.node(id);
            println!(
                "Best     : {} value={:.3} depth={}",
                id,
                node.value().unwrap_or_default(),
                node.depth()
            );
            println!("\n{}", node.trajectory());
        }
        None => println!("Best     : no scored leaf"),
    }
    Ok(())
}

fn resolve_format(format: Option<DatasetFormatCli>, out: &Path) -> DatasetFormat {
    format
        .map(DatasetFormat::from)
        .unwrap_or_else(|| DatasetFormat::from_path(out))
}

/// Expands a glob pattern; a plain path is returned as is.
fn expand_inputs(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern)
        .map_err(|e| ThoughtBeamError::InvalidConfig(format!("bad tree pattern {:?}: {}", pattern, e)))?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("Skipping unreadable path: {}", e);
                None
            }
        })
        .collect::<Vec<_>>();

    if paths.is_empty() {
        return Err(ThoughtBeamError::InvalidConfig(format!(
            "no tree file matches {:?}",
            pattern
        )));
    }
    Ok(paths)
}
