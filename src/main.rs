//! Scene Doctor CLI
//!
//! Usage:
//!   scene-doctor audit <FILE> [--config <TOML>] [--only-defaults]
//!   scene-doctor fix <FILE> [--write] [--output <FILE>]
//!   scene-doctor components <FILE> [--include-protected]
//!   scene-doctor extract <FILE> [--write]
//!   scene-doctor combine <FILE> --nodes 4,9 [--name N] [--property P] [--write]
//!
//! Documents are JSON trees; node ids printed by one command can be fed
//! back to another because loading assigns them deterministically.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use scene_doctor::cleanup::{fix_all_cleanup, scan_cleanup};
use scene_doctor::component::{
    combine, convert, scan_components, CombineRequest, ConvertRequest, ScanOptions,
};
use scene_doctor::document::io::{load_document, save_document};
use scene_doctor::document::{Document, NodeId};
use scene_doctor::layout::{fix_all, scan_layout, LayoutConfig};
use scene_doctor::report;

#[derive(Parser)]
#[command(name = "scene-doctor")]
#[command(about = "Analyze and repair layered design documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan for layout and naming issues
    Audit {
        /// Document file (JSON)
        file: PathBuf,

        /// Layout config file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Only report nodes whose resize behavior is untouched
        #[arg(long)]
        only_defaults: bool,
    },

    /// Apply every automatic fix
    Fix {
        /// Document file (JSON)
        file: PathBuf,

        /// Layout config file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the mutated document back
        #[arg(short, long)]
        write: bool,

        /// Output path (defaults to the input file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List duplicate groups eligible for extraction
    Components {
        /// Document file (JSON)
        file: PathBuf,

        /// Also scan inside components and instances
        #[arg(long)]
        include_protected: bool,
    },

    /// Extract every duplicate group into a shared component
    Extract {
        /// Document file (JSON)
        file: PathBuf,

        /// Also scan inside components and instances
        #[arg(long)]
        include_protected: bool,

        /// Write the mutated document back
        #[arg(short, long)]
        write: bool,

        /// Output path (defaults to the input file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Combine explicitly chosen nodes into a variant family
    Combine {
        /// Document file (JSON)
        file: PathBuf,

        /// Node ids, comma separated (as printed, without the '#')
        #[arg(short, long, value_delimiter = ',', required = true)]
        nodes: Vec<u64>,

        /// Name for the component set
        #[arg(long)]
        name: Option<String>,

        /// Name of the discriminating property
        #[arg(long)]
        property: Option<String>,

        /// Write the mutated document back
        #[arg(short, long)]
        write: bool,

        /// Output path (defaults to the input file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn load(path: &Path) -> Result<Document, String> {
    load_document(path).map_err(|e| format!("loading '{}': {}", path.display(), e))
}

fn load_config(path: &Option<PathBuf>) -> Result<LayoutConfig, String> {
    match path {
        Some(p) => LayoutConfig::from_file(p)
            .map_err(|e| format!("loading config '{}': {}", p.display(), e)),
        None => Ok(LayoutConfig::default()),
    }
}

fn save_back(
    doc: &Document,
    file: &Path,
    write: bool,
    output: &Option<PathBuf>,
) -> Result<(), String> {
    if !write && output.is_none() {
        println!("(dry run; pass --write to persist the changes)");
        return Ok(());
    }
    let target = output.as_deref().unwrap_or(file);
    save_document(doc, target).map_err(|e| format!("saving '{}': {}", target.display(), e))?;
    println!("wrote {}", target.display());
    Ok(())
}

fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Audit {
            file,
            config,
            only_defaults,
        } => {
            let doc = load(&file)?;
            let layout_config = load_config(&config)?.with_only_defaults(only_defaults);
            let layout_issues = scan_layout(&doc, &layout_config);
            let cleanup_issues = scan_cleanup(&doc);
            print!("{}", report::render_layout_issues(&layout_issues));
            println!();
            print!("{}", report::render_cleanup_issues(&cleanup_issues));
            Ok(())
        }

        Command::Fix {
            file,
            config,
            write,
            output,
        } => {
            let mut doc = load(&file)?;
            let layout_config = load_config(&config)?;
            let layout_issues = scan_layout(&doc, &layout_config);
            let layout_batch = fix_all(&mut doc, &layout_issues);
            println!("layout: {}", report::render_batch(&layout_batch).trim_end());
            let cleanup_issues = scan_cleanup(&doc);
            let cleanup_batch = fix_all_cleanup(&mut doc, &cleanup_issues);
            println!("cleanup: {}", report::render_batch(&cleanup_batch).trim_end());
            save_back(&doc, &file, write, &output)
        }

        Command::Components {
            file,
            include_protected,
        } => {
            let doc = load(&file)?;
            let options = ScanOptions::new().with_protected(include_protected);
            let groups = scan_components(&doc, &options);
            print!("{}", report::render_groups(&groups));
            Ok(())
        }

        Command::Extract {
            file,
            include_protected,
            write,
            output,
        } => {
            let mut doc = load(&file)?;
            let options = ScanOptions::new().with_protected(include_protected);
            let groups = scan_components(&doc, &options);
            if groups.is_empty() {
                println!("No duplicate groups found.");
                return Ok(());
            }
            let requests: Vec<ConvertRequest> =
                groups.iter().map(ConvertRequest::from).collect();
            let reports = convert(&mut doc, &requests);
            print!("{}", report::render_convert_reports(&reports));
            save_back(&doc, &file, write, &output)
        }

        Command::Combine {
            file,
            nodes,
            name,
            property,
            write,
            output,
        } => {
            let mut doc = load(&file)?;
            let request = CombineRequest {
                node_ids: nodes.into_iter().map(NodeId).collect(),
                set_name: name,
                property,
            };
            let combined =
                combine(&mut doc, &request).map_err(|e| format!("combining: {}", e))?;
            print!("{}", report::render_combine_report(&combined));
            save_back(&doc, &file, write, &output)
        }
    }
}
