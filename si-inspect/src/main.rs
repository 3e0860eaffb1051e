//! si-inspect: display, export and rebuild SI descriptor loops.
//!
//! Descriptor loops are read as hexadecimal text or raw binary files and
//! resolved through the built-in descriptor registry.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};
use clap_num::maybe_hex;
use log::{debug, info};
use si_descriptor::{registry, DescriptorList, Element, TablesDisplay};

mod config;

use config::{build_context, config_path, load_config, ConfigFile, ContextOverrides};

/// si-inspect - descriptor loop inspector
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short = 'f', long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Active standards, comma separated (e.g. "MPEG, DVB").
    #[arg(short, long = "standard", global = true)]
    standards: Option<String>,

    /// Private data specifier assumed before any private_data_specifier_descriptor.
    #[arg(long, global = true, value_parser = maybe_hex::<u32>)]
    pds: Option<u32>,

    /// Table id enclosing the descriptor loop.
    #[arg(long, global = true, value_parser = maybe_hex::<u8>)]
    tid: Option<u8>,

    #[command(subcommand)]
    command: Commands,
}

/// Where a binary descriptor loop comes from.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").args(["hex", "file"]).required(true)))]
struct LoopInput {
    /// Descriptor loop as hexadecimal text, whitespace allowed.
    #[arg(long)]
    hex: Option<String>,

    /// Binary file holding a descriptor loop.
    #[arg(short = 'i', long)]
    file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a descriptor loop in human-readable form.
    Display {
        #[command(flatten)]
        input: LoopInput,
    },
    /// Convert a descriptor loop to XML.
    ToXml {
        #[command(flatten)]
        input: LoopInput,
    },
    /// Rebuild a descriptor loop from XML and print it as hexadecimal.
    FromXml {
        /// XML file whose root children are descriptors.
        path: PathBuf,
    },
    /// List the registered descriptor kinds.
    List,
}

impl LoopInput {
    fn read(&self) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        if let Some(path) = &self.file {
            return Ok(std::fs::read(path)?);
        }
        let text: String = self
            .hex
            .as_deref()
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        Ok(hex::decode(text)?)
    }
}

fn init_logging(verbose: bool, file_level: Option<&str>) {
    let level = if verbose {
        "debug"
    } else {
        file_level.unwrap_or("warn")
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load config file: explicit path > auto-detect > default
    let file_config = match config_path(cli.config.as_deref()) {
        Some(path) => {
            let c = load_config(&path)?;
            eprintln!("Loaded config from: {}", path.display());
            c
        }
        None => ConfigFile::default(),
    };

    init_logging(cli.verbose, file_config.logging.level.as_deref());

    let overrides = ContextOverrides {
        standards: cli.standards.clone(),
        pds: cli.pds,
        table_id: cli.tid,
    };
    let ctx = build_context(&overrides, &file_config.context)?;
    debug!("context: {:?}", ctx);

    let reg = registry::global();

    match cli.command {
        Commands::Display { input } => {
            let data = input.read()?;
            let list = DescriptorList::parse(&data)?;
            info!("{} descriptors, {} bytes", list.len(), data.len());
            let mut disp = TablesDisplay::new();
            disp.display_descriptor_list(reg, &list, "", &ctx)?;
            print!("{}", disp.as_str());
        }
        Commands::ToXml { input } => {
            let data = input.read()?;
            let list = DescriptorList::parse(&data)?;
            let mut root = Element::new("descriptors");
            list.to_xml(&mut root, reg, &ctx);
            println!("{}", root.to_xml_string()?);
        }
        Commands::FromXml { path } => {
            let text = std::fs::read_to_string(&path)?;
            let root = Element::parse_xml(&text)?;
            let list = DescriptorList::from_xml(&root, reg)?;
            info!("rebuilt {} descriptors from {}", list.len(), path.display());
            println!("{}", hex::encode_upper(list.serialize()));
        }
        Commands::List => {
            for entry in reg.entries() {
                println!("{:<40} {}", entry.xml_name, entry.key);
            }
        }
    }

    Ok(())
}
