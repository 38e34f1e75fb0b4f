//! domweave CLI
//!
//! Usage:
//!   domweave [OPTIONS] [TEMPLATE]
//!
//! Options:
//!   -b, --bindings <FILE>  Bindings table (TOML format)
//!   -c, --config <FILE>    Render configuration (TOML format)
//!   --outer                Print the root container itself
//!   -v, --verbose          Debug logging
//!   -h, --help             Print help

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;

use domweave::{Component, Definition, MemoryDocument, Props, RenderConfig};

#[derive(Parser)]
#[command(name = "domweave")]
#[command(about = "Render a placeholder template against data bindings")]
struct Cli {
    /// Template file (reads from stdin if not provided)
    template: Option<PathBuf>,

    /// Bindings table (TOML format)
    #[arg(short, long)]
    bindings: Option<PathBuf>,

    /// Render configuration (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the root container itself, not only its content
    #[arg(long)]
    outer: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .try_init();

    let config = match &cli.config {
        Some(path) => match RenderConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => RenderConfig::default(),
    };

    let bindings = match &cli.bindings {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => match content.parse::<toml::Table>() {
                Ok(table) => table,
                Err(e) => {
                    eprintln!("Error parsing bindings '{}': {}", path.display(), e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("Error reading bindings '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => toml::Table::new(),
    };

    let (template, filename) = match &cli.template {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => (buffer, "<stdin>".to_string()),
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let doc = Rc::new(MemoryDocument::new());
    let component = Component::with_config(
        doc.clone(),
        Definition::new().template(template).build(move |_, b| {
            let registered = b.register_all(&bindings);
            log::debug!("registered {} of {} binding(s)", registered, bindings.len());
        }),
        Props::new(),
        config,
    );

    match component.render() {
        Ok(root) => {
            if cli.outer {
                println!("{}", doc.outer_html(root));
            } else {
                println!("{}", doc.inner_html(root));
            }
        }
        Err(e) => {
            match e.report(&filename) {
                Some(report) => eprintln!("{}", report),
                None => eprintln!("Error: {}", e),
            }
            std::process::exit(1);
        }
    }
}
