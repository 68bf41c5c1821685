use anyhow::{Context, Result};
use clap::Parser;
use trustgraph::activedirectory::ActiveDirectoryEdges;
use trustgraph::attribute::AttributeRegistry;
use trustgraph::cli::{Cli, Command, OutputFormat};
use trustgraph::config::EdgeOverrides;
use trustgraph::edge::{EdgeInfo, EdgeTypeRegistry};
use trustgraph::schema::DirectorySchema;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn flag(set: bool) -> &'static str {
    if set {
        "yes"
    } else {
        "no"
    }
}

/// Print the edge catalog as a table
fn print_catalog(definitions: &[EdgeInfo]) {
    println!(
        "{:<26} {:>4} {:>4} {:>4} {:>10}  DESCRIPTION",
        "EDGE", "FWD", "BWD", "SHOW", "PROB"
    );
    for info in definitions {
        println!(
            "{:<26} {:>4} {:>4} {:>4} {:>10}  {}",
            info.name,
            flag(info.defaults.forward),
            flag(info.defaults.backward),
            flag(info.defaults.shown),
            if info.has_calculator { "calculated" } else { "100%" },
            info.description.as_deref().unwrap_or("")
        );
    }
}

fn run_catalog(format: OutputFormat, overrides: Option<&std::path::Path>) -> Result<()> {
    let attributes = AttributeRegistry::new();
    let edges = EdgeTypeRegistry::new();
    let schema = DirectorySchema::register(&attributes);
    ActiveDirectoryEdges::register(&edges, &schema);

    if let Some(path) = overrides {
        EdgeOverrides::from_toml(path)
            .and_then(|o| o.apply(&edges))
            .with_context(|| format!("Failed to apply overrides from {}", path.display()))?;
    }

    let definitions = edges.definitions();
    match format {
        OutputFormat::Text => print_catalog(&definitions),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&definitions)?),
    }
    Ok(())
}

fn run_attributes(format: OutputFormat, names: &[String]) -> Result<()> {
    let attributes = AttributeRegistry::new();
    DirectorySchema::register(&attributes);
    for name in names {
        attributes.intern(name);
    }
    attributes.log_statistics();

    let ranking = attributes.rank_by_popularity();
    match format {
        OutputFormat::Text => {
            for row in &ranking {
                println!("{:>6}  {}", row.count, row.name);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ranking)?),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    match &args.command {
        Command::Catalog { overrides } => run_catalog(args.format, overrides.as_deref()),
        Command::Attributes { names } => run_attributes(args.format, names),
    }
}
