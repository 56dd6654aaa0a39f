use clap::{Parser, Subcommand};
use openvpms_archetype::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "archetype-tool")]
#[command(about = "Inspect and check OpenVPMS archetype definitions")]
#[command(version)]
struct Cli {
    /// Archetype file or directory (.adl, .xml or .json)
    #[arg(short, long, default_value = "archetypes")]
    archetypes: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and check every archetype definition
    Check,
    /// List archetype short names
    List {
        /// Short name pattern (e.g. party.*)
        #[arg(default_value = "*")]
        pattern: String,
    },
    /// Show the nodes of an archetype
    Info {
        /// Archetype short name
        short_name: String,
    },
    /// Export archetype records as JSON
    Export {
        /// Short name pattern (e.g. act.*)
        #[arg(short, long, default_value = "*")]
        pattern: String,
        /// Output file; stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate an object stored as JSON against its archetype
    Validate {
        /// Path to the object JSON file
        object: PathBuf,
    },
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let registry = load_registry(&cli.archetypes).await?;

    match cli.command {
        Commands::Check => check(&registry),
        Commands::List { pattern } => {
            for short_name in registry.short_names(&pattern) {
                println!("{short_name}");
            }
        }
        Commands::Info { short_name } => show_info(&registry, &short_name)?,
        Commands::Export { pattern, output } => export(&registry, &pattern, output.as_deref()).await?,
        Commands::Validate { object } => validate(registry, &object).await?,
    }

    Ok(())
}

async fn load_registry(path: &Path) -> Result<DescriptorRegistry> {
    let files = if tokio::fs::metadata(path).await?.is_dir() {
        ArchetypeLoader::collect_files(path)?
    } else {
        vec![path.to_path_buf()]
    };

    let mut descriptors = Vec::new();
    for file in files {
        let content = tokio::fs::read_to_string(&file).await?;
        descriptors.extend(ArchetypeLoader::parse(&file, &content)?);
    }
    DescriptorRegistry::new(descriptors)
}

fn check(registry: &DescriptorRegistry) {
    let descriptors = registry.descriptors("*");
    println!("✅ Loaded {} archetype(s)", descriptors.len());
    for descriptor in descriptors {
        let nodes = descriptor.nodes().count();
        println!("  {} ({} node(s))", descriptor.archetype_id, nodes);
    }
}

fn show_info(registry: &DescriptorRegistry, short_name: &str) -> Result<()> {
    let descriptor = registry.require(short_name)?;

    println!("Archetype Information:");
    println!("======================");
    println!("Id: {}", descriptor.archetype_id);
    println!("Display name: {}", descriptor.display_name());
    println!("Class: {}", descriptor.class_name);

    println!("\nNodes: {}", descriptor.nodes.len());
    for node in descriptor.nodes() {
        let max = node
            .max_cardinality
            .map(|m| m.to_string())
            .unwrap_or_else(|| "*".to_string());
        print!(
            "  {:<24} {:<32} {:<10} [{}..{}]",
            node.name,
            node.path,
            node.value_type(),
            node.min_cardinality,
            max
        );
        if let Some(filter) = &node.filter {
            print!(" filter={filter}");
        }
        for assertion in &node.assertions {
            print!(" {}", assertion.name());
        }
        println!();
    }
    Ok(())
}

async fn export(
    registry: &DescriptorRegistry,
    pattern: &str,
    output: Option<&Path>,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let assembler = ArchetypeDescriptorAssembler::new();
    let mut context = AssemblyContext::new();
    let records = registry
        .descriptors(pattern)
        .iter()
        .map(|descriptor| assembler.assemble_record(descriptor, &mut context))
        .collect::<Result<Vec<_>>>()?;

    let json = serde_json::to_string_pretty(&records)?;
    match output {
        Some(path) => {
            tokio::fs::write(path, json).await?;
            println!("✅ Exported {} archetype(s) to {}", records.len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

async fn validate(
    registry: DescriptorRegistry,
    object_path: &Path,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(object_path).await?;
    let object: IMObject = serde_json::from_str(&content)?;

    let service = ArchetypeService::in_memory(Arc::new(registry), ArchetypeConfig::default());
    let errors = service.validate(&object)?;
    if errors.is_empty() {
        println!("✅ {} is valid", object.reference());
    } else {
        println!("❌ {} failed with {} error(s):\n", object.reference(), errors.len());
        for error in errors {
            println!("  {error}");
        }
    }
    Ok(())
}
