use clap::{Parser, Subcommand, ValueEnum};
use contentdb::{
    generate_insert, parse_schema, CollectionRegistry, ContentIndex, Pipeline, TransformOptions,
};
use std::path::{Component, Path, PathBuf};
use std::process;

/// ContentDB CLI: parse content files and compile them into SQLite tables
#[derive(Parser)]
#[command(name = "contentdb", version, about)]
struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "yaml")]
    format: OutputFormat,

    /// JSON file with transformer options (e.g. {"csv": false, "pathMeta": {...}})
    #[arg(long, global = true)]
    options: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run a file through the transformation pipeline
    Parse {
        /// Content file
        file: PathBuf,
        /// Document ID (default: the file path)
        #[arg(long)]
        id: Option<String>,
    },

    /// Show resolved collections for a schema file
    Schema {
        /// Schema YAML file
        schema: PathBuf,
        /// Only show this collection
        #[arg(long)]
        collection: Option<String>,
    },

    /// Print the INSERT statement for a content file
    Insert {
        /// Schema YAML file
        schema: PathBuf,
        /// Collection name
        collection: String,
        /// Content file
        file: PathBuf,
        /// Document ID (default: the file path)
        #[arg(long)]
        id: Option<String>,
    },

    /// Create tables and ingest content files into a SQLite index
    Index {
        /// Schema YAML file
        schema: PathBuf,
        /// SQLite database file
        db: PathBuf,
        /// Collection name
        collection: String,
        /// Content files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Directory that document IDs are relative to
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("ERROR:{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let options = load_options(cli.options.as_deref())?;
    let pipeline = Pipeline::with_builtins();

    match cli.command {
        Command::Parse { file, id } => {
            let id = id.unwrap_or_else(|| document_id(&file, None));
            let raw = read_file(&file)?;
            let doc = futures::executor::block_on(pipeline.transform(&id, &raw, &options))?;
            print_output(&serde_json::to_value(&doc)?, &cli.format)?;
        }

        Command::Schema { schema, collection } => {
            let registry = load_registry(&schema)?;
            let value = match collection {
                Some(name) => serde_json::to_value(registry.require(&name)?.as_ref())?,
                None => serde_json::to_value(
                    registry.iter().map(|c| c.as_ref()).collect::<Vec<_>>(),
                )?,
            };
            print_output(&value, &cli.format)?;
        }

        Command::Insert {
            schema,
            collection,
            file,
            id,
        } => {
            let registry = load_registry(&schema)?;
            let collection = registry.require(&collection)?;
            let id = id.unwrap_or_else(|| document_id(&file, None));
            let raw = read_file(&file)?;
            let doc = futures::executor::block_on(pipeline.transform(&id, &raw, &options))?;
            println!("{}", generate_insert(&collection, &doc.to_record())?);
        }

        Command::Index {
            schema,
            db,
            collection,
            files,
            root,
        } => {
            let registry = load_registry(&schema)?;
            let collection = registry.require(&collection)?;
            let index = ContentIndex::open(&db)?;
            index.initialize(&registry)?;

            let mut inputs = Vec::with_capacity(files.len());
            for file in &files {
                inputs.push((document_id(file, root.as_deref()), read_file(file)?));
            }

            let results = futures::executor::block_on(pipeline.transform_all(&inputs, &options));
            let mut indexed = Vec::new();
            let mut failed = Vec::new();
            for ((id, _), result) in inputs.iter().zip(results) {
                match result.and_then(|doc| index.upsert(&collection, &doc.to_record())) {
                    Ok(()) => indexed.push(id.clone()),
                    Err(e) => {
                        log::error!("Failed to index {id}: {e}");
                        failed.push(serde_json::json!({ "id": id, "error": e.to_string() }));
                    }
                }
            }
            index.set_version(&registry)?;

            print_output(
                &serde_json::json!({
                    "collection": collection.name,
                    "indexed": indexed,
                    "failed": failed,
                    "version": index.version()?,
                }),
                &cli.format,
            )?;
        }
    }

    Ok(())
}

fn load_options(path: Option<&Path>) -> Result<TransformOptions, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let text = read_file(path)?;
            let value: serde_json::Value = serde_json::from_str(&text)
                .map_err(|e| format!("Invalid options file '{}': {e}", path.display()))?;
            Ok(TransformOptions::from_value(value)?)
        }
        None => Ok(TransformOptions::new()),
    }
}

fn load_registry(path: &Path) -> Result<CollectionRegistry, Box<dyn std::error::Error>> {
    let schema = parse_schema(path)?;
    Ok(CollectionRegistry::from_schema(&schema)?)
}

fn read_file(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {e}", path.display()))?;
    Ok(content)
}

/// A document id is the file path with forward slashes, relative to `root` when given.
fn document_id(file: &Path, root: Option<&Path>) -> String {
    let relative = root
        .and_then(|root| file.strip_prefix(root).ok())
        .unwrap_or(file);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn print_output(
    value: &serde_json::Value,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(value)?);
        }
    }
    Ok(())
}
