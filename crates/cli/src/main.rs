use std::path::{Path, PathBuf};

use chartstore_archive::{export_store, import_archive, Archive, RestoreMode};
use chartstore_types::CollectionName;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chartstore")]
#[command(about = "Versioned clinical record store CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a data directory to an encrypted archive
    Export {
        /// Data directory holding one subdirectory per collection
        data_dir: PathBuf,
        /// Archive password
        password: String,
        /// Destination file (defaults to a timestamped name)
        #[arg(long)]
        archive: Option<PathBuf>,
    },
    /// Import an encrypted archive into a data directory
    Import {
        /// Archive file to restore from
        archive: PathBuf,
        /// Destination data directory
        data_dir: PathBuf,
        /// Archive password
        password: String,
        /// Restore only the current revision of each document
        #[arg(long)]
        current_only: bool,
    },
    /// List the collections in an archive
    Collections {
        /// Archive file to inspect
        archive: PathBuf,
        /// Archive password
        password: String,
    },
    /// Show the current documents of one collection in an archive
    Current {
        /// Archive file to inspect
        archive: PathBuf,
        /// Collection name
        collection: String,
        /// Archive password
        password: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chartstore=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Export {
            data_dir,
            password,
            archive,
        }) => {
            let archive_path = archive.unwrap_or_else(default_archive_path);
            match export_store(&data_dir)
                .and_then(|archive| archive.write_archive(&archive_path, &password))
            {
                Ok(()) => println!("Exported to {}", archive_path.display()),
                Err(e) => eprintln!("Error exporting {}: {}", data_dir.display(), e),
            }
        }
        Some(Commands::Import {
            archive,
            data_dir,
            password,
            current_only,
        }) => {
            let mode = if current_only {
                RestoreMode::CurrentOnly
            } else {
                RestoreMode::FullHistory
            };
            match Archive::read_archive(&archive, &password)
                .and_then(|archive| import_archive(&archive, &data_dir, mode))
            {
                Ok(()) => println!("Imported into {}", data_dir.display()),
                Err(e) => eprintln!("Error importing {}: {}", archive.display(), e),
            }
        }
        Some(Commands::Collections { archive, password }) => {
            match Archive::read_archive(&archive, &password)
                .and_then(|archive| archive.collections())
            {
                Ok(collections) => {
                    if collections.is_empty() {
                        println!("No collections found.");
                    } else {
                        for collection in collections {
                            println!("{}", collection);
                        }
                    }
                }
                Err(e) => eprintln!("Error reading {}: {}", archive.display(), e),
            }
        }
        Some(Commands::Current {
            archive,
            collection,
            password,
        }) => match show_current(&archive, &collection, &password) {
            Ok(()) => {}
            Err(e) => eprintln!("Error reading {}: {}", archive.display(), e),
        },
        None => {
            println!("Use 'chartstore --help' for commands");
        }
    }

    Ok(())
}

fn show_current(
    archive_path: &Path,
    collection: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let collection = CollectionName::new(collection)?;
    let archive = Archive::read_archive(archive_path, password)?;
    let entries = archive.collection_entries(&collection, true)?;
    let current = Archive::collapse_entry_revisions(&entries)?;
    if current.is_empty() {
        println!("No documents found.");
        return Ok(());
    }
    for document in current.into_values() {
        let rendered = String::from_utf8(document.canonical_bytes()?)?;
        println!("{}", rendered);
    }
    Ok(())
}

fn default_archive_path() -> PathBuf {
    PathBuf::from(format!(
        "chartstore-{}.zip",
        Utc::now().format("%Y%m%d-%H%M%S")
    ))
}
