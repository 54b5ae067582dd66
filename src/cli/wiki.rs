use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use tokio::io::AsyncReadExt;

use crate::storage::{Storage, StorageError};

#[derive(Debug, Subcommand)]
pub enum WikiCommand {
    #[command(about = "List pages")]
    List,
    #[command(about = "Print a page")]
    Show { name: String },
    #[command(about = "Create an empty page")]
    Create { name: String },
    #[command(about = "Replace the content of a page, creating it if needed. Reads stdin unless --file is given")]
    Write {
        name: String,
        #[arg(long, short)]
        file: Option<PathBuf>,
    },
    #[command(about = "Delete a page")]
    Delete { name: String },
    #[command(about = "Rename a page")]
    Rename { old: String, new: String },
}

pub async fn process_wiki_command(storage: &impl Storage, command: WikiCommand) -> Result<()> {
    match command {
        WikiCommand::List => {
            let pages = storage.list_pages().await?;
            if pages.is_empty() {
                println!("The wiki is empty.");
            }
            for page in pages {
                println!("{}", page.name);
            }
        }
        WikiCommand::Show { name } => {
            println!("{}", storage.read_page(name.trim()).await?);
        }
        WikiCommand::Create { name } => {
            create_page(storage, name.trim()).await?;
            println!("Created {}", name.trim());
        }
        WikiCommand::Write { name, file } => {
            let content = match file {
                Some(path) => tokio::fs::read_to_string(path).await?,
                None => {
                    let mut content = String::new();
                    tokio::io::stdin().read_to_string(&mut content).await?;
                    content
                }
            };
            storage.write_page(name.trim(), &content).await?;
            println!("Saved {}", name.trim());
        }
        WikiCommand::Delete { name } => {
            storage.delete_page(name.trim()).await?;
            println!("Deleted {}", name.trim());
        }
        WikiCommand::Rename { old, new } => {
            storage.rename_page(old.trim(), new.trim()).await?;
            println!("Renamed {} to {}", old.trim(), new.trim());
        }
    }
    Ok(())
}

/// New pages start empty. An existing page is never overwritten.
async fn create_page(storage: &impl Storage, name: &str) -> Result<(), StorageError> {
    if storage.list_pages().await?.iter().any(|p| p.id == name) {
        return Err(StorageError::PageAlreadyExists(name.to_string()));
    }
    storage.write_page(name, "").await
}
