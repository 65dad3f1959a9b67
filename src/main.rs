use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kbase::Result;
use kbase::commands::{
    add_section, delete_section, export_tree, get_section, list_children, reindex,
    search_sections, show_config, show_status, show_tree, update_section,
};

#[derive(Parser)]
#[command(name = "kbase")]
#[command(about = "Hierarchical knowledge base with semantic search")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the effective configuration
    Config,
    /// Add a section
    Add {
        /// Section header
        header: String,
        /// Section content body
        content: String,
        /// Parent section (id, dotted path, or slug); omit for a root section
        #[arg(long)]
        parent: Option<String>,
        /// Explicit slug; derived from the header when omitted
        #[arg(long)]
        slug: Option<String>,
    },
    /// Look up a section by id, dotted path, or slug
    Get {
        /// Section identifier
        identifier: String,
        /// Print the section as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update a section's header and/or content
    Update {
        /// Section identifier
        identifier: String,
        /// New header
        #[arg(long)]
        header: Option<String>,
        /// New content body
        #[arg(long)]
        content: Option<String>,
    },
    /// Delete a section
    Delete {
        /// Section identifier
        identifier: String,
        /// Also delete all descendant sections
        #[arg(long)]
        recursive: bool,
    },
    /// List direct children of a section (or the roots)
    Children {
        /// Parent section identifier; omit for the root sections
        parent: Option<String>,
    },
    /// Semantic search across section content
    Search {
        /// Search query
        query: String,
        /// Maximum number of sections to return
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Print the section tree
    Tree {
        /// Root section identifier; omit for the whole tree
        root: Option<String>,
    },
    /// Export the section tree to a text file
    Export {
        /// Output file path
        path: PathBuf,
        /// Root section identifier; omit for the whole tree
        #[arg(long)]
        root: Option<String>,
    },
    /// Rebuild chunk embeddings from current section content
    Reindex {
        /// Root section identifier; omit to reindex everything
        #[arg(long)]
        root: Option<String>,
    },
    /// Show store statistics and embedding provider health
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config => {
            show_config()?;
        }
        Commands::Add {
            header,
            content,
            parent,
            slug,
        } => {
            add_section(&header, &content, parent.as_deref(), slug.as_deref()).await?;
        }
        Commands::Get { identifier, json } => {
            get_section(&identifier, json).await?;
        }
        Commands::Update {
            identifier,
            header,
            content,
        } => {
            update_section(&identifier, header.as_deref(), content.as_deref()).await?;
        }
        Commands::Delete {
            identifier,
            recursive,
        } => {
            delete_section(&identifier, recursive).await?;
        }
        Commands::Children { parent } => {
            list_children(parent.as_deref()).await?;
        }
        Commands::Search { query, limit } => {
            search_sections(&query, limit).await?;
        }
        Commands::Tree { root } => {
            show_tree(root.as_deref()).await?;
        }
        Commands::Export { path, root } => {
            export_tree(&path, root.as_deref()).await?;
        }
        Commands::Reindex { root } => {
            reindex(root.as_deref()).await?;
        }
        Commands::Status => {
            show_status().await?;
        }
    }

    Ok(())
}
