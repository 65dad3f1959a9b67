use std::path::Path;

use tracing::info;

use crate::Result;
use crate::config::Config;
use crate::database::sqlite::Section;
use crate::embeddings::ollama::OllamaClient;
use crate::kb::KnowledgeBase;

/// Show the effective configuration and derived store paths
#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load_default()?;

    println!("Configuration directory: {}", config.get_base_dir().display());
    println!("Section database: {}", config.database_path().display());
    println!("Vector database: {}", config.vector_database_path().display());
    println!();
    println!("Ollama endpoint: {}://{}:{}", config.ollama.protocol, config.ollama.host, config.ollama.port);
    println!("Embedding model: {}", config.ollama.model);
    println!("Embedding dimension: {}", config.ollama.embedding_dimension);
    println!("Embedding batch size: {}", config.ollama.batch_size);
    println!("Max chunk size: {} characters", config.chunking.max_chunk_chars);

    Ok(())
}

/// Add a new section
#[inline]
pub async fn add_section(
    header: &str,
    content: &str,
    parent: Option<&str>,
    slug: Option<&str>,
) -> Result<()> {
    let config = Config::load_default()?;
    let mut kb = KnowledgeBase::open(&config).await?;

    let section = kb.add(header, content, parent, slug).await?;
    let path = kb.path_of(&section).await?;

    println!("Created section: {} (ID: {})", section.header, section.id);
    println!("Path: {}", path);
    if let Some(slug) = &section.slug {
        println!("Slug: {}", slug);
    }

    Ok(())
}

/// Look up a section by id, dotted path, or slug
#[inline]
pub async fn get_section(identifier: &str, json: bool) -> Result<()> {
    let config = Config::load_default()?;
    let kb = KnowledgeBase::open(&config).await?;

    let section = kb.get(identifier).await?;
    let path = kb.path_of(&section).await?;

    if json {
        let value = serde_json::to_string_pretty(&section)
            .map_err(|e| crate::KbError::Other(e.into()))?;
        println!("{value}");
        return Ok(());
    }

    print_section(&section, &path);
    println!();
    println!("{}", section.content);

    Ok(())
}

/// Update a section's header and/or content
#[inline]
pub async fn update_section(
    identifier: &str,
    header: Option<&str>,
    content: Option<&str>,
) -> Result<()> {
    let config = Config::load_default()?;
    let mut kb = KnowledgeBase::open(&config).await?;

    if header.is_none() && content.is_none() {
        println!("Nothing to update; pass --header and/or --content.");
        return Ok(());
    }

    let section = kb.update(identifier, header, content).await?;
    println!("Updated section: {} (ID: {})", section.header, section.id);

    Ok(())
}

/// Delete a section, optionally with its whole subtree
#[inline]
pub async fn delete_section(identifier: &str, recursive: bool) -> Result<()> {
    let config = Config::load_default()?;
    let mut kb = KnowledgeBase::open(&config).await?;

    kb.delete(identifier, recursive).await?;
    println!("Deleted section: {identifier}");

    Ok(())
}

/// List direct children of a section (or the root sections)
#[inline]
pub async fn list_children(parent: Option<&str>) -> Result<()> {
    let config = Config::load_default()?;
    let kb = KnowledgeBase::open(&config).await?;

    let children = kb.get_children(parent).await?;

    if children.is_empty() {
        match parent {
            Some(parent) => println!("Section '{parent}' has no children."),
            None => println!("The knowledge base is empty."),
        }
        return Ok(());
    }

    for child in &children {
        let path = kb.path_of(child).await?;
        print_section(child, &path);
    }

    Ok(())
}

/// Semantic search across section content
#[inline]
pub async fn search_sections(query: &str, limit: usize) -> Result<()> {
    let config = Config::load_default()?;
    let kb = KnowledgeBase::open(&config).await?;

    let hits = kb.search(query, limit).await?;

    if hits.is_empty() {
        println!("No matching sections.");
        return Ok(());
    }

    println!("Results for \"{query}\":");
    println!();

    for hit in &hits {
        println!(
            "[{:.3}] {}. {} (ID: {})",
            hit.score, hit.path, hit.section.header, hit.section.id
        );
    }

    Ok(())
}

/// Print the section tree
#[inline]
pub async fn show_tree(root: Option<&str>) -> Result<()> {
    let config = Config::load_default()?;
    let kb = KnowledgeBase::open(&config).await?;

    let rendered = kb.render_tree(root).await?;

    if rendered.is_empty() {
        println!("The knowledge base is empty.");
    } else {
        println!("{rendered}");
    }

    Ok(())
}

/// Export the section tree to a text file
#[inline]
pub async fn export_tree(filepath: &Path, root: Option<&str>) -> Result<()> {
    let config = Config::load_default()?;
    let kb = KnowledgeBase::open(&config).await?;

    kb.export(filepath, root).await?;
    println!("Exported to {}", filepath.display());

    Ok(())
}

/// Rebuild chunk embeddings from current section content
#[inline]
pub async fn reindex(root: Option<&str>) -> Result<()> {
    let config = Config::load_default()?;
    let mut kb = KnowledgeBase::open(&config).await?;

    info!("Starting reindex");
    let count = kb.reindex(root).await?;
    println!("Reindexed {count} sections.");

    Ok(())
}

/// Show store statistics and embedding provider health
#[inline]
pub async fn show_status() -> Result<()> {
    let config = Config::load_default()?;
    let kb = KnowledgeBase::open(&config).await?;

    let stats = kb.stats().await?;

    println!("Sections: {}", stats.section_count);
    println!("Indexed chunks: {}", stats.embedding_count);
    println!("Section database: {}", config.database_path().display());
    println!("Vector database: {}", config.vector_database_path().display());

    let client = OllamaClient::new(&config.ollama)?;
    match client.health_check() {
        Ok(()) => println!("Embedding provider: ok ({})", config.ollama.model),
        Err(e) => println!("Embedding provider: unavailable ({e})"),
    }

    Ok(())
}

fn print_section(section: &Section, path: &str) {
    let slug = section.slug.as_deref().unwrap_or("-");
    println!(
        "{}. {} (ID: {}, slug: {})",
        path, section.header, section.id, slug
    );
}
