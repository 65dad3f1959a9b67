// Knowledge base facade
// Single entry point coordinating the structured store, the chunking and
// embedding pipeline, and the vector store


pub mod export;
pub mod identifier;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::database::lancedb::{ChunkMetadata, EmbeddingRecord, VectorStore};
use crate::database::sqlite::{Database, NewSection, Section, SectionQueries, SectionUpdate};
use crate::embeddings::Embedder;
use crate::embeddings::chunking::chunk_text;
use crate::embeddings::ollama::OllamaClient;
use crate::{KbError, Result};

use identifier::{SectionRef, slugify};

/// A search result resolved back to its owning section.
///
/// `path` is computed at query time and shifts with tree mutations; treat it
/// as a display snapshot, not a durable key.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub section: Section,
    pub score: f32,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KbStats {
    pub section_count: i64,
    pub embedding_count: u64,
}

/// The knowledge base: hierarchical sections in SQLite, their chunk
/// embeddings in LanceDB.
///
/// The structured store is the system of record; the vector store is a
/// derived index that [`KnowledgeBase::reindex`] can rebuild at any time.
/// Operations run to completion one at a time and are not safe to interleave
/// concurrently against overlapping subtrees.
pub struct KnowledgeBase {
    database: Database,
    vector_store: VectorStore,
    embedder: Box<dyn Embedder>,
    max_chunk_chars: usize,
}

impl KnowledgeBase {
    /// Open the knowledge base described by `config`, embedding through the
    /// configured Ollama endpoint.
    #[inline]
    pub async fn open(config: &Config) -> Result<Self> {
        let embedder = OllamaClient::new(&config.ollama)?;
        Self::open_with_embedder(config, Box::new(embedder)).await
    }

    /// Open the knowledge base with a caller-supplied embedding backend.
    #[inline]
    pub async fn open_with_embedder(config: &Config, embedder: Box<dyn Embedder>) -> Result<Self> {
        let database = Database::initialize_from_config_dir(config.get_base_dir()).await?;
        let vector_store = VectorStore::new(config).await?;

        Ok(Self {
            database,
            vector_store,
            embedder,
            max_chunk_chars: config.chunking.max_chunk_chars,
        })
    }

    /// Add a section, appended after its parent's existing children.
    ///
    /// `parent` accepts any identifier form (id, dotted path, or slug).
    /// The slug defaults to a derivation of the header and must be unique
    /// among the new section's siblings.
    #[inline]
    pub async fn add(
        &mut self,
        header: &str,
        content: &str,
        parent: Option<&str>,
        slug: Option<&str>,
    ) -> Result<Section> {
        let parent_id = match parent {
            Some(identifier) => Some(self.resolve(identifier).await?.id),
            None => None,
        };

        let slug_value = match slug {
            Some(supplied) => supplied.trim().to_string(),
            None => slugify(header),
        };
        let slug_value = if slug_value.is_empty() {
            None
        } else {
            Some(slug_value)
        };

        if let Some(ref slug_value) = slug_value {
            self.ensure_sibling_slug_free(parent_id.as_deref(), slug_value, None)
                .await?;
        }

        let section = SectionQueries::insert(
            self.database.pool(),
            NewSection {
                header: header.to_string(),
                content: content.to_string(),
                parent_id,
                slug: slug_value,
            },
        )
        .await?;

        self.sync_section_embeddings(&section).await?;

        info!("Added section {} ({})", section.id, section.header);
        Ok(section)
    }

    /// Resolve an identifier (id, dotted path, or slug) to its section.
    #[inline]
    pub async fn get(&self, identifier: &str) -> Result<Section> {
        self.resolve(identifier).await
    }

    /// Update header and/or content of a section.
    ///
    /// A header update re-derives the slug (checked against siblings); a
    /// content update fully replaces the section's chunk set. Passing
    /// neither field returns the section unchanged.
    #[inline]
    pub async fn update(
        &mut self,
        identifier: &str,
        header: Option<&str>,
        content: Option<&str>,
    ) -> Result<Section> {
        let section = self.resolve(identifier).await?;

        if header.is_none() && content.is_none() {
            debug!("Update with no fields for section {}", section.id);
            return Ok(section);
        }

        let mut update = SectionUpdate::default();

        if let Some(header) = header {
            let derived = slugify(header);
            let derived = if derived.is_empty() {
                None
            } else {
                Some(derived)
            };

            if let Some(ref derived) = derived {
                self.ensure_sibling_slug_free(
                    section.parent_id.as_deref(),
                    derived,
                    Some(&section.id),
                )
                .await?;
            }

            update.header = Some(header.to_string());
            update.slug = Some(derived);
        }

        if let Some(content) = content {
            update.content = Some(content.to_string());
        }

        let updated = SectionQueries::update_fields(self.database.pool(), &section.id, update)
            .await?
            .ok_or_else(|| KbError::NotFound(identifier.to_string()))?;

        if content.is_some() {
            self.sync_section_embeddings(&updated).await?;
        }

        info!("Updated section {}", updated.id);
        Ok(updated)
    }

    /// Delete a section, and with `recursive` its whole subtree.
    ///
    /// Non-recursive deletion of a section with children fails without
    /// touching either store. The structured store is always updated first;
    /// a vector-store failure afterwards surfaces as
    /// [`KbError::VectorSync`] and is repaired by [`KnowledgeBase::reindex`].
    #[inline]
    pub async fn delete(&mut self, identifier: &str, recursive: bool) -> Result<()> {
        let section = self.resolve(identifier).await?;

        let children = SectionQueries::find_children(self.database.pool(), Some(&section.id))
            .await?;
        if !children.is_empty() && !recursive {
            return Err(KbError::InvalidOperation(format!(
                "Section {} has {} children; delete recursively to remove the subtree",
                section.id,
                children.len()
            )));
        }

        let deleted_ids = if recursive {
            SectionQueries::delete_subtree(self.database.pool(), &section.id).await?
        } else {
            SectionQueries::delete_by_id(self.database.pool(), &section.id).await?;
            vec![section.id.clone()]
        };

        for id in &deleted_ids {
            self.vector_store
                .delete_section_embeddings(id)
                .await
                .map_err(|e| KbError::VectorSync {
                    section_id: id.clone(),
                    message: e.to_string(),
                })?;
        }

        info!(
            "Deleted section {} ({} sections removed)",
            section.id,
            deleted_ids.len()
        );
        Ok(())
    }

    /// Semantic search over chunk embeddings.
    ///
    /// Fetches the `n_results` nearest chunks, resolves each back to its
    /// section, and deduplicates by section keeping the best-scoring hit, so
    /// at most `n_results` distinct sections return in score order.
    #[inline]
    pub async fn search(&self, query: &str, n_results: usize) -> Result<Vec<SearchHit>> {
        let query_vector = self
            .embedder
            .embed(&[query.to_string()])
            .await
            .map_err(|e| KbError::Embedding(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| KbError::Embedding("Provider returned no query embedding".to_string()))?;

        let matches = self.vector_store.search_similar(&query_vector, n_results).await?;

        let mut hits: Vec<SearchHit> = Vec::new();
        for chunk_match in matches {
            let section_id = &chunk_match.metadata.section_id;
            if hits.iter().any(|hit| hit.section.id == *section_id) {
                continue;
            }

            let Some(section) =
                SectionQueries::find_by_id(self.database.pool(), section_id).await?
            else {
                warn!("Search hit references missing section {}", section_id);
                continue;
            };

            let path = SectionQueries::compute_path(self.database.pool(), &section).await?;
            hits.push(SearchHit {
                section,
                score: chunk_match.similarity_score,
                path,
            });
        }

        debug!("Search returned {} distinct sections", hits.len());
        Ok(hits)
    }

    /// Direct children of the given parent, in sibling order.
    /// Without a parent, returns the root sections.
    #[inline]
    pub async fn get_children(&self, parent: Option<&str>) -> Result<Vec<Section>> {
        let parent_id = match parent {
            Some(identifier) => Some(self.resolve(identifier).await?.id),
            None => None,
        };

        let children =
            SectionQueries::find_children(self.database.pool(), parent_id.as_deref()).await?;
        Ok(children)
    }

    /// Render the subtree under `root` (or the whole forest) as indented text.
    #[inline]
    pub async fn render_tree(&self, root: Option<&str>) -> Result<String> {
        let sections = self.sections_under(root).await?;
        Ok(export::render_tree(&sections))
    }

    /// Export the subtree under `root` (or the whole forest) to a text file.
    #[inline]
    pub async fn export(&self, filepath: &std::path::Path, root: Option<&str>) -> Result<()> {
        let mut rendered = self.render_tree(root).await?;
        if !rendered.is_empty() {
            rendered.push('\n');
        }

        std::fs::write(filepath, rendered)?;

        info!("Exported knowledge base to {}", filepath.display());
        Ok(())
    }

    /// Recompute chunks and embeddings for a subtree (or everything) from
    /// current content, replacing whatever the vector store holds.
    ///
    /// This is the reconciliation tool for the dual-store consistency gap:
    /// re-running it is idempotent.
    #[inline]
    pub async fn reindex(&mut self, root: Option<&str>) -> Result<usize> {
        let sections = self.sections_under(root).await?;

        for section in &sections {
            self.sync_section_embeddings(section).await?;
        }

        info!("Reindexed {} sections", sections.len());
        Ok(sections.len())
    }

    /// Compute the current dotted path of a section.
    ///
    /// Paths are snapshots of the live tree shape, not durable keys.
    #[inline]
    pub async fn path_of(&self, section: &Section) -> Result<String> {
        let path = SectionQueries::compute_path(self.database.pool(), section).await?;
        Ok(path)
    }

    /// Number of chunks currently indexed for a section.
    #[inline]
    pub async fn chunk_count(&self, identifier: &str) -> Result<u64> {
        let section = self.resolve(identifier).await?;
        let count = self
            .vector_store
            .count_section_embeddings(&section.id)
            .await?;
        Ok(count)
    }

    #[inline]
    pub async fn stats(&self) -> Result<KbStats> {
        let section_count = SectionQueries::count(self.database.pool()).await?;
        let embedding_count = self.vector_store.count_embeddings().await?;

        Ok(KbStats {
            section_count,
            embedding_count,
        })
    }

    async fn resolve(&self, identifier: &str) -> Result<Section> {
        match SectionRef::classify(identifier) {
            SectionRef::Id(id) => SectionQueries::find_by_id(self.database.pool(), &id)
                .await?
                .ok_or_else(|| KbError::NotFound(identifier.to_string())),
            SectionRef::Path(parts) => SectionQueries::resolve_path(self.database.pool(), &parts)
                .await?
                .ok_or_else(|| KbError::NotFound(identifier.to_string())),
            SectionRef::Slug(slug) => {
                let mut matches =
                    SectionQueries::find_by_slug(self.database.pool(), &slug).await?;
                match matches.len() {
                    0 => Err(KbError::NotFound(identifier.to_string())),
                    1 => Ok(matches.remove(0)),
                    count => Err(KbError::Conflict(format!(
                        "Slug '{slug}' is ambiguous ({count} sections match)"
                    ))),
                }
            }
        }
    }

    async fn ensure_sibling_slug_free(
        &self,
        parent_id: Option<&str>,
        slug: &str,
        exclude_id: Option<&str>,
    ) -> Result<()> {
        let taken =
            SectionQueries::sibling_slug_exists(self.database.pool(), parent_id, slug, exclude_id)
                .await?;

        if taken {
            return Err(KbError::Conflict(format!(
                "Slug '{slug}' already exists among siblings"
            )));
        }

        Ok(())
    }

    /// Chunk a section's content, embed it, and replace its chunk set in the
    /// vector store. Failures name the section so the caller can retry the
    /// vector half idempotently.
    async fn sync_section_embeddings(&mut self, section: &Section) -> Result<()> {
        let sync_result = self.sync_section_embeddings_inner(section).await;

        sync_result.map_err(|e| match e {
            KbError::VectorSync { .. } => e,
            other => KbError::VectorSync {
                section_id: section.id.clone(),
                message: other.to_string(),
            },
        })
    }

    async fn sync_section_embeddings_inner(&mut self, section: &Section) -> Result<()> {
        let chunks = chunk_text(&section.content, self.max_chunk_chars);

        if chunks.is_empty() {
            self.vector_store
                .delete_section_embeddings(&section.id)
                .await?;
            return Ok(());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self
            .embedder
            .embed(&texts)
            .await
            .map_err(|e| KbError::Embedding(e.to_string()))?;

        if embeddings.len() != chunks.len() {
            return Err(KbError::Embedding(format!(
                "Provider returned {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let created_at = Utc::now().to_rfc3339();
        let records: Vec<EmbeddingRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, vector)| EmbeddingRecord {
                id: Uuid::new_v4().to_string(),
                vector,
                metadata: ChunkMetadata {
                    section_id: section.id.clone(),
                    chunk_index: chunk.chunk_index as u32,
                    text: chunk.text,
                    created_at: created_at.clone(),
                },
            })
            .collect();

        self.vector_store
            .replace_section_embeddings(&section.id, records)
            .await?;

        debug!("Synced embeddings for section {}", section.id);
        Ok(())
    }

    async fn sections_under(&self, root: Option<&str>) -> Result<Vec<Section>> {
        let sections = match root {
            Some(identifier) => {
                let section = self.resolve(identifier).await?;
                SectionQueries::collect_subtree(self.database.pool(), &section.id).await?
            }
            None => SectionQueries::list_all(self.database.pool()).await?,
        };

        Ok(sections)
    }
}
