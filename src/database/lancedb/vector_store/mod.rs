
use super::{ChunkMetadata, EmbeddingRecord};
use crate::KbError;
use crate::config::Config;
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection,
    query::{ExecutableQuery, QueryBase},
};
use std::sync::Arc;
use tracing::{debug, info};

const TABLE_NAME: &str = "embeddings";

/// Vector store holding the chunk set of every section.
///
/// The chunk set for a section is always replaced wholesale; individual
/// chunks are never patched in place.
pub struct VectorStore {
    connection: Connection,
    table_name: String,
    vector_dimension: usize,
}

/// A nearest-neighbor hit from the vector store
#[derive(Debug, Clone)]
pub struct ChunkMatch {
    pub metadata: ChunkMetadata,
    pub similarity_score: f32,
    pub distance: f32,
}

impl VectorStore {
    /// Open (creating if necessary) the vector store described by `config`.
    #[inline]
    pub async fn new(config: &Config) -> Result<Self, KbError> {
        let db_path = config.vector_database_path();
        debug!("Initializing LanceDB at path: {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                KbError::Database(format!("Failed to create vector database directory: {}", e))
            })?;
        }

        let uri = format!("file://{}", db_path.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| KbError::Database(format!("Failed to connect to LanceDB: {}", e)))?;

        let mut store = Self {
            connection,
            table_name: TABLE_NAME.to_string(),
            vector_dimension: config.ollama.embedding_dimension as usize,
        };

        store.initialize_table().await?;

        info!("Vector store initialized at {:?}", db_path);
        Ok(store)
    }

    /// Create the embeddings table if missing, otherwise adopt the
    /// dimension of the existing vector column.
    async fn initialize_table(&mut self) -> Result<(), KbError> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| KbError::Database(format!("Failed to list tables: {}", e)))?;

        if table_names.contains(&self.table_name) {
            if let Some(dim) = self.detect_existing_vector_dimension().await? {
                debug!("Adopted existing vector dimension: {}", dim);
                self.vector_dimension = dim;
            }
            return Ok(());
        }

        let schema = self.create_schema(self.vector_dimension);
        self.connection
            .create_empty_table(&self.table_name, schema)
            .execute()
            .await
            .map_err(|e| KbError::Database(format!("Failed to create table: {}", e)))?;

        info!(
            "Embeddings table created with {} dimensions",
            self.vector_dimension
        );
        Ok(())
    }

    async fn detect_existing_vector_dimension(&self) -> Result<Option<usize>, KbError> {
        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| KbError::Database(format!("Failed to open existing table: {}", e)))?;

        let schema = table
            .schema()
            .await
            .map_err(|e| KbError::Database(format!("Failed to get table schema: {}", e)))?;

        for field in schema.fields() {
            if field.name() == "vector" {
                if let DataType::FixedSizeList(_, size) = field.data_type() {
                    return Ok(Some(*size as usize));
                }
            }
        }

        Ok(None)
    }

    fn create_schema(&self, vector_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    vector_dim as i32,
                ),
                false,
            ),
            Field::new("section_id", DataType::Utf8, false),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("content", DataType::Utf8, false),
            Field::new("created_at", DataType::Utf8, false),
        ]))
    }

    /// Replace the whole chunk set of a section.
    ///
    /// Every record must carry the given `section_id`; passing an empty batch
    /// leaves the section with no chunks (the state for empty content).
    #[inline]
    pub async fn replace_section_embeddings(
        &mut self,
        section_id: &str,
        records: Vec<EmbeddingRecord>,
    ) -> Result<(), KbError> {
        self.delete_section_embeddings(section_id).await?;
        self.store_embeddings_batch(records).await
    }

    /// Store a batch of embeddings.
    ///
    /// If the batch's vector dimension differs from the table's, the table is
    /// recreated with the new dimension (discarding previous contents).
    #[inline]
    pub async fn store_embeddings_batch(
        &mut self,
        records: Vec<EmbeddingRecord>,
    ) -> Result<(), KbError> {
        if records.is_empty() {
            debug!("No embeddings to store");
            return Ok(());
        }

        let vector_dim = records[0].vector.len();
        if self.vector_dimension != vector_dim {
            info!(
                "Vector dimension changed from {} to {}, recreating table",
                self.vector_dimension, vector_dim
            );
            self.recreate_table_with_dimension(vector_dim).await?;
            self.vector_dimension = vector_dim;
        }

        let record_batch = self.create_record_batch(&records)?;

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| KbError::Database(format!("Failed to open table: {}", e)))?;

        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| KbError::Database(format!("Failed to insert embeddings: {}", e)))?;

        debug!("Stored {} embeddings", records.len());
        Ok(())
    }

    async fn recreate_table_with_dimension(&self, vector_dim: usize) -> Result<(), KbError> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| KbError::Database(format!("Failed to list tables: {}", e)))?;

        if table_names.contains(&self.table_name) {
            self.connection
                .drop_table(&self.table_name)
                .await
                .map_err(|e| KbError::Database(format!("Failed to drop table: {}", e)))?;
        }

        let schema = self.create_schema(vector_dim);
        self.connection
            .create_empty_table(&self.table_name, schema)
            .execute()
            .await
            .map_err(|e| {
                KbError::Database(format!("Failed to create table with new dimensions: {}", e))
            })?;

        Ok(())
    }

    fn create_record_batch(&self, records: &[EmbeddingRecord]) -> Result<RecordBatch, KbError> {
        let len = records.len();
        let vector_dim = self.vector_dimension;

        let mut ids = Vec::with_capacity(len);
        let mut vectors = Vec::with_capacity(len);
        let mut section_ids = Vec::with_capacity(len);
        let mut chunk_indices = Vec::with_capacity(len);
        let mut contents = Vec::with_capacity(len);
        let mut created_ats = Vec::with_capacity(len);

        for record in records {
            ids.push(record.id.as_str());
            vectors.push(record.vector.clone());
            section_ids.push(record.metadata.section_id.as_str());
            chunk_indices.push(record.metadata.chunk_index);
            contents.push(record.metadata.text.as_str());
            created_ats.push(record.metadata.created_at.as_str());
        }

        let schema = self.create_schema(vector_dim);

        let mut flat_values = Vec::with_capacity(len * vector_dim);
        for vector in &vectors {
            flat_values.extend_from_slice(vector);
        }
        let values_array = Float32Array::from(flat_values);
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array =
            FixedSizeListArray::try_new(field, vector_dim as i32, Arc::new(values_array), None)
                .map_err(|e| KbError::Database(format!("Failed to create vector array: {}", e)))?;

        let arrays: Vec<Arc<dyn arrow::array::Array>> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(section_ids)),
            Arc::new(UInt32Array::from(chunk_indices)),
            Arc::new(StringArray::from(contents)),
            Arc::new(StringArray::from(created_ats)),
        ];

        RecordBatch::try_new(schema, arrays)
            .map_err(|e| KbError::Database(format!("Failed to create record batch: {}", e)))
    }

    /// Nearest-neighbor search, best matches first.
    #[inline]
    pub async fn search_similar(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkMatch>, KbError> {
        debug!("Searching for similar vectors with limit: {}", limit);

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| KbError::Database(format!("Failed to open table: {}", e)))?;

        let query = table
            .vector_search(query_vector)
            .map_err(|e| KbError::Database(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .limit(limit);

        let results = query
            .execute()
            .await
            .map_err(|e| KbError::Database(format!("Failed to execute search: {}", e)))?;

        self.parse_search_results_stream(results).await
    }

    async fn parse_search_results_stream(
        &self,
        mut results: lancedb::arrow::SendableRecordBatchStream,
    ) -> Result<Vec<ChunkMatch>, KbError> {
        let mut matches = Vec::new();

        while let Some(batch_result) = results
            .try_next()
            .await
            .map_err(|e| KbError::Database(format!("Failed to read result stream: {}", e)))?
        {
            let parsed_batch = Self::parse_search_batch(&batch_result)?;
            matches.extend(parsed_batch);
        }

        debug!("Parsed {} search results from stream", matches.len());
        Ok(matches)
    }

    fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<ChunkMatch>, KbError> {
        let mut matches = Vec::new();
        let num_rows = batch.num_rows();

        let section_ids = batch
            .column_by_name("section_id")
            .ok_or_else(|| KbError::Database("Missing section_id column".to_string()))?
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| KbError::Database("Invalid section_id column type".to_string()))?;

        let chunk_indices = batch
            .column_by_name("chunk_index")
            .ok_or_else(|| KbError::Database("Missing chunk_index column".to_string()))?
            .as_any()
            .downcast_ref::<UInt32Array>()
            .ok_or_else(|| KbError::Database("Invalid chunk_index column type".to_string()))?;

        let contents = batch
            .column_by_name("content")
            .ok_or_else(|| KbError::Database("Missing content column".to_string()))?
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| KbError::Database("Invalid content column type".to_string()))?;

        let created_ats = batch
            .column_by_name("created_at")
            .ok_or_else(|| KbError::Database("Missing created_at column".to_string()))?
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| KbError::Database("Invalid created_at column type".to_string()))?;

        let distances = batch
            .column_by_name("_distance")
            .map(|col| col.as_any().downcast_ref::<Float32Array>());

        for row in 0..num_rows {
            let metadata = ChunkMetadata {
                section_id: section_ids.value(row).to_string(),
                chunk_index: chunk_indices.value(row),
                text: contents.value(row).to_string(),
                created_at: created_ats.value(row).to_string(),
            };

            let distance = distances
                .flatten()
                .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

            // Convert distance to similarity score (higher is better)
            let similarity_score = 1.0 - distance;

            matches.push(ChunkMatch {
                metadata,
                similarity_score,
                distance,
            });
        }

        Ok(matches)
    }

    /// Delete all embeddings owned by a section.
    #[inline]
    pub async fn delete_section_embeddings(&mut self, section_id: &str) -> Result<(), KbError> {
        debug!("Deleting embeddings for section: {}", section_id);

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| KbError::Database(format!("Failed to open table: {}", e)))?;

        let predicate = format!("section_id = '{}'", section_id.replace('\'', "''"));
        table.delete(&predicate).await.map_err(|e| {
            KbError::Database(format!("Failed to delete section embeddings: {}", e))
        })?;

        Ok(())
    }

    /// Total number of embeddings stored.
    #[inline]
    pub async fn count_embeddings(&self) -> Result<u64, KbError> {
        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| KbError::Database(format!("Failed to open table: {}", e)))?;

        let count = table
            .count_rows(None)
            .await
            .map_err(|e| KbError::Database(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    /// Number of embeddings owned by a section.
    #[inline]
    pub async fn count_section_embeddings(&self, section_id: &str) -> Result<u64, KbError> {
        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| KbError::Database(format!("Failed to open table: {}", e)))?;

        let predicate = format!("section_id = '{}'", section_id.replace('\'', "''"));
        let count = table
            .count_rows(Some(predicate))
            .await
            .map_err(|e| KbError::Database(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }
}
