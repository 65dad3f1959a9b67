#[cfg(test)]
mod tests;

use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::models::{NewSection, Section, SectionUpdate};

const SECTION_COLUMNS: &str =
    "id, parent_id, slug, header, content, sort_order, created_at, updated_at";

pub struct SectionQueries;

impl SectionQueries {
    /// Insert a new section as the last sibling under its parent.
    ///
    /// The caller is responsible for validating that `parent_id` resolves and
    /// that the slug does not collide among siblings.
    #[inline]
    pub async fn insert(pool: &SqlitePool, new_section: NewSection) -> Result<Section> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();
        let order = Self::next_order(pool, new_section.parent_id.as_deref()).await?;

        sqlx::query(
            r#"
            INSERT INTO sections (id, parent_id, slug, header, content, sort_order, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new_section.parent_id)
        .bind(&new_section.slug)
        .bind(&new_section.header)
        .bind(&new_section.content)
        .bind(order)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to insert section")?;

        debug!("Inserted section {} (order {})", id, order);

        Self::find_by_id(pool, &id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created section"))
    }

    /// Next append-only order key under a parent: `max(sibling order) + 1`.
    ///
    /// Gaps left by deletions are never reused; computed paths rank by
    /// position among surviving siblings, not by this key.
    async fn next_order(pool: &SqlitePool, parent_id: Option<&str>) -> Result<i64> {
        let max: Option<i64> = if let Some(parent_id) = parent_id {
            sqlx::query_scalar("SELECT MAX(sort_order) FROM sections WHERE parent_id = ?")
                .bind(parent_id)
                .fetch_one(pool)
                .await
        } else {
            sqlx::query_scalar("SELECT MAX(sort_order) FROM sections WHERE parent_id IS NULL")
                .fetch_one(pool)
                .await
        }
        .context("Failed to compute sibling order")?;

        Ok(max.map_or(0, |m| m + 1))
    }

    #[inline]
    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Section>> {
        let result = sqlx::query_as::<_, Section>(&format!(
            "SELECT {SECTION_COLUMNS} FROM sections WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get section by id")?;

        Ok(result)
    }

    /// All sections carrying the given slug, anywhere in the forest.
    ///
    /// Slug uniqueness is only enforced among siblings, so a global lookup can
    /// return more than one match; the caller decides how to treat ambiguity.
    #[inline]
    pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> Result<Vec<Section>> {
        let sections = sqlx::query_as::<_, Section>(&format!(
            "SELECT {SECTION_COLUMNS} FROM sections WHERE slug = ? ORDER BY created_at ASC"
        ))
        .bind(slug)
        .fetch_all(pool)
        .await
        .context("Failed to get sections by slug")?;

        Ok(sections)
    }

    /// Direct children of `parent_id` (roots when `None`), in sibling order.
    #[inline]
    pub async fn find_children(
        pool: &SqlitePool,
        parent_id: Option<&str>,
    ) -> Result<Vec<Section>> {
        let sections = if let Some(parent_id) = parent_id {
            sqlx::query_as::<_, Section>(&format!(
                "SELECT {SECTION_COLUMNS} FROM sections WHERE parent_id = ? ORDER BY sort_order ASC, created_at ASC"
            ))
            .bind(parent_id)
            .fetch_all(pool)
            .await
        } else {
            sqlx::query_as::<_, Section>(&format!(
                "SELECT {SECTION_COLUMNS} FROM sections WHERE parent_id IS NULL ORDER BY sort_order ASC, created_at ASC"
            ))
            .fetch_all(pool)
            .await
        }
        .context("Failed to get children")?;

        Ok(sections)
    }

    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Section>> {
        let sections = sqlx::query_as::<_, Section>(&format!(
            "SELECT {SECTION_COLUMNS} FROM sections ORDER BY created_at ASC"
        ))
        .fetch_all(pool)
        .await
        .context("Failed to list sections")?;

        Ok(sections)
    }

    /// Whether another sibling under `parent_id` already carries `slug`.
    #[inline]
    pub async fn sibling_slug_exists(
        pool: &SqlitePool,
        parent_id: Option<&str>,
        slug: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool> {
        let count: i64 = if let Some(parent_id) = parent_id {
            sqlx::query_scalar(
                "SELECT COUNT(*) FROM sections WHERE parent_id = ? AND slug = ? AND id != ?",
            )
            .bind(parent_id)
            .bind(slug)
            .bind(exclude_id.unwrap_or(""))
            .fetch_one(pool)
            .await
        } else {
            sqlx::query_scalar(
                "SELECT COUNT(*) FROM sections WHERE parent_id IS NULL AND slug = ? AND id != ?",
            )
            .bind(slug)
            .bind(exclude_id.unwrap_or(""))
            .fetch_one(pool)
            .await
        }
        .context("Failed to check sibling slug")?;

        Ok(count > 0)
    }

    #[inline]
    pub async fn update_fields(
        pool: &SqlitePool,
        id: &str,
        update: SectionUpdate,
    ) -> Result<Option<Section>> {
        if update.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let mut query_parts = Vec::new();
        let mut query_values: Vec<Option<String>> = Vec::new();

        if let Some(header) = update.header {
            query_parts.push("header = ?");
            query_values.push(Some(header));
        }

        if let Some(slug) = update.slug {
            query_parts.push("slug = ?");
            query_values.push(slug);
        }

        if let Some(content) = update.content {
            query_parts.push("content = ?");
            query_values.push(Some(content));
        }

        query_parts.push("updated_at = ?");

        let query_str = format!("UPDATE sections SET {} WHERE id = ?", query_parts.join(", "));

        let mut query = sqlx::query(&query_str);
        for value in query_values {
            query = query.bind(value);
        }
        query = query.bind(Utc::now().naive_utc());
        query = query.bind(id);

        query
            .execute(pool)
            .await
            .context("Failed to update section")?;

        Self::find_by_id(pool, id).await
    }

    /// Delete a single section row.
    ///
    /// The cascading parent reference removes any descendants too; callers
    /// enforcing a leaf-only delete must check for children first.
    #[inline]
    pub async fn delete_by_id(pool: &SqlitePool, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sections WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to delete section")?;

        Ok(result.rows_affected() > 0)
    }

    /// Ids of `root_id` and every descendant, parents before children.
    ///
    /// Uses a visited set so a corrupted parent link can never loop forever.
    #[inline]
    pub async fn collect_subtree_ids(pool: &SqlitePool, root_id: &str) -> Result<Vec<String>> {
        let mut collected = Vec::new();
        let mut visited = HashSet::new();
        let mut pending = vec![root_id.to_string()];

        while let Some(current) = pending.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }

            let children = Self::find_children(pool, Some(&current)).await?;
            pending.extend(children.into_iter().map(|c| c.id));
            collected.push(current);
        }

        Ok(collected)
    }

    /// `root_id` and every descendant as full records.
    #[inline]
    pub async fn collect_subtree(pool: &SqlitePool, root_id: &str) -> Result<Vec<Section>> {
        let ids = Self::collect_subtree_ids(pool, root_id).await?;

        let mut sections = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(section) = Self::find_by_id(pool, &id).await? {
                sections.push(section);
            }
        }

        Ok(sections)
    }

    /// Delete `root_id` and its whole subtree.
    ///
    /// Descendant rows go with the root via the cascading parent reference;
    /// the returned ids are collected beforehand so the caller can clear the
    /// matching vector-store state.
    #[inline]
    pub async fn delete_subtree(pool: &SqlitePool, root_id: &str) -> Result<Vec<String>> {
        let ids = Self::collect_subtree_ids(pool, root_id).await?;
        if ids.is_empty() {
            return Ok(ids);
        }

        sqlx::query("DELETE FROM sections WHERE id = ?")
            .bind(root_id)
            .execute(pool)
            .await
            .context("Failed to delete subtree")?;

        debug!("Deleted subtree of {} ({} sections)", root_id, ids.len());
        Ok(ids)
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM sections")
            .fetch_one(pool)
            .await
            .context("Failed to count sections")?;

        Ok(count)
    }

    /// Compute the dotted path of a section from the live tree shape.
    ///
    /// Each component is the 1-based rank of an ancestor among its current
    /// siblings, so paths shift whenever siblings are inserted or removed.
    #[inline]
    pub async fn compute_path(pool: &SqlitePool, section: &Section) -> Result<String> {
        let mut parts = Vec::new();
        let mut current = section.clone();

        loop {
            let siblings = Self::find_children(pool, current.parent_id.as_deref()).await?;
            let position = siblings
                .iter()
                .position(|s| s.id == current.id)
                .ok_or_else(|| {
                    anyhow::anyhow!("Section {} missing from its sibling list", current.id)
                })?;
            parts.push((position + 1).to_string());

            match current.parent_id.clone() {
                Some(parent_id) => {
                    current = Self::find_by_id(pool, &parent_id).await?.ok_or_else(|| {
                        anyhow::anyhow!("Dangling parent reference: {}", parent_id)
                    })?;
                }
                None => break,
            }
        }

        parts.reverse();
        Ok(parts.join("."))
    }

    /// Resolve a dotted path of 1-based sibling positions, e.g. `[1, 2]` for "1.2".
    #[inline]
    pub async fn resolve_path(pool: &SqlitePool, parts: &[usize]) -> Result<Option<Section>> {
        let mut current: Option<Section> = None;

        for &position in parts {
            let siblings =
                Self::find_children(pool, current.as_ref().map(|s| s.id.as_str())).await?;

            if position == 0 || position > siblings.len() {
                return Ok(None);
            }

            current = Some(siblings[position - 1].clone());
        }

        Ok(current)
    }
}
