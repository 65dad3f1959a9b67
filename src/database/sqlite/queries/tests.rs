use super::*;
use crate::database::sqlite::Database;
use anyhow::Result;
use tempfile::TempDir;

async fn create_test_database() -> Result<(TempDir, Database)> {
    let temp_dir = TempDir::new()?;
    let database = Database::initialize_from_config_dir(temp_dir.path()).await?;
    Ok((temp_dir, database))
}

async fn insert_section(
    pool: &SqlitePool,
    header: &str,
    parent_id: Option<&str>,
) -> Result<Section> {
    let slug = crate::kb::identifier::slugify(header);
    let section = SectionQueries::insert(
        pool,
        NewSection {
            header: header.to_string(),
            content: format!("Content of {header}"),
            parent_id: parent_id.map(str::to_string),
            slug: if slug.is_empty() { None } else { Some(slug) },
        },
    )
    .await?;
    Ok(section)
}

#[tokio::test]
async fn insert_and_find_by_id() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let section = insert_section(database.pool(), "Annual Report 2024", None).await?;
    assert!(!section.id.is_empty());
    assert_eq!(section.order, 0);
    assert_eq!(section.slug.as_deref(), Some("annual-report-2024"));

    let found = SectionQueries::find_by_id(database.pool(), &section.id)
        .await?
        .expect("should find inserted section");
    assert_eq!(found.header, "Annual Report 2024");
    assert_eq!(found.content, "Content of Annual Report 2024");

    let missing = SectionQueries::find_by_id(database.pool(), "nonexistent-id").await?;
    assert!(missing.is_none());

    Ok(())
}

#[tokio::test]
async fn insert_appends_to_sibling_order() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let root = insert_section(database.pool(), "Root", None).await?;
    let first = insert_section(database.pool(), "First", Some(&root.id)).await?;
    let second = insert_section(database.pool(), "Second", Some(&root.id)).await?;
    let third = insert_section(database.pool(), "Third", Some(&root.id)).await?;

    assert_eq!(first.order, 0);
    assert_eq!(second.order, 1);
    assert_eq!(third.order, 2);

    let children = SectionQueries::find_children(database.pool(), Some(&root.id)).await?;
    let headers: Vec<&str> = children.iter().map(|c| c.header.as_str()).collect();
    assert_eq!(headers, vec!["First", "Second", "Third"]);

    Ok(())
}

#[tokio::test]
async fn find_children_roots() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let root_a = insert_section(database.pool(), "Root A", None).await?;
    let root_b = insert_section(database.pool(), "Root B", None).await?;
    insert_section(database.pool(), "Child", Some(&root_a.id)).await?;

    let roots = SectionQueries::find_children(database.pool(), None).await?;
    let ids: Vec<&str> = roots.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec![root_a.id.as_str(), root_b.id.as_str()]);

    Ok(())
}

#[tokio::test]
async fn find_by_slug_returns_all_matches() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let root_a = insert_section(database.pool(), "Root A", None).await?;
    let root_b = insert_section(database.pool(), "Root B", None).await?;

    // The same header under different parents produces the same slug
    insert_section(database.pool(), "Summary", Some(&root_a.id)).await?;
    insert_section(database.pool(), "Summary", Some(&root_b.id)).await?;

    let matches = SectionQueries::find_by_slug(database.pool(), "summary").await?;
    assert_eq!(matches.len(), 2);

    let matches = SectionQueries::find_by_slug(database.pool(), "missing").await?;
    assert!(matches.is_empty());

    Ok(())
}

#[tokio::test]
async fn sibling_slug_collision_detection() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let root = insert_section(database.pool(), "Root", None).await?;
    let child = insert_section(database.pool(), "Summary", Some(&root.id)).await?;

    assert!(
        SectionQueries::sibling_slug_exists(database.pool(), Some(&root.id), "summary", None)
            .await?
    );
    assert!(
        !SectionQueries::sibling_slug_exists(database.pool(), Some(&root.id), "other", None)
            .await?
    );
    assert!(
        !SectionQueries::sibling_slug_exists(database.pool(), None, "summary", None).await?,
        "slug is scoped to its parent"
    );

    // The section itself is excluded when checking its own update
    assert!(
        !SectionQueries::sibling_slug_exists(
            database.pool(),
            Some(&root.id),
            "summary",
            Some(&child.id)
        )
        .await?
    );

    Ok(())
}

#[tokio::test]
async fn update_fields_partial() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let section = insert_section(database.pool(), "Original", None).await?;

    let updated = SectionQueries::update_fields(
        database.pool(),
        &section.id,
        SectionUpdate {
            header: Some("Renamed".to_string()),
            slug: Some(Some("renamed".to_string())),
            content: None,
        },
    )
    .await?
    .expect("should update section");

    assert_eq!(updated.header, "Renamed");
    assert_eq!(updated.slug.as_deref(), Some("renamed"));
    assert_eq!(updated.content, "Content of Original");
    assert!(updated.updated_at >= section.updated_at);

    let updated = SectionQueries::update_fields(
        database.pool(),
        &section.id,
        SectionUpdate {
            header: None,
            slug: None,
            content: Some("Fresh content".to_string()),
        },
    )
    .await?
    .expect("should update section");

    assert_eq!(updated.header, "Renamed");
    assert_eq!(updated.content, "Fresh content");

    Ok(())
}

#[tokio::test]
async fn update_fields_clears_slug() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let section = insert_section(database.pool(), "Slugged", None).await?;
    assert!(section.slug.is_some());

    let updated = SectionQueries::update_fields(
        database.pool(),
        &section.id,
        SectionUpdate {
            header: None,
            slug: Some(None),
            content: None,
        },
    )
    .await?
    .expect("should update section");

    assert!(updated.slug.is_none());

    Ok(())
}

#[tokio::test]
async fn empty_update_is_noop() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let section = insert_section(database.pool(), "Untouched", None).await?;
    let result =
        SectionQueries::update_fields(database.pool(), &section.id, SectionUpdate::default())
            .await?
            .expect("section should still exist");

    assert_eq!(result, section);

    Ok(())
}

#[tokio::test]
async fn delete_by_id() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let section = insert_section(database.pool(), "Doomed", None).await?;

    assert!(SectionQueries::delete_by_id(database.pool(), &section.id).await?);
    assert!(SectionQueries::find_by_id(database.pool(), &section.id).await?.is_none());
    assert!(!SectionQueries::delete_by_id(database.pool(), &section.id).await?);

    Ok(())
}

#[tokio::test]
async fn delete_subtree_removes_descendants() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let root = insert_section(database.pool(), "Root", None).await?;
    let child = insert_section(database.pool(), "Child", Some(&root.id)).await?;
    let grandchild = insert_section(database.pool(), "Grandchild", Some(&child.id)).await?;
    let bystander = insert_section(database.pool(), "Bystander", None).await?;

    let deleted = SectionQueries::delete_subtree(database.pool(), &root.id).await?;
    assert_eq!(deleted.len(), 3);
    assert!(deleted.contains(&root.id));
    assert!(deleted.contains(&child.id));
    assert!(deleted.contains(&grandchild.id));

    assert!(SectionQueries::find_by_id(database.pool(), &root.id).await?.is_none());
    assert!(SectionQueries::find_by_id(database.pool(), &child.id).await?.is_none());
    assert!(SectionQueries::find_by_id(database.pool(), &grandchild.id).await?.is_none());
    assert!(
        SectionQueries::find_by_id(database.pool(), &bystander.id).await?.is_some(),
        "unrelated sections are untouched"
    );

    Ok(())
}

#[tokio::test]
async fn compute_path_reflects_tree_shape() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let root = insert_section(database.pool(), "Root", None).await?;
    let first = insert_section(database.pool(), "First", Some(&root.id)).await?;
    let second = insert_section(database.pool(), "Second", Some(&root.id)).await?;
    let nested = insert_section(database.pool(), "Nested", Some(&second.id)).await?;

    assert_eq!(SectionQueries::compute_path(database.pool(), &root).await?, "1");
    assert_eq!(SectionQueries::compute_path(database.pool(), &first).await?, "1.1");
    assert_eq!(SectionQueries::compute_path(database.pool(), &second).await?, "1.2");
    assert_eq!(SectionQueries::compute_path(database.pool(), &nested).await?, "1.2.1");

    Ok(())
}

#[tokio::test]
async fn paths_shift_when_sibling_removed() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let root = insert_section(database.pool(), "Root", None).await?;
    let first = insert_section(database.pool(), "First", Some(&root.id)).await?;
    let second = insert_section(database.pool(), "Second", Some(&root.id)).await?;

    assert_eq!(SectionQueries::compute_path(database.pool(), &second).await?, "1.2");

    SectionQueries::delete_by_id(database.pool(), &first.id).await?;

    // Paths are ranks among current siblings, so the survivor compacts to 1.1
    assert_eq!(SectionQueries::compute_path(database.pool(), &second).await?, "1.1");

    Ok(())
}

#[tokio::test]
async fn resolve_path_walks_positions() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let root = insert_section(database.pool(), "Root", None).await?;
    let _first = insert_section(database.pool(), "First", Some(&root.id)).await?;
    let second = insert_section(database.pool(), "Second", Some(&root.id)).await?;
    let nested = insert_section(database.pool(), "Nested", Some(&second.id)).await?;

    let resolved = SectionQueries::resolve_path(database.pool(), &[1])
        .await?
        .expect("path 1 should resolve");
    assert_eq!(resolved.id, root.id);

    let resolved = SectionQueries::resolve_path(database.pool(), &[1, 2, 1])
        .await?
        .expect("path 1.2.1 should resolve");
    assert_eq!(resolved.id, nested.id);

    assert!(SectionQueries::resolve_path(database.pool(), &[2]).await?.is_none());
    assert!(SectionQueries::resolve_path(database.pool(), &[1, 3]).await?.is_none());
    assert!(
        SectionQueries::resolve_path(database.pool(), &[1, 0]).await?.is_none(),
        "positions are 1-based"
    );
    assert!(SectionQueries::resolve_path(database.pool(), &[]).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn collect_subtree_orders_parents_first() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let root = insert_section(database.pool(), "Root", None).await?;
    let child = insert_section(database.pool(), "Child", Some(&root.id)).await?;
    let grandchild = insert_section(database.pool(), "Grandchild", Some(&child.id)).await?;

    let sections = SectionQueries::collect_subtree(database.pool(), &root.id).await?;
    let ids: Vec<&str> = sections.iter().map(|s| s.id.as_str()).collect();

    assert_eq!(sections.len(), 3);
    assert_eq!(ids[0], root.id.as_str());
    let child_pos = ids.iter().position(|id| *id == child.id).expect("child present");
    let grandchild_pos = ids
        .iter()
        .position(|id| *id == grandchild.id)
        .expect("grandchild present");
    assert!(child_pos < grandchild_pos);

    Ok(())
}

#[tokio::test]
async fn count_sections() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    assert_eq!(SectionQueries::count(database.pool()).await?, 0);

    let root = insert_section(database.pool(), "Root", None).await?;
    insert_section(database.pool(), "Child", Some(&root.id)).await?;

    assert_eq!(SectionQueries::count(database.pool()).await?, 2);

    Ok(())
}
