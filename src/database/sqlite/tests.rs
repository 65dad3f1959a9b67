use super::*;
use anyhow::Result;
use tempfile::TempDir;

async fn create_test_database() -> Result<(TempDir, Database)> {
    let temp_dir = TempDir::new()?;
    let database = Database::initialize_from_config_dir(temp_dir.path()).await?;
    Ok((temp_dir, database))
}

#[tokio::test]
async fn schema_migration() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name NOT LIKE '_sqlx_%'",
    )
    .fetch_all(database.pool())
    .await?;

    assert_eq!(tables, vec!["sections".to_string()]);

    Ok(())
}

#[tokio::test]
async fn migrations_are_idempotent() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    // Re-running migrations against an initialized database is a no-op
    database.run_migrations().await?;

    let section = SectionQueries::insert(
        database.pool(),
        NewSection {
            header: "Survives".to_string(),
            content: "Still here".to_string(),
            parent_id: None,
            slug: Some("survives".to_string()),
        },
    )
    .await?;

    database.run_migrations().await?;

    let reloaded = SectionQueries::find_by_id(database.pool(), &section.id).await?;
    assert!(reloaded.is_some());

    Ok(())
}

#[tokio::test]
async fn reopen_preserves_data() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let section = {
        let database = Database::initialize_from_config_dir(temp_dir.path()).await?;
        SectionQueries::insert(
            database.pool(),
            NewSection {
                header: "Persistent".to_string(),
                content: "Written once".to_string(),
                parent_id: None,
                slug: Some("persistent".to_string()),
            },
        )
        .await?
    };

    let database = Database::initialize_from_config_dir(temp_dir.path()).await?;
    let reloaded = SectionQueries::find_by_id(database.pool(), &section.id)
        .await?
        .expect("section should survive a reopen");

    assert_eq!(reloaded, section);

    Ok(())
}
