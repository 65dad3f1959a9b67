use super::*;
use chrono::Utc;

fn sample_section() -> Section {
    let now = Utc::now().naive_utc();
    Section {
        id: "0c6ff3b1-5a60-4b6a-9c2d-0f0f8f1a2b3c".to_string(),
        parent_id: None,
        slug: Some("annual-report-2024".to_string()),
        header: "Annual Report 2024".to_string(),
        content: "Overview of the fiscal year.".to_string(),
        order: 0,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn root_detection() {
    let mut section = sample_section();
    assert!(section.is_root());

    section.parent_id = Some("parent-id".to_string());
    assert!(!section.is_root());
}

#[test]
fn section_serialization() {
    let section = sample_section();

    let json = serde_json::to_string(&section).expect("can serialize json");
    let deserialized: Section = serde_json::from_str(&json).expect("can parse json");

    assert_eq!(section, deserialized);
}

#[test]
fn empty_update_detection() {
    assert!(SectionUpdate::default().is_empty());

    let update = SectionUpdate {
        header: Some("New Header".to_string()),
        ..Default::default()
    };
    assert!(!update.is_empty());

    let update = SectionUpdate {
        slug: Some(None),
        ..Default::default()
    };
    assert!(!update.is_empty(), "clearing the slug is still an update");
}
