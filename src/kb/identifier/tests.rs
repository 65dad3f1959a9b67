use super::*;

#[test]
fn classifies_uuids_as_ids() {
    let id = "3f0c8f3a-9f2d-4d8e-b9d5-2f6a1c4e5b7d";
    assert_eq!(SectionRef::classify(id), SectionRef::Id(id.to_string()));

    // Surrounding whitespace is tolerated
    assert_eq!(
        SectionRef::classify("  3f0c8f3a-9f2d-4d8e-b9d5-2f6a1c4e5b7d "),
        SectionRef::Id(id.to_string())
    );
}

#[test]
fn classifies_dotted_numbers_as_paths() {
    assert_eq!(SectionRef::classify("1"), SectionRef::Path(vec![1]));
    assert_eq!(SectionRef::classify("1.1"), SectionRef::Path(vec![1, 1]));
    assert_eq!(
        SectionRef::classify("2.13.1"),
        SectionRef::Path(vec![2, 13, 1])
    );
}

#[test]
fn classifies_everything_else_as_slugs() {
    assert_eq!(
        SectionRef::classify("revenue-analysis"),
        SectionRef::Slug("revenue-analysis".to_string())
    );
    assert_eq!(
        SectionRef::classify("1.x"),
        SectionRef::Slug("1.x".to_string())
    );
    assert_eq!(
        SectionRef::classify("1..2"),
        SectionRef::Slug("1..2".to_string()),
        "empty path components are not a path"
    );
    assert_eq!(
        SectionRef::classify("1.2."),
        SectionRef::Slug("1.2.".to_string())
    );
    assert_eq!(SectionRef::classify(""), SectionRef::Slug(String::new()));
}

#[test]
fn malformed_uuid_falls_through_to_slug() {
    assert_eq!(
        SectionRef::classify("3f0c8f3a-9f2d-4d8e-b9d5"),
        SectionRef::Slug("3f0c8f3a-9f2d-4d8e-b9d5".to_string())
    );
}

#[test]
fn slugify_basic() {
    assert_eq!(slugify("Annual Report 2024"), "annual-report-2024");
    assert_eq!(slugify("Revenue Analysis"), "revenue-analysis");
}

#[test]
fn slugify_drops_punctuation() {
    assert_eq!(slugify("Q3: Revenue & Costs!"), "q3-revenue-costs");
    assert_eq!(slugify("R&D"), "rd");
}

#[test]
fn slugify_collapses_separator_runs() {
    assert_eq!(slugify("foo   bar"), "foo-bar");
    assert_eq!(slugify("foo_bar-baz"), "foo-bar-baz");
    assert_eq!(slugify("  --foo--  "), "foo");
}

#[test]
fn slugify_can_be_empty() {
    assert_eq!(slugify(""), "");
    assert_eq!(slugify("!!!"), "");
    assert_eq!(slugify(" - _ "), "");
}

#[test]
fn slugify_lowercases_unicode() {
    assert_eq!(slugify("Überblick"), "überblick");
}
