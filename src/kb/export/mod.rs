
use std::collections::HashSet;

use crate::database::sqlite::Section;

/// Render sections as an indented tree with dotted position prefixes.
///
/// Roots are detected relative to the given set, so a subtree renders with
/// its requested root at depth 0 and positions numbered within the export.
/// Each section contributes a `"{path}. {header}"` line followed by its
/// non-blank content lines, indented two spaces per depth level.
#[inline]
pub fn render_tree(sections: &[Section]) -> String {
    let ids: HashSet<&str> = sections.iter().map(|s| s.id.as_str()).collect();

    let mut roots: Vec<&Section> = sections
        .iter()
        .filter(|s| {
            s.parent_id
                .as_deref()
                .is_none_or(|parent| !ids.contains(parent))
        })
        .collect();
    roots.sort_by_key(|s| (s.order, s.created_at));

    let mut lines = Vec::new();
    for (index, root) in roots.iter().enumerate() {
        render_section(root, sections, &(index + 1).to_string(), 0, &mut lines);
    }

    lines.join("\n")
}

fn render_section(
    section: &Section,
    sections: &[Section],
    path: &str,
    depth: usize,
    lines: &mut Vec<String>,
) {
    let indent = "  ".repeat(depth);
    lines.push(format!("{indent}{path}. {}", section.header));

    for line in section.content.lines() {
        if !line.trim().is_empty() {
            lines.push(format!("{indent}  {line}"));
        }
    }

    let mut children: Vec<&Section> = sections
        .iter()
        .filter(|s| s.parent_id.as_deref() == Some(section.id.as_str()))
        .collect();
    children.sort_by_key(|s| (s.order, s.created_at));

    for (index, child) in children.iter().enumerate() {
        render_section(
            child,
            sections,
            &format!("{path}.{}", index + 1),
            depth + 1,
            lines,
        );
    }
}
