#[cfg(test)]
mod tests;

use uuid::Uuid;

/// A caller-supplied section identifier, classified by shape.
///
/// Classification is purely syntactic and happens before any store lookup:
/// a UUID resolves as a section id, a dotted-numeric string as a positional
/// path, and anything else as a slug. There is no cross-mode fallback, so
/// each resolution failure is reported against the attempted mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionRef {
    Id(String),
    Path(Vec<usize>),
    Slug(String),
}

impl SectionRef {
    #[inline]
    pub fn classify(identifier: &str) -> Self {
        let trimmed = identifier.trim();

        if Uuid::parse_str(trimmed).is_ok() {
            return SectionRef::Id(trimmed.to_string());
        }

        if let Some(parts) = parse_path(trimmed) {
            return SectionRef::Path(parts);
        }

        SectionRef::Slug(trimmed.to_string())
    }
}

/// Parse a dotted path of 1-based positions (`"1"`, `"1.2"`, `"2.3.1"`).
fn parse_path(identifier: &str) -> Option<Vec<usize>> {
    if identifier.is_empty() {
        return None;
    }

    identifier
        .split('.')
        .map(|part| {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                None
            } else {
                part.parse::<usize>().ok()
            }
        })
        .collect()
}

/// Derive a URL-safe slug from a header.
///
/// Lowercases, drops punctuation, and collapses whitespace, underscores, and
/// hyphen runs into single hyphens. Returns an empty string when the header
/// has no usable characters.
#[inline]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for ch in text.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_separator = true;
        }
    }

    slug
}
