//! Helpers for the optional web-evidence stage.

use banter_core::Document;

/// Build the retrieval query from the running summary and the utterance.
#[must_use]
pub fn build_search_query(summary: &str, utterance: &str) -> String {
    if summary.is_empty() {
        format!("Current prompt: {utterance}")
    } else {
        format!("Chat summary: {summary}\nCurrent prompt: {utterance}")
    }
}

/// Render documents as `source: content` entries separated by blank lines.
/// Returns `None` when there is nothing to cite.
#[must_use]
pub fn format_evidence(documents: &[Document]) -> Option<String> {
    if documents.is_empty() {
        return None;
    }
    Some(
        documents
            .iter()
            .map(|d| format!("{}: {}", d.source, d.content))
            .collect::<Vec<_>>()
            .join("\n\n"),
    )
}

/// Source identifiers in retrieval order, duplicates removed.
#[must_use]
pub fn distinct_sources(documents: &[Document]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::with_capacity(documents.len());
    for document in documents {
        if !sources.contains(&document.source) {
            sources.push(document.source.clone());
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query() {
        assert_eq!(build_search_query("", "weather?"), "Current prompt: weather?");
        assert_eq!(
            build_search_query("Ada is in Oslo.", "weather?"),
            "Chat summary: Ada is in Oslo.\nCurrent prompt: weather?"
        );
    }

    #[test]
    fn test_format_evidence() {
        assert_eq!(format_evidence(&[]), None);
        let documents = vec![
            Document::new("https://a.example", "first"),
            Document::new("https://b.example", "second"),
        ];
        assert_eq!(
            format_evidence(&documents).unwrap(),
            "https://a.example: first\n\nhttps://b.example: second"
        );
    }

    #[test]
    fn test_distinct_sources_keep_order() {
        let documents = vec![
            Document::new("b", "1"),
            Document::new("a", "2"),
            Document::new("b", "3"),
        ];
        assert_eq!(distinct_sources(&documents), vec!["b", "a"]);
    }
}
