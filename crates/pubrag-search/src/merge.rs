//! Rendering of live and cached results into one corpus.

use pubrag_core::{RetrievedResult, Source};

/// Render one result as a Markdown card labelled with `source`.
pub fn render_card(result: &RetrievedResult, source: Source) -> String {
    let meta = &result.metadata;
    let mut card = format!(
        "### Article source: {}\n\
         **Title:** {}\n\
         **Authors:** {}\n\
         **Journal:** {}\n\
         **Published:** {}\n",
        source.card_label(),
        meta.title,
        meta.authors,
        meta.journal,
        meta.publication_date,
    );
    if let (Source::Live, Some(url)) = (source, &result.url) {
        card.push_str(&format!("**URL:** {}\n", url));
    }
    card.push_str(&format!("**Abstract:** {}\n", result.abstract_text));
    if source == Source::Cache {
        card.push_str("---\n");
    }
    card
}

/// Merge live and cached results into the summarization corpus.
///
/// Live cards come first, then cache cards, each in input order. Every
/// result is rendered; an empty list contributes nothing.
pub fn merge_results(live: &[RetrievedResult], cache: &[RetrievedResult]) -> String {
    live.iter()
        .map(|r| render_card(r, Source::Live))
        .chain(cache.iter().map(|r| render_card(r, Source::Cache)))
        .collect::<Vec<_>>()
        .join("\n")
}
