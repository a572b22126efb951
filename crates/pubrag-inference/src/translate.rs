//! Natural-language to PubMed query translation.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use pubrag_core::{
    terms_from_value, DateRange, Error, GenerationBackend, PublicationDate, Result,
    StructuredQuery,
};

/// A single Markdown code fence wrapping the whole response.
static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n?(.*?)\n?\s*```\s*$").expect("valid regex")
});

/// Build the user turn sent for a query.
pub fn user_prompt(query: &str) -> String {
    format!("User's natural language query: {}", query)
}

/// Build the system instructions, embedding the default publication window.
pub fn system_prompt(default_range: &DateRange) -> String {
    format!(
        "You are helping with a PubMed query. Take the user input, extract the search terms of \
interest and convert them into a PubMed compatible search using MeSH terms, plus any \
publication dates the user gave.\n\
Return ONLY valid JSON. Do not explain, format or decorate the output.\n\
The JSON object must have exactly these keys:\n\
- \"mesh_terms\": a list of biomedical terms from the query, as MeSH terms where possible.\n\
- \"publication_date\": an object {{\"start\": \"YYYY-MM-DD\", \"end\": \"YYYY-MM-DD\"}}. \
If the user gave no dates, use {}.\n\
- \"pubmed_query\": a properly formatted PubMed search string using [MeSH Terms], \
[All Fields] and [Publication - Date] (or [dp]) tags.",
        default_range
    )
}

/// Strip one surrounding code fence, if present.
fn strip_code_fence(text: &str) -> &str {
    match CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    }
}

/// Parse a completion response into a [`StructuredQuery`].
///
/// The response is untrusted: it must be a JSON object with a non-blank
/// `pubmed_query`. Missing optional keys take their defaults.
pub fn parse_structured_query(response: &str, default_range: &DateRange) -> Result<StructuredQuery> {
    let body = strip_code_fence(response);

    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| Error::Translation(format!("response is not valid JSON: {}", e)))?;
    if !value.is_object() {
        return Err(Error::Translation(
            "response is not a JSON object".to_string(),
        ));
    }

    let pubmed_query = match value.get("pubmed_query").and_then(|q| q.as_str()) {
        Some(q) if !q.trim().is_empty() => q.to_string(),
        Some(_) => return Err(Error::Translation("pubmed_query is blank".to_string())),
        None => {
            return Err(Error::Translation(
                "response has no pubmed_query string".to_string(),
            ))
        }
    };

    let mesh_terms = value
        .get("mesh_terms")
        .map(terms_from_value)
        .unwrap_or_default();

    let publication_date = match value.get("publication_date") {
        None | Some(serde_json::Value::Null) => PublicationDate::Range(default_range.clone()),
        Some(date) => serde_json::from_value(date.clone())
            .unwrap_or_else(|_| PublicationDate::Range(default_range.clone())),
    };

    Ok(StructuredQuery {
        mesh_terms,
        publication_date: Some(publication_date),
        pubmed_query,
    })
}

/// Converts free-text questions into structured literature queries.
#[derive(Clone)]
pub struct QueryTranslator {
    backend: Arc<dyn GenerationBackend>,
    default_range: DateRange,
}

impl QueryTranslator {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self::with_default_range(backend, DateRange::default())
    }

    /// Use `default_range` when the user's query names no dates.
    pub fn with_default_range(backend: Arc<dyn GenerationBackend>, default_range: DateRange) -> Self {
        Self {
            backend,
            default_range,
        }
    }

    pub fn default_range(&self) -> &DateRange {
        &self.default_range
    }

    /// Translate `query` with a single completion request.
    ///
    /// Not retried; a malformed response is an [`Error::Translation`] and
    /// backend errors are returned unchanged.
    pub async fn translate(&self, query: &str) -> Result<StructuredQuery> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("query is empty".to_string()));
        }

        let start = std::time::Instant::now();
        let response = self
            .backend
            .generate_with_system(&system_prompt(&self.default_range), &user_prompt(query))
            .await?;
        debug!(
            subsystem = "inference",
            component = "translator",
            response_len = response.len(),
            "Translator response received"
        );

        let structured = parse_structured_query(&response, &self.default_range)?;

        info!(
            subsystem = "inference",
            component = "translator",
            op = "translate",
            pubmed_query = %structured.pubmed_query,
            mesh_term_count = structured.mesh_terms.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Query translated"
        );
        Ok(structured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> DateRange {
        DateRange::default()
    }

    #[test]
    fn test_user_prompt_format() {
        assert_eq!(
            user_prompt("diabetes treatment 2023"),
            "User's natural language query: diabetes treatment 2023"
        );
    }

    #[test]
    fn test_system_prompt_embeds_default_window() {
        let prompt = system_prompt(&DateRange::new("2020-01-01", "2020-12-31"));
        assert!(prompt.contains("2020-01-01 to 2020-12-31"));
        assert!(prompt.contains("pubmed_query"));
        assert!(prompt.contains("[MeSH Terms]"));
    }

    #[test]
    fn test_parse_full_response() {
        let json = r#"{
            "mesh_terms": ["Diabetes Mellitus", "Therapeutics"],
            "publication_date": {"start": "2023-01-01", "end": "2023-12-31"},
            "pubmed_query": "\"Diabetes Mellitus\"[MeSH Terms] AND 2023[dp]"
        }"#;
        let q = parse_structured_query(json, &range()).unwrap();
        assert_eq!(q.mesh_terms, vec!["Diabetes Mellitus", "Therapeutics"]);
        assert_eq!(
            q.publication_date,
            Some(PublicationDate::Range(DateRange::new("2023-01-01", "2023-12-31")))
        );
        assert!(q.pubmed_query.contains("[MeSH Terms]"));
    }

    #[test]
    fn test_parse_strips_code_fence() {
        let fenced = "```json\n{\"pubmed_query\": \"asthma[MeSH Terms]\"}\n```";
        let q = parse_structured_query(fenced, &range()).unwrap();
        assert_eq!(q.pubmed_query, "asthma[MeSH Terms]");
    }

    #[test]
    fn test_parse_strips_bare_fence() {
        let fenced = "  ```\n{\"pubmed_query\": \"asthma\"}\n```  ";
        let q = parse_structured_query(fenced, &range()).unwrap();
        assert_eq!(q.pubmed_query, "asthma");
    }

    #[test]
    fn test_missing_optional_fields_defaulted() {
        let q = parse_structured_query(r#"{"pubmed_query": "asthma"}"#, &range()).unwrap();
        assert!(q.mesh_terms.is_empty());
        assert_eq!(q.publication_date, Some(PublicationDate::Range(range())));
    }

    #[test]
    fn test_free_text_date_kept() {
        let json = r#"{"pubmed_query": "asthma", "publication_date": "2021-01-01 to 2021-12-31"}"#;
        let q = parse_structured_query(json, &range()).unwrap();
        assert_eq!(
            q.publication_date,
            Some(PublicationDate::Text("2021-01-01 to 2021-12-31".to_string()))
        );
    }

    #[test]
    fn test_not_json_is_translation_error() {
        let err = parse_structured_query("Sure! Here is your query.", &range()).unwrap_err();
        assert!(matches!(err, Error::Translation(_)));
    }

    #[test]
    fn test_json_array_is_translation_error() {
        let err = parse_structured_query(r#"["asthma"]"#, &range()).unwrap_err();
        assert!(matches!(err, Error::Translation(_)));
    }

    #[test]
    fn test_missing_query_is_translation_error() {
        let err = parse_structured_query(r#"{"mesh_terms": ["Asthma"]}"#, &range()).unwrap_err();
        assert!(matches!(err, Error::Translation(_)));
    }

    #[test]
    fn test_mesh_terms_objects_are_dropped() {
        let json = r#"{"mesh_terms": [{"term": "Asthma"}], "pubmed_query": "asthma[MeSH]"}"#;
        let q = parse_structured_query(json, &range()).unwrap();
        assert!(q.mesh_terms.is_empty());
        assert_eq!(q.pubmed_query, "asthma[MeSH]");
    }

    #[test]
    fn test_mesh_terms_null_element_is_dropped() {
        let json = r#"{"mesh_terms": ["Asthma", null], "pubmed_query": "asthma"}"#;
        let q = parse_structured_query(json, &range()).unwrap();
        assert_eq!(q.mesh_terms, vec!["Asthma"]);
        assert_eq!(q.publication_date, Some(PublicationDate::Range(range())));
    }

    #[test]
    fn test_non_string_query_is_translation_error() {
        let err = parse_structured_query(r#"{"pubmed_query": 42}"#, &range()).unwrap_err();
        assert!(matches!(err, Error::Translation(_)));
    }

    #[test]
    fn test_blank_query_is_translation_error() {
        let err = parse_structured_query(r#"{"pubmed_query": "  "}"#, &range()).unwrap_err();
        assert!(err.to_string().contains("blank"));
    }
}
