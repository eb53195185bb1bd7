//! Retrieval boundary and the bundled static retriever
//!
//! The pipeline only knows the [`Retriever`] trait. Retrieval is
//! infallible by contract: an unavailable or empty backend returns no
//! citations and the pipeline raises `rag_unavailable` downstream.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

use crate::domain::Citation;

/// Excerpt length stored on each citation
const EXCERPT_CHARS: usize = 240;

/// Evidence retrieval boundary
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Top-k citations for a query within a domain, best first
    ///
    /// Returns an empty vector when nothing matches or the backend is
    /// unavailable; never errors.
    async fn retrieve(&self, domain: &str, query: &str, top_k: usize) -> Vec<Citation>;
}

/// One document in the static corpus
#[derive(Debug, Clone, Deserialize)]
pub struct CorpusEntry {
    pub source_id: String,
    pub title: String,
    #[serde(default)]
    pub domain: String,
    pub text: String,
}

/// Keyword-scored retriever over an in-memory corpus
///
/// Loads a YAML document list from disk, or falls back to a small
/// built-in corpus. Intended for development and tests; production
/// deployments put a real search backend behind [`Retriever`].
pub struct StaticRetriever {
    entries: Vec<CorpusEntry>,
}

impl StaticRetriever {
    pub fn new(entries: Vec<CorpusEntry>) -> Self {
        Self { entries }
    }

    /// Empty retriever; every call yields zero citations
    pub fn empty() -> Self {
        Self { entries: vec![] }
    }

    /// Load a corpus from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let entries: Vec<CorpusEntry> = serde_yaml::from_str(&content)?;
        debug!(count = entries.len(), path = %path.as_ref().display(), "StaticRetriever::from_yaml_file: loaded corpus");
        Ok(Self { entries })
    }

    /// Built-in sample corpus covering the builtin domains
    pub fn builtin() -> Self {
        let yaml = include_str!("../corpus/builtin.yml");
        let entries: Vec<CorpusEntry> = serde_yaml::from_str(yaml).expect("builtin corpus parses");
        Self { entries }
    }

    fn score(entry: &CorpusEntry, query_tokens: &[String]) -> f32 {
        if query_tokens.is_empty() {
            return 0.0;
        }
        let haystack = format!("{} {}", entry.title, entry.text).to_lowercase();
        let hits = query_tokens.iter().filter(|t| haystack.contains(t.as_str())).count();
        hits as f32 / query_tokens.len() as f32
    }
}

fn query_tokens(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 3)
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, domain: &str, query: &str, top_k: usize) -> Vec<Citation> {
        debug!(%domain, %query, top_k, corpus = self.entries.len(), "StaticRetriever::retrieve: called");
        let tokens = query_tokens(query);

        let mut scored: Vec<(f32, &CorpusEntry)> = self
            .entries
            .iter()
            .filter(|e| e.domain.is_empty() || e.domain == domain)
            .map(|e| (Self::score(e, &tokens), e))
            .filter(|(score, _)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        if scored.is_empty() {
            warn!(%domain, "retrieve: no matches");
        }

        scored
            .into_iter()
            .map(|(score, entry)| Citation {
                source_id: entry.source_id.clone(),
                title: entry.title.clone(),
                score,
                excerpt: entry.text.chars().take(EXCERPT_CHARS).collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<CorpusEntry> {
        vec![
            CorpusEntry {
                source_id: "KB-IT-0001".to_string(),
                title: "VPN setup guide".to_string(),
                domain: "it".to_string(),
                text: "Install the VPN client from the software portal and sign in with SSO.".to_string(),
            },
            CorpusEntry {
                source_id: "KB-IT-0002".to_string(),
                title: "Password reset".to_string(),
                domain: "it".to_string(),
                text: "Passwords can be reset from the account portal after MFA verification.".to_string(),
            },
            CorpusEntry {
                source_id: "KB-HR-0001".to_string(),
                title: "Vacation policy".to_string(),
                domain: "hr".to_string(),
                text: "Employees accrue vacation days monthly and request leave in the HR portal.".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn test_retrieve_ranks_by_overlap() {
        let retriever = StaticRetriever::new(corpus());
        let citations = retriever.retrieve("it", "how do I set up the vpn client", 4).await;

        assert!(!citations.is_empty());
        assert_eq!(citations[0].source_id, "KB-IT-0001");
        assert!(citations[0].score > 0.0);
    }

    #[tokio::test]
    async fn test_retrieve_filters_by_domain() {
        let retriever = StaticRetriever::new(corpus());
        let citations = retriever.retrieve("hr", "vpn client setup", 4).await;
        assert!(citations.iter().all(|c| c.source_id.starts_with("KB-HR")));
    }

    #[tokio::test]
    async fn test_retrieve_respects_top_k() {
        let retriever = StaticRetriever::new(corpus());
        let citations = retriever.retrieve("it", "portal", 1).await;
        assert!(citations.len() <= 1);
    }

    #[tokio::test]
    async fn test_empty_retriever_yields_nothing() {
        let retriever = StaticRetriever::empty();
        let citations = retriever.retrieve("it", "vpn", 4).await;
        assert!(citations.is_empty());
    }

    #[tokio::test]
    async fn test_builtin_corpus_loads() {
        let retriever = StaticRetriever::builtin();
        let citations = retriever.retrieve("it", "vpn setup", 4).await;
        assert!(!citations.is_empty());
    }

    #[test]
    fn test_query_tokens_drop_short_words() {
        let tokens = query_tokens("how do I set up my VPN?");
        assert!(tokens.contains(&"vpn".to_string()));
        assert!(!tokens.contains(&"do".to_string()));
    }
}
