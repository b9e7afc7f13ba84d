//! Table relevance ranking
//!
//! Scores each table's corpus document against the question with TF-IDF
//! weighting and cosine similarity. This is a bag-of-words heuristic, not
//! semantic understanding: it is deliberately simple, deterministic, and
//! cheap, and it only has to narrow the schema shown to the generator, not
//! answer the question.

use std::collections::HashMap;

/// Words carrying no table-selection signal, removed before weighting
const STOPWORDS: &[&str] = &[
    "a", "about", "all", "an", "and", "any", "are", "as", "at", "be", "been", "but", "by", "can",
    "did", "do", "does", "each", "every", "find", "for", "from", "get", "give", "had", "has",
    "have", "how", "i", "in", "is", "it", "its", "list", "many", "me", "much", "my", "no", "not",
    "of", "on", "or", "our", "per", "show", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "to", "us", "was", "we", "were", "what", "when",
    "where", "which", "who", "will", "with", "you", "your",
];

/// A ranked table with its similarity score
#[derive(Debug, Clone, PartialEq)]
pub struct TableScore {
    /// Table name
    pub table: String,
    /// Cosine similarity against the question, in (0, 1]
    pub score: f32,
}

/// TF-IDF index over the table corpus.
///
/// Fitted once per schema and passed to the orchestrator as an explicit
/// dependency; there is no hidden process-wide cache. For a fixed corpus the
/// ranking is fully deterministic.
pub struct TableRanker {
    tables: Vec<String>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    doc_vectors: Vec<Vec<f32>>,
}

impl TableRanker {
    /// Fit the index on `(table, document)` pairs, in schema enumeration
    /// order. That order is the tie-break for equal scores.
    #[must_use]
    pub fn fit(corpus: &[(String, String)]) -> Self {
        let tokenized: Vec<Vec<String>> = corpus.iter().map(|(_, doc)| tokenize(doc)).collect();

        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: Vec<usize> = Vec::new();

        for terms in &tokenized {
            let mut seen: Vec<usize> = Vec::new();
            for term in terms {
                let next_id = vocabulary.len();
                let id = *vocabulary.entry(term.clone()).or_insert(next_id);
                if id == document_frequency.len() {
                    document_frequency.push(0);
                }
                if !seen.contains(&id) {
                    document_frequency[id] += 1;
                    seen.push(id);
                }
            }
        }

        // Smoothed IDF, as if one extra document contained every term
        let doc_count = corpus.len() as f32;
        let idf: Vec<f32> = document_frequency
            .iter()
            .map(|&df| ((1.0 + doc_count) / (1.0 + df as f32)).ln() + 1.0)
            .collect();

        let doc_vectors = tokenized
            .iter()
            .map(|terms| weigh(terms, &vocabulary, &idf))
            .collect();

        Self {
            tables: corpus.iter().map(|(name, _)| name.clone()).collect(),
            vocabulary,
            idf,
            doc_vectors,
        }
    }

    /// Rank tables against a question.
    ///
    /// Returns at most `k` tables by descending similarity. Tables with no
    /// textual overlap score zero and are excluded entirely: they are
    /// irrelevant, not merely least relevant. Equal scores keep enumeration
    /// order (the sort is stable).
    #[must_use]
    pub fn rank(&self, question: &str, k: usize) -> Vec<TableScore> {
        let query = weigh(&tokenize(question), &self.vocabulary, &self.idf);

        let mut scored: Vec<TableScore> = self
            .doc_vectors
            .iter()
            .enumerate()
            .map(|(idx, doc)| TableScore {
                table: self.tables[idx].clone(),
                score: dot(&query, doc),
            })
            .filter(|ts| ts.score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    /// Number of tables in the index
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the index is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Lowercase, split on non-alphanumerics, drop single letters and stopwords,
/// then emit unigrams plus adjacent bigrams.
fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 1 && !STOPWORDS.contains(w))
        .collect();

    let mut terms: Vec<String> = words.iter().map(|w| (*w).to_string()).collect();
    for pair in words.windows(2) {
        terms.push(format!("{} {}", pair[0], pair[1]));
    }
    terms
}

/// TF-IDF weigh a term list into an L2-normalized dense vector.
fn weigh(terms: &[String], vocabulary: &HashMap<String, usize>, idf: &[f32]) -> Vec<f32> {
    let mut vector = vec![0.0f32; idf.len()];
    for term in terms {
        if let Some(&id) = vocabulary.get(term) {
            vector[id] += 1.0;
        }
    }
    for (id, weight) in vector.iter_mut().enumerate() {
        *weight *= idf[id];
    }

    let norm = vector.iter().map(|w| w * w).sum::<f32>().sqrt();
    if norm > 0.0 {
        for weight in &mut vector {
            *weight /= norm;
        }
    }
    vector
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_corpus() -> Vec<(String, String)> {
        vec![
            (
                "customers".to_string(),
                "customers customer id first name last name email city state \
                 registration date"
                    .to_string(),
            ),
            (
                "products".to_string(),
                "products product id product name category price stock quantity description"
                    .to_string(),
            ),
            (
                "orders".to_string(),
                "orders order id customer id order date status total amount".to_string(),
            ),
        ]
    }

    #[test]
    fn test_rank_prefers_matching_table() {
        let ranker = TableRanker::fit(&sample_corpus());
        let ranked = ranker.rank("Show me all customers", 3);

        assert!(!ranked.is_empty());
        assert_eq!(ranked[0].table, "customers");
        assert!(ranked[0].score > 0.0);
    }

    #[test]
    fn test_rank_excludes_zero_overlap() {
        let ranker = TableRanker::fit(&sample_corpus());
        let ranked = ranker.rank("average price of products", 3);

        assert!(ranked.iter().all(|ts| ts.table != "customers"));
    }

    #[test]
    fn test_rank_no_overlap_at_all() {
        let ranker = TableRanker::fit(&sample_corpus());
        assert!(ranker.rank("quarterly payroll summary", 3).is_empty());
    }

    #[test]
    fn test_rank_is_deterministic() {
        let ranker = TableRanker::fit(&sample_corpus());
        let first = ranker.rank("orders with the highest total amount", 3);
        let second = ranker.rank("orders with the highest total amount", 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_rank_respects_k() {
        let ranker = TableRanker::fit(&sample_corpus());
        let ranked = ranker.rank("id name date", 1);
        assert!(ranked.len() <= 1);
    }

    #[test]
    fn test_equal_scores_keep_enumeration_order() {
        let corpus = vec![
            ("alpha".to_string(), "shared token".to_string()),
            ("beta".to_string(), "shared token".to_string()),
        ];
        let ranker = TableRanker::fit(&corpus);
        let ranked = ranker.rank("shared token", 2);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].table, "alpha");
        assert_eq!(ranked[1].table, "beta");
    }

    #[test]
    fn test_tokenize_bigrams_and_stopwords() {
        let terms = tokenize("Show me the order date");
        assert!(terms.contains(&"order".to_string()));
        assert!(terms.contains(&"order date".to_string()));
        assert!(!terms.contains(&"the".to_string()));
    }
}
