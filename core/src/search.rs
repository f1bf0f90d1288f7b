use crate::index::{DocId, InvertedIndex, PageNumber, TermId};
use crate::tokenizer::tokenize;
use crate::weight;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub document: String,
    pub score: f32,
    /// Pages containing at least one query term, ascending.
    pub pages: Vec<PageNumber>,
}

/// A tokenized query resolved against one index.
///
/// Terms the index has never seen are dropped. Ordered by term id so that score
/// accumulation happens in the same order on every run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryVector {
    counts: BTreeMap<TermId, u32>,
    weights: BTreeMap<TermId, f32>,
}

impl QueryVector {
    pub fn new(index: &InvertedIndex, query: &str) -> Self {
        let mut counts: BTreeMap<TermId, u32> = BTreeMap::new();
        for term in tokenize(query) {
            if let Some(tid) = index.term_id(&term) {
                *counts.entry(tid).or_insert(0) += 1;
            }
        }

        let n = index.num_docs();
        let idf = index.config().idf;
        let mut weights: BTreeMap<TermId, f32> = counts
            .iter()
            .map(|(&tid, &tf_raw)| (tid, weight::weight(tf_raw, index.df_of(tid), n, idf)))
            .collect();
        weight::normalize(weights.values_mut());
        Self { counts, weights }
    }

    /// No query term is known to the index.
    pub fn is_empty(&self) -> bool { self.counts.is_empty() }

    pub fn terms(&self) -> impl Iterator<Item = TermId> + '_ { self.counts.keys().copied() }

    pub fn weight(&self, tid: TermId) -> f32 { self.weights.get(&tid).copied().unwrap_or(0.0) }
}

/// Rank every matching document for `query`, best first.
///
/// Scores are cosine similarities between the query vector and the stored
/// document vectors. Documents scoring zero are left out; equal scores are
/// ordered by document name.
pub fn search(index: &InvertedIndex, query: &str) -> Vec<SearchHit> {
    let qv = QueryVector::new(index, query);
    if qv.is_empty() {
        return Vec::new();
    }

    // Aggregate scores from postings
    let mut scores: HashMap<DocId, f32> = HashMap::new();
    for (&tid, &q_w) in &qv.weights {
        if q_w == 0.0 {
            continue;
        }
        for p in index.postings(tid) {
            *scores.entry(p.doc_id).or_insert(0.0) += p.weight * q_w;
        }
    }

    let mut scored: Vec<(DocId, f32)> = scores
        .into_iter()
        .filter(|(_, s)| s.is_finite() && *s > 0.0)
        .collect();
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| doc_name(index, a.0).cmp(doc_name(index, b.0)))
    });

    scored
        .into_iter()
        .map(|(doc_id, score)| SearchHit {
            doc_id,
            document: doc_name(index, doc_id).to_string(),
            score,
            pages: matching_pages(index, &qv, doc_id),
        })
        .collect()
}

/// [`search`] truncated to the best `k` hits.
pub fn search_top_k(index: &InvertedIndex, query: &str, k: usize) -> Vec<SearchHit> {
    let mut hits = search(index, query);
    hits.truncate(k);
    hits
}

fn doc_name(index: &InvertedIndex, doc_id: DocId) -> &str {
    index.doc(doc_id).map(|d| d.name.as_str()).unwrap_or("")
}

fn matching_pages(index: &InvertedIndex, qv: &QueryVector, doc_id: DocId) -> Vec<PageNumber> {
    let mut pages = BTreeSet::new();
    for tid in qv.terms() {
        if let Some(p) = index.posting(tid, doc_id) {
            pages.extend(p.pages.iter().copied());
        }
    }
    pages.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build, SourceDocument};
    use crate::weight::IndexConfig;

    fn corpus() -> InvertedIndex {
        build(
            &[
                SourceDocument::from_pages("DocA", &["cat dog", "dog bird"]),
                SourceDocument::from_pages("DocB", &["bird fish"]),
            ],
            IndexConfig::default(),
        )
    }

    #[test]
    fn query_vector_ignores_unknown_terms() {
        let index = corpus();
        let qv = QueryVector::new(&index, "dog zebra dog");
        assert_eq!(qv.terms().count(), 1);
        let dog = index.term_id("dog").unwrap();
        assert!((qv.weight(dog) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn pages_include_zero_weight_terms() {
        // "bird" is in every document so it carries no weight, but still marks pages.
        let index = corpus();
        let hits = search(&index, "cat bird");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document, "DocA");
        assert_eq!(hits[0].pages, vec![1, 2]);
    }

    #[test]
    fn top_k_truncates() {
        let index = corpus();
        assert_eq!(search_top_k(&index, "dog fish", 1).len(), 1);
        assert_eq!(search_top_k(&index, "dog fish", 10).len(), 2);
    }
}
