use crate::weight::IndexConfig;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type TermId = u32;
pub type DocId = u32;
/// 1-based page number inside a document.
pub type PageNumber = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMeta {
    /// Path of the PDF relative to the indexed folder, e.g. `reports/q3.pdf`.
    pub name: String,
    pub num_pages: u32,
    pub num_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    /// Raw occurrences of the term across the whole document.
    pub tf: u32,
    pub weight: f32, // normalized tf-idf weight
    /// Pages containing the term, ascending. Used for match locations only.
    pub pages: Vec<PageNumber>,
}

/// Immutable TF-IDF index over a set of documents.
///
/// Built by [`crate::IndexBuilder`], read by [`crate::search`], and written or
/// read whole by [`crate::persist`]. Nothing mutates it after the build, so the
/// weights cached in the postings always match the counts next to them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub(crate) config: IndexConfig,
    pub(crate) dictionary: HashMap<String, TermId>,
    pub(crate) df: Vec<u32>,
    pub(crate) postings: HashMap<TermId, Vec<Posting>>, // postings sorted by doc_id
    pub(crate) docs: Vec<DocMeta>,                       // indexed by DocId
    pub(crate) num_docs: u32,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn config(&self) -> IndexConfig { self.config }
    pub fn num_docs(&self) -> u32 { self.num_docs }
    pub fn num_terms(&self) -> usize { self.dictionary.len() }
    pub fn is_empty(&self) -> bool { self.num_docs == 0 }

    pub fn docs(&self) -> &[DocMeta] { &self.docs }

    pub fn doc(&self, doc_id: DocId) -> Option<&DocMeta> { self.docs.get(doc_id as usize) }

    pub fn doc_id(&self, name: &str) -> Option<DocId> {
        self.docs.iter().position(|d| d.name == name).map(|i| i as DocId)
    }

    pub fn term_id(&self, term: &str) -> Option<TermId> { self.dictionary.get(term).copied() }

    /// Number of documents containing `term`; zero for unseen terms.
    pub fn df(&self, term: &str) -> u32 {
        self.term_id(term).map(|tid| self.df_of(tid)).unwrap_or(0)
    }

    pub(crate) fn df_of(&self, tid: TermId) -> u32 { self.df.get(tid as usize).copied().unwrap_or(0) }

    pub fn postings(&self, tid: TermId) -> &[Posting] {
        self.postings.get(&tid).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn posting(&self, tid: TermId, doc_id: DocId) -> Option<&Posting> {
        let list = self.postings(tid);
        list.binary_search_by_key(&doc_id, |p| p.doc_id).ok().map(|i| &list[i])
    }

    /// Term -> raw count for one document. Terms absent from the document are absent here.
    pub fn term_frequencies(&self, doc_id: DocId) -> BTreeMap<&str, u32> {
        self.per_doc(doc_id, |p| p.tf)
    }

    /// Term -> normalized TF-IDF weight for one document.
    pub fn doc_weights(&self, doc_id: DocId) -> BTreeMap<&str, f32> {
        self.per_doc(doc_id, |p| p.weight)
    }

    /// Term -> document frequency, ordered by term.
    pub fn document_frequencies(&self) -> BTreeMap<&str, u32> {
        self.dictionary.iter().map(|(t, &tid)| (t.as_str(), self.df_of(tid))).collect()
    }

    fn per_doc<T>(&self, doc_id: DocId, f: impl Fn(&Posting) -> T) -> BTreeMap<&str, T> {
        self.dictionary
            .iter()
            .filter_map(|(term, &tid)| self.posting(tid, doc_id).map(|p| (term.as_str(), f(p))))
            .collect()
    }

    /// Check the structural invariants. Used after decoding persisted bytes.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_docs as usize != self.docs.len() {
            return Err(format!("num_docs {} but {} document entries", self.num_docs, self.docs.len()));
        }
        if self.df.len() != self.dictionary.len() {
            return Err(format!("{} df entries for {} terms", self.df.len(), self.dictionary.len()));
        }
        let mut seen = vec![false; self.df.len()];
        for (term, &tid) in &self.dictionary {
            match seen.get_mut(tid as usize) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(format!("term {term:?} has invalid or duplicate id {tid}")),
            }
        }
        for (tid, &df) in self.df.iter().enumerate() {
            let list = self.postings(tid as TermId);
            if list.len() != df as usize {
                return Err(format!("term id {tid}: df {df} but {} postings", list.len()));
            }
            for (i, p) in list.iter().enumerate() {
                if i > 0 && list[i - 1].doc_id >= p.doc_id {
                    return Err(format!("term id {tid}: postings not sorted by doc id"));
                }
                let Some(doc) = self.doc(p.doc_id) else {
                    return Err(format!("term id {tid}: posting for unknown doc {}", p.doc_id));
                };
                if p.tf == 0 || p.pages.is_empty() || !p.weight.is_finite() {
                    return Err(format!("term id {tid}: empty posting for doc {}", p.doc_id));
                }
                if p.pages.windows(2).any(|w| w[0] >= w[1])
                    || p.pages.iter().any(|&pg| pg > doc.num_pages)
                {
                    return Err(format!("term id {tid}: bad page list for doc {}", p.doc_id));
                }
            }
        }
        if self.postings.keys().any(|&tid| tid as usize >= self.df.len()) {
            return Err("postings reference unknown term ids".into());
        }
        Ok(())
    }
}
