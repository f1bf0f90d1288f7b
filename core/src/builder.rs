use crate::index::{DocId, DocMeta, InvertedIndex, PageNumber, Posting, TermId};
use crate::tokenizer::tokenize;
use crate::weight::{self, IndexConfig};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Raw text of one page as produced by extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    pub number: PageNumber,
    pub text: String,
}

impl PageText {
    pub fn new(number: PageNumber, text: impl Into<String>) -> Self {
        Self { number, text: text.into() }
    }
}

/// A document ready for indexing: its identifier and its pages in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub name: String,
    pub pages: Vec<PageText>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, pages: Vec<PageText>) -> Self {
        Self { name: name.into(), pages }
    }

    /// Convenience for tests and callers holding plain strings: pages are numbered from 1.
    pub fn from_pages<S: AsRef<str>>(name: impl Into<String>, pages: &[S]) -> Self {
        let pages = pages
            .iter()
            .enumerate()
            .map(|(i, text)| PageText::new(i as PageNumber + 1, text.as_ref()))
            .collect();
        Self::new(name, pages)
    }
}

struct RawPosting {
    doc_id: DocId,
    tf: u32,
    pages: Vec<PageNumber>,
}

/// Accumulates documents, then derives the weighted index in [`IndexBuilder::finish`].
pub struct IndexBuilder {
    config: IndexConfig,
    dictionary: HashMap<String, TermId>,
    df: Vec<u32>,
    postings_raw: HashMap<TermId, Vec<RawPosting>>,
    docs: Vec<DocMeta>,
    names: HashSet<String>,
}

impl IndexBuilder {
    pub fn new(config: IndexConfig) -> Self {
        Self {
            config,
            dictionary: HashMap::new(),
            df: Vec::new(),
            postings_raw: HashMap::new(),
            docs: Vec::new(),
            names: HashSet::new(),
        }
    }

    pub fn num_docs(&self) -> usize { self.docs.len() }

    /// Add one document. Returns `false` and skips it when a document with the
    /// same name was already added.
    pub fn add_document(&mut self, doc: &SourceDocument) -> bool {
        if !self.names.insert(doc.name.clone()) {
            tracing::warn!(document = %doc.name, "duplicate document name, skipping");
            return false;
        }
        let doc_id = self.docs.len() as DocId;

        // Per-document term counts and the pages each term occurs on
        let mut counts: HashMap<TermId, (u32, Vec<PageNumber>)> = HashMap::new();
        let mut num_tokens: u64 = 0;
        for page in &doc.pages {
            for term in tokenize(&page.text) {
                num_tokens += 1;
                let tid = match self.dictionary.get(&term) {
                    Some(&tid) => tid,
                    None => {
                        let tid = self.df.len() as TermId;
                        self.dictionary.insert(term, tid);
                        self.df.push(0);
                        tid
                    }
                };
                let (count, pages) = counts.entry(tid).or_insert_with(|| (0, Vec::new()));
                *count += 1;
                if pages.last() != Some(&page.number) {
                    pages.push(page.number);
                }
            }
        }

        let num_terms = counts.len();
        for (tid, (tf, mut pages)) in counts {
            pages.sort_unstable();
            pages.dedup();
            self.df[tid as usize] += 1;
            self.postings_raw.entry(tid).or_default().push(RawPosting { doc_id, tf, pages });
        }

        let num_pages = doc.pages.iter().map(|p| p.number).max().unwrap_or(0);
        tracing::debug!(document = %doc.name, doc_id, num_pages, num_tokens, num_terms, "indexed document");
        self.docs.push(DocMeta { name: doc.name.clone(), num_pages, num_tokens });
        true
    }

    /// Compute cosine-normalized TF-IDF weights and produce the final index.
    pub fn finish(self) -> InvertedIndex {
        let num_docs = self.docs.len() as u32;
        let idf_variant = self.config.idf;

        // First pass: raw tf-idf weights and squared norms per document.
        // Walk term ids in order so norms are summed identically on every build.
        let mut postings_raw = self.postings_raw;
        let mut doc_norms: Vec<f32> = vec![0.0; self.docs.len()];
        let mut postings: HashMap<TermId, Vec<Posting>> = HashMap::with_capacity(postings_raw.len());
        for (tid, &df_t) in self.df.iter().enumerate() {
            let tid = tid as TermId;
            let Some(plist) = postings_raw.remove(&tid) else { continue };
            let out: Vec<Posting> = plist
                .into_iter()
                .map(|raw| {
                    let w = weight::weight(raw.tf, df_t, num_docs, idf_variant);
                    doc_norms[raw.doc_id as usize] += w * w;
                    Posting { doc_id: raw.doc_id, tf: raw.tf, weight: w, pages: raw.pages }
                })
                .collect();
            postings.insert(tid, out);
        }
        for dn in doc_norms.iter_mut() {
            *dn = dn.sqrt();
            if *dn == 0.0 { *dn = 1.0; }
        }

        // Second pass: normalize. Documents are added in id order, so lists are already sorted.
        for plist in postings.values_mut() {
            for p in plist.iter_mut() {
                p.weight /= doc_norms[p.doc_id as usize];
            }
            debug_assert!(plist.windows(2).all(|w| w[0].doc_id < w[1].doc_id));
        }

        tracing::info!(num_docs, num_terms = self.dictionary.len(), idf = ?idf_variant, "index built");
        InvertedIndex {
            config: self.config,
            dictionary: self.dictionary,
            df: self.df,
            postings,
            docs: self.docs,
            num_docs,
        }
    }
}

/// Build an index from scratch over `documents`.
pub fn build(documents: &[SourceDocument], config: IndexConfig) -> InvertedIndex {
    let mut builder = IndexBuilder::new(config);
    for doc in documents {
        builder.add_document(doc);
    }
    builder.finish()
}
