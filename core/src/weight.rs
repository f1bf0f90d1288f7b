//! TF-IDF weighting shared by document and query vectors.
//!
//! TF is log-scaled (`1 + ln(count)`). IDF is `ln(N / df)`, or the smoothed
//! `ln(1 + N / df)` when the index was built with [`IdfVariant::Smoothed`].
//! Unseen terms (`df == 0`) and empty corpora (`N == 0`) weigh zero.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdfVariant {
    /// `ln(N / df)`. A term present in every document weighs zero.
    #[default]
    Standard,
    /// `ln(1 + N / df)`. Always positive for seen terms.
    Smoothed,
}

/// Weighting parameters fixed at build time and stored with the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    pub idf: IdfVariant,
}

impl IndexConfig {
    pub fn smoothed() -> Self {
        Self { idf: IdfVariant::Smoothed }
    }
}

#[inline]
pub fn tf(raw_count: u32) -> f32 {
    if raw_count > 0 { 1.0 + (raw_count as f32).ln() } else { 0.0 }
}

#[inline]
pub fn idf(df: u32, num_docs: u32, variant: IdfVariant) -> f32 {
    if df == 0 || num_docs == 0 {
        return 0.0;
    }
    let ratio = num_docs as f32 / df as f32;
    match variant {
        IdfVariant::Standard => ratio.ln(),
        IdfVariant::Smoothed => (1.0 + ratio).ln(),
    }
}

/// Weight of a term occurring `raw_count` times, given its document frequency.
pub fn weight(raw_count: u32, df: u32, num_docs: u32, variant: IdfVariant) -> f32 {
    tf(raw_count) * idf(df, num_docs, variant)
}

/// Scale weights to unit length in place. A zero vector is left untouched.
pub fn normalize<'a, I>(weights: I)
where
    I: IntoIterator<Item = &'a mut f32>,
{
    let mut items: Vec<&mut f32> = weights.into_iter().collect();
    let norm = items.iter().map(|w| **w * **w).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return;
    }
    for w in items.iter_mut() {
        **w /= norm;
    }
}
