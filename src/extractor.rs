//! Field extraction
//!
//! Walks the full record collection through the normalizer and produces the
//! seven index-aligned sequences. Records without a usable timestamp are
//! dropped; every other field degrades to missing on its own.

use crate::normalizer::Normalizer;
use crate::schema::RawRecord;
use crate::types::AlignedSequences;
use tracing::{debug, info};

/// Extractor producing aligned sequences from raw records
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldExtractor {
    normalizer: Normalizer,
}

/// Aligned sequences plus the number of records that were dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub sequences: AlignedSequences,
    pub records_dropped: usize,
}

impl FieldExtractor {
    pub fn new(normalizer: Normalizer) -> Self {
        Self { normalizer }
    }

    /// Extract aligned sequences in input order
    pub fn extract(&self, records: &[RawRecord]) -> Extraction {
        let mut sequences = AlignedSequences::with_capacity(records.len());
        let mut records_dropped = 0;

        for (index, record) in records.iter().enumerate() {
            match self.normalizer.normalize(record) {
                Some(sample) => sequences.push(sample),
                None => {
                    records_dropped += 1;
                    debug!(index, "dropping record without a usable timestamp");
                }
            }
        }

        info!(
            records = records.len(),
            samples = sequences.len(),
            dropped = records_dropped,
            "extracted timestamped samples"
        );

        Extraction {
            sequences,
            records_dropped,
        }
    }
}
