use std::collections::HashMap;

use rayon::prelude::*;

use crate::types::{Descriptor, FeatureMatch};

const DESCRIPTOR_BITS: u32 = 256;

/// Hamming distance between two binary descriptors, in bits.
pub fn descriptor_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x ^ y).count_ones())
        .sum()
}

fn normalized(bits: u32) -> f32 {
    bits as f32 / DESCRIPTOR_BITS as f32
}

/// Pairwise descriptor matching. Implementations return at most one match
/// per query descriptor and an empty set if either input is empty.
pub trait DescriptorMatcher: Send + Sync {
    fn match_descriptors(&self, query: &[Descriptor], train: &[Descriptor]) -> Vec<FeatureMatch>;
}

/// Exact nearest-neighbour search over all train descriptors.
#[derive(Debug, Default)]
pub struct BruteForceMatcher;

impl DescriptorMatcher for BruteForceMatcher {
    fn match_descriptors(&self, query: &[Descriptor], train: &[Descriptor]) -> Vec<FeatureMatch> {
        if query.is_empty() || train.is_empty() {
            return Vec::new();
        }
        query
            .par_iter()
            .enumerate()
            .map(|(query_idx, q)| {
                let (train_idx, bits) = train
                    .iter()
                    .enumerate()
                    .map(|(i, t)| (i, descriptor_distance(q, t)))
                    .min_by_key(|&(_, d)| d)
                    .expect("train set is non-empty");
                FeatureMatch {
                    query_idx,
                    train_idx,
                    distance: normalized(bits),
                }
            })
            .collect()
    }
}

// 32 bytes split into 4 bands of 8; identical descriptors always collide
// in every band, near-identical ones in most.
const BAND_COUNT: usize = 4;
const BAND_BYTES: usize = 8;

/// Approximate matcher: train descriptors are bucketed by byte-band, each
/// query is re-ranked by exact Hamming distance over its bucket candidates
/// only. Queries whose bands collide with nothing yield no match.
#[derive(Debug, Default)]
pub struct LshMatcher;

impl LshMatcher {
    fn band(descriptor: &Descriptor, band_idx: usize) -> [u8; BAND_BYTES] {
        let start = band_idx * BAND_BYTES;
        descriptor[start..start + BAND_BYTES]
            .try_into()
            .expect("band slice is BAND_BYTES long")
    }
}

impl DescriptorMatcher for LshMatcher {
    fn match_descriptors(&self, query: &[Descriptor], train: &[Descriptor]) -> Vec<FeatureMatch> {
        if query.is_empty() || train.is_empty() {
            return Vec::new();
        }

        let mut tables: Vec<HashMap<[u8; BAND_BYTES], Vec<usize>>> =
            vec![HashMap::new(); BAND_COUNT];
        for (train_idx, t) in train.iter().enumerate() {
            for (band_idx, table) in tables.iter_mut().enumerate() {
                table
                    .entry(Self::band(t, band_idx))
                    .or_default()
                    .push(train_idx);
            }
        }

        query
            .par_iter()
            .enumerate()
            .filter_map(|(query_idx, q)| {
                let mut candidates: Vec<usize> = tables
                    .iter()
                    .enumerate()
                    .filter_map(|(band_idx, table)| table.get(&Self::band(q, band_idx)))
                    .flatten()
                    .copied()
                    .collect();
                candidates.sort_unstable();
                candidates.dedup();

                candidates
                    .into_iter()
                    .map(|train_idx| (train_idx, descriptor_distance(q, &train[train_idx])))
                    .min_by_key(|&(_, d)| d)
                    .map(|(train_idx, bits)| FeatureMatch {
                        query_idx,
                        train_idx,
                        distance: normalized(bits),
                    })
            })
            .collect()
    }
}

/// Matcher strategy selectable from the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MatcherKind {
    Exact,
    Approximate,
}

impl MatcherKind {
    pub fn create(&self) -> Box<dyn DescriptorMatcher> {
        match self {
            MatcherKind::Exact => Box::new(BruteForceMatcher),
            MatcherKind::Approximate => Box::new(LshMatcher),
        }
    }
}
