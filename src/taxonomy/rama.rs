use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use regex::Regex;

use super::normalize::{fold_text, lower_composed};
use crate::model::{CategoryRow, Genero};

pub const UNSELECTED_OPTION: &str = "";
pub const PLACEHOLDER_OPTION: &str = "— Seleccionar Rama —";

/// How a path whose root segment matches several genders is bucketed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BucketPolicy {
    /// Checked in the order Niños, Mujer, Hombre; the last match wins.
    #[default]
    Exclusive,
    /// Added to every bucket whose pattern matches.
    Independent,
}

/// Maps free-text gender/target values onto [`Genero`].
#[derive(Debug, Clone)]
pub struct GenderClassifier {
    ordered: [(Genero, Regex); 3],
}

impl GenderClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            ordered: [
                (
                    Genero::Mujer,
                    Regex::new("mujer|fem").context("failed to compile mujer pattern")?,
                ),
                (
                    Genero::Hombre,
                    Regex::new("hombre|masc|caballero")
                        .context("failed to compile hombre pattern")?,
                ),
                (
                    Genero::Ninos,
                    Regex::new("nene|nena|nino|nina|kids|infantil|menor|chico|chica")
                        .context("failed to compile ninos pattern")?,
                ),
            ],
        })
    }

    /// First matching pattern wins; unmatched values fall back to Niños.
    pub fn classify(&self, value: &str) -> Genero {
        let folded = fold_text(value);
        self.ordered
            .iter()
            .find(|(_, pattern)| pattern.is_match(&folded))
            .map(|(genero, _)| *genero)
            .unwrap_or(Genero::Ninos)
    }
}

/// Keyword patterns applied to the root segment of a path.
///
/// Matching runs on the lowercased root with accents kept, so `niñ` never
/// matches a bare `nin`.
#[derive(Debug, Clone)]
pub struct RootSegmentClassifier {
    ordered: [(Genero, Regex); 3],
}

impl RootSegmentClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            ordered: [
                (
                    Genero::Ninos,
                    Regex::new("niñ|nino|nina|nene|nena")
                        .context("failed to compile ninos root pattern")?,
                ),
                (
                    Genero::Mujer,
                    Regex::new("mujer").context("failed to compile mujer root pattern")?,
                ),
                (
                    Genero::Hombre,
                    Regex::new("hombre").context("failed to compile hombre root pattern")?,
                ),
            ],
        })
    }

    pub fn classify(&self, ruta: &str, policy: BucketPolicy) -> Vec<Genero> {
        let root = lower_composed(root_segment(ruta));
        let matches = self
            .ordered
            .iter()
            .filter(|(_, pattern)| pattern.is_match(&root))
            .map(|(genero, _)| *genero);

        match policy {
            BucketPolicy::Exclusive => matches.last().into_iter().collect(),
            BucketPolicy::Independent => matches.collect(),
        }
    }
}

pub fn root_segment(ruta: &str) -> &str {
    ruta.split('>').next().unwrap_or_default().trim()
}

/// Distinct available paths per gender, sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RamaIndex {
    buckets: BTreeMap<Genero, Vec<String>>,
}

impl RamaIndex {
    pub fn build(
        rows: &[CategoryRow],
        classifier: &RootSegmentClassifier,
        policy: BucketPolicy,
    ) -> Self {
        let mut sets: BTreeMap<Genero, BTreeSet<String>> = Genero::ALL
            .iter()
            .map(|genero| (*genero, BTreeSet::new()))
            .collect();

        for row in rows {
            if row.rama.is_empty() {
                continue;
            }
            for genero in classifier.classify(&row.rama, policy) {
                sets.entry(genero).or_default().insert(row.rama.clone());
            }
        }

        Self {
            buckets: sets
                .into_iter()
                .map(|(genero, set)| (genero, set.into_iter().collect()))
                .collect(),
        }
    }

    pub fn bucket(&self, genero: Genero) -> &[String] {
        self.buckets
            .get(&genero)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }

    /// Choices for a selector: blank sentinel, placeholder, then the bucket.
    pub fn option_list(&self, genero: Genero) -> Vec<String> {
        let mut options = vec![UNSELECTED_OPTION.to_string(), PLACEHOLDER_OPTION.to_string()];
        options.extend(self.bucket(genero).iter().cloned());
        options
    }
}
