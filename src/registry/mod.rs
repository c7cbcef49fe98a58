//! Answer-key registry.
//!
//! The registry is the only state carried from generation to grading. It is
//! built once from the selected variants, written to `question_mappings.json`
//! and read back by the grading phase. It is never mutated after construction.
//!
//! On disk it is a JSON object with three maps keyed by variant id and then by
//! 1-based question number:
//!
//! ```json
//! {
//!   "variant_answer_keys":       { "3": { "1": "B", "2": "A" } },
//!   "variant_question_mappings": { "3": { "1": "Algebra", "2": "Geometria" } },
//!   "variant_question_scores":   { "3": { "2": { "correct": 6.0 } } }
//! }
//! ```
//!
//! `variant_question_scores` is optional; files without it grade every
//! question with the default weights.

use crate::bank::ScoreOverrides;
use crate::config::AnswerLabelFormat;
use crate::error::RegistryError;
use crate::generator::Variant;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::Path;

/// File name used for the persisted registry.
pub const MAPPINGS_FILENAME: &str = "question_mappings.json";

/// One question of one variant.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerKeyEntry {
    /// 1-based position within the variant.
    pub number: usize,
    /// Label of the correct choice.
    pub label: String,
    /// Source category id.
    pub category: String,
    /// Per-question score overrides carried over from the bank.
    pub scores: ScoreOverrides,
}

/// The answer key of one variant, ordered by question number.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantKey {
    pub variant_id: String,
    pub entries: Vec<AnswerKeyEntry>,
}

impl VariantKey {
    /// Looks up a question by its 1-based number.
    pub fn entry(&self, number: usize) -> Option<&AnswerKeyEntry> {
        number
            .checked_sub(1)
            .and_then(|index| self.entries.get(index))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MappingsFile {
    #[serde(default)]
    variant_answer_keys: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    variant_question_mappings: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    variant_question_scores: BTreeMap<String, BTreeMap<String, ScoreOverrides>>,
}

/// Immutable answer keys for every selected variant.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerKeyRegistry {
    variants: Vec<VariantKey>,
}

impl AnswerKeyRegistry {
    /// Builds the registry from the selected variants in their final order.
    pub fn from_variants(
        variants: &[Variant],
        format: AnswerLabelFormat,
    ) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        let mut keys = Vec::with_capacity(variants.len());

        for variant in variants {
            if !seen.insert(variant.id.as_str()) {
                return Err(RegistryError::DuplicateVariant(variant.id.clone()));
            }

            let entries = variant
                .questions
                .iter()
                .enumerate()
                .map(|(position, question)| {
                    let number = position + 1;
                    let index = question.correct_index().ok_or_else(|| {
                        RegistryError::MissingCorrectAnswer {
                            variant: variant.id.clone(),
                            number,
                        }
                    })?;
                    Ok(AnswerKeyEntry {
                        number,
                        label: format.label(index),
                        category: question.category.clone(),
                        scores: question.scores,
                    })
                })
                .collect::<Result<Vec<_>, RegistryError>>()?;

            keys.push(VariantKey {
                variant_id: variant.id.clone(),
                entries,
            });
        }

        sort_variants(&mut keys);
        Ok(Self { variants: keys })
    }

    /// All variant keys, ordered by numeric variant id.
    pub fn variants(&self) -> &[VariantKey] {
        &self.variants
    }

    pub fn get(&self, variant_id: &str) -> Option<&VariantKey> {
        self.variants.iter().find(|v| v.variant_id == variant_id)
    }

    /// Like [`get`](Self::get) but reports an unknown id as an error.
    pub fn require(&self, variant_id: &str) -> Result<&VariantKey, RegistryError> {
        self.get(variant_id)
            .ok_or_else(|| RegistryError::UnknownVariant(variant_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Largest question count across variants.
    pub fn max_questions(&self) -> usize {
        self.variants.iter().map(VariantKey::len).max().unwrap_or(0)
    }

    /// Serializes the registry to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, RegistryError> {
        let mut file = MappingsFile::default();
        for key in &self.variants {
            let labels = file
                .variant_answer_keys
                .entry(key.variant_id.clone())
                .or_default();
            for entry in &key.entries {
                labels.insert(entry.number.to_string(), entry.label.clone());
            }

            let categories = file
                .variant_question_mappings
                .entry(key.variant_id.clone())
                .or_default();
            for entry in &key.entries {
                categories.insert(entry.number.to_string(), entry.category.clone());
            }

            let scores: BTreeMap<String, ScoreOverrides> = key
                .entries
                .iter()
                .filter(|e| !e.scores.is_empty())
                .map(|e| (e.number.to_string(), e.scores))
                .collect();
            if !scores.is_empty() {
                file.variant_question_scores
                    .insert(key.variant_id.clone(), scores);
            }
        }
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Parses and validates a registry from JSON.
    pub fn from_json(content: &str) -> Result<Self, RegistryError> {
        let file: MappingsFile = serde_json::from_str(content)?;

        let ids: BTreeSet<&String> = file
            .variant_answer_keys
            .keys()
            .chain(file.variant_question_mappings.keys())
            .collect();

        let empty = BTreeMap::new();
        let mut variants = Vec::with_capacity(ids.len());
        for id in ids {
            let labels = file.variant_answer_keys.get(id).unwrap_or(&empty);
            let categories = file.variant_question_mappings.get(id).unwrap_or(&empty);
            let scores = file.variant_question_scores.get(id);

            let numbers = question_numbers(id, labels.keys().chain(categories.keys()))?;
            let entries = numbers
                .into_iter()
                .map(|number| {
                    let key = number.to_string();
                    let label = labels.get(&key).ok_or_else(|| {
                        RegistryError::MissingCorrectAnswer {
                            variant: id.clone(),
                            number,
                        }
                    })?;
                    let category = categories.get(&key).ok_or_else(|| {
                        RegistryError::MissingCategory {
                            variant: id.clone(),
                            number,
                        }
                    })?;
                    Ok(AnswerKeyEntry {
                        number,
                        label: label.trim().to_string(),
                        category: category.clone(),
                        scores: scores
                            .and_then(|s| s.get(&key))
                            .copied()
                            .unwrap_or_default(),
                    })
                })
                .collect::<Result<Vec<_>, RegistryError>>()?;

            variants.push(VariantKey {
                variant_id: id.clone(),
                entries,
            });
        }

        sort_variants(&mut variants);
        Ok(Self { variants })
    }

    /// Writes the registry to `path`. An empty registry is never written.
    pub fn save(&self, path: &Path) -> Result<(), RegistryError> {
        if self.is_empty() {
            return Err(RegistryError::Empty);
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Reads a registry written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

/// Parses question-number keys and checks they run 1..=K without gaps.
fn question_numbers<'a>(
    variant: &str,
    keys: impl Iterator<Item = &'a String>,
) -> Result<Vec<usize>, RegistryError> {
    let mut numbers = BTreeSet::new();
    for key in keys {
        let number = key
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| RegistryError::InvalidQuestionNumber {
                variant: variant.to_string(),
                number: key.clone(),
            })?;
        numbers.insert(number);
    }

    let numbers: Vec<usize> = numbers.into_iter().collect();
    let contiguous = numbers.iter().enumerate().all(|(i, n)| *n == i + 1);
    if !contiguous {
        return Err(RegistryError::NonContiguous(variant.to_string()));
    }
    Ok(numbers)
}

fn sort_variants(variants: &mut [VariantKey]) {
    variants.sort_by(|a, b| variant_order(&a.variant_id).cmp(&variant_order(&b.variant_id)));
}

/// Numeric ids first in numeric order, then the rest lexicographically.
fn variant_order(id: &str) -> (u8, u64, &str) {
    match id.parse::<u64>() {
        Ok(n) => (0, n, id),
        Err(_) => (1, 0, id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{Question, QuestionBank};
    use crate::generator::VariantGenerator;

    fn bank() -> QuestionBank {
        QuestionBank::new(vec![
            Question::new("Algebra", "x?", "1", vec!["2".to_string(), "3".to_string()]),
            Question::new("Geometria", "area?", "4", vec!["5".to_string()]).with_scores(
                ScoreOverrides {
                    correct: Some(6.0),
                    wrong: Some(-1.0),
                    blank: None,
                },
            ),
            Question::new("Storia", "anno?", "1861", vec!["1848".to_string()]),
        ])
        .expect("valid bank")
    }

    #[test]
    fn test_from_variants() {
        let bank = bank();
        let variants = VariantGenerator::seeded(&bank, 4).generate(3);
        let registry = AnswerKeyRegistry::from_variants(&variants, AnswerLabelFormat::LettersUpper)
            .expect("registry should build");

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.max_questions(), 3);
        for (variant, key) in variants.iter().zip(registry.variants()) {
            assert_eq!(variant.id, key.variant_id);
            for (position, (question, entry)) in
                variant.questions.iter().zip(&key.entries).enumerate()
            {
                assert_eq!(entry.number, position + 1);
                assert_eq!(entry.category, question.category);
                let index = question.correct_index().expect("one correct answer");
                assert_eq!(entry.label, AnswerLabelFormat::LettersUpper.label(index));
            }
        }
    }

    #[test]
    fn test_json_round_trip() {
        let bank = bank();
        let variants = VariantGenerator::seeded(&bank, 12).generate(2);
        let registry = AnswerKeyRegistry::from_variants(&variants, AnswerLabelFormat::Numbers)
            .expect("registry should build");

        let json = registry.to_json().expect("serialize");
        let restored = AnswerKeyRegistry::from_json(&json).expect("deserialize");
        assert_eq!(registry, restored);

        let geometry = restored
            .variants()
            .iter()
            .flat_map(|v| &v.entries)
            .find(|e| e.category == "Geometria")
            .expect("geometry question present");
        assert_eq!(geometry.scores.correct, Some(6.0));
    }

    #[test]
    fn test_legacy_file_without_scores() {
        let json = r#"{
            "variant_answer_keys": {"1": {"1": "A", "2": "C"}},
            "variant_question_mappings": {"1": {"1": "Algebra", "2": "Storia"}}
        }"#;
        let registry = AnswerKeyRegistry::from_json(json).expect("legacy file should load");
        let key = registry.require("1").expect("variant 1");
        assert_eq!(key.len(), 2);
        assert_eq!(key.entry(2).map(|e| e.label.as_str()), Some("C"));
        assert!(key.entries.iter().all(|e| e.scores.is_empty()));
    }

    #[test]
    fn test_numeric_ordering() {
        let json = r#"{
            "variant_answer_keys": {"10": {"1": "A"}, "2": {"1": "B"}, "1": {"1": "C"}},
            "variant_question_mappings": {"10": {"1": "X"}, "2": {"1": "X"}, "1": {"1": "X"}}
        }"#;
        let registry = AnswerKeyRegistry::from_json(json).expect("should load");
        let ids: Vec<&str> = registry.variants().iter().map(|v| v.variant_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "10"]);
    }

    #[test]
    fn test_rejects_gaps_and_bad_numbers() {
        let gap = r#"{
            "variant_answer_keys": {"1": {"1": "A", "3": "B"}},
            "variant_question_mappings": {"1": {"1": "X", "3": "Y"}}
        }"#;
        assert!(matches!(
            AnswerKeyRegistry::from_json(gap),
            Err(RegistryError::NonContiguous(_))
        ));

        let bad = r#"{
            "variant_answer_keys": {"1": {"uno": "A"}},
            "variant_question_mappings": {"1": {"uno": "X"}}
        }"#;
        assert!(matches!(
            AnswerKeyRegistry::from_json(bad),
            Err(RegistryError::InvalidQuestionNumber { .. })
        ));

        let no_label = r#"{
            "variant_answer_keys": {"1": {"1": "A"}},
            "variant_question_mappings": {"1": {"1": "X", "2": "Y"}}
        }"#;
        assert!(matches!(
            AnswerKeyRegistry::from_json(no_label),
            Err(RegistryError::MissingCorrectAnswer { number: 2, .. })
        ));
    }

    #[test]
    fn test_unknown_variant() {
        let bank = bank();
        let variants = VariantGenerator::seeded(&bank, 1).generate(1);
        let registry = AnswerKeyRegistry::from_variants(&variants, AnswerLabelFormat::LettersUpper)
            .expect("registry should build");
        assert!(matches!(
            registry.require("99"),
            Err(RegistryError::UnknownVariant(_))
        ));
    }

    #[test]
    fn test_duplicate_variant_ids() {
        let bank = bank();
        let mut variants = VariantGenerator::seeded(&bank, 1).generate(2);
        variants[1].id = variants[0].id.clone();
        assert!(matches!(
            AnswerKeyRegistry::from_variants(&variants, AnswerLabelFormat::LettersUpper),
            Err(RegistryError::DuplicateVariant(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(MAPPINGS_FILENAME);
        let bank = bank();
        let variants = VariantGenerator::seeded(&bank, 21).generate(4);
        let registry = AnswerKeyRegistry::from_variants(&variants, AnswerLabelFormat::LettersLower)
            .expect("registry should build");

        registry.save(&path).expect("save");
        let loaded = AnswerKeyRegistry::load(&path).expect("load");
        assert_eq!(registry, loaded);
    }

    #[test]
    fn test_empty_registry_is_not_saved() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(MAPPINGS_FILENAME);
        let registry = AnswerKeyRegistry::from_variants(&[], AnswerLabelFormat::LettersUpper)
            .expect("empty registry builds");

        assert!(matches!(registry.save(&path), Err(RegistryError::Empty)));
        assert!(!path.exists());
    }
}
