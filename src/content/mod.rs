//! Static learning content.
//!
//! The datasets under `data/` are compiled into the binary and parsed once
//! into a [`Catalog`]. Loading also checks that records reference each other
//! consistently, so request handlers can rely on ids resolving.

mod model;

pub use model::*;

use crate::evaluator::normalize;
use crate::i18n::LanguageRegistry;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::info;

const DICTIONARY_JSON: &str = include_str!("../../data/dictionary.json");
const PHRASES_JSON: &str = include_str!("../../data/phrases.json");
const GRAMMAR_JSON: &str = include_str!("../../data/grammar.json");
const SYLLABUS_JSON: &str = include_str!("../../data/syllabus.json");
const EXERCISES_JSON: &str = include_str!("../../data/exercises.json");
const FLASHCARDS_JSON: &str = include_str!("../../data/flashcards.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse {dataset} dataset: {source}")]
    Parse {
        dataset: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{record} references unknown language '{language_id}'")]
    UnknownLanguage { record: String, language_id: String },
    #[error("{record} references unknown {kind} '{id}'")]
    DanglingReference {
        record: String,
        kind: &'static str,
        id: String,
    },
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },
}

#[derive(Debug, Deserialize)]
struct DictionaryFile {
    entries: Vec<DictionaryEntry>,
}

#[derive(Debug, Deserialize)]
struct PhrasesFile {
    categories: Vec<PhraseCategory>,
    phrases: Vec<Phrase>,
}

#[derive(Debug, Deserialize)]
struct GrammarFile {
    rules: Vec<GrammarRule>,
}

#[derive(Debug, Deserialize)]
struct SyllabusFile {
    syllabi: Vec<Syllabus>,
}

#[derive(Debug, Deserialize)]
struct ExercisesFile {
    exercises: Vec<Exercise>,
}

#[derive(Debug, Deserialize)]
struct FlashcardsFile {
    decks: Vec<FlashcardDeck>,
    cards: Vec<Flashcard>,
}

fn parse<T: for<'de> Deserialize<'de>>(dataset: &'static str, json: &str) -> Result<T, CatalogError> {
    serde_json::from_str(json).map_err(|source| CatalogError::Parse { dataset, source })
}

/// Immutable, validated content for every feature view.
#[derive(Debug, Clone)]
pub struct Catalog {
    dictionary: Vec<DictionaryEntry>,
    phrase_categories: Vec<PhraseCategory>,
    phrases: Vec<Phrase>,
    grammar_rules: Vec<GrammarRule>,
    syllabi: Vec<Syllabus>,
    exercises: Vec<Exercise>,
    decks: Vec<FlashcardDeck>,
    cards: Vec<Flashcard>,
}

impl Catalog {
    /// Parse and validate the datasets compiled into the binary.
    pub fn load_embedded() -> Result<Self, CatalogError> {
        let dictionary: DictionaryFile = parse("dictionary", DICTIONARY_JSON)?;
        let phrases: PhrasesFile = parse("phrases", PHRASES_JSON)?;
        let grammar: GrammarFile = parse("grammar", GRAMMAR_JSON)?;
        let syllabus: SyllabusFile = parse("syllabus", SYLLABUS_JSON)?;
        let exercises: ExercisesFile = parse("exercises", EXERCISES_JSON)?;
        let flashcards: FlashcardsFile = parse("flashcards", FLASHCARDS_JSON)?;

        let catalog = Self {
            dictionary: dictionary.entries,
            phrase_categories: phrases.categories,
            phrases: phrases.phrases,
            grammar_rules: grammar.rules,
            syllabi: syllabus.syllabi,
            exercises: exercises.exercises,
            decks: flashcards.decks,
            cards: flashcards.cards,
        };
        catalog.validate()?;

        info!(
            entries = catalog.dictionary.len(),
            phrases = catalog.phrases.len(),
            grammar_rules = catalog.grammar_rules.len(),
            exercises = catalog.exercises.len(),
            decks = catalog.decks.len(),
            cards = catalog.cards.len(),
            "Content catalog loaded"
        );

        Ok(catalog)
    }

    /// Check ids are unique and every cross-reference resolves.
    fn validate(&self) -> Result<(), CatalogError> {
        let registry = LanguageRegistry::get();
        let check_language = |record: &str, language_id: &str| {
            if registry.get_by_id(language_id).is_none() {
                return Err(CatalogError::UnknownLanguage {
                    record: record.to_string(),
                    language_id: language_id.to_string(),
                });
            }
            Ok(())
        };

        for entry in &self.dictionary {
            check_language(&entry.id, &entry.source_language_id)?;
            check_language(&entry.id, &entry.target_language_id)?;
        }

        let category_ids = unique_ids("phrase category", self.phrase_categories.iter().map(|c| &c.id))?;
        unique_ids("phrase", self.phrases.iter().map(|p| &p.id))?;
        for phrase in &self.phrases {
            check_language(&phrase.id, &phrase.source_language_id)?;
            check_language(&phrase.id, &phrase.target_language_id)?;
            if !category_ids.contains(phrase.category_id.as_str()) {
                return Err(CatalogError::DanglingReference {
                    record: phrase.id.clone(),
                    kind: "phrase category",
                    id: phrase.category_id.clone(),
                });
            }
        }

        unique_ids("grammar rule", self.grammar_rules.iter().map(|r| &r.id))?;
        for rule in &self.grammar_rules {
            check_language(&rule.id, &rule.language_id)?;
        }

        for syllabus in &self.syllabi {
            check_language(&syllabus.id, &syllabus.language_id)?;
        }

        unique_ids("exercise", self.exercises.iter().map(|e| &e.id))?;
        for exercise in &self.exercises {
            check_language(&exercise.id, &exercise.language_id)?;
            let item_ids: HashSet<&str> = exercise
                .match_items
                .iter()
                .flatten()
                .map(|item| item.id.as_str())
                .collect();
            for response in exercise.match_responses.iter().flatten() {
                if !item_ids.contains(response.matches_id.as_str()) {
                    return Err(CatalogError::DanglingReference {
                        record: exercise.id.clone(),
                        kind: "match item",
                        id: response.matches_id.clone(),
                    });
                }
            }
        }

        let deck_ids = unique_ids("deck", self.decks.iter().map(|d| &d.id))?;
        for deck in &self.decks {
            check_language(&deck.id, &deck.source_language_id)?;
            check_language(&deck.id, &deck.target_language_id)?;
        }
        unique_ids("flashcard", self.cards.iter().map(|c| &c.id))?;
        for card in &self.cards {
            if !deck_ids.contains(card.deck_id.as_str()) {
                return Err(CatalogError::DanglingReference {
                    record: card.id.clone(),
                    kind: "deck",
                    id: card.deck_id.clone(),
                });
            }
        }

        Ok(())
    }

    // ==================== Dictionary ====================

    /// Look a word up by headword or, in reverse, by one of its definitions.
    ///
    /// Matching is on normalized text, so "agua" finds "água". An empty
    /// query returns nothing.
    pub fn search_dictionary(
        &self,
        query: &str,
        source_language_id: Option<&str>,
        target_language_id: Option<&str>,
    ) -> Vec<&DictionaryEntry> {
        let needle = normalize(query);
        if needle.is_empty() {
            return Vec::new();
        }

        self.dictionary
            .iter()
            .filter(|entry| source_language_id.map_or(true, |id| entry.source_language_id == id))
            .filter(|entry| target_language_id.map_or(true, |id| entry.target_language_id == id))
            .filter(|entry| {
                normalize(&entry.word) == needle
                    || entry
                        .definitions
                        .iter()
                        .any(|def| definition_terms(&def.definition).contains(&needle))
            })
            .collect()
    }

    // ==================== Phrases ====================

    pub fn phrase_categories(&self) -> &[PhraseCategory] {
        &self.phrase_categories
    }

    pub fn phrases(&self, category_id: Option<&str>, target_language_id: Option<&str>) -> Vec<&Phrase> {
        self.phrases
            .iter()
            .filter(|p| category_id.map_or(true, |id| p.category_id == id))
            .filter(|p| target_language_id.map_or(true, |id| p.target_language_id == id))
            .collect()
    }

    // ==================== Grammar & Syllabus ====================

    pub fn grammar_rule(&self, id: &str) -> Option<&GrammarRule> {
        self.grammar_rules.iter().find(|r| r.id == id)
    }

    pub fn grammar_rules(&self, language_id: Option<&str>, level: Option<Level>) -> Vec<&GrammarRule> {
        self.grammar_rules
            .iter()
            .filter(|r| language_id.map_or(true, |id| r.language_id == id))
            .filter(|r| level.map_or(true, |lvl| r.level == lvl))
            .collect()
    }

    pub fn syllabus(&self, language_id: &str, level: Level) -> Option<&Syllabus> {
        self.syllabi
            .iter()
            .find(|s| s.language_id == language_id && s.level == level)
    }

    pub fn topic_grammar_rules(&self, unit_id: &str, topic_index: usize) -> Vec<&GrammarRule> {
        self.grammar_rules
            .iter()
            .filter(|r| in_topic(&r.unit_id, r.topic_index, unit_id, topic_index))
            .collect()
    }

    pub fn topic_exercises(&self, unit_id: &str, topic_index: usize) -> Vec<&Exercise> {
        self.exercises
            .iter()
            .filter(|e| in_topic(&e.unit_id, e.topic_index, unit_id, topic_index))
            .collect()
    }

    pub fn topic_decks(&self, unit_id: &str, topic_index: usize) -> Vec<&FlashcardDeck> {
        self.decks
            .iter()
            .filter(|d| in_topic(&d.unit_id, d.topic_index, unit_id, topic_index))
            .collect()
    }

    // ==================== Exercises ====================

    pub fn exercise(&self, id: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn exercises(&self, filter: &ExerciseFilter) -> Vec<&Exercise> {
        self.exercises.iter().filter(|e| filter.matches(e)).collect()
    }

    // ==================== Flashcards ====================

    pub fn deck(&self, id: &str) -> Option<&FlashcardDeck> {
        self.decks.iter().find(|d| d.id == id)
    }

    pub fn decks(&self, target_language_id: Option<&str>, level: Option<Level>) -> Vec<&FlashcardDeck> {
        self.decks
            .iter()
            .filter(|d| target_language_id.map_or(true, |id| d.target_language_id == id))
            .filter(|d| level.map_or(true, |lvl| d.level == lvl))
            .collect()
    }

    pub fn card(&self, id: &str) -> Option<&Flashcard> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn cards(&self, deck_id: &str) -> Vec<&Flashcard> {
        self.cards.iter().filter(|c| c.deck_id == deck_id).collect()
    }

    /// All cards in decks that teach the given language.
    pub fn cards_for_language(&self, target_language_id: &str) -> Vec<&Flashcard> {
        let deck_ids: HashSet<&str> = self
            .decks(Some(target_language_id), None)
            .into_iter()
            .map(|d| d.id.as_str())
            .collect();

        self.cards
            .iter()
            .filter(|c| deck_ids.contains(c.deck_id.as_str()))
            .collect()
    }
}

fn in_topic(unit: &Option<String>, topic: Option<usize>, unit_id: &str, topic_index: usize) -> bool {
    unit.as_deref() == Some(unit_id) && topic == Some(topic_index)
}

fn unique_ids<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a String>,
) -> Result<HashSet<&'a str>, CatalogError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(CatalogError::DuplicateId {
                kind,
                id: id.clone(),
            });
        }
    }
    Ok(seen)
}

static PARENTHETICAL_REGEX: OnceLock<Regex> = OnceLock::new();

/// Split a definition like "amigo (masculine), amiga (feminine)" into
/// normalized terms: ["amigo", "amiga"].
fn definition_terms(definition: &str) -> Vec<String> {
    let regex = PARENTHETICAL_REGEX.get_or_init(|| Regex::new(r"\([^)]*\)").unwrap());

    regex
        .replace_all(definition, "")
        .split([',', '/'])
        .map(normalize)
        .filter(|term| !term.is_empty())
        .collect()
}

/// Query filter for the exercise list.
#[derive(Debug, Clone, Default)]
pub struct ExerciseFilter {
    pub language_id: Option<String>,
    pub level: Option<Level>,
    pub unit_id: Option<String>,
    pub topic_index: Option<usize>,
    pub kind: Option<ExerciseKind>,
}

impl ExerciseFilter {
    fn matches(&self, exercise: &Exercise) -> bool {
        self.language_id.as_deref().map_or(true, |id| exercise.language_id == id)
            && self.level.map_or(true, |lvl| exercise.level == lvl)
            && self
                .unit_id
                .as_deref()
                .map_or(true, |id| exercise.unit_id.as_deref() == Some(id))
            && self.topic_index.map_or(true, |t| exercise.topic_index == Some(t))
            && self.kind.map_or(true, |k| exercise.kind == k)
    }
}

impl Exercise {
    /// Strip the answer key for display. Word-order exercises get their
    /// tokens shuffled; match responses lose their pairing.
    pub fn prompt<R: Rng + ?Sized>(&self, rng: &mut R) -> ExercisePrompt {
        let tokens = match (self.kind, &self.correct_answer) {
            (ExerciseKind::WordOrder, Some(answer)) => {
                let mut tokens: Vec<String> = answer.split_whitespace().map(str::to_string).collect();
                tokens.shuffle(rng);
                Some(tokens)
            }
            _ => None,
        };

        let match_responses = self.match_responses.as_ref().map(|responses| {
            let mut responses: Vec<MatchItem> = responses
                .iter()
                .map(|r| MatchItem {
                    id: r.id.clone(),
                    text: r.text.clone(),
                })
                .collect();
            responses.shuffle(rng);
            responses
        });

        ExercisePrompt {
            id: self.id.clone(),
            type_id: self.kind.type_id(),
            language_id: self.language_id.clone(),
            level: self.level,
            question: self.question.clone(),
            options: self.options.clone(),
            audio_url: self.audio_url.clone(),
            match_items: self.match_items.clone(),
            match_responses,
            pronouns: self
                .conjugations
                .as_ref()
                .map(|pairs| pairs.iter().map(|p| p.pronoun.clone()).collect()),
            tokens,
            unit_id: self.unit_id.clone(),
            topic_index: self.topic_index,
        }
    }
}
