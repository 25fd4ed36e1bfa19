//! Content records. Field names follow the JSON datasets (camelCase).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Proficiency level shared by grammar rules, exercises, decks and syllabi.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Level::Beginner),
            "intermediate" => Ok(Level::Intermediate),
            "advanced" => Ok(Level::Advanced),
            other => anyhow::bail!("Unknown level: '{}'", other),
        }
    }
}

// ==================== Dictionary ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntry {
    pub id: String,
    pub source_language_id: String,
    pub target_language_id: String,
    pub word: String,
    pub part_of_speech: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    pub definitions: Vec<DictionaryDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryDefinition {
    pub id: String,
    pub entry_id: String,
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

// ==================== Phrases ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhraseCategory {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phrase {
    pub id: String,
    pub category_id: String,
    pub source_language_id: String,
    pub target_language_id: String,
    pub source_text: String,
    pub target_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

// ==================== Grammar & Syllabus ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarRule {
    pub id: String,
    pub language_id: String,
    pub level: Level,
    pub title: String,
    pub explanation: String,
    pub examples: Vec<GrammarExample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_index: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarExample {
    pub id: String,
    pub rule_id: String,
    pub source_language_id: String,
    pub target_language_id: String,
    pub source_text: String,
    pub target_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// A language/level curriculum made of units, each split into topics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Syllabus {
    pub id: String,
    pub language_id: String,
    pub level: Level,
    pub title: String,
    pub description: String,
    pub units: Vec<SyllabusUnit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyllabusUnit {
    pub id: String,
    pub title: String,
    pub topics: Vec<String>,
}

// ==================== Exercises ====================

/// Exercise shapes. The wire ids (`type_1`..`type_8`) come from the datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExerciseKind {
    #[serde(rename = "type_1")]
    MultipleChoice,
    #[serde(rename = "type_2")]
    FillBlank,
    #[serde(rename = "type_3")]
    WordOrder,
    #[serde(rename = "type_4")]
    Listening,
    #[serde(rename = "type_5")]
    Matching,
    #[serde(rename = "type_6")]
    Translation,
    #[serde(rename = "type_7")]
    Conjugation,
    #[serde(rename = "type_8")]
    Dictation,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 8] = [
        ExerciseKind::MultipleChoice,
        ExerciseKind::FillBlank,
        ExerciseKind::WordOrder,
        ExerciseKind::Listening,
        ExerciseKind::Matching,
        ExerciseKind::Translation,
        ExerciseKind::Conjugation,
        ExerciseKind::Dictation,
    ];

    pub fn type_id(&self) -> &'static str {
        match self {
            ExerciseKind::MultipleChoice => "type_1",
            ExerciseKind::FillBlank => "type_2",
            ExerciseKind::WordOrder => "type_3",
            ExerciseKind::Listening => "type_4",
            ExerciseKind::Matching => "type_5",
            ExerciseKind::Translation => "type_6",
            ExerciseKind::Conjugation => "type_7",
            ExerciseKind::Dictation => "type_8",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExerciseKind::MultipleChoice => "multiple-choice",
            ExerciseKind::FillBlank => "fill-blanks",
            ExerciseKind::WordOrder => "word-order",
            ExerciseKind::Listening => "listening",
            ExerciseKind::Matching => "matching",
            ExerciseKind::Translation => "translation",
            ExerciseKind::Conjugation => "conjugation",
            ExerciseKind::Dictation => "dictation",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ExerciseKind::MultipleChoice => "Test your knowledge with multiple choice questions",
            ExerciseKind::FillBlank => "Complete sentences with the correct words",
            ExerciseKind::WordOrder => "Arrange words to form correct sentences",
            ExerciseKind::Listening => "Listen and answer questions",
            ExerciseKind::Matching => "Match items from two columns",
            ExerciseKind::Translation => "Translate sentences between languages",
            ExerciseKind::Conjugation => "Practice verb conjugations",
            ExerciseKind::Dictation => "Write what you hear",
        }
    }
}

/// Serializable description of an exercise type, for the exercise picker.
#[derive(Debug, Clone, Serialize)]
pub struct ExerciseType {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

impl From<ExerciseKind> for ExerciseType {
    fn from(kind: ExerciseKind) -> Self {
        Self {
            id: kind.type_id(),
            name: kind.name(),
            description: kind.description(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    #[serde(rename = "typeId")]
    pub kind: ExerciseKind,
    pub language_id: String,
    pub level: Level,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_items: Option<Vec<MatchItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_responses: Option<Vec<MatchResponse>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conjugations: Option<Vec<ConjugationPair>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_index: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchItem {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub id: String,
    pub text: String,
    pub matches_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConjugationPair {
    pub pronoun: String,
    pub correct_form: String,
}

/// What the learner sees: the exercise without its answer key.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExercisePrompt {
    pub id: String,
    pub type_id: &'static str,
    pub language_id: String,
    pub level: Level,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_items: Option<Vec<MatchItem>>,
    /// Responses without their `matchesId`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_responses: Option<Vec<MatchItem>>,
    /// Pronouns to conjugate for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pronouns: Option<Vec<String>>,
    /// Shuffled tokens for word-order exercises
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_index: Option<usize>,
}

// ==================== Flashcards ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardDeck {
    pub id: String,
    pub name: String,
    pub source_language_id: String,
    pub target_language_id: String,
    pub level: Level,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: String,
    pub deck_id: String,
    pub front_text: String,
    pub back_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}
