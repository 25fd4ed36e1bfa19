//! Progress summaries built from what a learner actually did in their
//! session: cards marked known, grammar rules studied and exercises passed.

use crate::content::{Catalog, Level, Syllabus, SyllabusUnit};
use crate::i18n::Language;
use crate::session::LearnerState;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

/// Share of cards a deck needs marked known to count as mastered
pub const DECK_MASTERY_PERCENT: u8 = 70;

/// `completed / total` as a rounded percentage in [0, 100]; 0 when `total` is 0.
pub fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (completed as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

pub fn classify_level(average: u8) -> Level {
    if average > 70 {
        Level::Advanced
    } else if average > 40 {
        Level::Intermediate
    } else {
        Level::Beginner
    }
}

fn rounded_mean(values: &[u8]) -> u8 {
    if values.is_empty() {
        return 0;
    }
    let sum: u32 = values.iter().map(|&v| v as u32).sum();
    (sum as f64 / values.len() as f64).round() as u8
}

// ==================== Recommendations ====================

/// A suggestion pointing the learner at one feature view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Recommendation {
    Flashcards,
    Grammar,
    Exercises,
    Phrases,
}

impl Recommendation {
    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::Flashcards => "Review your flashcards to grow your vocabulary",
            Recommendation::Grammar => "Study a few more grammar lessons",
            Recommendation::Exercises => "Practice with exercises to improve your accuracy",
            Recommendation::Phrases => "Learn some common phrases to get started",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationView {
    pub view: Recommendation,
    pub message: &'static str,
}

impl From<Recommendation> for RecommendationView {
    fn from(view: Recommendation) -> Self {
        Self {
            view,
            message: view.message(),
        }
    }
}

const MAX_RECOMMENDATIONS: usize = 2;

/// Rule-based suggestions. When more than two apply, two are sampled at
/// random and kept in rule order.
pub fn recommendations<R: Rng + ?Sized>(
    vocabulary: u8,
    grammar: u8,
    exercise_success: u8,
    overall: u8,
    rng: &mut R,
) -> Vec<Recommendation> {
    let candidates: Vec<Recommendation> = [
        (vocabulary < 50, Recommendation::Flashcards),
        (grammar < 50, Recommendation::Grammar),
        (exercise_success < 60, Recommendation::Exercises),
        (overall < 30, Recommendation::Phrases),
    ]
    .into_iter()
    .filter_map(|(applies, rec)| applies.then_some(rec))
    .collect();

    if candidates.len() <= MAX_RECOMMENDATIONS {
        return candidates;
    }

    let mut picked = rand::seq::index::sample(rng, candidates.len(), MAX_RECOMMENDATIONS).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| candidates[i]).collect()
}

// ==================== Language Summary ====================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub language_id: &'static str,
    pub vocabulary_progress: u8,
    pub grammar_progress: u8,
    pub exercise_success: u8,
    pub overall: u8,
    pub level: Level,
    pub recommendations: Vec<RecommendationView>,
    pub xp: u32,
    pub last_updated: DateTime<Utc>,
}

pub fn summarize<R: Rng + ?Sized>(
    catalog: &Catalog,
    learner: &LearnerState,
    language: Language,
    rng: &mut R,
) -> ProgressSummary {
    let cards = catalog.cards_for_language(language.id());
    let known = cards
        .iter()
        .filter(|c| learner.known_cards.contains(&c.id))
        .count();

    let rules = catalog.grammar_rules(Some(language.id()), None);
    let studied = rules
        .iter()
        .filter(|r| learner.studied_rules.contains(&r.id))
        .count();

    let exercises = catalog.exercises(&crate::content::ExerciseFilter {
        language_id: Some(language.id().to_string()),
        ..Default::default()
    });
    let completed = exercises
        .iter()
        .filter(|e| learner.exercises.is_completed(&e.id))
        .count();

    let vocabulary_progress = percentage(known, cards.len());
    let grammar_progress = percentage(studied, rules.len());
    let exercise_success = percentage(completed, exercises.len());
    let overall = rounded_mean(&[vocabulary_progress, grammar_progress, exercise_success]);

    ProgressSummary {
        language_id: language.id(),
        vocabulary_progress,
        grammar_progress,
        exercise_success,
        overall,
        level: classify_level(overall),
        recommendations: recommendations(
            vocabulary_progress,
            grammar_progress,
            exercise_success,
            overall,
            rng,
        )
        .into_iter()
        .map(RecommendationView::from)
        .collect(),
        xp: learner.exercises.xp(),
        last_updated: Utc::now(),
    }
}

// ==================== Syllabus Completion ====================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitProgress {
    pub unit_id: String,
    pub completion: u8,
    pub topics: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyllabusProgress {
    pub syllabus_id: String,
    pub completion: u8,
    pub units: Vec<UnitProgress>,
}

/// Completed share of the grammar rules, exercises and decks placed in one
/// topic. Exercises count once passed; decks once mostly known.
pub fn topic_completion(
    catalog: &Catalog,
    learner: &LearnerState,
    unit_id: &str,
    topic_index: usize,
) -> u8 {
    let rules = catalog.topic_grammar_rules(unit_id, topic_index);
    let exercises = catalog.topic_exercises(unit_id, topic_index);
    let decks = catalog.topic_decks(unit_id, topic_index);

    let studied = rules
        .iter()
        .filter(|r| learner.studied_rules.contains(&r.id))
        .count();
    let passed = exercises
        .iter()
        .filter(|e| learner.exercises.is_passed(&e.id))
        .count();
    let mastered = decks
        .iter()
        .filter(|d| {
            let cards = catalog.cards(&d.id);
            let known = cards
                .iter()
                .filter(|c| learner.known_cards.contains(&c.id))
                .count();
            percentage(known, cards.len()) >= DECK_MASTERY_PERCENT
        })
        .count();

    percentage(
        studied + passed + mastered,
        rules.len() + exercises.len() + decks.len(),
    )
}

pub fn unit_progress(catalog: &Catalog, learner: &LearnerState, unit: &SyllabusUnit) -> UnitProgress {
    let topics: Vec<u8> = (0..unit.topics.len())
        .map(|i| topic_completion(catalog, learner, &unit.id, i))
        .collect();

    UnitProgress {
        unit_id: unit.id.clone(),
        completion: rounded_mean(&topics),
        topics,
    }
}

pub fn syllabus_progress(
    catalog: &Catalog,
    learner: &LearnerState,
    syllabus: &Syllabus,
) -> SyllabusProgress {
    let units: Vec<UnitProgress> = syllabus
        .units
        .iter()
        .map(|unit| unit_progress(catalog, learner, unit))
        .collect();
    let completions: Vec<u8> = units.iter().map(|u| u.completion).collect();

    SyllabusProgress {
        syllabus_id: syllabus.id.clone(),
        completion: rounded_mean(&completions),
        units,
    }
}
