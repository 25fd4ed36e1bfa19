//! Exercise answer checking and per-learner scoring.
//!
//! Every comparison goes through [`normalize`]: accents and case never make
//! an answer wrong, but anything else does. There is no partial credit.

use crate::content::{Exercise, ExerciseKind};
use crate::progress::percentage;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// XP for the first correct completion of an exercise
pub const COMPLETION_XP: u32 = 10;
/// Extra XP when that completion happened on the first attempt
pub const FIRST_ATTEMPT_BONUS_XP: u32 = 5;
/// Per-exercise score (0-100) at which an exercise counts as passed
pub const PASSING_SCORE: u8 = 80;

/// Fold text for comparison: NFD, drop combining marks, lowercase, and
/// collapse whitespace.
pub fn normalize(s: &str) -> String {
    // Lowercase on both sides of the decomposition: some capitals only
    // lowercase into a base letter plus a combining mark.
    let folded = s
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A learner's answer, in the shape the exercise type expects.
///
/// On the wire this is externally tagged, e.g. `{"text": "somos"}` or
/// `{"matches": [["m1", "r1"], ["m2", "r2"]]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Answer {
    Text(String),
    Tokens(Vec<String>),
    /// (match item id, match response id)
    Matches(Vec<(String, String)>),
    /// (pronoun, conjugated form)
    Conjugations(Vec<(String, String)>),
}

impl Answer {
    fn shape(&self) -> &'static str {
        match self {
            Answer::Text(_) => "text",
            Answer::Tokens(_) => "tokens",
            Answer::Matches(_) => "matches",
            Answer::Conjugations(_) => "conjugations",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum EvaluationError {
    #[error("exercise '{exercise_id}' ({kind}) does not accept a {shape} answer")]
    ShapeMismatch {
        exercise_id: String,
        kind: &'static str,
        shape: &'static str,
    },
    #[error("exercise '{exercise_id}' has no answer key")]
    MissingAnswerKey { exercise_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub correct: bool,
    /// Canonical answer for display, only present when the answer was wrong
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Check an answer against an exercise's key.
pub fn evaluate(exercise: &Exercise, answer: &Answer) -> Result<Evaluation, EvaluationError> {
    let (correct, canonical) = match exercise.kind {
        ExerciseKind::MultipleChoice
        | ExerciseKind::FillBlank
        | ExerciseKind::Listening
        | ExerciseKind::Translation
        | ExerciseKind::Dictation => check_text(exercise, answer)?,
        ExerciseKind::WordOrder => match answer {
            Answer::Tokens(tokens) => {
                let key = answer_key(exercise)?;
                (normalize(&tokens.join(" ")) == normalize(key), key.to_string())
            }
            _ => check_text(exercise, answer)?,
        },
        ExerciseKind::Matching => check_matches(exercise, answer)?,
        ExerciseKind::Conjugation => match &exercise.conjugations {
            Some(table) if !table.is_empty() => check_conjugations(exercise, table, answer)?,
            _ => check_text(exercise, answer)?,
        },
    };

    Ok(Evaluation {
        correct,
        correct_answer: (!correct).then_some(canonical),
        explanation: exercise.explanation.clone(),
    })
}

fn answer_key(exercise: &Exercise) -> Result<&str, EvaluationError> {
    exercise
        .correct_answer
        .as_deref()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| EvaluationError::MissingAnswerKey {
            exercise_id: exercise.id.clone(),
        })
}

fn mismatch(exercise: &Exercise, answer: &Answer) -> EvaluationError {
    EvaluationError::ShapeMismatch {
        exercise_id: exercise.id.clone(),
        kind: exercise.kind.name(),
        shape: answer.shape(),
    }
}

fn check_text(exercise: &Exercise, answer: &Answer) -> Result<(bool, String), EvaluationError> {
    let Answer::Text(text) = answer else {
        return Err(mismatch(exercise, answer));
    };
    let key = answer_key(exercise)?;
    Ok((normalize(text) == normalize(key), key.to_string()))
}

fn check_matches(exercise: &Exercise, answer: &Answer) -> Result<(bool, String), EvaluationError> {
    let Answer::Matches(pairs) = answer else {
        return Err(mismatch(exercise, answer));
    };
    let missing_key = || EvaluationError::MissingAnswerKey {
        exercise_id: exercise.id.clone(),
    };
    let items = exercise
        .match_items
        .as_ref()
        .filter(|items| !items.is_empty())
        .ok_or_else(missing_key)?;
    let responses = exercise.match_responses.as_ref().ok_or_else(missing_key)?;

    let given: HashSet<(&str, &str)> = pairs
        .iter()
        .map(|(item, response)| (item.as_str(), response.as_str()))
        .collect();

    let mut expected = HashSet::new();
    let mut display = Vec::with_capacity(items.len());
    let mut every_item_answerable = true;
    for item in items {
        match responses.iter().find(|r| r.matches_id == item.id) {
            Some(response) => {
                expected.insert((item.id.as_str(), response.id.as_str()));
                display.push(format!("{} → {}", item.text, response.text));
            }
            None => every_item_answerable = false,
        }
    }

    Ok((every_item_answerable && given == expected, display.join("; ")))
}

fn check_conjugations(
    exercise: &Exercise,
    table: &[crate::content::ConjugationPair],
    answer: &Answer,
) -> Result<(bool, String), EvaluationError> {
    let Answer::Conjugations(pairs) = answer else {
        return Err(mismatch(exercise, answer));
    };

    let given: HashSet<(String, String)> = pairs
        .iter()
        .map(|(pronoun, form)| (normalize(pronoun), normalize(form)))
        .collect();

    let correct = table
        .iter()
        .all(|p| given.contains(&(normalize(&p.pronoun), normalize(&p.correct_form))));

    let display = table
        .iter()
        .map(|p| format!("{}: {}", p.pronoun, p.correct_form))
        .collect::<Vec<_>>()
        .join("; ");

    Ok((correct, display))
}

// ==================== Session Scoring ====================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct AttemptStats {
    attempts: u32,
    correct: u32,
}

/// What recording one evaluation changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOutcome {
    pub xp_awarded: u32,
    pub first_completion: bool,
}

/// Running score for one learner across exercises.
///
/// The score counts every correct answer, including repeats. The completed
/// set only records each exercise once, and XP is awarded on that first
/// completion.
#[derive(Debug, Clone, Default)]
pub struct ExerciseSession {
    score: u32,
    xp: u32,
    completed: BTreeSet<String>,
    stats: HashMap<String, AttemptStats>,
}

impl ExerciseSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, exercise_id: &str, evaluation: &Evaluation) -> AttemptOutcome {
        let stats = self.stats.entry(exercise_id.to_string()).or_default();
        stats.attempts += 1;

        if !evaluation.correct {
            return AttemptOutcome {
                xp_awarded: 0,
                first_completion: false,
            };
        }

        stats.correct += 1;
        self.score += 1;

        let first_completion = self.completed.insert(exercise_id.to_string());
        let mut xp_awarded = 0;
        if first_completion {
            xp_awarded = COMPLETION_XP;
            if stats.attempts == 1 {
                xp_awarded += FIRST_ATTEMPT_BONUS_XP;
            }
        }
        self.xp += xp_awarded;

        AttemptOutcome {
            xp_awarded,
            first_completion,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn xp(&self) -> u32 {
        self.xp
    }

    pub fn completed(&self) -> impl Iterator<Item = &str> {
        self.completed.iter().map(String::as_str)
    }

    pub fn is_completed(&self, exercise_id: &str) -> bool {
        self.completed.contains(exercise_id)
    }

    #[cfg(test)]
    fn attempts(&self, exercise_id: &str) -> u32 {
        self.stats.get(exercise_id).map_or(0, |s| s.attempts)
    }

    #[cfg(test)]
    fn total_attempts(&self) -> u32 {
        self.stats.values().map(|s| s.attempts).sum()
    }

    /// Share of correct attempts for one exercise, 0-100.
    pub fn exercise_score(&self, exercise_id: &str) -> u8 {
        self.stats
            .get(exercise_id)
            .map_or(0, |s| percentage(s.correct as usize, s.attempts as usize))
    }

    pub fn is_passed(&self, exercise_id: &str) -> bool {
        self.exercise_score(exercise_id) >= PASSING_SCORE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ConjugationPair, Level, MatchItem, MatchResponse};
    use proptest::prelude::*;

    fn exercise(kind: ExerciseKind, correct_answer: Option<&str>) -> Exercise {
        Exercise {
            id: "exercise_test".to_string(),
            kind,
            language_id: "lang_pt".to_string(),
            level: Level::Beginner,
            question: "?".to_string(),
            options: None,
            correct_answer: correct_answer.map(str::to_string),
            explanation: Some("Because.".to_string()),
            audio_url: None,
            match_items: None,
            match_responses: None,
            conjugations: None,
            unit_id: None,
            topic_index: None,
        }
    }

    fn matching_exercise() -> Exercise {
        let mut ex = exercise(ExerciseKind::Matching, None);
        ex.match_items = Some(vec![
            MatchItem { id: "m1".to_string(), text: "Bom dia".to_string() },
            MatchItem { id: "m2".to_string(), text: "Boa noite".to_string() },
        ]);
        ex.match_responses = Some(vec![
            MatchResponse { id: "r1".to_string(), text: "Good evening".to_string(), matches_id: "m2".to_string() },
            MatchResponse { id: "r2".to_string(), text: "Good morning".to_string(), matches_id: "m1".to_string() },
        ]);
        ex
    }

    fn conjugation_exercise() -> Exercise {
        let mut ex = exercise(ExerciseKind::Conjugation, None);
        ex.conjugations = Some(vec![
            ConjugationPair { pronoun: "eu".to_string(), correct_form: "como".to_string() },
            ConjugationPair { pronoun: "nós".to_string(), correct_form: "comemos".to_string() },
        ]);
        ex
    }

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
    }

    // ==================== Normalize Tests ====================

    #[test]
    fn test_normalize_strips_accents_and_case() {
        assert_eq!(normalize("Água"), "agua");
        assert_eq!(normalize("  Está  BEM "), "esta bem");
        assert_eq!(normalize("Português"), "portugues");
    }

    proptest! {
        #[test]
        fn test_normalize_idempotent(s in "\\PC*") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn test_normalize_ignores_case(s in "[a-zA-Záéíóúãõç ]{0,20}") {
            prop_assert_eq!(normalize(&s.to_uppercase()), normalize(&s.to_lowercase()));
        }
    }

    // ==================== Text Rule Tests ====================

    #[test]
    fn test_word_order_text_answer_is_case_insensitive() {
        let ex = exercise(ExerciseKind::WordOrder, Some("Eu sou brasileiro"));
        let result = evaluate(&ex, &Answer::Text("eu sou brasileiro".to_string())).unwrap();

        assert!(result.correct);
        assert!(result.correct_answer.is_none());
    }

    #[test]
    fn test_word_order_tokens_joined() {
        let ex = exercise(ExerciseKind::WordOrder, Some("Eu sou brasileiro"));
        let tokens = vec!["Eu".to_string(), "sou".to_string(), "brasileiro".to_string()];
        assert!(evaluate(&ex, &Answer::Tokens(tokens)).unwrap().correct);

        let wrong = vec!["sou".to_string(), "Eu".to_string(), "brasileiro".to_string()];
        let result = evaluate(&ex, &Answer::Tokens(wrong)).unwrap();
        assert!(!result.correct);
        assert_eq!(result.correct_answer.as_deref(), Some("Eu sou brasileiro"));
    }

    #[test]
    fn test_multiple_choice_accent_insensitive() {
        let ex = exercise(ExerciseKind::MultipleChoice, Some("está"));
        assert!(evaluate(&ex, &Answer::Text("ESTA".to_string())).unwrap().correct);
    }

    #[test]
    fn test_wrong_text_reveals_answer_and_explanation() {
        let ex = exercise(ExerciseKind::FillBlank, Some("somos"));
        let result = evaluate(&ex, &Answer::Text("estamos".to_string())).unwrap();

        assert!(!result.correct);
        assert_eq!(result.correct_answer.as_deref(), Some("somos"));
        assert_eq!(result.explanation.as_deref(), Some("Because."));
    }

    #[test]
    fn test_no_fuzzy_matching() {
        let ex = exercise(ExerciseKind::Dictation, Some("Obrigado pela ajuda"));
        assert!(!evaluate(&ex, &Answer::Text("Obrigado pela ajud".to_string())).unwrap().correct);
    }

    #[test]
    fn test_missing_answer_key_is_error() {
        let ex = exercise(ExerciseKind::Translation, None);
        let err = evaluate(&ex, &Answer::Text("anything".to_string())).unwrap_err();
        assert!(matches!(err, EvaluationError::MissingAnswerKey { .. }));
    }

    #[test]
    fn test_shape_mismatch_is_error() {
        let ex = exercise(ExerciseKind::MultipleChoice, Some("Eu"));
        let err = evaluate(&ex, &Answer::Tokens(vec!["Eu".to_string()])).unwrap_err();
        assert!(matches!(err, EvaluationError::ShapeMismatch { shape: "tokens", .. }));
    }

    // ==================== Matching Tests ====================

    #[test]
    fn test_matching_all_pairs_correct() {
        let answer = Answer::Matches(pairs(&[("m2", "r1"), ("m1", "r2")]));
        assert!(evaluate(&matching_exercise(), &answer).unwrap().correct);
    }

    #[test]
    fn test_matching_one_wrong_pair() {
        let answer = Answer::Matches(pairs(&[("m1", "r1"), ("m2", "r2")]));
        let result = evaluate(&matching_exercise(), &answer).unwrap();

        assert!(!result.correct);
        assert_eq!(
            result.correct_answer.as_deref(),
            Some("Bom dia → Good morning; Boa noite → Good evening")
        );
    }

    #[test]
    fn test_matching_incomplete_is_wrong() {
        let answer = Answer::Matches(pairs(&[("m1", "r2")]));
        assert!(!evaluate(&matching_exercise(), &answer).unwrap().correct);
    }

    #[test]
    fn test_matching_item_without_response_never_correct() {
        let mut ex = matching_exercise();
        ex.match_responses.as_mut().unwrap().retain(|r| r.matches_id != "m2");

        let answer = Answer::Matches(pairs(&[("m1", "r2")]));
        assert!(!evaluate(&ex, &answer).unwrap().correct);
    }

    // ==================== Conjugation Tests ====================

    #[test]
    fn test_conjugation_table_all_forms() {
        let answer = Answer::Conjugations(pairs(&[("Nós", "Comemos"), ("eu", "como")]));
        assert!(evaluate(&conjugation_exercise(), &answer).unwrap().correct);
    }

    #[test]
    fn test_conjugation_table_missing_form() {
        let answer = Answer::Conjugations(pairs(&[("eu", "como")]));
        let result = evaluate(&conjugation_exercise(), &answer).unwrap();

        assert!(!result.correct);
        assert_eq!(result.correct_answer.as_deref(), Some("eu: como; nós: comemos"));
    }

    #[test]
    fn test_conjugation_without_table_uses_text() {
        let ex = exercise(ExerciseKind::Conjugation, Some("somos"));
        assert!(evaluate(&ex, &Answer::Text("Somos".to_string())).unwrap().correct);
    }

    #[test]
    fn test_answer_wire_format() {
        let answer: Answer = serde_json::from_str(r#"{"matches": [["m1", "r2"]]}"#).unwrap();
        assert_eq!(answer, Answer::Matches(pairs(&[("m1", "r2")])));

        let answer: Answer = serde_json::from_str(r#"{"text": "somos"}"#).unwrap();
        assert_eq!(answer, Answer::Text("somos".to_string()));
    }

    // ==================== Session Tests ====================

    fn graded(correct: bool) -> Evaluation {
        Evaluation {
            correct,
            correct_answer: None,
            explanation: None,
        }
    }

    #[test]
    fn test_session_first_attempt_bonus() {
        let mut session = ExerciseSession::new();
        let outcome = session.record("ex_1", &graded(true));

        assert!(outcome.first_completion);
        assert_eq!(outcome.xp_awarded, COMPLETION_XP + FIRST_ATTEMPT_BONUS_XP);
        assert_eq!(session.score(), 1);
        assert_eq!(session.xp(), 15);
    }

    #[test]
    fn test_session_no_bonus_after_miss() {
        let mut session = ExerciseSession::new();
        session.record("ex_1", &graded(false));
        let outcome = session.record("ex_1", &graded(true));

        assert_eq!(outcome.xp_awarded, COMPLETION_XP);
        assert_eq!(session.attempts("ex_1"), 2);
        assert_eq!(session.exercise_score("ex_1"), 50);
        assert!(!session.is_passed("ex_1"));
    }

    #[test]
    fn test_session_repeat_scores_but_completed_set_does_not_grow() {
        let mut session = ExerciseSession::new();
        session.record("ex_1", &graded(true));
        let outcome = session.record("ex_1", &graded(true));

        assert!(!outcome.first_completion);
        assert_eq!(outcome.xp_awarded, 0);
        assert_eq!(session.score(), 2);
        assert_eq!(session.completed().count(), 1);
        assert!(session.is_passed("ex_1"));
    }

    #[test]
    fn test_session_wrong_answer_only_counts_attempt() {
        let mut session = ExerciseSession::new();
        session.record("ex_1", &graded(false));

        assert_eq!(session.score(), 0);
        assert_eq!(session.total_attempts(), 1);
        assert!(!session.is_completed("ex_1"));
        assert_eq!(session.exercise_score("unknown"), 0);
    }
}
