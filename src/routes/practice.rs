//! Routes that record learner activity and report progress from it.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::content::{level_param, required, study_language_param};
use super::error::ApiError;
use super::session::{optional_session, require_session};
use crate::content::Flashcard;
use crate::evaluator::{evaluate, Answer, EvaluationError, Evaluation};
use crate::flashcards::{FlashcardSession, SessionProgress};
use crate::progress::{summarize, syllabus_progress, ProgressSummary, SyllabusProgress};
use crate::session::LearnerState;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/exercises/:id/check", post(check_exercise))
        .route("/api/grammar/:id/studied", post(mark_rule_studied))
        .route("/api/flashcards/cards/:id/known", post(mark_card_known))
        .route("/api/flashcards/decks/:id/review", get(review_deck))
        .route("/api/progress", get(progress))
        .route("/api/syllabus/progress", get(syllabus_completion))
}

/// Snapshot of the caller's learner state, or 401.
fn learner(state: &AppState, token: &str) -> Result<LearnerState, ApiError> {
    state
        .sessions
        .learner(token)
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))
}

// ==================== Exercises ====================

#[derive(Debug, Deserialize)]
struct CheckBody {
    answer: Answer,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckReply {
    #[serde(flatten)]
    evaluation: Evaluation,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    xp: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    xp_awarded: Option<u32>,
}

async fn check_exercise(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<CheckBody>, JsonRejection>,
) -> Result<Json<CheckReply>, ApiError> {
    let Json(body) = payload?;
    let exercise = state
        .catalog
        .exercise(&id)
        .ok_or_else(|| ApiError::not_found(format!("Exercise '{}' not found", id)))?;

    let evaluation = evaluate(exercise, &body.answer).map_err(|e| match e {
        EvaluationError::ShapeMismatch { .. } => ApiError::bad_request(e.to_string()),
        EvaluationError::MissingAnswerKey { .. } => {
            error!("Cannot check exercise: {}", e);
            ApiError::internal("Exercise cannot be checked")
        }
    })?;

    let mut reply = CheckReply {
        evaluation,
        score: None,
        xp: None,
        xp_awarded: None,
    };

    if let Some(token) = optional_session(&state, &headers) {
        state.sessions.update_learner(&token, &mut |learner| {
            let outcome = learner.exercises.record(&id, &reply.evaluation);
            reply.score = Some(learner.exercises.score());
            reply.xp = Some(learner.exercises.xp());
            reply.xp_awarded = Some(outcome.xp_awarded);
        });
        debug!(exercise = %id, correct = reply.evaluation.correct, "Exercise attempt recorded");
    }

    Ok(Json(reply))
}

// ==================== Grammar & Flashcards ====================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StudiedReply {
    rule_id: String,
    studied_rules: usize,
}

async fn mark_rule_studied(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<StudiedReply>, ApiError> {
    let token = require_session(&state, &headers)?;
    if state.catalog.grammar_rule(&id).is_none() {
        return Err(ApiError::not_found(format!("Grammar rule '{}' not found", id)));
    }

    let mut studied_rules = 0;
    state.sessions.update_learner(&token, &mut |learner| {
        learner.studied_rules.insert(id.clone());
        studied_rules = learner.studied_rules.len();
    });

    Ok(Json(StudiedReply {
        rule_id: id,
        studied_rules,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KnownReply {
    card_id: String,
    known_cards: usize,
}

async fn mark_card_known(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<KnownReply>, ApiError> {
    let token = require_session(&state, &headers)?;
    if state.catalog.card(&id).is_none() {
        return Err(ApiError::not_found(format!("Card '{}' not found", id)));
    }

    let mut known_cards = 0;
    state.sessions.update_learner(&token, &mut |learner| {
        learner.known_cards.insert(id.clone());
        known_cards = learner.known_cards.len();
    });

    Ok(Json(KnownReply {
        card_id: id,
        known_cards,
    }))
}

#[derive(Debug, Deserialize)]
struct ReviewQuery {
    #[serde(default)]
    shuffle: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewReply {
    deck_id: String,
    cards: Vec<Flashcard>,
    progress: SessionProgress,
}

/// The cards still to review in a deck, skipping those the caller already
/// knows.
async fn review_deck(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    query: Result<Query<ReviewQuery>, QueryRejection>,
) -> Result<Json<ReviewReply>, ApiError> {
    let Query(query) = query?;
    if state.catalog.deck(&id).is_none() {
        return Err(ApiError::not_found(format!("Deck '{}' not found", id)));
    }

    let cards: Vec<Flashcard> = state.catalog.cards(&id).into_iter().cloned().collect();
    let known = optional_session(&state, &headers)
        .and_then(|token| state.sessions.learner(&token))
        .map(|learner| learner.known_cards)
        .unwrap_or_default();

    let mut session = FlashcardSession::with_known(cards, known.iter().map(String::as_str));
    if query.shuffle {
        session.shuffle(&mut rand::rng());
    }

    Ok(Json(ReviewReply {
        deck_id: id,
        cards: session.upcoming().to_vec(),
        progress: session.progress(),
    }))
}

// ==================== Progress ====================

#[derive(Debug, Deserialize)]
struct ProgressQuery {
    language: Option<String>,
    level: Option<String>,
}

async fn progress(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<ProgressQuery>, QueryRejection>,
) -> Result<Json<ProgressSummary>, ApiError> {
    let token = require_session(&state, &headers)?;
    let Query(query) = query?;
    let language = study_language_param(&query.language)?;

    let learner = learner(&state, &token)?;
    let summary = summarize(&state.catalog, &learner, language, &mut rand::rng());
    Ok(Json(summary))
}

async fn syllabus_completion(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<ProgressQuery>, QueryRejection>,
) -> Result<Json<SyllabusProgress>, ApiError> {
    let token = require_session(&state, &headers)?;
    let Query(query) = query?;
    let language = study_language_param(&query.language)?.id();
    let level = required(level_param(&query.level)?, "level")?;

    let syllabus = state
        .catalog
        .syllabus(language, level)
        .ok_or_else(|| ApiError::not_found(format!("No {} syllabus for {}", level, language)))?;

    let learner = learner(&state, &token)?;
    Ok(Json(syllabus_progress(&state.catalog, &learner, syllabus)))
}
