//! Read-only views over the content catalog.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::error::{invalid_query, ApiError};
use crate::content::{
    DictionaryEntry, ExerciseFilter, ExerciseKind, ExercisePrompt, ExerciseType, Flashcard,
    FlashcardDeck, GrammarRule, Level, Phrase, PhraseCategory, Syllabus,
};
use crate::i18n::{Language, LanguageConfig, LanguageRegistry};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/languages", get(languages))
        .route("/api/dictionary", get(dictionary))
        .route("/api/phrases/categories", get(phrase_categories))
        .route("/api/phrases", get(phrases))
        .route("/api/grammar", get(grammar))
        .route("/api/grammar/:id", get(grammar_rule))
        .route("/api/syllabus", get(syllabus))
        .route("/api/exercises/types", get(exercise_types))
        .route("/api/exercises", get(exercises))
        .route("/api/exercises/:id", get(exercise))
        .route("/api/flashcards/decks", get(decks))
        .route("/api/flashcards/decks/:id/cards", get(deck_cards))
}

/// Resolve an optional language query value, given as an id or an ISO code.
pub(super) fn language_param(value: &Option<String>) -> Result<Option<Language>, ApiError> {
    match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Language::resolve(v).map(Some).map_err(invalid_query),
        None => Ok(None),
    }
}

/// A required language the learner studies. The interface language is refused.
pub(super) fn study_language_param(value: &Option<String>) -> Result<Language, ApiError> {
    let language = required(language_param(value)?, "language")?;
    if !language.is_learnable() {
        return Err(ApiError::bad_request(format!(
            "'{}' is not a language that can be studied",
            language.id()
        )));
    }
    Ok(language)
}

pub(super) fn level_param(value: &Option<String>) -> Result<Option<Level>, ApiError> {
    match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v.parse::<Level>().map(Some).map_err(invalid_query),
        None => Ok(None),
    }
}

pub(super) fn required<T>(value: Option<T>, name: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::bad_request(format!("Query parameter '{}' is required", name)))
}

async fn languages() -> Json<Vec<LanguageConfig>> {
    Json(LanguageRegistry::get().list_all().into_iter().cloned().collect())
}

#[derive(Debug, Deserialize)]
struct DictionaryQuery {
    #[serde(default)]
    q: String,
    source: Option<String>,
    target: Option<String>,
}

async fn dictionary(
    State(state): State<AppState>,
    query: Result<Query<DictionaryQuery>, QueryRejection>,
) -> Result<Json<Vec<DictionaryEntry>>, ApiError> {
    let Query(query) = query?;
    let source = language_param(&query.source)?.map(|l| l.id());
    let target = language_param(&query.target)?.map(|l| l.id());

    let entries = state
        .catalog
        .search_dictionary(&query.q, source, target)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(entries))
}

async fn phrase_categories(State(state): State<AppState>) -> Json<Vec<PhraseCategory>> {
    Json(state.catalog.phrase_categories().to_vec())
}

#[derive(Debug, Deserialize)]
struct PhrasesQuery {
    category: Option<String>,
    target: Option<String>,
}

async fn phrases(
    State(state): State<AppState>,
    query: Result<Query<PhrasesQuery>, QueryRejection>,
) -> Result<Json<Vec<Phrase>>, ApiError> {
    let Query(query) = query?;
    let target = language_param(&query.target)?.map(|l| l.id());
    let category = query.category.as_deref().filter(|c| !c.is_empty());

    if let Some(id) = category {
        if !state.catalog.phrase_categories().iter().any(|c| c.id == id) {
            return Err(ApiError::not_found(format!("Phrase category '{}' not found", id)));
        }
    }

    Ok(Json(
        state.catalog.phrases(category, target).into_iter().cloned().collect(),
    ))
}

#[derive(Debug, Deserialize)]
struct LanguageLevelQuery {
    language: Option<String>,
    level: Option<String>,
}

async fn grammar(
    State(state): State<AppState>,
    query: Result<Query<LanguageLevelQuery>, QueryRejection>,
) -> Result<Json<Vec<GrammarRule>>, ApiError> {
    let Query(query) = query?;
    let language = language_param(&query.language)?.map(|l| l.id());
    let level = level_param(&query.level)?;

    Ok(Json(
        state.catalog.grammar_rules(language, level).into_iter().cloned().collect(),
    ))
}

async fn grammar_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GrammarRule>, ApiError> {
    state
        .catalog
        .grammar_rule(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Grammar rule '{}' not found", id)))
}

async fn syllabus(
    State(state): State<AppState>,
    query: Result<Query<LanguageLevelQuery>, QueryRejection>,
) -> Result<Json<Syllabus>, ApiError> {
    let Query(query) = query?;
    let language = required(language_param(&query.language)?, "language")?.id();
    let level = required(level_param(&query.level)?, "level")?;

    state
        .catalog
        .syllabus(language, level)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No {} syllabus for {}", level, language)))
}

async fn exercise_types() -> Json<Vec<ExerciseType>> {
    Json(ExerciseKind::ALL.into_iter().map(ExerciseType::from).collect())
}

#[derive(Debug, Deserialize)]
struct ExercisesQuery {
    language: Option<String>,
    level: Option<String>,
    unit: Option<String>,
    topic: Option<usize>,
    #[serde(rename = "type")]
    kind: Option<ExerciseKind>,
}

async fn exercises(
    State(state): State<AppState>,
    query: Result<Query<ExercisesQuery>, QueryRejection>,
) -> Result<Json<Vec<ExercisePrompt>>, ApiError> {
    let Query(query) = query?;
    let filter = ExerciseFilter {
        language_id: language_param(&query.language)?.map(|l| l.id().to_string()),
        level: level_param(&query.level)?,
        unit_id: query.unit.filter(|u| !u.is_empty()),
        topic_index: query.topic,
        kind: query.kind,
    };

    let mut rng = rand::rng();
    let prompts = state
        .catalog
        .exercises(&filter)
        .into_iter()
        .map(|exercise| exercise.prompt(&mut rng))
        .collect();
    Ok(Json(prompts))
}

async fn exercise(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExercisePrompt>, ApiError> {
    let exercise = state
        .catalog
        .exercise(&id)
        .ok_or_else(|| ApiError::not_found(format!("Exercise '{}' not found", id)))?;
    Ok(Json(exercise.prompt(&mut rand::rng())))
}

#[derive(Debug, Deserialize)]
struct DecksQuery {
    target: Option<String>,
    level: Option<String>,
}

async fn decks(
    State(state): State<AppState>,
    query: Result<Query<DecksQuery>, QueryRejection>,
) -> Result<Json<Vec<FlashcardDeck>>, ApiError> {
    let Query(query) = query?;
    let target = language_param(&query.target)?.map(|l| l.id());
    let level = level_param(&query.level)?;

    Ok(Json(state.catalog.decks(target, level).into_iter().cloned().collect()))
}

async fn deck_cards(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Flashcard>>, ApiError> {
    if state.catalog.deck(&id).is_none() {
        return Err(ApiError::not_found(format!("Deck '{}' not found", id)));
    }
    Ok(Json(state.catalog.cards(&id).into_iter().cloned().collect()))
}
