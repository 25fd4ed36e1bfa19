use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::error::ApiError;
use crate::openai::{chat_reply, ChatTurn};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/translate", post(translate))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    show_grammar_correction: bool,
}

#[derive(Debug, Serialize)]
struct ChatReply {
    response: String,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// The key check comes before the body is even looked at, so a server
/// without a key never reaches the upstream.
async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    if state.config.openai_api_key.is_none() {
        error!("OpenAI API key is missing");
        return Err(ApiError::internal("API key missing"));
    }

    let Json(body) = payload?;
    let (Some(message), Some(language)) = (non_blank(&body.message), non_blank(&body.language)) else {
        return Err(ApiError::bad_request("Message and language are required"));
    };

    let turn = ChatTurn {
        message,
        language,
        difficulty: body.difficulty.as_deref(),
        show_grammar_correction: body.show_grammar_correction,
    };

    state.metrics.record_chat_call();
    match chat_reply(&state.client, &state.config, &turn).await {
        Ok(response) => Ok(Json(ChatReply { response })),
        Err(e) => {
            state.metrics.record_chat_failure();
            error!("Chat request failed: {:#}", e);
            Err(ApiError::internal(format!("Failed to process request: {}", e)))
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateBody {
    #[serde(default)]
    text: String,
    #[serde(default)]
    source_lang: String,
    #[serde(default)]
    target_lang: String,
}

#[derive(Debug, Serialize)]
struct TranslateReply {
    translation: String,
}

async fn translate(
    State(state): State<AppState>,
    payload: Result<Json<TranslateBody>, JsonRejection>,
) -> Result<Json<TranslateReply>, ApiError> {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            error!("Translation error: {}", rejection.body_text());
            return Err(ApiError::internal("Translation failed"));
        }
    };

    state.metrics.record_translate_call();
    match state
        .translator
        .translate(&state.client, &body.text, &body.source_lang, &body.target_lang)
        .await
    {
        Ok(translation) => {
            if translation.fell_back {
                state.metrics.record_translate_fallback();
                info!(backend = translation.backend, "Translation served by fallback backend");
            }
            Ok(Json(TranslateReply {
                translation: translation.text,
            }))
        }
        Err(e) => {
            state.metrics.record_translate_failure();
            error!("Translation error: {:#}", e);
            Err(ApiError::internal("Translation failed"))
        }
    }
}
