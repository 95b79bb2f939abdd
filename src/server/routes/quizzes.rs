use axum::{extract::State, routing::post, Json, Router};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use sqlx::SqlitePool;

use crate::{
    db::{queries::questions::get_quiz_candidates, Question},
    server::{
        app::AppState,
        deserializers::{into_ids, NumericId},
        extractors::AppJson,
    },
    telemetry::QUIZ_QUESTIONS_CNTR,
};

use super::ApiResponse;

#[derive(Deserialize)]
struct QuizCategory {
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    id: Option<i64>,
}

#[derive(Deserialize)]
struct QuizRequest {
    #[serde(default)]
    quiz_category: Option<QuizCategory>,
    #[serde(default)]
    previous_questions: Option<Vec<NumericId>>,
}

impl QuizRequest {
    /// `None` plays across every category; the frontend sends id 0 for "ALL".
    fn category(&self) -> Option<i64> {
        self.quiz_category
            .as_ref()
            .and_then(|c| c.id)
            .filter(|id| *id != 0)
    }
}

/// Serializes as the question object, or as `false` once the quiz is exhausted.
#[derive(Serialize, Debug, PartialEq)]
#[serde(untagged)]
enum QuizQuestion {
    Next(Question),
    Exhausted(bool),
}

#[derive(Serialize)]
struct QuizRound {
    success: bool,
    question: QuizQuestion,
}

async fn next_quiz_question(
    State(pool): State<SqlitePool>,
    AppJson(request): AppJson<QuizRequest>,
) -> ApiResponse<Json<QuizRound>> {
    let category = request.category();
    let previous = into_ids(request.previous_questions.unwrap_or_default());

    let candidates = get_quiz_candidates(&pool, category, &previous).await?;
    let picked = candidates.choose(&mut rand::thread_rng()).cloned();
    let question = match picked {
        Some(question) => {
            QUIZ_QUESTIONS_CNTR.with_label_values(&["served"]).inc();
            QuizQuestion::Next(question)
        }
        None => {
            tracing::debug!("No questions left for category {category:?}");
            QUIZ_QUESTIONS_CNTR.with_label_values(&["exhausted"]).inc();
            QuizQuestion::Exhausted(false)
        }
    };

    Ok(Json(QuizRound {
        success: true,
        question,
    }))
}

pub fn quizzes_router() -> Router<AppState> {
    Router::new().route("/quizzes", post(next_quiz_question))
}
