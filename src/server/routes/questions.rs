use std::collections::{BTreeMap, HashMap};

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{categories::get_all_categories, questions},
        NewQuestion, Question,
    },
    server::{
        app::AppState,
        deserializers::deserialize_option_string_from_number,
        errors::ApiError,
        extractors::{AppJson, AppPath},
        pagination::{extract_page, page_slice},
    },
};

use super::{categories_by_id, ApiResponse};

/// Body of `POST /questions`. A present `searchTerm` turns the request into a search.
#[derive(Deserialize)]
struct QuestionsBody {
    #[serde(
        default,
        rename = "searchTerm",
        deserialize_with = "deserialize_option_string_from_number"
    )]
    search_term: Option<String>,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    difficulty: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    category: Option<i64>,
}

#[derive(Debug, PartialEq)]
enum QuestionsRequest {
    Search(String),
    Create(NewQuestion),
}

impl TryFrom<QuestionsBody> for QuestionsRequest {
    type Error = ApiError;

    fn try_from(body: QuestionsBody) -> Result<Self, Self::Error> {
        if let Some(term) = body.search_term {
            return Ok(QuestionsRequest::Search(term));
        }
        let question = non_blank(body.question, "question")?;
        let answer = non_blank(body.answer, "answer")?;
        Ok(QuestionsRequest::Create(NewQuestion {
            question,
            answer,
            category: body.category,
            difficulty: body.difficulty,
        }))
    }
}

fn non_blank(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::unprocessable(format!("`{field}` is required"))),
    }
}

#[derive(Serialize)]
struct QuestionsPage {
    success: bool,
    questions: Vec<Question>,
    total_questions: usize,
    categories: BTreeMap<i64, String>,
    current_category: Option<i64>,
}

#[derive(Serialize)]
struct SearchResults {
    success: bool,
    questions: Vec<Question>,
    total_questions: usize,
    current_category: Option<i64>,
}

#[derive(Serialize)]
struct Created {
    success: bool,
    created: i64,
    total_questions: i64,
}

#[derive(Serialize)]
struct Deleted {
    success: bool,
    deleted: i64,
}

async fn questions_page(
    State(pool): State<SqlitePool>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResponse<Json<QuestionsPage>> {
    let page = extract_page(&params);
    let questions = questions::get_all_questions(&pool).await?;
    let current = page_slice(&questions, page);
    if current.is_empty() {
        tracing::debug!("Page {page} is empty");
        return Err(ApiError::NotFound);
    }

    Ok(Json(QuestionsPage {
        success: true,
        questions: current.to_vec(),
        total_questions: questions.len(),
        categories: categories_by_id(get_all_categories(&pool).await?),
        current_category: None,
    }))
}

async fn create_or_search(
    State(pool): State<SqlitePool>,
    AppJson(body): AppJson<QuestionsBody>,
) -> ApiResponse<Response> {
    match QuestionsRequest::try_from(body)? {
        QuestionsRequest::Search(term) => Ok(search(&pool, &term).await?.into_response()),
        QuestionsRequest::Create(new_question) => {
            Ok(create(&pool, new_question).await?.into_response())
        }
    }
}

async fn search(pool: &SqlitePool, term: &str) -> ApiResponse<Json<SearchResults>> {
    let questions = questions::search_questions(pool, term).await?;
    tracing::debug!("Search {term:?} matched {} questions", questions.len());
    Ok(Json(SearchResults {
        success: true,
        total_questions: questions.len(),
        questions,
        current_category: None,
    }))
}

async fn create(pool: &SqlitePool, new_question: NewQuestion) -> ApiResponse<Json<Created>> {
    let id = questions::create_question(pool, &new_question)
        .await
        .map_err(ApiError::unprocessable)?;
    tracing::info!("Created question {id}");

    Ok(Json(Created {
        success: true,
        created: id,
        total_questions: questions::count_questions(pool).await?,
    }))
}

async fn delete_question(
    State(pool): State<SqlitePool>,
    AppPath(id): AppPath<i64>,
) -> ApiResponse<Json<Deleted>> {
    questions::delete_question(&pool, id).await?;
    tracing::info!("Deleted question {id}");
    Ok(Json(Deleted {
        success: true,
        deleted: id,
    }))
}

pub fn questions_router() -> Router<AppState> {
    Router::new()
        .route("/questions", get(questions_page).post(create_or_search))
        .route("/questions/{id}", delete(delete_question))
}
