use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: Option<i64>,
    pub difficulty: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub question: String,
    pub answer: String,
    pub category: Option<i64>,
    pub difficulty: Option<i64>,
}

const QUESTION_COLUMNS: &str = "SELECT id, question, answer, category, difficulty FROM questions";

pub async fn get_all_questions(pool: &SqlitePool) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(&format!("{QUESTION_COLUMNS} ORDER BY id"))
        .fetch_all(pool)
        .await
}

pub async fn count_questions(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions")
        .fetch_one(pool)
        .await
}

pub async fn get_question_by_id(pool: &SqlitePool, id: i64) -> sqlx::Result<Question> {
    sqlx::query_as::<_, Question>(&format!("{QUESTION_COLUMNS} WHERE questions.id = ?1"))
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn get_questions_for_category(
    pool: &SqlitePool,
    category_id: i64,
) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(&format!(
        "{QUESTION_COLUMNS} WHERE questions.category = ?1 ORDER BY id"
    ))
    .bind(category_id)
    .fetch_all(pool)
    .await
}

/// Case-insensitive substring match on the question text. `%` and `_` in
/// the term match literally.
pub async fn search_questions(pool: &SqlitePool, term: &str) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(&format!(
        r"{QUESTION_COLUMNS} WHERE questions.question LIKE ?1 ESCAPE '\' ORDER BY id"
    ))
    .bind(like_pattern(term))
    .fetch_all(pool)
    .await
}

fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub async fn create_question(pool: &SqlitePool, new_question: &NewQuestion) -> sqlx::Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO questions (question, answer, category, difficulty) VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&new_question.question)
    .bind(&new_question.answer)
    .bind(new_question.category)
    .bind(new_question.difficulty)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn delete_question(pool: &SqlitePool, id: i64) -> sqlx::Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM questions WHERE questions.id = ?1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

/// Questions still playable in a quiz: optionally restricted to one
/// category, never one of `exclude`.
pub async fn get_quiz_candidates(
    pool: &SqlitePool,
    category: Option<i64>,
    exclude: &[i64],
) -> sqlx::Result<Vec<Question>> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(QUESTION_COLUMNS);
    builder.push(" WHERE 1=1");
    if let Some(category) = category {
        builder.push(" AND questions.category = ");
        builder.push_bind(category);
    }
    if !exclude.is_empty() {
        // one JSON array parameter, so the list is not bounded by SQLite's variable limit
        let ids = serde_json::to_string(exclude).map_err(|e| sqlx::Error::Encode(e.into()))?;
        builder.push(" AND questions.id NOT IN (SELECT value FROM json_each(");
        builder.push_bind(ids);
        builder.push("))");
    }
    builder.push(" ORDER BY id");

    builder.build_query_as::<Question>().fetch_all(pool).await
}

/// Inserts or overwrites questions keyed by id, in a single transaction.
pub async fn import_questions(pool: &SqlitePool, questions: Vec<Question>) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;
    for question in questions {
        sqlx::query(
            r#"
            INSERT INTO questions (id, question, answer, category, difficulty) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (id) DO UPDATE SET
                question = excluded.question,
                answer = excluded.answer,
                category = excluded.category,
                difficulty = excluded.difficulty
            "#,
        )
        .bind(question.id)
        .bind(&question.question)
        .bind(&question.answer)
        .bind(question.category)
        .bind(question.difficulty)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::queries::categories::import_categories;
    use crate::db::{establish_memory_connection, run_migrations, Category};

    async fn pool() -> SqlitePool {
        let pool = establish_memory_connection().await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    async fn create_category(pool: &SqlitePool, id: i64, kind: &str) -> i64 {
        import_categories(
            pool,
            vec![Category {
                id,
                kind: kind.to_owned(),
            }],
        )
        .await
        .unwrap();
        id
    }

    fn new_question(question: &str, category: Option<i64>) -> NewQuestion {
        NewQuestion {
            question: question.to_owned(),
            answer: "42".to_owned(),
            category,
            difficulty: Some(1),
        }
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("title"), "%title%");
        assert_eq!(like_pattern("100%_"), r"%100\%\_%");
    }

    #[tokio::test]
    async fn create_then_fetch_by_id() {
        let pool = pool().await;
        let science = create_category(&pool, 1, "Science").await;
        let id = create_question(&pool, &new_question("What is 1+1?", Some(science)))
            .await
            .unwrap();

        let question = get_question_by_id(&pool, id).await.unwrap();
        assert_eq!(question.question, "What is 1+1?");
        assert_eq!(question.category, Some(science));
        assert_eq!(count_questions(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_category_violates_foreign_key() {
        let pool = pool().await;
        let result = create_question(&pool, &new_question("Orphan?", Some(99))).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn deleting_missing_question_is_row_not_found() {
        let pool = pool().await;
        let id = create_question(&pool, &new_question("Gone?", None)).await.unwrap();

        delete_question(&pool, id).await.unwrap();
        let err = delete_question(&pool, id).await.unwrap_err();
        assert!(matches!(err, sqlx::Error::RowNotFound));
    }

    #[tokio::test]
    async fn search_is_case_insensitive_substring() {
        let pool = pool().await;
        create_question(&pool, &new_question("Whose autobiography is entitled?", None))
            .await
            .unwrap();
        create_question(&pool, &new_question("What movie won in 1996?", None))
            .await
            .unwrap();

        let found = search_questions(&pool, "TITLE").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].question, "Whose autobiography is entitled?");

        assert_eq!(search_questions(&pool, "").await.unwrap().len(), 2);
        assert!(search_questions(&pool, "%").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn quiz_candidates_filter_category_and_exclusions() {
        let pool = pool().await;
        let science = create_category(&pool, 1, "Science").await;
        let art = create_category(&pool, 2, "Art").await;
        let a = create_question(&pool, &new_question("a", Some(art))).await.unwrap();
        let b = create_question(&pool, &new_question("b", Some(art))).await.unwrap();
        let c = create_question(&pool, &new_question("c", Some(science))).await.unwrap();

        let ids = |qs: Vec<Question>| qs.into_iter().map(|q| q.id).collect::<Vec<_>>();

        assert_eq!(ids(get_quiz_candidates(&pool, None, &[]).await.unwrap()), vec![a, b, c]);
        assert_eq!(ids(get_quiz_candidates(&pool, Some(art), &[]).await.unwrap()), vec![a, b]);
        assert_eq!(ids(get_quiz_candidates(&pool, Some(art), &[a]).await.unwrap()), vec![b]);
        assert_eq!(ids(get_quiz_candidates(&pool, None, &[a, c]).await.unwrap()), vec![b]);
        assert!(get_quiz_candidates(&pool, Some(art), &[a, b]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn quiz_candidates_exclude_more_ids_than_sqlite_variables() {
        let pool = pool().await;
        let kept = create_question(&pool, &new_question("kept", None)).await.unwrap();
        let seen = create_question(&pool, &new_question("seen", None)).await.unwrap();

        let mut exclude: Vec<i64> = (1_000..41_000).collect();
        exclude.push(seen);
        assert!(exclude.len() > 32_766);

        let candidates = get_quiz_candidates(&pool, None, &exclude).await.unwrap();
        assert_eq!(candidates.into_iter().map(|q| q.id).collect::<Vec<_>>(), vec![kept]);
    }

    #[tokio::test]
    async fn import_upserts_by_id() {
        let pool = pool().await;
        let id = create_question(&pool, &new_question("Typo?", None)).await.unwrap();

        import_questions(
            &pool,
            vec![
                Question {
                    id,
                    question: "Fixed?".to_owned(),
                    answer: "Yes".to_owned(),
                    category: None,
                    difficulty: Some(2),
                },
                Question {
                    id: 100,
                    question: "New?".to_owned(),
                    answer: "Yes".to_owned(),
                    category: None,
                    difficulty: None,
                },
            ],
        )
        .await
        .unwrap();

        assert_eq!(get_question_by_id(&pool, id).await.unwrap().question, "Fixed?");
        assert_eq!(get_question_by_id(&pool, 100).await.unwrap().difficulty, None);
        assert_eq!(count_questions(&pool).await.unwrap(), 2);
    }
}
