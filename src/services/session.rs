use std::collections::HashSet;

use rand::seq::{IndexedRandom, SliceRandom};
use serde::Serialize;
use sqlx::Row;
use thiserror::Error;

use crate::db::Database;

pub const LEVEL_WILDCARD: &str = "ALL";
const DISTRACTOR_COUNT: usize = 3;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no words found for level {0}")]
    NoWords(String),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
struct PoolWord {
    id: i64,
    text: String,
    definition: String,
    phonetic: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionWord {
    pub id: i64,
    pub text: String,
    pub definition: String,
    pub phonetic: Option<String>,
    pub options: Vec<String>,
}

/// Picks `count` practice words for the user and builds the multiple-choice
/// options for each. Words the user already engraved are skipped unless that
/// would leave nothing to practice, in which case the full pool is used so
/// the user always gets a session.
pub async fn build_session(
    db: &Database,
    user_id: &str,
    level: &str,
    count: usize,
) -> Result<Vec<SessionWord>, SessionError> {
    let pool = fetch_pool(db, level).await?;
    if pool.is_empty() {
        return Err(SessionError::NoWords(level.to_string()));
    }

    let mastered = fetch_mastered_ids(db, user_id).await?;
    let unmastered: Vec<&PoolWord> = pool.iter().filter(|w| !mastered.contains(&w.id)).collect();

    let candidates: Vec<&PoolWord> = if unmastered.is_empty() {
        pool.iter().collect()
    } else {
        unmastered
    };

    let mut rng = rand::rng();
    let take = count.min(candidates.len());
    let selected: Vec<&PoolWord> = candidates
        .choose_multiple(&mut rng, take)
        .copied()
        .collect();

    let session = selected
        .iter()
        .map(|word| {
            let distractor_pool: Vec<&str> = pool
                .iter()
                .filter(|other| other.id != word.id)
                .map(|other| other.definition.as_str())
                .collect();

            let mut options: Vec<String> = distractor_pool
                .choose_multiple(&mut rng, DISTRACTOR_COUNT.min(distractor_pool.len()))
                .map(|d| d.to_string())
                .collect();
            options.push(word.definition.clone());
            options.shuffle(&mut rng);

            SessionWord {
                id: word.id,
                text: word.text.clone(),
                definition: word.definition.clone(),
                phonetic: word.phonetic.clone(),
                options,
            }
        })
        .collect();

    Ok(session)
}

async fn fetch_pool(db: &Database, level: &str) -> Result<Vec<PoolWord>, sqlx::Error> {
    // Level tags are stored comma-joined ("GRE,CET4"), so the filter is tag
    // containment, not equality.
    let rows = if level == LEVEL_WILDCARD {
        sqlx::query(r#"SELECT "id", "text", "definition", "phonetic" FROM "words""#)
            .fetch_all(db.pool())
            .await?
    } else {
        sqlx::query(
            r#"
            SELECT "id", "text", "definition", "phonetic" FROM "words"
            WHERE (',' || "level" || ',') LIKE ('%,' || $1 || ',%')
            "#,
        )
        .bind(level)
        .fetch_all(db.pool())
        .await?
    };

    Ok(rows
        .into_iter()
        .map(|row| PoolWord {
            id: row.get("id"),
            text: row.get("text"),
            definition: row.get("definition"),
            phonetic: row.get("phonetic"),
        })
        .collect())
}

async fn fetch_mastered_ids(db: &Database, user_id: &str) -> Result<HashSet<i64>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT "word_id" FROM "user_progress" WHERE "user_id" = $1 AND "is_mastered" = 1"#,
    )
    .bind(user_id)
    .fetch_all(db.pool())
    .await?;

    Ok(rows.into_iter().map(|row| row.get("word_id")).collect())
}
