use serde::Serialize;
use sqlx::Row;

use crate::db::Database;

/// Correct answers needed before a word counts as engraved.
pub const MASTERY_THRESHOLD: i64 = 3;

#[derive(Debug, Clone, Serialize)]
pub struct ProgressResult {
    pub word_id: i64,
    pub mastery_count: i64,
    pub is_mastered: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressOverview {
    pub total_words: i64,
    pub mastered: i64,
    pub in_progress: i64,
    #[serde(rename = "new")]
    pub new_words: i64,
}

/// One-way ratchet: a correct answer moves the counter up to the cap, a
/// wrong one leaves it where it is. Mastery is a pure function of the
/// counter and never reverts.
pub fn apply_answer(mastery_count: i64, correct: bool) -> (i64, bool) {
    let count = if correct {
        (mastery_count + 1).min(MASTERY_THRESHOLD)
    } else {
        mastery_count
    };
    (count, count >= MASTERY_THRESHOLD)
}

pub async fn record_answer(
    db: &Database,
    user_id: &str,
    word_id: i64,
    correct: bool,
) -> Result<ProgressResult, sqlx::Error> {
    let existing = sqlx::query(
        r#"
        SELECT "mastery_count" FROM "user_progress"
        WHERE "user_id" = $1 AND "word_id" = $2
        "#,
    )
    .bind(user_id)
    .bind(word_id)
    .fetch_optional(db.pool())
    .await?;

    let current: i64 = existing
        .as_ref()
        .map(|row| row.get("mastery_count"))
        .unwrap_or(0);

    let (mastery_count, is_mastered) = apply_answer(current, correct);
    let last_reviewed = chrono::Utc::now().to_rfc3339();

    // Concurrent updates for the same pair are last-write-wins; the counter
    // saturates at the threshold regardless of ordering.
    sqlx::query(
        r#"
        INSERT INTO "user_progress" ("user_id", "word_id", "mastery_count", "is_mastered", "last_reviewed")
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT ("user_id", "word_id") DO UPDATE SET
            "mastery_count" = excluded."mastery_count",
            "is_mastered" = excluded."is_mastered",
            "last_reviewed" = excluded."last_reviewed"
        "#,
    )
    .bind(user_id)
    .bind(word_id)
    .bind(mastery_count)
    .bind(is_mastered)
    .bind(last_reviewed)
    .execute(db.pool())
    .await?;

    Ok(ProgressResult {
        word_id,
        mastery_count,
        is_mastered,
    })
}

pub async fn user_overview(
    db: &Database,
    user_id: &str,
) -> Result<ProgressOverview, sqlx::Error> {
    let total_words: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "words""#)
        .fetch_one(db.pool())
        .await?;

    let mastered: i64 = sqlx::query_scalar(
        r#"SELECT COUNT(*) FROM "user_progress" WHERE "user_id" = $1 AND "is_mastered" = 1"#,
    )
    .bind(user_id)
    .fetch_one(db.pool())
    .await?;

    let in_progress: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM "user_progress"
        WHERE "user_id" = $1 AND "is_mastered" = 0 AND "mastery_count" > 0
        "#,
    )
    .bind(user_id)
    .fetch_one(db.pool())
    .await?;

    Ok(ProgressOverview {
        total_words,
        mastered,
        in_progress,
        new_words: total_words - mastered - in_progress,
    })
}
