use std::sync::Arc;

use serde::Serialize;
use sqlx::Row;

use crate::db::Database;
use crate::services::llm_provider::{ChatApi, ChatOptions};

/// Catalog rows inserted by the dictionary lookup rather than an importer.
pub const AI_LEVEL_TAG: &str = "AI";

const TRANSLATE_SYSTEM_PROMPT: &str = "你是一个简洁的英语词典。只输出中文释义，不要任何其他内容。";
const TRANSLATE_OPTIONS: ChatOptions = ChatOptions {
    temperature: 0.3,
    max_tokens: 100,
};

#[derive(Debug, Clone, Serialize)]
pub struct TranslationResult {
    pub word: String,
    pub definition: String,
    pub source: &'static str,
}

/// Looks the word up in the catalog; on a miss asks the dictionary model and
/// persists the answer as an AI-sourced catalog row. This endpoint never
/// fails on the model's account; a broken call reports `source: "error"`.
pub async fn translate_word(
    db: &Database,
    chat: &Arc<dyn ChatApi>,
    raw_word: &str,
) -> Result<TranslationResult, sqlx::Error> {
    let word = raw_word.trim().to_lowercase();

    let existing = sqlx::query(r#"SELECT "text", "definition" FROM "words" WHERE "text" = $1"#)
        .bind(&word)
        .fetch_optional(db.pool())
        .await?;

    if let Some(row) = existing {
        return Ok(TranslationResult {
            word: row.get("text"),
            definition: row.get("definition"),
            source: "database",
        });
    }

    let user_prompt = format!("请用简短的中文解释这个英语单词的意思：{word}");
    match chat
        .complete_with_system(TRANSLATE_SYSTEM_PROMPT, &user_prompt, TRANSLATE_OPTIONS)
        .await
    {
        Ok(definition) => {
            sqlx::query(
                r#"
                INSERT INTO "words" ("text", "definition", "level")
                VALUES ($1, $2, $3)
                ON CONFLICT ("text") DO NOTHING
                "#,
            )
            .bind(&word)
            .bind(&definition)
            .bind(AI_LEVEL_TAG)
            .execute(db.pool())
            .await?;

            tracing::info!(word = %word, "translated via AI and added to catalog");

            Ok(TranslationResult {
                word,
                definition,
                source: "ai",
            })
        }
        Err(err) => {
            tracing::warn!(word = %word, error = %err, "AI translation failed");
            Ok(TranslationResult {
                word,
                definition: format!("翻译失败: {err}"),
                source: "error",
            })
        }
    }
}
