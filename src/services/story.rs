use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::Row;
use thiserror::Error;

use crate::db::Database;
use crate::services::llm_provider::{ChatApi, ChatOptions};

pub const DEFAULT_THEME: &str = "量化投资";

/// The model is told to emit the English section, this exact line, then the
/// Chinese section. Parsing keys off the first occurrence.
pub const SECTION_DELIMITER: &str = "=====";
pub const STORY_LABEL: &str = "【英文故事】";
pub const TRANSLATION_LABEL: &str = "【中文翻译】";

const STORY_SYSTEM_PROMPT: &str =
    "You are a creative writing assistant specializing in educational content for vocabulary learning.";
const STORY_OPTIONS: ChatOptions = ChatOptions {
    temperature: 0.8,
    max_tokens: 1000,
};

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("no words found for the given ids")]
    NoWords,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct StoryWord {
    pub id: i64,
    pub text: String,
    pub definition: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoryResult {
    pub content: String,
    pub translation: String,
    pub keywords: Vec<String>,
    pub word_definitions: HashMap<String, String>,
    pub theme: String,
}

/// Outcome of splitting the raw completion into story and translation.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedStory {
    Parsed { english: String, chinese: String },
    Unparsed { raw: String },
}

/// Content address for a generated story: the numerically sorted id list and
/// the theme, so any submission order of the same word set maps to the same
/// entry. 16 hex chars of SHA-256.
pub fn story_cache_key(word_ids: &[i64], theme: &str) -> String {
    let mut sorted = word_ids.to_vec();
    sorted.sort_unstable();
    let id_list = sorted
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");

    let mut hasher = Sha256::new();
    hasher.update(id_list.as_bytes());
    hasher.update(b"|");
    hasher.update(theme.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)[..16].to_string()
}

pub fn parse_story_response(raw: &str) -> ParsedStory {
    match raw.find(SECTION_DELIMITER) {
        Some(pos) => {
            let english = strip_section_label(&raw[..pos], STORY_LABEL);
            let chinese = strip_section_label(
                &raw[pos + SECTION_DELIMITER.len()..],
                TRANSLATION_LABEL,
            );
            ParsedStory::Parsed { english, chinese }
        }
        None => ParsedStory::Unparsed {
            raw: raw.trim().to_string(),
        },
    }
}

fn strip_section_label(section: &str, label: &str) -> String {
    let trimmed = section.trim();
    // The delimiter line may carry leftover '=' from a longer rule the model
    // drew; shave those before looking for the label.
    let trimmed = trimmed.trim_matches('=').trim();
    trimmed
        .strip_prefix(label)
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

pub fn build_story_prompt(words: &[StoryWord], theme: &str) -> String {
    let word_list = words
        .iter()
        .map(|w| format!("- {}: {}", w.text, w.definition))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "你是一位创意写作大师。请根据以下英语单词，创作一段约 150-200 词的英语短文，并给出中文翻译。\n\n\
         主题：{theme}\n\n\
         必须使用的单词：\n{word_list}\n\n\
         要求：\n\
         1. 故事必须自然地融入所有单词，并将每个目标单词用 **粗体** 标记\n\
         2. 内容需要有趣且有教育意义，语言难度适合英语学习者\n\
         3. 故事需要有完整的开头、发展和结尾\n\
         4. 按以下格式输出，分隔行必须单独一行且恰好为 {SECTION_DELIMITER}：\n\
         {STORY_LABEL}\n\
         <英语短文>\n\
         {SECTION_DELIMITER}\n\
         {TRANSLATION_LABEL}\n\
         <中文翻译>\n\n\
         请直接按格式输出，不要任何其他前缀或解释。"
    )
}

/// Deterministic stand-in used when the external call fails: every word,
/// emphasis-marked, with its definition in both sections, and the failure
/// reason embedded in the text. Never cached.
pub fn build_fallback_story(words: &[StoryWord], theme: &str, reason: &str) -> (String, String) {
    let english = words
        .iter()
        .map(|w| format!("**{}** means \"{}\".", w.text, w.definition))
        .collect::<Vec<_>>()
        .join(" ");
    let content = format!(
        "A short review for the theme \"{theme}\". {english} [AI story generation failed: {reason}]"
    );

    let translation = words
        .iter()
        .map(|w| format!("**{}**：{}。", w.text, w.definition))
        .collect::<Vec<_>>()
        .join("");

    (content, translation)
}

pub async fn get_or_generate(
    db: &Database,
    chat: &Arc<dyn ChatApi>,
    word_ids: &[i64],
    theme: &str,
) -> Result<StoryResult, StoryError> {
    let key = story_cache_key(word_ids, theme);

    let cached = sqlx::query(
        r#"SELECT "content", "translation" FROM "story_cache" WHERE "cache_key" = $1"#,
    )
    .bind(&key)
    .fetch_optional(db.pool())
    .await?;

    if let Some(row) = cached {
        tracing::debug!(cache_key = %key, "story cache hit");
        let words = fetch_words(db, word_ids).await?;
        return Ok(assemble(
            row.get::<String, _>("content"),
            row.get::<String, _>("translation"),
            &words,
            theme,
        ));
    }

    let words = fetch_words(db, word_ids).await?;
    if words.is_empty() {
        return Err(StoryError::NoWords);
    }

    let prompt = build_story_prompt(&words, theme);
    let (content, translation) = match chat
        .complete_with_system(STORY_SYSTEM_PROMPT, &prompt, STORY_OPTIONS)
        .await
    {
        Ok(raw) => {
            let (english, chinese) = match parse_story_response(&raw) {
                ParsedStory::Parsed { english, chinese } => (english, chinese),
                ParsedStory::Unparsed { raw } => {
                    tracing::warn!(cache_key = %key, "story response missing delimiter, keeping raw text");
                    (raw, String::new())
                }
            };
            store_cache_entry(db, &key, &english, &chinese, theme).await?;
            (english, chinese)
        }
        Err(err) => {
            tracing::warn!(error = %err, cache_key = %key, "story generation failed, using fallback");
            build_fallback_story(&words, theme, &err.to_string())
        }
    };

    Ok(assemble(content, translation, &words, theme))
}

fn assemble(
    content: String,
    translation: String,
    words: &[StoryWord],
    theme: &str,
) -> StoryResult {
    StoryResult {
        content,
        translation,
        keywords: words.iter().map(|w| w.text.clone()).collect(),
        word_definitions: words
            .iter()
            .map(|w| (w.text.clone(), w.definition.clone()))
            .collect(),
        theme: theme.to_string(),
    }
}

async fn fetch_words(db: &Database, word_ids: &[i64]) -> Result<Vec<StoryWord>, sqlx::Error> {
    if word_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = sqlx::QueryBuilder::new(
        r#"SELECT "id", "text", "definition" FROM "words" WHERE "id" IN ("#,
    );
    let mut separated = qb.separated(", ");
    for id in word_ids {
        separated.push_bind(*id);
    }
    qb.push(r#") ORDER BY "id""#);

    let rows = qb.build().fetch_all(db.pool()).await?;
    Ok(rows
        .into_iter()
        .map(|row| StoryWord {
            id: row.get("id"),
            text: row.get("text"),
            definition: row.get("definition"),
        })
        .collect())
}

async fn store_cache_entry(
    db: &Database,
    key: &str,
    content: &str,
    translation: &str,
    theme: &str,
) -> Result<(), sqlx::Error> {
    let created_at = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO "story_cache" ("cache_key", "content", "translation", "theme", "created_at")
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT ("cache_key") DO NOTHING
        "#,
    )
    .bind(key)
    .bind(content)
    .bind(translation)
    .bind(theme)
    .bind(created_at)
    .execute(db.pool())
    .await?;
    Ok(())
}
