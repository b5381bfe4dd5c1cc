#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use futures::future::BoxFuture;

use voca_backend_rust::db::Database;
use voca_backend_rust::services::llm_provider::{ChatApi, ChatOptions, LLMError};

/// Chat double with a queue of scripted replies and a call counter. An empty
/// queue answers with an error, which drives the fallback path.
pub struct ScriptedChat {
    replies: Mutex<VecDeque<Result<String, String>>>,
    calls: AtomicUsize,
}

impl ScriptedChat {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn push_ok(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub fn push_err(&self, reason: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Err(reason.into()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChatApi for ScriptedChat {
    fn complete_with_system<'a>(
        &'a self,
        _system: &str,
        _user: &str,
        _options: ChatOptions,
    ) -> BoxFuture<'a, Result<String, LLMError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.replies.lock().unwrap().pop_front();
        Box::pin(async move {
            match next {
                Some(Ok(reply)) => Ok(reply),
                Some(Err(reason)) => Err(LLMError::HttpStatus {
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                    body: reason,
                }),
                None => Err(LLMError::NotConfigured("scripted")),
            }
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: Database,
    pub chat: Arc<ScriptedChat>,
}

pub async fn create_test_app() -> TestApp {
    let db = Database::connect_in_memory().await.unwrap();
    let chat = Arc::new(ScriptedChat::new());
    let router = voca_backend_rust::app_with(db.clone(), chat.clone());
    TestApp { router, db, chat }
}

pub async fn insert_word(db: &Database, text: &str, definition: &str, level: &str) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO "words" ("text", "definition", "level")
        VALUES ($1, $2, $3)
        RETURNING "id"
        "#,
    )
    .bind(text)
    .bind(definition)
    .bind(level)
    .fetch_one(db.pool())
    .await
    .unwrap()
}
