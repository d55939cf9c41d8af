//! Shared fixtures for notebook integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use notebook::{AnsweringService, ServiceReply, Source, UserPrompt};
use notebook_core::{AppError, AppResult};
use std::sync::Mutex;

/// Records every notice and answers confirmations with a fixed choice.
pub struct RecordingPrompt {
    pub alerts: Mutex<Vec<String>>,
    pub confirms: Mutex<Vec<String>>,
    accept: bool,
}

impl RecordingPrompt {
    pub fn accepting() -> Self {
        Self {
            alerts: Mutex::new(Vec::new()),
            confirms: Mutex::new(Vec::new()),
            accept: true,
        }
    }

    pub fn declining() -> Self {
        Self {
            accept: false,
            ..Self::accepting()
        }
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }
}

impl UserPrompt for RecordingPrompt {
    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }

    fn confirm(&self, message: &str) -> bool {
        self.confirms.lock().unwrap().push(message.to_string());
        self.accept
    }
}

/// Answers with a canned reply, or fails when none is set.
pub struct StubService {
    reply: Option<ServiceReply>,
    pub calls: Mutex<Vec<(String, Vec<Source>)>>,
}

impl StubService {
    pub fn replying(reply: ServiceReply) -> Self {
        Self {
            reply: Some(reply),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AnsweringService for StubService {
    async fn answer(&self, question: &str, sources: &[Source]) -> AppResult<ServiceReply> {
        self.calls
            .lock()
            .unwrap()
            .push((question.to_string(), sources.to_vec()));
        self.reply
            .clone()
            .ok_or_else(|| AppError::Llm("answering service unavailable".to_string()))
    }
}
