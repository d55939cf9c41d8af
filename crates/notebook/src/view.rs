//! Notebook view model.
//!
//! Holds everything one open notebook screen needs: the registry, the
//! dispatcher, the add-source form, the question input, and the signed-in
//! user that gates source management. Rendering is left to the host.

use crate::dispatcher::{QueryDispatcher, QueryOutcome, QueryState};
use crate::interaction::UserPrompt;
use crate::registry::SourceRegistry;
use crate::service::AnsweringService;
use crate::session;
use crate::store::{KeyValueStore, StoreEvent, CURRENT_USER_KEY, SOURCES_KEY};
use crate::types::{Answer, ReferenceLink, Source, SourceDraft, SourceType, User};
use notebook_core::{AppResult, MessagesConfig};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// One badge per active source in the unprivileged header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBadge {
    /// First character of the source name
    pub initial: String,
    /// Full source name
    pub title: String,
}

/// Header shown to users without source management rights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    Badges(Vec<SourceBadge>),
    /// No source is active; questions fall back to general knowledge
    GeneralKnowledge(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    pub id: String,
    pub name: String,
    pub path: String,
}

/// Source management panel. Only ever built for admins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagementPanel {
    pub rows: Vec<SourceRow>,
    pub is_empty: bool,
    pub adding: bool,
    pub draft: SourceDraft,
}

pub struct NotebookView {
    store: Arc<dyn KeyValueStore>,
    registry: SourceRegistry,
    dispatcher: QueryDispatcher,
    prompt: Arc<dyn UserPrompt>,
    messages: MessagesConfig,
    user: Option<User>,
    adding: bool,
    draft: SourceDraft,
    question: String,
    events: broadcast::Receiver<StoreEvent>,
    // Reloads still owed; kept across a failed sync
    pending_user: bool,
    pending_sources: bool,
}

impl NotebookView {
    /// Open a view over `store`, loading the current user and the registry.
    pub fn open(
        store: Arc<dyn KeyValueStore>,
        service: Arc<dyn AnsweringService>,
        prompt: Arc<dyn UserPrompt>,
        messages: MessagesConfig,
    ) -> AppResult<Self> {
        // Subscribe before loading so no write between the two is missed
        let events = store.subscribe();
        let user = session::current_user(store.as_ref())?;
        let registry = SourceRegistry::open(store.clone(), messages.clone())?;
        let dispatcher = QueryDispatcher::new(service, messages.link_fallback.clone());

        tracing::debug!(
            sources = registry.len(),
            admin = user.as_ref().map(User::is_admin).unwrap_or(false),
            "Opened notebook view"
        );

        Ok(Self {
            store,
            registry,
            dispatcher,
            prompt,
            messages,
            user,
            adding: false,
            draft: SourceDraft::default(),
            question: String::new(),
            events,
            pending_user: false,
            pending_sources: false,
        })
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_admin)
    }

    pub fn sources(&self) -> &[Source] {
        self.registry.sources()
    }

    // --- source management (admin only) ---

    /// The management panel, or `None` for users without admin rights.
    pub fn management_panel(&self) -> Option<ManagementPanel> {
        if !self.is_admin() {
            return None;
        }

        Some(ManagementPanel {
            rows: self
                .registry
                .sources()
                .iter()
                .map(|s| SourceRow {
                    id: s.id.clone(),
                    name: s.name.clone(),
                    path: s.path.clone(),
                })
                .collect(),
            is_empty: self.registry.is_empty(),
            adding: self.adding,
            draft: self.draft.clone(),
        })
    }

    /// Open or close the add-source form. Returns whether it is now open.
    pub fn toggle_add_form(&mut self) -> bool {
        if self.is_admin() {
            self.adding = !self.adding;
        }
        self.adding
    }

    pub fn is_adding(&self) -> bool {
        self.adding
    }

    pub fn draft(&self) -> &SourceDraft {
        &self.draft
    }

    pub fn set_draft_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
    }

    /// Set the draft path. Pasted paths are links, so the type becomes `url`.
    pub fn set_draft_path(&mut self, path: impl Into<String>) {
        self.draft.path = path.into();
        self.draft.source_type = SourceType::Url;
    }

    pub fn set_draft_type(&mut self, source_type: SourceType) {
        self.draft.source_type = source_type;
    }

    pub fn set_draft_content(&mut self, content: impl Into<String>) {
        self.draft.content = Some(content.into());
    }

    /// Save the draft as a new source.
    ///
    /// A validation failure shows the missing-fields notice and leaves both
    /// the registry and the form untouched. On success the form is reset and
    /// closed. Store failures are returned to the caller.
    pub fn submit_draft(&mut self) -> AppResult<Option<Source>> {
        if !self.is_admin() {
            tracing::warn!("Ignoring source submission from a non-admin user");
            return Ok(None);
        }

        match self.registry.add(&self.draft) {
            Ok(source) => {
                self.draft = SourceDraft::default();
                self.adding = false;
                self.prompt.alert(&self.messages.source_added);
                Ok(Some(source))
            }
            Err(e) if e.is_validation() => {
                self.prompt.alert(&e.to_string());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Delete a source after the user confirms. Returns whether a record was removed.
    pub fn delete_source(&mut self, id: &str) -> AppResult<bool> {
        if !self.is_admin() {
            tracing::warn!(id, "Ignoring delete from a non-admin user");
            return Ok(false);
        }

        if !self.prompt.confirm(&self.messages.confirm_delete) {
            tracing::debug!(id, "Delete declined");
            return Ok(false);
        }

        self.registry.remove(id)
    }

    // --- questions ---

    /// Header for users without admin rights; `None` for admins.
    pub fn header(&self) -> Option<Header> {
        if self.is_admin() {
            return None;
        }

        let badges: Vec<SourceBadge> = self
            .registry
            .sources()
            .iter()
            .filter(|s| s.is_active)
            .map(|s| SourceBadge {
                initial: s.name.chars().next().map(String::from).unwrap_or_default(),
                title: s.name.clone(),
            })
            .collect();

        if badges.is_empty() {
            Some(Header::GeneralKnowledge(
                self.messages.general_knowledge.clone(),
            ))
        } else {
            Some(Header::Badges(badges))
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    /// Replace the question text. A displayed answer or failure is cleared.
    pub fn set_question(&mut self, question: impl Into<String>) {
        self.question = question.into();
        self.dispatcher.input_changed();
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        !self.dispatcher.is_busy() && !self.question.trim().is_empty()
    }

    /// Send the current question with the active sources.
    ///
    /// A failure shows the generic failure notice.
    pub async fn submit_question(&self) -> QueryOutcome {
        let outcome = self
            .dispatcher
            .ask(&self.question, self.registry.sources())
            .await;

        if outcome == QueryOutcome::Failed {
            self.prompt.alert(&self.messages.query_failed);
        }
        outcome
    }

    pub fn query_state(&self) -> QueryState {
        self.dispatcher.state()
    }

    /// Watch query state transitions, e.g. to disable the submit control.
    pub fn subscribe_queries(&self) -> watch::Receiver<QueryState> {
        self.dispatcher.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.dispatcher.is_busy()
    }

    pub fn answer(&self) -> Option<Answer> {
        self.dispatcher.state().answer().cloned()
    }

    /// Links of the displayed answer; empty when there is nothing to show.
    pub fn reference_links(&self) -> Vec<ReferenceLink> {
        self.answer().map(|a| a.links).unwrap_or_default()
    }

    pub fn dismiss_answer(&self) {
        self.dispatcher.dismiss();
    }

    // --- cross-view sync ---

    /// Apply pending store notifications. Returns whether anything was reloaded.
    ///
    /// The user is reloaded before the sources. A reload that fails stays
    /// pending and is retried on the next call.
    pub fn sync(&mut self) -> AppResult<bool> {
        loop {
            match self.events.try_recv() {
                Ok(event) => match event.key.as_str() {
                    SOURCES_KEY => self.pending_sources = true,
                    CURRENT_USER_KEY => self.pending_user = true,
                    _ => {}
                },
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Store notifications lagged; reloading everything");
                    self.pending_sources = true;
                    self.pending_user = true;
                }
                Err(broadcast::error::TryRecvError::Empty)
                | Err(broadcast::error::TryRecvError::Closed) => break,
            }
        }

        let mut reloaded = false;

        if self.pending_user {
            self.user = session::current_user(self.store.as_ref())?;
            self.pending_user = false;
            reloaded = true;
            if !self.is_admin() {
                self.adding = false;
            }
        }

        if self.pending_sources {
            self.registry.load()?;
            self.pending_sources = false;
            reloaded = true;
        }

        Ok(reloaded)
    }
}
