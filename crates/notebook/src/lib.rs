//! Shared knowledge notebook.
//!
//! A small team keeps a registry of named reference sources in a shared
//! key-value store. Admins add and remove sources; everyone asks questions
//! that are answered by an external service grounded in the active sources.
//!
//! - [`store`]: the shared store and its change notifications
//! - [`registry`]: the source list persisted under one key
//! - [`dispatcher`]: one question at a time, `Idle -> Busy -> Answered | Failed`
//! - [`service`]: the answering service seam and its LLM implementation
//! - [`view`]: the role-gated view model a host renders
//!
//! # Example
//! ```no_run
//! use notebook::{Notebook, UserPrompt};
//! use notebook_core::AppConfig;
//! use std::sync::Arc;
//!
//! struct Console;
//!
//! impl UserPrompt for Console {
//!     fn alert(&self, message: &str) {
//!         eprintln!("{}", message);
//!     }
//!
//!     fn confirm(&self, _message: &str) -> bool {
//!         true
//!     }
//! }
//!
//! # async fn example() -> notebook_core::AppResult<()> {
//! let notebook = Notebook::open(&AppConfig::load()?)?;
//! let mut view = notebook.view(Arc::new(Console))?;
//! view.set_question("What PPE is required?");
//! view.submit_question().await;
//! if let Some(answer) = view.answer() {
//!     println!("{}", answer.text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod dispatcher;
pub mod interaction;
pub mod prompt;
pub mod registry;
pub mod service;
pub mod session;
pub mod store;
pub mod types;
pub mod view;

pub use dispatcher::{QueryDispatcher, QueryOutcome, QueryState};
pub use interaction::UserPrompt;
pub use prompt::PromptBuilder;
pub use registry::SourceRegistry;
pub use service::{AnsweringService, LlmAnsweringService};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreEvent};
pub use types::{Answer, ReferenceLink, Role, ServiceReply, Source, SourceDraft, SourceType, User};
pub use view::{Header, ManagementPanel, NotebookView, SourceBadge, SourceRow};

use notebook_core::{AppConfig, AppResult, MessagesConfig};
use std::sync::Arc;
use std::time::Duration;

/// A configured notebook: one shared store and one answering service.
///
/// Every view opened from the same notebook shares the store, so a change
/// made in one view reaches the others on their next [`NotebookView::sync`].
pub struct Notebook {
    store: Arc<dyn KeyValueStore>,
    service: Arc<dyn AnsweringService>,
    messages: MessagesConfig,
}

impl Notebook {
    /// Build a notebook from configuration: file store under the workspace,
    /// answering service from the configured provider.
    pub fn open(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        let provider = config.provider_name();
        let api_key = config.resolve_api_key(&provider);
        let client = notebook_llm::create_client(
            &provider,
            config.endpoint.as_deref(),
            api_key.as_deref(),
            Duration::from_secs(config.timeout_secs),
        )?;

        let prompt = PromptBuilder::new(config.prompt_template.as_deref())?;
        let service = LlmAnsweringService::new(client, config.model.clone(), prompt);

        tracing::info!(
            provider = %provider,
            model = %config.model,
            "Answering service ready"
        );

        Self::with_service(config, Arc::new(service))
    }

    /// Build a notebook over the configured file store with a caller-supplied service.
    pub fn with_service(config: &AppConfig, service: Arc<dyn AnsweringService>) -> AppResult<Self> {
        let store = FileStore::open(config.store_dir())?;
        Ok(Self::from_parts(
            Arc::new(store),
            service,
            config.messages.clone(),
        ))
    }

    pub fn from_parts(
        store: Arc<dyn KeyValueStore>,
        service: Arc<dyn AnsweringService>,
        messages: MessagesConfig,
    ) -> Self {
        Self {
            store,
            service,
            messages,
        }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn messages(&self) -> &MessagesConfig {
        &self.messages
    }

    /// Open a new view. Each view loads the current user and the registry.
    pub fn view(&self, prompt: Arc<dyn UserPrompt>) -> AppResult<NotebookView> {
        NotebookView::open(
            self.store.clone(),
            self.service.clone(),
            prompt,
            self.messages.clone(),
        )
    }

    /// Record the signed-in user in the shared store.
    pub fn sign_in(&self, user: &User) -> AppResult<()> {
        session::set_current_user(self.store.as_ref(), user)
    }
}
