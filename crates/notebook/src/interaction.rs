//! Blocking user notices.
//!
//! The host supplies the actual dialogs; the notebook only decides when a
//! notice or a confirmation is needed.

/// Modal notices and confirmations shown to the user.
pub trait UserPrompt: Send + Sync {
    /// Show a blocking notice.
    fn alert(&self, message: &str);

    /// Ask a yes/no question. `false` means the user declined.
    fn confirm(&self, message: &str) -> bool;
}
