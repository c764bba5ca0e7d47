//! External-collaborator seam for group metadata.
//!
//! The framework does not persist anything itself; embedders that cache
//! chat metadata (titles, member lists) plug in behind this trait. The
//! pipeline pushes title changes through it when a rename event decodes.

use async_trait::async_trait;

/// Receives group-metadata updates observed on the callback channel.
#[async_trait]
pub trait GroupMetaStore: Send + Sync {
    /// Records the new title of a chat.
    async fn upsert_title(&self, chat_id: &str, title: &str);
}

/// Default store that drops every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetaStore;

#[async_trait]
impl GroupMetaStore for NoopMetaStore {
    async fn upsert_title(&self, _chat_id: &str, _title: &str) {}
}
