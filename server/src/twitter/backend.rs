use async_trait::async_trait;

use crate::model::{ListId, User, UserId};

use super::error::TwitterResult;
use super::types::ListDefinition;

/// Opaque pagination token of a cursored endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor(pub i64);

/// One page of a cursored endpoint. `next` is `None` on the last page.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<Cursor>,
}

/// Raw Twitter calls at cursor level. `TwitterService` layers pagination and
/// error policy on top; nothing above it sees cursors.
#[async_trait]
pub trait TwitterBackend: Send + Sync {
    /// Id of the account the credentials belong to.
    async fn verify_credentials(&self) -> TwitterResult<UserId>;

    async fn show_user(&self, id: UserId) -> TwitterResult<User>;

    /// Accounts followed by `user`.
    async fn friends_page(
        &self,
        user: UserId,
        cursor: Cursor,
        count: u32,
    ) -> TwitterResult<Page<User>>;

    /// List definitions of `user`, without members.
    async fn user_lists(&self, user: UserId) -> TwitterResult<Vec<ListDefinition>>;

    async fn list_members_page(
        &self,
        list: ListId,
        cursor: Cursor,
        count: u32,
    ) -> TwitterResult<Page<User>>;

    async fn add_list_members(&self, list: ListId, users: &[UserId]) -> TwitterResult<()>;

    async fn remove_list_members(&self, list: ListId, users: &[UserId]) -> TwitterResult<()>;
}
