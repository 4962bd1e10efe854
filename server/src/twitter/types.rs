//! Twitter REST API v1.1 wire types.

use serde::Deserialize;

use crate::model::{ListId, User, UserId};

/// User object as returned by `users/show`, `friends/list` and `lists/members`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    pub id: u64,
    pub screen_name: String,
    pub name: String,
    #[serde(default)]
    pub profile_image_url_https: String,
}

impl From<ApiUser> for User {
    fn from(u: ApiUser) -> Self {
        User::new(UserId(u.id), u.screen_name, u.name, u.profile_image_url_https)
    }
}

/// A cursored page of users. `next_cursor == 0` marks the last page.
#[derive(Debug, Clone, Deserialize)]
pub struct CursoredUsers {
    #[serde(default)]
    pub users: Vec<ApiUser>,
    #[serde(default)]
    pub next_cursor: i64,
}

/// List object from `lists/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiList {
    pub id: u64,
    pub name: String,
}

/// A list definition without its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDefinition {
    pub id: ListId,
    pub name: String,
}

impl From<ApiList> for ListDefinition {
    fn from(l: ApiList) -> Self {
        Self {
            id: ListId(l.id),
            name: l.name,
        }
    }
}

/// Error body: `{"errors":[{"code":50,"message":"User not found."}]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorEntry {
    #[serde(default)]
    pub code: i32,
    pub message: String,
}

impl ApiErrorBody {
    /// First error message, if the body carried any.
    pub fn message(&self) -> Option<String> {
        self.errors.first().map(|e| e.message.clone())
    }
}
