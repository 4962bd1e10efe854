//! In-memory backend for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::model::{ListId, User, UserId};

use super::backend::{Cursor, Page, TwitterBackend};
use super::error::{TwitterError, TwitterResult};
use super::types::ListDefinition;

/// Cursors handed out by the mock are `CURSOR_BASE + page index`.
const CURSOR_BASE: i64 = 1000;

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    VerifyCredentials,
    ShowUser(UserId),
    FriendsPage {
        user: UserId,
        cursor: Cursor,
        count: u32,
    },
    UserLists(UserId),
    ListMembersPage {
        list: ListId,
        cursor: Cursor,
        count: u32,
    },
    AddMembers(ListId, Vec<UserId>),
    RemoveMembers(ListId, Vec<UserId>),
}

/// Scripted pages: `None` makes that page fail with a 503.
type ScriptedPages = Vec<Option<Vec<User>>>;

#[derive(Default)]
pub struct MockBackend {
    me: Option<UserId>,
    users: Mutex<HashMap<UserId, User>>,
    friend_pages: ScriptedPages,
    lists: Vec<(ListDefinition, ScriptedPages)>,
    failing_lists: bool,
    failing_writes: AtomicU32,
    calls: Mutex<Vec<Call>>,
}

/// A user with predictable fields derived from `id`.
pub fn user(id: u64) -> User {
    User::new(
        UserId(id),
        format!("user{id}"),
        format!("User {id}"),
        format!("https://img.example/{id}.png"),
    )
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credentials belong to `me`; `me` is also resolvable by id.
    pub fn with_me(mut self, me: User) -> Self {
        self.me = Some(me.id);
        self.with_user(me)
    }

    pub fn with_user(self, user: User) -> Self {
        self.users.lock().unwrap().insert(user.id, user);
        self
    }

    pub fn with_friend_pages(mut self, pages: ScriptedPages) -> Self {
        self.friend_pages = pages;
        self
    }

    pub fn with_list(mut self, id: ListId, name: &str, member_pages: ScriptedPages) -> Self {
        self.lists.push((
            ListDefinition {
                id,
                name: name.into(),
            },
            member_pages,
        ));
        self
    }

    pub fn with_failing_lists(mut self) -> Self {
        self.failing_lists = true;
        self
    }

    /// The next `n` write calls fail with a 503.
    pub fn with_failing_writes(self, n: u32) -> Self {
        self.failing_writes.store(n, Ordering::SeqCst);
        self
    }

    pub fn replace_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn serve_page(pages: &ScriptedPages, cursor: Cursor) -> TwitterResult<Page<User>> {
        let index = if cursor.0 < CURSOR_BASE {
            0
        } else {
            (cursor.0 - CURSOR_BASE) as usize
        };
        match pages.get(index) {
            Some(Some(items)) => Ok(Page {
                items: items.clone(),
                next: (index + 1 < pages.len()).then(|| Cursor(CURSOR_BASE + index as i64 + 1)),
            }),
            Some(None) => Err(unavailable()),
            None => Ok(Page {
                items: Vec::new(),
                next: None,
            }),
        }
    }

    fn write(&self) -> TwitterResult<()> {
        let fail = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail { Err(unavailable()) } else { Ok(()) }
    }
}

fn unavailable() -> TwitterError {
    TwitterError::RemoteFetch {
        status: Some(503),
        message: "Over capacity".into(),
    }
}

#[async_trait]
impl TwitterBackend for MockBackend {
    async fn verify_credentials(&self) -> TwitterResult<UserId> {
        self.record(Call::VerifyCredentials);
        self.me
            .ok_or_else(|| TwitterError::Authentication("Invalid or expired token.".into()))
    }

    async fn show_user(&self, id: UserId) -> TwitterResult<User> {
        self.record(Call::ShowUser(id));
        self.users
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| TwitterError::RemoteFetch {
                status: Some(404),
                message: "User not found.".into(),
            })
    }

    async fn friends_page(
        &self,
        user: UserId,
        cursor: Cursor,
        count: u32,
    ) -> TwitterResult<Page<User>> {
        self.record(Call::FriendsPage {
            user,
            cursor,
            count,
        });
        Self::serve_page(&self.friend_pages, cursor)
    }

    async fn user_lists(&self, user: UserId) -> TwitterResult<Vec<ListDefinition>> {
        self.record(Call::UserLists(user));
        if self.failing_lists {
            return Err(TwitterError::RemoteFetch {
                status: Some(500),
                message: "Internal error".into(),
            });
        }
        Ok(self.lists.iter().map(|(def, _)| def.clone()).collect())
    }

    async fn list_members_page(
        &self,
        list: ListId,
        cursor: Cursor,
        count: u32,
    ) -> TwitterResult<Page<User>> {
        self.record(Call::ListMembersPage {
            list,
            cursor,
            count,
        });
        let pages = self
            .lists
            .iter()
            .find(|(def, _)| def.id == list)
            .map(|(_, pages)| pages)
            .ok_or_else(|| TwitterError::RemoteFetch {
                status: Some(404),
                message: "List not found.".into(),
            })?;
        Self::serve_page(pages, cursor)
    }

    async fn add_list_members(&self, list: ListId, users: &[UserId]) -> TwitterResult<()> {
        self.record(Call::AddMembers(list, users.to_vec()));
        self.write()
    }

    async fn remove_list_members(&self, list: ListId, users: &[UserId]) -> TwitterResult<()> {
        self.record(Call::RemoveMembers(list, users.to_vec()));
        self.write()
    }
}
