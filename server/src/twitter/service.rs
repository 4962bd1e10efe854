use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tracing::{Instrument, Span, debug, info, warn};

use crate::model::{User, UserId, UserList};
use crate::sync::{MembershipDiff, RetryPolicy};

use super::backend::TwitterBackend;
use super::error::{TwitterError, TwitterResult};
use super::paging::{self, FRIENDS, LIST_MEMBERS};

/// A paged load. `truncated` names each walk a failed page cut short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded<T> {
    pub value: T,
    pub truncated: Vec<String>,
}

/// Twitter access in domain terms. Owns the pagination and failure policy:
/// paged reads keep partial results, single reads and writes propagate.
pub struct TwitterService {
    backend: Arc<dyn TwitterBackend>,
    span: Span,
}

impl TwitterService {
    /// `span` is the logging context every call of this service runs in.
    pub fn new(backend: Arc<dyn TwitterBackend>, span: Span) -> Self {
        Self { backend, span }
    }

    /// Profile of the account the credentials belong to.
    pub async fn current_user(&self) -> TwitterResult<User> {
        async {
            let id = self.backend.verify_credentials().await?;
            self.backend.show_user(id).await
        }
        .instrument(self.span.clone())
        .await
    }

    pub async fn user_by_id(&self, id: UserId) -> TwitterResult<User> {
        self.backend
            .show_user(id)
            .instrument(self.span.clone())
            .await
    }

    /// Accounts `user` follows, in the order Twitter returns them. A failing
    /// page ends the walk; what was fetched so far is returned.
    pub async fn friends_of(&self, user: &User) -> Vec<User> {
        self.load_friends(user).await.value
    }

    /// `friends_of`, also reporting whether the walk was cut short.
    pub async fn load_friends(&self, user: &User) -> Loaded<Vec<User>> {
        let backend = self.backend.as_ref();
        let user_id = user.id;
        async {
            let pages = paging::pages(FRIENDS, move |cursor, count| {
                backend.friends_page(user_id, cursor, count)
            });
            let collected = paging::collect_partial(FRIENDS, pages).await;
            let mut seen = HashSet::new();
            let friends: Vec<User> = collected
                .items
                .into_iter()
                .filter(|u| seen.insert(u.id))
                .collect();
            debug!(user = %user_id, count = friends.len(), "loaded friends");
            Loaded {
                value: friends,
                truncated: if collected.complete {
                    Vec::new()
                } else {
                    vec!["friends".to_string()]
                },
            }
        }
        .instrument(self.span.clone())
        .await
    }

    /// Lists of `user` with their members. Fails only if the list definitions
    /// cannot be fetched; a failing member page truncates that one list.
    pub async fn lists_of(&self, user: &User) -> TwitterResult<Vec<UserList>> {
        Ok(self.load_lists(user).await?.value)
    }

    /// `lists_of`, also naming the lists whose members were cut short.
    pub async fn load_lists(&self, user: &User) -> TwitterResult<Loaded<Vec<UserList>>> {
        let backend = self.backend.as_ref();
        async {
            let definitions = backend.user_lists(user.id).await?;
            let mut lists = Vec::with_capacity(definitions.len());
            let mut truncated = Vec::new();
            for definition in definitions {
                let list_id = definition.id;
                let pages = paging::pages(LIST_MEMBERS, move |cursor, count| {
                    backend.list_members_page(list_id, cursor, count)
                });
                let collected = paging::collect_partial(LIST_MEMBERS, pages).await;
                if !collected.complete {
                    truncated.push(format!("members of list {}", definition.name));
                }
                let members: BTreeSet<_> = collected.items.into_iter().map(|u| u.id).collect();
                debug!(list = %list_id, members = members.len(), "loaded list");
                lists.push(UserList::new(list_id, definition.name, members));
            }
            Ok(Loaded {
                value: lists,
                truncated,
            })
        }
        .instrument(self.span.clone())
        .await
    }

    /// Push local membership edits of `list` to Twitter: one add call if
    /// anything was added, one remove call if anything was removed. The
    /// snapshot advances only once all issued calls succeeded; on failure it
    /// is left alone so the same diff is computed again.
    pub async fn apply_list_changes(&self, list: &mut UserList) -> TwitterResult<MembershipDiff> {
        let diff = MembershipDiff::of(list);
        if diff.is_empty() {
            return Ok(diff);
        }

        let list_id = list.id;
        let write_conflict = |source: TwitterError| TwitterError::WriteConflict {
            list: list_id,
            source: Box::new(source),
        };

        async {
            if !diff.to_add.is_empty() {
                let ids: Vec<_> = diff.to_add.iter().copied().collect();
                self.backend
                    .add_list_members(list_id, &ids)
                    .await
                    .map_err(write_conflict)?;
            }
            if !diff.to_remove.is_empty() {
                let ids: Vec<_> = diff.to_remove.iter().copied().collect();
                self.backend
                    .remove_list_members(list_id, &ids)
                    .await
                    .map_err(write_conflict)?;
            }
            info!(
                list = %list_id,
                added = diff.to_add.len(),
                removed = diff.to_remove.len(),
                "list synchronized"
            );
            Ok::<_, TwitterError>(())
        }
        .instrument(self.span.clone())
        .await?;

        list.commit();
        Ok(diff)
    }

    /// `apply_list_changes`, retried according to `policy`.
    pub async fn apply_list_changes_with_retry(
        &self,
        list: &mut UserList,
        policy: &RetryPolicy,
    ) -> TwitterResult<MembershipDiff> {
        let mut attempt = 1;
        loop {
            match self.apply_list_changes(list).await {
                Ok(diff) => return Ok(diff),
                Err(e) if policy.should_retry(attempt, &e) => {
                    let delay = policy.delay_after(attempt, &e);
                    self.span.in_scope(|| {
                        warn!(
                            list = %list.id,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "retrying list update"
                        )
                    });
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
