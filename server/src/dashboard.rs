//! Per-session view model: load state machine, notifications and the
//! membership grid of one browser session.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{Instrument, Span, error, info, info_span};
use uuid::Uuid;

use crate::grid::{self, GridError, MembershipGrid};
use crate::model::{ListId, User, UserId, UserList};
use crate::sync::RetryPolicy;
use crate::twitter::error::{TwitterError, TwitterResult};
use crate::twitter::service::{Loaded, TwitterService};

pub type SessionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    Initializing,
    LoadingUser,
    LoadingData,
    Ready,
    /// The current user could not be loaded. Terminal until a reload.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Transient message for the page; handed out once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// The profile panel at the top of the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserPanel {
    pub id: String,
    pub screen_name: String,
    pub name: String,
    pub display_name: String,
    pub profile_image_url: String,
}

impl From<&User> for UserPanel {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            screen_name: user.screen_name.clone(),
            name: user.name.clone(),
            display_name: user.display_name(),
            profile_image_url: user.profile_image_url.clone(),
        }
    }
}

/// Everything the page renders.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub state: LoadState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserPanel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub status: String,
    pub unsaved_lists: usize,
    pub grid: MembershipGrid,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DashboardError {
    #[error("data is not loaded yet")]
    NotReady,
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Outcome of a save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub saved: usize,
    pub failed: usize,
}

/// View state of one session. Only mutated under the session lock; remote
/// calls happen outside of it.
pub struct Dashboard {
    state: LoadState,
    /// Bumped on every load so results of a superseded load are dropped.
    generation: u64,
    user: Option<User>,
    friends: Vec<User>,
    lists: Vec<UserList>,
    error: Option<String>,
    notifications: Vec<Notification>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            state: LoadState::Initializing,
            generation: 0,
            user: None,
            friends: Vec::new(),
            lists: Vec::new(),
            error: None,
            notifications: Vec::new(),
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn status(&self) -> String {
        match self.state {
            LoadState::Initializing => "starting".into(),
            LoadState::LoadingUser => "loading user".into(),
            LoadState::LoadingData => "loading friends and lists".into(),
            LoadState::Ready => {
                format!("{} friends, {} lists", self.friends.len(), self.lists.len())
            }
            LoadState::Error => "error".into(),
        }
    }

    /// Render the current state, handing out pending notifications.
    pub fn view(&mut self) -> DashboardView {
        DashboardView {
            state: self.state,
            user: self.user.as_ref().map(UserPanel::from),
            error: self.error.clone(),
            status: self.status(),
            unsaved_lists: self.lists.iter().filter(|l| l.is_dirty()).count(),
            grid: MembershipGrid::project(&self.friends, &self.lists),
            notifications: std::mem::take(&mut self.notifications),
        }
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification {
            level,
            message: message.into(),
        });
    }

    // ── Load transitions ──

    fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.state = LoadState::LoadingUser;
        self.user = None;
        self.friends.clear();
        self.lists.clear();
        self.error = None;
        self.generation
    }

    fn user_loaded(&mut self, generation: u64, user: User) -> bool {
        if generation != self.generation {
            return false;
        }
        self.state = LoadState::LoadingData;
        self.user = Some(user);
        true
    }

    fn user_failed(&mut self, generation: u64, err: &TwitterError) {
        if generation != self.generation {
            return;
        }
        let message = format!("could not retrieve user: {err}");
        self.state = LoadState::Error;
        self.error = Some(message.clone());
        self.notify(NotificationLevel::Error, message);
    }

    fn data_loaded(
        &mut self,
        generation: u64,
        friends: Loaded<Vec<User>>,
        lists: TwitterResult<Loaded<Vec<UserList>>>,
    ) {
        if generation != self.generation {
            return;
        }
        self.friends = friends.value;
        let mut truncated = friends.truncated;
        match lists {
            Ok(lists) => {
                self.lists = lists.value;
                truncated.extend(lists.truncated);
            }
            Err(e) => self.notify(NotificationLevel::Error, format!("could not load lists: {e}")),
        }
        for walk in truncated {
            self.notify(NotificationLevel::Error, format!("could not load all {walk}"));
        }
        self.state = LoadState::Ready;
        let status = self.status();
        self.notify(NotificationLevel::Info, format!("loaded {status}"));
    }

    // ── Edits ──

    pub fn set_membership(
        &mut self,
        user_id: UserId,
        list_id: ListId,
        member: bool,
    ) -> Result<bool, DashboardError> {
        if self.state != LoadState::Ready {
            return Err(DashboardError::NotReady);
        }
        Ok(grid::set_membership(
            &self.friends,
            &mut self.lists,
            user_id,
            list_id,
            member,
        )?)
    }

    fn dirty_lists(&self) -> Vec<UserList> {
        self.lists.iter().filter(|l| l.is_dirty()).cloned().collect()
    }

    fn list_synced(&mut self, generation: u64, list_id: ListId, members: BTreeSet<UserId>) {
        if generation != self.generation {
            return;
        }
        if let Some(list) = self.lists.iter_mut().find(|l| l.id == list_id) {
            list.mark_synced(members);
        }
    }
}

/// A browser session: its view model plus the service it loads through.
#[derive(Clone)]
pub struct Session {
    pub id: SessionId,
    dashboard: Arc<Mutex<Dashboard>>,
    service: Arc<TwitterService>,
    retry: RetryPolicy,
    span: Span,
}

impl Session {
    pub fn new(service: Arc<TwitterService>, retry: RetryPolicy) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            dashboard: Arc::new(Mutex::new(Dashboard::new())),
            service,
            retry,
            span: info_span!("session", %id),
        }
    }

    /// Load the current user, then friends and lists concurrently. Each
    /// result is applied to the dashboard in one locked update.
    pub async fn load(&self) {
        async {
            let generation = self.dashboard.lock().await.begin_load();

            let user = match self.service.current_user().await {
                Ok(user) => user,
                Err(e) => {
                    error!(error = %e, "could not retrieve current user");
                    self.dashboard.lock().await.user_failed(generation, &e);
                    return;
                }
            };
            info!(user = %user.screen_name, "current user loaded");
            if !self.dashboard.lock().await.user_loaded(generation, user.clone()) {
                return;
            }

            let (friends, lists) =
                tokio::join!(self.service.load_friends(&user), self.service.load_lists(&user));
            if let Err(e) = &lists {
                error!(error = %e, "could not load lists");
            }

            let mut dashboard = self.dashboard.lock().await;
            dashboard.data_loaded(generation, friends, lists);
            info!(status = %dashboard.status(), "dashboard ready");
        }
        .instrument(self.span.clone())
        .await
    }

    pub async fn view(&self) -> DashboardView {
        self.dashboard.lock().await.view()
    }

    pub async fn state(&self) -> LoadState {
        self.dashboard.lock().await.state()
    }

    /// Local checkbox edit; nothing is sent until `save`.
    pub async fn set_membership(
        &self,
        user_id: UserId,
        list_id: ListId,
        member: bool,
    ) -> Result<bool, DashboardError> {
        self.dashboard
            .lock()
            .await
            .set_membership(user_id, list_id, member)
    }

    /// Push every list with unsaved edits. Failures become notifications and
    /// leave the list's edits pending.
    pub async fn save(&self) -> Result<SaveReport, DashboardError> {
        async {
            let (generation, dirty) = {
                let dashboard = self.dashboard.lock().await;
                if dashboard.state != LoadState::Ready {
                    return Err(DashboardError::NotReady);
                }
                (dashboard.generation, dashboard.dirty_lists())
            };

            let mut report = SaveReport::default();
            if dirty.is_empty() {
                self.dashboard
                    .lock()
                    .await
                    .notify(NotificationLevel::Info, "nothing to save");
                return Ok(report);
            }

            for mut list in dirty {
                match self
                    .service
                    .apply_list_changes_with_retry(&mut list, &self.retry)
                    .await
                {
                    Ok(_) => {
                        report.saved += 1;
                        self.dashboard.lock().await.list_synced(
                            generation,
                            list.id,
                            list.snapshot().clone(),
                        );
                    }
                    Err(e) => {
                        report.failed += 1;
                        error!(list = %list.id, error = %e, "could not save list");
                        self.dashboard.lock().await.notify(
                            NotificationLevel::Error,
                            format!("could not save list {}: {e}", list.name),
                        );
                    }
                }
            }

            if report.saved > 0 {
                self.dashboard.lock().await.notify(
                    NotificationLevel::Info,
                    format!("saved {} list(s)", report.saved),
                );
            }
            Ok(report)
        }
        .instrument(self.span.clone())
        .await
    }
}
