use serde::Serialize;
use thiserror::Error;

use crate::model::{ListId, User, UserId, UserList};

/// One checkbox column per list.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GridColumn {
    pub list_id: String,
    pub name: String,
    /// Local edits not yet saved.
    pub dirty: bool,
}

/// One row per friend. `memberships[i]` belongs to `columns[i]`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GridRow {
    pub user_id: String,
    pub display_name: String,
    pub profile_image_url: String,
    pub memberships: Vec<bool>,
}

/// Users × lists membership table, derived from the session state on read.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct MembershipGrid {
    pub columns: Vec<GridColumn>,
    pub rows: Vec<GridRow>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("no list with id {0}")]
    UnknownList(ListId),
    #[error("no row for user {0}")]
    UnknownUser(UserId),
}

impl MembershipGrid {
    pub fn project(users: &[User], lists: &[UserList]) -> Self {
        let columns = lists
            .iter()
            .map(|list| GridColumn {
                list_id: list.id.to_string(),
                name: list.name.clone(),
                dirty: list.is_dirty(),
            })
            .collect();

        let rows = users
            .iter()
            .map(|user| GridRow {
                user_id: user.id.to_string(),
                display_name: user.display_name(),
                profile_image_url: user.profile_image_url.clone(),
                memberships: lists.iter().map(|list| list.contains(user.id)).collect(),
            })
            .collect();

        Self { columns, rows }
    }
}

/// Write a checkbox edit back into the list's live membership. Nothing is sent
/// to Twitter here. Returns whether the membership changed.
pub fn set_membership(
    users: &[User],
    lists: &mut [UserList],
    user_id: UserId,
    list_id: ListId,
    member: bool,
) -> Result<bool, GridError> {
    if !users.iter().any(|u| u.id == user_id) {
        return Err(GridError::UnknownUser(user_id));
    }
    let list = lists
        .iter_mut()
        .find(|l| l.id == list_id)
        .ok_or(GridError::UnknownList(list_id))?;
    Ok(list.set_member(user_id, member))
}
