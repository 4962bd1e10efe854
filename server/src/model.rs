use std::collections::BTreeSet;
use std::fmt;

/// Twitter account id. Stable across fetches; the only identity key of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(pub u64);

/// Twitter list id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Twitter account as fetched from the API. Never mutated; a re-fetch
/// produces a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub screen_name: String,
    pub name: String,
    pub profile_image_url: String,
}

impl User {
    pub fn new(
        id: UserId,
        screen_name: impl Into<String>,
        name: impl Into<String>,
        profile_image_url: impl Into<String>,
    ) -> Self {
        Self {
            id,
            screen_name: screen_name.into(),
            name: name.into(),
            profile_image_url: profile_image_url.into(),
        }
    }

    /// "Display Name @handle", as shown in the user panel and grid rows.
    pub fn display_name(&self) -> String {
        format!("{} @{}", self.name, self.screen_name)
    }
}

/// A Twitter list with its live membership and the membership last known to
/// be persisted remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserList {
    pub id: ListId,
    pub name: String,
    /// Desired membership, edited locally.
    pub member_ids: BTreeSet<UserId>,
    /// Membership at the last synchronization point.
    snapshot: BTreeSet<UserId>,
}

impl UserList {
    /// Create a list as loaded from the remote side: the snapshot starts equal
    /// to the membership.
    pub fn new(id: ListId, name: impl Into<String>, member_ids: BTreeSet<UserId>) -> Self {
        Self {
            id,
            name: name.into(),
            snapshot: member_ids.clone(),
            member_ids,
        }
    }

    pub fn snapshot(&self) -> &BTreeSet<UserId> {
        &self.snapshot
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.member_ids.contains(&user_id)
    }

    /// Add or remove a user from the desired membership. Returns true if the
    /// membership changed.
    pub fn set_member(&mut self, user_id: UserId, member: bool) -> bool {
        if member {
            self.member_ids.insert(user_id)
        } else {
            self.member_ids.remove(&user_id)
        }
    }

    /// True when local edits have not been synchronized yet.
    pub fn is_dirty(&self) -> bool {
        self.member_ids != self.snapshot
    }

    /// Mark the current membership as persisted remotely.
    pub(crate) fn commit(&mut self) {
        self.snapshot = self.member_ids.clone();
    }

    /// Record that `members` is now the remote membership. Edits made since
    /// those members were pushed stay pending.
    pub(crate) fn mark_synced(&mut self, members: BTreeSet<UserId>) {
        self.snapshot = members;
    }
}
