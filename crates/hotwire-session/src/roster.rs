//! User roster reconciliation.
//!
//! The server sends both full roster snapshots and incremental
//! join/update/leave events; [`UserRoster`] merges them into one
//! duplicate-free list. Presence notices are returned to the controller,
//! which turns them into status-kind chat entries.

use tracing::debug;

use hotwire_shared::types::{User, UserId};

/// A presence change worth announcing in the chat log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterNotice {
    Joined(String),
    Left(String),
}

#[derive(Debug, Default)]
pub struct UserRoster {
    users: Vec<User>,
}

impl UserRoster {
    pub fn new() -> Self {
        Self { users: Vec::new() }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn get(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn clear(&mut self) {
        self.users.clear();
    }

    /// Reconcile a full roster snapshot.
    ///
    /// The snapshot defines membership and ordering, but a user already
    /// known before the snapshot keeps their current entry: an
    /// incremental change may have arrived between the server building
    /// the snapshot and us receiving it, and must not be regressed.
    pub fn apply_snapshot(&mut self, snapshot: Vec<User>) {
        let merged: Vec<User> = snapshot
            .into_iter()
            .map(|incoming| match self.get(incoming.id) {
                Some(existing) => existing.clone(),
                None => incoming,
            })
            .collect();

        debug!(count = merged.len(), "Applied roster snapshot");
        self.users = merged;
    }

    /// Apply a single-user change: update in place when known, otherwise
    /// the user just joined.
    pub fn apply_user_changed(&mut self, user: User) -> Option<RosterNotice> {
        if let Some(existing) = self.users.iter_mut().find(|u| u.id == user.id) {
            debug!(id = %user.id, name = %user.name, "Updating user");
            *existing = user;
            None
        } else {
            debug!(id = %user.id, name = %user.name, "User joined");
            let name = user.name.clone();
            self.users.push(user);
            Some(RosterNotice::Joined(name))
        }
    }

    /// Remove a departed user. No-op when the id is unknown.
    pub fn apply_user_disconnected(&mut self, id: UserId) -> Option<RosterNotice> {
        let index = self.users.iter().position(|u| u.id == id)?;
        let user = self.users.remove(index);
        debug!(id = %id, name = %user.name, "User left");
        Some(RosterNotice::Left(user.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotwire_shared::types::UserFlags;

    fn user(id: u16, name: &str) -> User {
        User {
            id: UserId(id),
            name: name.into(),
            icon_id: 414,
            flags: UserFlags::default(),
        }
    }

    #[test]
    fn snapshot_never_duplicates_ids() {
        let mut roster = UserRoster::new();
        roster.apply_snapshot(vec![user(1, "Ann"), user(2, "Bo")]);
        roster.apply_snapshot(vec![user(2, "Bo"), user(1, "Ann"), user(3, "Cy")]);

        let mut ids: Vec<u16> = roster.users().iter().map(|u| u.id.0).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), roster.len());
    }

    #[test]
    fn snapshot_keeps_locally_observed_state() {
        let mut roster = UserRoster::new();
        roster.apply_snapshot(vec![user(1, "Ann")]);

        // A rename arrives before the next snapshot.
        roster.apply_user_changed(user(1, "Annika"));

        // The stale snapshot must not regress the rename.
        roster.apply_snapshot(vec![user(1, "Ann"), user(2, "Bo")]);
        assert_eq!(roster.get(UserId(1)).unwrap().name, "Annika");
        assert_eq!(roster.get(UserId(2)).unwrap().name, "Bo");
    }

    #[test]
    fn snapshot_defines_membership_and_order() {
        let mut roster = UserRoster::new();
        roster.apply_snapshot(vec![user(1, "Ann"), user(2, "Bo"), user(3, "Cy")]);
        roster.apply_snapshot(vec![user(3, "Cy"), user(1, "Ann")]);

        let names: Vec<&str> = roster.users().iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Cy", "Ann"]);
        assert!(roster.get(UserId(2)).is_none());
    }

    #[test]
    fn change_and_disconnect_scenario() {
        let mut roster = UserRoster::new();
        roster.apply_snapshot(vec![user(1, "Ann")]);

        let notice = roster.apply_user_changed(user(2, "Bo"));
        assert_eq!(notice, Some(RosterNotice::Joined("Bo".into())));
        let names: Vec<&str> = roster.users().iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Ann", "Bo"]);

        let notice = roster.apply_user_disconnected(UserId(1));
        assert_eq!(notice, Some(RosterNotice::Left("Ann".into())));
        let names: Vec<&str> = roster.users().iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Bo"]);
    }

    #[test]
    fn update_in_place_emits_no_notice() {
        let mut roster = UserRoster::new();
        roster.apply_user_changed(user(1, "Ann"));
        assert_eq!(roster.apply_user_changed(user(1, "Annika")), None);
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn unknown_disconnect_is_a_no_op() {
        let mut roster = UserRoster::new();
        assert_eq!(roster.apply_user_disconnected(UserId(9)), None);
    }
}
