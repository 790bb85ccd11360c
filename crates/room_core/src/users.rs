//! Registered users and session correlation.
//!
//! The roster itself is static configuration. The only mutable part is the
//! session id linking a registered user to the player currently connected
//! as them, which is set at join and cleared at leave.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::{PlayerId, PlayerSnapshot};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredUser {
    /// Internal id, also the stats key
    pub id: String,
    pub name: String,
    /// Long-lived public auth tokens this user may present
    #[serde(default)]
    pub public_ids: Vec<String>,
    #[serde(default)]
    pub greetings: Vec<String>,
    #[serde(default)]
    pub super_admin: bool,
    #[serde(skip)]
    pub session_id: Option<PlayerId>,
}

impl RegisteredUser {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            public_ids: Vec::new(),
            greetings: Vec::new(),
            super_admin: false,
            session_id: None,
        }
    }

    pub fn with_public_id(mut self, public_id: impl Into<String>) -> Self {
        self.public_ids.push(public_id.into());
        self
    }

    /// Random greeting phrase, falling back to a plain welcome.
    pub fn greeting<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> String {
        self.greetings
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| format!("Welcome back {} !", self.name))
    }
}

/// Outcome of matching a joining player against the roster.
#[derive(Debug, Clone, PartialEq)]
pub enum Correlation {
    /// Correlated; the session id now points at the joining player
    Registered(RegisteredUser),
    /// No registered user matched
    Anonymous,
    /// The auth token belongs to a user who is already connected
    DuplicateSession(RegisteredUser),
}

#[derive(Debug, Default)]
pub struct UserRepository {
    users: RwLock<Vec<RegisteredUser>>,
}

impl UserRepository {
    pub fn new(users: Vec<RegisteredUser>) -> Self {
        Self { users: RwLock::new(users) }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<RegisteredUser>> {
        self.users.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<RegisteredUser>> {
        self.users.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Match a joining player by auth token first, then by display name.
    ///
    /// `connected` is the current roster (joining player included). A token
    /// already held by another connected player is a duplicate session. A
    /// name match never takes over a user who is connected elsewhere.
    pub fn correlate(&self, player: &PlayerSnapshot, connected: &[PlayerId]) -> Correlation {
        let mut users = self.write();
        let is_online = |user: &RegisteredUser| {
            user.session_id
                .map_or(false, |sid| sid != player.id && connected.contains(&sid))
        };

        let by_auth = player
            .auth
            .as_deref()
            .and_then(|auth| users.iter().position(|u| u.public_ids.iter().any(|id| id == auth)));

        if let Some(index) = by_auth {
            if is_online(&users[index]) {
                return Correlation::DuplicateSession(users[index].clone());
            }
            users[index].session_id = Some(player.id);
            return Correlation::Registered(users[index].clone());
        }

        match users.iter().position(|u| u.name == player.name) {
            Some(index) if !is_online(&users[index]) => {
                users[index].session_id = Some(player.id);
                Correlation::Registered(users[index].clone())
            }
            _ => Correlation::Anonymous,
        }
    }

    /// Clear the session held by a leaving player. Returns the released user id.
    pub fn release(&self, player: PlayerId) -> Option<String> {
        let mut users = self.write();
        let user = users.iter_mut().find(|u| u.session_id == Some(player))?;
        user.session_id = None;
        Some(user.id.clone())
    }

    pub fn find_by_session(&self, player: PlayerId) -> Option<RegisteredUser> {
        self.read().iter().find(|u| u.session_id == Some(player)).cloned()
    }

    pub fn find(&self, id: &str) -> Option<RegisteredUser> {
        self.read().iter().find(|u| u.id == id).cloned()
    }

    pub fn display_name(&self, id: &str) -> String {
        self.find(id).map(|u| u.name).unwrap_or_else(|| id.to_string())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
