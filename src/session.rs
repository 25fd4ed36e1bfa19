//! Mock login sessions and the learner state they carry.
//!
//! There is no password and no persistence: logging in with anything that
//! looks like an email address yields a bearer token that lives until it
//! expires, is logged out, is evicted to make room, or the process restarts.

use crate::evaluator::ExerciseSession;
use crate::security::constant_time_compare;
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Everything recorded about one learner's activity.
#[derive(Debug, Clone, Default)]
pub struct LearnerState {
    pub exercises: ExerciseSession,
    pub known_cards: HashSet<String>,
    pub studied_rules: HashSet<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Token-keyed session storage.
///
/// Implementations hold their lock only for the duration of each call and
/// never across an await point. Expired sessions behave as unknown tokens.
pub trait SessionStore: Send + Sync {
    fn login(&self, email: &str) -> Result<Session>;
    fn get(&self, token: &str) -> Option<Session>;
    fn logout(&self, token: &str) -> bool;

    /// Snapshot of the learner state behind `token`.
    fn learner(&self, token: &str) -> Option<LearnerState>;

    /// Run `f` against the learner state behind `token`. Returns false when
    /// the token is unknown or expired and `f` was not called.
    fn update_learner(&self, token: &str, f: &mut dyn FnMut(&mut LearnerState)) -> bool;
}

struct Entry {
    session: Session,
    learner: LearnerState,
}

pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Entry>>,
    ttl: chrono::Duration,
    capacity: usize,
}

impl InMemorySessionStore {
    /// A store whose sessions last `ttl` and which holds at most `capacity`
    /// of them; the oldest session is evicted to make room.
    pub fn new(ttl: std::time::Duration, capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            capacity: capacity.max(1),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Resolve the stored key for a presented token, skipping expired entries.
    ///
    /// Walks every key with a constant-time compare rather than hashing the
    /// presented value.
    fn find_key(map: &HashMap<String, Entry>, token: &str, now: DateTime<Utc>) -> Option<String> {
        map.iter()
            .find(|(key, _)| constant_time_compare(key, token))
            .filter(|(_, entry)| entry.session.is_live(now))
            .map(|(key, _)| key.clone())
    }

    /// Drop expired sessions, then the oldest ones until there is room for
    /// one more.
    fn make_room(&self, map: &mut HashMap<String, Entry>, now: DateTime<Utc>) {
        let before = map.len();
        map.retain(|_, entry| entry.session.is_live(now));

        while map.len() >= self.capacity {
            let oldest = map
                .iter()
                .min_by_key(|(_, entry)| entry.session.created_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    map.remove(&key);
                }
                None => break,
            }
        }

        let evicted = before - map.len();
        if evicted > 0 {
            debug!(evicted, remaining = map.len(), "Pruned sessions");
        }
    }
}

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

pub fn is_valid_email(email: &str) -> bool {
    let regex = EMAIL_REGEX
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
    regex.is_match(email)
}

impl SessionStore for InMemorySessionStore {
    fn login(&self, email: &str) -> Result<Session> {
        let email = email.trim();
        if !is_valid_email(email) {
            bail!("Invalid email address");
        }

        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4().to_string(),
            email: email.to_lowercase(),
            created_at: now,
            expires_at: now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        let mut map = self.sessions.write();
        self.make_room(&mut map, now);
        map.insert(
            session.token.clone(),
            Entry {
                session: session.clone(),
                learner: LearnerState::default(),
            },
        );

        info!(email = %session.email, active = map.len(), "Session started");
        Ok(session)
    }

    fn get(&self, token: &str) -> Option<Session> {
        let map = self.sessions.read();
        let key = Self::find_key(&map, token, Utc::now())?;
        map.get(&key).map(|entry| entry.session.clone())
    }

    fn logout(&self, token: &str) -> bool {
        let mut map = self.sessions.write();
        match Self::find_key(&map, token, Utc::now()) {
            Some(key) => {
                map.remove(&key);
                true
            }
            None => false,
        }
    }

    fn learner(&self, token: &str) -> Option<LearnerState> {
        let map = self.sessions.read();
        let key = Self::find_key(&map, token, Utc::now())?;
        map.get(&key).map(|entry| entry.learner.clone())
    }

    fn update_learner(&self, token: &str, f: &mut dyn FnMut(&mut LearnerState)) -> bool {
        let mut map = self.sessions.write();
        let Some(key) = Self::find_key(&map, token, Utc::now()) else {
            return false;
        };
        match map.get_mut(&key) {
            Some(entry) => {
                f(&mut entry.learner);
                true
            }
            None => false,
        }
    }
}
