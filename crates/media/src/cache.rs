//! Process-lifetime artwork cache.
//!
//! Entries are never invalidated. Each id owns one `OnceLock` cell: the map
//! lock is only held to find or create the cell, and the first caller to
//! reach an empty cell resolves it while later callers for the same id
//! block on that cell. At most one resolution runs per id.

use corpus::{MovieId, PersonId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

/// Resolved profile image and biography of a person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonProfile {
    pub profile_url: String,
    pub biography: String,
}

type Cells<K, V> = Mutex<HashMap<K, Arc<OnceLock<V>>>>;

#[derive(Debug, Default)]
pub struct ArtworkCache {
    posters: Cells<MovieId, String>,
    people: Cells<PersonId, PersonProfile>,
}

impl ArtworkCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poster(&self, movie_id: MovieId) -> Option<String> {
        resolved(&self.posters, movie_id)
    }

    /// Cached poster for `movie_id`, running `resolve` on a miss.
    ///
    /// Concurrent callers for the same id wait for the one running
    /// `resolve` and get its value.
    pub fn poster_or_resolve(
        &self,
        movie_id: MovieId,
        resolve: impl FnOnce() -> String,
    ) -> String {
        cell(&self.posters, movie_id).get_or_init(resolve).clone()
    }

    /// Store `url` unless a value is already cached; returns the cached value
    pub fn insert_poster(&self, movie_id: MovieId, url: String) -> String {
        self.poster_or_resolve(movie_id, || url)
    }

    pub fn person(&self, person_id: PersonId) -> Option<PersonProfile> {
        resolved(&self.people, person_id)
    }

    pub fn person_or_resolve(
        &self,
        person_id: PersonId,
        resolve: impl FnOnce() -> PersonProfile,
    ) -> PersonProfile {
        cell(&self.people, person_id).get_or_init(resolve).clone()
    }

    /// Store `profile` unless a value is already cached; returns the cached value
    pub fn insert_person(&self, person_id: PersonId, profile: PersonProfile) -> PersonProfile {
        self.person_or_resolve(person_id, || profile)
    }

    pub fn poster_count(&self) -> usize {
        count(&self.posters)
    }

    pub fn person_count(&self) -> usize {
        count(&self.people)
    }
}

fn cell<K: Hash + Eq, V>(cells: &Cells<K, V>, key: K) -> Arc<OnceLock<V>> {
    Arc::clone(lock(cells).entry(key).or_default())
}

fn resolved<K: Hash + Eq, V: Clone>(cells: &Cells<K, V>, key: K) -> Option<V> {
    lock(cells).get(&key).and_then(|cell| cell.get().cloned())
}

// cells still being resolved are not counted
fn count<K, V>(cells: &Cells<K, V>) -> usize {
    lock(cells).values().filter(|cell| cell.get().is_some()).count()
}

// A panic while holding the lock cannot leave a map half-written
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
