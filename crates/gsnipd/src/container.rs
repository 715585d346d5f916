//! Concurrency-safe name to snippet mapping.
//!
//! The container owns the name-uniqueness invariant. Reads share a
//! reader/writer lock and every mutation takes it exclusively, so two
//! concurrent inserts of the same name cannot both see the name as free.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;

use crate::snippet::Snippet;

/// Errors raised by container operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContainerError {
    /// A snippet with this name is already stored.
    #[error("snippet '{name}' already exists")]
    DuplicateName {
        /// Name that collided.
        name: String,
    },
    /// No snippet with this name is stored.
    #[error("snippet '{name}' not found")]
    NotFound {
        /// Name that was looked up.
        name: String,
    },
    /// Another thread panicked while holding the container lock.
    #[error("snippet container lock poisoned")]
    Poisoned,
}

/// Name-keyed snippet store.
#[derive(Debug, Default)]
pub struct SnippetContainer {
    entries: RwLock<BTreeMap<String, Snippet>>,
}

impl SnippetContainer {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a container from parser output.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::DuplicateName`] when the source repeats a
    /// name.
    pub fn from_snippets(snippets: Vec<Snippet>) -> Result<Self, ContainerError> {
        let container = Self::new();
        container.insert_all(snippets)?;
        Ok(container)
    }

    /// Stores a snippet under its name. Existing entries are never
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::DuplicateName`] when the name is taken.
    pub fn insert(&self, snippet: Snippet) -> Result<(), ContainerError> {
        let mut entries = self.write()?;
        if entries.contains_key(&snippet.name) {
            return Err(ContainerError::DuplicateName { name: snippet.name });
        }
        entries.insert(snippet.name.clone(), snippet);
        Ok(())
    }

    /// Stores every snippet of a batch or none of them.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::DuplicateName`] for the first name that is
    /// already stored or repeats within the batch. The container is left
    /// untouched in that case.
    pub fn insert_all(&self, batch: Vec<Snippet>) -> Result<(), ContainerError> {
        let mut entries = self.write()?;
        if let Some(name) = first_collision(&entries, &batch) {
            return Err(ContainerError::DuplicateName { name });
        }
        for snippet in batch {
            entries.insert(snippet.name.clone(), snippet);
        }
        Ok(())
    }

    /// Looks up a snippet by name.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::NotFound`] when the name is absent.
    pub fn find(&self, name: &str) -> Result<Snippet, ContainerError> {
        self.read()?
            .get(name)
            .cloned()
            .ok_or_else(|| ContainerError::NotFound {
                name: name.to_owned(),
            })
    }

    /// Returns `name\tdescription` lines sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::Poisoned`] if the lock is poisoned.
    pub fn list(&self) -> Result<Vec<String>, ContainerError> {
        Ok(self.read()?.values().map(Snippet::listing).collect())
    }

    /// Removes a snippet. Removing an absent name succeeds.
    ///
    /// Returns whether an entry was actually removed.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::Poisoned`] if the lock is poisoned.
    pub fn delete(&self, name: &str) -> Result<bool, ContainerError> {
        Ok(self.write()?.remove(name).is_some())
    }

    /// Returns every snippet sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::Poisoned`] if the lock is poisoned.
    pub fn list_all(&self) -> Result<Vec<Snippet>, ContainerError> {
        Ok(self.read()?.values().cloned().collect())
    }

    /// Number of stored snippets.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::Poisoned`] if the lock is poisoned.
    pub fn len(&self) -> Result<usize, ContainerError> {
        Ok(self.read()?.len())
    }

    /// Whether the container holds no snippets.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::Poisoned`] if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, ContainerError> {
        Ok(self.read()?.is_empty())
    }

    /// Deep copy used to stage a mutation before committing it.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::Poisoned`] if the lock is poisoned.
    pub fn try_clone(&self) -> Result<Self, ContainerError> {
        let entries = self.read()?.clone();
        Ok(Self {
            entries: RwLock::new(entries),
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Snippet>>, ContainerError> {
        self.entries.read().map_err(|_| ContainerError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Snippet>>, ContainerError> {
        self.entries.write().map_err(|_| ContainerError::Poisoned)
    }
}

fn first_collision(entries: &BTreeMap<String, Snippet>, batch: &[Snippet]) -> Option<String> {
    let mut seen = BTreeSet::new();
    batch
        .iter()
        .find(|snippet| entries.contains_key(&snippet.name) || !seen.insert(snippet.name.as_str()))
        .map(|snippet| snippet.name.clone())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn letters() -> SnippetContainer {
        SnippetContainer::from_snippets(vec![
            Snippet::new("gamma", "third", "g"),
            Snippet::new("alpha", "first", "a"),
            Snippet::new("beta", "second", "b"),
        ])
        .expect("build container")
    }

    #[rstest]
    fn rejects_duplicate_names_without_overwriting(letters: SnippetContainer) {
        let error = letters
            .insert(Snippet::new("alpha", "replacement", "x"))
            .expect_err("duplicate insert");
        assert_eq!(
            error,
            ContainerError::DuplicateName {
                name: String::from("alpha")
            }
        );
        let kept = letters.find("alpha").expect("alpha still present");
        assert_eq!(kept.description, "first");
        assert_eq!(letters.len().expect("len"), 3);
    }

    #[rstest]
    fn lists_sorted_by_name(letters: SnippetContainer) {
        let listing = letters.list().expect("list");
        assert_eq!(listing, ["alpha\tfirst", "beta\tsecond", "gamma\tthird"]);
        let names: Vec<String> = letters
            .list_all()
            .expect("list all")
            .into_iter()
            .map(|snippet| snippet.name)
            .collect();
        assert_eq!(names, ["alpha", "beta", "gamma"]);
    }

    #[rstest]
    fn find_reports_missing_names(letters: SnippetContainer) {
        let error = letters.find("delta").expect_err("missing");
        assert!(matches!(error, ContainerError::NotFound { name } if name == "delta"));
    }

    #[rstest]
    fn delete_is_idempotent(letters: SnippetContainer) {
        assert!(letters.delete("beta").expect("first delete"));
        assert!(!letters.delete("beta").expect("second delete"));
        assert!(!letters.delete("never-there").expect("absent delete"));
        assert_eq!(letters.len().expect("len"), 2);
    }

    #[rstest]
    #[case::clashes_with_stored(vec![
        Snippet::new("delta", "fourth", "d"),
        Snippet::new("alpha", "again", "a"),
    ])]
    #[case::repeats_within_batch(vec![
        Snippet::new("delta", "fourth", "d"),
        Snippet::new("delta", "fourth again", "d"),
    ])]
    fn batch_insert_is_all_or_nothing(letters: SnippetContainer, #[case] batch: Vec<Snippet>) {
        letters.insert_all(batch).expect_err("batch rejected");
        assert_eq!(letters.len().expect("len"), 3);
        assert!(letters.find("delta").is_err());
    }

    #[rstest]
    fn batch_insert_stores_every_member(letters: SnippetContainer) {
        letters
            .insert_all(vec![
                Snippet::new("delta", "fourth", "d"),
                Snippet::new("epsilon", "fifth", "e"),
            ])
            .expect("batch accepted");
        assert_eq!(letters.len().expect("len"), 5);
    }

    #[rstest]
    fn from_snippets_rejects_repeated_source_names() {
        let result = SnippetContainer::from_snippets(vec![
            Snippet::new("twin", "one", "1"),
            Snippet::new("twin", "two", "2"),
        ]);
        assert!(matches!(result, Err(ContainerError::DuplicateName { .. })));
    }

    #[rstest]
    fn staged_copy_is_independent(letters: SnippetContainer) {
        let staged = letters.try_clone().expect("clone");
        staged.delete("alpha").expect("delete in stage");
        assert!(letters.find("alpha").is_ok());
        assert!(staged.find("alpha").is_err());
    }

    #[rstest]
    fn concurrent_inserts_of_one_name_admit_a_single_winner() {
        let container = Arc::new(SnippetContainer::new());
        let handles: Vec<_> = (0..8)
            .map(|attempt| {
                let container = Arc::clone(&container);
                thread::spawn(move || {
                    container
                        .insert(Snippet::new("shared", format!("attempt {attempt}"), ""))
                        .is_ok()
                })
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|handle| handle.join().expect("join insert thread"))
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(container.len().expect("len"), 1);
    }
}
