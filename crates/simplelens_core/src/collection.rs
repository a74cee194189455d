//! Keyed, order-stable subject collection.
//!
//! # Responsibility
//! - Hold the lens-wide set of subjects the realtime stream mutates.
//! - Provide key-based (`SubjectId`) and path-based lookups.
//!
//! # Invariants
//! - At most one subject per `SubjectId`.
//! - Iteration order is first-insertion order; replacing a subject never
//!   moves it, removing one keeps the relative order of the rest.
//! - `index` always maps every id to its current slot in `entries`.

use crate::model::subject::{Subject, SubjectId};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Process-wide subject state of one lens session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectCollection {
    entries: Vec<Subject>,
    index: BTreeMap<SubjectId, usize>,
}

impl SubjectCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &SubjectId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &SubjectId) -> Option<&Subject> {
        self.index.get(id).and_then(|slot| self.entries.get(*slot))
    }

    pub fn get_mut(&mut self, id: &SubjectId) -> Option<&mut Subject> {
        let slot = *self.index.get(id)?;
        self.entries.get_mut(slot)
    }

    /// Current position of `id` in iteration order.
    pub fn position(&self, id: &SubjectId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// First subject, in iteration order, whose `absolute_path` is `path`.
    pub fn find_by_path(&self, path: &str) -> Option<&Subject> {
        self.entries
            .iter()
            .find(|subject| subject.absolute_path == path)
    }

    pub fn find_by_path_mut(&mut self, path: &str) -> Option<&mut Subject> {
        self.entries
            .iter_mut()
            .find(|subject| subject.absolute_path == path)
    }

    /// Inserts or replaces by id.
    ///
    /// A new id is appended at the end. An existing id is replaced in its
    /// current slot and the previous value is returned.
    pub fn insert(&mut self, subject: Subject) -> Option<Subject> {
        if let Some(slot) = self.index.get(&subject.id).copied() {
            return Some(std::mem::replace(&mut self.entries[slot], subject));
        }
        self.index.insert(subject.id.clone(), self.entries.len());
        self.entries.push(subject);
        None
    }

    /// Removes the subject with `id`, keeping the order of the others.
    pub fn remove(&mut self, id: &SubjectId) -> Option<Subject> {
        let slot = self.index.remove(id)?;
        let removed = self.entries.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        Some(removed)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Subject> {
        self.entries.iter()
    }

    /// Ids in iteration order.
    pub fn ids(&self) -> impl Iterator<Item = &SubjectId> {
        self.entries.iter().map(|subject| &subject.id)
    }

    /// Total number of samples across all subjects.
    pub fn sample_count(&self) -> usize {
        self.entries.iter().map(|subject| subject.samples.len()).sum()
    }
}

impl<'a> IntoIterator for &'a SubjectCollection {
    type Item = &'a Subject;
    type IntoIter = std::slice::Iter<'a, Subject>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<Subject> for SubjectCollection {
    /// Later duplicates replace earlier ones in place.
    fn from_iter<I: IntoIterator<Item = Subject>>(iter: I) -> Self {
        let mut collection = Self::new();
        for subject in iter {
            collection.insert(subject);
        }
        collection
    }
}

impl Serialize for SubjectCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::SubjectCollection;
    use crate::model::subject::{Subject, SubjectId};

    fn paths(collection: &SubjectCollection) -> Vec<&str> {
        collection
            .iter()
            .map(|subject| subject.absolute_path.as_str())
            .collect()
    }

    #[test]
    fn insert_appends_new_ids_in_order() {
        let collection: SubjectCollection = vec![
            Subject::new("a", "A"),
            Subject::new("b", "B"),
            Subject::new("c", "C"),
        ]
        .into_iter()
        .collect();

        assert_eq!(paths(&collection), vec!["A", "B", "C"]);
        assert_eq!(collection.position(&SubjectId::new("c")), Some(2));
    }

    #[test]
    fn insert_existing_id_replaces_in_place() {
        let mut collection: SubjectCollection =
            vec![Subject::new("a", "A"), Subject::new("b", "B")]
                .into_iter()
                .collect();

        let previous = collection.insert(Subject::new("a", "A2"));
        assert_eq!(previous.map(|subject| subject.absolute_path), Some("A".to_string()));
        assert_eq!(paths(&collection), vec!["A2", "B"]);
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn remove_reindexes_following_entries() {
        let mut collection: SubjectCollection = vec![
            Subject::new("a", "A"),
            Subject::new("b", "B"),
            Subject::new("c", "C"),
        ]
        .into_iter()
        .collect();

        assert!(collection.remove(&SubjectId::new("a")).is_some());
        assert_eq!(paths(&collection), vec!["B", "C"]);
        assert_eq!(collection.position(&SubjectId::new("c")), Some(1));
        assert_eq!(
            collection
                .get(&SubjectId::new("c"))
                .map(|subject| subject.absolute_path.as_str()),
            Some("C")
        );
        assert!(collection.remove(&SubjectId::new("a")).is_none());
    }

    #[test]
    fn find_by_path_returns_first_match() {
        let collection: SubjectCollection =
            vec![Subject::new("a", "Same"), Subject::new("b", "Same")]
                .into_iter()
                .collect();
        assert_eq!(
            collection.find_by_path("Same").map(|subject| subject.id.as_str()),
            Some("a")
        );
    }
}
