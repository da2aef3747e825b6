use std::collections::BTreeSet;

use album_types::PhotoId;

/// Which records are marked for a batch operation.
///
/// Every id is unselected until marked. Only marked ids are stored, so
/// unmarking an id leaves no entry behind. The state is never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    marked: BTreeSet<PhotoId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the mark on `id` and return the new value.
    pub fn toggle(&mut self, id: &PhotoId) -> bool {
        if self.marked.remove(id) {
            false
        } else {
            self.marked.insert(id.clone());
            true
        }
    }

    pub fn set(&mut self, id: &PhotoId, selected: bool) {
        if selected {
            self.marked.insert(id.clone());
        } else {
            self.marked.remove(id);
        }
    }

    pub fn set_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a PhotoId>, selected: bool) {
        for id in ids {
            self.set(id, selected);
        }
    }

    pub fn clear(&mut self) {
        self.marked.clear();
    }

    pub fn is_selected(&self, id: &PhotoId) -> bool {
        self.marked.contains(id)
    }

    /// Drop any entry for `id`. Called when the record leaves the collection.
    pub fn forget(&mut self, id: &PhotoId) {
        self.marked.remove(id);
    }

    /// Keep only the ids for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&PhotoId) -> bool) {
        self.marked.retain(|id| keep(id));
    }

    pub fn len(&self) -> usize {
        self.marked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }

    /// Marked ids, without checking whether they still exist anywhere.
    pub fn marked(&self) -> impl Iterator<Item = &PhotoId> {
        self.marked.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> PhotoId {
        PhotoId::new(s).unwrap()
    }

    #[test]
    fn defaults_to_unselected() {
        let sel = SelectionState::new();
        assert!(!sel.is_selected(&id("a")));
        assert!(sel.is_empty());
    }

    #[test]
    fn toggle_flips() {
        let mut sel = SelectionState::new();
        assert!(sel.toggle(&id("a")));
        assert!(sel.is_selected(&id("a")));
        assert!(!sel.toggle(&id("a")));
        assert!(!sel.is_selected(&id("a")));
        assert!(sel.is_empty());
    }

    #[test]
    fn set_all_and_clear() {
        let mut sel = SelectionState::new();
        let ids = [id("a"), id("b"), id("c")];
        sel.set_all(&ids, true);
        assert_eq!(sel.len(), 3);
        sel.set_all(&ids[..2], false);
        assert_eq!(sel.marked().cloned().collect::<Vec<_>>(), vec![id("c")]);
        sel.clear();
        assert!(sel.is_empty());
    }

    #[test]
    fn forget_removes_entry() {
        let mut sel = SelectionState::new();
        sel.set(&id("a"), true);
        sel.forget(&id("a"));
        sel.forget(&id("never"));
        assert!(sel.is_empty());
    }

    #[test]
    fn retain_prunes() {
        let mut sel = SelectionState::new();
        sel.set_all(&[id("keep"), id("drop")], true);
        sel.retain(|i| i.as_str() == "keep");
        assert!(sel.is_selected(&id("keep")));
        assert!(!sel.is_selected(&id("drop")));
    }
}
