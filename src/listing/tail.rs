use crate::item::ItemId;

/// Items known to belong to the collection whose position relative to
/// unfetched pages is unresolved. Kept in insertion order.
#[derive(Debug, Default)]
pub struct UnorderedTail {
    ids: Vec<ItemId>,
}

impl UnorderedTail {
    /// Append an id at the end. Returns `false` if it was already present,
    /// in which case its position is left unchanged.
    pub fn push(&mut self, id: ItemId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn remove(&mut self, id: &ItemId) -> bool {
        match self.ids.iter().position(|t| t == id) {
            Some(idx) => {
                self.ids.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.ids.iter().any(|t| t == id)
    }

    pub fn retain(&mut self, keep: impl FnMut(&ItemId) -> bool) {
        self.ids.retain(keep);
    }

    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
