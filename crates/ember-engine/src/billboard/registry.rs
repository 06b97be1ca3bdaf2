use super::{Billboard, BillboardId};

/// Receives billboard registration changes from producers.
///
/// Implementations treat misuse (overflow, double add, unknown remove) as a
/// contract violation and panic.
pub trait BillboardRegistry {
    fn add_billboard(&mut self, id: BillboardId);
    fn remove_billboard(&mut self, id: BillboardId);
}

/// Resolves billboard handles to the live billboard data.
pub trait BillboardSource {
    fn billboard(&self, id: BillboardId) -> Option<&Billboard>;
}

impl<T: BillboardSource> BillboardSource for [T] {
    fn billboard(&self, id: BillboardId) -> Option<&Billboard> {
        self.iter().find_map(|source| source.billboard(id))
    }
}
