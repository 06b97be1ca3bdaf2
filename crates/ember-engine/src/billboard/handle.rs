/// Identifies one producer of billboards (typically one particle system).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Default)]
pub struct BillboardOwner(pub u32);

/// Non-owning handle to a billboard stored in a producer's slot arena.
///
/// The batch never dereferences this itself; it asks a `BillboardSource` to resolve it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BillboardId {
    pub owner: BillboardOwner,
    pub slot: u32,
}

impl BillboardId {
    #[inline]
    pub const fn new(owner: BillboardOwner, slot: u32) -> Self {
        Self { owner, slot }
    }
}
