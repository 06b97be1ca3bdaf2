use core::cmp::Ordering;

/// Total-order sort key for billboards.
///
/// Ordering rules:
/// 1) `depth`: ascending view-space z (most negative = farthest = drawn first)
/// 2) `order`: ascending registration order for equal depth
#[derive(Debug, Copy, Clone)]
pub struct DepthKey {
    pub depth: f32,
    pub order: u64,
}

impl DepthKey {
    #[inline]
    pub const fn new(depth: f32, order: u64) -> Self {
        Self { depth, order }
    }
}

impl Ord for DepthKey {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        // `total_cmp` keeps NaN depths ordered instead of poisoning the sort.
        match self.depth.total_cmp(&other.depth) {
            Ordering::Equal => self.order.cmp(&other.order),
            o => o,
        }
    }
}

impl PartialOrd for DepthKey {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DepthKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DepthKey {}
