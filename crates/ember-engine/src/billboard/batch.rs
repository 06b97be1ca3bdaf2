use glam::{Mat4, Quat, Vec3};

use super::{
    Billboard, BillboardId, BillboardRegistry, BillboardSource, BillboardVertex, DepthKey,
    VERTICES_PER_BILLBOARD,
};

#[derive(Debug, Copy, Clone)]
struct Registration {
    id: BillboardId,
    order: u64,
}

/// Fixed-capacity batch of camera-facing billboards.
///
/// The batch holds handles, not billboards. Each frame `update` resolves the handles
/// through a `BillboardSource`, sorts them back-to-front and rewrites the leading
/// `6 × live` vertices of a buffer pre-sized for `capacity` billboards.
///
/// Performance characteristics:
/// - the vertex buffer is allocated once in `new` and never resized
/// - `add_billboard` is O(n) (duplicate check), `remove_billboard` is O(n)
/// - `update` is O(n log n) for the sort plus O(n) vertex writes
#[derive(Debug)]
pub struct BillboardBatch {
    capacity: usize,
    vertices: Vec<BillboardVertex>,

    registered: Vec<Registration>,
    next_order: u64,

    quads_written: usize,
    warned_unresolved: bool,
}

impl BillboardBatch {
    /// Creates a batch able to hold `capacity` billboards.
    pub fn new(capacity: usize) -> Self {
        let vertex_total = capacity * VERTICES_PER_BILLBOARD;
        let vertices = (0..vertex_total).map(BillboardVertex::blank).collect();

        log::debug!("billboard batch: capacity {capacity} ({vertex_total} vertices)");

        Self {
            capacity,
            vertices,
            registered: Vec::with_capacity(capacity),
            next_order: 0,
            quads_written: 0,
            warned_unresolved: false,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of currently registered billboards.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.registered.len()
    }

    /// Number of vertices produced by the last `update`.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.quads_written * VERTICES_PER_BILLBOARD
    }

    /// The whole pre-sized vertex buffer, including stale tail vertices.
    #[inline]
    pub fn vertices(&self) -> &[BillboardVertex] {
        &self.vertices
    }

    /// The sub-range written by the last `update`; this is what gets uploaded.
    #[inline]
    pub fn vertices_in_use(&self) -> &[BillboardVertex] {
        &self.vertices[..self.vertex_count()]
    }

    /// Registered handles in their current (last sorted) order.
    pub fn registered(&self) -> impl Iterator<Item = BillboardId> + '_ {
        self.registered.iter().map(|r| r.id)
    }

    #[inline]
    pub fn is_registered(&self, id: BillboardId) -> bool {
        self.registered.iter().any(|r| r.id == id)
    }

    /// Sorts registered billboards back-to-front for `view` and rebuilds their quads.
    ///
    /// Handles that `source` cannot resolve are skipped; they indicate a producer
    /// that was dropped without releasing its billboards.
    pub fn update<S>(&mut self, view: Mat4, source: &S)
    where
        S: BillboardSource + ?Sized,
    {
        self.sort_back_to_front(view, source);

        let right = view.row(0).truncate();
        let up = view.row(1).truncate();
        let forward = view.row(2).truncate().normalize_or_zero();

        let mut quad = 0usize;
        let mut unresolved = 0usize;

        for reg in &self.registered {
            let Some(billboard) = source.billboard(reg.id) else {
                unresolved += 1;
                continue;
            };

            let first = quad * VERTICES_PER_BILLBOARD;
            write_quad(
                &mut self.vertices[first..first + VERTICES_PER_BILLBOARD],
                billboard,
                right,
                up,
                forward,
            );
            quad += 1;
        }

        if unresolved > 0 && !self.warned_unresolved {
            log::warn!("billboard batch: {unresolved} registered handle(s) no longer resolve; skipped");
            self.warned_unresolved = true;
        }

        self.quads_written = quad;
    }

    fn sort_back_to_front<S>(&mut self, view: Mat4, source: &S)
    where
        S: BillboardSource + ?Sized,
    {
        // Unresolvable handles sort last; they are skipped during the rebuild anyway.
        self.registered.sort_by_cached_key(|reg| {
            let depth = source
                .billboard(reg.id)
                .map_or(f32::INFINITY, |b| view.transform_point3(b.position).z);
            DepthKey::new(depth, reg.order)
        });
    }
}

impl BillboardRegistry for BillboardBatch {
    /// # Panics
    /// Panics if `id` is already registered or if the batch would exceed its capacity.
    fn add_billboard(&mut self, id: BillboardId) {
        assert!(
            !self.is_registered(id),
            "billboard {id:?} is already registered with this batch"
        );

        self.registered.push(Registration {
            id,
            order: self.next_order,
        });
        self.next_order = self.next_order.wrapping_add(1);

        assert!(
            self.registered.len() <= self.capacity,
            "billboard batch capacity exceeded: {} registered, capacity {}",
            self.registered.len(),
            self.capacity
        );
    }

    /// # Panics
    /// Panics if `id` is not registered.
    fn remove_billboard(&mut self, id: BillboardId) {
        let Some(index) = self.registered.iter().position(|r| r.id == id) else {
            panic!("billboard {id:?} is not registered with this batch");
        };
        self.registered.remove(index);
    }
}

/// Writes the six vertices of one camera-facing quad.
fn write_quad(
    out: &mut [BillboardVertex],
    billboard: &Billboard,
    right: Vec3,
    up: Vec3,
    forward: Vec3,
) {
    // Positive angles turn the quad clockwise as seen from the camera.
    let roll = if forward == Vec3::ZERO {
        Quat::IDENTITY
    } else {
        Quat::from_axis_angle(forward, -billboard.angle.to_radians())
    };

    let half_w = roll * right * (0.5 * billboard.size.x);
    let half_h = roll * up * (0.5 * billboard.size.y);
    let center = billboard.position;

    let top_left = center - half_w + half_h;
    let bottom_left = center - half_w - half_h;
    let top_right = center + half_w + half_h;
    let bottom_right = center + half_w - half_h;

    // (top_right - center) × (top_left - center) points back at the camera.
    let normal = (top_right - center)
        .cross(top_left - center)
        .normalize_or_zero()
        .to_array();
    let color = billboard.color.to_array();

    let corners = [top_left, bottom_left, top_right, top_right, bottom_left, bottom_right];
    for (vertex, corner) in out.iter_mut().zip(corners) {
        vertex.position = corner.to_array();
        vertex.normal = normal;
        vertex.color = color;
    }
}
