use hashbrown::HashMap;

use crate::scene::ViewId;

/// Bijection between surviving view ids and dense camera indices `0..N`.
///
/// Indices follow ascending view id order. The LP lays out the variables of
/// camera `i` at `2i` (gain) and `2i + 1` (offset).
#[derive(Debug, Clone, Default)]
pub struct CameraIndex {
    view_ids: Vec<ViewId>,
    index_of: HashMap<ViewId, usize>,
}

impl CameraIndex {
    pub fn new(views: impl IntoIterator<Item = ViewId>) -> Self {
        let mut view_ids: Vec<ViewId> = views.into_iter().collect();
        view_ids.sort_unstable();
        view_ids.dedup();
        let index_of = view_ids
            .iter()
            .enumerate()
            .map(|(idx, &view)| (view, idx))
            .collect();
        Self { view_ids, index_of }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.view_ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.view_ids.is_empty()
    }

    #[inline]
    pub fn index_of(&self, view: ViewId) -> Option<usize> {
        self.index_of.get(&view).copied()
    }

    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn view_id(&self, index: usize) -> ViewId {
        self.view_ids[index]
    }

    /// View ids in camera index order.
    pub fn view_ids(&self) -> &[ViewId] {
        &self.view_ids
    }
}
