//! # The Backend Contract
//! `ProviderSession` is the abstract per-session store of nodes and per-node
//! point lists the engine is layered over. A session is a scoped
//! acquisition of the backend with guaranteed release on all exit paths;
//! every method here is a suspension point (§5 of the design notes) and may
//! fail with `TreeError::StorageError` or `TreeError::Canceled`.
//!
//! `tree::memory` provides the reference implementation; a persistent
//! backend (tabular store, etc.) implements the same trait and the engine
//! in `tree::engine` cannot tell the difference.

use crate::errors::TreeResult;
use async_trait::async_trait;
use futures::stream::BoxStream;
use geo::{Bound, Point};
use std::fmt::Debug;
use std::hash::Hash;

/// An immutable `(point, value)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PointItem<V> {
    pub point: Point,
    pub value: V,
}

impl<V> PointItem<V> {
    pub fn new(point: Point, value: V) -> PointItem<V> {
        PointItem { point, value }
    }
}

/// An internal (non-leaf) node: an ordered array of `2^D` child node
/// identifiers, one per child bound, index order matching `Bound::child_bounds`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadNode<Id> {
    children: Vec<Id>,
}

impl<Id> QuadNode<Id> {
    pub fn new(children: Vec<Id>) -> QuadNode<Id> {
        QuadNode { children }
    }

    #[inline]
    pub fn children(&self) -> &[Id] {
        &self.children
    }
}

/// Bound for a node identifier usable as a hash-map key across an `async`
/// boundary.
pub trait NodeId: Clone + Eq + Hash + Debug + Send + Sync + 'static {}
impl<T: Clone + Eq + Hash + Debug + Send + Sync + 'static> NodeId for T {}

/// A scoped acquisition of a storage backend. §4.2 of the design is a
/// bit-exact restatement of this trait.
#[async_trait]
pub trait ProviderSession<V, Id>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
    Id: NodeId,
{
    /// Root bound; constant for the session's lifetime.
    fn entire(&self) -> &Bound;

    /// Leaf capacity `C >= 1`.
    fn max_node_points(&self) -> usize;

    /// Identifier of the root.
    fn root_id(&self) -> Id;

    /// Partial durability checkpoint. May be a no-op.
    async fn flush(&self) -> TreeResult<()>;

    /// Commit and release. Subsequent calls are undefined.
    async fn finish(self) -> TreeResult<()>;

    /// Returns the internal-node entry for `id`, if any. `None` means `id`
    /// is a leaf.
    async fn get_node(&self, id: &Id) -> TreeResult<Option<QuadNode<Id>>>;

    /// Leaf-only: number of points stored at `id`.
    async fn get_point_count(&self, id: &Id) -> TreeResult<usize>;

    /// Appends a prefix of `items[offset..]` to leaf `id`. If `force`,
    /// appends all remaining items; otherwise appends at most `C -
    /// current_count`. Returns the number of items appended.
    async fn insert_points(
        &self,
        id: &Id,
        items: &[PointItem<V>],
        offset: usize,
        force: bool,
    ) -> TreeResult<usize>;

    /// Converts leaf `id` into an internal node: allocates
    /// `child_bounds.len()` fresh identifiers, partitions the leaf's points
    /// into child leaves by containment, replaces `id`'s point list with a
    /// node entry pointing at the new children, and returns it.
    async fn distribute(&self, id: &Id, child_bounds: &[Bound]) -> TreeResult<QuadNode<Id>>;

    /// Converts internal node `to_id` into a leaf: concatenates the point
    /// lists of `child_ids` (which MUST all be leaves, and whose points
    /// MUST all lie within `to_bound`) into `to_id`'s new leaf list, and
    /// removes the child entries and the internal-node entry for `to_id`.
    async fn aggregate(&self, child_ids: &[Id], to_bound: &Bound, to_id: &Id) -> TreeResult<()>;

    /// Leaf-only: all items with `item.point == p`.
    async fn lookup_point(&self, id: &Id, p: &Point) -> TreeResult<Vec<PointItem<V>>>;

    /// Leaf-only: all items with `bound.is_within(item.point)`.
    async fn lookup_bound(&self, id: &Id, bound: &Bound) -> TreeResult<Vec<PointItem<V>>>;

    /// Leaf-only: lazy stream of the same set `lookup_bound` returns.
    async fn enumerate_bound(
        &self,
        id: &Id,
        bound: &Bound,
    ) -> TreeResult<BoxStream<'static, PointItem<V>>>;

    /// Leaf-only: removes all items with `item.point == p`. `remains` is
    /// `-1` if `include_remains` is false (sentinel "not computed").
    async fn remove_point(
        &self,
        id: &Id,
        p: &Point,
        include_remains: bool,
    ) -> TreeResult<(usize, i64)>;

    /// Leaf-only: analogous to `remove_point`, for a bound.
    async fn remove_bound(
        &self,
        id: &Id,
        bound: &Bound,
        include_remains: bool,
    ) -> TreeResult<(usize, i64)>;
}
