//! # Reference In-Memory Backend
//! The backend this crate ships so the engine has something to run
//! against out of the box, and so the property tests in `engine.rs` have a
//! concrete `ProviderSession` to drive. A persistent backend (tabular
//! store, etc.) is expected to implement the same trait; this module is
//! not otherwise special to the engine.
//!
//! Two maps, both keyed by node id (a monotonically increasing `u64`, root
//! fixed at `0`): one for internal-node children, one for leaf point
//! lists. Session acquisition takes a reader/writer lock on the backend —
//! read sessions share, update sessions are exclusive — held for the
//! entire session and released on `Drop`/`finish`.

use crate::array::ReadonlyArray;
use crate::backend::{PointItem, ProviderSession, QuadNode};
use crate::errors::{TreeError, TreeResult};
use crate::session::Backend;
use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use geo::{Bound, Point};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

/// The root identifier the in-memory backend always starts with.
pub const ROOT_ID: u64 = 0;

struct Store<V> {
    nodes: Mutex<HashMap<u64, QuadNode<u64>>>,
    leaves: Mutex<HashMap<u64, Vec<PointItem<V>>>>,
    next_id: AtomicU64,
}

impl<V> Store<V> {
    fn new() -> Store<V> {
        let mut leaves = HashMap::new();
        leaves.insert(ROOT_ID, Vec::new());
        Store {
            nodes: Mutex::new(HashMap::new()),
            leaves: Mutex::new(leaves),
            next_id: AtomicU64::new(ROOT_ID + 1),
        }
    }

    fn alloc_ids(&self, count: usize) -> Vec<u64> {
        (0..count)
            .map(|_| self.next_id.fetch_add(1, Ordering::Relaxed))
            .collect()
    }
}

/// A volatile backend. Construct once, then `begin_session` as many times
/// as needed; every session shares the same underlying maps.
pub struct MemoryBackend<V> {
    entire: Bound,
    max_node_points: usize,
    store: Arc<Store<V>>,
    session_lock: Arc<RwLock<()>>,
}

impl<V> MemoryBackend<V> {
    pub fn new(entire: Bound, max_node_points: usize) -> MemoryBackend<V> {
        assert!(max_node_points >= 1, "leaf capacity must be at least 1");
        MemoryBackend {
            entire,
            max_node_points,
            store: Arc::new(Store::new()),
            session_lock: Arc::new(RwLock::new(())),
        }
    }

    /// Acquires either a shared (reader) or exclusive (writer) permit on
    /// the backend and wraps it into a session. The permit is held for the
    /// whole lifetime of the returned session.
    pub async fn begin_session(&self, will_update: bool) -> MemorySession<V> {
        let permit = if will_update {
            Permit::Write(Arc::clone(&self.session_lock).write_owned().await)
        } else {
            Permit::Read(Arc::clone(&self.session_lock).read_owned().await)
        };
        MemorySession {
            entire: self.entire.clone(),
            max_node_points: self.max_node_points,
            store: Arc::clone(&self.store),
            _permit: permit,
        }
    }
}

#[async_trait]
impl<V> Backend<V, u64> for MemoryBackend<V>
where
    V: Clone + Send + Sync + 'static,
{
    type Session = MemorySession<V>;

    async fn begin_session(&self, will_update: bool) -> MemorySession<V> {
        MemoryBackend::begin_session(self, will_update).await
    }
}

enum Permit {
    Read(OwnedRwLockReadGuard<()>),
    Write(OwnedRwLockWriteGuard<()>),
}

/// A scoped read or update session against a `MemoryBackend`. Released when
/// dropped or when `finish` is called.
pub struct MemorySession<V> {
    entire: Bound,
    max_node_points: usize,
    store: Arc<Store<V>>,
    _permit: Permit,
}

impl<V> Drop for MemorySession<V> {
    fn drop(&mut self) {
        log::debug!("session released");
    }
}

fn storage_err<E: std::fmt::Display>(context: &str, e: E) -> TreeError {
    TreeError::StorageError(anyhow::anyhow!("{context}: {e}"))
}

#[async_trait]
impl<V> ProviderSession<V, u64> for MemorySession<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn entire(&self) -> &Bound {
        &self.entire
    }

    fn max_node_points(&self) -> usize {
        self.max_node_points
    }

    fn root_id(&self) -> u64 {
        ROOT_ID
    }

    async fn flush(&self) -> TreeResult<()> {
        Ok(())
    }

    async fn finish(self) -> TreeResult<()> {
        Ok(())
    }

    async fn get_node(&self, id: &u64) -> TreeResult<Option<QuadNode<u64>>> {
        let nodes = self.store.nodes.lock().unwrap();
        Ok(nodes.get(id).cloned())
    }

    async fn get_point_count(&self, id: &u64) -> TreeResult<usize> {
        let leaves = self.store.leaves.lock().unwrap();
        Ok(leaves.get(id).map(Vec::len).unwrap_or(0))
    }

    async fn insert_points(
        &self,
        id: &u64,
        items: &[PointItem<V>],
        offset: usize,
        force: bool,
    ) -> TreeResult<usize> {
        let mut leaves = self.store.leaves.lock().unwrap();
        let leaf = leaves
            .get_mut(id)
            .ok_or_else(|| storage_err("insert_points", format!("{id:?} is not a leaf")))?;
        let available = items.len() - offset;
        let room = if force {
            available
        } else {
            available.min(self.max_node_points.saturating_sub(leaf.len()))
        };
        leaf.extend_from_slice(&items[offset..offset + room]);
        Ok(room)
    }

    async fn distribute(&self, id: &u64, child_bounds: &[Bound]) -> TreeResult<QuadNode<u64>> {
        let taken = {
            let mut leaves = self.store.leaves.lock().unwrap();
            leaves
                .remove(id)
                .ok_or_else(|| storage_err("distribute", format!("{id:?} is not a leaf")))?
        };
        let total_before = taken.len();
        let block = ReadonlyArray::new(taken);

        // Parallel, lock-free assignment: every item independently figures
        // out which child bucket it belongs to.
        let assignments: Vec<Option<usize>> = block
            .as_slice()
            .par_iter()
            .map(|item| {
                child_bounds
                    .iter()
                    .position(|cb| cb.is_within(&item.point))
            })
            .collect();

        let mut buckets: Vec<Vec<PointItem<V>>> = (0..child_bounds.len()).map(|_| Vec::new()).collect();
        for (item, assignment) in block.as_slice().iter().zip(assignments) {
            let idx = assignment.ok_or_else(|| {
                storage_err(
                    "distribute",
                    format!("point {:?} matches no child of {:?}", item.point, id),
                )
            })?;
            buckets[idx].push(item.clone());
        }

        let total_after: usize = buckets.iter().map(Vec::len).sum();
        assert_eq!(
            total_before, total_after,
            "distribute must preserve the total point count"
        );

        let child_ids = self.store.alloc_ids(child_bounds.len());
        {
            let mut leaves = self.store.leaves.lock().unwrap();
            for (child_id, bucket) in child_ids.iter().zip(buckets) {
                leaves.insert(*child_id, bucket);
            }
        }
        let node = QuadNode::new(child_ids);
        self.store.nodes.lock().unwrap().insert(*id, node.clone());
        log::debug!("distributed leaf {id:?} into {} children", node.children().len());
        Ok(node)
    }

    async fn aggregate(&self, child_ids: &[u64], to_bound: &Bound, to_id: &u64) -> TreeResult<()> {
        let mut combined = Vec::new();
        {
            let mut leaves = self.store.leaves.lock().unwrap();
            for child_id in child_ids {
                let child_points = leaves.remove(child_id).ok_or_else(|| {
                    storage_err(
                        "aggregate",
                        format!("child {child_id:?} is not a leaf (precondition violated)"),
                    )
                })?;
                for item in &child_points {
                    debug_assert!(
                        to_bound.is_within(&item.point),
                        "aggregate precondition violated: {:?} outside {:?}",
                        item.point,
                        to_bound
                    );
                }
                combined.extend(child_points);
            }
            leaves.insert(*to_id, combined);
        }
        self.store.nodes.lock().unwrap().remove(to_id);
        log::debug!("aggregated {} children back into {to_id:?}", child_ids.len());
        Ok(())
    }

    async fn lookup_point(&self, id: &u64, p: &Point) -> TreeResult<Vec<PointItem<V>>> {
        let leaves = self.store.leaves.lock().unwrap();
        let leaf = leaves.get(id).ok_or_else(|| {
            storage_err("lookup_point", format!("{id:?} is not a leaf"))
        })?;
        Ok(leaf.iter().filter(|it| &it.point == p).cloned().collect())
    }

    async fn lookup_bound(&self, id: &u64, bound: &Bound) -> TreeResult<Vec<PointItem<V>>> {
        let leaves = self.store.leaves.lock().unwrap();
        let leaf = leaves.get(id).ok_or_else(|| {
            storage_err("lookup_bound", format!("{id:?} is not a leaf"))
        })?;
        Ok(leaf
            .iter()
            .filter(|it| bound.is_within(&it.point))
            .cloned()
            .collect())
    }

    async fn enumerate_bound(
        &self,
        id: &u64,
        bound: &Bound,
    ) -> TreeResult<BoxStream<'static, PointItem<V>>> {
        let matching = self.lookup_bound(id, bound).await?;
        Ok(Box::pin(stream::iter(matching)))
    }

    async fn remove_point(
        &self,
        id: &u64,
        p: &Point,
        include_remains: bool,
    ) -> TreeResult<(usize, i64)> {
        let mut leaves = self.store.leaves.lock().unwrap();
        let leaf = leaves.get_mut(id).ok_or_else(|| {
            storage_err("remove_point", format!("{id:?} is not a leaf"))
        })?;
        let before = leaf.len();
        leaf.retain(|it| &it.point != p);
        let removed = before - leaf.len();
        let remains = if include_remains { leaf.len() as i64 } else { -1 };
        Ok((removed, remains))
    }

    async fn remove_bound(
        &self,
        id: &u64,
        bound: &Bound,
        include_remains: bool,
    ) -> TreeResult<(usize, i64)> {
        let mut leaves = self.store.leaves.lock().unwrap();
        let leaf = leaves.get_mut(id).ok_or_else(|| {
            storage_err("remove_bound", format!("{id:?} is not a leaf"))
        })?;
        let before = leaf.len();
        leaf.retain(|it| !bound.is_within(&it.point));
        let removed = before - leaf.len();
        let remains = if include_remains { leaf.len() as i64 } else { -1 };
        Ok((removed, remains))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Axis;

    fn square() -> Bound {
        Bound::new(vec![Axis::new(0.0, 100.0), Axis::new(0.0, 100.0)])
    }

    #[tokio::test]
    async fn fresh_backend_has_one_empty_leaf_root() {
        let backend: MemoryBackend<&str> = MemoryBackend::new(square(), 4);
        let session = backend.begin_session(true).await;
        assert_eq!(session.root_id(), ROOT_ID);
        assert_eq!(session.get_point_count(&ROOT_ID).await.unwrap(), 0);
        assert!(session.get_node(&ROOT_ID).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn distribute_preserves_points_and_installs_a_node() {
        let backend: MemoryBackend<&str> = MemoryBackend::new(square(), 2);
        let session = backend.begin_session(true).await;
        let items: Vec<PointItem<&str>> = vec![
            PointItem::new(Point::from([10.0, 10.0]), "a"),
            PointItem::new(Point::from([90.0, 90.0]), "b"),
            PointItem::new(Point::from([10.0, 90.0]), "c"),
        ];
        session.insert_points(&ROOT_ID, &items, 0, true).await.unwrap();
        let child_bounds = session.entire().child_bounds();
        let node = session.distribute(&ROOT_ID, &child_bounds).await.unwrap();
        assert_eq!(node.children().len(), 4);
        assert!(session.get_node(&ROOT_ID).await.unwrap().is_some());
        let mut total = 0;
        for child in node.children() {
            total += session.get_point_count(child).await.unwrap();
        }
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn readers_are_concurrent_writers_are_exclusive() {
        let backend: MemoryBackend<&str> = MemoryBackend::new(square(), 4);
        let r1 = backend.begin_session(false).await;
        let r2 = backend.begin_session(false).await;
        assert_eq!(r1.get_point_count(&ROOT_ID).await.unwrap(), 0);
        assert_eq!(r2.get_point_count(&ROOT_ID).await.unwrap(), 0);
        drop(r1);
        drop(r2);
        let w = backend.begin_session(true).await;
        assert_eq!(w.get_point_count(&ROOT_ID).await.unwrap(), 0);
    }
}
