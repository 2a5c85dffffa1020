//! Minimal end-to-end walkthrough: open a tree over the in-memory backend,
//! insert a handful of points, then look them up and remove them with
//! shrinking turned on.

use geo::{Axis, Bound, Point};
use tree::{BulkInsertConfig, MemoryBackend, Tree};

#[tokio::main]
async fn main() {
    env_logger::init();

    let entire = Bound::new(vec![Axis::new(0.0, 100.0), Axis::new(0.0, 100.0)]);
    let backend: MemoryBackend<&str> = MemoryBackend::new(entire, 8);
    let tree: Tree<MemoryBackend<&str>, &str, u64> = Tree::open(backend);

    let session = tree.begin_session(true).await;
    session
        .insert_point(Point::from([12.0, 34.0]), "alpha")
        .await
        .expect("point lies within the tree's bound");

    session
        .insert_points(
            vec![
                (Point::from([1.0, 1.0]), "beta"),
                (Point::from([90.0, 90.0]), "gamma"),
            ],
            BulkInsertConfig::default(),
        )
        .await
        .expect("bulk insert");

    let found = session
        .lookup_bound(&Bound::new(vec![Axis::new(0.0, 50.0), Axis::new(0.0, 50.0)]))
        .await
        .expect("range lookup");
    println!("found {} point(s) in the lower-left quadrant", found.len());
    for item in &found {
        println!("  {:?} -> {}", item.point, item.value);
    }

    let removed = session
        .remove_bound(session.entire(), true)
        .await
        .expect("range remove");
    println!("removed {removed} point(s), tree shrunk back to a single empty leaf");

    session.finish().await.expect("session commits cleanly");
}
