//! Shared, lockable datamodel handle

use crate::Datamodel;
use parking_lot::RwLock;
use std::sync::Arc;

/// A datamodel shared between threads
///
/// Refreshes mutate the tree and must hold the write lock, which keeps at
/// most one refresh in flight per model. Readers of an already fetched tree
/// share the read lock.
pub type SharedDatamodel = Arc<RwLock<Datamodel>>;

pub fn new_shared_model(model: Datamodel) -> SharedDatamodel {
    Arc::new(RwLock::new(model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SchemaBuilder;
    use std::thread;

    #[test]
    fn test_readers_see_writes_made_under_the_lock() {
        let shared = new_shared_model(Datamodel::new("m").unwrap());
        let writer = {
            let shared = shared.clone();
            thread::spawn(move || {
                let mut model = shared.write();
                SchemaBuilder::new_schema(&mut model, "s", false).map(|_| ())
            })
        };
        writer.join().unwrap().unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || shared.read().schema_names())
            })
            .collect();
        for reader in readers {
            assert_eq!(reader.join().unwrap(), vec!["s".to_string()]);
        }
    }
}
