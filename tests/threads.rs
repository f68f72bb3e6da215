use std::{
    sync::{Arc, Barrier},
    thread,
};

use metlog_context::{ContextStore, ExecutionContextId, get_context, has_context, with_context};
use pretty_assertions::assert_eq;

#[test]
fn test_concurrent_sessions_are_isolated() {
    const THREADS: usize = 8;
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles = (0..THREADS)
        .map(|n| {
            let barrier = barrier.clone();
            thread::spawn(move || {
                let flushed = with_context(
                    |mapping| {
                        assert_eq!(mapping.len(), 1);
                        assert_eq!(mapping.get("worker").unwrap().as_u64(), Some(n as u64));
                        Ok(())
                    },
                    |_| {
                        get_context().insert("worker", n as u64);
                        // Every thread holds its mapping at the same time.
                        barrier.wait();
                        get_context().get("worker").unwrap().as_u64()
                    },
                )
                .unwrap();

                assert!(!has_context());
                flushed
            })
        })
        .collect::<Vec<_>>();

    for (n, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Some(n as u64));
    }
}

#[test]
fn test_thread_exit_releases_mapping() {
    let id = thread::spawn(|| {
        get_context().insert("leaked", true);
        let id = ExecutionContextId::current();
        assert!(ContextStore::global().has(id));
        id
    })
    .join()
    .unwrap();

    assert!(!ContextStore::global().has(id));
}
