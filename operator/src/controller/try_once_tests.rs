#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::controller::try_once::TryOnce;

    #[tokio::test]
    async fn retries_until_success_then_never_runs_again() {
        let guard = TryOnce::new();
        let invocations = AtomicUsize::new(0);
        let failures_left = AtomicUsize::new(3);

        let run = |fail: bool| {
            let inv = &invocations;
            async move {
                inv.fetch_add(1, Ordering::SeqCst);
                if fail { Err("boom") } else { Ok(()) }
            }
        };

        // Calls 1..=3 fail and keep the guard armed.
        for _ in 0..3 {
            let res = guard
                .run_once(|| {
                    let fail =
                        failures_left.fetch_sub(1, Ordering::SeqCst) > 0;
                    run(fail)
                })
                .await;
            assert_eq!(res, Err("boom"));
        }
        assert_eq!(invocations.load(Ordering::SeqCst), 3);

        // Call 4 succeeds; calls 5..=8 return Ok without invoking the action.
        for i in 0..5 {
            let res = guard.run_once(|| run(false)).await;
            assert_eq!(res, Ok(()), "call {} after success", i);
        }
        assert_eq!(invocations.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn concurrent_callers_never_overlap() {
        let guard = Arc::new(TryOnce::new());
        let active = Arc::new(AtomicBool::new(false));
        let overlapped = Arc::new(AtomicBool::new(false));
        let invocations = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let guard = Arc::clone(&guard);
            let active = Arc::clone(&active);
            let overlapped = Arc::clone(&overlapped);
            let invocations = Arc::clone(&invocations);
            handles.push(tokio::spawn(async move {
                let _ = guard
                    .run_once(|| async {
                        if active.swap(true, Ordering::SeqCst) {
                            overlapped.store(true, Ordering::SeqCst);
                        }
                        invocations.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(2)).await;
                        active.store(false, Ordering::SeqCst);
                        // Keep the guard armed so every task runs the action.
                        Err::<(), &str>("always fails")
                    })
                    .await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert!(!overlapped.load(Ordering::SeqCst), "actions overlapped");
        assert_eq!(invocations.load(Ordering::SeqCst), 32);
    }

    #[tokio::test]
    async fn success_latches_under_concurrency() {
        let guard = Arc::new(TryOnce::new());
        let invocations = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let guard = Arc::clone(&guard);
            let invocations = Arc::clone(&invocations);
            handles.push(tokio::spawn(async move {
                guard
                    .run_once(|| async {
                        invocations.fetch_add(1, Ordering::SeqCst);
                        Ok::<(), &str>(())
                    })
                    .await
            }));
        }
        for h in handles {
            assert_eq!(h.await.unwrap(), Ok(()));
        }

        // Only the first caller through the lock runs the action.
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
    }
}
