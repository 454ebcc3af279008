use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam::channel::bounded;
use parking_lot::Mutex;

use crate::core::error::{Error, ErrorKind, Result};
use crate::engine::progress::Progress;

/// One unit of counting work. Tasks own their partition key and borrow
/// the shared read-only structures (reader, lexicon, document set).
pub type Task<'env> = Box<dyn FnOnce() -> Result<()> + Send + 'env>;

/// Run independent tasks on a fixed-size worker pool and block until
/// the pool drains.
///
/// Workers pull boxed closures from a bounded channel; the submitting
/// thread provides backpressure by blocking on `send`. The first task
/// error is latched and aborts the run: submission stops, queued tasks
/// are skipped, and the error is returned once the pool has drained.
/// Failed partitions are therefore never silently missing from a
/// successful result. A panicking task is caught on its worker so the
/// drain loop still sees it complete, and latches as an internal error.
pub fn run_tasks<'env, I>(
    threads: usize,
    total: usize,
    tasks: I,
    progress: &Progress,
) -> Result<()>
where
    I: IntoIterator<Item = Task<'env>>,
{
    let threads = threads.max(1);
    let completed = AtomicUsize::new(0);
    let failure: Mutex<Option<Error>> = Mutex::new(None);

    let scope_result = crossbeam::thread::scope(|scope| {
        let (task_sender, task_receiver) = bounded::<Task<'env>>(threads * 2);

        for _ in 0..threads {
            let task_receiver = task_receiver.clone();
            let completed = &completed;
            let failure = &failure;
            scope.spawn(move |_| {
                while let Ok(task) = task_receiver.recv() {
                    let aborted = failure.lock().is_some();
                    if !aborted {
                        // Unwinding past fetch_add would hang the drain loop
                        let result = panic::catch_unwind(AssertUnwindSafe(task))
                            .unwrap_or_else(|_| {
                                Err(Error::new(ErrorKind::Internal, "counting task panicked"))
                            });
                        if let Err(error) = result {
                            let mut first = failure.lock();
                            if first.is_none() {
                                *first = Some(error);
                            }
                        }
                    }
                    completed.fetch_add(1, Ordering::Relaxed);
                }
            });
        }
        drop(task_receiver);

        // Dispatching
        let mut submitted = 0usize;
        for task in tasks {
            if failure.lock().is_some() {
                break;
            }
            if task_sender.send(task).is_err() {
                break;
            }
            submitted += 1;
            progress.emit(completed.load(Ordering::Relaxed), total);
        }
        drop(task_sender);

        // Draining: poll for termination, emitting advisory snapshots
        while completed.load(Ordering::Relaxed) < submitted {
            thread::sleep(Duration::from_millis(50));
            progress.emit(completed.load(Ordering::Relaxed), total);
        }
        progress.emit(submitted, total);
    });
    scope_result.map_err(|_| Error::new(ErrorKind::Internal, "worker thread panicked"))?;

    match failure.into_inner() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    fn quiet() -> Progress {
        Progress::new("test", true)
    }

    #[test]
    fn all_tasks_run_to_completion() {
        let sum = AtomicU64::new(0);
        let tasks = (1..=100u64).map(|n| {
            let sum = &sum;
            Box::new(move || {
                sum.fetch_add(n, Ordering::Relaxed);
                Ok(())
            }) as Task
        });
        run_tasks(4, 100, tasks, &quiet()).unwrap();
        assert_eq!(sum.load(Ordering::Relaxed), 5050);
    }

    #[test]
    fn single_thread_pool_works() {
        let hits = AtomicU64::new(0);
        let tasks = (0..10).map(|_| {
            let hits = &hits;
            Box::new(move || {
                hits.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }) as Task
        });
        run_tasks(1, 10, tasks, &quiet()).unwrap();
        assert_eq!(hits.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn first_error_aborts_the_run() {
        let tasks = (0..50u32).map(|n| {
            Box::new(move || {
                if n == 7 {
                    Err(Error::new(ErrorKind::Io, "simulated read failure"))
                } else {
                    Ok(())
                }
            }) as Task
        });
        let err = run_tasks(4, 50, tasks, &quiet()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Io);
        assert!(err.context.contains("simulated"));
    }

    #[test]
    fn empty_task_set_is_fine() {
        run_tasks(4, 0, Vec::new(), &quiet()).unwrap();
    }

    #[test]
    fn panicking_task_aborts_instead_of_hanging() {
        let tasks = (0..4u32).map(|n| {
            Box::new(move || {
                if n == 2 {
                    panic!("cursor yielded out-of-order positions");
                }
                Ok(())
            }) as Task
        });
        let err = run_tasks(2, 4, tasks, &quiet()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
        assert!(err.context.contains("panicked"));
    }
}
