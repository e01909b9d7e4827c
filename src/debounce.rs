use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Delays propagation of a rapidly changing value until it has been stable
/// for `delay`.
///
/// The initial value is published immediately. Every subsequent `set` of a
/// different value cancels the pending publication and reschedules it, so
/// only the last value of a burst ever reaches subscribers. Dropping the
/// debouncer cancels any pending publication.
///
/// Must be constructed inside a tokio runtime.
pub struct Debouncer<T> {
    input: watch::Sender<T>,
    output: watch::Receiver<T>,
    worker: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        let (input, mut in_rx) = watch::channel(initial.clone());
        let (out_tx, output) = watch::channel(initial);

        let worker = tokio::spawn(async move {
            // Outer loop waits for a new burst, inner loop restarts the
            // timer while the burst continues.
            while in_rx.changed().await.is_ok() {
                loop {
                    let timer = tokio::time::sleep(delay);
                    tokio::pin!(timer);

                    tokio::select! {
                        _ = &mut timer => {
                            let settled = in_rx.borrow_and_update().clone();
                            if out_tx.send(settled).is_err() {
                                return;
                            }
                            break;
                        }
                        changed = in_rx.changed() => {
                            if changed.is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        });

        Self {
            input,
            output,
            worker,
        }
    }

    pub fn with_default_delay(initial: T) -> Self {
        Self::new(initial, DEFAULT_DEBOUNCE)
    }

    /// Feed a new input value. Equal values are ignored and do not reset
    /// the pending timer.
    pub fn set(&self, value: T) {
        self.input.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// The most recently published (settled) value.
    pub fn value(&self) -> T {
        self.output.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.clone()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    const DELAY: Duration = Duration::from_millis(300);

    #[tokio::test(start_paused = true)]
    async fn burst_publishes_only_the_last_value() {
        let debouncer = Debouncer::new(String::new(), DELAY);
        let mut rx = debouncer.subscribe();

        debouncer.set("h".to_string());
        advance(Duration::from_millis(100)).await;
        debouncer.set("ho".to_string());
        advance(Duration::from_millis(100)).await;
        debouncer.set("hooks".to_string());

        // Intermediate values are dropped; the first publication is the
        // final value of the burst.
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), "hooks");

        advance(DELAY * 2).await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn single_update_publishes_exactly_once() {
        let debouncer = Debouncer::new(0u32, DELAY);
        let mut rx = debouncer.subscribe();

        debouncer.set(7);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 7);

        advance(DELAY * 3).await;
        assert!(!rx.has_changed().unwrap());
        assert_eq!(debouncer.value(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn initial_value_is_available_immediately() {
        let debouncer = Debouncer::new("seed", DELAY);
        assert_eq!(debouncer.value(), "seed");
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_pending_publication() {
        let debouncer = Debouncer::new(0u32, DELAY);
        let mut rx = debouncer.subscribe();

        debouncer.set(1);
        drop(debouncer);

        advance(DELAY * 2).await;
        tokio::task::yield_now().await;
        assert_eq!(*rx.borrow_and_update(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_delay_still_defers_to_the_scheduler() {
        let debouncer = Debouncer::new(0u32, Duration::ZERO);
        let mut rx = debouncer.subscribe();

        debouncer.set(1);
        // No publication yet: the worker task has not been polled.
        assert_eq!(debouncer.value(), 0);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn resetting_to_the_current_value_is_a_no_op() {
        let debouncer = Debouncer::new(5u32, DELAY);
        let mut rx = debouncer.subscribe();

        debouncer.set(5);
        advance(DELAY * 2).await;
        tokio::task::yield_now().await;
        assert!(!rx.has_changed().unwrap());
    }
}
