use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread,
    time::{Duration, Instant},
};

use anyhow::Context;
use tracing::{debug, error};

use crate::foundation::error::{MoodspaceError, MoodspaceResult};

struct Pending<T> {
    payload: T,
    deadline: Instant,
}

struct State<T> {
    pending: Option<Pending<T>>,
    in_flight: bool,
    flush: bool,
    shutdown: bool,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    wake: Condvar,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, State<T>>) -> MutexGuard<'a, State<T>> {
        self.wake.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_timeout<'a>(
        &self,
        guard: MutexGuard<'a, State<T>>,
        timeout: Duration,
    ) -> MutexGuard<'a, State<T>> {
        match self.wake.wait_timeout(guard, timeout) {
            Ok((guard, _)) => guard,
            Err(poisoned) => poisoned.into_inner().0,
        }
    }
}

/// Debounced background persistence.
///
/// Each [`AutosaveScheduler::schedule_save`] replaces the pending payload and restarts the quiet
/// period, so a burst of requests produces one write carrying the last payload. The write runs on
/// a dedicated worker thread; failures and panics in the persist callback are logged and the
/// scheduler keeps accepting work.
///
/// Dropping the scheduler persists any pending payload and joins the worker.
pub struct AutosaveScheduler<T: Send + 'static> {
    shared: Arc<Shared<T>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl<T: Send + 'static> AutosaveScheduler<T> {
    /// Spawn the worker thread around `persist`.
    pub fn new<F>(persist: F) -> MoodspaceResult<Self>
    where
        F: FnMut(T) -> MoodspaceResult<()> + Send + 'static,
    {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                pending: None,
                in_flight: false,
                flush: false,
                shutdown: false,
            }),
            wake: Condvar::new(),
        });
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("moodspace-autosave".to_string())
            .spawn(move || run_worker(&worker_shared, persist))
            .context("spawn autosave worker")
            .map_err(MoodspaceError::from_io)?;
        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Replace the pending payload and persist it once `delay` passes without another request.
    pub fn schedule_save(&self, payload: T, delay: Duration) {
        let mut state = self.shared.lock();
        state.pending = Some(Pending {
            payload,
            deadline: Instant::now() + delay,
        });
        self.shared.wake.notify_all();
    }

    /// Drop the pending payload. Returns `true` if one was pending.
    pub fn cancel(&self) -> bool {
        let mut state = self.shared.lock();
        let had = state.pending.take().is_some();
        self.shared.wake.notify_all();
        had
    }

    /// Drop the pending payload and wait until a write already in progress has finished.
    ///
    /// Once this returns the worker is idle, so the caller may write the same target itself.
    /// Returns `true` if a payload was pending.
    pub fn cancel_and_wait(&self) -> bool {
        let mut state = self.shared.lock();
        let had = state.pending.take().is_some();
        self.shared.wake.notify_all();
        while state.in_flight {
            state = self.shared.wait(state);
        }
        had
    }

    /// Persist the pending payload now and wait until the write has finished.
    pub fn flush(&self) {
        let mut state = self.shared.lock();
        if state.pending.is_none() && !state.in_flight {
            return;
        }
        state.flush = true;
        self.shared.wake.notify_all();
        while state.pending.is_some() || state.in_flight {
            state = self.shared.wait(state);
        }
    }

    /// Return `true` while a payload waits for its quiet period to end.
    pub fn has_pending(&self) -> bool {
        self.shared.lock().pending.is_some()
    }
}

impl<T: Send + 'static> Drop for AutosaveScheduler<T> {
    fn drop(&mut self) {
        {
            let mut state = self.shared.lock();
            state.shutdown = true;
            self.shared.wake.notify_all();
        }
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            error!("autosave worker panicked");
        }
    }
}

fn run_worker<T, F>(shared: &Shared<T>, mut persist: F)
where
    F: FnMut(T) -> MoodspaceResult<()>,
{
    let mut state = shared.lock();
    loop {
        let deadline = match state.pending.as_ref() {
            Some(p) => p.deadline,
            None if state.shutdown => break,
            None => {
                state.flush = false;
                state = shared.wait(state);
                continue;
            }
        };
        let now = Instant::now();
        if !(state.flush || state.shutdown || now >= deadline) {
            state = shared.wait_timeout(state, deadline - now);
            continue;
        }

        let Some(pending) = state.pending.take() else {
            continue;
        };
        state.flush = false;
        state.in_flight = true;
        drop(state);

        match panic::catch_unwind(AssertUnwindSafe(|| persist(pending.payload))) {
            Ok(Ok(())) => debug!("autosave written"),
            Ok(Err(e)) => error!(error = %e, "autosave failed"),
            Err(_) => error!("autosave persist panicked"),
        }

        state = shared.lock();
        state.in_flight = false;
        shared.wake.notify_all();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/autosave.rs"]
mod tests;
