use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use farmstock_core::CompanyName;
use farmstock_events::{CompanyScoped, EventBus, Subscription};

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Generic projection worker loop.
///
/// - Subscribes to an event bus
/// - Applies an idempotent handler for each message
/// - Supports graceful shutdown
/// - Optional company filter
#[derive(Debug)]
pub struct ProjectionWorker;

impl ProjectionWorker {
    /// Spawn a worker thread that processes events from the bus subscription.
    ///
    /// - `company`: when provided, messages for other companies are ignored
    /// - `handler`: must be idempotent (at-least-once delivery safe)
    pub fn spawn<M, B, H, E>(
        name: &'static str,
        bus: B,
        company: Option<CompanyName>,
        mut handler: H,
    ) -> io::Result<WorkerHandle>
    where
        M: CompanyScoped + Send + 'static,
        B: EventBus<M>,
        H: FnMut(M) -> Result<(), E> + Send + 'static,
        E: core::fmt::Debug + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub: Subscription<M> = bus.subscribe();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, sub, shutdown_rx, company, &mut handler))?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn worker_loop<M, H, E>(
    name: &'static str,
    sub: Subscription<M>,
    shutdown_rx: mpsc::Receiver<()>,
    company: Option<CompanyName>,
    handler: &mut H,
) where
    M: CompanyScoped,
    H: FnMut(M) -> Result<(), E>,
    E: core::fmt::Debug,
{
    let tick = Duration::from_millis(100);

    loop {
        if shutdown_rx.try_recv().is_ok() {
            // Finish what is already buffered before stopping.
            for msg in sub.drain() {
                dispatch(name, company.as_ref(), msg, handler);
            }
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(msg) => dispatch(name, company.as_ref(), msg, handler),
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!(worker = name, "projection worker stopped");
}

fn dispatch<M, H, E>(name: &'static str, company: Option<&CompanyName>, msg: M, handler: &mut H)
where
    M: CompanyScoped,
    H: FnMut(M) -> Result<(), E>,
    E: core::fmt::Debug,
{
    if let Some(c) = company {
        if msg.company() != Some(c) {
            return;
        }
    }

    if let Err(err) = handler(msg) {
        warn!(worker = name, error = ?err, "projection worker handler failed");
    }
}
