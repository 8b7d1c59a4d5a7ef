//! Timer-driven ticking
//!
//! The engine itself never touches a clock. A [`Scheduler`] decides when a
//! repeating task fires; a [`LayoutDriver`] uses one to tick a shared
//! [`Simulation`] until it settles.
//!
//! ```text
//!          start()                alpha < alpha_min
//!   Idle ----------> Running ------------------------> Idle
//!     ^                 |
//!     +---- stop() -----+
//! ```

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::simulation::Simulation;

/// A repeating task. Returning `Break` stops it.
pub type Task = Box<dyn FnMut() -> ControlFlow<()> + Send + 'static>;

/// Handle to a scheduled task
pub trait Cancel: Send {
    /// Prevent any further runs of the task
    fn cancel(&mut self);
}

/// Runs a task repeatedly at a fixed interval
pub trait Scheduler {
    type Handle: Cancel + 'static;

    fn schedule(&self, interval: Duration, task: Task) -> Self::Handle;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct ManualQueue {
    next_id: u64,
    tasks: Vec<(u64, Task)>,
    /// Tasks cancelled while they were running
    cancelled: HashSet<u64>,
}

/// A scheduler driven by hand, one round at a time.
///
/// Intervals are ignored; every pending task runs once per [`advance`] call.
/// Clones share the same queue.
///
/// [`advance`]: ManualScheduler::advance
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Arc<Mutex<ManualQueue>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks still scheduled
    pub fn pending(&self) -> usize {
        lock(&self.queue).tasks.len()
    }

    /// Run every pending task once. Returns how many ran.
    pub fn advance(&self) -> usize {
        // tasks run without the queue locked so they may cancel themselves
        let batch = std::mem::take(&mut lock(&self.queue).tasks);
        let ran = batch.len();

        let mut survivors = Vec::with_capacity(ran);
        for (id, mut task) in batch {
            if task().is_continue() {
                survivors.push((id, task));
            }
        }

        let mut queue = lock(&self.queue);
        for (id, task) in survivors {
            if !queue.cancelled.remove(&id) {
                queue.tasks.push((id, task));
            }
        }
        queue.cancelled.clear();
        ran
    }

    /// Advance until no task is left or `max_rounds` rounds have run.
    /// Returns the number of rounds.
    pub fn run_until_idle(&self, max_rounds: usize) -> usize {
        let mut rounds = 0;
        while rounds < max_rounds && self.pending() > 0 {
            self.advance();
            rounds += 1;
        }
        rounds
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

impl Scheduler for ManualScheduler {
    type Handle = ManualHandle;

    fn schedule(&self, _interval: Duration, task: Task) -> ManualHandle {
        let mut queue = lock(&self.queue);
        let id = queue.next_id;
        queue.next_id += 1;
        queue.tasks.push((id, task));
        ManualHandle {
            queue: Arc::clone(&self.queue),
            id,
        }
    }
}

pub struct ManualHandle {
    queue: Arc<Mutex<ManualQueue>>,
    id: u64,
}

impl Cancel for ManualHandle {
    fn cancel(&mut self) {
        let mut queue = lock(&self.queue);
        let before = queue.tasks.len();
        queue.tasks.retain(|(id, _)| *id != self.id);
        if queue.tasks.len() == before {
            queue.cancelled.insert(self.id);
        }
    }
}

/// Runs tasks on a tokio runtime, one `tokio::time::interval` per task
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Scheduler for the runtime this is called from, if any
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    type Handle = TokioHandle;

    fn schedule(&self, interval: Duration, mut task: Task) -> TokioHandle {
        let join = self.handle.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if task().is_break() {
                    break;
                }
            }
        });
        TokioHandle { join }
    }
}

pub struct TokioHandle {
    join: JoinHandle<()>,
}

impl Cancel for TokioHandle {
    fn cancel(&mut self) {
        self.join.abort();
    }
}

#[derive(Default)]
struct RunState {
    generation: u64,
    handle: Option<Box<dyn Cancel>>,
}

/// Ticks a shared simulation on a schedule until it settles.
///
/// Clones share the simulation and the run state.
pub struct LayoutDriver<Id, const D: usize> {
    simulation: Arc<Mutex<Simulation<Id, D>>>,
    state: Arc<Mutex<RunState>>,
}

impl<Id, const D: usize> Clone for LayoutDriver<Id, D> {
    fn clone(&self) -> Self {
        Self {
            simulation: Arc::clone(&self.simulation),
            state: Arc::clone(&self.state),
        }
    }
}

impl<Id, const D: usize> LayoutDriver<Id, D>
where
    Id: Clone + Eq + Hash + fmt::Debug + Send + 'static,
{
    pub fn new(simulation: Simulation<Id, D>) -> Self {
        Self {
            simulation: Arc::new(Mutex::new(simulation)),
            state: Arc::new(Mutex::new(RunState::default())),
        }
    }

    /// Start ticking every `interval`. Does nothing if already running.
    ///
    /// Alpha is reset to `alpha`, or to the simulation's initial alpha when
    /// `None`. The task checks for a settled simulation before each tick, so
    /// a simulation that is settled from the start is never ticked.
    ///
    /// `on_tick` sees the simulation after each scheduled tick, with the
    /// simulation locked; it must not call back into this driver's
    /// simulation accessors.
    pub fn start<S: Scheduler>(
        &self,
        scheduler: &S,
        interval: Duration,
        alpha: Option<f64>,
        mut on_tick: impl FnMut(&Simulation<Id, D>) + Send + 'static,
    ) {
        // simulation before run state, the same order a task's `on_tick` uses
        let mut sim = lock(&self.simulation);
        let mut state = lock(&self.state);
        if state.handle.is_some() {
            return;
        }
        state.generation += 1;
        let generation = state.generation;

        match alpha {
            Some(alpha) => sim.set_alpha(alpha),
            None => sim.reheat(),
        }
        drop(sim);

        let simulation = Arc::clone(&self.simulation);
        let run_state = Arc::clone(&self.state);
        let task: Task = Box::new(move || {
            {
                let mut sim = lock(&simulation);
                if !sim.is_settled() {
                    sim.tick(1);
                    on_tick(&sim);
                    return ControlFlow::Continue(());
                }
            }

            let mut state = lock(&run_state);
            if state.generation == generation {
                state.handle = None;
                debug!("simulation settled, driver stopped");
            }
            ControlFlow::Break(())
        });

        state.handle = Some(Box::new(scheduler.schedule(interval, task)));
        info!(interval_ms = interval.as_millis() as u64, "driver started");
    }

    /// Stop ticking immediately. A tick already in progress completes.
    pub fn stop(&self) {
        let mut state = lock(&self.state);
        if let Some(mut handle) = state.handle.take() {
            handle.cancel();
            info!("driver stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).handle.is_some()
    }

    pub fn alpha(&self) -> f64 {
        lock(&self.simulation).alpha()
    }

    /// Advance by hand, whether or not the driver is running
    pub fn tick(&self, count: usize) {
        lock(&self.simulation).tick(count);
    }

    /// Read or update the simulation between ticks
    pub fn with_simulation<R>(&self, f: impl FnOnce(&mut Simulation<Id, D>) -> R) -> R {
        f(&mut lock(&self.simulation))
    }
}

impl<Id, const D: usize> fmt::Debug for LayoutDriver<Id, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutDriver")
            .field("running", &lock(&self.state).handle.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forces::ManyBodyForce;
    use crate::simulation::SimulationBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn driver(alpha_min: f64) -> LayoutDriver<u32, 2> {
        let sim = SimulationBuilder::new()
            .alpha_min(alpha_min)
            .build(0..5)
            .unwrap()
            .with_force(ManyBodyForce::new())
            .unwrap();
        LayoutDriver::new(sim)
    }

    #[test]
    fn ticks_once_per_round() {
        let driver = driver(0.001);
        let scheduler = ManualScheduler::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);

        driver.start(&scheduler, Duration::from_millis(16), None, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(driver.is_running());

        for _ in 0..3 {
            scheduler.advance();
        }
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert!(driver.alpha() < 1.0);
    }

    #[test]
    fn stop_is_immediate() {
        let driver = driver(0.001);
        let scheduler = ManualScheduler::new();
        driver.start(&scheduler, Duration::ZERO, None, |_| {});
        scheduler.advance();
        let alpha = driver.alpha();

        driver.stop();
        assert!(!driver.is_running());
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.advance(), 0);
        assert_eq!(driver.alpha(), alpha);
    }

    #[test]
    fn stops_itself_once_settled() {
        let driver = driver(0.5);
        let scheduler = ManualScheduler::new();
        driver.start(&scheduler, Duration::ZERO, None, |_| {});

        let rounds = scheduler.run_until_idle(1000);
        assert!(rounds < 1000);
        assert!(!driver.is_running());
        assert!(driver.with_simulation(|sim| sim.is_settled()));
    }

    #[test]
    fn start_while_running_is_noop() {
        let driver = driver(0.001);
        let scheduler = ManualScheduler::new();
        driver.start(&scheduler, Duration::ZERO, None, |_| {});
        driver.start(&scheduler, Duration::ZERO, None, |_| {});
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn restart_reheats_a_settled_simulation() {
        let driver = driver(0.5);
        let scheduler = ManualScheduler::new();
        driver.start(&scheduler, Duration::ZERO, None, |_| {});
        scheduler.run_until_idle(1000);
        assert!(!driver.is_running());
        assert!(driver.with_simulation(|sim| sim.is_settled()));

        driver.start(&scheduler, Duration::ZERO, None, |_| {});
        assert!(driver.is_running());
        assert_eq!(driver.alpha(), 1.0);
        scheduler.advance();
        assert!(driver.alpha() > 0.5);
    }

    #[test]
    fn start_alpha_overrides_initial_alpha() {
        let driver = driver(0.001);
        let scheduler = ManualScheduler::new();
        driver.tick(50);

        driver.start(&scheduler, Duration::ZERO, Some(0.25), |_| {});
        assert_eq!(driver.alpha(), 0.25);
    }

    #[test]
    fn settled_start_never_ticks() {
        let driver = driver(0.5);
        let scheduler = ManualScheduler::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let positions = driver.with_simulation(|sim| sim.positions().to_vec());

        driver.start(&scheduler, Duration::ZERO, Some(0.1), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(scheduler.run_until_idle(1000), 1);

        assert!(!driver.is_running());
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
        assert_eq!(driver.alpha(), 0.1);
        assert_eq!(driver.with_simulation(|sim| sim.positions().to_vec()), positions);
    }

    #[test]
    fn task_can_stop_its_own_driver() {
        let driver = driver(0.001);
        let scheduler = ManualScheduler::new();
        let handle = driver.clone();
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);

        driver.start(&scheduler, Duration::ZERO, None, move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 1 {
                handle.stop();
            }
        });

        scheduler.run_until_idle(10);
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
        assert!(!driver.is_running());
    }

    #[test]
    fn manual_tick_works_while_idle() {
        let driver = driver(0.001);
        driver.tick(5);
        assert!(!driver.is_running());
        assert!(driver.alpha() < 1.0);
    }

    #[tokio::test]
    async fn tokio_scheduler_runs_until_settled() {
        let driver = driver(0.5);
        let scheduler = TokioScheduler::current().unwrap();
        driver.start(&scheduler, Duration::from_millis(1), None, |_| {});

        tokio::time::timeout(Duration::from_secs(10), async {
            while driver.is_running() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap();

        assert!(driver.with_simulation(|sim| sim.is_settled()));
    }

    #[tokio::test]
    async fn tokio_stop_cancels_task() {
        let driver = driver(1e-9);
        let scheduler = TokioScheduler::current().unwrap();
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        driver.start(&scheduler, Duration::from_millis(1), None, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        driver.stop();
        assert!(!driver.is_running());
        tokio::time::sleep(Duration::from_millis(5)).await;
        let stopped_at = ticks.load(Ordering::SeqCst);
        assert!(stopped_at > 0);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), stopped_at);
    }
}
