use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::trace;

use super::scheduler::{ScheduleHandle, Source, TickCallback, TickFlow, TickScheduler, TimeSource};

/// Deterministic clock + scheduler for tests and headless simulation.
/// Virtual time only moves under [`SimClock::advance`], which fires due
/// sources in deadline order, stepping `now` to each deadline as it
/// goes.
pub struct SimClock {
    now: Cell<SystemTime>,
    sources: Rc<RefCell<Vec<Source>>>,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            now: Cell::new(UNIX_EPOCH),
            sources: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Moves virtual time forward by `dt`, firing every source that
    /// comes due along the way. Callbacks may register new sources or
    /// remove existing ones; both take effect immediately.
    pub fn advance(&self, dt: Duration) {
        let target = self.now.get() + dt;
        loop {
            self.sources.borrow_mut().retain(|source| !source.cancelled.get());
            let next = self
                .sources
                .borrow()
                .iter()
                .enumerate()
                .filter(|(_, source)| source.next_due <= target)
                .min_by_key(|(_, source)| source.next_due)
                .map(|(index, source)| (index, source.next_due));
            let Some((index, due)) = next else { break };

            self.now.set(due);
            // pull the source out so firing it holds no list borrow
            let mut source = self.sources.borrow_mut().remove(index);
            let flow = (source.callback)();
            if flow == TickFlow::Continue && !source.cancelled.get() {
                source.next_due += source.every;
                self.sources.borrow_mut().push(source);
            } else {
                trace!(target: "clock", "Simulated source retired at {:?}", due);
            }
        }
        self.now.set(target);
    }

    pub fn live_sources(&self) -> usize {
        self.sources
            .borrow()
            .iter()
            .filter(|source| !source.cancelled.get())
            .count()
    }
}

impl TimeSource for SimClock {
    fn now(&self) -> SystemTime {
        self.now.get()
    }
}

impl TickScheduler for SimClock {
    fn timeout_add(&self, every: Duration, callback: TickCallback) -> ScheduleHandle {
        let source = Source::new(every, self.now.get() + every, callback);
        let handle = source.handle();
        self.sources.borrow_mut().push(source);
        handle
    }
}
