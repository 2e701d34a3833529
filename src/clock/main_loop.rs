use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, SystemTime};

use log::trace;

use super::scheduler::{ScheduleHandle, Source, TickCallback, TickFlow, TickScheduler, TimeSource};

/// Real-time single-threaded scheduler: sleeps until the next deadline,
/// fires that source, repeats. [`MainLoop::run`] returns once no live
/// sources remain, so a session naturally winds down when its schedules
/// retire themselves.
pub struct MainLoop {
    sources: Rc<RefCell<Vec<Source>>>,
}

impl Default for MainLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl MainLoop {
    pub fn new() -> Self {
        Self {
            sources: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn run(&self) {
        loop {
            self.sources.borrow_mut().retain(|source| !source.cancelled.get());
            let next = self
                .sources
                .borrow()
                .iter()
                .enumerate()
                .min_by_key(|(_, source)| source.next_due)
                .map(|(index, source)| (index, source.next_due));
            let Some((index, due)) = next else { break };

            if let Ok(wait) = due.duration_since(SystemTime::now()) {
                thread::sleep(wait);
            }

            let mut source = self.sources.borrow_mut().remove(index);
            if source.cancelled.get() {
                continue;
            }
            let flow = (source.callback)();
            if flow == TickFlow::Continue && !source.cancelled.get() {
                source.next_due += source.every;
                self.sources.borrow_mut().push(source);
            } else {
                trace!(target: "clock", "Source retired");
            }
        }
    }
}

impl TimeSource for MainLoop {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

impl TickScheduler for MainLoop {
    fn timeout_add(&self, every: Duration, callback: TickCallback) -> ScheduleHandle {
        let source = Source::new(every, SystemTime::now() + every, callback);
        let handle = source.handle();
        self.sources.borrow_mut().push(source);
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_run_returns_when_sources_retire() {
        let main_loop = MainLoop::new();
        let fired = Rc::new(Cell::new(0u32));

        let fired_clone = fired.clone();
        main_loop.timeout_add(
            Duration::from_millis(1),
            Box::new(move || {
                fired_clone.set(fired_clone.get() + 1);
                if fired_clone.get() >= 3 {
                    TickFlow::Stop
                } else {
                    TickFlow::Continue
                }
            }),
        );

        main_loop.run();
        assert_eq!(fired.get(), 3);
    }

    #[test]
    fn test_removed_source_never_fires() {
        let main_loop = MainLoop::new();
        let fired = Rc::new(Cell::new(0u32));

        let fired_clone = fired.clone();
        let handle = main_loop.timeout_add(
            Duration::from_millis(1),
            Box::new(move || {
                fired_clone.set(fired_clone.get() + 1);
                TickFlow::Continue
            }),
        );
        handle.remove();

        main_loop.run();
        assert_eq!(fired.get(), 0);
    }
}
