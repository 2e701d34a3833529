mod main_loop;
mod scheduler;
mod sim;

pub use main_loop::MainLoop;
pub use scheduler::{ScheduleHandle, TickCallback, TickFlow, TickScheduler, TimeSource};
pub use sim::SimClock;
