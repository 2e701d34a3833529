mod console;
mod presenter;

pub use console::ConsolePresenter;
pub use presenter::{Presenter, StatsSource};
