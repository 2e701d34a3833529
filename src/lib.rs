mod destroyable;

pub mod clock;
pub mod events;
pub mod game;
pub mod ledger;
pub mod model;
pub mod ui;

pub use destroyable::Destroyable;
