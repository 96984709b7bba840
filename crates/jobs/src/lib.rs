pub mod filter_update;
pub mod runner;

pub use filter_update::FilterUpdateJob;
pub use runner::JobRunner;
