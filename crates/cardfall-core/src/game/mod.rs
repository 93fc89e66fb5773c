pub mod history;
pub mod moves;
pub mod session;
pub mod snapshot;
