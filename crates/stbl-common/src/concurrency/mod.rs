mod debounce;
mod loader;
mod sequence;

pub use debounce::{Debounced, Debouncer};
pub use loader::{Loaded, Loader};
pub use sequence::Sequencer;
