pub mod analysis;
pub mod clipboard;
pub mod config_io;
pub mod lock;
pub mod logging;
pub mod recovery;
pub mod store;
pub mod watcher;
