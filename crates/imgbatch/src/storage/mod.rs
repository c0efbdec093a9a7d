pub mod layout;

pub use layout::{ensure_directory, StorageLayout};
