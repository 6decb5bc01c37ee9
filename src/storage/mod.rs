//! Key/value persistence for rote.
//!
//! All study state is mirrored into a flat key/value store after every
//! mutation. Values are UTF-8 JSON text; see [`keys`] for the layout.

pub mod file;
pub mod keys;
pub mod memory;
pub mod traits;

pub use file::FileKvStore;
pub use memory::MemoryKvStore;
pub use traits::KvStore;
