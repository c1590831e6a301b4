//! Persistent configuration: the project descriptor and per-user memory

pub mod descriptor;
pub mod memory;

pub use descriptor::{
    read_config, read_descriptor, update_descriptor, write_descriptor, Features,
    ReliverseConfig, RepoPrivacy, DESCRIPTOR_FILE,
};
pub use memory::{resolve_token, MemoryStore, ReliverseMemory};
