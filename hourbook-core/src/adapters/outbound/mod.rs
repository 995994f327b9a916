mod memory;

pub use memory::InMemoryStore;
