pub mod assembler;
pub mod collector;
pub mod deduplicator;
pub mod fnv;
pub mod labels;
pub mod signature;
pub mod system_labels;
