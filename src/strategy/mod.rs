//! Strategy: 具体的分片读写策略

pub mod file;

pub use file::{LocalFileTransfer, PIECE_SIZE_PARAM};
