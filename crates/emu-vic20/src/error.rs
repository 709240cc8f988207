//! Machine-level errors.

use format_prg::PrgError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Vic20Error>;

#[derive(Debug, Error)]
pub enum Vic20Error {
    #[error("{name} ROM must be {expected} bytes, got {actual}")]
    RomSize {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("cannot allocate {size} bytes for expansion block {block}")]
    Allocation { block: usize, size: usize },
    #[error("no RAM expansion block {0}")]
    InvalidBlock(usize),
    #[error("cartridge image too short: {0} bytes")]
    CartridgeTooShort(usize),
    #[error(transparent)]
    Prg(#[from] PrgError),
    #[error("KERNAL did not reach READY within {0} frames")]
    BootTimeout(u32),
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}
