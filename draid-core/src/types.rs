// vim: tw=80
//! Common type definitions used throughout the crate

use thiserror::Error;

/// Identifies a physical device within a permutation map.
///
/// Maps hold at most [`MAX_DEVS`](crate::raid::MAX_DEVS) devices, so 16 bits
/// suffice and keep the row tables compact.
pub type DevT = u16;

/// The crate's error type
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum Error {
    /// An argument was out of range or inconsistent with the others, or a
    /// selector name was not recognized.
    #[error("Invalid argument")]
    InvalidArgument,

    /// A row ran out of healthy spare slots before every broken device was
    /// reconstructed.
    #[error("Out of spare slots")]
    Exhausted,

    /// The allocator could not provide backing storage for a map.
    #[error("Cannot allocate memory")]
    AllocationFailed,
}

pub type Result<T> = std::result::Result<T, Error>;
