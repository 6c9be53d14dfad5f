/// How many numbers make up one entry.
pub const PICK_COUNT: usize = 6;

/// Smallest number that may be picked or drawn.
pub const MIN_NUMBER: u8 = 1;

/// Largest number that may be picked or drawn.
pub const MAX_NUMBER: u8 = 49;

pub const CONFIG_SEED: &[u8] = b"config";
pub const ENTRY_SEED: &[u8] = b"entry";
pub const TREASURY_SEED: &[u8] = b"treasury";
