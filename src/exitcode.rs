//! Standard exit codes (BSD sysexits.h compatible)

/// Successful termination
pub const OK: i32 = 0;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Data format error
pub const DATAERR: i32 = 65;

/// Cannot open input
pub const NOINPUT: i32 = 66;

/// Internal software error
pub const SOFTWARE: i32 = 70;

/// Can't create output file
pub const CANTCREAT: i32 = 73;

/// Configuration error
pub const CONFIG: i32 = 78;
