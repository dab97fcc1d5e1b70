//! Standard exit codes (BSD sysexits.h compatible)

/// Malformed query or input data
pub const DATAERR: i32 = 65;

/// Data file missing or unreadable
pub const NOINPUT: i32 = 66;

/// Internal software error (tree integrity)
pub const SOFTWARE: i32 = 70;

/// System error (allocation failure)
pub const OSERR: i32 = 71;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
