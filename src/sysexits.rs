//! Exit status codes, following the BSD `sysexits` convention.
//! reference: [SYSEXITS](https://man.freebsd.org/cgi/man.cgi?query=sysexits&sektion=3)

/// value: 64 <br>
/// The command was used incorrectly, e.g. a split size that cannot be parsed.
pub const EX_USAGE: i32 = 64;

/// value: 65 <br>
/// The archive set is missing or failed its integrity test.
pub const EX_DATAERR: i32 = 65;

/// value: 66 <br>
/// The source directory does not exist or is not readable.
pub const EX_NOINPUT: i32 = 66;

/// value: 69 <br>
/// A required external program (7-Zip, git, gh) could not be found.
pub const EX_UNAVAILABLE: i32 = 69;

/// value: 70 <br>
/// An external program exited with an error.
pub const EX_SOFTWARE: i32 = 70;

/// value: 73 <br>
/// The destination cannot be written, or an archive would be overwritten.
pub const EX_CANTCREAT: i32 = 73;

/// value: 74 <br>
/// An error occurred while doing I/O on some file.
pub const EX_IOERR: i32 = 74;

/// value: 75 <br>
/// Temporary failure: the push gave up after its retries, or the user stopped on low disk space.
/// Rerunning later may succeed.
pub const EX_TEMPFAIL: i32 = 75;

/// value: 77 <br>
/// The hosting CLI is not authenticated.
pub const EX_NOPERM: i32 = 77;

/// value: 78 <br>
/// The configuration file could not be read or parsed.
pub const EX_CONFIG: i32 = 78;

/// value: 130 <br>
/// Terminated by Ctrl+C (128 + SIGINT).
pub const EX_INTERRUPTED: i32 = 130;
