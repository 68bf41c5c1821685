//! User Account Control (UAC) flag constants
//!
//! Bits of the `userAccountControl` attribute as stored by Active Directory.

/// Account is disabled
pub const ACCOUNTDISABLE: i64 = 0x0002;
pub const NORMAL_ACCOUNT: i64 = 0x0200;
