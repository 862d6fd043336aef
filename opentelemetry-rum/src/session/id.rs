use crate::error::SessionIdError;
use std::fmt;
use std::str::FromStr;

/// Number of characters in the canonical textual form of a [`SessionId`].
pub(crate) const SESSION_ID_HEX_LEN: usize = 32;

/// A 16-byte value which identifies a session.
///
/// Rendered as 32 lowercase hex characters, two per byte, most significant
/// nibble first.
#[derive(Clone, PartialEq, Eq, Copy, Hash)]
pub struct SessionId(u128);

impl SessionId {
    /// Create a session id from its representation as a byte array.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        SessionId(u128::from_be_bytes(bytes))
    }

    /// Return the representation of this session id as a byte array.
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0.to_be_bytes()
    }
}

impl From<u128> for SessionId {
    fn from(value: u128) -> Self {
        SessionId(value)
    }
}

impl FromStr for SessionId {
    type Err = SessionIdError;

    /// Parses the canonical form only: exactly 32 characters of `0-9a-f`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != SESSION_ID_HEX_LEN {
            return Err(SessionIdError::InvalidLength(s.len()));
        }
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(SessionIdError::InvalidCharacter);
        }
        u128::from_str_radix(s, 16)
            .map(SessionId)
            .map_err(|_| SessionIdError::InvalidCharacter)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:032x}", self.0))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:032x}", self.0))
    }
}

impl fmt::LowerHex for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
