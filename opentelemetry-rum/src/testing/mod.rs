//! Test doubles for sessions: a manually advanced clock, a predictable id
//! generator and a recorder keeping rotations in memory.
pub mod session;
