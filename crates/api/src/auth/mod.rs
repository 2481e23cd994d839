//! Authentication: JWT access-token validation.

pub mod jwt;
