//! almoner-auth
//!
//! Bearer token verification, the staff user directory and role-based
//! permission checks. Credentials are held by the external identity provider.

pub mod error;
pub mod jwt;
pub mod principal;
pub mod users;
