//! Bearer-token authentication and role policies.

pub mod extractor;
pub mod jwt;
pub mod password;

pub use extractor::{AdminOnly, AuthUser, ManagerAndUp, Require, StaffAndUp};
