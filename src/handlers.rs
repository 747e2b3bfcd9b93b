pub mod admin;
pub mod auth;
pub mod health;
pub mod leases;
pub mod maintenance;
pub mod payments;
pub mod properties;
pub mod tenants;
pub mod units;
