//! Root of all SeaORM entity modules for the rental management domain.
//!
//! Properties contain units; a lease binds one tenant to one unit for a
//! period and collects payments. Maintenance requests hang off properties.
//! Users and audit logs stand on their own.

pub mod audit_log;
pub mod lease;
pub mod maintenance_request;
pub mod payment;
pub mod property;
pub mod tenant;
pub mod unit;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::audit_log::Entity as AuditLog;
    pub use super::lease::Entity as Lease;
    pub use super::maintenance_request::Entity as MaintenanceRequest;
    pub use super::payment::Entity as Payment;
    pub use super::property::Entity as Property;
    pub use super::tenant::Entity as Tenant;
    pub use super::unit::Entity as Unit;
    pub use super::user::Entity as User;
}
