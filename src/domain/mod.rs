mod api;
pub mod dto;
mod memory;

pub use api::{AccountApi, AuditApi, PaymentApi};
pub use dto::{
    Account, AccountAuditLogs, AuditLevel, AuditLog, PaymentMethod, PluginProperty, Refund,
};
pub use memory::InMemoryBilling;
