pub mod dto;
mod payment_methods;
mod properties;
mod refunds;

pub use dto::{
    ListingQuery, PaymentMethodJson, RefundJson, QUERY_AUDIT, QUERY_PLUGIN_NAME,
    QUERY_PLUGIN_PROPERTY,
};
pub(crate) use payment_methods::{get_payment_methods, search_payment_methods};
pub use payment_methods::PaymentMethodTransform;
pub use properties::extract_plugin_properties;
pub(crate) use refunds::{get_refunds, search_refunds};
pub use refunds::RefundTransform;
