mod bridge;
pub mod dto;
mod handler;
mod params;
mod registry;
mod remote;
mod request;
mod response;
mod store;

pub use bridge::PluginBridge;
pub use dto::{ConsumedParameters, PluginRegistration, PluginRegistrationRequest};
pub(crate) use handler::{dispatch_plugin, list_plugins, register_plugin, unregister_plugin};
pub use handler::restore_remote_plugins;
pub use params::{encode_first_values, parse_urlencoded, ParameterMap};
pub use registry::{
    validate_plugin_name, PluginHandler, PluginRegistry, PluginResolver, SingletonResolver,
};
pub use remote::RemotePluginHandler;
pub use request::{strip_mount_prefix, PluginBody, PluginRequest, PluginRequestBuilder};
pub use response::PluginResponse;
pub use store::PluginRegistrationStore;
