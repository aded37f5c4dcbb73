pub mod domain;
pub mod frameworks;
pub mod interface_adapters;

pub use interface_adapters::net::{ClientError, ClientSettings, NetClient};
