// Interface adapters: wire protocol and the WebSocket transport.

pub mod net;
pub mod protocol;
