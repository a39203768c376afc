//! Stream session module: socket lifecycle for one symbol

mod client;
mod stream;

pub use client::WsClient;
pub use stream::StreamSession;
