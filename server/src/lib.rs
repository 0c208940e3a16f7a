// The maira-server crate hosts the HTTP daemon:
// - /chat multipart endpoint (document uploads + generation)
// - /reset endpoint (clears the document memory)
// - Static serving of the public front-end assets
// - Server configuration and shared application state

pub mod chat;
pub mod config;
pub mod http_server;
pub mod upload;
