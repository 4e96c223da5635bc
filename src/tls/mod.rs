pub use config::TlsConfig;
pub use conn::{dial, TlsConn};
pub use listener::{listen, TlsListener};

mod config;
mod conn;
mod listener;
mod store;
mod verify;
