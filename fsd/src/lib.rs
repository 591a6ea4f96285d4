// fsd/src/lib.rs
//
// Library half of the file server daemon. The TCP listener and the line
// protocol live here so integration tests can run a real server
// in-process; the binary in main.rs is a thin wrapper around Server.

pub mod proto;
pub mod server;

pub use server::Server;
