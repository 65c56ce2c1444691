//! Bookshelf application library: the catalog module and the bootstrap that
//! wires it to a store, shared by the server binary and the CLI.

pub mod app;
pub mod modules;

pub use app::App;
