pub mod connection;
pub mod semilla;

pub use connection::init;
pub use semilla::sembrar_admin;
