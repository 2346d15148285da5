mod connection;
mod sql_writer;

pub use connection::*;
pub use sql_writer::*;
