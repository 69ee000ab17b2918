//! TCP/TLS stream handling for the relay connection.

mod stream;

pub use stream::{SmtpStream, connect, connect_tls};
