//! Low-level SMTP stream handling.

use crate::error::{Error, Result, Stage};
use rustls::pki_types::{CertificateDer, ServerName};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore},
};

/// SMTP stream: plain TCP, TLS, or already released.
#[derive(Debug)]
pub enum SmtpStream {
    /// Plain TCP connection.
    Tcp(BufReader<TcpStream>),
    /// TLS-encrypted connection.
    Tls(Box<BufReader<tokio_rustls::client::TlsStream<TcpStream>>>),
    /// The transport has been closed or handed off; any I/O fails.
    Closed,
}

impl SmtpStream {
    /// Reads one reply line, tolerating both CRLF and LF terminators.
    ///
    /// # Errors
    ///
    /// Returns a protocol error for `stage` if the connection closes
    /// before a terminator arrives, or an I/O error for transport
    /// failures.
    pub async fn read_line(&mut self, stage: Stage) -> Result<String> {
        let mut line = String::new();
        let read = match self {
            Self::Tcp(reader) => reader.read_line(&mut line).await?,
            Self::Tls(reader) => reader.read_line(&mut line).await?,
            Self::Closed => return Err(Self::closed_error()),
        };

        if read == 0 || !line.ends_with('\n') {
            return Err(Error::truncated_reply(stage));
        }

        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Writes and flushes raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the write or flush fails.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Tcp(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
            Self::Tls(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
            Self::Closed => return Err(Self::closed_error()),
        }
        Ok(())
    }

    /// Upgrades a plain TCP stream to TLS, verifying `hostname` against
    /// the webpki roots plus `extra_roots`.
    ///
    /// # Errors
    ///
    /// Returns a TLS error if the stream is not plain TCP, the server
    /// name is invalid, or the handshake fails.
    pub async fn upgrade_to_tls(
        self,
        hostname: &str,
        extra_roots: &[CertificateDer<'static>],
    ) -> Result<Self> {
        let tcp_stream = match self {
            Self::Tcp(reader) => reader.into_inner(),
            Self::Tls(_) => {
                return Err(Error::Tls {
                    host: hostname.to_string(),
                    message: "connection is already encrypted".to_string(),
                });
            }
            Self::Closed => return Err(Self::closed_error()),
        };

        let connector = tls_connector(hostname, extra_roots)?;
        let server_name = ServerName::try_from(hostname.to_string()).map_err(|_| Error::Tls {
            host: hostname.to_string(),
            message: "not a valid TLS server name".to_string(),
        })?;

        let tls_stream = connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(|e| Error::Tls {
                host: hostname.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self::Tls(Box::new(BufReader::new(tls_stream))))
    }

    /// Returns true if the stream is encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    /// Returns true once the transport has been released.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    fn closed_error() -> Error {
        Error::Io(io::Error::new(
            io::ErrorKind::NotConnected,
            "transport already closed",
        ))
    }
}

/// Opens a plain TCP connection to the relay within `timeout`.
///
/// # Errors
///
/// Returns [`Error::Connect`] on DNS failure, refusal, or timeout.
pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<SmtpStream> {
    let stream = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
        .await
        .map_err(|_| connect_timed_out(host, port))?
        .map_err(|source| Error::Connect {
            host: host.to_string(),
            port,
            source,
        })?;
    Ok(SmtpStream::Tcp(BufReader::new(stream)))
}

/// Opens a connection with implicit TLS: the handshake runs before any
/// protocol byte is exchanged, all within `timeout`.
///
/// # Errors
///
/// Returns [`Error::Connect`] or [`Error::Tls`] as appropriate.
pub async fn connect_tls(
    host: &str,
    port: u16,
    timeout: Duration,
    extra_roots: &[CertificateDer<'static>],
) -> Result<SmtpStream> {
    let handshake = async {
        let plain = TcpStream::connect((host, port))
            .await
            .map_err(|source| Error::Connect {
                host: host.to_string(),
                port,
                source,
            })?;
        SmtpStream::Tcp(BufReader::new(plain))
            .upgrade_to_tls(host, extra_roots)
            .await
    };

    tokio::time::timeout(timeout, handshake)
        .await
        .map_err(|_| connect_timed_out(host, port))?
}

fn connect_timed_out(host: &str, port: u16) -> Error {
    Error::Connect {
        host: host.to_string(),
        port,
        source: io::Error::new(io::ErrorKind::TimedOut, "connect timed out"),
    }
}

fn tls_connector(hostname: &str, extra_roots: &[CertificateDer<'static>]) -> Result<TlsConnector> {
    let mut root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    for cert in extra_roots {
        root_store.add(cert.clone()).map_err(|e| Error::Tls {
            host: hostname.to_string(),
            message: format!("rejected extra root certificate: {e}"),
        })?;
    }

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closed_stream_refuses_io() {
        let mut stream = SmtpStream::Closed;
        assert!(stream.is_closed());
        assert!(stream.read_line(Stage::Greeting).await.is_err());
        assert!(stream.write_all(b"NOOP\r\n").await.is_err());
    }

    #[tokio::test]
    async fn connect_reports_refusal() {
        // Port 1 on localhost is assumed unbound.
        let err = connect("127.0.0.1", 1, Duration::from_secs(5))
            .await
            .unwrap_err();
        match err {
            Error::Connect { host, port, .. } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn read_line_strips_either_terminator() {
        use tokio::io::AsyncWriteExt as _;
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            sock.write_all(b"220 crlf\r\n220 lf\n").await.unwrap();
        });

        let mut stream = connect(&addr.ip().to_string(), addr.port(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(stream.read_line(Stage::Greeting).await.unwrap(), "220 crlf");
        assert_eq!(stream.read_line(Stage::Greeting).await.unwrap(), "220 lf");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn eof_mid_line_is_protocol_error() {
        use tokio::io::AsyncWriteExt as _;
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            sock.write_all(b"220 truncat").await.unwrap();
            // socket drops here, mid-line
        });

        let mut stream = connect(&addr.ip().to_string(), addr.port(), Duration::from_secs(5))
            .await
            .unwrap();
        let err = stream.read_line(Stage::Greeting).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol {
                stage: Stage::Greeting,
                code: None,
                ..
            }
        ));
        server.await.unwrap();
    }
}
