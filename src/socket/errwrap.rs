//! Error-wrapping dialer and connection.

use crate::base::classify::classify_generic_error;
use crate::base::errwrapper::{ResultExt, WrappedError};
use crate::base::neterror::NetError;
use crate::base::operation::Operation;
use crate::socket::dialer::{Dialer, SharedDialer};
use crate::socket::stream::{BoxedConn, Conn};
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Wraps dial failures with [`Operation::Connect`] and hands out
/// [`ErrWrapConn`]s.
pub struct ErrWrapDialer {
    dialer: SharedDialer,
}

impl ErrWrapDialer {
    pub fn new(dialer: SharedDialer) -> Self {
        Self { dialer }
    }
}

#[async_trait]
impl Dialer for ErrWrapDialer {
    async fn dial(&self, network: &str, address: &str) -> Result<BoxedConn, NetError> {
        let conn = self
            .dialer
            .dial(network, address)
            .await
            .wrap_err(classify_generic_error, Operation::Connect)?;
        Ok(BoxedConn::new(ErrWrapConn::new(conn)))
    }

    fn close_idle_connections(&self) {
        self.dialer.close_idle_connections()
    }
}

fn wrap_io(operation: Operation, err: io::Error) -> io::Error {
    NetError::Wrapped(WrappedError::new(classify_generic_error, operation, err)).into_io()
}

fn wrapped<T>(operation: Operation, poll: Poll<io::Result<T>>) -> Poll<io::Result<T>> {
    match poll {
        Poll::Ready(Err(e)) => Poll::Ready(Err(wrap_io(operation, e))),
        other => other,
    }
}

/// Connection whose read, write and close failures are classified.
///
/// The classified error travels inside the returned `io::Error`; convert it
/// back with `NetError::from` to inspect it.
pub struct ErrWrapConn {
    inner: BoxedConn,
}

impl ErrWrapConn {
    pub fn new(inner: BoxedConn) -> Self {
        Self { inner }
    }
}

impl Conn for ErrWrapConn {
    fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.local_addr()
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.inner.peer_addr()
    }
}

impl AsyncRead for ErrWrapConn {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        wrapped(Operation::Read, Pin::new(&mut self.inner).poll_read(cx, buf))
    }
}

impl AsyncWrite for ErrWrapConn {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        wrapped(Operation::Write, Pin::new(&mut self.inner).poll_write(cx, buf))
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        wrapped(Operation::Write, Pin::new(&mut self.inner).poll_flush(cx))
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        wrapped(Operation::Close, Pin::new(&mut self.inner).poll_shutdown(cx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::failure::Failure;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    struct FailingConn;

    impl Conn for FailingConn {}

    impl AsyncRead for FailingConn {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::UnexpectedEof, "short read")))
        }
    }

    impl AsyncWrite for FailingConn {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::other("use of closed network connection")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::TimedOut, NetError::Timeout)))
        }
    }

    fn failure_of(err: io::Error) -> (Failure, Operation) {
        let err = NetError::from(err);
        let wrapped = err.as_wrapped().expect("wrapped");
        (wrapped.failure().clone(), wrapped.operation())
    }

    #[tokio::test]
    async fn test_conn_wraps_read_write_close() {
        let mut conn = ErrWrapConn::new(BoxedConn::new(FailingConn));
        let mut buf = [0u8; 8];

        let (failure, op) = failure_of(conn.read(&mut buf).await.unwrap_err());
        assert_eq!(op, Operation::Read);
        assert_eq!(failure, Failure::EofError);

        let (failure, op) = failure_of(conn.write(b"x").await.unwrap_err());
        assert_eq!(op, Operation::Write);
        assert_eq!(failure, Failure::ConnectionAlreadyClosed);

        let (failure, op) = failure_of(conn.shutdown().await.unwrap_err());
        assert_eq!(op, Operation::Close);
        assert_eq!(failure, Failure::GenericTimeout);
    }

    struct RefusingDialer;

    #[async_trait]
    impl Dialer for RefusingDialer {
        async fn dial(&self, _network: &str, _address: &str) -> Result<BoxedConn, NetError> {
            Err(NetError::Timeout)
        }
    }

    #[tokio::test]
    async fn test_dialer_wraps_connect() {
        let dialer = ErrWrapDialer::new(Arc::new(RefusingDialer));
        let err = dialer.dial("tcp", "10.0.0.1:443").await.unwrap_err();
        let wrapped = err.as_wrapped().expect("wrapped");
        assert_eq!(wrapped.operation(), Operation::Connect);
        assert_eq!(wrapped.failure(), &Failure::GenericTimeout);
    }
}
