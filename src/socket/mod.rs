//! Connection establishment.
//!
//! - [`dialer`]: the [`Dialer`] trait, TCP, null and single-use dialers
//! - [`resolving`]: hostname resolution and per-address fan-out
//! - [`logging`], [`errwrap`]: the logging and error-wrapping layers
//! - [`tls`]: TLS handshakers and the TLS dialer
//!
//! [`wrap_dialer`] builds the fixed stack
//! `Logging(Resolving(Logging(ErrWrap(base))))`.

pub mod address;
pub mod dialer;
pub mod errwrap;
pub mod logging;
pub mod resolving;
pub mod stream;
pub mod tls;

pub use address::{join_host_port, split_host_port};
pub use dialer::{Dialer, NullDialer, SharedDialer, SingleUseDialer, SystemDialer, TCP_CONNECT_TIMEOUT};
pub use errwrap::{ErrWrapConn, ErrWrapDialer};
pub use logging::LoggingDialer;
pub use resolving::{reduce_errors, ResolvingDialer};
pub use stream::{BoxedConn, Conn, DatagramConn};

use crate::base::logger::SharedLogger;
use crate::dns::SharedResolver;
use std::sync::Arc;

/// Stacks resolution, logging and error wrapping on top of `base`.
pub fn wrap_dialer(
    base: SharedDialer,
    resolver: SharedResolver,
    logger: SharedLogger,
) -> SharedDialer {
    let per_address: SharedDialer = Arc::new(LoggingDialer::with_operation(
        Arc::new(ErrWrapDialer::new(base)),
        logger.clone(),
        "dial_address",
    ));
    Arc::new(LoggingDialer::new(
        Arc::new(ResolvingDialer::new(per_address, resolver)),
        logger,
    ))
}

/// Full dialer stack over [`SystemDialer`].
pub fn new_dialer(resolver: SharedResolver, logger: SharedLogger) -> SharedDialer {
    wrap_dialer(Arc::new(SystemDialer::new()), resolver, logger)
}
