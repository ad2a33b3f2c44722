//! Dialer logging.

use crate::base::logger::SharedLogger;
use crate::base::neterror::NetError;
use crate::socket::dialer::{Dialer, SharedDialer};
use crate::socket::stream::BoxedConn;
use async_trait::async_trait;
use std::time::Instant;

/// Logs the start and outcome of every dial.
pub struct LoggingDialer {
    dialer: SharedDialer,
    logger: SharedLogger,
    operation: &'static str,
}

impl LoggingDialer {
    /// Logs with the `dial` prefix.
    pub fn new(dialer: SharedDialer, logger: SharedLogger) -> Self {
        Self::with_operation(dialer, logger, "dial")
    }

    /// Logs with a custom prefix, e.g. `dial_address` for the per-address
    /// attempts below the resolving layer.
    pub fn with_operation(
        dialer: SharedDialer,
        logger: SharedLogger,
        operation: &'static str,
    ) -> Self {
        Self {
            dialer,
            logger,
            operation,
        }
    }
}

#[async_trait]
impl Dialer for LoggingDialer {
    async fn dial(&self, network: &str, address: &str) -> Result<BoxedConn, NetError> {
        let op = self.operation;
        self.logger.debug(&format!("{op} {address}/{network}..."));
        let start = Instant::now();
        let result = self.dialer.dial(network, address).await;
        let elapsed = start.elapsed();
        match &result {
            Ok(_) => self
                .logger
                .debug(&format!("{op} {address}/{network}... ok in {elapsed:?}")),
            Err(err) => self
                .logger
                .debug(&format!("{op} {address}/{network}... {err} in {elapsed:?}")),
        }
        result
    }

    fn close_idle_connections(&self) {
        self.dialer.close_idle_connections()
    }
}
