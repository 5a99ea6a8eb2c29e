//! `Gateway` over RESP2 with a small idle-connection pool

use parking_lot::Mutex;
use std::time::Duration;
use sugar_core::{Command, Error, Gateway, Reply, Result};
use tracing::{debug, warn};

use crate::args::command_args;
use crate::connection::Connection;

/// Where and how to connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireOptions {
    /// Host name or address
    pub host: String,
    /// TCP port
    pub port: u16,
    /// Logical database index
    pub db: u32,
    /// Maximum idle connections kept for reuse
    pub pool_size: usize,
    /// Timeout for establishing a connection
    pub connect_timeout: Duration,
    /// Read/write timeout per socket operation
    pub io_timeout: Duration,
}

impl Default for WireOptions {
    fn default() -> Self {
        WireOptions {
            host: "127.0.0.1".to_string(),
            port: 6379,
            db: 0,
            pool_size: 4,
            connect_timeout: Duration::from_millis(2000),
            io_timeout: Duration::from_millis(5000),
        }
    }
}

/// RESP2 client implementing `Gateway`
///
/// Batches are submitted as `MULTI ... EXEC` in a single write.
pub struct RespGateway {
    options: WireOptions,
    idle: Mutex<Vec<Connection>>,
}

impl std::fmt::Debug for RespGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RespGateway")
            .field("host", &self.options.host)
            .field("port", &self.options.port)
            .field("db", &self.options.db)
            .finish()
    }
}

impl RespGateway {
    /// Connect and verify the session with `PING`
    ///
    /// Fails with `Error::Connection` when the store cannot be reached.
    pub fn connect(options: WireOptions) -> Result<Self> {
        let gateway = RespGateway {
            options,
            idle: Mutex::new(Vec::new()),
        };
        let mut conn = gateway.open()?;
        conn.request(&Command::Ping)?
            .into_result()
            .map_err(|e| Error::Connection(format!("PING failed: {}", e)))?;
        gateway.release(conn);
        debug!(
            target: "sugar::gateway",
            host = %gateway.options.host,
            port = gateway.options.port,
            "Gateway ready"
        );
        Ok(gateway)
    }

    /// Options the gateway was built with
    pub fn options(&self) -> &WireOptions {
        &self.options
    }

    /// Number of idle pooled connections
    pub fn idle_connections(&self) -> usize {
        self.idle.lock().len()
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(
            &self.options.host,
            self.options.port,
            self.options.db,
            self.options.connect_timeout,
            self.options.io_timeout,
        )
    }

    fn acquire(&self) -> Result<Connection> {
        if let Some(conn) = self.idle.lock().pop() {
            return Ok(conn);
        }
        self.open()
    }

    fn release(&self, conn: Connection) {
        if conn.is_broken() {
            warn!(target: "sugar::gateway", "Dropping broken connection");
            return;
        }
        let mut idle = self.idle.lock();
        if idle.len() < self.options.pool_size {
            idle.push(conn);
        }
    }

    fn with_connection<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.acquire()?;
        let result = f(&mut conn);
        self.release(conn);
        result
    }
}

impl Gateway for RespGateway {
    fn execute(&self, command: Command) -> Result<Reply> {
        self.with_connection(|conn| conn.request(&command))
    }

    fn execute_batch(&self, commands: Vec<Command>) -> Result<Vec<Reply>> {
        if commands.is_empty() {
            return Ok(Vec::new());
        }
        let count = commands.len();
        let mut requests = Vec::with_capacity(count + 2);
        requests.push(vec![b"MULTI".to_vec()]);
        requests.extend(commands.iter().map(command_args));
        requests.push(vec![b"EXEC".to_vec()]);

        let mut replies = self.with_connection(|conn| conn.pipeline(&requests))?;
        debug!(target: "sugar::gateway", commands = count, "Transaction submitted");

        match replies.pop() {
            Some(Reply::Array(results)) if results.len() == count => Ok(results),
            Some(Reply::Array(results)) => Err(Error::protocol(format!(
                "EXEC returned {} replies for {} commands",
                results.len(),
                count
            ))),
            Some(Reply::Nil) => Err(Error::Remote("transaction aborted".to_string())),
            Some(Reply::Error(msg)) => Err(Error::from_reply(&msg)),
            other => Err(Error::protocol(format!(
                "unexpected EXEC reply {:?}",
                other
            ))),
        }
    }
}
