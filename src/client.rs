//! Query client
//!
//! Renders a command, hands it to a [`Transport`] and decodes the reply.
//! Each call is one request/response round trip; dropping the returned
//! future cancels the call, and timeouts, retries and connections belong to
//! the transport.

use crate::command::{Arg, Command, GetCommand, MGetCommand, MRangeCommand, RangeCommand};
use crate::error::{QueryError, QueryResult};
use crate::reply::{DecodeMode, Reply};
use crate::types::{DataPoint, LastDatapoint, TimeSeries};
use async_trait::async_trait;
use serde::Deserialize;

/// Issues a named command with positional arguments against the store
#[async_trait]
pub trait Transport: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn execute(&self, command: &str, args: &[Arg]) -> Result<Reply, Self::Error>;
}

/// Client behaviour settings, read from the `[client]` config section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// `lenient` turns unparsable samples into zero, `strict` fails the query
    #[serde(default)]
    pub decode_mode: DecodeMode,
}

/// Typed time-series query client
pub struct Client<T> {
    transport: T,
    config: ClientConfig,
}

impl<T: Transport> Client<T> {
    /// Create a client with the default configuration
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    pub fn with_config(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run any command and decode its reply
    ///
    /// Transport failures are returned unchanged as `QueryError::Transport`.
    pub async fn execute<C>(&self, cmd: &C) -> QueryResult<C::Output, T::Error>
    where
        C: Command + Sync,
    {
        let name = cmd.name();
        let args = cmd.args();
        tracing::debug!(command = name, args = args.len(), "Executing query");

        let reply = self.transport.execute(name, &args).await.map_err(|e| {
            tracing::warn!(command = name, error = %e, "Query failed");
            QueryError::Transport(e)
        })?;

        cmd.decode(reply, self.config.decode_mode).map_err(|e| {
            tracing::warn!(command = name, error = %e, "Failed to decode reply");
            QueryError::Decode(e)
        })
    }

    /// Samples of one series (`TS.RANGE` / `TS.REVRANGE`)
    pub async fn range(&self, cmd: RangeCommand) -> QueryResult<Vec<DataPoint>, T::Error> {
        self.execute(&cmd).await
    }

    /// Samples of every matching series (`TS.MRANGE` / `TS.MREVRANGE`)
    pub async fn mrange(&self, cmd: MRangeCommand) -> QueryResult<Vec<TimeSeries>, T::Error> {
        self.execute(&cmd).await
    }

    /// Last sample of one series
    pub async fn get(&self, key: impl Into<String>) -> QueryResult<DataPoint, T::Error> {
        self.execute(&GetCommand::new(key)).await
    }

    /// Last sample of every matching series
    pub async fn mget(&self, cmd: MGetCommand) -> QueryResult<Vec<LastDatapoint>, T::Error> {
        self.execute(&cmd).await
    }
}
