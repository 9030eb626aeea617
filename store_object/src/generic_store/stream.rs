//! Push-style row streaming
//!
//! A producer task runs the select and forwards rows over a bounded channel
//! as they arrive from the wire. A slow consumer fills the channel and the
//! producer waits; rows are never dropped.

use futures::{Stream, TryStreamExt};
use sqlx::{Postgres, QueryBuilder, Row as _};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

use super::core::GenericStore;
use crate::errors::StoreError;
use crate::query_builder::COUNT_COLUMN;
use crate::trace_log;
use crate::traits::{Backing, Entity};

/// One event of a row stream
#[derive(Debug)]
pub enum StreamEvent<T> {
    /// Total number of matching rows, always the first event
    Count(i64),
    Data(T),
    End,
    /// Terminal; no `End` follows
    Error(StoreError),
}

impl<T> StreamEvent<T> {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::End | StreamEvent::Error(_))
    }
}

/// Receiving half of a row stream
#[derive(Debug)]
pub struct RowStream<T> {
    receiver: mpsc::Receiver<StreamEvent<T>>,
}

impl<T: Entity> RowStream<T> {
    pub(crate) fn spawn<B: Backing>(
        store: GenericStore<T, B>,
        qb: QueryBuilder<'static, Postgres>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(store.defaults.stream_buffer.max(1));

        tokio::spawn(async move {
            let name = store.relation.name.clone();
            if let Err(error) = produce(&store, qb, &sender).await {
                tracing::error!("stream over {} failed: {}", name, error);
                let _ = sender.send(StreamEvent::Error(error)).await;
            }
        });

        Self { receiver }
    }
}

impl<T> RowStream<T> {
    /// Next event, `None` once the producer has finished
    pub async fn recv(&mut self) -> Option<StreamEvent<T>> {
        self.receiver.recv().await
    }
}

impl<T> Stream for RowStream<T> {
    type Item = StreamEvent<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Runs the select and forwards events; returns early when the consumer
/// has gone away
async fn produce<T: Entity, B: Backing>(
    store: &GenericStore<T, B>,
    mut qb: QueryBuilder<'static, Postgres>,
    sender: &mpsc::Sender<StreamEvent<T>>,
) -> Result<(), StoreError> {
    let name = store.relation.name.as_str();
    let mut rows = qb.build().fetch(&store.db_pool);
    let mut counted = false;
    #[cfg(feature = "debug-logging")]
    let mut sent: u64 = 0;

    while let Some(row) = rows
        .try_next()
        .await
        .map_err(|e| StoreError::database_operation(name, "stream", e))?
    {
        if !counted {
            let total: i64 = row
                .try_get(COUNT_COLUMN)
                .map_err(|e| StoreError::database_operation(name, "stream", e))?;
            if sender.send(StreamEvent::Count(total)).await.is_err() {
                return Ok(());
            }
            counted = true;
        }

        let entity = store.decode(&row)?;
        if sender.send(StreamEvent::Data(entity)).await.is_err() {
            trace_log!("[STREAM] consumer of {} dropped after {} rows", name, sent);
            return Ok(());
        }
        #[cfg(feature = "debug-logging")]
        {
            sent += 1;
        }
    }

    if !counted && sender.send(StreamEvent::Count(0)).await.is_err() {
        return Ok(());
    }
    trace_log!("[STREAM] {} finished after {} rows", name, sent);
    let _ = sender.send(StreamEvent::End).await;
    Ok(())
}
