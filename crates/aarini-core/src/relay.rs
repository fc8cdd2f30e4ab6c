//! Mapping of upstream fragment streams to relay records.

use futures_util::{Stream, StreamExt};

use aarini_types::llm::{LlmError, StreamFragment};
use aarini_types::relay::{RelayFailure, RelayRecord};

/// Turn upstream fragments into relay records.
///
/// Empty fragments are dropped. An upstream error becomes a single error
/// record, after which the stream ends.
pub fn relay_records<S>(fragments: S) -> impl Stream<Item = RelayRecord> + Send + 'static
where
    S: Stream<Item = Result<StreamFragment, LlmError>> + Send + 'static,
{
    async_stream::stream! {
        let mut fragments = Box::pin(fragments);
        let mut sent = 0usize;
        while let Some(item) = fragments.next().await {
            match item {
                Ok(fragment) => {
                    if let Some(record) = RelayRecord::from_fragment(fragment) {
                        sent += 1;
                        yield record;
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, records = sent, "Relaying upstream failure");
                    yield RelayRecord::failure(RelayFailure::from_error(&err));
                    break;
                }
            }
        }
        tracing::debug!(records = sent, "Relay stream closed");
    }
}
