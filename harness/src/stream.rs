//! Paginated, timestamp-filtered consumption of the downstream stream.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::clients::StreamClient;
use crate::error::HarnessResult;
use crate::retry::RetryPolicy;
use crate::types::{IteratorPosition, StreamRecord};

/// Page size for partition reads.
const PAGE_LIMIT: usize = 50;

/// Collects records that arrived on the stream after `since`.
///
/// Resolves the stream's single partition, obtains a cursor at the oldest
/// retained record, then pages forward, keeping only records whose arrival
/// timestamp is strictly greater than `since` (this excludes events left over
/// from a prior run against the same long-lived stream). The loop stops once
/// the accumulated count reaches `expected_count`, the cursor exhausts, or the
/// policy's attempt budget is spent, whichever comes first, pausing the policy
/// interval between insufficient pages to await new data. The budget matters
/// on open partitions, which always hand back a follow-up cursor.
///
/// This is deliberately not expressed through [`crate::retry::retry`]: it
/// aggregates across pages instead of retrying a single idempotent check.
///
/// The returned sequence contains at least every qualifying record observed up
/// to the point the loop stops; it is not a snapshot-consistent read. A short
/// count at cursor exhaustion is logged as a warning, not raised.
pub async fn collect_events<L>(
    client: &L,
    policy: RetryPolicy,
    stream: &str,
    expected_count: usize,
    since: DateTime<Utc>,
) -> HarnessResult<Vec<StreamRecord>>
where
    L: StreamClient,
{
    info!(stream = %stream, expected = expected_count, since = %since, "collecting stream events");

    let shard = client.resolve_shard(stream).await?;
    let mut cursor = Some(
        client
            .shard_iterator(stream, &shard, IteratorPosition::TrimHorizon)
            .await?,
    );

    let mut collected: Vec<StreamRecord> = Vec::new();
    let mut attempts: u32 = 0;
    while let Some(current) = cursor {
        let page = client.read_records(&current, PAGE_LIMIT).await?;
        collected.extend(page.records.into_iter().filter(|record| record.arrival > since));

        if collected.len() >= expected_count {
            break;
        }

        cursor = page.next;
        if cursor.is_some() {
            if attempts >= policy.max_attempts {
                break;
            }
            attempts += 1;

            debug!(
                attempt = attempts,
                found = collected.len(),
                expected = expected_count,
                "not enough events yet, pausing before next page"
            );
            tokio::time::sleep(policy.interval).await;
        }
    }

    if collected.len() < expected_count {
        warn!(
            received = collected.len(),
            expected = expected_count,
            "stopped before the expected event count was reached"
        );
    } else {
        info!(received = collected.len(), "stream events collected");
    }

    Ok(collected)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;
    use chrono::TimeDelta;

    use super::*;
    use crate::clients::memory::MemoryPipeline;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(10, Duration::from_millis(1))
    }

    async fn stream_with_records(count: usize, arrival: DateTime<Utc>) -> MemoryPipeline {
        let pipeline = MemoryPipeline::new();
        pipeline.register_stream("stream").await;
        for i in 0..count {
            pipeline
                .append_record("k", Bytes::from(format!("r{i}")), arrival)
                .await;
        }
        pipeline
    }

    #[tokio::test]
    async fn records_at_or_before_the_floor_are_excluded() {
        let since = Utc::now();
        let pipeline = MemoryPipeline::new();
        pipeline.register_stream("stream").await;

        pipeline
            .append_record("k", Bytes::from("old"), since - TimeDelta::seconds(5))
            .await;
        pipeline.append_record("k", Bytes::from("exact"), since).await;
        pipeline
            .append_record("k", Bytes::from("new"), since + TimeDelta::seconds(5))
            .await;
        pipeline.close_shard().await;

        let records = collect_events(&pipeline, fast_policy(), "stream", 3, since)
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data, Bytes::from("new"));
    }

    #[tokio::test]
    async fn collection_stops_early_once_the_expected_count_is_reached() {
        let since = Utc::now() - TimeDelta::seconds(10);
        // 120 qualifying records over three pages; the target is reached after
        // the first page, so the remaining pages are never fetched.
        let pipeline = stream_with_records(120, Utc::now()).await;

        let records = collect_events(&pipeline, fast_policy(), "stream", 10, since)
            .await
            .unwrap();

        assert_eq!(records.len(), 50);
    }

    #[tokio::test]
    async fn exhausted_shard_yields_a_short_count_without_error() {
        let since = Utc::now() - TimeDelta::seconds(10);
        let pipeline = stream_with_records(4, Utc::now()).await;
        pipeline.close_shard().await;

        let records = collect_events(&pipeline, fast_policy(), "stream", 16, since)
            .await
            .unwrap();

        assert_eq!(records.len(), 4);
    }

    #[tokio::test]
    async fn open_shard_without_enough_events_stops_at_the_attempt_budget() {
        let since = Utc::now() - TimeDelta::seconds(10);
        // The shard stays open, so every page yields a follow-up cursor.
        let pipeline = stream_with_records(2, Utc::now()).await;

        let records = collect_events(
            &pipeline,
            RetryPolicy::new(3, Duration::from_millis(1)),
            "stream",
            16,
            since,
        )
        .await
        .unwrap();

        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn arn_valued_stream_identifiers_pass_through_verbatim() {
        // Deployments export the stream identifier as an ARN; the collector
        // must hand it to the client untouched rather than deriving a name.
        let arn = "arn:aws:kinesis:us-east-1:123456789012:stream/verification";
        let since = Utc::now() - TimeDelta::seconds(10);

        let pipeline = MemoryPipeline::new();
        pipeline.register_stream(arn).await;
        pipeline.append_record("k", Bytes::from("r0"), Utc::now()).await;

        let records = collect_events(&pipeline, fast_policy(), arn, 1, since)
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn unknown_stream_is_an_error() {
        let pipeline = MemoryPipeline::new();

        let result = collect_events(&pipeline, fast_policy(), "missing", 1, Utc::now()).await;

        assert!(result.is_err());
    }
}
