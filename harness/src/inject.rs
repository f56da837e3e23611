//! Injection of sample payloads into the source object store.

use bytes::Bytes;
use tracing::info;

use crate::clients::ObjectStoreClient;
use crate::error::HarnessResult;
use crate::types::SourceCredentials;

/// Writes fixture payloads into the source store, simulating upstream writes.
///
/// Keys are computed from the resolved [`SourceCredentials`]: snapshots land
/// directly under the watched folder, change batches under its change-data
/// sub-prefix. Writes are idempotent overwrites with no local bookkeeping.
#[derive(Debug, Clone)]
pub struct SourceInjector<O> {
    store: O,
    credentials: SourceCredentials,
}

impl<O> SourceInjector<O>
where
    O: ObjectStoreClient,
{
    /// Creates an injector over the given store and resolved credentials.
    pub fn new(store: O, credentials: SourceCredentials) -> Self {
        Self { store, credentials }
    }

    /// Writes `content` verbatim at `{bucket_folder}/{relative_path}`.
    pub async fn inject(&self, relative_path: &str, content: impl Into<Bytes>) -> HarnessResult<()> {
        let key = format!("{}/{relative_path}", self.credentials.bucket_folder);
        self.put(&key, content.into()).await
    }

    /// Writes a change-event batch at `{bucket_folder}/{change_data}/{file_name}`.
    pub async fn inject_change_batch(
        &self,
        file_name: &str,
        content: impl Into<Bytes>,
    ) -> HarnessResult<()> {
        let key = format!(
            "{}/{}/{file_name}",
            self.credentials.bucket_folder, self.credentials.change_data
        );
        self.put(&key, content.into()).await
    }

    async fn put(&self, key: &str, body: Bytes) -> HarnessResult<()> {
        info!(
            bucket = %self.credentials.bucket_name,
            key = %key,
            bytes = body.len(),
            "injecting file into source store"
        );

        self.store
            .put_object(&self.credentials.bucket_name, key, body)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::memory::MemoryPipeline;

    fn credentials() -> SourceCredentials {
        SourceCredentials {
            bucket_name: "source".to_string(),
            bucket_folder: "landing".to_string(),
            change_data: "changedata".to_string(),
        }
    }

    #[tokio::test]
    async fn inject_writes_under_the_watched_folder() {
        let pipeline = MemoryPipeline::new();
        let injector = SourceInjector::new(pipeline.clone(), credentials());

        injector
            .inject("hr/employee/LOAD001.csv", "101,Smith")
            .await
            .unwrap();

        let stored = pipeline
            .object("source", "landing/hr/employee/LOAD001.csv")
            .await
            .unwrap();
        assert_eq!(stored, Bytes::from("101,Smith"));
    }

    #[tokio::test]
    async fn change_batches_land_under_the_change_data_prefix() {
        let pipeline = MemoryPipeline::new();
        let injector = SourceInjector::new(pipeline.clone(), credentials());

        injector
            .inject_change_batch("cdc0000000001.csv", "INSERT,employee,hr,1")
            .await
            .unwrap();

        assert!(
            pipeline
                .object("source", "landing/changedata/cdc0000000001.csv")
                .await
                .is_some()
        );
    }

    #[tokio::test]
    async fn inject_overwrites_without_conflict_detection() {
        let pipeline = MemoryPipeline::new();
        let injector = SourceInjector::new(pipeline.clone(), credentials());

        injector.inject("hr/employee/LOAD001.csv", "old").await.unwrap();
        injector.inject("hr/employee/LOAD001.csv", "new").await.unwrap();

        let stored = pipeline
            .object("source", "landing/hr/employee/LOAD001.csv")
            .await
            .unwrap();
        assert_eq!(stored, Bytes::from("new"));
    }
}
