//! Dedupe-sync: check a record's natural key, write only when it is absent.
//!
//! The check and the write are two separate store calls. Two tasks on the
//! same key can both see "absent" and both write; stores that need a hard
//! guarantee enforce it with a unique key of their own.

use std::future::Future;

use setinsider_common::ScrapeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Written,
    SkippedDuplicate,
}

/// One existence check, then at most one write. No retries.
///
/// Store failures from either step come back as `ScrapeError::Persistence`.
pub async fn sync_if_absent<R, K, KeyOf, Exists, ExistsFut, Write, WriteFut>(
    record: R,
    key_of: KeyOf,
    exists: Exists,
    write: Write,
) -> Result<SyncOutcome, ScrapeError>
where
    KeyOf: FnOnce(&R) -> K,
    Exists: FnOnce(K) -> ExistsFut,
    ExistsFut: Future<Output = anyhow::Result<bool>>,
    Write: FnOnce(R) -> WriteFut,
    WriteFut: Future<Output = anyhow::Result<()>>,
{
    let key = key_of(&record);

    if exists(key).await.map_err(ScrapeError::persistence)? {
        return Ok(SyncOutcome::SkippedDuplicate);
    }

    write(record).await.map_err(ScrapeError::persistence)?;
    Ok(SyncOutcome::Written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn writes_when_key_is_absent() {
        let writes = AtomicUsize::new(0);
        let counter = &writes;

        let outcome = sync_if_absent(
            "row",
            |r| r.to_string(),
            |_key| async { Ok::<_, anyhow::Error>(false) },
            |_record| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(())
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome, SyncOutcome::Written);
        assert_eq!(writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn existing_key_never_writes() {
        let writes = AtomicUsize::new(0);
        let counter = &writes;

        let outcome = sync_if_absent(
            "row",
            |r| r.to_string(),
            |_key| async { Ok::<_, anyhow::Error>(true) },
            |_record| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(())
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome, SyncOutcome::SkippedDuplicate);
        assert_eq!(writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exists_check_receives_the_extracted_key() {
        let outcome = sync_if_absent(
            ("PTT", "2021/03/05"),
            |r| format!("{}|{}", r.0, r.1),
            |key: String| async move { Ok::<_, anyhow::Error>(key == "PTT|2021/03/05") },
            |_record| async { Ok::<_, anyhow::Error>(()) },
        )
        .await
        .unwrap();

        assert_eq!(outcome, SyncOutcome::SkippedDuplicate);
    }

    #[tokio::test]
    async fn failed_check_is_a_persistence_error_and_skips_write() {
        let writes = AtomicUsize::new(0);
        let counter = &writes;

        let err = sync_if_absent(
            "row",
            |r| r.to_string(),
            |_key| async { Err::<bool, _>(anyhow::anyhow!("connection reset")) },
            |_record| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(())
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ScrapeError::Persistence(ref m) if m.contains("connection reset")));
        assert_eq!(writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_write_is_a_persistence_error() {
        let err = sync_if_absent(
            "row",
            |r| r.to_string(),
            |_key| async { Ok::<_, anyhow::Error>(false) },
            |_record| async { Err::<(), _>(anyhow::anyhow!("disk full")) },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ScrapeError::Persistence(_)));
    }
}
