//! Streaming inquirer over the content collection.

use std::time::Duration;

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use futures::StreamExt;
use synd_core::{BoxedError, Stub};
use synd_engine::{Inquirer, Inquiry, STUB_STREAM_CAPACITY};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::model::ContentRecord;
use crate::schema::content;
use crate::{PgClient, Result, TRACING_TARGET_QUERY};

/// The only `can_be_distributed` value that permits export.
const CAN_BE_DISTRIBUTED_YES: &str = "yes";

/// Queries the content collection for export candidates and streams minimal
/// stubs to the worker pool.
///
/// A record matches when its type is allowed, it has a text or XML body, it
/// is not explicitly marked non-distributable, and, when a publication
/// allow-list is configured, it carries at least one allowed publication or
/// none at all.
pub struct PgInquirer {
    client: PgClient,
    allowed_content_types: Vec<String>,
    allowed_publications: Vec<String>,
}

impl PgInquirer {
    pub fn new(
        client: PgClient,
        allowed_content_types: Vec<String>,
        allowed_publications: Vec<String>,
    ) -> Self {
        Self {
            client,
            allowed_content_types,
            allowed_publications,
        }
    }

    /// Counts the matching records, then spawns a producer task that
    /// streams them as stubs into a small channel. The producer stops at
    /// `timeout`, when the receiver is dropped, or when the cursor is
    /// exhausted; the pooled connection is released either way.
    pub async fn inquire(&self, timeout: Duration, candidates: Vec<String>) -> Result<Inquiry> {
        // A targeted request keeps its candidate filter even if every id
        // fails to parse; it must never widen into a full scan.
        let candidates = (!candidates.is_empty()).then(|| parse_candidates(&candidates));

        let count = {
            let mut conn = self.client.conn().await?;
            filtered_query(
                self.allowed_content_types.clone(),
                self.allowed_publications.clone(),
                candidates.clone(),
            )
            .count()
            .get_result::<i64>(&mut conn)
            .await? as usize
        };

        tracing::info!(target: TRACING_TARGET_QUERY, count, "Content inquiry matched documents");

        let (tx, rx) = mpsc::channel(STUB_STREAM_CAPACITY);
        let conn = self.client.conn().await?;
        tokio::spawn(stream_documents(
            conn,
            self.allowed_content_types.clone(),
            self.allowed_publications.clone(),
            candidates,
            timeout,
            tx,
        ));

        Ok(Inquiry { stubs: rx, count })
    }
}

#[async_trait]
impl Inquirer for PgInquirer {
    async fn inquire(
        &self,
        timeout: Duration,
        candidates: Vec<String>,
    ) -> Result<Inquiry, BoxedError> {
        PgInquirer::inquire(self, timeout, candidates)
            .await
            .map_err(BoxedError::from)
    }
}

/// Builds the shared match predicate used by both the count and the scan.
fn filtered_query(
    allowed_content_types: Vec<String>,
    allowed_publications: Vec<String>,
    candidates: Option<Vec<Uuid>>,
) -> content::BoxedQuery<'static, Pg> {
    let mut query = content::table.into_boxed();

    query = query.filter(
        content::can_be_distributed
            .eq(CAN_BE_DISTRIBUTED_YES)
            .or(content::can_be_distributed.is_null()),
    );
    query = query.filter(content::content_type.eq_any(allowed_content_types));
    query = query.filter(content::body.is_not_null().or(content::body_xml.is_not_null()));

    if !allowed_publications.is_empty() {
        query = query.filter(
            content::publication
                .overlaps_with(allowed_publications)
                .or(content::publication.is_null()),
        );
    }
    if let Some(candidates) = candidates {
        query = query.filter(content::uuid.eq_any(candidates));
    }

    query
}

async fn stream_documents(
    mut conn: crate::PooledConnection,
    allowed_content_types: Vec<String>,
    allowed_publications: Vec<String>,
    candidates: Option<Vec<Uuid>>,
    timeout: Duration,
    tx: mpsc::Sender<Stub>,
) {
    let query = filtered_query(allowed_content_types, allowed_publications, candidates)
        .select(ContentRecord::as_select());

    let stream = match query.load_stream::<ContentRecord>(&mut conn).await {
        Ok(stream) => stream,
        Err(err) => {
            tracing::error!(
                target: TRACING_TARGET_QUERY,
                error = %err,
                "Failed to open content cursor"
            );
            return;
        }
    };
    futures::pin_mut!(stream);

    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    let mut processed = 0usize;
    loop {
        tokio::select! {
            () = &mut deadline => {
                tracing::warn!(
                    target: TRACING_TARGET_QUERY,
                    processed,
                    "Content inquiry timed out, closing cursor"
                );
                break;
            }
            next = stream.next() => match next {
                Some(Ok(record)) => {
                    processed += 1;
                    if tx.send(record.into_stub()).await.is_err() {
                        // Receiver gone: the job was abandoned.
                        break;
                    }
                }
                Some(Err(err)) => {
                    tracing::warn!(
                        target: TRACING_TARGET_QUERY,
                        error = %err,
                        "Failed to decode document"
                    );
                }
                None => break,
            }
        }
    }

    tracing::info!(target: TRACING_TARGET_QUERY, processed, "Processed documents");
}

fn parse_candidates(candidates: &[String]) -> Vec<Uuid> {
    candidates
        .iter()
        .filter_map(|candidate| {
            let trimmed = candidate.trim();
            if trimmed.is_empty() {
                return None;
            }
            match Uuid::parse_str(trimmed) {
                Ok(uuid) => Some(uuid),
                Err(_) => {
                    tracing::warn!(
                        target: TRACING_TARGET_QUERY,
                        candidate = trimmed,
                        "Skipping candidate that is not a UUID"
                    );
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_candidates_keeps_only_valid_uuids() {
        let parsed = parse_candidates(&[
            "811e0591-5c71-4457-b8eb-8c22cf093117".to_string(),
            " 9d5b4a32-0000-4f78-af02-9f680097cfd6 ".to_string(),
            "a-b".to_string(),
            String::new(),
        ]);
        assert_eq!(
            parsed,
            vec![
                Uuid::parse_str("811e0591-5c71-4457-b8eb-8c22cf093117").unwrap(),
                Uuid::parse_str("9d5b4a32-0000-4f78-af02-9f680097cfd6").unwrap(),
            ]
        );
    }

    #[test]
    fn predicate_includes_every_configured_filter() {
        let query = filtered_query(
            vec!["Article".to_string()],
            vec!["88fdde6c-2aa4-4f78-af02-9f680097cfd6".to_string()],
            Some(vec![Uuid::nil()]),
        );
        let sql = diesel::debug_query::<Pg, _>(&query).to_string();

        assert!(sql.contains("can_be_distributed"));
        assert!(sql.contains("content_type"));
        assert!(sql.contains("body"));
        assert!(sql.contains("body_xml"));
        assert!(sql.contains("publication"));
        assert!(sql.contains("uuid"));
        assert!(sql.contains("&&"), "expected an array overlap test: {sql}");
        assert!(sql.contains("IS NULL"));
    }

    #[test]
    fn full_scan_omits_candidate_and_publication_filters() {
        let query = filtered_query(vec!["Article".to_string()], Vec::new(), None);
        let sql = diesel::debug_query::<Pg, _>(&query).to_string();

        assert!(!sql.contains("&&"));
        assert!(sql.contains("content_type"));
    }
}
