//! Pure mapping of publication events into export notifications.

use std::collections::HashSet;

use regex::Regex;
use serde::Deserialize;
use synd_core::{Stub, Terminator, date_or_default};

use crate::consumer::PublicationMessage;
use crate::notification::{EventType, Notification};

/// Transaction-id prefix marking synthetic monitoring publications.
const SYNTHETIC_TID_PREFIX: &str = "SYNTH";

/// The only `canBeDistributed` value that permits export.
const CAN_BE_DISTRIBUTED_YES: &str = "yes";

/// Strict UUID shape required inside a content URI.
const UUID_PATTERN: &str =
    "[a-fA-F0-9]{8}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{12}";

/// An expected skip: the event is valid but not exportable. Logged at info.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("synthetic publication")]
    SyntheticPublication,

    #[error("contentUri {uri} is not in the origin allowlist")]
    OriginNotAllowed { uri: String },

    #[error("content type {content_type} is not exportable")]
    TypeNotAllowed { content_type: String },

    #[error("unsupported publication")]
    UnsupportedPublication,

    #[error("content cannot be distributed")]
    NotDistributable,
}

/// A mapping failure: the event could not be understood. Logged at warn.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("decoding publication event: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("contentUri does not contain a UUID")]
    MissingUuid,
}

impl MapError {
    /// Whether this rejection is an expected filter skip rather than a
    /// malformed event.
    pub fn is_filter(&self) -> bool {
        matches!(self, MapError::Filter(_))
    }
}

/// Wire envelope of one publication event.
#[derive(Debug, Deserialize)]
struct PublicationEvent {
    #[serde(rename = "ContentURI", default)]
    content_uri: String,
    #[serde(rename = "Payload", default)]
    payload: PublicationPayload,
}

/// Recognized payload fields; everything else on the wire is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PublicationPayload {
    #[serde(rename = "type")]
    content_type: String,
    deleted: bool,
    can_be_distributed: Option<String>,
    publication: Vec<String>,
    first_published_date: Option<String>,
    published_date: Option<String>,
}

/// Maps raw publication messages into [`Notification`]s, applying the
/// filter chain in a fixed order: synthetic tid, envelope decode, origin
/// allow-list, UUID extraction, event type, content-type allow-list,
/// publication allow-list, distributability. The first violated rule wins.
///
/// Mapping is a pure function of the message and this configuration.
pub struct MessageMapper {
    origin_allowlist: Regex,
    uuid_regex: Regex,
    allowed_content_types: HashSet<String>,
    allowed_publications: HashSet<String>,
}

impl MessageMapper {
    pub fn new(
        origin_allowlist: Regex,
        allowed_content_types: impl IntoIterator<Item = String>,
        allowed_publications: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            origin_allowlist,
            uuid_regex: Regex::new(UUID_PATTERN).expect("UUID pattern is valid"),
            allowed_content_types: allowed_content_types.into_iter().collect(),
            allowed_publications: allowed_publications.into_iter().collect(),
        }
    }

    pub fn map_notification(&self, msg: &PublicationMessage) -> Result<Notification, MapError> {
        if msg.tid.starts_with(SYNTHETIC_TID_PREFIX) {
            return Err(FilterError::SyntheticPublication.into());
        }

        let event: PublicationEvent = serde_json::from_slice(&msg.body)?;

        if !self.origin_allowlist.is_match(&event.content_uri) {
            return Err(FilterError::OriginNotAllowed {
                uri: event.content_uri,
            }
            .into());
        }

        let uuid = self
            .uuid_regex
            .find(&event.content_uri)
            .map(|found| found.as_str().to_string())
            .ok_or(MapError::MissingUuid)?;

        let payload = event.payload;
        let ev_type = if payload.deleted {
            EventType::Delete
        } else {
            EventType::Update
        };

        if !self.allowed_content_types.contains(&payload.content_type) {
            return Err(FilterError::TypeNotAllowed {
                content_type: payload.content_type,
            }
            .into());
        }

        // An event without publications bypasses the publication allow-list.
        if !self.allowed_publications.is_empty()
            && !payload.publication.is_empty()
            && !payload
                .publication
                .iter()
                .any(|publication| self.allowed_publications.contains(publication))
        {
            return Err(FilterError::UnsupportedPublication.into());
        }

        if let Some(can_be_distributed) = &payload.can_be_distributed
            && can_be_distributed != CAN_BE_DISTRIBUTED_YES
        {
            return Err(FilterError::NotDistributable.into());
        }

        let date = date_or_default(
            payload.first_published_date.as_deref(),
            payload.published_date.as_deref(),
        );

        // Distribution markers only matter for content that still exists.
        let can_be_distributed = match ev_type {
            EventType::Update => payload.can_be_distributed,
            EventType::Delete => None,
        };

        Ok(Notification {
            stub: Stub {
                uuid,
                date,
                content_type: payload.content_type,
                can_be_distributed,
                publication: payload.publication,
            },
            ev_type,
            tid: msg.tid.clone(),
            terminator: Terminator::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const CONTENT_URI: &str =
        "http://upp-content-validator.svc.ft.com/content/811e0591-5c71-4457-b8eb-8c22cf093117";
    const UUID: &str = "811e0591-5c71-4457-b8eb-8c22cf093117";

    fn mapper() -> MessageMapper {
        MessageMapper::new(
            Regex::new(r"^http://.*-content-validator\.svc\.ft\.com(:\d{2,5})?/content/[\w-]+.*$")
                .unwrap(),
            ["Article".to_string()],
            [],
        )
    }

    fn mapper_with_publications(allowed: &[&str]) -> MessageMapper {
        MessageMapper::new(
            Regex::new(r"^http://.*-content-validator\.svc\.ft\.com(:\d{2,5})?/content/[\w-]+.*$")
                .unwrap(),
            ["Article".to_string()],
            allowed.iter().map(|s| s.to_string()),
        )
    }

    fn message(tid: &str, content_uri: &str, payload: serde_json::Value) -> PublicationMessage {
        let body = serde_json::to_vec(&json!({
            "ContentURI": content_uri,
            "Payload": payload,
        }))
        .unwrap();
        PublicationMessage::new(tid, body)
    }

    #[test]
    fn synthetic_transaction_id_is_filtered_first() {
        let msg = message("SYNTH_REQ_MON1", CONTENT_URI, json!({"type": "Article"}));
        let err = mapper().map_notification(&msg).unwrap_err();
        assert!(matches!(
            err,
            MapError::Filter(FilterError::SyntheticPublication)
        ));
        assert!(err.is_filter());
    }

    #[test]
    fn unparseable_body_is_a_mapping_error() {
        let msg = PublicationMessage::new("tid_1234", "unmarshallable");
        let err = mapper().map_notification(&msg).unwrap_err();
        assert!(matches!(err, MapError::Decode(_)));
        assert!(!err.is_filter());
    }

    #[test]
    fn array_payload_is_a_mapping_error() {
        let msg = message("tid_1234", CONTENT_URI, json!(["type", "Article"]));
        let err = mapper().map_notification(&msg).unwrap_err();
        assert!(matches!(err, MapError::Decode(_)));
    }

    #[test]
    fn uri_outside_origin_allowlist_is_filtered() {
        let msg = message(
            "tid_1234",
            "http://unknown-origin.example.com/content/811e0591-5c71-4457-b8eb-8c22cf093117",
            json!({"type": "Article"}),
        );
        let err = mapper().map_notification(&msg).unwrap_err();
        assert!(matches!(
            err,
            MapError::Filter(FilterError::OriginNotAllowed { .. })
        ));
    }

    #[test]
    fn uri_without_uuid_is_a_mapping_error() {
        let msg = message(
            "tid_1234",
            "http://upp-content-validator.svc.ft.com/content/invalidUUID",
            json!({"type": "Article"}),
        );
        let err = mapper().map_notification(&msg).unwrap_err();
        assert!(matches!(err, MapError::MissingUuid));
    }

    #[test]
    fn disallowed_content_type_is_filtered() {
        let msg = message("tid_1234", CONTENT_URI, json!({"type": "LiveBlogPackage"}));
        let err = mapper().map_notification(&msg).unwrap_err();
        assert!(matches!(
            err,
            MapError::Filter(FilterError::TypeNotAllowed { .. })
        ));
    }

    #[test]
    fn missing_content_type_is_filtered() {
        let msg = message("tid_1234", CONTENT_URI, json!({}));
        let err = mapper().map_notification(&msg).unwrap_err();
        assert!(matches!(
            err,
            MapError::Filter(FilterError::TypeNotAllowed { .. })
        ));
    }

    #[test]
    fn unsupported_publication_is_filtered() {
        let mapper = mapper_with_publications(&["88fdde6c-2aa4-4f78-af02-9f680097cfd6"]);
        let msg = message(
            "tid_1234",
            CONTENT_URI,
            json!({
                "type": "Article",
                "publication": ["deadbeef-0000-4f78-af02-9f680097cfd6"],
            }),
        );
        let err = mapper.map_notification(&msg).unwrap_err();
        assert!(matches!(
            err,
            MapError::Filter(FilterError::UnsupportedPublication)
        ));
        assert_eq!(err.to_string(), "unsupported publication");
    }

    #[test]
    fn absent_publication_bypasses_the_allowlist() {
        let mapper = mapper_with_publications(&["88fdde6c-2aa4-4f78-af02-9f680097cfd6"]);
        let msg = message("tid_1234", CONTENT_URI, json!({"type": "Article"}));
        let notification = mapper.map_notification(&msg).unwrap();
        assert_eq!(notification.stub.uuid, UUID);
    }

    #[test]
    fn matching_publication_passes_the_allowlist() {
        let mapper = mapper_with_publications(&["88fdde6c-2aa4-4f78-af02-9f680097cfd6"]);
        let msg = message(
            "tid_1234",
            CONTENT_URI,
            json!({
                "type": "Article",
                "publication": ["88fdde6c-2aa4-4f78-af02-9f680097cfd6"],
            }),
        );
        let notification = mapper.map_notification(&msg).unwrap();
        assert_eq!(
            notification.stub.publication,
            vec!["88fdde6c-2aa4-4f78-af02-9f680097cfd6".to_string()]
        );
    }

    #[test]
    fn non_distributable_content_is_filtered() {
        let msg = message(
            "tid_1234",
            CONTENT_URI,
            json!({"type": "Article", "canBeDistributed": "no"}),
        );
        let err = mapper().map_notification(&msg).unwrap_err();
        assert!(matches!(
            err,
            MapError::Filter(FilterError::NotDistributable)
        ));
    }

    #[test]
    fn valid_message_maps_to_update_notification() {
        let msg = message(
            "tid_1234",
            CONTENT_URI,
            json!({"type": "Article", "canBeDistributed": "yes"}),
        );
        let notification = mapper().map_notification(&msg).unwrap();

        assert_eq!(notification.ev_type, EventType::Update);
        assert_eq!(notification.tid, "tid_1234");
        assert_eq!(notification.stub.uuid, UUID);
        assert_eq!(notification.stub.content_type, "Article");
        assert_eq!(notification.stub.can_be_distributed.as_deref(), Some("yes"));
        assert_eq!(notification.stub.date, synd_core::DEFAULT_DATE);
    }

    #[test]
    fn deleted_payload_maps_to_delete_notification() {
        let msg = message(
            "tid_1234",
            CONTENT_URI,
            json!({"type": "Article", "canBeDistributed": "yes", "deleted": true}),
        );
        let notification = mapper().map_notification(&msg).unwrap();

        assert_eq!(notification.ev_type, EventType::Delete);
        assert_eq!(notification.stub.uuid, UUID);
        // The distribution marker is not carried on deletes.
        assert_eq!(notification.stub.can_be_distributed, None);
    }

    #[test]
    fn publish_date_is_truncated_to_day() {
        let msg = message(
            "tid_1234",
            CONTENT_URI,
            json!({
                "type": "Article",
                "firstPublishedDate": "2024-01-17T10:00:00.000Z",
                "publishedDate": "2024-02-01T09:00:00.000Z",
            }),
        );
        let notification = mapper().map_notification(&msg).unwrap();
        assert_eq!(notification.stub.date, "2024-01-17");
    }

    #[test]
    fn mapping_is_deterministic() {
        let msg = message(
            "tid_1234",
            CONTENT_URI,
            json!({"type": "Article", "publication": ["x"]}),
        );
        let mapper = mapper();
        let first = mapper.map_notification(&msg).unwrap();
        let second = mapper.map_notification(&msg).unwrap();
        assert_eq!(first.stub, second.stub);
        assert_eq!(first.ev_type, second.ev_type);
        assert_eq!(first.tid, second.tid);
    }
}
