//! Diesel schema for the content collection.

diesel::table! {
    /// Newsroom content records as landed by the ingestion pipeline.
    content (uuid) {
        uuid -> Uuid,
        content_type -> Nullable<Text>,
        body -> Nullable<Text>,
        body_xml -> Nullable<Text>,
        can_be_distributed -> Nullable<Text>,
        publication -> Nullable<Array<Text>>,
        first_published_date -> Nullable<Timestamptz>,
        published_date -> Nullable<Timestamptz>,
    }
}
