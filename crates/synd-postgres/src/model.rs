//! Projection of a content record into an export stub.

use diesel::prelude::*;
use synd_core::{DEFAULT_DATE, Stub};
use time::OffsetDateTime;
use uuid::Uuid;

/// The inquirer's projection: identity plus the two publish dates.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = crate::schema::content)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ContentRecord {
    pub uuid: Uuid,
    pub first_published_date: Option<OffsetDateTime>,
    pub published_date: Option<OffsetDateTime>,
}

impl ContentRecord {
    /// Collapses the record to the stub the worker pool exports.
    pub fn into_stub(self) -> Stub {
        Stub {
            uuid: self.uuid.to_string(),
            date: export_date(self.first_published_date, self.published_date),
            ..Stub::default()
        }
    }
}

fn export_date(first: Option<OffsetDateTime>, published: Option<OffsetDateTime>) -> String {
    match first.or(published) {
        Some(datetime) => format!(
            "{:04}-{:02}-{:02}",
            datetime.year(),
            u8::from(datetime.month()),
            datetime.day()
        ),
        None => DEFAULT_DATE.to_string(),
    }
}
