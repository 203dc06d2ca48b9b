//! Middleware service endpoints: `/services/{service}/{method}`

use njuns_core::{ParamValue, QueryParams, RequestError, RequestOptions, Route};
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

use super::client::NjunsClient;

const TICKET_SERVICE: &str = "njuns_TicketService";

impl NjunsClient {
    /// Add a posting to a ticket, optionally attaching uploaded files.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown ticket, otherwise the request's error.
    #[instrument(skip(self, comment, file_descriptor_ids), fields(files = file_descriptor_ids.len()))]
    pub async fn post_comment_to_ticket(
        &self,
        ticket_id: Uuid,
        comment: &str,
        file_descriptor_ids: &[Uuid],
        flagged: bool,
    ) -> Result<Value, RequestError> {
        let route = Route::get("/services/{service}/addPosting")
            .param("service", ParamValue::raw(TICKET_SERVICE))
            .query(posting_query(ticket_id, comment, file_descriptor_ids, flagged));
        let body = self.engine().execute(&route, RequestOptions::default()).await?;
        Ok(body.into_json())
    }
}

fn posting_query(ticket_id: Uuid, comment: &str, files: &[Uuid], flagged: bool) -> QueryParams {
    let files = files.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",");
    QueryParams::new()
        .with("ticketId", ticket_id.to_string())
        .text("comment", Some(comment))
        .with("fileDescriptorIds", format!("[{files}]"))
        .with("isFlagged", flagged)
}
