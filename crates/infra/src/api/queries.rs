//! Predefined query endpoints: `/queries/{entity}`

use njuns_core::{QueryParams, RequestError, RequestOptions, Route};
use njuns_domain::constants::DEFAULT_QUERY_LIMIT;
use njuns_domain::{PredefinedQuery, QueryOptions};
use serde_json::Value;
use tracing::instrument;

use super::client::{identifier, NjunsClient};

impl NjunsClient {
    /// Queries registered on the server for `entity`.
    ///
    /// # Errors
    ///
    /// Any [`RequestError`] from the request.
    #[instrument(skip(self))]
    pub async fn fetch_queries(&self, entity: &str) -> Result<Vec<PredefinedQuery>, RequestError> {
        let route = Route::get("/queries/{entity}").param("entity", identifier("entity", entity)?);
        self.engine().execute_json(&route, RequestOptions::default()).await
    }

    /// Run the predefined query `query` of `entity`.
    ///
    /// The limit defaults to 50 when unset.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` before any I/O for a limit above 50.
    #[instrument(skip(self, options))]
    pub async fn execute_query(
        &self,
        entity: &str,
        query: &str,
        options: &QueryOptions,
    ) -> Result<Value, RequestError> {
        options.validate()?;
        let route = Route::get("/queries/{entity}/{query}")
            .param("entity", identifier("entity", entity)?)
            .param("query", identifier("query", query)?)
            .query(query_params(options));
        let body = self.engine().execute(&route, RequestOptions::default()).await?;
        Ok(body.into_json())
    }
}

fn query_params(options: &QueryOptions) -> QueryParams {
    QueryParams::new()
        .with("limit", options.limit.unwrap_or(DEFAULT_QUERY_LIMIT))
        .opt("offset", options.offset)
        .text("view", options.view.as_deref())
        .opt("returnNulls", options.return_nulls)
        .opt("returnCount", options.return_count)
        .opt("dynamicAttributes", options.dynamic_attributes)
}
