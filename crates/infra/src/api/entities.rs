//! Entity endpoints: `/entities/{entity}`

use njuns_core::{QueryParams, RequestError, RequestOptions, Route};
use njuns_domain::{validate_limit, Entity, EntityOptions, ListOptions, SearchCondition, SearchOptions};
use serde_json::{json, Map, Value};
use tracing::instrument;

use super::client::{identifier, NjunsClient};

impl NjunsClient {
    /// List instances of `entity`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` before any I/O for a bad entity name or a limit
    /// above 50, otherwise the request's error.
    #[instrument(skip(self, options))]
    pub async fn fetch_entities(
        &self,
        entity: &str,
        options: &ListOptions,
    ) -> Result<Vec<Entity>, RequestError> {
        options.validate()?;
        let route = Route::get("/entities/{entity}")
            .param("entity", identifier("entity", entity)?)
            .query(list_query(options));
        self.engine().execute_json(&route, RequestOptions::default()).await
    }

    /// Load one instance of `entity` by id.
    ///
    /// # Errors
    ///
    /// `NotFound` when no such instance exists.
    #[instrument(skip(self, options))]
    pub async fn fetch_entity(
        &self,
        entity: &str,
        id: &str,
        options: &EntityOptions,
    ) -> Result<Entity, RequestError> {
        if id.trim().is_empty() {
            return Err(RequestError::InvalidArgument("entity id must not be empty".to_string()));
        }
        let query = QueryParams::new()
            .text("view", options.view.as_deref())
            .opt("dynamicAttributes", options.dynamic_attributes);
        let route = Route::get("/entities/{entity}/{id}")
            .param("entity", identifier("entity", entity)?)
            .param("id", id)
            .query(query);
        self.engine().execute_json(&route, RequestOptions::default()).await
    }

    /// Search `entity` with a condition tree.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` before any I/O for an invalid condition or a limit
    /// above 50.
    #[instrument(skip(self, conditions, options), fields(conditions = conditions.len()))]
    pub async fn search_entities(
        &self,
        entity: &str,
        conditions: &[SearchCondition],
        options: &SearchOptions,
    ) -> Result<Vec<Entity>, RequestError> {
        validate_limit(options.limit)?;
        conditions.iter().try_for_each(SearchCondition::validate)?;

        let route = Route::post("/entities/{entity}/search")
            .param("entity", identifier("entity", entity)?);
        let body = search_body(conditions, options);
        self.engine().execute_json(&route, RequestOptions::json(body)).await
    }

    /// Create an instance of `entity`; returns the server's rendition.
    ///
    /// # Errors
    ///
    /// Any [`RequestError`] from the request.
    #[instrument(skip(self, value))]
    pub async fn create_entity(&self, entity: &str, value: &Entity) -> Result<Value, RequestError> {
        let route =
            Route::post("/entities/{entity}").param("entity", identifier("entity", entity)?);
        let body = self.engine().execute(&route, RequestOptions::json(value.to_json())).await?;
        Ok(body.into_json())
    }
}

fn list_query(options: &ListOptions) -> QueryParams {
    QueryParams::new()
        .opt("limit", options.limit)
        .opt("offset", options.offset)
        .text("view", options.view.as_deref())
        .text("sort", options.sort.as_deref())
        .opt("returnNulls", options.return_nulls)
        .opt("returnCount", options.return_count)
        .opt("dynamicAttributes", options.dynamic_attributes)
}

fn search_body(conditions: &[SearchCondition], options: &SearchOptions) -> Value {
    let mut body = Map::new();
    body.insert("filter".to_string(), json!({ "conditions": conditions }));

    let optional = [
        ("limit", options.limit.map(Value::from)),
        ("offset", options.offset.map(Value::from)),
        ("view", options.view.clone().map(Value::from)),
        ("sort", options.sort.clone().map(Value::from)),
        ("nulls", options.return_nulls.map(Value::from)),
        ("count", options.return_count.map(Value::from)),
        ("dynamicAttributes", options.dynamic_attributes.map(Value::from)),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            body.insert(key.to_string(), value);
        }
    }
    Value::Object(body)
}
