//! Command execution
//!
//! Every command logs in first and closes the client before returning,
//! whether or not the command succeeded.

use anyhow::{Context, Result};
use njuns_domain::{
    EntityOptions, EnvironmentKind, ListOptions, QueryOptions, SearchCondition, SearchOptions,
};
use njuns_infra::{config, NjunsClient};
use serde_json::Value;
use tracing::info;

use crate::args::{Cli, Command};

/// Log in, run the selected subcommand and print its JSON result.
pub async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => config::load_from_file(Some(path.clone()))?,
        None => config::load_or_default()?,
    };
    if cli.uat {
        config.environment = EnvironmentKind::Uat;
    }

    let client = NjunsClient::new(config)?;
    let result = execute(&client, &cli).await;
    client.close().await;

    let output = result?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn execute(client: &NjunsClient, cli: &Cli) -> Result<Value> {
    let user = client.login(&cli.username, &cli.password).await.context("login failed")?;
    info!(login = user.login.as_deref().unwrap_or_default(), "logged in");

    let output = match &cli.command {
        Command::UserInfo => serde_json::to_value(user)?,
        Command::Entities { entity, view, limit, offset, sort } => {
            let options = ListOptions {
                view: view.clone(),
                limit: *limit,
                offset: *offset,
                sort: sort.clone(),
                ..ListOptions::default()
            };
            serde_json::to_value(client.fetch_entities(entity, &options).await?)?
        }
        Command::Entity { entity, id, view } => {
            let options = EntityOptions { view: view.clone(), ..EntityOptions::default() };
            serde_json::to_value(client.fetch_entity(entity, id, &options).await?)?
        }
        Command::Search { entity, filter, view, limit } => {
            let conditions = parse_filter(filter)?;
            let options =
                SearchOptions { view: view.clone(), limit: *limit, ..SearchOptions::default() };
            serde_json::to_value(client.search_entities(entity, &conditions, &options).await?)?
        }
        Command::Queries { entity } => serde_json::to_value(client.fetch_queries(entity).await?)?,
        Command::Query { entity, name, limit, offset, view } => {
            let options = QueryOptions {
                limit: *limit,
                offset: *offset,
                view: view.clone(),
                ..QueryOptions::default()
            };
            client.execute_query(entity, name, &options).await?
        }
        Command::PostComment { ticket_id, comment, files, flagged } => {
            client.post_comment_to_ticket(*ticket_id, comment, files, *flagged).await?
        }
    };
    Ok(output)
}

/// Accept either one condition object or an array of them.
fn parse_filter(filter: &str) -> Result<Vec<SearchCondition>> {
    let value: Value = serde_json::from_str(filter).context("filter is not valid JSON")?;
    let conditions = match value {
        Value::Array(_) => serde_json::from_value(value)?,
        other => vec![serde_json::from_value(other)?],
    };
    Ok(conditions)
}
