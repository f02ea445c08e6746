/// Tenant Log Tools

use serde::Deserialize;

use crate::auth0::{Query, Resource};
use crate::core::outcome::Outcome;
use crate::core::registry::{parse, Api, RegistryError, ToolError, ToolRegistry};
use crate::core::schema::{Arguments, Field};

const GET: &[Field] = &[Field::string("id")
    .non_empty()
    .describe("The ID of the log event to retrieve.")];

const GET_ALL: &[Field] = &[
    Field::number("page")
        .optional()
        .describe("Page index of the results to return. First page is 0."),
    Field::number("per_page")
        .optional()
        .describe("Number of results per page. Paging is disabled if parameter not sent. Default: 50. Max value: 100."),
    Field::string("sort")
        .optional()
        .describe("Field to use for sorting. Use field:order where order is 1 for ascending and -1 for descending, e.g. date:-1."),
    Field::string("fields")
        .optional()
        .describe("Comma-separated list of fields to include or exclude (based on value provided for include_fields) in the result. Leave empty to retrieve all fields."),
    Field::boolean("include_fields")
        .optional()
        .describe("Whether specified fields are to be included (true) or excluded (false)."),
    Field::boolean("include_totals")
        .optional()
        .describe("Return results as an array when false (default). Return results inside an object that also contains a total result count when true."),
    Field::string("from")
        .optional()
        .describe("Log event ID from which to start selection."),
    Field::number("take")
        .optional()
        .describe("Number of entries to retrieve when using the from parameter. Default 50, max 100."),
    Field::string("q")
        .optional()
        .describe("Query in Lucene query string syntax, e.g. type:\"f\" AND user_id:\"auth0|123\"."),
];

#[derive(Deserialize)]
struct LogId {
    id: String,
}

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register("log-get-by-id", "Retrieve an individual log event by id.", GET, get_by_id)?;
    registry.register(
        "log-get-all",
        "Retrieves the Tenant Logs based on the provided search criteria.",
        GET_ALL,
        get_all,
    )?;
    Ok(())
}

async fn get_by_id(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
    let LogId { id } = parse(args)?;
    let log = api.get(Resource::Logs, &id, Query::new()).await?;
    Ok(Outcome::found(log, "No log found with this ID."))
}

async fn get_all(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
    let logs = api.get_all(Resource::Logs, args).await?;
    Ok(Outcome::listed(logs, "logs", "No logs found."))
}
