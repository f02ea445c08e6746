/// Form Tools

use serde_json::Value;

use crate::auth0::Resource;
use crate::core::outcome::Outcome;
use crate::core::registry::{Api, RegistryError, ToolError, ToolRegistry};
use crate::core::schema::{Arguments, Field, Kind};

const LANGUAGES: &[Field] = &[
    Field::string("primary")
        .optional()
        .describe("Primary language of the form."),
    Field::string("default")
        .optional()
        .describe("Language used when the user's language is not available."),
];

const CREATE: &[Field] = &[
    Field::string("name").non_empty().describe("Name of the form."),
    Field::new("messages", Kind::Record)
        .optional()
        .describe("Custom and error messages of the form."),
    Field::object("languages", LANGUAGES)
        .optional()
        .describe("Language settings of the form."),
    Field::new("translations", Kind::Record)
        .optional()
        .describe("Translations keyed by language code."),
    Field::new("nodes", Kind::List)
        .optional()
        .describe("Form nodes (steps, flows and routers)."),
    Field::new("start", Kind::Record)
        .optional()
        .describe("Start node configuration."),
    Field::new("ending", Kind::Record)
        .optional()
        .describe("Ending node configuration."),
    Field::new("style", Kind::Record)
        .optional()
        .describe("Style settings of the form."),
];

const GET_ALL: &[Field] = &[
    Field::number("page")
        .optional()
        .describe("Page index of the results to return. First page is 0."),
    Field::number("per_page")
        .optional()
        .describe("Number of results per page. Defaults to 50."),
    Field::boolean("include_totals")
        .optional()
        .describe("Return results inside an object that contains the total result count (true) or as a direct array of results (false, default)."),
    Field::new("hydrate", Kind::EnumArray(&["flow_count", "links"]))
        .optional()
        .describe("Additional properties to include in each form."),
];

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register("forms-create-all", "Create a new form.", CREATE, create)?;
    registry.register("forms-get-all", "Retrieve all forms.", GET_ALL, get_all)?;
    Ok(())
}

async fn create(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
    let form = api.create(Resource::Forms, Value::Object(args)).await?;
    Ok(Outcome::created(form))
}

async fn get_all(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
    let forms = api.get_all(Resource::Forms, args).await?;
    Ok(Outcome::listed(forms, "forms", "No forms found."))
}
