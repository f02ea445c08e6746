/// Client (application) Tools

use serde::Deserialize;
use serde_json::Value;

use crate::auth0::{Query, Resource};
use crate::core::outcome::Outcome;
use crate::core::registry::{parse, Api, RegistryError, ToolError, ToolRegistry};
use crate::core::schema::{Arguments, Field, Kind};

const APP_TYPES: &[&str] = &[
    "spa", "native", "regular_web", "non_interactive", "rm_fa", "box", "cloudbees", "concur",
    "dropbox", "echosign", "newrelic", "office365", "salesforce", "samlp", "sharepoint", "slack",
    "springcm", "zendesk", "zoom", "zoom_us",
];

const OIDC_LOGOUT: &[Field] = &[Field::strings("backchannel_logout")
    .optional()
    .describe("URLs that are valid to call back from Auth0 for OIDC backchannel logout. Currently only one URL is allowed.")];

const JWT_CONFIGURATION: &[Field] = &[
    Field::number("life_time_in_seconds")
        .optional()
        .describe("Number of seconds the JWT will be valid for (affects `exp` claim)."),
    Field::new("scopes", Kind::Record)
        .optional()
        .describe("Configuration related to id token claims for the client."),
    Field::one_of("alg", &["HS256", "RS256", "PS256"])
        .optional()
        .describe("Algorithm used to sign JWTs. Can be `HS256` or `RS256`. `PS256` available via addon."),
];

const CREATE: &[Field] = &[
    Field::string("name")
        .non_empty()
        .describe("Name of this client (min length: 1 character, does not allow `<` or `>`)."),
    Field::string("description")
        .optional()
        .describe("Free text description of this client (max length: 140 characters)."),
    Field::string("logo_uri")
        .optional()
        .describe("URL of the logo to display for this client. Recommended size is 150x150 pixels."),
    Field::strings("callbacks")
        .optional()
        .describe("URLs whitelisted for Auth0 to use as a callback to the client after authentication."),
    Field::object("oidc_logout", OIDC_LOGOUT)
        .optional()
        .describe("Configuration for OIDC backchannel logout."),
    Field::strings("allow_origin")
        .optional()
        .describe("URLs allowed to make requests from JavaScript to Auth0 API (typically used with CORS). Wildcards are allowed at the subdomain level."),
    Field::strings("web_origins")
        .optional()
        .describe("Allowed origins for use with Cross-Origin Authentication, Device Flow, and web message response mode."),
    Field::strings("client_aliases")
        .optional()
        .describe("List of audiences/realms for SAML protocol. Used by the wsfed addon."),
    Field::strings("allowed_clients")
        .optional()
        .describe("Clients and API ids that are allowed to make delegation requests. Empty means all your clients are allowed."),
    Field::strings("allowed_logout_urls")
        .optional()
        .describe("URLs that are valid to redirect to after logout from Auth0. Wildcards are allowed for subdomains."),
    Field::strings("grant_types")
        .optional()
        .describe("Grant types supported for this application, e.g. `authorization_code`, `implicit`, `refresh_token`, `client_credentials`, `password`."),
    Field::one_of("token_endpoint_auth_method", &["none", "client_secret_post", "client_secret_basic"])
        .optional()
        .describe("Requested authentication method for the token endpoint."),
    Field::one_of("app_type", APP_TYPES)
        .optional()
        .describe("Type of client used to determine which settings are applicable."),
    Field::boolean("is_first_party")
        .optional()
        .describe("Whether this client is a first-party client."),
    Field::boolean("oidc_conformant")
        .optional()
        .describe("Whether this client conforms to strict OIDC specifications (true) or uses legacy features (false)."),
    Field::object("jwt_configuration", JWT_CONFIGURATION)
        .optional()
        .describe("Configuration related to JWTs for this client."),
    Field::boolean("sso")
        .optional()
        .describe("Applies only to SSO clients and determines whether Auth0 will handle Single Sign On (true) or whether the Identity Provider will (false)."),
    Field::string("cross_origin_authentication")
        .optional()
        .describe("URL of the location in your site where the cross origin verification takes place for the cross-origin auth flow."),
    Field::boolean("sso_disabled")
        .optional()
        .describe("true to disable Single Sign On, false otherwise (default: false)."),
    Field::boolean("custom_login_page_on")
        .optional()
        .describe("true if the custom login page is to be used, false otherwise. Defaults to true."),
    Field::string("custom_login_page")
        .optional()
        .describe("The content (HTML, CSS, JS) of the custom login page."),
    Field::string("custom_login_page_preview")
        .optional()
        .describe("The content (HTML, CSS, JS) of the custom login page. (Used on Previews)"),
    Field::string("form_template")
        .optional()
        .describe("HTML form template to be used for WS-Federation."),
    Field::string("initiate_login_uri")
        .optional()
        .describe("Initiate login uri, must be https."),
    Field::one_of("organization_usage", &["any", "only", "none"])
        .optional()
        .describe("Defines how to proceed during an authentication transaction with regards an organization."),
    Field::one_of("organization_require_behavior", &["no_prompt", "pre_login_prompt", "post_login_prompt"])
        .optional()
        .describe("Defines how to proceed during an authentication transaction when organization usage is required."),
    Field::boolean("require_pushed_authorization_requests")
        .optional()
        .describe("Makes the use of Pushed Authorization Requests mandatory for this client."),
    Field::boolean("require_proof_of_possession")
        .optional()
        .describe("Makes the use of Proof of Possession mandatory for this client."),
    Field::one_of("compliance_level", &["none", "fapi1_adv_pkj_par", "fapi1_adv_mtls_par", "null"])
        .optional()
        .describe("Defines the compliance level for this client, which may restrict its capabilities."),
];

const DELETE: &[Field] = &[Field::string("client_id")
    .non_empty()
    .describe("ID of the client to delete.")];

const GET: &[Field] = &[
    Field::string("client_id")
        .non_empty()
        .describe("The ID of the client to retrieve."),
    Field::string("fields")
        .optional()
        .describe("Comma-separated list of fields to include or exclude (based on value provided for include_fields) in the result. Leave empty to retrieve all fields."),
    Field::boolean("include_fields")
        .optional()
        .describe("Whether specified fields are to be included (true) or excluded (false)."),
];

const GET_ALL: &[Field] = &[
    Field::string("fields")
        .optional()
        .describe("Comma-separated list of fields to include or exclude (based on value provided for include_fields) in the result. Leave empty to retrieve all fields."),
    Field::boolean("include_fields")
        .optional()
        .describe("Whether specified fields are to be included (true) or excluded (false)."),
    Field::number("page")
        .optional()
        .describe("Page index of the results to return. First page is 0."),
    Field::number("per_page")
        .optional()
        .describe("Number of results per page. Default value is 50, maximum value is 100."),
    Field::boolean("include_totals")
        .optional()
        .describe("Return results inside an object that contains the total result count (true) or as a direct array of results (false, default)."),
    Field::string("from")
        .optional()
        .describe("Optional Id from which to start selection."),
    Field::number("take")
        .optional()
        .describe("Number of results per page. Defaults to 50."),
    Field::boolean("is_global")
        .optional()
        .describe("Optional filter on the global client parameter."),
    Field::boolean("is_first_party")
        .optional()
        .describe("Optional filter on whether or not a client is a first-party client."),
    Field::string("app_type")
        .optional()
        .describe("Optional filter by a comma-separated list of application types."),
    Field::string("q")
        .optional()
        .describe("Advanced query in Lucene syntax. Permitted queries: client_grant.organization_id:{organization_id}, client_grant.allow_any_organization:true. Cannot be combined with other filters and requires from/take checkpoint pagination."),
];

#[derive(Deserialize)]
struct ClientId {
    client_id: String,
}

#[derive(Deserialize)]
struct Lookup {
    client_id: String,
    #[serde(flatten)]
    query: Query,
}

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register("clients-create", "Create a new client (application).", CREATE, create)?;
    registry.register("clients-delete", "Delete a client by id.", DELETE, delete)?;
    registry.register("clients-get-by-id", "Retrieve an individual client by id.", GET, get_by_id)?;
    registry.register("clients-get-all", "Retrieve all clients.", GET_ALL, get_all)?;
    Ok(())
}

async fn create(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
    let client = api.create(Resource::Clients, Value::Object(args)).await?;
    Ok(Outcome::created(client))
}

async fn delete(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
    let ClientId { client_id } = parse(args)?;
    let acknowledged = api.delete(Resource::Clients, &client_id).await?;
    Ok(Outcome::deleted(
        acknowledged,
        "Client deleted successfully.",
        "No client found with this ID.",
    ))
}

async fn get_by_id(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
    let Lookup { client_id, query } = parse(args)?;
    let client = api.get(Resource::Clients, &client_id, query).await?;
    Ok(Outcome::found(client, "No client found with this ID."))
}

async fn get_all(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
    let clients = api.get_all(Resource::Clients, args).await?;
    Ok(Outcome::listed(clients, "clients", "No clients found."))
}
