/// User Tools
///
/// Lookup, lifecycle and role management for Auth0 users. Most mutations
/// report a fixed confirmation instead of the updated user.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth0::{Query, Resource};
use crate::core::outcome::Outcome;
use crate::core::registry::{parse, Api, RegistryError, ToolError, ToolRegistry};
use crate::core::schema::{Arguments, Field, Kind};

const USER_ID: &[Field] = &[Field::string("userId").describe("The Auth0 user ID.")];

const FIND_BY_EMAIL: &[Field] = &[Field::string("email").describe("Email address to search for.")];

const LIST: &[Field] = &[
    Field::number("page")
        .default_integer(0)
        .describe("Page index of the results to return. First page is 0."),
    Field::number("per_page")
        .default_integer(10)
        .describe("Number of results per page."),
];

const CREATE: &[Field] = &[
    Field::string("email").describe("Email address of the new user."),
    Field::string("password").describe("Initial password."),
    Field::string("connection").describe("Name of the database connection to create the user in."),
];

const UPDATE: &[Field] = &[
    Field::string("userId").describe("The Auth0 user ID."),
    Field::new("data", Kind::Record).describe("User attributes to update."),
];

const ROLES: &[Field] = &[
    Field::string("userId").describe("The Auth0 user ID."),
    Field::strings("roles").describe("Role IDs."),
];

const LOGS: &[Field] = &[
    Field::string("userId").describe("The Auth0 user ID."),
    Field::number("page")
        .optional()
        .describe("Page index of the results to return. First page is 0."),
    Field::number("per_page")
        .optional()
        .describe("Number of results per page. Max value: 100."),
    Field::string("sort")
        .optional()
        .describe("Field to sort by. Use field:order where order is 1 for ascending and -1 for descending."),
    Field::boolean("include_totals")
        .optional()
        .describe("Return results inside an object that also contains the total result count."),
];

#[derive(Deserialize)]
struct UserId {
    #[serde(rename = "userId")]
    user_id: String,
}

#[derive(Deserialize)]
struct Email {
    email: String,
}

#[derive(Deserialize)]
struct Update {
    #[serde(rename = "userId")]
    user_id: String,
    data: Value,
}

#[derive(Deserialize)]
struct Roles {
    #[serde(rename = "userId")]
    user_id: String,
    roles: Vec<String>,
}

#[derive(Deserialize)]
struct UserLogs {
    #[serde(rename = "userId")]
    user_id: String,
    #[serde(flatten)]
    query: Query,
}

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register("find-user-by-email", "Find a user for a given email", FIND_BY_EMAIL, find_by_email)?;
    registry.register("get-user-by-id", "Retrieve a user by their Auth0 user ID", USER_ID, get_by_id)?;
    registry.register("list-users", "Retrieve a list of users with pagination", LIST, list)?;
    registry.register("create-user", "Create a new user in Auth0", CREATE, create)?;
    registry.register("update-user", "Update a user's details", UPDATE, update)?;
    registry.register("delete-user", "Delete a user permanently", USER_ID, delete)?;
    registry.register("block-user", "Block a user from logging in", USER_ID, block)?;
    registry.register("unblock-user", "Unblock a previously blocked user", USER_ID, unblock)?;
    registry.register("assign-role-to-user", "Assign roles to a user", ROLES, assign_roles)?;
    registry.register("remove-role-from-user", "Remove roles from a user", ROLES, remove_roles)?;
    registry.register("verify-user-email", "Manually verify a user's email", USER_ID, verify_email)?;
    registry.register(
        "resend-email-verification",
        "Send an email verification email to a user",
        USER_ID,
        resend_verification,
    )?;
    registry.register("get-user-logs", "Retrieve log events for a specific user", LOGS, logs)?;
    Ok(())
}

async fn find_by_email(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
    let Email { email } = parse(args)?;
    let mut query = Query::new();
    query.insert("q".to_string(), Value::from(format!("email:\"{}\"", email)));
    query.insert("search_engine".to_string(), Value::from("v3"));

    let users = api.get_all(Resource::Users, query).await?;
    Ok(Outcome::listed(users, "users", "No user found with this email."))
}

async fn get_by_id(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
    let UserId { user_id } = parse(args)?;
    let user = api.get(Resource::Users, &user_id, Query::new()).await?;
    Ok(Outcome::found(user, "No user found with this ID."))
}

async fn list(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
    let users = api.get_all(Resource::Users, args).await?;
    Ok(Outcome::listed(users, "users", "No users found."))
}

async fn create(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
    let user = api.create(Resource::Users, Value::Object(args)).await?;
    Ok(Outcome::created(user))
}

async fn update(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
    let Update { user_id, data } = parse(args)?;
    let user = api.update(Resource::Users, &user_id, data).await?;
    Ok(Outcome::created(user))
}

/// Auth0 acknowledges deletes of unknown users too, so the acknowledgement
/// is not inspected.
async fn delete(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
    let UserId { user_id } = parse(args)?;
    api.delete(Resource::Users, &user_id).await?;
    Ok(Outcome::confirmed("User deleted successfully."))
}

async fn patch_user(api: Api, args: Arguments, patch: Value, done: &str) -> Result<Outcome, ToolError> {
    let UserId { user_id } = parse(args)?;
    api.update(Resource::Users, &user_id, patch).await?;
    Ok(Outcome::confirmed(done))
}

async fn block(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
    patch_user(api, args, json!({ "blocked": true }), "User blocked successfully.").await
}

async fn unblock(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
    patch_user(api, args, json!({ "blocked": false }), "User unblocked successfully.").await
}

async fn verify_email(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
    patch_user(api, args, json!({ "email_verified": true }), "User email verified.").await
}

async fn assign_roles(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
    let Roles { user_id, roles } = parse(args)?;
    api.assign_roles(&user_id, roles).await?;
    Ok(Outcome::confirmed("Roles assigned successfully."))
}

async fn remove_roles(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
    let Roles { user_id, roles } = parse(args)?;
    api.delete_roles(&user_id, roles).await?;
    Ok(Outcome::confirmed("Roles removed successfully."))
}

async fn resend_verification(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
    let UserId { user_id } = parse(args)?;
    api.verify_email(&user_id).await?;
    Ok(Outcome::confirmed("Verification email sent."))
}

async fn logs(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
    let UserLogs { user_id, query } = parse(args)?;
    let logs = api.get_user_logs(&user_id, query).await?;
    Ok(Outcome::listed(logs, "logs", "No logs found for this user."))
}
