//! JSON routes over the tracker

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wwr_core::{IssueView, NewIssue, User, UserRemoval};

use crate::app::{ApiError, ApiResponse, AppState};

type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::ok(data))))
}

fn created<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(data))))
}

/// Request to add a comment
#[derive(Debug, Deserialize)]
struct AddCommentRequest {
    text: String,
    author: String,
}

/// Request to register a user
#[derive(Debug, Deserialize)]
struct CreateUserRequest {
    name: String,
}

/// Summary of a removed user
#[derive(Debug, Serialize)]
struct RemovedUser {
    name: String,
    unassigned: usize,
    orphaned_comments: usize,
}

impl From<UserRemoval> for RemovedUser {
    fn from(removal: UserRemoval) -> Self {
        Self {
            name: removal.user.name().to_string(),
            unassigned: removal.unassigned,
            orphaned_comments: removal.orphaned_comments,
        }
    }
}

/// List all issue titles in creation order
async fn list_issues(State(state): State<Arc<AppState>>) -> ApiResult<Vec<String>> {
    let tracker = state.read();
    ok(tracker
        .issue_titles()
        .into_iter()
        .map(str::to_string)
        .collect())
}

async fn create_issue(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewIssue>,
) -> ApiResult<IssueView> {
    let mut tracker = state.write();
    let title = tracker.create_issue(req)?.title().to_string();
    tracing::info!(%title, "issue created");
    created(tracker.get_issue(&title)?)
}

async fn get_issue(
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
) -> ApiResult<IssueView> {
    ok(state.read().get_issue(&title)?)
}

async fn delete_issue(
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
) -> ApiResult<IssueView> {
    let mut tracker = state.write();
    let issue = tracker.delete_issue(&title)?;
    tracing::info!(%title, "issue deleted");
    ok(tracker.view(&issue))
}

async fn add_comment(
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
    Json(req): Json<AddCommentRequest>,
) -> ApiResult<IssueView> {
    let mut tracker = state.write();
    tracker.add_comment(&title, &req.text, &req.author)?;
    created(tracker.get_issue(&title)?)
}

async fn list_users(State(state): State<Arc<AppState>>) -> ApiResult<Vec<User>> {
    ok(state.read().users().to_vec())
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<User> {
    let mut tracker = state.write();
    let user = tracker.create_user(&req.name)?.clone();
    tracing::info!(name = user.name(), "user created");
    created(user)
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<User> {
    ok(state.read().get_user(&name)?.clone())
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<RemovedUser> {
    let removal = state.write().delete_user(&name)?;
    tracing::info!(
        %name,
        unassigned = removal.unassigned,
        orphaned_comments = removal.orphaned_comments,
        "user deleted"
    );
    ok(removal.into())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/issues", get(list_issues).post(create_issue))
        .route("/issues/{title}", get(get_issue).delete(delete_issue))
        .route("/issues/{title}/comments", post(add_comment))
        .route("/users", get(list_users).post(create_user))
        .route("/users/{name}", get(get_user).delete(delete_user))
}
