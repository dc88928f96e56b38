//! `/issueServer`: the endpoint spoken by the original terminal client
//!
//! Reads are `GET` with an `op` query parameter. Writes are `POST` with a
//! plain-text body of `~`-separated fields, `kind~op~field...`, usually
//! terminated by a single `/`. Every successful reply is `{"result": "<wire>"}`
//! carrying the sentinel strings from [`wwr_core::wire`].

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wwr_core::{NewIssue, wire};

use crate::app::{ApiError, AppState};

pub const PATH: &str = "/issueServer";

const FIELD_SEPARATOR: char = '~';
const TERMINATOR: char = '/';

/// Reply body understood by the client
#[derive(Debug, Serialize)]
struct Reply {
    result: String,
}

fn reply(result: String) -> Response {
    Json(Reply { result }).into_response()
}

/// Rejected request, answered with 400 and a plain message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Get,
    Issue,
    User,
    Comment,
    Unknown,
}

impl Rejection {
    fn message(self) -> &'static str {
        match self {
            Self::Get => "GET Operation Error",
            Self::Issue => "Issue Operation Error",
            Self::User => "User Operation Error",
            Self::Comment => "Comment Operation Error",
            Self::Unknown => "Unknown Request Type",
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.message()).into_response()
    }
}

/// A decoded write request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddIssue(NewIssue),
    DeleteIssue { title: String },
    CreateUser { name: String },
    RemoveUser { name: String },
    AddComment { title: String, text: String, author: String },
}

impl Command {
    /// Decode a `kind~op~field...` body
    pub fn parse(body: &str) -> Result<Self, Rejection> {
        let body = body.trim_end_matches(['\r', '\n']);
        let body = body.strip_suffix(TERMINATOR).unwrap_or(body);
        let mut parts = body.split(FIELD_SEPARATOR);
        let kind = parts.next().unwrap_or_default();
        let op = parts.next();
        let fields: Vec<&str> = parts.collect();

        let owned = |i: usize| fields.get(i).map(|s| s.to_string()).unwrap_or_default();

        match (kind, op) {
            ("issueType", Some("addIssue")) => {
                if fields.is_empty() {
                    return Err(Rejection::Issue);
                }
                Ok(Self::AddIssue(NewIssue {
                    title: owned(0),
                    description: owned(1),
                    os: owned(2),
                    issue_type: owned(3),
                    author: owned(4),
                    assignee: owned(5),
                }))
            }
            ("issueType", Some("deleteIssue")) if !fields.is_empty() => {
                Ok(Self::DeleteIssue { title: owned(0) })
            }
            ("issueType", _) => Err(Rejection::Issue),
            ("userType", Some("createUser")) if !fields.is_empty() => {
                Ok(Self::CreateUser { name: owned(0) })
            }
            ("userType", Some("removeUser")) if !fields.is_empty() => {
                Ok(Self::RemoveUser { name: owned(0) })
            }
            ("userType", _) => Err(Rejection::User),
            ("commentType", Some("addComment")) if fields.len() >= 2 => Ok(Self::AddComment {
                title: owned(0),
                text: owned(1),
                author: owned(2),
            }),
            ("commentType", _) => Err(Rejection::Comment),
            _ => Err(Rejection::Unknown),
        }
    }
}

/// Query string of a read request
#[derive(Debug, Default, Deserialize)]
pub struct ReadQuery {
    #[serde(default)]
    op: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    user: Option<String>,
}

pub async fn get_request(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadQuery>,
) -> Response {
    let ReadQuery { op, title, user } = query;
    let tracker = state.read();
    let result = match (op.as_deref(), title, user) {
        (Some("getIssue"), Some(title), _) => wire::get_issue(&tracker, &title),
        (Some("getAllIssues"), _, _) => wire::issue_titles(&tracker),
        (Some("getUser"), _, Some(user)) => wire::get_user(&tracker, &user),
        (Some("listAllUsers"), _, _) => wire::list_users(&tracker),
        (op, _, _) => {
            tracing::warn!(op = op.unwrap_or(""), "rejected read request");
            return Rejection::Get.into_response();
        }
    };
    reply(result)
}

pub async fn post_request(State(state): State<Arc<AppState>>, body: String) -> Response {
    let command = match Command::parse(&body) {
        Ok(command) => command,
        Err(rejection) => {
            tracing::warn!(%body, "rejected write request");
            return rejection.into_response();
        }
    };
    tracing::debug!(?command, "write request");

    let mut tracker = state.write();
    let result = match command {
        Command::AddIssue(fields) => wire::create_issue(&mut tracker, fields),
        Command::DeleteIssue { title } => wire::delete_issue(&mut tracker, &title),
        Command::CreateUser { name } => wire::create_user(&mut tracker, &name),
        Command::RemoveUser { name } => wire::delete_user(&mut tracker, &name),
        Command::AddComment { title, text, author } => {
            wire::add_comment(&mut tracker, &title, &text, &author)
        }
    };

    match result {
        Ok(result) => reply(result),
        Err(e) => ApiError::from(e).into_response(),
    }
}
