//! Input validation
//!
//! The flat files have no escaping, so any value that contains a delimiter
//! would shift every field after it on the next load. These checks run before
//! anything reaches the tracker's collections.

use crate::codec::{COMMENT_BOUNDARY, FIELD_DELIM, TITLE_SEPARATOR, USER_REMOVED};
use crate::{Error, NewIssue, Result};

/// Validate the fields of a new issue.
///
/// Title, author and assignee also land in the comment stream or title
/// listings, so they are held to the stricter rules.
pub fn issue(fields: &NewIssue) -> Result<()> {
    title(&fields.title)?;
    free_text("description", &fields.description)?;
    free_text("os", &fields.os)?;
    free_text("issue_type", &fields.issue_type)?;
    reference("author", &fields.author)?;
    reference("assignee", &fields.assignee)?;
    Ok(())
}

pub fn title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::invalid("title", "cannot be empty"));
    }
    forbid("title", title, TITLE_SEPARATOR)?;
    reference("title", title)
}

/// Validate a comment body and its author
pub fn comment(text: &str, author: &str) -> Result<()> {
    reference("comment", text)?;
    reference("author", author)
}

/// Validate a user name. Names are stored one per line.
pub fn user_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::invalid("user", "cannot be empty"));
    }
    if name.contains(['\n', '\r']) {
        return Err(Error::invalid("user", "cannot contain line breaks"));
    }
    if name == USER_REMOVED {
        return Err(Error::invalid("user", format!("'{USER_REMOVED}' is reserved")));
    }
    reference("user", name)
}

fn free_text(field: &'static str, value: &str) -> Result<()> {
    forbid(field, value, FIELD_DELIM)
}

fn reference(field: &'static str, value: &str) -> Result<()> {
    free_text(field, value)?;
    forbid(field, value, COMMENT_BOUNDARY)
}

fn forbid(field: &'static str, value: &str, sequence: &str) -> Result<()> {
    if value.contains(sequence) {
        return Err(Error::invalid(field, format!("cannot contain '{sequence}'")));
    }
    Ok(())
}
