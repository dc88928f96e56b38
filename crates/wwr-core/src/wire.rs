//! Wire replies
//!
//! Every tracker operation has a string form understood by the terminal client.
//! Absence and conflicts are reported as sentinel strings, not errors; only
//! invalid input and I/O failures come back as `Err`.

use crate::codec::{FIELD_DELIM, TITLE_SEPARATOR, USER_SEPARATOR};
use crate::{Error, IssueView, NewIssue, Result, Tracker, User};

/// Nothing matched
pub const BLANK: &str = "(BLANK)";
/// The name is already in use
pub const TAKEN: &str = "(TAKEN)";
pub const ISSUE_ADDED: &str = "New Issue Added";
pub const COMMENT_ADDED: &str = "New comment added";
pub const COMMENT_NOT_ADDED: &str = "Comment not added";

/// `(BLANK)` followed by the title separator
pub fn blank_record() -> String {
    format!("{BLANK}{TITLE_SEPARATOR}")
}

pub fn removed(name: &str) -> String {
    format!("{name} has been removed.")
}

/// Each title followed by `[^`, or the blank record when there are none
pub fn render_titles(titles: &[&str]) -> String {
    if titles.is_empty() {
        return blank_record();
    }
    let mut out = String::new();
    for title in titles {
        out.push_str(title);
        out.push_str(TITLE_SEPARATOR);
    }
    out
}

/// Six `^]`-terminated fields, then a text/author pair per comment
pub fn render_issue(view: &IssueView) -> String {
    let mut out = String::new();
    for field in [
        &view.title,
        &view.description,
        &view.os,
        &view.issue_type,
        &view.author,
        &view.assignee,
    ] {
        out.push_str(field);
        out.push_str(FIELD_DELIM);
    }
    for comment in &view.comments {
        out.push_str(comment.text());
        out.push_str(FIELD_DELIM);
        out.push_str(comment.author());
        out.push_str(FIELD_DELIM);
    }
    out
}

/// Each name followed by `-`. Empty when there are no users.
///
/// Names may themselves contain `-`, so a listing cannot always be split back
/// into names. The terminal client only displays it.
pub fn render_users(users: &[User]) -> String {
    let mut out = String::new();
    for user in users {
        out.push_str(user.name());
        out.push(USER_SEPARATOR);
    }
    out
}

/// Replace a sentinel error with its wire string
fn sentinel(result: Result<String>, not_found: impl FnOnce() -> String) -> Result<String> {
    match result {
        Err(Error::NotFound(_)) => Ok(not_found()),
        Err(Error::AlreadyExists(_)) => Ok(TAKEN.to_string()),
        other => other,
    }
}

pub fn create_issue(tracker: &mut Tracker, fields: NewIssue) -> Result<String> {
    sentinel(
        tracker
            .create_issue(fields)
            .map(|_| ISSUE_ADDED.to_string()),
        blank_record,
    )
}

pub fn issue_titles(tracker: &Tracker) -> String {
    render_titles(&tracker.issue_titles())
}

pub fn get_issue(tracker: &Tracker, title: &str) -> String {
    match tracker.get_issue(title) {
        Ok(view) => render_issue(&view),
        Err(_) => blank_record(),
    }
}

pub fn delete_issue(tracker: &mut Tracker, title: &str) -> Result<String> {
    sentinel(
        tracker.delete_issue(title).map(|_| removed(title)),
        || BLANK.to_string(),
    )
}

pub fn add_comment(tracker: &mut Tracker, title: &str, text: &str, author: &str) -> Result<String> {
    sentinel(
        tracker
            .add_comment(title, text, author)
            .map(|_| COMMENT_ADDED.to_string()),
        || COMMENT_NOT_ADDED.to_string(),
    )
}

pub fn create_user(tracker: &mut Tracker, name: &str) -> Result<String> {
    sentinel(
        tracker.create_user(name).map(|u| u.name().to_string()),
        || BLANK.to_string(),
    )
}

pub fn get_user(tracker: &Tracker, name: &str) -> String {
    match tracker.get_user(name) {
        Ok(user) => user.name().to_string(),
        Err(_) => BLANK.to_string(),
    }
}

pub fn list_users(tracker: &Tracker) -> String {
    render_users(tracker.users())
}

pub fn delete_user(tracker: &mut Tracker, name: &str) -> Result<String> {
    sentinel(
        tracker.delete_user(name).map(|_| removed(name)),
        || BLANK.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(title: &str, assignee: &str) -> NewIssue {
        NewIssue {
            title: title.into(),
            description: "desc".into(),
            os: "os".into(),
            issue_type: "type".into(),
            author: "user".into(),
            assignee: assignee.into(),
        }
    }

    #[test]
    fn test_empty_listings() {
        let tracker = Tracker::in_memory();
        assert_eq!(issue_titles(&tracker), "(BLANK)[^");
        assert_eq!(list_users(&tracker), "");
        assert_eq!(get_issue(&tracker, "X"), "(BLANK)[^");
        assert_eq!(get_user(&tracker, "alice"), "(BLANK)");
    }

    #[test]
    fn test_issue_replies() {
        let mut tracker = Tracker::in_memory();
        tracker.create_user("user").unwrap();
        tracker.create_user("assignee").unwrap();

        assert_eq!(
            create_issue(&mut tracker, fields("hello", "assignee")).unwrap(),
            "New Issue Added"
        );
        assert_eq!(
            create_issue(&mut tracker, fields("hello", "user")).unwrap(),
            "(TAKEN)"
        );
        assert_eq!(
            get_issue(&tracker, "hello"),
            "hello^]desc^]os^]type^]user^]assignee^]"
        );

        create_issue(&mut tracker, fields("hello there", "")).unwrap();
        assert_eq!(issue_titles(&tracker), "hello[^hello there[^");

        assert_eq!(
            delete_issue(&mut tracker, "hello").unwrap(),
            "hello has been removed."
        );
        assert_eq!(delete_issue(&mut tracker, "hello").unwrap(), "(BLANK)");
    }

    #[test]
    fn test_comment_replies() {
        let mut tracker = Tracker::in_memory();
        tracker.create_user("Obi-Wan Kenobi").unwrap();
        tracker.create_user("Anakin Skywalker").unwrap();
        create_issue(&mut tracker, fields("Execute Order 66", "")).unwrap();

        assert_eq!(
            add_comment(
                &mut tracker,
                "Execute Order 66",
                "You were my brother Anakin, I loved you",
                "Obi-Wan Kenobi"
            )
            .unwrap(),
            "New comment added"
        );
        add_comment(&mut tracker, "Execute Order 66", "I HATE YOU", "Anakin Skywalker").unwrap();
        assert_eq!(
            add_comment(&mut tracker, "Order 65", "?", "Anakin Skywalker").unwrap(),
            "Comment not added"
        );

        assert_eq!(
            get_issue(&tracker, "Execute Order 66"),
            "Execute Order 66^]desc^]os^]type^]user_Removed^]user_Removed^]\
             You were my brother Anakin, I loved you^]Obi-Wan Kenobi^]\
             I HATE YOU^]Anakin Skywalker^]"
        );
    }

    #[test]
    fn test_user_replies() {
        let mut tracker = Tracker::in_memory();
        assert_eq!(create_user(&mut tracker, "alice").unwrap(), "alice");
        assert_eq!(create_user(&mut tracker, "alice").unwrap(), "(TAKEN)");
        create_user(&mut tracker, "bob").unwrap();

        assert_eq!(get_user(&tracker, "alice"), "alice");
        assert_eq!(list_users(&tracker), "alice-bob-");
        assert_eq!(
            delete_user(&mut tracker, "alice").unwrap(),
            "alice has been removed."
        );
        assert_eq!(delete_user(&mut tracker, "alice").unwrap(), "(BLANK)");
        assert_eq!(list_users(&tracker), "bob-");
    }

    #[test]
    fn test_user_listing_keeps_hyphenated_names() {
        let mut tracker = Tracker::in_memory();
        create_user(&mut tracker, "Obi-Wan Kenobi").unwrap();
        create_user(&mut tracker, "Grievous").unwrap();
        assert_eq!(list_users(&tracker), "Obi-Wan Kenobi-Grievous-");
    }

    #[test]
    fn test_invalid_input_is_an_error() {
        let mut tracker = Tracker::in_memory();
        assert!(create_user(&mut tracker, "").is_err());
        assert!(create_user(&mut tracker, "user_Removed").is_err());
        assert!(create_issue(&mut tracker, fields("", "")).is_err());
    }
}
