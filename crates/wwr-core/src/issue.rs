//! Issue data model for wwr
//!
//! An issue is keyed by its title and owns its comments. Author, assignee and
//! comment authors are weak references to user names: they are stored as plain
//! strings and resolved against the current users whenever they are rendered.

use serde::{Deserialize, Serialize};

/// A comment on an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    text: String,
    author: String,
}

impl Comment {
    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: author.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub(crate) fn set_author(&mut self, author: impl Into<String>) {
        self.author = author.into();
    }
}

/// Fields supplied when creating an issue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIssue {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub issue_type: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub assignee: String,
}

/// Core issue structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    title: String,
    description: String,
    os: String,
    issue_type: String,
    author: String,
    assignee: String,
    comments: Vec<Comment>,
}

impl Issue {
    pub fn new(fields: NewIssue) -> Self {
        Self {
            title: fields.title,
            description: fields.description,
            os: fields.os,
            issue_type: fields.issue_type,
            author: fields.author,
            assignee: fields.assignee,
            comments: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn issue_type(&self) -> &str {
        &self.issue_type
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn assignee(&self) -> &str {
        &self.assignee
    }

    /// Comments in insertion order
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn add_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
    }

    /// Clear the assignee. An empty assignee renders as removed.
    pub(crate) fn clear_assignee(&mut self) {
        self.assignee.clear();
    }

    pub(crate) fn set_assignee(&mut self, assignee: impl Into<String>) {
        self.assignee = assignee.into();
    }

    pub(crate) fn pop_comment(&mut self) {
        self.comments.pop();
    }

    pub(crate) fn comments_mut(&mut self) -> &mut [Comment] {
        &mut self.comments
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] [{}] {}", self.issue_type, self.os, self.title)
    }
}

/// An issue with every weak reference resolved against the current users
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueView {
    pub title: String,
    pub description: String,
    pub os: String,
    pub issue_type: String,
    pub author: String,
    pub assignee: String,
    pub comments: Vec<Comment>,
}
