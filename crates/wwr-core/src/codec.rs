//! Flat-file codec for issues, comments and users
//!
//! Three streams make up the persisted state:
//!
//! - the issue stream: six `^]`-terminated fields per issue (title, description,
//!   os, type, author, assignee) with no record boundary;
//! - the comment stream: for every issue that has comments, `title^]` followed by
//!   `text^]author^]` pairs and a closing `**`;
//! - the user list: one name per line.
//!
//! Decoding never fails. Anything that does not fit the framing is reported as a
//! [`DecodeWarning`] next to the best-effort result, and the caller decides whether
//! a warning is fatal.

use crate::{Comment, Issue, NewIssue, User};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Terminates every field of an encoded record
pub const FIELD_DELIM: &str = "^]";
/// Terminates a per-issue block in the comment stream
pub const COMMENT_BOUNDARY: &str = "**";
/// Follows every title in a title listing
pub const TITLE_SEPARATOR: &str = "[^";
/// Follows every name in a user listing
pub const USER_SEPARATOR: char = '-';
/// Rendered in place of an author or assignee that no longer exists
pub const USER_REMOVED: &str = "user_Removed";

const ISSUE_FIELDS: usize = 6;

/// How malformed persisted content is handled on load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeMode {
    /// Keep whatever decodes cleanly and log the rest
    #[default]
    Lenient,
    /// Refuse to load on the first warning
    Strict,
}

impl std::str::FromStr for DecodeMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lenient" => Ok(DecodeMode::Lenient),
            "strict" => Ok(DecodeMode::Strict),
            _ => Err(crate::Error::Config(format!("unknown decode mode '{s}'"))),
        }
    }
}

impl std::fmt::Display for DecodeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeMode::Lenient => write!(f, "lenient"),
            DecodeMode::Strict => write!(f, "strict"),
        }
    }
}

/// Which persisted stream a warning came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Issues,
    Comments,
    Users,
}

/// A non-fatal problem found while decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    /// The issue stream ended partway through a record
    PartialIssue { index: usize, fields: usize },
    /// A decoded issue had an empty title and was dropped
    EmptyTitle { index: usize },
    /// A later issue reused an earlier title and was dropped
    DuplicateTitle { index: usize, title: String },
    /// Bytes after the last delimiter of a stream
    TrailingBytes { stream: Stream, offset: usize },
    /// A comment block closed with a text that has no author
    UnpairedComment { title: String },
    /// A comment block closed without a title
    EmptyCommentBlock { offset: usize },
    /// The comment stream ended without a closing boundary
    UnterminatedBlock { title: String },
    /// A comment block names no remaining issue
    OrphanComments { title: String },
    /// A user name appeared more than once
    DuplicateUser { line: usize, name: String },
    /// A user line was empty
    BlankUser { line: usize },
}

impl DecodeWarning {
    pub fn stream(&self) -> Stream {
        match self {
            DecodeWarning::PartialIssue { .. }
            | DecodeWarning::EmptyTitle { .. }
            | DecodeWarning::DuplicateTitle { .. } => Stream::Issues,
            DecodeWarning::TrailingBytes { stream, .. } => *stream,
            DecodeWarning::UnpairedComment { .. }
            | DecodeWarning::EmptyCommentBlock { .. }
            | DecodeWarning::UnterminatedBlock { .. }
            | DecodeWarning::OrphanComments { .. } => Stream::Comments,
            DecodeWarning::DuplicateUser { .. } | DecodeWarning::BlankUser { .. } => {
                Stream::Users
            }
        }
    }
}

impl std::fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeWarning::PartialIssue { index, fields } => write!(
                f,
                "issue #{index} has {fields} of {ISSUE_FIELDS} fields"
            ),
            DecodeWarning::EmptyTitle { index } => write!(f, "issue #{index} has an empty title"),
            DecodeWarning::DuplicateTitle { index, title } => {
                write!(f, "issue #{index} repeats the title '{title}'")
            }
            DecodeWarning::TrailingBytes { offset, .. } => {
                write!(f, "unterminated data at byte {offset}")
            }
            DecodeWarning::UnpairedComment { title } => {
                write!(f, "comment without author on '{title}'")
            }
            DecodeWarning::EmptyCommentBlock { offset } => {
                write!(f, "comment block without title at byte {offset}")
            }
            DecodeWarning::UnterminatedBlock { title } => {
                write!(f, "comment block for '{title}' is not closed")
            }
            DecodeWarning::OrphanComments { title } => {
                write!(f, "comments for unknown issue '{title}'")
            }
            DecodeWarning::DuplicateUser { line, name } => {
                write!(f, "duplicate user '{name}' on line {line}")
            }
            DecodeWarning::BlankUser { line } => write!(f, "blank user on line {line}"),
        }
    }
}

/// Best-effort decoding result
#[derive(Debug)]
pub struct Decoded<T> {
    pub items: Vec<T>,
    pub warnings: Vec<DecodeWarning>,
}

impl<T> Default for Decoded<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Encoded issue and comment streams
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub issues: String,
    pub comments: String,
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Field(&'a str),
    Boundary,
    Trailing,
}

/// Splits a stream into delimiter-terminated fields, optionally recognising
/// comment boundaries at the start of a field.
struct Tokenizer<'a> {
    rest: &'a str,
    offset: usize,
    boundaries: bool,
}

impl<'a> Tokenizer<'a> {
    fn fields(input: &'a str) -> Self {
        Self {
            rest: input,
            offset: 0,
            boundaries: false,
        }
    }

    fn blocks(input: &'a str) -> Self {
        Self {
            rest: input,
            offset: 0,
            boundaries: true,
        }
    }

    fn advance(&mut self, len: usize) {
        self.rest = &self.rest[len..];
        self.offset += len;
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = (usize, Token<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let start = self.offset;
        if self.boundaries && self.rest.starts_with(COMMENT_BOUNDARY) {
            self.advance(COMMENT_BOUNDARY.len());
            return Some((start, Token::Boundary));
        }
        let rest = self.rest;
        match rest.find(FIELD_DELIM) {
            Some(pos) => {
                self.advance(pos + FIELD_DELIM.len());
                Some((start, Token::Field(&rest[..pos])))
            }
            None => {
                self.advance(rest.len());
                Some((start, Token::Trailing))
            }
        }
    }
}

/// Render a weak user reference, falling back to [`USER_REMOVED`]
pub fn resolve_name<'a>(name: &'a str, known: impl Fn(&str) -> bool) -> &'a str {
    if !name.is_empty() && known(name) {
        name
    } else {
        USER_REMOVED
    }
}

/// Encode issues and their comments into the two streams
pub fn encode_issues(issues: &[Issue], known: impl Fn(&str) -> bool) -> Encoded {
    let mut out = Encoded::default();
    for issue in issues {
        for field in [
            issue.title(),
            issue.description(),
            issue.os(),
            issue.issue_type(),
            resolve_name(issue.author(), &known),
            resolve_name(issue.assignee(), &known),
        ] {
            push_field(&mut out.issues, field);
        }

        if issue.comments().is_empty() {
            continue;
        }
        push_field(&mut out.comments, issue.title());
        for comment in issue.comments() {
            push_field(&mut out.comments, comment.text());
            push_field(&mut out.comments, resolve_name(comment.author(), &known));
        }
        out.comments.push_str(COMMENT_BOUNDARY);
    }
    out
}

fn push_field(buf: &mut String, field: &str) {
    buf.push_str(field);
    buf.push_str(FIELD_DELIM);
}

/// Decode the issue stream and attach comment blocks from the comment stream
pub fn decode_issues(issues: &str, comments: &str) -> Decoded<Issue> {
    let mut decoded = Decoded::default();
    let mut fields: Vec<&str> = Vec::with_capacity(ISSUE_FIELDS);
    let mut index = 0;

    for (offset, token) in Tokenizer::fields(issues) {
        match token {
            Token::Field(value) => {
                fields.push(value);
                if fields.len() == ISSUE_FIELDS {
                    if fields[0].is_empty() {
                        decoded.warnings.push(DecodeWarning::EmptyTitle { index });
                    } else {
                        decoded.items.push(Issue::new(NewIssue {
                            title: fields[0].to_string(),
                            description: fields[1].to_string(),
                            os: fields[2].to_string(),
                            issue_type: fields[3].to_string(),
                            author: fields[4].to_string(),
                            assignee: fields[5].to_string(),
                        }));
                    }
                    fields.clear();
                    index += 1;
                }
            }
            Token::Trailing => decoded.warnings.push(DecodeWarning::TrailingBytes {
                stream: Stream::Issues,
                offset,
            }),
            Token::Boundary => unreachable!("field tokenizer never yields boundaries"),
        }
    }
    if !fields.is_empty() {
        decoded.warnings.push(DecodeWarning::PartialIssue {
            index,
            fields: fields.len(),
        });
    }

    let blocks = decode_comment_blocks(comments, &mut decoded.warnings);
    attach_comments(&mut decoded.items, blocks, &mut decoded.warnings);
    decoded
}

/// Keep only the first issue for each title.
///
/// Runs after comments are attached, so a dropped issue takes its own comment
/// block with it.
pub fn dedupe_titles(issues: &mut Vec<Issue>) -> Vec<DecodeWarning> {
    let mut seen = HashSet::new();
    let mut warnings = Vec::new();
    let mut index = 0;
    issues.retain(|issue| {
        let keep = seen.insert(issue.title().to_string());
        if !keep {
            warnings.push(DecodeWarning::DuplicateTitle {
                index,
                title: issue.title().to_string(),
            });
        }
        index += 1;
        keep
    });
    warnings
}

#[derive(Debug)]
struct CommentBlock {
    title: String,
    comments: Vec<Comment>,
}

/// What the next field of a comment block holds
enum BlockState<'a> {
    Title,
    Text,
    Author(&'a str),
}

fn decode_comment_blocks(input: &str, warnings: &mut Vec<DecodeWarning>) -> Vec<CommentBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<CommentBlock> = None;
    let mut state = BlockState::Title;

    for (offset, token) in Tokenizer::blocks(input) {
        match token {
            Token::Field(value) => {
                state = match state {
                    BlockState::Title => {
                        current = Some(CommentBlock {
                            title: value.to_string(),
                            comments: Vec::new(),
                        });
                        BlockState::Text
                    }
                    BlockState::Text => BlockState::Author(value),
                    BlockState::Author(text) => {
                        if let Some(block) = current.as_mut() {
                            block.comments.push(Comment::new(text, value));
                        }
                        BlockState::Text
                    }
                };
            }
            Token::Boundary => {
                match current.take() {
                    Some(block) => {
                        if matches!(state, BlockState::Author(_)) {
                            warnings.push(DecodeWarning::UnpairedComment {
                                title: block.title.clone(),
                            });
                        }
                        blocks.push(block);
                    }
                    None => warnings.push(DecodeWarning::EmptyCommentBlock { offset }),
                }
                state = BlockState::Title;
            }
            Token::Trailing => warnings.push(DecodeWarning::TrailingBytes {
                stream: Stream::Comments,
                offset,
            }),
        }
    }

    if let Some(block) = current {
        warnings.push(DecodeWarning::UnterminatedBlock {
            title: block.title.clone(),
        });
        blocks.push(block);
    }
    blocks
}

/// Blocks are written in issue order, so each block is matched against the
/// issues that follow the previously matched one.
fn attach_comments(
    issues: &mut [Issue],
    blocks: Vec<CommentBlock>,
    warnings: &mut Vec<DecodeWarning>,
) {
    let mut next = 0;
    for block in blocks {
        match issues[next..]
            .iter()
            .position(|issue| issue.title() == block.title)
        {
            Some(pos) => {
                let issue = &mut issues[next + pos];
                for comment in block.comments {
                    issue.add_comment(comment);
                }
                next += pos + 1;
            }
            None => warnings.push(DecodeWarning::OrphanComments { title: block.title }),
        }
    }
}

/// Encode users one per line
pub fn encode_users(users: &[User]) -> String {
    let mut out = String::new();
    for user in users {
        out.push_str(user.name());
        out.push('\n');
    }
    out
}

/// Decode the user list, skipping blank lines and repeated names
pub fn decode_users(input: &str) -> Decoded<User> {
    let mut decoded = Decoded::default();
    let mut seen = HashSet::new();
    for (i, line) in input.lines().enumerate() {
        let line_number = i + 1;
        if line.is_empty() {
            decoded
                .warnings
                .push(DecodeWarning::BlankUser { line: line_number });
            continue;
        }
        if !seen.insert(line) {
            decoded.warnings.push(DecodeWarning::DuplicateUser {
                line: line_number,
                name: line.to_string(),
            });
            continue;
        }
        decoded.items.push(User::new(line));
    }
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(title: &str, author: &str, assignee: &str) -> Issue {
        Issue::new(NewIssue {
            title: title.into(),
            description: "desc".into(),
            os: "Linux".into(),
            issue_type: "Bug".into(),
            author: author.into(),
            assignee: assignee.into(),
        })
    }

    fn everyone(_: &str) -> bool {
        true
    }

    #[test]
    fn test_encode_layout() {
        let mut first = issue("one", "alice", "bob");
        first.add_comment(Comment::new("looks bad", "bob"));
        first.add_comment(Comment::new("fixed", "alice"));
        let second = issue("two", "alice", "alice");

        let encoded = encode_issues(&[first, second], everyone);
        assert_eq!(
            encoded.issues,
            "one^]desc^]Linux^]Bug^]alice^]bob^]two^]desc^]Linux^]Bug^]alice^]alice^]"
        );
        assert_eq!(encoded.comments, "one^]looks bad^]bob^]fixed^]alice^]**");
    }

    #[test]
    fn test_encode_resolves_unknown_users() {
        let mut only = issue("one", "ghost", "");
        only.add_comment(Comment::new("boo", "ghost"));
        only.add_comment(Comment::new("hi", "alice"));

        let encoded = encode_issues(&[only], |name| name == "alice");
        assert_eq!(
            encoded.issues,
            "one^]desc^]Linux^]Bug^]user_Removed^]user_Removed^]"
        );
        assert_eq!(
            encoded.comments,
            "one^]boo^]user_Removed^]hi^]alice^]**"
        );
    }

    #[test]
    fn test_decode_attaches_comments_past_uncommented_issues() {
        let issues = "a^]d^]o^]t^]u^]v^]b^]d^]o^]t^]u^]v^]";
        let comments = "b^]first^]u^]second^]v^]**";

        let decoded = decode_issues(issues, comments);
        assert!(decoded.warnings.is_empty());
        assert_eq!(decoded.items.len(), 2);
        assert!(decoded.items[0].comments().is_empty());
        assert_eq!(
            decoded.items[1].comments(),
            &[Comment::new("first", "u"), Comment::new("second", "v")]
        );
    }

    #[test]
    fn test_dedupe_keeps_first_title() {
        let issues = "a^]one^]o^]t^]u^]v^]b^]d^]o^]t^]u^]v^]a^]two^]o^]t^]u^]v^]";
        let comments = "a^]first^]u^]**a^]second^]v^]**";

        let mut decoded = decode_issues(issues, comments);
        assert!(decoded.warnings.is_empty());
        let warnings = dedupe_titles(&mut decoded.items);

        assert_eq!(
            warnings,
            vec![DecodeWarning::DuplicateTitle {
                index: 2,
                title: "a".into(),
            }]
        );
        assert_eq!(decoded.items.len(), 2);
        assert_eq!(decoded.items[0].description(), "one");
        assert_eq!(decoded.items[0].comments(), &[Comment::new("first", "u")]);
        assert_eq!(decoded.items[1].title(), "b");
    }

    #[test]
    fn test_decode_empty_streams() {
        let decoded = decode_issues("", "");
        assert!(decoded.items.is_empty());
        assert!(decoded.warnings.is_empty());
    }

    #[test]
    fn test_decode_keeps_empty_fields() {
        let decoded = decode_issues("a^]^]^]^]^]^]", "");
        assert_eq!(decoded.items.len(), 1);
        assert_eq!(decoded.items[0].description(), "");
        assert_eq!(decoded.items[0].assignee(), "");
    }

    #[test]
    fn test_decode_reports_partial_issue() {
        let decoded = decode_issues("a^]d^]o^]t^]u^]v^]b^]d^]", "");
        assert_eq!(decoded.items.len(), 1);
        assert_eq!(
            decoded.warnings,
            vec![DecodeWarning::PartialIssue { index: 1, fields: 2 }]
        );
    }

    #[test]
    fn test_decode_reports_trailing_bytes() {
        let decoded = decode_issues("a^]d^]o^]t^]u^]v^]junk", "");
        assert_eq!(decoded.items.len(), 1);
        assert_eq!(
            decoded.warnings,
            vec![DecodeWarning::TrailingBytes {
                stream: Stream::Issues,
                offset: 18
            }]
        );
    }

    #[test]
    fn test_decode_drops_empty_title() {
        let decoded = decode_issues("^]d^]o^]t^]u^]v^]", "");
        assert!(decoded.items.is_empty());
        assert_eq!(decoded.warnings, vec![DecodeWarning::EmptyTitle { index: 0 }]);
    }

    #[test]
    fn test_decode_reports_comment_problems() {
        let issues = "a^]d^]o^]t^]u^]v^]";

        let unpaired = decode_issues(issues, "a^]text^]author^]dangling^]**");
        assert_eq!(unpaired.items[0].comments().len(), 1);
        assert_eq!(
            unpaired.warnings,
            vec![DecodeWarning::UnpairedComment { title: "a".into() }]
        );

        let orphan = decode_issues(issues, "zzz^]text^]author^]**");
        assert!(orphan.items[0].comments().is_empty());
        assert_eq!(
            orphan.warnings,
            vec![DecodeWarning::OrphanComments { title: "zzz".into() }]
        );

        let unterminated = decode_issues(issues, "a^]text^]author^]");
        assert_eq!(unterminated.items[0].comments().len(), 1);
        assert_eq!(
            unterminated.warnings,
            vec![DecodeWarning::UnterminatedBlock { title: "a".into() }]
        );

        let empty = decode_issues(issues, "**");
        assert_eq!(
            empty.warnings,
            vec![DecodeWarning::EmptyCommentBlock { offset: 0 }]
        );
    }

    #[test]
    fn test_comment_text_may_start_with_star() {
        let mut only = issue("a", "u", "v");
        only.add_comment(Comment::new("*starred", "u"));
        let mut next = issue("b", "u", "v");
        next.add_comment(Comment::new("ok*", "v"));

        let encoded = encode_issues(&[only.clone(), next.clone()], everyone);
        let decoded = decode_issues(&encoded.issues, &encoded.comments);
        assert!(decoded.warnings.is_empty());
        assert_eq!(decoded.items, vec![only, next]);
    }

    #[test]
    fn test_users_roundtrip_and_warnings() {
        let users = vec![User::new("alice"), User::new("Obi-Wan Kenobi")];
        let text = encode_users(&users);
        assert_eq!(text, "alice\nObi-Wan Kenobi\n");
        assert_eq!(decode_users(&text).items, users);

        let decoded = decode_users("alice\n\nbob\nalice\n");
        assert_eq!(decoded.items, vec![User::new("alice"), User::new("bob")]);
        assert_eq!(
            decoded.warnings,
            vec![
                DecodeWarning::BlankUser { line: 2 },
                DecodeWarning::DuplicateUser {
                    line: 4,
                    name: "alice".into()
                },
            ]
        );
    }

    #[test]
    fn test_resolve_name() {
        assert_eq!(resolve_name("alice", everyone), "alice");
        assert_eq!(resolve_name("", everyone), USER_REMOVED);
        assert_eq!(resolve_name("bob", |n| n == "alice"), USER_REMOVED);
    }
}
