//! The tracker: owner of all issues and users
//!
//! Every mutation is applied in memory, then all files are rewritten before the
//! call returns. If the rewrite fails the in-memory change is undone and the
//! previous state is written back over any file the failed rewrite replaced.

use crate::codec::{self, USER_REMOVED};
use crate::store::FileStore;
use crate::{Comment, Config, Error, Issue, IssueView, NewIssue, Result, User, validate};

/// Result of deleting a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRemoval {
    pub user: User,
    /// Issues whose assignee was cleared
    pub unassigned: usize,
    /// Comments whose author became [`USER_REMOVED`]
    pub orphaned_comments: usize,
}

/// In-memory issue tracker, optionally backed by flat files
#[derive(Debug)]
pub struct Tracker {
    issues: Vec<Issue>,
    users: Vec<User>,
    store: Option<FileStore>,
    unique_titles: bool,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl Tracker {
    /// A tracker with no backing files
    pub fn in_memory() -> Self {
        Self {
            issues: Vec::new(),
            users: Vec::new(),
            store: None,
            unique_titles: true,
        }
    }

    /// Load the tracker from the files named by `config`
    pub fn open(config: &Config) -> Result<Self> {
        let store = FileStore::new(config);
        let loaded = store.load()?;
        Ok(Self {
            issues: loaded.issues,
            users: loaded.users,
            store: Some(store),
            unique_titles: config.unique_titles,
        })
    }

    /// Allow or refuse issues that share a title
    pub fn with_unique_titles(mut self, unique: bool) -> Self {
        self.unique_titles = unique;
        self
    }

    pub fn store(&self) -> Option<&FileStore> {
        self.store.as_ref()
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Resolve a weak user reference
    pub fn resolve_user(&self, name: &str) -> Option<&User> {
        self.users.iter().find(|u| u.name() == name)
    }

    fn is_known(&self, name: &str) -> bool {
        self.resolve_user(name).is_some()
    }

    fn persist(&self) -> Result<()> {
        match &self.store {
            Some(store) => store.save(&self.issues, &self.users, |name| self.is_known(name)),
            None => Ok(()),
        }
    }

    /// Persist, running `undo` if the write fails.
    ///
    /// The restored state is written again, since the failed rewrite may have
    /// replaced some of the files before stopping.
    fn persist_or(&mut self, undo: impl FnOnce(&mut Self)) -> Result<()> {
        if let Err(e) = self.persist() {
            undo(self);
            tracing::error!(error = %e, "rewrite failed, change rolled back");
            if let Err(restore) = self.persist() {
                tracing::error!(error = %restore, "could not restore files after failed rewrite");
            }
            return Err(e);
        }
        Ok(())
    }

    // Issues

    /// Create an issue and append it to the collection
    pub fn create_issue(&mut self, fields: NewIssue) -> Result<&Issue> {
        validate::issue(&fields)?;
        if self.unique_titles && self.issues.iter().any(|i| i.title() == fields.title) {
            return Err(Error::AlreadyExists(fields.title));
        }

        self.issues.push(Issue::new(fields));
        self.persist_or(|t| {
            t.issues.pop();
        })?;

        let issue = &self.issues[self.issues.len() - 1];
        tracing::debug!(title = issue.title(), "created issue");
        Ok(issue)
    }

    /// All titles in insertion order
    pub fn issue_titles(&self) -> Vec<&str> {
        self.issues.iter().map(Issue::title).collect()
    }

    /// Find an issue by exact title. With duplicate titles the last one wins.
    pub fn find_issue(&self, title: &str) -> Option<&Issue> {
        self.issues.iter().rev().find(|i| i.title() == title)
    }

    /// Look up an issue with all user references resolved
    pub fn get_issue(&self, title: &str) -> Result<IssueView> {
        self.find_issue(title)
            .map(|issue| self.view(issue))
            .ok_or_else(|| Error::NotFound(title.to_string()))
    }

    /// Resolve an issue's author, assignee and comment authors
    pub fn view(&self, issue: &Issue) -> IssueView {
        let known = |name: &str| self.is_known(name);
        IssueView {
            title: issue.title().to_string(),
            description: issue.description().to_string(),
            os: issue.os().to_string(),
            issue_type: issue.issue_type().to_string(),
            author: codec::resolve_name(issue.author(), known).to_string(),
            assignee: codec::resolve_name(issue.assignee(), known).to_string(),
            comments: issue
                .comments()
                .iter()
                .map(|c| Comment::new(c.text(), codec::resolve_name(c.author(), known)))
                .collect(),
        }
    }

    /// Remove the first issue with the given title
    pub fn delete_issue(&mut self, title: &str) -> Result<Issue> {
        let index = self
            .issues
            .iter()
            .position(|i| i.title() == title)
            .ok_or_else(|| Error::NotFound(title.to_string()))?;

        let removed = self.issues.remove(index);
        let restore = removed.clone();
        self.persist_or(move |t| t.issues.insert(index, restore))?;

        tracing::debug!(title, "deleted issue");
        Ok(removed)
    }

    /// Append a comment to the first issue with the given title
    pub fn add_comment(&mut self, title: &str, text: &str, author: &str) -> Result<&Comment> {
        validate::comment(text, author)?;
        let index = self
            .issues
            .iter()
            .position(|i| i.title() == title)
            .ok_or_else(|| Error::NotFound(title.to_string()))?;

        self.issues[index].add_comment(Comment::new(text, author));
        self.persist_or(|t| t.issues[index].pop_comment())?;

        tracing::debug!(title, author, "added comment");
        let comments = self.issues[index].comments();
        Ok(&comments[comments.len() - 1])
    }

    // Users

    /// Register a new user. Names are case-sensitive.
    pub fn create_user(&mut self, name: &str) -> Result<&User> {
        validate::user_name(name)?;
        if self.is_known(name) {
            return Err(Error::AlreadyExists(name.to_string()));
        }

        self.users.push(User::new(name));
        self.persist_or(|t| {
            t.users.pop();
        })?;

        tracing::debug!(name, "created user");
        Ok(&self.users[self.users.len() - 1])
    }

    pub fn get_user(&self, name: &str) -> Result<&User> {
        self.resolve_user(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Remove a user and orphan everything that referenced them.
    ///
    /// Issues assigned to the user lose their assignee and the user's comments
    /// are attributed to [`USER_REMOVED`]. Nothing else is deleted.
    pub fn delete_user(&mut self, name: &str) -> Result<UserRemoval> {
        let user_index = self
            .users
            .iter()
            .position(|u| u.name() == name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        let user = self.users.remove(user_index);

        let mut unassigned = Vec::new();
        let mut orphaned = Vec::new();
        for (i, issue) in self.issues.iter_mut().enumerate() {
            if issue.assignee() == name {
                issue.clear_assignee();
                unassigned.push(i);
            }
            for (j, comment) in issue.comments_mut().iter_mut().enumerate() {
                if comment.author() == name {
                    comment.set_author(USER_REMOVED);
                    orphaned.push((i, j));
                }
            }
        }

        let removal = UserRemoval {
            user: user.clone(),
            unassigned: unassigned.len(),
            orphaned_comments: orphaned.len(),
        };

        self.persist_or(move |t| {
            for i in unassigned {
                t.issues[i].set_assignee(user.name());
            }
            for (i, j) in orphaned {
                t.issues[i].comments_mut()[j].set_author(user.name());
            }
            t.users.insert(user_index, user);
        })?;

        tracing::debug!(
            name,
            unassigned = removal.unassigned,
            orphaned_comments = removal.orphaned_comments,
            "deleted user"
        );
        Ok(removal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_issue(title: &str, author: &str, assignee: &str) -> NewIssue {
        NewIssue {
            title: title.into(),
            description: "desc".into(),
            os: "os".into(),
            issue_type: "type".into(),
            author: author.into(),
            assignee: assignee.into(),
        }
    }

    #[test]
    fn test_titles_in_insertion_order() {
        let mut tracker = Tracker::in_memory();
        assert!(tracker.issue_titles().is_empty());

        for title in ["hello", "hello there", "General Kenobi"] {
            tracker.create_issue(new_issue(title, "u", "a")).unwrap();
        }
        assert_eq!(
            tracker.issue_titles(),
            vec!["hello", "hello there", "General Kenobi"]
        );
    }

    #[test]
    fn test_duplicate_title_rejected() {
        let mut tracker = Tracker::in_memory();
        tracker.create_issue(new_issue("T", "u", "a")).unwrap();

        let err = tracker.create_issue(new_issue("T", "u", "b")).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(t) if t == "T"));
        assert_eq!(tracker.issues().len(), 1);
    }

    #[test]
    fn test_duplicate_titles_last_match_wins() {
        let mut tracker = Tracker::in_memory().with_unique_titles(false);
        tracker.create_issue(new_issue("T", "u", "first")).unwrap();
        tracker.create_issue(new_issue("T", "u", "second")).unwrap();
        tracker.create_user("second").unwrap();

        assert_eq!(tracker.get_issue("T").unwrap().assignee, "second");

        // delete removes the first match only
        let removed = tracker.delete_issue("T").unwrap();
        assert_eq!(removed.assignee(), "first");
        assert_eq!(tracker.issues().len(), 1);
    }

    #[test]
    fn test_get_issue_resolves_references() {
        let mut tracker = Tracker::in_memory();
        tracker.create_user("alice").unwrap();
        tracker
            .create_issue(new_issue("T", "alice", "ghost"))
            .unwrap();
        tracker.add_comment("T", "hi", "nobody").unwrap();

        let view = tracker.get_issue("T").unwrap();
        assert_eq!(view.author, "alice");
        assert_eq!(view.assignee, USER_REMOVED);
        assert_eq!(view.comments, vec![Comment::new("hi", USER_REMOVED)]);

        // stored values are untouched
        let stored = tracker.find_issue("T").unwrap();
        assert_eq!(stored.assignee(), "ghost");
        assert_eq!(stored.comments()[0].author(), "nobody");
    }

    #[test]
    fn test_get_missing_issue() {
        let tracker = Tracker::in_memory();
        assert!(matches!(tracker.get_issue("X"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_delete_missing_issue() {
        let mut tracker = Tracker::in_memory();
        tracker.create_issue(new_issue("T", "u", "a")).unwrap();
        assert!(matches!(tracker.delete_issue("X"), Err(Error::NotFound(_))));
        assert_eq!(tracker.issues().len(), 1);
    }

    #[test]
    fn test_add_comment_to_missing_issue() {
        let mut tracker = Tracker::in_memory();
        assert!(matches!(
            tracker.add_comment("X", "text", "alice"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_create_user_conflict() {
        let mut tracker = Tracker::in_memory();
        assert_eq!(tracker.create_user("alice").unwrap().name(), "alice");
        assert!(matches!(
            tracker.create_user("alice"),
            Err(Error::AlreadyExists(_))
        ));
        // case-sensitive
        tracker.create_user("Alice").unwrap();
        assert_eq!(tracker.users().len(), 2);
    }

    #[test]
    fn test_get_user() {
        let mut tracker = Tracker::in_memory();
        tracker.create_user("alice").unwrap();
        assert_eq!(tracker.get_user("alice").unwrap().name(), "alice");
        assert!(matches!(tracker.get_user("bob"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_delete_user_cascades() {
        let mut tracker = Tracker::in_memory();
        tracker.create_user("A").unwrap();
        tracker.create_user("B").unwrap();
        tracker.create_issue(new_issue("one", "B", "A")).unwrap();
        tracker.create_issue(new_issue("two", "A", "B")).unwrap();
        tracker.add_comment("one", "from A", "A").unwrap();
        tracker.add_comment("one", "from B", "B").unwrap();
        tracker.add_comment("two", "again A", "A").unwrap();

        let removal = tracker.delete_user("A").unwrap();
        assert_eq!(removal.user.name(), "A");
        assert_eq!(removal.unassigned, 1);
        assert_eq!(removal.orphaned_comments, 2);

        assert_eq!(tracker.issues().len(), 2);
        let one = tracker.find_issue("one").unwrap();
        assert_eq!(one.assignee(), "");
        assert_eq!(one.comments()[0].author(), USER_REMOVED);
        assert_eq!(one.comments()[1].author(), "B");

        let two = tracker.get_issue("two").unwrap();
        assert_eq!(two.author, USER_REMOVED);
        assert_eq!(two.assignee, "B");
        assert_eq!(two.comments[0].author(), USER_REMOVED);

        // the name can be reused
        tracker.create_user("A").unwrap();
    }

    #[test]
    fn test_delete_missing_user() {
        let mut tracker = Tracker::in_memory();
        tracker.create_user("alice").unwrap();
        assert!(matches!(tracker.delete_user("bob"), Err(Error::NotFound(_))));
        assert_eq!(tracker.users().len(), 1);
    }

    #[test]
    fn test_invalid_input_leaves_state_untouched() {
        let mut tracker = Tracker::in_memory();
        assert!(matches!(
            tracker.create_issue(new_issue("bad^]title", "u", "a")),
            Err(Error::InvalidField { .. })
        ));
        assert!(matches!(
            tracker.create_user(""),
            Err(Error::InvalidField { .. })
        ));
        assert!(tracker.issues().is_empty());
        assert!(tracker.users().is_empty());
    }
}
