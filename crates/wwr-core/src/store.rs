//! Flat-file store for the tracker
//!
//! Three files in one data directory. They are read once on open and fully
//! rewritten after every mutation.

use crate::codec::{self, DecodeMode, DecodeWarning, Stream};
use crate::{Config, Error, Issue, Result, User};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Paths and decode policy for the persisted files
#[derive(Debug, Clone)]
pub struct FileStore {
    issues: PathBuf,
    comments: PathBuf,
    users: PathBuf,
    mode: DecodeMode,
    unique_titles: bool,
}

/// Everything loaded from disk
#[derive(Debug, Default)]
pub struct Loaded {
    pub issues: Vec<Issue>,
    pub users: Vec<User>,
    pub warnings: Vec<DecodeWarning>,
}

impl FileStore {
    pub fn new(config: &Config) -> Self {
        Self {
            issues: config.issues_path(),
            comments: config.comments_path(),
            users: config.users_path(),
            mode: config.decode,
            unique_titles: config.unique_titles,
        }
    }

    pub fn issues_path(&self) -> &Path {
        &self.issues
    }

    pub fn comments_path(&self) -> &Path {
        &self.comments
    }

    pub fn users_path(&self) -> &Path {
        &self.users
    }

    fn path_for(&self, stream: Stream) -> &Path {
        match stream {
            Stream::Issues => &self.issues,
            Stream::Comments => &self.comments,
            Stream::Users => &self.users,
        }
    }

    /// Load all files. Missing files count as empty.
    pub fn load(&self) -> Result<Loaded> {
        let issues_text = read_optional(&self.issues)?;
        let comments_text = read_optional(&self.comments)?;
        let users_text = read_optional(&self.users)?;

        let mut issues = codec::decode_issues(&issues_text, &comments_text);
        let users = codec::decode_users(&users_text);

        let mut warnings = issues.warnings;
        if self.unique_titles {
            warnings.extend(codec::dedupe_titles(&mut issues.items));
        }
        warnings.extend(users.warnings);

        for warning in &warnings {
            let file = self.path_for(warning.stream());
            if self.mode == DecodeMode::Strict {
                return Err(Error::Decode {
                    file: file.display().to_string(),
                    warning: warning.clone(),
                });
            }
            tracing::warn!(file = %file.display(), "{}", warning);
        }

        tracing::info!(
            issues = issues.items.len(),
            users = users.items.len(),
            warnings = warnings.len(),
            "loaded tracker state"
        );

        Ok(Loaded {
            issues: issues.items,
            users: users.items,
            warnings,
        })
    }

    /// Rewrite all files. `known` decides which user names still resolve.
    ///
    /// All three temp files are written before any of them is renamed into
    /// place, so an encoding or write failure leaves the old files intact. A
    /// failed rename can leave the files before it already replaced.
    pub fn save(&self, issues: &[Issue], users: &[User], known: impl Fn(&str) -> bool) -> Result<()> {
        let encoded = codec::encode_issues(issues, known);
        let staged = [
            stage(&self.issues, &encoded.issues)?,
            stage(&self.comments, &encoded.comments)?,
            stage(&self.users, &codec::encode_users(users))?,
        ];
        for (tmp, target) in staged.iter().zip([&self.issues, &self.comments, &self.users]) {
            fs::rename(tmp, target)?;
        }
        tracing::debug!(
            issues = issues.len(),
            users = users.len(),
            "rewrote tracker files"
        );
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

/// Write `content` to a temp file next to `path` and return the temp path
fn stage(path: &Path, content: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = File::create(&tmp)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    Ok(tmp)
}
