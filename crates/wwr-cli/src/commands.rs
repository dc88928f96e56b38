//! CLI command implementations

use anyhow::{Context as _, Result, anyhow, bail};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use wwr_core::{Config, IssueView, NewIssue, Tracker, USER_REMOVED};

/// Settings shared by every command
pub struct Context {
    config: Config,
    config_path: Option<PathBuf>,
    author: Option<String>,
    json: bool,
}

impl Context {
    pub fn new(
        config_path: Option<PathBuf>,
        data_dir: Option<PathBuf>,
        author: Option<String>,
        json: bool,
    ) -> Result<Self> {
        let mut config =
            Config::discover(config_path.as_deref()).context("Failed to load config")?;
        if let Some(data_dir) = data_dir {
            config.data_dir = data_dir;
        }
        Ok(Self {
            config,
            config_path: config_path.or_else(Config::default_path),
            author,
            json,
        })
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    fn open(&self) -> Result<Tracker> {
        Tracker::open(&self.config).with_context(|| {
            format!(
                "Failed to open tracker in {}",
                self.config.data_dir.display()
            )
        })
    }

    /// The acting user, which must be registered
    fn author<'t>(&self, tracker: &'t Tracker) -> Result<&'t str> {
        let name = self
            .author
            .as_deref()
            .ok_or_else(|| anyhow!("No user given; pass --as <name> or set WWR_USER"))?;
        let user = tracker
            .get_user(name)
            .map_err(|_| anyhow!("Unknown user '{}'; create it with `wwr user create`", name))?;
        Ok(user.name())
    }
}

#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Type")]
    issue_type: String,
    #[tabled(rename = "OS")]
    os: String,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "Assignee")]
    assignee: String,
    #[tabled(rename = "Comments")]
    comments: usize,
}

impl From<IssueView> for IssueRow {
    fn from(view: IssueView) -> Self {
        Self {
            title: view.title,
            issue_type: view.issue_type,
            os: view.os,
            author: view.author,
            assignee: view.assignee,
            comments: view.comments.len(),
        }
    }
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Assigned")]
    assigned: usize,
    #[tabled(rename = "Comments")]
    comments: usize,
}

fn issue_views(tracker: &Tracker) -> Vec<IssueView> {
    tracker.issues().iter().map(|i| tracker.view(i)).collect()
}

fn user_rows(tracker: &Tracker) -> Vec<UserRow> {
    tracker
        .users()
        .iter()
        .map(|user| UserRow {
            name: user.name().to_string(),
            assigned: tracker
                .issues()
                .iter()
                .filter(|i| i.assignee() == user.name())
                .count(),
            comments: tracker
                .issues()
                .iter()
                .flat_map(|i| i.comments())
                .filter(|c| c.author() == user.name())
                .count(),
        })
        .collect()
}

fn print_table<R: Tabled>(rows: Vec<R>) {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

/// Dim the placeholder for a removed user
fn person(name: &str) -> String {
    if name == USER_REMOVED {
        name.dimmed().to_string()
    } else {
        name.to_string()
    }
}

pub fn issue_create(
    ctx: &Context,
    title: String,
    description: String,
    os: String,
    issue_type: String,
    assignee: String,
) -> Result<()> {
    let mut tracker = ctx.open()?;
    let author = ctx.author(&tracker)?.to_string();

    if !assignee.is_empty() && tracker.resolve_user(&assignee).is_none() {
        tracing::warn!(%assignee, "assignee is not a registered user");
    }

    let title = tracker
        .create_issue(NewIssue {
            title,
            description,
            os,
            issue_type,
            author,
            assignee,
        })?
        .title()
        .to_string();
    let view = tracker.get_issue(&title)?;

    if ctx.json {
        println!("{}", serde_json::to_string(&view)?);
    } else {
        println!("{} Created issue: {}", "✓".green(), view.title);
        println!("  Author:   {}", view.author);
        println!("  Assignee: {}", person(&view.assignee));
    }
    Ok(())
}

pub fn issue_list(ctx: &Context) -> Result<()> {
    let tracker = ctx.open()?;
    let views = issue_views(&tracker);

    if ctx.json {
        println!("{}", serde_json::to_string(&views)?);
    } else if views.is_empty() {
        println!("No issues found");
    } else {
        print_table(views.into_iter().map(IssueRow::from).collect());
    }
    Ok(())
}

pub fn issue_show(ctx: &Context, title: &str) -> Result<()> {
    let tracker = ctx.open()?;
    let view = tracker.get_issue(title)?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{}", view.title.cyan().bold());
    println!();
    println!("Type:     {}", view.issue_type);
    println!("OS:       {}", view.os);
    println!("Author:   {}", person(&view.author));
    println!("Assignee: {}", person(&view.assignee));

    if !view.description.is_empty() {
        println!();
        println!("{}", "Description:".bold());
        println!("{}", view.description);
    }

    if !view.comments.is_empty() {
        println!();
        println!("{}", "Comments:".bold());
        for comment in &view.comments {
            println!("  {}: {}", person(comment.author()).blue(), comment.text());
        }
    }
    Ok(())
}

pub fn issue_delete(ctx: &Context, title: &str) -> Result<()> {
    let mut tracker = ctx.open()?;
    let issue = tracker.delete_issue(title)?;

    if ctx.json {
        println!("{}", serde_json::to_string(&tracker.view(&issue))?);
    } else {
        println!(
            "{} Deleted issue: {} ({} comments)",
            "✓".green(),
            issue.title(),
            issue.comments().len()
        );
    }
    Ok(())
}

pub fn comment_add(ctx: &Context, title: &str, text: &str) -> Result<()> {
    let mut tracker = ctx.open()?;
    let author = ctx.author(&tracker)?.to_string();
    tracker.add_comment(title, text, &author)?;

    if ctx.json {
        println!("{}", serde_json::to_string(&tracker.get_issue(title)?)?);
    } else {
        println!("{} Comment added to {}", "✓".green(), title);
    }
    Ok(())
}

pub fn user_create(ctx: &Context, name: &str) -> Result<()> {
    let mut tracker = ctx.open()?;
    let user = tracker.create_user(name)?;

    if ctx.json {
        println!("{}", serde_json::to_string(user)?);
    } else {
        println!("{} Created user: {}", "✓".green(), user);
    }
    Ok(())
}

pub fn user_show(ctx: &Context, name: &str) -> Result<()> {
    let tracker = ctx.open()?;
    let user = tracker.get_user(name)?;

    if ctx.json {
        println!("{}", serde_json::to_string(user)?);
    } else {
        println!("{}", user.name().cyan());
    }
    Ok(())
}

pub fn user_list(ctx: &Context) -> Result<()> {
    let tracker = ctx.open()?;

    if ctx.json {
        println!("{}", serde_json::to_string(tracker.users())?);
    } else if tracker.users().is_empty() {
        println!("No users found");
    } else {
        print_table(user_rows(&tracker));
    }
    Ok(())
}

pub fn user_delete(ctx: &Context, name: &str) -> Result<()> {
    let mut tracker = ctx.open()?;
    let removal = tracker.delete_user(name)?;

    if ctx.json {
        println!(
            "{}",
            serde_json::json!({
                "name": removal.user.name(),
                "unassigned": removal.unassigned,
                "orphaned_comments": removal.orphaned_comments,
            })
        );
    } else {
        println!("{} Removed user: {}", "✓".green(), removal.user);
        if removal.unassigned > 0 {
            println!("  Unassigned from {} issue(s)", removal.unassigned);
        }
        if removal.orphaned_comments > 0 {
            println!("  {} comment(s) now by {}", removal.orphaned_comments, USER_REMOVED);
        }
    }
    Ok(())
}

/// Show current configuration
pub fn config_show(ctx: &Context) -> Result<()> {
    let config = &ctx.config;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    println!("{}", "Current configuration:".bold());
    println!();
    println!("data_dir = \"{}\"", config.data_dir.display());
    println!("unique_titles = {}", config.unique_titles);
    println!("decode = \"{}\"", config.decode);
    println!();
    println!("[files]");
    println!("issues = \"{}\"", config.files.issues);
    println!("comments = \"{}\"", config.files.comments);
    println!("users = \"{}\"", config.files.users);
    println!();
    println!("[server]");
    println!("host = \"{}\"", config.server.host);
    println!("port = {}", config.server.port);
    Ok(())
}

pub fn config_path(ctx: &Context) -> Result<()> {
    match ctx.config_path() {
        Some(path) => println!("{}", path.display()),
        None => bail!("No config directory on this platform; pass --config"),
    }
    Ok(())
}

/// Write the documented default config to `path`, or the default location
pub fn config_init(path: Option<&Path>, force: bool) -> Result<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::default_path()
            .ok_or_else(|| anyhow!("No config directory on this platform; pass --config"))?,
    };

    if path.exists() && !force {
        bail!(
            "Config already exists at {}; use --force to overwrite",
            path.display()
        );
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, Config::default_with_comments())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("{} Wrote config to {}", "✓".green(), path.display());
    Ok(())
}
