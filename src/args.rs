//! These structs provide the CLI interface for the receipts CLI.

use crate::model::Location;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// receipts: A command-line tool for capturing expense receipts.
///
/// The purpose of this program is to collect receipt photos and their cost/category/date
/// metadata during an expense-reporting session, and then to submit the accumulated session as
/// an emailed report with the receipt images attached.
///
/// All data is held in a directory on your machine (the "receipts home"), which is created the
/// first time you run any command. Start a session with `receipts start`, add receipts with
/// `receipts add`, and send the report with `receipts submit`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start a new expense-reporting session and make it the current session.
    ///
    /// Optionally attach your name and office location by passing --first-name and --last-name
    /// (both are required for this). A session label is derived from your initials and today's
    /// date and appears in the submitted report.
    Start(StartArgs),
    /// Add a receipt to the current session.
    Add(AddArgs),
    /// Change fields of a receipt in the current session. Only the fields you pass change.
    Update(UpdateArgs),
    /// Remove a receipt from the current session.
    Delete(DeleteArgs),
    /// Show the current session, its receipts and its running total.
    Show,
    /// List submitted sessions.
    History,
    /// List the expense categories and their accounting codes.
    Categories,
    /// Email the current session as an expense report with receipt images attached.
    ///
    /// The recipient comes from --to, or from `default_recipient` in config.json when --to is
    /// omitted. On success the session is marked submitted and is no longer current.
    Submit(SubmitArgs),
    /// Mark the current session submitted without emailing a report.
    End,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG. See the tracing-subscriber crate for instructions.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where receipts data and configuration is held. Defaults to ~/receipts
    #[arg(long, env = "RECEIPTS_HOME", default_value_t = default_receipts_home())]
    receipts_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, receipts_home: PathBuf) -> Self {
        Self {
            log_level,
            receipts_home: receipts_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn receipts_home(&self) -> &DisplayPath {
        &self.receipts_home
    }
}

/// Args for the `receipts start` command.
#[derive(Debug, Parser, Clone)]
pub struct StartArgs {
    /// Your first name. Requires --last-name.
    #[arg(long)]
    first_name: Option<String>,

    /// Your last name. Requires --first-name.
    #[arg(long)]
    last_name: Option<String>,

    /// Your office location: GR, OK or MA.
    #[arg(long, default_value_t = Location::GR)]
    location: Location,
}

impl StartArgs {
    pub fn new(
        first_name: Option<String>,
        last_name: Option<String>,
        location: Location,
    ) -> Self {
        Self {
            first_name,
            last_name,
            location,
        }
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    pub fn location(&self) -> Location {
        self.location
    }
}

/// Args for the `receipts add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// What the receipt is for, e.g. "Client lunch".
    #[arg(long)]
    description: String,

    /// The expense category name, e.g. "Gasoline". See `receipts categories` for the list.
    #[arg(long)]
    category: String,

    /// The cost as a decimal amount, e.g. 12.50.
    #[arg(long)]
    cost: String,

    /// Path to the receipt photo. The image is attached to the submitted report.
    #[arg(long)]
    image: Option<PathBuf>,

    /// The expense date as 8 digits, MMDDYYYY (separators are ignored). Defaults to today.
    #[arg(long)]
    date: Option<String>,

    /// The business purpose of the expense.
    #[arg(long)]
    purpose: Option<String>,
}

impl AddArgs {
    pub fn new(
        description: impl Into<String>,
        category: impl Into<String>,
        cost: impl Into<String>,
        image: Option<PathBuf>,
        date: Option<String>,
        purpose: Option<String>,
    ) -> Self {
        Self {
            description: description.into(),
            category: category.into(),
            cost: cost.into(),
            image,
            date,
            purpose,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn cost(&self) -> &str {
        &self.cost
    }

    pub fn image(&self) -> Option<&Path> {
        self.image.as_deref()
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn purpose(&self) -> Option<&str> {
        self.purpose.as_deref()
    }
}

/// Args for the `receipts update` command.
#[derive(Debug, Parser, Clone)]
pub struct UpdateArgs {
    /// The identifier of the receipt to change, as shown by `receipts show`.
    #[arg(long)]
    receipt_id: String,

    /// A new description.
    #[arg(long)]
    description: Option<String>,

    /// A new category name. The accounting code is re-derived from it.
    #[arg(long)]
    category: Option<String>,

    /// A new cost.
    #[arg(long)]
    cost: Option<String>,

    /// A new receipt photo path.
    #[arg(long)]
    image: Option<PathBuf>,

    /// A new expense date as 8 digits, MMDDYYYY (separators are ignored).
    #[arg(long)]
    date: Option<String>,

    /// A new business purpose.
    #[arg(long)]
    purpose: Option<String>,
}

impl UpdateArgs {
    pub fn new(receipt_id: impl Into<String>) -> Self {
        Self {
            receipt_id: receipt_id.into(),
            description: None,
            category: None,
            cost: None,
            image: None,
            date: None,
            purpose: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_cost(mut self, cost: impl Into<String>) -> Self {
        self.cost = Some(cost.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<PathBuf>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn receipt_id(&self) -> &str {
        &self.receipt_id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn cost(&self) -> Option<&str> {
        self.cost.as_deref()
    }

    pub fn image(&self) -> Option<&Path> {
        self.image.as_deref()
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn purpose(&self) -> Option<&str> {
        self.purpose.as_deref()
    }
}

/// Args for the `receipts delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The identifier of the receipt to remove, as shown by `receipts show`.
    #[arg(long)]
    receipt_id: String,
}

impl DeleteArgs {
    pub fn new(receipt_id: impl Into<String>) -> Self {
        Self {
            receipt_id: receipt_id.into(),
        }
    }

    pub fn receipt_id(&self) -> &str {
        &self.receipt_id
    }
}

/// Args for the `receipts submit` command.
#[derive(Debug, Parser, Clone)]
pub struct SubmitArgs {
    /// The email address to send the expense report to. Defaults to `default_recipient` from
    /// config.json.
    #[arg(long)]
    to: Option<String>,
}

impl SubmitArgs {
    pub fn new(to: Option<String>) -> Self {
        Self { to }
    }

    pub fn to(&self) -> Option<&str> {
        self.to.as_deref()
    }
}

fn default_receipts_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("receipts"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --receipts-home or RECEIPTS_HOME instead of relying on the \
                default receipts home directory. If you continue using the program right now, \
                you may have problems!",
            );
            PathBuf::from("receipts")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
