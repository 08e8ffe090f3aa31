use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Backend base URL (overrides CRYPTO_TRACKER_API_URL)
    #[arg(long, global = true, value_hint = ValueHint::Url)]
    pub(crate) api_url: Option<String>,

    /// Directory holding the persisted session and market cache
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub(crate) data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub(crate) cmd: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Poll the market and print the listing whenever it changes
    Watch(WatchArgs),

    /// Fetch once and print the market listing
    List,

    /// Show one asset with its 24h chart series
    Detail {
        /// Asset symbol, any case (e.g. btc)
        symbol: String,
    },

    /// Compare two assets by id. Defaults to the first two listed
    Compare {
        left: Option<String>,
        right: Option<String>,
    },

    Login {
        #[arg(long)]
        email: Option<String>,
    },

    Signup {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },

    Logout,

    /// Print the signed-in user
    Whoami,

    #[command(subcommand)]
    Bookmarks(BookmarksCommand),

    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Args, Debug)]
pub(crate) struct WatchArgs {
    /// Seconds between polls (overrides CRYPTO_TRACKER_POLL_SECS)
    #[arg(long)]
    pub(crate) every: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum BookmarksCommand {
    List,
    /// Bookmark an asset by id
    Add { id: String },
    /// Remove a bookmark by id, or by symbol with --symbol
    Remove {
        id: String,
        #[arg(long)]
        symbol: bool,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum AdminCommand {
    /// List users, optionally filtered by name or email
    List {
        #[arg(long)]
        search: Option<String>,
    },
    /// Rename a user and optionally reset their password
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
    },
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}
