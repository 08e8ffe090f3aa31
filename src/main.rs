use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crypto_tracker::config::Config;
use crypto_tracker::jobs::market_poll::PollOutcome;
use crypto_tracker::jobs::session_sync::start_session_sync_job;
use crypto_tracker::views::{
    admin::AdminPanel, compare::CompareView, detail::DetailView, listing::ListingView,
    user_panel::UserPanel,
};
use crypto_tracker::AppState;

mod args;

use args::{AdminCommand, BookmarksCommand, Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,crypto_tracker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(api_url) = cli.api_url.as_deref() {
        config = config.with_api_url(api_url);
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    tracing::info!("Using backend at {}", config.api_url);
    let state = AppState::open(config).context("Failed to open local store")?;

    match cli.cmd {
        Command::Watch(args) => {
            let every = args
                .every
                .map(Duration::from_secs)
                .unwrap_or(state.config.poll_interval);
            watch(&state, every).await
        }
        Command::List => {
            refresh(&state).await;
            load_bookmarks(&state).await;
            print_listing(&ListingView::compose(&state.poller.snapshot(), &state.bookmarks));
            Ok(())
        }
        Command::Detail { symbol } => {
            refresh(&state).await;
            load_bookmarks(&state).await;
            let snapshot = state.poller.snapshot();
            match DetailView::compose(&snapshot, &symbol, &state.history, &state.bookmarks).await {
                Some(view) => print_detail(&view),
                None => println!("No asset with symbol {}", symbol.to_uppercase()),
            }
            Ok(())
        }
        Command::Compare { left, right } => {
            refresh(&state).await;
            let snapshot = state.poller.snapshot();
            match CompareView::compose(&snapshot, left.as_deref(), right.as_deref()) {
                Some(view) => print_compare(&view),
                None => println!("Nothing to compare"),
            }
            Ok(())
        }
        Command::Login { email } => {
            let email = prompt_or(email, "Email")?;
            let password = Password::with_theme(&ColorfulTheme::default())
                .with_prompt("Password")
                .interact()?;
            let session = state.session.login(&email, &password).await?;
            println!("Logged in as {} ({:?})", session.display_name(), session.role);
            Ok(())
        }
        Command::Signup { name, email } => {
            let name = prompt_or(name, "Name")?;
            let email = prompt_or(email, "Email")?;
            let password = Password::with_theme(&ColorfulTheme::default())
                .with_prompt("Password")
                .with_confirmation("Repeat password", "Passwords do not match")
                .interact()?;
            let session = state.session.signup(&name, &email, &password).await?;
            println!("Welcome, {}", session.display_name());
            Ok(())
        }
        Command::Logout => {
            state.session.logout().await?;
            println!("Logged out");
            Ok(())
        }
        Command::Whoami => {
            match state.session.current() {
                Some(session) => {
                    println!("{} <{}> ({:?})", session.display_name(), session.email, session.role)
                }
                None => println!("Not logged in"),
            }
            Ok(())
        }
        Command::Bookmarks(cmd) => bookmarks(&state, cmd).await,
        Command::Admin(cmd) => admin(&state, cmd).await,
    }
}

/// Fetch once, falling back to the cached snapshot when the backend is unreachable.
async fn refresh(state: &AppState) {
    if state.poller.poll_once().await == PollOutcome::Failed {
        eprintln!("Backend unreachable, showing cached market data");
    }
}

/// Without a session this is a no-op. On failure the views show bookmarks as unknown.
async fn load_bookmarks(state: &AppState) {
    if let Err(e) = state.bookmarks.reload().await {
        tracing::warn!("Could not load bookmarks: {}", e);
    }
}

async fn watch(state: &AppState, every: Duration) -> Result<()> {
    let mut snapshots = state.poller.subscribe();
    let mut sessions = state.session.subscribe();
    let _sync = start_session_sync_job(&state.session, state.bookmarks.clone());
    let mut poller = state.poller.start(every);

    print_listing(&ListingView::compose(&state.poller.snapshot(), &state.bookmarks));

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                print_listing(&ListingView::compose(&snapshot, &state.bookmarks));
            }
            session = sessions.changed() => match session {
                Some(Some(session)) => println!("-- logged in as {}", session.email),
                Some(None) => println!("-- logged out"),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
        }
    }

    poller.stop();
    Ok(())
}

async fn bookmarks(state: &AppState, cmd: BookmarksCommand) -> Result<()> {
    if state.session.current().is_none() {
        bail!("Log in to manage bookmarks");
    }
    state.bookmarks.reload().await?;

    match cmd {
        BookmarksCommand::List => {
            refresh(state).await;
            if let Some(panel) = UserPanel::compose(&state.poller.snapshot(), &state.bookmarks) {
                print_user_panel(&panel);
            }
        }
        BookmarksCommand::Add { id } => {
            refresh(state).await;
            let snapshot = state.poller.snapshot();
            let asset = snapshot
                .find_by_id(&id)
                .ok_or_else(|| anyhow!("No asset with id {}", id))?;
            state.bookmarks.add(asset).await?;
            println!("Bookmarked {} ({})", asset.name, asset.symbol);
        }
        BookmarksCommand::Remove { id, symbol } => {
            if symbol {
                state.bookmarks.remove_by_symbol(&id).await?;
            } else {
                state.bookmarks.remove(&id).await?;
            }
            println!("Removed {}", id);
        }
    }
    Ok(())
}

async fn admin(state: &AppState, cmd: AdminCommand) -> Result<()> {
    let current = state.session.current();
    let mut panel = AdminPanel::for_session(state.backend.clone(), current.as_ref())?;
    panel.list().await?;

    match cmd {
        AdminCommand::List { search } => {
            for user in panel.search(search.as_deref().unwrap_or_default()) {
                println!(
                    "{:<26} {:<20} {:<30} {:<6} last login: {}",
                    user.id,
                    user.name,
                    user.email,
                    format!("{:?}", user.role).to_lowercase(),
                    user.last_login.as_deref().unwrap_or("never"),
                );
            }
        }
        AdminCommand::Edit { id, name } => {
            let user = panel
                .find(&id)
                .cloned()
                .ok_or_else(|| anyhow!("No user with id {}", id))?;
            let name = match name {
                Some(name) => name,
                None => Input::with_theme(&ColorfulTheme::default())
                    .with_prompt("Name")
                    .default(user.name.clone())
                    .interact_text()?,
            };
            let password = Password::with_theme(&ColorfulTheme::default())
                .with_prompt("New password (leave empty to keep)")
                .allow_empty_password(true)
                .interact()?;
            panel.update(&id, &name, &password).await?;
            println!("Updated {}", user.email);
        }
        AdminCommand::Delete { id, yes } => {
            let user = panel
                .find(&id)
                .cloned()
                .ok_or_else(|| anyhow!("No user with id {}", id))?;
            let deleted = panel
                .delete(&user, |user| {
                    yes || Confirm::with_theme(&ColorfulTheme::default())
                        .with_prompt(format!("Delete {}?", user.email))
                        .default(false)
                        .interact()
                        .unwrap_or(false)
                })
                .await?;
            if deleted {
                println!("Deleted {}", user.email);
            } else {
                println!("Cancelled");
            }
        }
    }
    Ok(())
}

fn prompt_or(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(value) => Ok(value),
        None => Ok(Input::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .interact_text()?),
    }
}

fn print_listing(view: &ListingView) {
    if view.is_empty() {
        println!("No market data yet");
        return;
    }
    println!(
        "{:<3} {:<24} {:<8} {:>16} {:>9} {:>14}",
        "", "NAME", "SYMBOL", "PRICE", "24H", "MARKET CAP"
    );
    for row in &view.rows {
        let mark = match row.bookmarked {
            Some(true) => "*",
            _ => "",
        };
        println!(
            "{:<3} {:<24} {:<8} {:>16} {:>9} {:>14}",
            mark, row.name, row.symbol, row.price, row.change24h, row.market_cap
        );
    }
}

fn print_detail(view: &DetailView) {
    println!("{} ({})", view.asset.name, view.asset.symbol);
    println!("  price       {}", view.price);
    println!("  24h change  {}", view.change24h);
    println!("  market cap  {}", view.market_cap);
    println!("  volume      {}", view.volume);
    if let Some(bookmarked) = view.bookmarked {
        println!("  bookmarked  {}", if bookmarked { "yes" } else { "no" });
    }
    println!("  last 24h:");
    for point in view.history.points() {
        println!("    {}  {}", point.time.format("%H:%M"), point.price);
    }
}

fn print_compare(view: &CompareView) {
    println!("{} vs {}", view.left.name, view.right.name);
    println!("  price       {}", view.price_difference);
    println!("  market cap  {}", view.market_cap_difference);
    println!("  volume      {}", view.volume_difference);
    println!("  24h change  {}", view.change_difference);
}

fn print_user_panel(panel: &UserPanel) {
    println!("Bookmarks for {}", panel.email);
    if panel.entries.is_empty() {
        println!("  none yet");
    }
    for entry in &panel.entries {
        let live = entry
            .live
            .as_ref()
            .map(|a| format!("now ${}", crypto_tracker::services::format::format_price(a.price)))
            .unwrap_or_else(|| "no longer listed".to_string());
        println!("  {:<24} {:<8} {}", entry.bookmark.name, entry.bookmark.symbol, live);
    }
}
