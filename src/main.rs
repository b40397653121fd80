//! FMECA Review CLI
//!
//! Terminal client for the FMECA-HWATM data-review service.

use anyhow::{anyhow, bail, Result};
use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use fmeca_review::{
    analysis::{analyze, atm_rows, AdminStats, AnalysisSummary, BoardDataStatus},
    api::{
        ApiConfig, ApiError, BlockingApiClient, NewUser, PasswordChange, ProfileUpdate,
        RegisterRequest, UploadKind, UserProfile, UserQuery, UserUpdate,
    },
    config::Config,
    risk::BandFilter,
    session::{format_countdown, FileSessionStore, SessionEvent, SessionManager, SessionPhase},
    SessionRecord, SessionTimer, VERSION,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const NOT_LOGGED_IN: &str = "Not logged in. Run `fmeca-review login <username>` first.";

#[derive(Parser)]
#[command(name = "fmeca-review")]
#[command(author = "FMECA-HWATM")]
#[command(version = VERSION)]
#[command(about = "Terminal client for the FMECA-HWATM data-review service", long_about = None)]
struct Cli {
    /// Backend URL (overrides the configured one)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and start a session
    Login {
        username: String,

        /// Password (prompted for if omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Create a new account
    Register {
        username: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        full_name: Option<String>,

        /// Password (prompted for if omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// End the current session
    Logout,

    /// Show the logged-in user as the backend sees them
    Whoami,

    /// Change your password
    Passwd {
        #[arg(long)]
        current: Option<String>,

        #[arg(long)]
        new: Option<String>,
    },

    /// Update your email or full name
    Profile {
        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        full_name: Option<String>,
    },

    /// Inspect or extend the current session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// List the board catalog
    Boards,

    /// Show which data files a board has
    Files { board_id: u32 },

    /// Show FMECA risk rows for a board
    Fmeca {
        board_id: u32,

        /// Band filter (all, red, orange, yellow, green)
        #[arg(long, short, default_value = "all")]
        filter: BandFilter,

        /// Print classified rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// Cross-check the coverage report against FMECA
    Atm { board_id: u32 },

    /// Show stored dataset versions for a board
    DbStatus { board_id: u32 },

    /// Upload an FMECA or coverage workbook, or a board image (admin only)
    Upload {
        board_id: u32,

        /// File type (fmeca, coverage or image)
        #[arg(long = "type", value_name = "TYPE")]
        kind: UploadKind,

        file: PathBuf,
    },

    /// Manage user accounts (admin only)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Show time left in the session
    Status,

    /// Restart the session clock
    Extend,

    /// Stay in the foreground and enforce expiry
    Watch,
}

#[derive(Subcommand)]
enum AdminAction {
    /// List users
    Users {
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        role: Option<String>,

        #[arg(long, default_value = "0")]
        skip: u32,

        #[arg(long, default_value = "100")]
        limit: u32,
    },

    /// Show one user
    User { username: String },

    /// Create a user
    Create {
        username: String,

        #[arg(long)]
        password: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        full_name: Option<String>,

        #[arg(long, default_value = "user")]
        role: String,

        /// Create the account disabled
        #[arg(long)]
        disabled: bool,
    },

    /// Update a user
    Update {
        username: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        full_name: Option<String>,

        #[arg(long)]
        role: Option<String>,

        #[arg(long)]
        disabled: Option<bool>,
    },

    /// Delete a user
    Delete { username: String },

    /// Re-enable a disabled user
    Enable { username: String },

    /// Disable a user
    Disable { username: String },

    /// List the available roles
    Roles,

    /// Show the user and board overview
    Stats,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the configuration
    Show,

    /// Save a new backend URL
    SetUrl { url: String },
}

/// Loaded configuration and the session bound to it.
struct App {
    config: Config,
    manager: SessionManager,
}

impl App {
    fn new(config: Config) -> Self {
        let store = Arc::new(FileSessionStore::new(config.session_path()));
        let manager = SessionManager::new(store, config.session);
        Self { config, manager }
    }

    fn client(&self) -> Result<BlockingApiClient> {
        Ok(BlockingApiClient::new(ApiConfig::from_config(&self.config))?)
    }

    /// A client carrying the session token, after checking the session.
    fn authed(&self) -> Result<(BlockingApiClient, SessionRecord)> {
        match self.manager.check() {
            None => bail!(NOT_LOGGED_IN),
            Some(SessionPhase::Expired) => bail!(
                "Your session has expired. Run `fmeca-review login <username>` to sign in again."
            ),
            Some(SessionPhase::Warning { remaining }) => {
                eprintln!(
                    "Warning: your session will expire in {}. Run `fmeca-review session extend` to stay logged in.",
                    format_countdown(remaining)
                );
            }
            Some(SessionPhase::Active) => {}
        }

        let record = self
            .manager
            .current()
            .ok_or_else(|| anyhow!(NOT_LOGGED_IN))?;
        let client = self.client()?.with_token(record.access_token.clone());
        Ok((client, record))
    }

    /// Pass a backend result through, ending the session on a 401.
    fn guard<T>(&self, result: Result<T, ApiError>) -> Result<T> {
        match self.manager.guard(result) {
            Err(e) if e.is_unauthorized() => {
                bail!("{e}. You have been logged out; run `fmeca-review login <username>` to sign in again.")
            }
            other => Ok(other?),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config, using defaults: {e}");
            Config::default()
        }
    };
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }

    let app = App::new(config);

    let result = match cli.command {
        Commands::Login { username, password } => cmd_login(&app, &username, password),
        Commands::Register {
            username,
            email,
            full_name,
            password,
        } => cmd_register(&app, username, email, full_name, password),
        Commands::Logout => cmd_logout(&app),
        Commands::Whoami => cmd_whoami(&app),
        Commands::Passwd { current, new } => cmd_passwd(&app, current, new),
        Commands::Profile { email, full_name } => cmd_profile(&app, email, full_name),
        Commands::Session { action } => match action {
            SessionAction::Status => cmd_session_status(&app),
            SessionAction::Extend => cmd_session_extend(&app),
            SessionAction::Watch => cmd_session_watch(&app),
        },
        Commands::Boards => cmd_boards(&app),
        Commands::Files { board_id } => cmd_files(&app, board_id),
        Commands::Fmeca {
            board_id,
            filter,
            json,
        } => cmd_fmeca(&app, board_id, filter, json),
        Commands::Atm { board_id } => cmd_atm(&app, board_id),
        Commands::DbStatus { board_id } => cmd_db_status(&app, board_id),
        Commands::Upload {
            board_id,
            kind,
            file,
        } => cmd_upload(&app, board_id, kind, &file),
        Commands::Admin { action } => cmd_admin(&app, action),
        Commands::Config { action } => cmd_config(&app, action.unwrap_or(ConfigAction::Show)),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Log to stderr so table output stays clean.
fn init_tracing(verbose: bool) {
    let default = if verbose { "fmeca_review=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_login(app: &App, username: &str, password: Option<String>) -> Result<()> {
    let password = password_or_prompt(password, "Password: ")?;

    let client = app.client()?;
    let token = client.login(username, &password)?;
    app.manager.login(token.access_token.clone(), username)?;

    println!("Logged in as {username}.");

    // Role lookup is informational only.
    match client.with_token(token.access_token).verify_token() {
        Ok(user) => println!("Role: {}", user.role),
        Err(e) => tracing::warn!("Could not verify new token: {}", e),
    }
    println!(
        "Session expires after {} minutes.",
        app.config.session.expire_after.as_secs() / 60
    );
    Ok(())
}

fn cmd_register(
    app: &App,
    username: String,
    email: Option<String>,
    full_name: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let password = password_or_prompt(password, "Password: ")?;

    let user = app.client()?.register(&RegisterRequest {
        username,
        password,
        email,
        full_name,
    })?;

    println!("Registration successful! You can now login as {}.", user.username);
    Ok(())
}

fn cmd_logout(app: &App) -> Result<()> {
    match app.manager.current() {
        Some(record) => {
            app.manager.logout()?;
            println!("Logged out {}.", record.username);
        }
        None => println!("No active session."),
    }
    Ok(())
}

fn cmd_whoami(app: &App) -> Result<()> {
    let (client, _) = app.authed()?;
    let user = app.guard(client.verify_token())?;
    print_user(&user);
    Ok(())
}

fn cmd_passwd(app: &App, current: Option<String>, new: Option<String>) -> Result<()> {
    let (client, _) = app.authed()?;
    let current_password = password_or_prompt(current, "Current password: ")?;
    let new_password = password_or_prompt(new, "New password: ")?;

    let response = app.guard(client.change_password(&PasswordChange {
        current_password,
        new_password,
    }))?;
    println!("{}", response.message);
    Ok(())
}

fn cmd_profile(app: &App, email: Option<String>, full_name: Option<String>) -> Result<()> {
    if email.is_none() && full_name.is_none() {
        bail!("Nothing to update: pass --email and/or --full-name");
    }

    let (client, record) = app.authed()?;
    let user = app.guard(client.update_profile(&record.username, &ProfileUpdate { email, full_name }))?;
    println!("Profile updated.");
    print_user(&user);
    Ok(())
}

fn cmd_session_status(app: &App) -> Result<()> {
    let record = app.manager.current();

    match (app.manager.check(), record) {
        (None, _) | (_, None) => println!("No active session."),
        (Some(phase), Some(record)) => {
            let started = Local
                .timestamp_millis_opt(record.login_timestamp_ms)
                .single()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| record.login_timestamp_ms.to_string());

            println!("User: {}", record.username);
            println!("Session started: {started}");
            match phase {
                SessionPhase::Active => {
                    let elapsed = app
                        .manager
                        .policy()
                        .elapsed(record.login_timestamp_ms, app.manager.now_ms());
                    let left = app.config.session.expire_after.saturating_sub(elapsed);
                    println!("Status: active ({} left)", format_countdown(left));
                }
                SessionPhase::Warning { remaining } => {
                    println!(
                        "Status: expiring in {}. Run `fmeca-review session extend` to stay logged in.",
                        format_countdown(remaining)
                    );
                }
                SessionPhase::Expired => {
                    println!("Status: expired. You have been logged out.");
                }
            }
        }
    }
    Ok(())
}

fn cmd_session_extend(app: &App) -> Result<()> {
    if app.manager.extend()? {
        println!(
            "Session extended. It now expires in {} minutes.",
            app.config.session.expire_after.as_secs() / 60
        );
        Ok(())
    } else {
        bail!("No live session to extend. Run `fmeca-review login <username>` to sign in.")
    }
}

fn cmd_session_watch(app: &App) -> Result<()> {
    let record = match app.manager.check() {
        Some(SessionPhase::Expired) | None => bail!(NOT_LOGGED_IN),
        Some(_) => app.manager.current().ok_or_else(|| anyhow!(NOT_LOGGED_IN))?,
    };

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone())?;

    // Read commands from stdin without blocking the event loop.
    let (input_tx, input_rx) = crossbeam_channel::unbounded::<String>();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines().map_while(|l| l.ok()) {
            if input_tx.send(line).is_err() {
                break;
            }
        }
    });
    let idle = crossbeam_channel::never::<String>();
    let mut stdin_open = true;

    let mut timer = SessionTimer::spawn(app.manager.clone());
    let events = timer.events().clone();

    println!("Watching session for {}.", record.username);
    println!("Type 'e' + Enter to extend, 'q' + Enter to log out, Ctrl+C to stop watching.");
    println!();

    while running.load(Ordering::SeqCst) {
        crossbeam_channel::select! {
            recv(events) -> event => match event {
                Ok(SessionEvent::Active) => {
                    println!("[{}] Session active", Local::now().format("%H:%M:%S"));
                }
                Ok(SessionEvent::Warning { remaining }) => {
                    print!(
                        "\rYour session will expire in {} (e = stay logged in, q = logout now) ",
                        format_countdown(remaining)
                    );
                    let _ = std::io::stdout().flush();
                }
                Ok(SessionEvent::Expired) => {
                    println!();
                    println!("Session expired. Run `fmeca-review login <username>` to sign in again.");
                    break;
                }
                Ok(SessionEvent::LoggedOut) => {
                    println!();
                    println!("Logged out.");
                    break;
                }
                Err(_) => {
                    eprintln!("Session timer stopped unexpectedly");
                    break;
                }
            },
            recv(if stdin_open { &input_rx } else { &idle }) -> line => match line {
                Ok(line) => match line.trim() {
                    "e" | "extend" => {
                        println!();
                        timer.extend();
                    }
                    "q" | "logout" => timer.logout(),
                    _ => {}
                },
                // stdin closed; keep watching without input
                Err(_) => stdin_open = false,
            },
            default(Duration::from_millis(200)) => {}
        }
    }

    timer.stop();
    Ok(())
}

fn cmd_boards(app: &App) -> Result<()> {
    let (client, _) = app.authed()?;
    let boards = app.guard(client.boards())?;

    if boards.is_empty() {
        println!("No boards available.");
        return Ok(());
    }

    println!(
        "{:>4}  {:<28} {:<9} {:<6} {:<9} {:<6}",
        "ID", "Board", "Data", "FMECA", "Coverage", "Image"
    );
    for board in &boards {
        println!(
            "{:>4}  {:<28} {:<9} {:<6} {:<9} {:<6}",
            board.id,
            board.name,
            BoardDataStatus::of(board).as_str(),
            yes_no(board.has_fmeca),
            yes_no(board.has_coverage),
            yes_no(board.has_image),
        );
    }
    Ok(())
}

fn cmd_files(app: &App, board_id: u32) -> Result<()> {
    let (client, _) = app.authed()?;
    let files = app.guard(client.board_files(board_id))?;

    println!("{} (board {})", files.board_name, files.board_id);
    println!("  FMECA file: {}", yes_no(files.fmeca_exists));
    println!("  Coverage file: {}", yes_no(files.coverage_exists));
    println!("  Image: {}", yes_no(files.image_exists));
    println!("  FMECA in database: {}", yes_no(files.fmeca_db_exists));
    println!("  Coverage in database: {}", yes_no(files.coverage_db_exists));
    Ok(())
}

fn cmd_fmeca(app: &App, board_id: u32, filter: BandFilter, json: bool) -> Result<()> {
    let (client, _) = app.authed()?;
    let response = app.guard(client.fmeca_data(board_id, filter))?;
    let rows = analyze(response.data);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No data found for the selected filter.");
        if let Some(message) = response.message {
            println!("({message})");
        }
        return Ok(());
    }

    let summary = AnalysisSummary::from_rows(filter, &rows);
    println!("{}", summary.status_line());
    println!();
    println!(
        "{:<8} {:<24} {:<24} {:>8}  {:<8} {}",
        "ID", "Component", "Reference Designator", "RPN", "Risk", "ATM Coverage"
    );
    for row in &rows {
        println!(
            "{:<8} {:<24} {:<24} {:>8}  {} {:<6} {}",
            row.row.id,
            truncate(&row.row.component, 24),
            truncate(&row.row.reference_designator, 24),
            row.row.rpn,
            row.band.glyph(),
            row.level.as_str(),
            row.coverage_display
        );
    }

    println!();
    println!(
        "Coverage: {} tested, {} partial, {} not found",
        summary.tested, summary.partial, summary.not_found
    );
    Ok(())
}

fn cmd_atm(app: &App, board_id: u32) -> Result<()> {
    let (client, _) = app.authed()?;
    let report = app.guard(client.atm_check(board_id))?;

    println!("{}", report.message);
    let rows = atm_rows(&report);
    if rows.is_empty() {
        return Ok(());
    }

    println!();
    println!("{:<32} {}", "Missing Components in FMECA", "ATM Coverage");
    for row in &rows {
        println!("{:<32} {}", truncate(&row.component, 32), row.coverage_display);
    }
    Ok(())
}

fn cmd_db_status(app: &App, board_id: u32) -> Result<()> {
    let (client, _) = app.authed()?;
    let status = app.guard(client.db_status(board_id))?;

    println!("{} (board {})", status.board_name, status.board_id);
    for (label, present, info) in [
        ("FMECA", status.fmeca_in_db, &status.fmeca_info),
        ("Coverage", status.coverage_in_db, &status.coverage_info),
    ] {
        if !present {
            println!("  {label}: not in database");
            continue;
        }
        let info = info.as_ref();
        println!(
            "  {label}: version {}, {} records, uploaded {} by {}",
            info.and_then(|i| i.version)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            info.and_then(|i| i.record_count)
                .map(|c| c.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            info.and_then(|i| i.upload_date)
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            info.and_then(|i| i.uploaded_by.clone())
                .unwrap_or_else(|| "N/A".to_string()),
        );
    }
    Ok(())
}

fn cmd_upload(app: &App, board_id: u32, kind: UploadKind, file: &std::path::Path) -> Result<()> {
    let (client, _) = app.authed()?;
    let receipt = app.guard(client.upload(board_id, kind, file))?;

    if kind == UploadKind::Image {
        println!("Image uploaded successfully.");
    } else {
        println!(
            "Upload successful! {} records saved to the database. Version: {}",
            receipt
                .record_count
                .map(|c| c.to_string())
                .unwrap_or_else(|| "?".to_string()),
            receipt.version.unwrap_or(1)
        );
    }
    tracing::debug!("upload response: {}", receipt.message);
    Ok(())
}

fn cmd_admin(app: &App, action: AdminAction) -> Result<()> {
    let (client, _) = app.authed()?;

    match action {
        AdminAction::Users {
            search,
            role,
            skip,
            limit,
        } => {
            let users = app.guard(client.list_users(&UserQuery {
                skip,
                limit,
                search,
                role,
            }))?;
            println!(
                "{:<20} {:<28} {:<8} {:<8} {}",
                "Username", "Email", "Role", "Status", "Last login"
            );
            for user in &users {
                println!(
                    "{:<20} {:<28} {:<8} {:<8} {}",
                    user.username,
                    user.email.as_deref().unwrap_or("-"),
                    user.role,
                    if user.disabled { "disabled" } else { "active" },
                    user.last_login
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "never".to_string())
                );
            }
            println!();
            println!("{} user(s)", users.len());
        }
        AdminAction::User { username } => {
            let user = app.guard(client.get_user(&username))?;
            print_user(&user);
        }
        AdminAction::Create {
            username,
            password,
            email,
            full_name,
            role,
            disabled,
        } => {
            let password = password_or_prompt(password, "Password for new user: ")?;
            let user = app.guard(client.create_user(&NewUser {
                username,
                password,
                email,
                full_name,
                role,
                disabled,
            }))?;
            println!("Created user {}.", user.username);
        }
        AdminAction::Update {
            username,
            email,
            full_name,
            role,
            disabled,
        } => {
            let update = UserUpdate {
                email,
                full_name,
                disabled,
                role,
            };
            if update.is_empty() {
                bail!("Nothing to update: pass at least one of --email, --full-name, --role, --disabled");
            }
            let user = app.guard(client.update_user(&username, &update))?;
            println!("Updated user {}.", user.username);
            print_user(&user);
        }
        AdminAction::Delete { username } => {
            println!("{}", app.guard(client.delete_user(&username))?.message);
        }
        AdminAction::Enable { username } => {
            println!("{}", app.guard(client.enable_user(&username))?.message);
        }
        AdminAction::Disable { username } => {
            println!("{}", app.guard(client.disable_user(&username))?.message);
        }
        AdminAction::Stats => {
            let users = app.guard(client.list_users(&UserQuery::default()))?;
            let boards = app.guard(client.boards())?;
            print_admin_stats(&AdminStats::from_catalog(&users, &boards));
        }
        AdminAction::Roles => {
            for role in app.guard(client.roles())? {
                println!("{role}");
            }
        }
    }
    Ok(())
}

fn cmd_config(app: &App, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("Configuration");
            println!("=============");
            println!();
            println!("Config file: {:?}", Config::config_path());
            println!("Session file: {:?}", app.config.session_path());
            println!();
            println!("{}", serde_json::to_string_pretty(&app.config)?);
        }
        ConfigAction::SetUrl { url } => {
            let mut config = app.config.clone();
            config.api_url = url;
            config.validate()?;
            config.save()?;
            println!("Backend URL set to {}", config.api_url);

            let client = BlockingApiClient::new(ApiConfig::from_config(&config))?;
            match client.test_connection() {
                Ok(true) => println!("Backend connection: OK"),
                Ok(false) => eprintln!("Warning: Backend health check failed"),
                Err(e) => eprintln!("Warning: Could not connect to backend: {e}"),
            }
        }
    }
    Ok(())
}

fn print_admin_stats(stats: &AdminStats) {
    println!("Admin Dashboard");
    println!("===============");
    println!();
    println!(
        "Users: {} ({} admin, {} regular)",
        stats.total_users, stats.admin_users, stats.regular_users
    );
    println!(
        "Boards: {} ({} with database data)",
        stats.total_boards, stats.boards_with_db_data
    );
    println!("  FMECA in database: {}", stats.fmeca_in_db);
    println!("  Coverage in database: {}", stats.coverage_in_db);
}

fn print_user(user: &UserProfile) {
    println!("Username: {}", user.username);
    println!("Full name: {}", user.full_name.as_deref().unwrap_or("-"));
    println!("Email: {}", user.email.as_deref().unwrap_or("-"));
    println!("Role: {}", user.role);
    println!("Status: {}", if user.disabled { "disabled" } else { "active" });
    println!("Created: {}", user.created_at.format("%Y-%m-%d %H:%M"));
    if let Some(last_login) = user.last_login {
        println!("Last login: {}", last_login.format("%Y-%m-%d %H:%M"));
    }
}

/// Use the password given on the command line, or ask for one without echo.
fn password_or_prompt(given: Option<String>, label: &str) -> Result<String> {
    let password = match given {
        Some(p) => p,
        None => rpassword::prompt_password(label)?,
    };
    if password.is_empty() {
        bail!("Password must not be empty");
    }
    Ok(password)
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let cut: String = s.chars().take(width.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|e| anyhow!("Error setting Ctrl+C handler: {e}"))
}
