use std::{collections::BTreeSet, process::ExitCode, sync::Arc};

use clap::{Args, Parser, Subcommand};
use harbor_console::{
    Console, ConsoleConfig, ConsoleError, FileStore, Notifier,
    config::Env,
    create_console,
    models::{
        CreateUserGroupRequest, CreateUserRequest, ListParams, LoginRequest,
        UpdateUserGroupRequest, UpdateUserRequest,
    },
    notify::{Level, Notice},
};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "harbor-console", about = "HarborArk administration console")]
struct Cli {
    /// Origin of the HarborArk server; overrides HARBOR_API_URL.
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and persist the session token.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "HARBOR_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the persisted session.
    Logout,
    /// Show the current session.
    Status,
    /// Navigate to a console route through the guard.
    Open { path: String },
    /// Manage users.
    Users(UsersCommand),
    /// Manage user groups.
    Groups(GroupsCommand),
}

#[derive(Args, Debug)]
struct PageArgs {
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    page_size: Option<u32>,
}

impl From<PageArgs> for ListParams {
    fn from(args: PageArgs) -> Self {
        Self {
            page: args.page,
            page_size: args.page_size,
        }
    }
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    List(PageArgs),
    Get {
        id: u32,
    },
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        group_id: u32,
    },
    Update {
        id: u32,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        group_id: Option<u32>,
        #[arg(long)]
        active: Option<bool>,
    },
    Delete {
        id: u32,
    },
}

#[derive(Args, Debug)]
struct GroupsCommand {
    #[command(subcommand)]
    command: GroupsSubcommand,
}

#[derive(Subcommand, Debug)]
enum GroupsSubcommand {
    List(PageArgs),
    Get {
        id: u32,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Repeat for each permission.
        #[arg(long = "permission")]
        permissions: Vec<String>,
    },
    Update {
        id: u32,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Replaces the whole permission set. Repeat for each permission.
        #[arg(long = "permission")]
        permissions: Option<Vec<String>>,
    },
    Delete {
        id: u32,
    },
}

/// Prints notices for the person at the terminal. Stdout stays reserved for
/// command output.
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            Level::Success => eprintln!("{}", notice.message),
            Level::Error => eprintln!("error: {}", notice.message),
        }
    }
}

/// main
///
/// Loads configuration, installs logging, restores the persisted session and
/// runs one command against it.
#[tokio::main]
async fn main() -> ExitCode {
    // 1. Configuration (Fail-Fast)
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let mut config = match ConsoleConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(api_url) = cli.api_url.clone() {
        config.api_url = api_url.trim_end_matches('/').to_string();
    }

    // 2. Logging
    // RUST_LOG wins; otherwise only the console's own events at info. Logs go
    // to stderr so command output on stdout stays machine-readable.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "harbor_console=info".into());
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }

    // 3. Durable storage + console assembly
    let storage = match FileStore::open(&config.state_dir) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let console = match create_console(config, storage, Arc::new(TerminalNotifier)) {
        Ok(console) => console,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // 4. Dispatch
    match run(&console, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Pipeline failures were already surfaced by the notifier.
            if !matches!(
                e,
                ConsoleError::Unauthorized | ConsoleError::Api { .. } | ConsoleError::Network(_)
            ) {
                eprintln!("error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(console: &Console, command: Command) -> Result<(), ConsoleError> {
    match command {
        Command::Login { username, password } => {
            let result = console
                .login(&LoginRequest { username, password })
                .await?;
            console.notifier.success(&result.message);
            print_json(&json!({
                "user": result.user,
                "location": console.navigator.current().to_string(),
            }))
        }
        Command::Logout => {
            console.logout();
            print_json(&json!({ "authenticated": false }))
        }
        Command::Status => {
            let session = console.session.snapshot();
            print_json(&json!({
                "api": console.pipeline.base_url(),
                "authenticated": session.is_authenticated(),
                "user": session.user,
            }))
        }
        Command::Open { path } => {
            let location = console.open(&path)?;
            print_json(&json!({ "location": location.to_string() }))
        }
        Command::Users(cmd) => {
            enter(console, "/system/users")?;
            run_users(console, cmd.command).await
        }
        Command::Groups(cmd) => {
            enter(console, "/system/user-groups")?;
            run_groups(console, cmd.command).await
        }
    }
}

/// Runs the guard for the route owning a command and refuses to continue if
/// it lands anywhere else.
fn enter(console: &Console, path: &str) -> Result<(), ConsoleError> {
    let location = console.open(path)?;
    if location.path != path {
        return Err(ConsoleError::Validation(format!(
            "`{path}` requires a login; run `harbor-console login` first"
        )));
    }
    Ok(())
}

async fn run_users(console: &Console, command: UsersSubcommand) -> Result<(), ConsoleError> {
    let users = &console.users;
    match command {
        UsersSubcommand::List(page) => print_json(&users.list(&page.into()).await?),
        UsersSubcommand::Get { id } => print_json(&users.get(id).await?),
        UsersSubcommand::Create {
            username,
            password,
            email,
            full_name,
            group_id,
        } => {
            let request = CreateUserRequest {
                username,
                password,
                email,
                full_name,
                user_group_id: group_id,
            };
            print_json(&users.create(&request).await?)
        }
        UsersSubcommand::Update {
            id,
            email,
            full_name,
            group_id,
            active,
        } => {
            let request = UpdateUserRequest {
                email,
                full_name,
                user_group_id: group_id,
                is_active: active,
            };
            print_json(&json!({ "message": users.update(id, &request).await? }))
        }
        UsersSubcommand::Delete { id } => {
            print_json(&json!({ "message": users.delete(id).await? }))
        }
    }
}

async fn run_groups(console: &Console, command: GroupsSubcommand) -> Result<(), ConsoleError> {
    let groups = &console.user_groups;
    match command {
        GroupsSubcommand::List(page) => print_json(&groups.list(&page.into()).await?),
        GroupsSubcommand::Get { id } => print_json(&groups.get(id).await?),
        GroupsSubcommand::Create {
            name,
            description,
            permissions,
        } => {
            let request = CreateUserGroupRequest {
                name,
                description,
                permissions: permissions.into_iter().collect(),
            };
            print_json(&groups.create(&request).await?)
        }
        GroupsSubcommand::Update {
            id,
            name,
            description,
            permissions,
        } => {
            let request = UpdateUserGroupRequest {
                name,
                description,
                permissions: permissions.map(|p| p.into_iter().collect::<BTreeSet<_>>()),
            };
            print_json(&json!({ "message": groups.update(id, &request).await? }))
        }
        GroupsSubcommand::Delete { id } => {
            print_json(&json!({ "message": groups.delete(id).await? }))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ConsoleError> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|e| ConsoleError::Decode(e.to_string()))?;
    println!("{rendered}");
    Ok(())
}
