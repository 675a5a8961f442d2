mod auth;
mod prompt;

use std::io;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use studio_client::Client;
use studio_client::config::ClientConfig;
use studio_client::error::ClientError;
use studio_client::net::types::{AvatarUpload, Connections, Gallery, PreferenceValue, ProfileUpdate, Visibility};
use studio_client::pages::assets::AssetsPage;
use studio_client::pages::billing::BillingPage;
use studio_client::pages::community::CommunityPage;
use studio_client::pages::dashboard::DashboardPage;
use studio_client::pages::preferences::PreferencesPage;
use studio_client::pages::profile::ProfilePage;
use studio_client::pages::projects::ProjectsPage;
use studio_client::pages::{BulkOutcome, Confirmation, Loadable};
use studio_client::state::session::RevokeScope;
use studio_client::state::wizard::WizardError;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{}", .0.user_message())]
    Client(#[from] ClientError),
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error("io failed: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid argument: {0}")]
    InvalidArg(String),
    #[error("prompt failed: {0}")]
    Prompt(String),
    #[error("cancelled")]
    Cancelled,
    #[error("not signed in; run `studio auth` first")]
    NotSignedIn,
    #[error("{0}")]
    Load(String),
    #[error("{0} of the selected items could not be deleted")]
    Partial(usize),
}

#[derive(Parser, Debug)]
#[command(name = "studio", about = "Studio account, project and billing CLI")]
struct Cli {
    #[arg(long, env = "STUDIO_API_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "STUDIO_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in or create an account interactively.
    Auth,
    Logout,
    Whoami,
    Sessions(SessionsCommand),
    Password(PasswordCommand),
    Email(EmailCommand),
    Profile(ProfileCommand),
    Projects(ProjectsCommand),
    Assets(AssetsCommand),
    Billing(BillingCommand),
    Community(CommunityCommand),
    Users(UsersCommand),
    Preferences(PreferencesCommand),
    Dashboard,
}

#[derive(Args, Debug)]
struct SessionsCommand {
    #[command(subcommand)]
    command: SessionsSubcommand,
}

#[derive(Subcommand, Debug)]
enum SessionsSubcommand {
    List,
    Revoke {
        session_id: String,
    },
    RevokeAll {
        /// Also end this session.
        #[arg(long, default_value_t = false)]
        everywhere: bool,
    },
}

#[derive(Args, Debug)]
struct PasswordCommand {
    #[command(subcommand)]
    command: PasswordSubcommand,
}

#[derive(Subcommand, Debug)]
enum PasswordSubcommand {
    Change,
    /// Email a reset link.
    Forgot { email: String },
    /// Set a new password with the token from a reset link.
    Reset { token: String },
}

#[derive(Args, Debug)]
struct EmailCommand {
    #[command(subcommand)]
    command: EmailSubcommand,
}

#[derive(Subcommand, Debug)]
enum EmailSubcommand {
    Change { new_email: String },
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Update(ProfileUpdateArgs),
    Avatar(AvatarCommand),
    Delete {
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct ProfileUpdateArgs {
    #[arg(long)]
    full_name: Option<String>,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    dob: Option<String>,
    #[arg(long)]
    bio: Option<String>,
    #[arg(long)]
    website_url: Option<String>,
    #[arg(long)]
    is_public: Option<bool>,
}

#[derive(Args, Debug)]
struct AvatarCommand {
    #[command(subcommand)]
    command: AvatarSubcommand,
}

#[derive(Subcommand, Debug)]
enum AvatarSubcommand {
    Upload { path: PathBuf },
    Delete,
}

#[derive(Args, Debug)]
struct ProjectsCommand {
    #[command(subcommand)]
    command: ProjectsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProjectsSubcommand {
    List,
    /// Show a public project and count the view.
    Show {
        project_id: String,
    },
    Like {
        project_id: String,
        #[arg(long, default_value_t = false)]
        unlike: bool,
    },
    Delete {
        #[arg(required = true)]
        project_ids: Vec<String>,
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    Visibility {
        project_id: String,
        #[arg(value_enum)]
        visibility: VisibilityArg,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum VisibilityArg {
    Public,
    Private,
    Unlisted,
}

impl From<VisibilityArg> for Visibility {
    fn from(arg: VisibilityArg) -> Self {
        match arg {
            VisibilityArg::Public => Self::Public,
            VisibilityArg::Private => Self::Private,
            VisibilityArg::Unlisted => Self::Unlisted,
        }
    }
}

#[derive(Args, Debug)]
struct AssetsCommand {
    #[command(subcommand)]
    command: AssetsSubcommand,
}

#[derive(Subcommand, Debug)]
enum AssetsSubcommand {
    List,
    Favorite {
        asset_id: String,
        #[arg(long, default_value_t = false)]
        remove: bool,
    },
    Delete {
        #[arg(required = true)]
        asset_ids: Vec<String>,
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct BillingCommand {
    #[command(subcommand)]
    command: BillingSubcommand,
}

#[derive(Subcommand, Debug)]
enum BillingSubcommand {
    Show,
    Subscribe {
        plan_id: String,
    },
    Cancel,
}

#[derive(Args, Debug)]
struct CommunityCommand {
    #[command(subcommand)]
    command: Option<CommunitySubcommand>,
}

#[derive(Subcommand, Debug)]
enum CommunitySubcommand {
    Like {
        project_id: String,
        #[arg(long, default_value_t = false)]
        unlike: bool,
    },
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    Show {
        username: String,
    },
    Follow {
        username: String,
        #[arg(long, default_value_t = false)]
        undo: bool,
    },
    Block {
        username: String,
        #[arg(long, default_value_t = false)]
        undo: bool,
    },
    Followers(ConnectionsArgs),
    Following(ConnectionsArgs),
}

#[derive(Args, Debug)]
struct ConnectionsArgs {
    username: String,
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long, default_value_t = 20)]
    limit: u32,
}

#[derive(Args, Debug)]
struct PreferencesCommand {
    #[command(subcommand)]
    command: Option<PreferencesSubcommand>,
}

#[derive(Subcommand, Debug)]
enum PreferencesSubcommand {
    /// Change one setting, e.g. `font_size 18` or `dark_mode true`.
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(CliError::InvalidArg(format!("failed to read .env: {e}")));
        }
    }
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url)?;
    }
    if let Some(session_file) = cli.session_file {
        config.session_file = session_file;
    }
    tracing::debug!(base_url = %config.api_base_url, session_file = %config.session_file.display(), "client configured");
    let client = Client::connect(config)?;

    match cli.command {
        Command::Auth => run_auth(&client).await,
        Command::Logout => {
            client.store().logout().await;
            println!("signed out");
            Ok(())
        }
        Command::Whoami => {
            let user = client.store().user().ok_or(CliError::NotSignedIn)?;
            print_json(&user)
        }
        Command::Sessions(sessions) => run_sessions(&client, sessions).await,
        Command::Password(password) => run_password(&client, password).await,
        Command::Email(email) => run_email(&client, email).await,
        Command::Profile(profile) => run_profile(&client, profile).await,
        Command::Projects(projects) => run_projects(&client, projects).await,
        Command::Assets(assets) => run_assets(&client, assets).await,
        Command::Billing(billing) => run_billing(&client, billing).await,
        Command::Community(community) => run_community(&client, community).await,
        Command::Users(users) => run_users(&client, users).await,
        Command::Preferences(preferences) => run_preferences(&client, preferences).await,
        Command::Dashboard => run_dashboard(&client).await,
    }
}

async fn run_auth(client: &Client) -> Result<(), CliError> {
    if let Some(user) = client.store().user() {
        println!("already signed in as {} <{}>", user.username, user.email);
        return Ok(());
    }
    auth::run(client.wizard()).await?;
    let user = client.store().user().ok_or(CliError::NotSignedIn)?;
    println!("signed in as {} <{}>", user.username, user.email);
    Ok(())
}

async fn run_sessions(client: &Client, sessions: SessionsCommand) -> Result<(), CliError> {
    let store = client.store();
    match sessions.command {
        SessionsSubcommand::List => print_json(&store.list_sessions().await?),
        SessionsSubcommand::Revoke { session_id } => {
            let listed = store.list_sessions().await?;
            let target = listed
                .iter()
                .find(|s| s.id == session_id)
                .ok_or_else(|| CliError::InvalidArg(format!("no session with id {session_id}")))?;
            if store.revoke_session(target).await? {
                println!("revoked this session; signed out");
            } else {
                println!("revoked {session_id}");
            }
            Ok(())
        }
        SessionsSubcommand::RevokeAll { everywhere } => {
            let scope = if everywhere { RevokeScope::Everywhere } else { RevokeScope::OthersOnly };
            let summary = store.revoke_all_sessions(scope).await?;
            println!("revoked {} session(s)", summary.revoked);
            if summary.signed_out {
                println!("signed out");
            }
            Ok(())
        }
    }
}

async fn run_password(client: &Client, password: PasswordCommand) -> Result<(), CliError> {
    match password.command {
        PasswordSubcommand::Change => {
            let current = prompt::ask_value("current password").await?;
            let new = prompt::ask_value("new password").await?;
            let confirm = prompt::ask_value("confirm new password").await?;
            client.store().change_password(&current, &new, &confirm).await?;
            println!("password changed");
            Ok(())
        }
        PasswordSubcommand::Forgot { email } => {
            let response = client.store().api().forgot_password(&email).await?;
            println!("{}", response.message);
            Ok(())
        }
        PasswordSubcommand::Reset { token } => {
            let new = prompt::ask_value("new password").await?;
            let confirm = prompt::ask_value("confirm new password").await?;
            client.store().api().reset_password(&token, &new, &confirm).await?;
            println!("password reset; sign in with `studio auth`");
            Ok(())
        }
    }
}

async fn run_email(client: &Client, email: EmailCommand) -> Result<(), CliError> {
    match email.command {
        EmailSubcommand::Change { new_email } => {
            let password = prompt::ask_value("password").await?;
            let response = client.store().change_email(&new_email, &password).await?;
            println!("{}", response.message);
            Ok(())
        }
    }
}

async fn run_profile(client: &Client, profile: ProfileCommand) -> Result<(), CliError> {
    let store = client.store();
    match profile.command {
        ProfileSubcommand::Update(args) => {
            let update = ProfileUpdate {
                full_name: args.full_name,
                username: args.username,
                dob: args.dob,
                bio: args.bio,
                website_url: args.website_url,
                is_public: args.is_public,
            };
            if update.is_empty() {
                return Err(CliError::InvalidArg("nothing to update".into()));
            }
            print_json(&store.update_profile(&update).await?)
        }
        ProfileSubcommand::Avatar(avatar) => match avatar.command {
            AvatarSubcommand::Upload { path } => {
                let content_type = prompt::image_content_type(&path)?;
                let bytes = tokio::fs::read(&path).await?;
                let file_name = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or("avatar")
                    .to_owned();
                let upload = AvatarUpload { file_name, content_type: content_type.to_owned(), bytes };
                print_json(&store.upload_avatar(upload).await?)
            }
            AvatarSubcommand::Delete => {
                store.delete_avatar().await?;
                println!("avatar removed");
                Ok(())
            }
        },
        ProfileSubcommand::Delete { yes } => {
            if !yes && !prompt::confirm("permanently delete your account").await? {
                return Err(CliError::Cancelled);
            }
            store.delete_account().await?;
            println!("account deleted");
            Ok(())
        }
    }
}

async fn run_projects(client: &Client, projects: ProjectsCommand) -> Result<(), CliError> {
    let page = ProjectsPage::new(client.content().clone());
    match projects.command {
        ProjectsSubcommand::List => print_json(&loaded(page.load().await)?),
        ProjectsSubcommand::Show { project_id } => {
            let content = client.content();
            let project = content.public_project(&project_id).await?;
            let view = content.record_view(&project_id).await?;
            print_json(&project)?;
            if let Some(views) = view.views_count {
                println!("{views} views");
            }
            if client.store().is_signed_in() {
                println!("liked: {}", content.is_liked(&project_id).await?);
            }
            Ok(())
        }
        ProjectsSubcommand::Like { project_id, unlike } => {
            page.load().await;
            let response = page.set_like(&project_id, !unlike).await?;
            println!("liked: {} ({} likes)", response.liked, response.likes_count);
            Ok(())
        }
        ProjectsSubcommand::Delete { project_ids, yes } => {
            let confirmation = confirm_bulk("project", project_ids.len(), yes).await?;
            page.load().await;
            report_bulk(&page.bulk_delete(&project_ids, confirmation).await?)
        }
        ProjectsSubcommand::Visibility { project_id, visibility } => {
            let visibility = page.set_visibility(&project_id, visibility.into()).await?;
            println!("{project_id} is now {}", visibility.as_str());
            Ok(())
        }
    }
}

async fn run_assets(client: &Client, assets: AssetsCommand) -> Result<(), CliError> {
    let page = AssetsPage::new(client.content().clone());
    match assets.command {
        AssetsSubcommand::List => print_json(&loaded(page.load().await)?),
        AssetsSubcommand::Favorite { asset_id, remove } => {
            page.load().await;
            let response = page.set_favorite(&asset_id, !remove).await?;
            println!("favorite: {}", response.is_favorite);
            Ok(())
        }
        AssetsSubcommand::Delete { asset_ids, yes } => {
            let confirmation = confirm_bulk("asset", asset_ids.len(), yes).await?;
            page.load().await;
            report_bulk(&page.bulk_delete(&asset_ids, confirmation).await?)
        }
    }
}

async fn run_billing(client: &Client, billing: BillingCommand) -> Result<(), CliError> {
    let page = BillingPage::new(client.content().clone());
    match billing.command {
        BillingSubcommand::Show => {
            let data = page.load().await;
            match &data.current {
                Loadable::Ready(sub) => {
                    let ending = if sub.cancel_at_period_end { " (cancels at period end)" } else { "" };
                    println!("plan: {} [{}]{ending}", sub.plan_name, sub.status);
                    println!("credits: {}/{}", sub.credits_remaining, sub.credits_per_month);
                }
                Loadable::Failed(message) => eprintln!("subscription: {message}"),
                Loadable::Idle => {}
            }
            match &data.plans {
                Loadable::Ready(plans) => {
                    println!("available plans:");
                    for plan in plans {
                        println!(
                            "  {:<12} {:<16} ${:.2}/mo  ${:.2}/yr  {} credits",
                            plan.id, plan.name, plan.price_monthly, plan.price_yearly, plan.credits_per_month
                        );
                    }
                }
                Loadable::Failed(message) => eprintln!("plans: {message}"),
                Loadable::Idle => {}
            }
            match &data.history {
                Loadable::Ready(history) => {
                    println!("history:");
                    for item in &history.items {
                        let when = item.created_at.as_deref().unwrap_or("-");
                        println!("  {when}  {:.2} {}  {}", item.amount, item.currency, item.status);
                    }
                }
                Loadable::Failed(message) => eprintln!("history: {message}"),
                Loadable::Idle => {}
            }
            Ok(())
        }
        BillingSubcommand::Subscribe { plan_id } => {
            let response = page.subscribe(&plan_id).await?;
            println!("{} ({}: {})", response.message, response.plan_id, response.status);
            Ok(())
        }
        BillingSubcommand::Cancel => {
            let response = page.cancel().await?;
            match response.cancel_at {
                Some(at) => println!("{} (ends {at})", response.message),
                None => println!("{}", response.message),
            }
            Ok(())
        }
    }
}

async fn run_community(client: &Client, community: CommunityCommand) -> Result<(), CliError> {
    let page = CommunityPage::new(client.content().clone());
    let data = page.load().await;
    match community.command {
        None => {
            for gallery in Gallery::ALL {
                println!("== {}", gallery.path_segment());
                match data.gallery(gallery) {
                    Loadable::Ready(projects) => {
                        for project in projects {
                            let title = project.title.as_deref().unwrap_or("(untitled)");
                            let owner = project.owner_username.as_deref().unwrap_or("-");
                            let liked = if project.is_liked { "*" } else { " " };
                            println!("{liked} {}  {title}  by {owner}  {} likes", project.id, project.likes_count);
                        }
                    }
                    Loadable::Failed(message) => eprintln!("{message}"),
                    Loadable::Idle => {}
                }
            }
            Ok(())
        }
        Some(CommunitySubcommand::Like { project_id, unlike }) => {
            let response = page.set_like(&project_id, !unlike).await?;
            println!("liked: {} ({} likes)", response.liked, response.likes_count);
            Ok(())
        }
    }
}

async fn run_users(client: &Client, users: UsersCommand) -> Result<(), CliError> {
    let profile_page = |username: &str| ProfilePage::new(client.content().clone(), username);
    match users.command {
        UsersSubcommand::Show { username } => {
            let page = profile_page(&username);
            let data = page.load().await;
            print_json(&loaded(data.profile)?)?;
            match data.projects {
                Loadable::Ready(listing) => {
                    for project in &listing.projects {
                        let title = project.title.as_deref().unwrap_or("(untitled)");
                        println!("  {}  {title}  {} likes", project.id, project.likes_count);
                    }
                }
                Loadable::Failed(message) => eprintln!("projects: {message}"),
                Loadable::Idle => {}
            }
            Ok(())
        }
        UsersSubcommand::Follow { username, undo } => {
            let page = profile_page(&username);
            loaded(page.load().await.profile)?;
            let response = page.set_follow(!undo).await?;
            println!("{}", response.message);
            Ok(())
        }
        UsersSubcommand::Block { username, undo } => {
            let page = profile_page(&username);
            loaded(page.load().await.profile)?;
            println!("{}", page.set_block(!undo).await?.message);
            Ok(())
        }
        UsersSubcommand::Followers(args) => list_connections(profile_page(&args.username), Connections::Followers, &args).await,
        UsersSubcommand::Following(args) => list_connections(profile_page(&args.username), Connections::Following, &args).await,
    }
}

async fn list_connections(page: ProfilePage, side: Connections, args: &ConnectionsArgs) -> Result<(), CliError> {
    loaded(page.load().await.profile)?;
    let listing = page.connections(side, args.page, args.limit).await?;
    for user in &listing.users {
        let name = user.full_name.as_deref().unwrap_or("");
        println!("{}  @{}  {name}", user.id, user.username);
    }
    println!("{} total{}", listing.total, if listing.has_more { "; more with --page" } else { "" });
    Ok(())
}

async fn run_preferences(client: &Client, preferences: PreferencesCommand) -> Result<(), CliError> {
    let page = PreferencesPage::new(client.content().clone());
    match preferences.command {
        None => print_json(&loaded(page.load().await)?),
        Some(PreferencesSubcommand::Set { key, value }) => {
            page.load().await;
            let changed = page.set(&key, PreferenceValue::parse(&value)).await?;
            println!("{} = {}", changed.key, changed.value);
            Ok(())
        }
    }
}

async fn run_dashboard(client: &Client) -> Result<(), CliError> {
    if !client.store().is_signed_in() {
        return Err(CliError::NotSignedIn);
    }
    let page = DashboardPage::new(client.content().clone());
    let data = page.load().await;
    match &data.profile {
        Loadable::Ready(user) => {
            println!("{} <{}>  plan: {}  credits: {}", user.username, user.email, user.plan, user.credits);
        }
        Loadable::Failed(message) => eprintln!("profile: {message}"),
        Loadable::Idle => {}
    }
    match &data.subscription {
        Loadable::Ready(sub) => println!("subscription: {} [{}]", sub.plan_name, sub.status),
        Loadable::Failed(message) => eprintln!("subscription: {message}"),
        Loadable::Idle => {}
    }
    match &data.projects {
        Loadable::Ready(listing) => {
            println!("{} project(s)", listing.total.max(listing.projects.len()));
            for project in listing.projects.iter().take(5) {
                let title = project.title.as_deref().unwrap_or("(untitled)");
                println!("  {}  {title}  [{}]", project.id, project.visibility);
            }
        }
        Loadable::Failed(message) => eprintln!("projects: {message}"),
        Loadable::Idle => {}
    }
    Ok(())
}

fn loaded<T>(slot: Loadable<T>) -> Result<T, CliError> {
    match slot {
        Loadable::Ready(value) => Ok(value),
        Loadable::Failed(message) => Err(CliError::Load(message)),
        Loadable::Idle => Err(CliError::Cancelled),
    }
}

async fn confirm_bulk(noun: &str, count: usize, yes: bool) -> Result<Confirmation, CliError> {
    if yes || prompt::confirm(&format!("delete {count} {noun}(s)")).await? {
        Ok(Confirmation::confirm(count))
    } else {
        Err(CliError::Cancelled)
    }
}

fn report_bulk(outcome: &BulkOutcome) -> Result<(), CliError> {
    for id in &outcome.deleted {
        println!("deleted {id}");
    }
    for (id, e) in &outcome.failed {
        eprintln!("failed {id}: {}", e.user_message());
    }
    if outcome.is_complete() { Ok(()) } else { Err(CliError::Partial(outcome.failed.len())) }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
