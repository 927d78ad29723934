use clap::Subcommand;

use crate::config::AppConfig;
use crate::context::Context;
use crate::database::models::User;
use crate::database::{DatabaseManager, RepositoryResult, UserRepository};

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create an account")]
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
        #[arg(long, help = "Grant staff (write) access")]
        staff: bool,
        #[arg(long, help = "Grant admin flag")]
        admin: bool,
    },

    #[command(about = "Grant staff access to an existing account")]
    Promote {
        #[arg(help = "Username to promote")]
        username: String,
        #[arg(long, help = "Also grant admin flag")]
        admin: bool,
    },

    #[command(about = "Revoke staff and admin access")]
    Demote {
        #[arg(help = "Username to demote")]
        username: String,
    },
}

pub async fn handle(cmd: UserCommands, config: AppConfig) -> anyhow::Result<()> {
    let database = DatabaseManager::connect(&config.database).await?;
    let ctx = Context::with_timeout(config.request_timeout());
    let result = run(cmd, database.users().as_ref(), &ctx).await;
    database.close().await;

    let user = result?;
    println!(
        "{} ({}) staff={} admin={}",
        user.username, user.id, user.is_staff, user.is_admin
    );
    Ok(())
}

async fn run(cmd: UserCommands, users: &dyn UserRepository, ctx: &Context) -> RepositoryResult<User> {
    match cmd {
        UserCommands::Create { username, email, name, password, staff, admin } => {
            let user = User::new(username, email, name, password);
            create_user(users, ctx, user, staff, admin).await
        }
        UserCommands::Promote { username, admin } => set_roles(users, ctx, &username, true, admin).await,
        UserCommands::Demote { username } => set_roles(users, ctx, &username, false, false).await,
    }
}

/// Add `user` with its role flags in a single insert.
pub async fn create_user(
    users: &dyn UserRepository,
    ctx: &Context,
    mut user: User,
    staff: bool,
    admin: bool,
) -> RepositoryResult<User> {
    user.is_staff = staff;
    user.is_admin = admin;
    let created = users.add(ctx, user).await?;
    tracing::info!(
        "Created {} with staff={} admin={}",
        created.username,
        created.is_staff,
        created.is_admin
    );
    Ok(created)
}

/// Set both role flags on an existing account.
pub async fn set_roles(
    users: &dyn UserRepository,
    ctx: &Context,
    username: &str,
    staff: bool,
    admin: bool,
) -> RepositoryResult<User> {
    let user = users.find_by_username(ctx, username).await?;
    set_flags(users, ctx, user, staff, admin).await
}

async fn set_flags(
    users: &dyn UserRepository,
    ctx: &Context,
    mut user: User,
    staff: bool,
    admin: bool,
) -> RepositoryResult<User> {
    user.is_staff = staff;
    user.is_admin = admin;
    let updated = users.update(ctx, user).await?;
    tracing::info!(
        "Roles for {} set to staff={} admin={}",
        updated.username,
        updated.is_staff,
        updated.is_admin
    );
    Ok(updated)
}
