//! CLI commands

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use goftr_admin_core::validation::rules;
use goftr_admin_core::{
    CreateUserRequest, ForgotPasswordRequest, RegisterRequest, ResetPasswordRequest, Role,
    UpdateProfileRequest, UpdateUserRequest, UserProfile, UserStatus, Validate, ValidationErrors,
};
use goftr_admin_frontend_common::{GuardDecision, NavigationTarget, SessionStore};
use std::io::{BufRead, Write};
use tracing::{info, warn};

const PASSWORD_ENV: &str = "GOFTR_ADMIN_PASSWORD";

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Password (prompted when omitted)
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },

    /// Revoke the session and forget the stored tokens
    Logout,

    /// Show the signed-in user
    Whoami {
        /// Print the raw profile as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a new account
    Register {
        #[arg(long)]
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        /// Password (prompted twice when omitted)
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },

    /// Request a password reset email
    ForgotPassword {
        #[arg(long)]
        email: String,
    },

    /// Set a new password with a reset token
    ResetPassword {
        /// Token from the reset email
        #[arg(long)]
        token: String,

        /// New password (prompted twice when omitted)
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },

    /// Update your own profile
    Profile {
        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Prompt for the current and a new password
        #[arg(long)]
        change_password: bool,
    },

    /// Manage user accounts (admin only)
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Check whether the stored session may open a panel page
    Route {
        /// Page path, optionally with a query string
        path: String,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List all users
    List {
        /// Print the raw list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one user
    Get { id: i64 },

    /// Create a user
    Create {
        #[arg(long)]
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long, default_value = "user")]
        role: Role,

        #[arg(long)]
        status: Option<UserStatus>,

        /// Initial password (prompted twice when omitted)
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },

    /// Change a user's details
    Update {
        id: i64,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        role: Option<Role>,

        #[arg(long)]
        status: Option<UserStatus>,
    },

    /// Delete a user
    Delete {
        id: i64,

        /// Skip the safety check
        #[arg(long)]
        yes: bool,
    },
}

impl Commands {
    pub async fn execute(self, session: &SessionStore) -> Result<()> {
        match self {
            Commands::Login { email, password } => {
                let password = match password {
                    Some(password) => password,
                    None => prompt("Password")?,
                };
                let profile = session.sign_in(&email, &password).await?;
                match profile {
                    Some(profile) => println!("Signed in as {}", describe(&profile)),
                    None => println!("Signed in as {email}"),
                }
                Ok(())
            }
            Commands::Logout => {
                session.sign_out().await;
                println!("Signed out");
                Ok(())
            }
            Commands::Whoami { json } => {
                let profile = current_profile(session).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&profile)?);
                } else {
                    println!("{}", describe(&profile));
                }
                Ok(())
            }
            Commands::Register {
                email,
                first_name,
                last_name,
                password,
            } => {
                let request = RegisterRequest {
                    email,
                    password: new_password(password)?,
                    first_name,
                    last_name,
                };
                request.validate()?;

                let registered = session.client().register(&request).await?;
                info!(id = ?registered.id, "Registered account");
                println!("Registered {}", registered.email);
                Ok(())
            }
            Commands::ForgotPassword { email } => {
                let request = ForgotPasswordRequest { email };
                request.validate()?;

                session.client().forgot_password(&request).await?;
                println!("If {} has an account, a reset email is on its way", request.email);
                Ok(())
            }
            Commands::ResetPassword { token, password } => {
                let request = ResetPasswordRequest {
                    token,
                    new_password: new_password(password)?,
                };
                request.validate()?;

                session.client().reset_password(&request).await?;
                println!("Password updated, sign in with the new password");
                Ok(())
            }
            Commands::Profile {
                first_name,
                last_name,
                email,
                change_password,
            } => {
                require_session(session)?;
                let mut request = UpdateProfileRequest {
                    first_name,
                    last_name,
                    email,
                    ..Default::default()
                };
                if change_password {
                    request.current_password = Some(prompt("Current password")?);
                    request.new_password = Some(new_password(None)?);
                }
                if request == UpdateProfileRequest::default() {
                    bail!("Nothing to update");
                }
                request.validate()?;

                session.client().update_me(&request).await?;
                if let Err(err) = session.get_profile().await {
                    warn!("Profile updated but could not be reloaded: {err}");
                }
                println!("Profile updated");
                Ok(())
            }
            Commands::Users { command } => {
                require_session(session)?;
                command.execute(session).await
            }
            Commands::Route { path } => {
                if session.is_authenticated() && session.user().is_none() {
                    if let Err(err) = session.get_profile().await {
                        warn!("Evaluating without a profile: {err}");
                    }
                }

                let target = NavigationTarget::parse(&path);
                match session.guard().evaluate(&target, &session.state()) {
                    GuardDecision::Allow => println!("allow {}", target.full_path()),
                    GuardDecision::Redirect { location, reason } => {
                        println!("redirect {location} ({reason:?})")
                    }
                }
                Ok(())
            }
        }
    }
}

impl UserCommands {
    pub async fn execute(self, session: &SessionStore) -> Result<()> {
        let client = session.client();
        match self {
            UserCommands::List { json } => {
                let users = client.list_users().await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&users)?);
                    return Ok(());
                }
                println!("{:>6}  {:<32}  {:<24}  {:<6}  STATUS", "ID", "EMAIL", "NAME", "ROLE");
                for user in &users {
                    println!(
                        "{:>6}  {:<32}  {:<24}  {:<6}  {}",
                        user.id,
                        user.email,
                        user.full_name(),
                        user.role,
                        user.status.map(|s| s.as_str()).unwrap_or("-"),
                    );
                }
                Ok(())
            }
            UserCommands::Get { id } => {
                let user = client.get_user(id).await?;
                println!("{}", serde_json::to_string_pretty(&user)?);
                Ok(())
            }
            UserCommands::Create {
                email,
                first_name,
                last_name,
                role,
                status,
                password,
            } => {
                let request = CreateUserRequest {
                    email,
                    first_name,
                    last_name,
                    password: new_password(password)?,
                    role,
                    status,
                };
                request.validate()?;

                client.create_user(&request).await?;
                println!("Created {} ({})", request.email, request.role);
                Ok(())
            }
            UserCommands::Update {
                id,
                email,
                first_name,
                last_name,
                role,
                status,
            } => {
                let request = UpdateUserRequest {
                    email,
                    first_name,
                    last_name,
                    role,
                    status,
                };
                if request == UpdateUserRequest::default() {
                    bail!("Nothing to update");
                }
                request.validate()?;

                client.update_user(id, &request).await?;
                println!("Updated user {id}");
                Ok(())
            }
            UserCommands::Delete { id, yes } => {
                if !yes {
                    bail!("Refusing to delete user {id} without --yes");
                }
                client.delete_user(id).await?;
                println!("Deleted user {id}");
                Ok(())
            }
        }
    }
}

fn require_session(session: &SessionStore) -> Result<()> {
    if !session.is_authenticated() {
        bail!("Not signed in, run `goftr-admin login` first");
    }
    Ok(())
}

async fn current_profile(session: &SessionStore) -> Result<UserProfile> {
    require_session(session)?;
    match session.get_profile().await? {
        Some(profile) => Ok(profile),
        None => bail!("Session ended while loading the profile, sign in again"),
    }
}

fn describe(profile: &UserProfile) -> String {
    format!(
        "{} <{}> (id {}, {})",
        profile.full_name(),
        profile.email,
        profile.id,
        profile.role
    )
}

/// Use the given password, or prompt for one and its confirmation
fn new_password(given: Option<String>) -> Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }

    let password = prompt("New password")?;
    let confirmation = prompt("Repeat password")?;
    let errors: Vec<_> = [
        rules::password(&password, "password"),
        rules::password_confirmation(&confirmation, &password),
    ]
    .into_iter()
    .filter_map(Result::err)
    .collect();
    if !errors.is_empty() {
        return Err(ValidationErrors(errors).into());
    }
    Ok(password)
}

fn prompt(label: &str) -> Result<String> {
    let mut stderr = std::io::stderr();
    write!(stderr, "{label}: ")?;
    stderr.flush()?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
