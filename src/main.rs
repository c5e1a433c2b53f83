// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Taskboard command-line client.
//!
//! Signs in against the board backend, shows the board and contacts, and
//! edits tasks. The session is kept in a storage file between runs.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use taskboard_client::{
    config::Config,
    models::{contact::group_by_letter, Priority, Subtask, TaskDraft, TaskStatus},
    navigation::{HistoryNavigator, Route},
    storage::LocalStorage,
    time_utils::{format_utc_rfc3339, parse_date_input},
    validation::{ContactForm, LoginForm, SignupForm},
    AppContext,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "taskboard", about = "Kanban board client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login { email: String, password: String },

    /// Sign in as the guest user
    Guest,

    /// Create an account
    Register {
        name: String,
        email: String,
        password: String,
        /// Accept the privacy policy
        #[arg(long)]
        accept_privacy_policy: bool,
    },

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Show the board columns and summary
    Board,

    /// Add a task
    AddTask {
        title: String,
        /// Due date (YYYY-MM-DD or RFC3339)
        #[arg(short, long)]
        due: String,
        #[arg(short, long, default_value = "Technical Task")]
        category: String,
        #[arg(short, long, default_value = "medium")]
        priority: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Contact ID to assign (repeatable)
        #[arg(short, long, action = clap::ArgAction::Append)]
        assign: Vec<String>,
        /// Subtask title (repeatable)
        #[arg(short, long, action = clap::ArgAction::Append)]
        subtask: Vec<String>,
    },

    /// Move a task to another column
    Move { task_id: String, status: String },

    /// Delete a task
    DeleteTask { task_id: String },

    /// List contacts grouped by letter
    Contacts,

    /// Add a contact
    AddContact {
        name: String,
        email: String,
        phone: String,
    },

    /// Delete a contact
    DeleteContact { contact_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    let storage = LocalStorage::open(&config.storage_path)
        .with_context(|| format!("Failed to open {}", config.storage_path.display()))?;

    let navigator = Arc::new(HistoryNavigator::new(Route::Landing));
    let ctx = AppContext::bootstrap(config, storage, navigator).await;

    run(&ctx, cli.command).await
}

async fn run(ctx: &AppContext, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Login { email, password } => {
            let form = LoginForm { email, password };
            check_form(form.validate())?;
            match ctx.session.login(&form.to_credentials()).await {
                Ok(session) => println!("Signed in as {} <{}>", session.user.name, session.user.email),
                Err(failure) => bail!("{failure}"),
            }
        }
        Commands::Guest => match ctx.session.login_as_guest().await {
            Ok(session) => println!("Signed in as {}", session.user.name),
            Err(failure) => bail!("{failure}"),
        },
        Commands::Register {
            name,
            email,
            password,
            accept_privacy_policy,
        } => {
            let form = SignupForm {
                name,
                email,
                confirm_password: password.clone(),
                password,
                accept_privacy_policy,
            };
            check_form(form.validate())?;
            match ctx.session.register(&form.to_registration()).await {
                Ok(session) => println!("Registered {}", session.user.email),
                Err(failure) => bail!("{failure}"),
            }
        }
        Commands::Logout => {
            ctx.session.logout().await;
            println!("Signed out");
        }
        Commands::Whoami => match ctx.session.current_user() {
            Some(user) => println!("{} <{}> (id {})", user.name, user.email, user.id),
            None => println!("Not signed in"),
        },
        Commands::Board => {
            require_session(ctx)?;
            print_board(ctx);
        }
        Commands::AddTask {
            title,
            due,
            category,
            priority,
            description,
            assign,
            subtask,
        } => {
            require_session(ctx)?;
            let due_date = parse_date_input(&due)
                .with_context(|| format!("Invalid due date: {due}"))?;
            let mut draft = TaskDraft::new(title, category, due_date);
            draft.priority = priority.parse::<Priority>().map_err(anyhow::Error::msg)?;
            draft.description = description;
            draft.assigned_to = assign;
            draft.subtasks = subtask.into_iter().map(Subtask::new).collect();

            let id = ctx.tasks.create(&draft).await?;
            println!("Created task {id}");
        }
        Commands::Move { task_id, status } => {
            require_session(ctx)?;
            let status = status.parse::<TaskStatus>().map_err(anyhow::Error::msg)?;
            ctx.tasks.move_task(&task_id, status).await?;
            println!("Moved task {task_id} to {}", status.title());
        }
        Commands::DeleteTask { task_id } => {
            require_session(ctx)?;
            ctx.tasks.delete(&task_id).await?;
            println!("Deleted task {task_id}");
        }
        Commands::Contacts => {
            require_session(ctx)?;
            for group in group_by_letter(&ctx.contacts.list().await) {
                println!("{}", group.letter);
                for contact in group.contacts {
                    println!(
                        "  [{}] {:<3} {} <{}> {} ({})",
                        contact.id,
                        contact.initials(),
                        contact.display_name(),
                        contact.email,
                        contact.phone,
                        contact.avatar_color()
                    );
                }
            }
        }
        Commands::AddContact { name, email, phone } => {
            require_session(ctx)?;
            let form = ContactForm { name, email, phone };
            check_form(form.validate())?;
            let contact = ctx.contacts.create(&form.to_draft()).await?;
            println!("Created contact {}", contact.id);
        }
        Commands::DeleteContact { contact_id } => {
            require_session(ctx)?;
            ctx.contacts.delete(&contact_id).await?;
            println!("Deleted contact {contact_id}");
        }
    }
    Ok(())
}

fn require_session(ctx: &AppContext) -> anyhow::Result<()> {
    if !ctx.session.is_logged_in() {
        bail!("Not signed in; run `taskboard login` or `taskboard guest` first");
    }
    Ok(())
}

fn check_form(errors: taskboard_client::validation::FormErrors) -> anyhow::Result<()> {
    if errors.is_valid() {
        return Ok(());
    }
    let mut lines: Vec<String> = errors
        .fields
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect();
    lines.extend(errors.message);
    bail!("{}", lines.join("\n"))
}

fn print_board(ctx: &AppContext) {
    let columns = ctx.tasks.columns();
    for (status, tasks) in columns.iter() {
        println!("{} ({})", status.title(), tasks.len());
        for task in tasks {
            println!(
                "  [{}] {} ({}, due {}, {}/{} subtasks)",
                task.id.as_deref().unwrap_or("-"),
                task.title,
                task.priority.as_str(),
                format_utc_rfc3339(task.due_date),
                task.completed_subtasks(),
                task.subtasks.len()
            );
        }
    }

    let summary = columns.summary();
    println!(
        "\n{} tasks on board, {} urgent{}",
        summary.total,
        summary.urgent,
        summary
            .next_urgent_due
            .map(|d| format!(", next urgent deadline {}", d.format("%Y-%m-%d")))
            .unwrap_or_default()
    );
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("taskboard_client=info,warn")),
        )
        .with(format)
        .init();
}
