mod config;

use clap::{Parser, Subcommand};
use config::SyncboardConfig;
use std::path::PathBuf;
use std::sync::Arc;
use syncboard_core::{InvocationContext, SkillRecord, SyncboardResult, ToolCall};
use syncboard_security::{AuditStore, InvocationLogEntry};
use syncboard_skills::ToolLoader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "syncboard", about = "SyncBoard skill administration and audited tool dispatch")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "syncboard.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage skill records
    Skills {
        #[command(subcommand)]
        action: SkillsAction,
    },
    /// Inspect the tools a turn would receive
    Tools {
        #[command(subcommand)]
        action: ToolsAction,
    },
    /// Invoke a tool through the full check/execute/audit path
    Invoke {
        /// Tool (skill) name
        tool: String,
        /// Free-text input passed to the skill
        input: String,
        #[arg(long)]
        thread: Option<String>,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        channel: Option<String>,
    },
    /// Query or sweep the invocation audit log
    Audit {
        #[command(subcommand)]
        action: AuditAction,
    },
}

#[derive(Subcommand)]
enum SkillsAction {
    /// List every registered skill with its flags
    List,
    /// Mark a skill as approved
    Approve { name: String },
    /// Withdraw approval
    Revoke { name: String },
    /// Enable an approved skill
    Activate { name: String },
    /// Disable a skill without revoking it
    Deactivate { name: String },
}

#[derive(Subcommand)]
enum ToolsAction {
    /// List eligible tools and any skills that failed to load
    List,
}

#[derive(Subcommand)]
enum AuditAction {
    /// Most recent entries
    Recent {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Entries for one skill
    Skill {
        name: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Entries whose security check failed
    Failures {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Delete one batch of entries past retention
    Sweep,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = SyncboardConfig::load(&cli.config).await?;
    let registry = Arc::new(config.open_registry().await?);

    match cli.command {
        Commands::Skills { action } => {
            let changed = match action {
                SkillsAction::List => {
                    print_skills(&registry.list());
                    None
                }
                SkillsAction::Approve { name } => Some(registry.approve(&name)?),
                SkillsAction::Revoke { name } => Some(registry.revoke(&name)?),
                SkillsAction::Activate { name } => Some(registry.activate(&name)?),
                SkillsAction::Deactivate { name } => Some(registry.deactivate(&name)?),
            };
            if let Some(record) = changed {
                registry.save(&config.registry_path()).await?;
                println!(
                    "{}: approved={} active={}",
                    record.name, record.approved, record.active
                );
            }
        }
        Commands::Tools {
            action: ToolsAction::List,
        } => {
            let audit = config.open_audit()?;
            let tools = ToolLoader::new(registry, config.dispatch(audit)?).load();
            if tools.is_empty() {
                println!("No tools available. Approve and activate a skill first.");
            } else {
                println!("Available tools:");
                for descriptor in tools.descriptors() {
                    println!("  {} - {}", descriptor.name, descriptor.description);
                }
            }
            for skipped in tools.skipped() {
                println!("  skipped {}: {}", skipped.name, skipped.reason);
            }
        }
        Commands::Invoke {
            tool,
            input,
            thread,
            user,
            channel,
        } => {
            let audit = config.open_audit()?;
            let tools = ToolLoader::new(registry, config.dispatch(audit)?).load();
            let context = InvocationContext {
                thread_id: thread,
                user_id: user,
                channel,
            };
            let call = ToolCall::with_input("cli", tool, input);
            let output = tools.invoke(&call, &context).await;
            let report = serde_json::json!({ "is_error": output.is_error(), "output": output });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Audit { action } => {
            let audit = config.open_audit()?;
            match action {
                AuditAction::Recent { limit } => print_entries(audit.recent(limit).await)?,
                AuditAction::Skill { name, limit } => {
                    print_entries(audit.by_skill(&name, limit).await)?;
                }
                AuditAction::Failures { limit } => {
                    print_entries(audit.security_failures(limit).await)?;
                }
                AuditAction::Sweep => {
                    let deleted = audit.sweep().await?;
                    info!(deleted, "Audit sweep finished");
                    println!("Deleted {deleted} expired entries");
                }
            }
        }
    }

    Ok(())
}

fn print_skills(skills: &[SkillRecord]) {
    if skills.is_empty() {
        println!("No skills registered.");
        println!("Seed skills in syncboard.toml under [[skills]]");
        return;
    }
    println!("Registered skills:");
    for skill in skills {
        let state = match (skill.approved, skill.active) {
            (true, true) => "enabled",
            (true, false) => "approved, inactive",
            (false, true) => "active, awaiting approval",
            (false, false) => "pending",
        };
        println!(
            "  {} [{}] {} - {}",
            skill.name, skill.skill_type, state, skill.description
        );
    }
    println!("\nTotal: {} skill(s)", skills.len());
}

fn print_entries(entries: SyncboardResult<Vec<InvocationLogEntry>>) -> anyhow::Result<()> {
    for entry in entries? {
        println!("{}", serde_json::to_string(&entry)?);
    }
    Ok(())
}
