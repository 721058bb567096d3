mod commands;
mod display;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use spectralink_common::{ensure_dir, DataLayout};
use spectralink_core::{
    Attachment, BodyView, ChatClient, ClientConfig, Credentials, HttpTransport, Registration,
    RenderedMessage, Role, SendOutcome,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::{guess_content_type, Command, HELP};

#[derive(Parser)]
#[command(name = "spectralink")]
#[command(about = "SpectraLink terminal chat")]
struct Cli {
    /// Server URL (overrides SPECTRALINK_SERVER)
    #[arg(short, long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Create an account
    Register {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        password: String,
        #[arg(short, long)]
        email: String,
        #[arg(long)]
        phone: String,
    },
    /// Log in and chat
    Chat {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        password: String,
    },
}

fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::never("logs", "spectralink-cli.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "spectralink_cli=debug,spectralink_core=debug,info".into());

    // File only; the terminal belongs to the chat.
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = init_tracing();
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    info!("Using server {}", config.server_url);
    let transport = Arc::new(HttpTransport::new(&config)?);

    match cli.command {
        Mode::Register {
            user,
            password,
            email,
            phone,
        } => {
            let registration = Registration {
                username: user,
                password,
                email,
                phone,
            };
            transport
                .register(&registration)
                .await
                .context("Registration failed")?;
            println!("Registered {}. You can now log in.", registration.username);
            Ok(())
        }
        Mode::Chat { user, password } => {
            transport
                .login(&Credentials::new(&user, &password))
                .await
                .context("Login failed")?;
            chat(transport, config, user).await
        }
    }
}

async fn chat(
    transport: Arc<HttpTransport>,
    config: ClientConfig,
    user: String,
) -> anyhow::Result<()> {
    let client = ChatClient::new(transport.clone(), config, user);
    let mut updates = client.on_update();
    client.start().await;

    let view = client.snapshot().await;
    match view.role {
        Role::Observer => println!("Observer mode: reading every conversation. /hide on to mask."),
        Role::Standard => {
            println!("Signed in as {}.", view.display_name);
            print_contacts(&client).await;
        }
    }
    println!("Type /help for commands.");

    let mut shown: Vec<RenderedMessage> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = client.snapshot().await;
                for line in display::delta(&shown, &view.messages) {
                    println!("{}", line);
                }
                shown = view.messages;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match commands::parse(line.trim_end()) {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        if let Err(e) = run_command(&client, &transport, &shown, command).await {
                            error!("Command failed: {:#}", e);
                            println!("! {:#}", e);
                        }
                    }
                    Err(usage) => println!("! {}", usage),
                }
            }
        }
    }

    client.sign_out().await;
    println!("Signed out.");
    Ok(())
}

async fn run_command(
    client: &ChatClient<HttpTransport>,
    transport: &HttpTransport,
    shown: &[RenderedMessage],
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::Say(text) => {
            client.set_text(text).await;
            send(client).await?;
        }
        Command::Retry => send(client).await?,
        Command::File(path) => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Cannot read {}", path.display()))?;
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("attachment")
                .to_string();
            let mut attachment = Attachment::new(filename, bytes);
            if let Some(content_type) = guess_content_type(&path) {
                attachment = attachment.with_content_type(content_type);
            }
            client.attach(attachment).await;
            if let Err(e) = send(client).await {
                client.clear_attachment().await;
                return Err(e);
            }
        }
        Command::To(name) => {
            ensure_selectable(client.role().await)?;
            if !client.select_contact(&name).await {
                bail!("no contact named {}", name);
            }
            println!("── conversation with {} ──", name);
        }
        Command::Group(name) => {
            ensure_selectable(client.role().await)?;
            client.select_group(name.clone()).await;
            println!("── #{} ──", name);
        }
        Command::NewGroup { name, members } => {
            let members: Vec<&str> = members.iter().map(String::as_str).collect();
            let group = client.create_group(&name, &members).await?;
            println!("Created #{} ({} members)", group.name, group.members.len());
        }
        Command::Groups => {
            for group in client.groups().await {
                println!("  #{}", group.name);
            }
        }
        Command::Contacts => print_contacts(client).await,
        Command::Save(n) => {
            let message = shown
                .get(n - 1)
                .with_context(|| format!("no message {}", n))?;
            let BodyView::Attachment { locator, filename } = &message.body else {
                bail!("message {} has no attachment", n);
            };
            let path = save_attachment(transport, locator, filename).await?;
            println!("Saved to {}", path.display());
        }
        Command::Hide(hide) => client.set_hide_encrypted(hide).await,
        Command::Leave => client.deselect().await,
        Command::Refresh => {
            client.refresh_directory().await;
            client.refresh_groups().await;
            client.refresh_messages().await;
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
    Ok(())
}

/// Conversation commands make no sense for the observer, which reads everything.
fn ensure_selectable(role: Role) -> anyhow::Result<()> {
    if role.is_observer() {
        bail!("the observer reads everything; there is nothing to select");
    }
    Ok(())
}

/// Send the composer. A transient failure keeps it for `/retry`.
async fn send(client: &ChatClient<HttpTransport>) -> anyhow::Result<()> {
    match client.send().await {
        Ok(outcome) => report(outcome),
        Err(e) if e.is_retryable() => {
            warn!("Send failed, composer kept: {}", e);
            println!("! {} (kept; /retry to send again)", e);
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn report(outcome: SendOutcome) {
    match outcome {
        SendOutcome::Sent | SendOutcome::NothingToSend => {}
        SendOutcome::NoTarget => println!("! pick a conversation first (/to <name>)"),
    }
}

async fn print_contacts(client: &ChatClient<HttpTransport>) {
    let contacts = client.contacts().await;
    if contacts.is_empty() {
        println!("No contacts yet.");
        return;
    }
    println!("Contacts:");
    for contact in contacts {
        println!("  {}", contact.display);
    }
}

async fn save_attachment(
    transport: &HttpTransport,
    locator: &str,
    filename: &str,
) -> anyhow::Result<PathBuf> {
    let dir = DataLayout::from_env().downloads_dir();
    ensure_dir(&dir)?;
    let path = dir.join(Path::new(filename).file_name().unwrap_or_default());

    let bytes = transport.download(locator).await?;
    tokio::fs::write(&path, bytes).await?;
    info!("Saved {} to {:?}", locator, path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observer_cannot_open_conversations() {
        assert!(ensure_selectable(Role::Standard).is_ok());
        let err = ensure_selectable(Role::Observer).unwrap_err();
        assert!(err.to_string().contains("observer"));
    }
}
