use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::{Arg, ArgMatches, Command};
use folio_common::{Document, validate_candidate};
use folio_editor::{Editor, HttpContentApi, NotificationKind};
use tracing_subscriber::{self, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let matches = Command::new("folio-editor")
        .about("Edit portfolio content from the command line")
        .arg(
            Arg::new("url")
                .long("url")
                .value_name("URL")
                .help("Content server root")
                .env("FOLIO_URL")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .value_name("USERNAME")
                .help("Administrator username")
                .env("FOLIO_USER")
                .default_value("admin"),
        )
        .subcommand_required(true)
        .subcommand(Command::new("status").about("Report whether the server is reachable and the session state"))
        .subcommand(
            Command::new("pull")
                .about("Download the current document to a file")
                .arg(Arg::new("file").required(true).value_name("FILE")),
        )
        .subcommand(
            Command::new("push")
                .about("Replace the stored document with a file's contents")
                .arg(Arg::new("file").required(true).value_name("FILE")),
        )
        .subcommand(
            Command::new("import")
                .about("Merge the known sections of a backup file into the stored document")
                .arg(Arg::new("file").required(true).value_name("FILE")),
        )
        .get_matches();

    let url = matches.get_one::<String>("url").context("missing --url")?;
    let api = HttpContentApi::new(url.as_str()).context("Failed to create HTTP client")?;
    let mut editor = Editor::new(api);

    match matches.subcommand() {
        Some(("status", _)) => {
            let authenticated = editor
                .is_authenticated()
                .await
                .with_context(|| format!("Failed to reach {url}"))?;
            println!("Server: {url}");
            println!("Authenticated: {authenticated}");
        }
        Some(("pull", args)) => {
            sign_in(&mut editor, &matches).await?;
            let path = file_arg(args)?;
            let encoded = serde_json::to_string_pretty(editor.state().mirror())?;
            fs::write(&path, encoded + "\n")
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "Pulled {} sections into {}",
                editor.state().mirror().len(),
                path.display()
            );
            editor.logout().await.ok();
        }
        Some(("push", args)) => {
            let path = file_arg(args)?;
            let document = read_document(&path)?;

            sign_in(&mut editor, &matches).await?;
            let changed = editor.state_mut().stage_document(document);
            if changed == 0 {
                println!("Nothing to push: {} matches the server.", path.display());
                editor.logout().await.ok();
                return Ok(());
            }

            save_and_report(&mut editor).await?;
        }
        Some(("import", args)) => {
            let path = file_arg(args)?;
            let backup = read_backup(&path)?;

            sign_in(&mut editor, &matches).await?;
            let imported = editor.state_mut().import_sections(backup);
            if imported == 0 {
                println!("Nothing to import: {} has no known sections.", path.display());
                editor.logout().await.ok();
                return Ok(());
            }

            println!("Importing {imported} sections from {}", path.display());
            save_and_report(&mut editor).await?;
        }
        _ => bail!("Unknown command"),
    }

    Ok(())
}

/// Saves every dirty section, prints one line per section and signs out.
async fn save_and_report(editor: &mut Editor<HttpContentApi>) -> Result<()> {
    let notifications = editor.save_all_dirty().await;
    let mut failed = 0;
    for notification in &notifications {
        match notification.kind {
            NotificationKind::Success => println!("✓ {}", notification.message),
            NotificationKind::Error => {
                failed += 1;
                println!("✗ {}: {}", notification.section, notification.message);
            }
        }
    }
    editor.logout().await.ok();

    if failed > 0 {
        bail!("{failed} of {} section saves failed", notifications.len());
    }
    Ok(())
}

async fn sign_in(editor: &mut Editor<HttpContentApi>, matches: &ArgMatches) -> Result<()> {
    let user = matches.get_one::<String>("user").context("missing --user")?;
    let password = match env::var("FOLIO_PASSWORD") {
        Ok(password) if !password.is_empty() => password,
        _ => dialoguer::Password::new()
            .with_prompt(format!("Password for {user}"))
            .interact()
            .context("Failed to read password")?,
    };

    editor
        .login(user, &password)
        .await
        .context("Failed to sign in")
}

fn file_arg(args: &ArgMatches) -> Result<PathBuf> {
    args.get_one::<String>("file")
        .map(PathBuf::from)
        .context("missing FILE")
}

/// Reads a document and applies the server's acceptance rules locally, so an
/// incomplete file is refused before anything is sent.
fn read_document(path: &Path) -> Result<Document> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))?;
    validate_candidate(value).with_context(|| format!("{} is not a complete document", path.display()))
}

/// A backup only has to be a JSON object; sections are filtered on import.
fn read_backup(path: &Path) -> Result<Document> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))?;
    Document::from_value(value).with_context(|| format!("{} is not a JSON object", path.display()))
}
