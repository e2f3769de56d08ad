// UI layer: terminal rendering of records and the interactive flows behind
// each CLI command. Everything here consumes the service clients; nothing in
// the core depends on it.

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::style::Stylize;
use dialoguer::Input;
use indicatif::{HumanBytes, HumanDuration, ProgressBar, ProgressStyle};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config;
use crate::data::DataService;
use crate::icdn::Icdn;
use crate::models::{FileRecord, Mutation};
use crate::search::SearchSpec;
use crate::static_host::StaticHost;
use crate::time;
use crate::upload::{NewRecord, RecordPatch};

/// Print a command failure the way every command reports it.
pub fn report_failure(action: &str, err: &anyhow::Error) {
    eprintln!("{}", format!("Failed to {action}:\n  > {err:#}").red());
}

fn field(title: &str, value: &str) {
    println!("\n  {}\n    {}", format!("{title}:").blue(), value.yellow());
}

/// Multi-line view of one record.
pub fn full_view(record: &FileRecord) {
    println!(
        "{} {} {}{}{}",
        "*".dark_grey(),
        record.name.as_str().cyan(),
        "(".dark_grey(),
        record.uuid.as_str().yellow(),
        format!(", {}, {})", record.mime, HumanBytes(record.size)).dark_grey(),
    );
    field("File tags", &record.tags.join(", "));
    field("Added at", &record.time.format("%D %I:%M:%S %p (Local)").to_string());
    let age = (Local::now() - record.time).to_std().unwrap_or_default();
    println!("    ({} ago)", HumanDuration(age));

    if !record.data.is_empty() {
        println!("\n  {}", "Additional data:".blue());
        for (key, value) in &record.data {
            println!("    {}{} {}", key.as_str().blue(), ":".dark_grey(), render_value(value).green());
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

pub async fn query(cdn: &Icdn, uuid: &str) -> Result<()> {
    full_view(&cdn.query(uuid).await?);
    Ok(())
}

// Only the final component of a server-supplied name is used, so the default
// download target always lands in the working directory.
fn download_target(record: &FileRecord) -> PathBuf {
    match Path::new(&record.name).file_name().and_then(|name| name.to_str()) {
        Some(name) if !name.trim().is_empty() => PathBuf::from(name),
        _ => PathBuf::from(&record.uuid),
    }
}

/// Download a record's content to `file`, or to the record name.
pub async fn download(cdn: &Icdn, uuid: &str, file: Option<PathBuf>, token: Option<String>) -> Result<()> {
    let token = token.or_else(config::load_token);
    let record = cdn.query(uuid).await?;
    let path = file.unwrap_or_else(|| download_target(&record));
    let content = cdn.file(uuid, token.as_deref()).await?;
    tokio::fs::write(&path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{} {}", "✓ Download complete as".green(), path.display().to_string().blue());
    Ok(())
}

pub async fn search(cdn: &Icdn, spec: &SearchSpec, full: bool) -> Result<()> {
    let query = cdn.search(spec);
    if full {
        for record in query.resolve_records().await? {
            full_view(&record);
        }
    } else {
        for uuid in query.resolve_ids().await? {
            println!("* {}", uuid.green());
        }
    }
    Ok(())
}

/// List one page. `page` is 1-based as typed on the command line.
pub async fn list(cdn: &Icdn, count: u32, page: u32, full: bool, save: Option<PathBuf>) -> Result<()> {
    let query = cdn.list(count, page.saturating_sub(1));
    if full {
        let records = query.resolve_records().await?;
        if records.is_empty() {
            println!("{}", "No items were returned.".red());
            return Ok(());
        }
        println!("Showing {} items from page {}:", records.len(), page);
        for record in &records {
            full_view(record);
            println!();
        }
        return Ok(());
    }

    let uuids = query.resolve_ids().await?;
    if uuids.is_empty() {
        println!("{}", "No items were returned.".red());
        return Ok(());
    }
    println!("Showing {} items from page {}:", uuids.len(), page);
    for uuid in &uuids {
        println!("  * {}", uuid.as_str().green());
    }
    if let Some(path) = save {
        tokio::fs::write(&path, uuids.join("\n"))
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("\nSaved to {}.", path.display().to_string().yellow());
    }
    Ok(())
}

/// Arguments shared by `add` and `update`.
pub struct UploadArgs {
    pub file: Option<PathBuf>,
    pub uuid: Option<String>,
    pub token: Option<String>,
    pub time: Option<i64>,
    pub name: Vec<String>,
}

struct Prompted {
    name: Option<String>,
    tags: Vec<String>,
    data: Map<String, Value>,
}

// Trimmed name, or `None` when blank. Blank is an error when a name is required.
fn entered_name(raw: &str, required: bool) -> Result<Option<String>> {
    let name = raw.trim();
    if name.is_empty() {
        if required {
            anyhow::bail!("A name is required when adding");
        }
        return Ok(None);
    }
    Ok(Some(name.to_string()))
}

// Collect whatever the command line did not supply.
fn prompt_details(name: &[String], name_required: bool) -> Result<Prompted> {
    let name = if !name.is_empty() {
        entered_name(&name.join(" "), name_required)?
    } else {
        let entered: String = Input::new()
            .with_prompt("Name")
            .allow_empty(!name_required)
            .validate_with(|input: &String| -> std::result::Result<(), &'static str> {
                match entered_name(input, name_required) {
                    Ok(_) => Ok(()),
                    Err(_) => Err("A name is required"),
                }
            })
            .interact_text()?;
        entered_name(&entered, name_required)?
    };

    let raw_tags: String = Input::new()
        .with_prompt("Tags (separated by commas)")
        .allow_empty(true)
        .interact_text()?;
    let tags = raw_tags
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect();

    println!("{}", "Attach any additional data (leave blank to continue):".cyan());
    let mut data = Map::new();
    loop {
        let key: String = Input::new().with_prompt("  Name").allow_empty(true).interact_text()?;
        if key.trim().is_empty() {
            break;
        }
        let value: String = Input::new().with_prompt("  Data").allow_empty(true).interact_text()?;
        if value.trim().is_empty() {
            break;
        }
        data.insert(key, Value::String(value));
    }

    Ok(Prompted { name, tags, data })
}

/// Interactive create (no uuid) or partial update (uuid given).
pub async fn upload(cdn: &Icdn, args: UploadArgs) -> Result<()> {
    if let Some(file) = &args.file {
        if !file.is_file() {
            anyhow::bail!("--file must be a valid file that actually exists");
        }
    }
    let token = args.token.or_else(config::load_token);
    let time = args.time.map(time::from_millis).transpose()?;
    let details = prompt_details(&args.name, args.uuid.is_none())?;

    let spinner = spinner("Upload in progress...")?;
    let started = Instant::now();
    let outcome = match args.uuid {
        None => {
            let file = args.file.context("--file is required when adding")?;
            let name = details.name.context("A name is required when adding")?;
            let mut record = NewRecord::new(file, name)
                .tags(details.tags)
                .data(details.data);
            if let Some(time) = time {
                record = record.time(time);
            }
            if let Some(token) = token {
                record = record.token(token);
            }
            cdn.add(record).await
        }
        Some(uuid) => {
            let mut patch = RecordPatch::new(uuid);
            if let Some(file) = args.file {
                patch = patch.file(file);
            }
            if let Some(name) = details.name {
                patch = patch.name(name);
            }
            if !details.tags.is_empty() {
                patch = patch.tags(details.tags);
            }
            if !details.data.is_empty() {
                patch = patch.data(details.data);
            }
            if let Some(time) = time {
                patch = patch.time(time);
            }
            if let Some(token) = token {
                patch = patch.token(token);
            }
            cdn.update(patch).await
        }
    };
    spinner.finish_and_clear();

    let outcome = outcome?;
    let uuid = accepted_upload(&outcome)?;
    let elapsed = format!("{:.1}s", started.elapsed().as_secs_f64());
    match uuid {
        Some(uuid) => println!(
            "{} {} {}. UUID: {}.",
            "✓ Upload complete".green(),
            "in".dark_grey(),
            elapsed.cyan(),
            uuid.yellow()
        ),
        None => println!("{} {} {}.", "✓ Upload complete".green(), "in".dark_grey(), elapsed.cyan()),
    }
    Ok(())
}

// Uuid of the stored record, if the server returned one. A `false`
// acknowledgement is a failed upload.
fn accepted_upload(outcome: &Mutation) -> Result<Option<&str>> {
    if !outcome.succeeded() {
        anyhow::bail!("server declined the upload");
    }
    Ok(outcome.record().map(|record| record.uuid.as_str()))
}

pub async fn remove(cdn: &Icdn, uuid: &str, token: Option<String>) -> Result<()> {
    let token = token.or_else(config::load_token);
    let outcome = cdn.remove(uuid, token.as_deref()).await?;
    if !outcome.succeeded() {
        anyhow::bail!("server declined to remove {uuid}");
    }
    println!("{} {} {}", "✓ Removed".green(), uuid.yellow(), "without issues.".green());
    Ok(())
}

pub async fn details(cdn: &Icdn) -> Result<()> {
    let store = cdn.details().await?;
    println!(
        "{} {} {} {} {}",
        "Current usage:".dark_grey(),
        HumanBytes(store.store_size).to_string().cyan(),
        "/".dark_grey(),
        HumanBytes(store.store_limit).to_string().cyan(),
        format!("({:.1}%)", store.usage_percent()).dark_grey(),
    );
    println!(
        "{} {}{} {}{} {}",
        "File size limit:".dark_grey(),
        HumanBytes(store.file_limit).to_string().cyan(),
        ", Current files:".dark_grey(),
        store.store_length.to_string().cyan(),
        ", Protected:".dark_grey(),
        if store.protected { "yes".red() } else { "no".green() },
    );
    Ok(())
}

pub async fn directory(host: &StaticHost, path: &str) -> Result<()> {
    for entry in host.directory(path).await? {
        println!("  * {}", entry.green());
    }
    Ok(())
}

pub async fn fetch(host: &StaticHost, path: &str, out: Option<PathBuf>) -> Result<()> {
    let content = host.file(path).await?;
    let out = out.unwrap_or_else(|| {
        PathBuf::from(path.rsplit('/').find(|part| !part.is_empty()).unwrap_or("download"))
    });
    tokio::fs::write(&out, &content)
        .await
        .with_context(|| format!("Failed to write {}", out.display()))?;
    println!("{} {} ({})", "✓ Saved".green(), out.display().to_string().blue(), HumanBytes(content.len() as u64));
    Ok(())
}

/// Which data catalogue to print.
#[derive(Debug, Clone, Copy)]
pub enum Catalogue {
    Tags,
    Anime,
    Games,
}

pub async fn catalogue(data: &DataService, which: Catalogue) -> Result<()> {
    match which {
        Catalogue::Tags => {
            for tag in data.tags().await? {
                println!("  * {} {}", tag.name.green(), format!("({})", tag.id).dark_grey());
            }
        }
        Catalogue::Anime => {
            for entry in data.anime().await? {
                println!("  * {} {}", entry.title.green(), entry.tags.join(", ").dark_grey());
            }
        }
        Catalogue::Games => {
            for game in data.games().await? {
                println!(
                    "  * {} {}",
                    game.entry.title.green(),
                    format!("played by {}", game.users.join(", ")).dark_grey()
                );
            }
        }
    }
    Ok(())
}

pub fn token(value: Option<String>, clear: bool) -> Result<()> {
    if clear {
        if config::clear_token()? {
            println!("{}", "✓ Token removed.".green());
        } else {
            println!("{}", "No token was saved.".dark_grey());
        }
        return Ok(());
    }
    match value {
        Some(value) => {
            let path = config::persist_token(&value)?;
            println!("{} {}", "✓ Token saved to".green(), path.display().to_string().yellow());
        }
        None => match config::load_token() {
            Some(_) => println!("{}", "A token is saved.".green()),
            None => println!("{}", "No token is saved.".dark_grey()),
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(uuid: &str, name: &str) -> FileRecord {
        FileRecord {
            uuid: uuid.into(),
            name: name.into(),
            mime: "text/plain".into(),
            size: 1,
            tags: Vec::new(),
            time: Local::now(),
            data: Map::new(),
        }
    }

    #[test]
    fn download_target_stays_in_the_working_directory() {
        assert_eq!(download_target(&record("u", "/tmp/elsewhere/pwned.txt")), PathBuf::from("pwned.txt"));
        assert_eq!(download_target(&record("u", "../../x")), PathBuf::from("x"));
        assert_eq!(download_target(&record("u", "notes.txt")), PathBuf::from("notes.txt"));
    }

    #[test]
    fn download_target_falls_back_to_the_uuid() {
        assert_eq!(download_target(&record("abc", "")), PathBuf::from("abc"));
        assert_eq!(download_target(&record("abc", "..")), PathBuf::from("abc"));
        assert_eq!(download_target(&record("abc", "/")), PathBuf::from("abc"));
    }

    #[test]
    fn declined_upload_is_an_error() {
        assert!(accepted_upload(&Mutation::Acknowledged(false)).is_err());
        assert_eq!(accepted_upload(&Mutation::Acknowledged(true)).unwrap(), None);
        let stored = Mutation::Record(record("abc", "cat"));
        assert_eq!(accepted_upload(&stored).unwrap(), Some("abc"));
    }

    #[test]
    fn blank_names_are_rejected_only_when_required() {
        assert!(entered_name("   ", true).is_err());
        assert_eq!(entered_name("   ", false).unwrap(), None);
        assert_eq!(entered_name("  cat  ", true).unwrap().as_deref(), Some("cat"));
    }
}
