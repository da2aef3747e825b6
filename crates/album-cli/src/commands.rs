use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use album_gallery::BatchReport;
use album_sdk::{
    Album, AlbumConfig, PhotoAlbum, PhotoId, PhotoRecord, Query, TagEdit, TagSet,
    CONFIG_FILE_NAME,
};
use album_store::FsBlobStore;
use anyhow::Context as _;
use colored::Colorize;
use serde_json::json;
use tracing::debug;

use crate::cli::*;

/// Resolved store root, configuration and output format for one run.
struct Context {
    root: PathBuf,
    config: AlbumConfig,
    format: OutputFormat,
}

impl Context {
    fn resolve(cli: &Cli) -> anyhow::Result<Self> {
        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| AlbumConfig::default().store_root);
        let config_path = root.join(CONFIG_FILE_NAME);
        let mut config = AlbumConfig::load_or_default(&config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        config.store_root = root.clone();
        if let Some(policy) = cli.policy {
            config.write_policy = policy.into();
        }
        debug!(root = %root.display(), policy = %config.write_policy, "configuration resolved");
        Ok(Self {
            root,
            config,
            format: cli.format,
        })
    }

    fn open(&self) -> anyhow::Result<PhotoAlbum> {
        let store = FsBlobStore::open(self.root.clone())
            .with_context(|| format!("opening store at {}", self.root.display()))?;
        Ok(PhotoAlbum::open(Arc::new(store), self.config.clone())?)
    }

    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::resolve(&cli)?;
    match cli.command {
        Command::Upload(args) => cmd_upload(&ctx, args),
        Command::Ls(args) => cmd_ls(&ctx, args),
        Command::Tag(args) => cmd_tag(&ctx, args),
        Command::Move(args) => cmd_move(&ctx, args),
        Command::Rm(args) => cmd_rm(&ctx, args),
        Command::Tags(args) => cmd_tags(&ctx, args),
        Command::Albums => cmd_albums(&ctx),
        Command::Config(args) => cmd_config(&ctx, args),
    }
}

fn cmd_upload(ctx: &Context, args: UploadArgs) -> anyhow::Result<()> {
    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        files.push((name, data));
    }
    let today = args
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let tags = TagSet::parse(&args.tags)?;
    let target = args.album.as_deref().map(Album::parse).transpose()?;

    let mut album = ctx.open()?;
    let report = album.ingest_many(
        files.iter().map(|(name, data)| (name.as_str(), data.as_slice())),
        today,
    );

    let added: Vec<PhotoId> = report.added.iter().map(|r| r.id.clone()).collect();
    let mut follow_up = Vec::new();
    if !added.is_empty() && (!tags.is_empty() || target.is_some()) {
        album.clear_selection();
        for id in &added {
            album.select(id)?;
        }
        if !tags.is_empty() {
            follow_up.push(album.tag_selected(&TagEdit::Add(tags)));
        }
        if let Some(target) = &target {
            follow_up.push(album.move_selected(target));
        }
    }

    if ctx.json() {
        let out = json!({
            "added": added.iter().filter_map(|id| album.get(id)).collect::<Vec<_>>(),
            "duplicates": report.duplicates,
            "failed": report.failed,
            "saved": report.save.as_ref().map(|s| s.is_ok()),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for record in &report.added {
            println!(
                "{} {} {} ({})",
                "✓".green().bold(),
                record.filename,
                record.id.to_string().cyan(),
                record.captured_date
            );
        }
        for dup in &report.duplicates {
            println!("{} {} already in the album", "=".yellow(), dup.filename);
        }
        for failure in &report.failed {
            println!("{} {}: {}", "✗".red().bold(), failure.filename, failure.reason);
        }
    }

    if let Some(Err(e)) = report.save {
        return Err(e).context("photos uploaded but the ledger was not saved");
    }
    if !report.failed.is_empty() {
        anyhow::bail!("{} of {} uploads failed", report.failed.len(), args.files.len());
    }
    for batch in follow_up {
        batch.ensure_complete()?;
    }
    Ok(())
}

fn cmd_ls(ctx: &Context, args: LsArgs) -> anyhow::Result<()> {
    let mut query = Query::new()
        .tags(TagSet::parse(&args.tags)?)
        .untagged_only(args.untagged)
        .sort(args.sort);
    if let Some(name) = &args.album {
        query = query.album(Album::new(name.as_str()));
    }
    if let Some(year) = args.year {
        query = query.year(year);
    }
    if let Some(month) = args.month {
        query = query.month(month);
    }
    if let Some(date) = args.date {
        query = query.on_date(date);
    }

    let album = ctx.open()?;
    let records = album.query(&query);
    if ctx.json() {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No photos.");
        return Ok(());
    }
    for record in &records {
        print_record(record);
    }
    println!("{}", format!("{} of {} photo(s)", records.len(), album.len()).dimmed());
    Ok(())
}

fn print_record(record: &PhotoRecord) {
    let tags = if record.tags.is_empty() {
        "-".dimmed().to_string()
    } else {
        record.tags.to_string().yellow().to_string()
    };
    println!(
        "{}  {}  {:<16} {:<24} {}",
        record.id.to_string().cyan(),
        record.captured_date,
        record.album.as_str().green(),
        tags,
        record.filename
    );
}

/// Open the album and select the given ids. Unknown ids are reported and
/// left out of the selection.
fn open_with_selection(ctx: &Context, ids: &[String]) -> anyhow::Result<PhotoAlbum> {
    let mut album = ctx.open()?;
    for raw in ids {
        let id = PhotoId::new(raw.as_str())?;
        if album.select(&id).is_err() {
            eprintln!("{} no photo with id {}", "warning:".yellow().bold(), raw);
        }
    }
    Ok(album)
}

fn cmd_tag(ctx: &Context, args: TagArgs) -> anyhow::Result<()> {
    let edit = if args.clear {
        TagEdit::Replace(TagSet::new())
    } else if !args.set.is_empty() {
        TagEdit::Replace(TagSet::parse(&args.set)?)
    } else if !args.add.is_empty() {
        TagEdit::Add(TagSet::parse(&args.add)?)
    } else {
        TagEdit::Remove(TagSet::parse(&args.remove)?)
    };
    let mut album = open_with_selection(ctx, &args.ids)?;
    let report = album.tag_selected(&edit);
    print_batch(ctx, report)
}

fn cmd_move(ctx: &Context, args: MoveArgs) -> anyhow::Result<()> {
    let target = Album::parse(&args.to)?;
    let mut album = open_with_selection(ctx, &args.ids)?;
    let report = album.move_selected(&target);
    print_batch(ctx, report)
}

fn cmd_rm(ctx: &Context, args: RmArgs) -> anyhow::Result<()> {
    let mut album = open_with_selection(ctx, &args.ids)?;
    let report = album.delete_selected();
    print_batch(ctx, report)
}

/// Print a batch outcome, then fail if any item or the save failed.
fn print_batch(ctx: &Context, report: BatchReport) -> anyhow::Result<()> {
    if ctx.json() {
        let out = json!({
            "kind": report.kind,
            "succeeded": report.succeeded,
            "missing": report.missing,
            "failed": report.failed,
            "revision": report.save.as_ref().ok().map(|r| r.revision.as_str()),
            "save_error": report.save.as_ref().err().map(ToString::to_string),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for id in &report.succeeded {
            println!("  {} {}", "✓".green(), id);
        }
        for id in &report.missing {
            println!("  {} {} (not found)", "-".dimmed(), id);
        }
        for failure in &report.failed {
            println!("  {} {}: {}", "✗".red().bold(), failure.id, failure.reason);
        }
        match &report.save {
            Ok(receipt) => println!(
                "{} {}: {} photo(s) saved at {}",
                "✓".green().bold(),
                report.kind,
                receipt.records,
                receipt.revision.short().yellow()
            ),
            Err(e) => println!("{} ledger not saved: {}", "✗".red().bold(), e),
        }
    }
    report.ensure_complete()?;
    Ok(())
}

fn cmd_tags(ctx: &Context, args: TagsArgs) -> anyhow::Result<()> {
    let album = ctx.open()?;
    let counts = album_query::tag_counts(album.gallery().records());
    if ctx.json() {
        if args.counts {
            println!("{}", serde_json::to_string_pretty(&counts)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&album.known_tags())?);
        }
        return Ok(());
    }
    if counts.is_empty() {
        println!("No tags.");
    }
    for (tag, count) in &counts {
        if args.counts {
            println!("{:>5}  {}", count, tag.yellow());
        } else {
            println!("{}", tag.yellow());
        }
    }
    Ok(())
}

fn cmd_albums(ctx: &Context) -> anyhow::Result<()> {
    let album = ctx.open()?;
    let albums = album.albums();
    if ctx.json() {
        let out: Vec<_> = albums
            .iter()
            .map(|(name, count)| json!({ "album": name, "photos": count }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    if albums.is_empty() {
        println!("No albums.");
    }
    for (name, count) in &albums {
        println!("{:>5}  {}", count, name.as_str().green());
    }
    Ok(())
}

fn cmd_config(ctx: &Context, args: ConfigArgs) -> anyhow::Result<()> {
    let text = ctx.config.to_toml_string()?;
    if args.init {
        let path = ctx.root.join(CONFIG_FILE_NAME);
        if path.exists() {
            anyhow::bail!("{} already exists", path.display());
        }
        fs::create_dir_all(&ctx.root)?;
        fs::write(&path, &text).with_context(|| format!("writing {}", path.display()))?;
        println!("{} Wrote {}", "✓".green().bold(), path.display());
        return Ok(());
    }
    if ctx.json() {
        println!("{}", serde_json::to_string_pretty(&ctx.config)?);
    } else {
        print!("{text}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn run(root: &std::path::Path, args: &[&str]) -> anyhow::Result<()> {
        let mut argv = vec!["album", "--root"];
        let root = root.to_str().unwrap();
        argv.push(root);
        argv.extend_from_slice(args);
        run_command(Cli::try_parse_from(argv).unwrap())
    }

    fn open(root: &std::path::Path) -> PhotoAlbum {
        let store = FsBlobStore::open(root).unwrap();
        PhotoAlbum::open(Arc::new(store), AlbumConfig::default()).unwrap()
    }

    #[test]
    fn upload_tag_move_and_remove() {
        let root = tempfile::tempdir().unwrap();
        let input = tempfile::tempdir().unwrap();
        let photo = input.path().join("20240115_beach.jpg");
        fs::write(&photo, b"beach bytes").unwrap();
        let photo = photo.to_str().unwrap();

        run(root.path(), &["upload", photo, "--tag", "sea", "--album", "trips"]).unwrap();
        let album = open(root.path());
        assert_eq!(album.len(), 1);
        let record = album.snapshot()[0].clone();
        assert_eq!(record.captured_date.to_string(), "2024-01-15");
        assert_eq!(record.album.as_str(), "trips");
        assert!(record.tags.contains("sea"));

        let id = record.id.to_string();
        run(root.path(), &["tag", &id, "--add", "sunset"]).unwrap();
        run(root.path(), &["move", &id, "--to", "未分類"]).unwrap();
        let record = open(root.path()).snapshot()[0].clone();
        assert_eq!(record.tags.to_vec(), vec!["sea", "sunset"]);
        assert!(record.album.is_unclassified());

        run(root.path(), &["ls", "--tag", "sea", "--tag", "sunset"]).unwrap();
        run(root.path(), &["--format", "json", "tags", "--counts"]).unwrap();

        run(root.path(), &["rm", &id]).unwrap();
        assert!(open(root.path()).is_empty());
    }

    #[test]
    fn config_init_writes_file_once() {
        let root = tempfile::tempdir().unwrap();
        run(root.path(), &["--policy", "reject-stale", "config", "--init"]).unwrap();
        let text = fs::read_to_string(root.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(text.contains("reject-stale"));
        assert!(run(root.path(), &["config", "--init"]).is_err());
    }

    #[test]
    fn unknown_id_is_warned_not_fatal() {
        let root = tempfile::tempdir().unwrap();
        run(root.path(), &["rm", "photos/nothing"]).unwrap();
    }
}
