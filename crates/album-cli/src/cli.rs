use std::path::PathBuf;

use album_sdk::{NaiveDate, SortKey, WritePolicy};
use clap::{ArgGroup, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "album",
    about = "Photo album: upload images, tag them and sort them into albums",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory of the blob store (defaults to .album)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Override the configured write policy
    #[arg(long, global = true)]
    pub policy: Option<PolicyArg>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum PolicyArg {
    LastWriterWins,
    RejectStale,
}

impl From<PolicyArg> for WritePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::LastWriterWins => WritePolicy::LastWriterWins,
            PolicyArg::RejectStale => WritePolicy::RejectStale,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Upload image files
    Upload(UploadArgs),
    /// List photos, filtered and sorted
    Ls(LsArgs),
    /// Change the tags of photos
    Tag(TagArgs),
    /// Move photos to an album
    Move(MoveArgs),
    /// Delete photos and their images
    Rm(RmArgs),
    /// List tags in use
    Tags(TagsArgs),
    /// List albums with photo counts
    Albums,
    /// Show or create the configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct UploadArgs {
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Album for the uploaded photos
    #[arg(long)]
    pub album: Option<String>,
    /// Tag to add to every uploaded photo (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Ingest day used when a filename carries no date (defaults to today)
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

#[derive(Args)]
pub struct LsArgs {
    #[arg(long)]
    pub album: Option<String>,
    #[arg(long)]
    pub year: Option<i32>,
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
    /// Exact capture date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// Required tag (repeatable; all must match)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Only photos without tags; overrides --tag
    #[arg(long)]
    pub untagged: bool,
    #[arg(long, default_value = "date-desc")]
    pub sort: SortKey,
}

#[derive(Args)]
#[command(group(ArgGroup::new("edit").required(true).args(["set", "add", "remove", "clear"])))]
pub struct TagArgs {
    #[arg(required = true)]
    pub ids: Vec<String>,
    /// Replace the tags
    #[arg(long, num_args = 1..)]
    pub set: Vec<String>,
    /// Add tags
    #[arg(long, num_args = 1..)]
    pub add: Vec<String>,
    /// Remove tags
    #[arg(long, num_args = 1..)]
    pub remove: Vec<String>,
    /// Remove every tag
    #[arg(long)]
    pub clear: bool,
}

#[derive(Args)]
pub struct MoveArgs {
    #[arg(required = true)]
    pub ids: Vec<String>,
    #[arg(long)]
    pub to: String,
}

#[derive(Args)]
pub struct RmArgs {
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Args)]
pub struct TagsArgs {
    /// Show how many photos carry each tag
    #[arg(long)]
    pub counts: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Write the effective configuration to album.toml if it does not exist
    #[arg(long)]
    pub init: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_upload() {
        let cli = Cli::try_parse_from(["album", "upload", "a.jpg", "b.jpg", "--tag", "x"]).unwrap();
        if let Command::Upload(args) = cli.command {
            assert_eq!(args.files, vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")]);
            assert_eq!(args.tags, vec!["x"]);
            assert!(args.album.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn upload_requires_files() {
        assert!(Cli::try_parse_from(["album", "upload"]).is_err());
    }

    #[test]
    fn parse_ls_filters() {
        let cli = Cli::try_parse_from([
            "album", "ls", "--year", "2024", "--month", "1", "--tag", "a", "--tag", "b", "--sort",
            "name",
        ])
        .unwrap();
        if let Command::Ls(args) = cli.command {
            assert_eq!(args.year, Some(2024));
            assert_eq!(args.month, Some(1));
            assert_eq!(args.tags, vec!["a", "b"]);
            assert_eq!(args.sort, SortKey::NameAsc);
            assert!(!args.untagged);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn ls_defaults_to_newest_first() {
        let cli = Cli::try_parse_from(["album", "ls"]).unwrap();
        if let Command::Ls(args) = cli.command {
            assert_eq!(args.sort, SortKey::DateDesc);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn ls_rejects_bad_month_and_date() {
        assert!(Cli::try_parse_from(["album", "ls", "--month", "13"]).is_err());
        assert!(Cli::try_parse_from(["album", "ls", "--date", "2024-02-30"]).is_err());
        assert!(Cli::try_parse_from(["album", "ls", "--sort", "size"]).is_err());
    }

    #[test]
    fn parse_tag_set() {
        let cli = Cli::try_parse_from(["album", "tag", "p1", "p2", "--set", "a", "b"]).unwrap();
        if let Command::Tag(args) = cli.command {
            assert_eq!(args.ids, vec!["p1", "p2"]);
            assert_eq!(args.set, vec!["a", "b"]);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn tag_requires_an_edit() {
        assert!(Cli::try_parse_from(["album", "tag", "p1"]).is_err());
        assert!(Cli::try_parse_from(["album", "tag", "p1", "--set", "a", "--clear"]).is_err());
    }

    #[test]
    fn parse_move() {
        let cli = Cli::try_parse_from(["album", "move", "p1", "--to", "trips"]).unwrap();
        if let Command::Move(args) = cli.command {
            assert_eq!(args.to, "trips");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_globals() {
        let cli = Cli::try_parse_from([
            "album", "--root", "/tmp/a", "--format", "json", "-v", "--policy", "reject-stale",
            "albums",
        ])
        .unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/a")));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
        assert_eq!(cli.policy.map(WritePolicy::from), Some(WritePolicy::RejectStale));
        assert!(matches!(cli.command, Command::Albums));
    }
}
