//! forg command-line entry point.
//!
//! `forg [URL]` fetches a Gopher URL (the configured home page by default)
//! and prints it. `--stats` reports on the disk cache as JSON, `--purge`
//! empties it and `--info URL` prints the Gopher+ information blocks.
//! `--bookmarks` lists the saved bookmarks and `--bookmark URL [TITLE]`
//! adds one. Set `RUST_LOG` to change the log level.

use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};

use forg_core::{
    Body, Bookmark, BookmarkFolder, BookmarkItem, ForgContext, HistoryEntry, Resource, Session,
};
use forg_types::{ForgConfig, ForgError};

enum Command {
    Fetch(Option<String>),
    Info(String),
    Stats,
    Purge,
    Bookmarks,
    AddBookmark { url: String, title: Option<String> },
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Command> {
    let command = match args.next().as_deref() {
        None => Command::Fetch(None),
        Some("--stats") => Command::Stats,
        Some("--purge") => Command::Purge,
        Some("--bookmarks") => Command::Bookmarks,
        Some("--bookmark") => {
            let url = args.next().context("--bookmark needs a URL")?;
            Command::AddBookmark {
                url,
                title: args.next(),
            }
        },
        Some("--info") => {
            let url = args.next().context("--info needs a URL")?;
            Command::Info(url)
        },
        Some(flag) if flag.starts_with("--") => bail!("unknown option {flag}"),
        Some(url) => Command::Fetch(Some(url.to_string())),
    };
    if let Some(extra) = args.next() {
        bail!("unexpected argument {extra}");
    }
    Ok(command)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ForgError>() {
                Some(forg) => eprintln!("forg: {}", forg.user_message()),
                None => eprintln!("forg: {e:#}"),
            }
            ExitCode::FAILURE
        },
    }
}

fn run() -> Result<()> {
    let command = parse_args(std::env::args().skip(1))?;

    let config_path = ForgConfig::default().default_path();
    let config = ForgConfig::load(&config_path)?;
    log::debug!("Cache at {}", config.cache_directory.display());

    let mut session = Session::new(ForgContext::new(config));
    match command {
        Command::Fetch(url) => {
            let entry = match url {
                Some(url) => session.go_to(Resource::parse_url(&url)?)?,
                None => session.go_home()?,
            };
            print_entry(entry)?;
        },
        Command::Info(url) => {
            let resource = Resource::parse_url(&url)?;
            let info = session.connection().get_info(&resource)?;
            print!("{}", info.to_text());
        },
        Command::Stats => {
            let stats = session.cache().stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        },
        Command::Purge => {
            session.cache().purge()?;
        },
        Command::Bookmarks => {
            let folder = BookmarkFolder::load(&session.context().config.bookmarks_path())?;
            let mut out = std::io::stdout().lock();
            print_folder(&mut out, &folder, 0)?;
        },
        Command::AddBookmark { url, title } => {
            let path = session.context().config.bookmarks_path();
            let resource = Resource::parse_url(&url)?;
            let title = title.unwrap_or_else(|| resource.display_name());
            let mut folder = BookmarkFolder::load(&path)?;
            folder.items_mut().go_to_back();
            folder.add_bookmark(Bookmark::from_url(&url, &title)?);
            folder.save(&path)?;
        },
    }

    session.close()?;
    Ok(())
}

fn print_folder(out: &mut impl Write, folder: &BookmarkFolder, depth: usize) -> Result<()> {
    writeln!(out, "{:indent$}{}/", "", folder.name(), indent = depth * 2)?;
    for item in folder.items() {
        match item {
            BookmarkItem::Bookmark(b) => {
                writeln!(out, "{:indent$}{}  <{}>", "", b.label(), b.url(), indent = depth * 2 + 2)?;
            },
            BookmarkItem::Folder(f) => print_folder(out, f, depth + 1)?,
        }
    }
    Ok(())
}

fn print_entry(entry: &HistoryEntry) -> Result<()> {
    let mut out = std::io::stdout().lock();
    match entry.response.body() {
        Body::Directory(entries) => {
            for item in entries {
                if item.item_type.is_info() {
                    writeln!(out, "{:>12}  {}", "", item.name)?;
                } else {
                    writeln!(
                        out,
                        "{:>12}  {}  <{}>",
                        item.item_type.description(),
                        item.display_name(),
                        item.to_url()
                    )?;
                }
            }
        },
        Body::Data(data) => out.write_all(data)?,
        Body::Form(form) => {
            writeln!(out, "{} asks:", entry.resource.display_name())?;
            for question in form.questions() {
                writeln!(out, "  [{}] {}", question.kind, question.prompt)?;
                for option in &question.options {
                    writeln!(out, "      - {option}")?;
                }
            }
        },
        Body::Empty => {
            if let Some(message) = entry.response.error() {
                bail!("{message}");
            }
        },
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn no_arguments_fetches_home() {
        assert!(matches!(parse_args(args(&[])), Ok(Command::Fetch(None))));
    }

    #[test]
    fn url_argument() {
        match parse_args(args(&["gopher://example.org/1/"])) {
            Ok(Command::Fetch(Some(url))) => assert_eq!(url, "gopher://example.org/1/"),
            _ => panic!("expected a fetch"),
        }
    }

    #[test]
    fn flags() {
        assert!(matches!(parse_args(args(&["--stats"])), Ok(Command::Stats)));
        assert!(matches!(parse_args(args(&["--purge"])), Ok(Command::Purge)));
        assert!(matches!(
            parse_args(args(&["--info", "gopher://h/0/x"])),
            Ok(Command::Info(_))
        ));
        assert!(matches!(parse_args(args(&["--bookmarks"])), Ok(Command::Bookmarks)));
    }

    #[test]
    fn bookmark_takes_optional_title() {
        match parse_args(args(&["--bookmark", "gopher://h/1/", "Home"])) {
            Ok(Command::AddBookmark { url, title }) => {
                assert_eq!(url, "gopher://h/1/");
                assert_eq!(title.as_deref(), Some("Home"));
            },
            _ => panic!("expected a bookmark"),
        }
        assert!(matches!(
            parse_args(args(&["--bookmark", "gopher://h/1/"])),
            Ok(Command::AddBookmark { title: None, .. })
        ));
        assert!(parse_args(args(&["--bookmark"])).is_err());
    }

    #[test]
    fn folder_listing_is_indented() {
        let mut inner = BookmarkFolder::new("Search");
        inner.add_bookmark(Bookmark::from_url("gopher://h/7/find", "Find").unwrap());
        let mut top = BookmarkFolder::new("");
        top.add_bookmark(Bookmark::from_url("gopher://h/1/", "Home").unwrap());
        top.add_folder(inner);

        let mut out = Vec::new();
        print_folder(&mut out, &top, 0).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Bookmarks/\n  h: Home  <gopher://h:70/1/>\n  Search/\n    h: Find  <gopher://h:70/7/find>\n"
        );
    }

    #[test]
    fn bad_arguments() {
        assert!(parse_args(args(&["--info"])).is_err());
        assert!(parse_args(args(&["--bogus"])).is_err());
        assert!(parse_args(args(&["a", "b"])).is_err());
    }
}
