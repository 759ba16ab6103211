use std::io::{self, BufRead, Write as _};

use colored::Colorize;
use tracing::{debug, warn};

use crate::fs::{
    DirEntry, EntryKind, FsError, MakeDirOptions, SearchOptions, SharedFs, TransferOptions,
};
use crate::shell::command::{self, Command};
use crate::snapshot::{SnapshotStore, codec};

/// The interactive front end: reads one command per line from stdin,
/// dispatches it through the shared engine handle and renders the result.
/// Successful mutating commands are persisted right away; the application
/// performs the authoritative save once the session ends.
pub struct Session {
    fs: SharedFs,
    store: SnapshotStore,
}

impl Session {
    pub fn new(fs: SharedFs, store: SnapshotStore) -> Self {
        Session { fs, store }
    }

    pub async fn run(&self) {
        if supports_color::on(supports_color::Stream::Stdout).is_none() {
            colored::control::set_override(false);
        }

        let stdin = io::stdin();
        loop {
            print!("{}> ", self.fs.current_directory().cyan());
            let _ = io::stdout().flush();

            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("Failed to read from stdin: {e}");
                    break;
                }
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let command = match command::parse(line) {
                Ok(command) => command,
                Err(e) => {
                    println!("{}", e.to_string().red());
                    continue;
                }
            };
            if command == Command::Exit {
                break;
            }

            let persist = command.mutates();
            match self.execute(command) {
                Ok(()) if persist => self.persist().await,
                Ok(()) => {}
                Err(e) => println!("{}", e.to_string().red()),
            }
        }
    }

    fn execute(&self, command: Command) -> Result<(), FsError> {
        match command {
            Command::MakeDir { path, create_parents } => {
                self.fs.make_directory(&path, MakeDirOptions { create_parents })
            }
            Command::ChangeDir { path } => {
                self.fs.change_directory(&path)?;
                println!(
                    "Current directory changed to '{}'",
                    self.fs.current_directory()
                );
                Ok(())
            }
            Command::List { path } => {
                let entries = self.fs.list_directory(path.as_deref().unwrap_or("."))?;
                if entries.is_empty() {
                    println!("Directory is empty.");
                } else {
                    for entry in entries {
                        println!("{}", render_entry(&entry));
                    }
                }
                Ok(())
            }
            Command::PrintWorkingDir => {
                println!("{}", self.fs.current_directory());
                Ok(())
            }
            Command::Touch { path } => self.fs.create_file(&path),
            Command::Echo { path, text } => {
                // Typed input has no real newlines; honor the escaped form.
                self.fs.write_file(&path, text.replace("\\n", "\n"))
            }
            Command::Cat { path } => {
                println!("{}", self.fs.read_file(&path)?);
                Ok(())
            }
            Command::Grep { path, pattern } => {
                let content = self.fs.read_file(&path)?;
                let mut found = false;
                for line in content.lines().filter(|line| line.contains(&pattern)) {
                    println!("{line}");
                    found = true;
                }
                if !found {
                    println!("No matching lines found.");
                }
                Ok(())
            }
            Command::Find {
                path,
                pattern,
                content,
                ignore_case,
            } => {
                let options = SearchOptions {
                    match_names: true,
                    match_content: content,
                    case_sensitive: !ignore_case,
                };
                let matches = self.fs.search(&path, &pattern, options)?;
                if matches.is_empty() {
                    println!("No matches found.");
                } else {
                    for hit in matches {
                        println!("{hit}");
                    }
                }
                Ok(())
            }
            Command::Move {
                source,
                destination,
                overwrite,
            } => self
                .fs
                .rename(&source, &destination, TransferOptions { overwrite }),
            Command::Copy {
                source,
                destination,
                overwrite,
            } => self
                .fs
                .copy(&source, &destination, TransferOptions { overwrite }),
            Command::Remove { path } => self.fs.remove(&path),
            Command::Help => {
                println!("{}", HELP.trim_end());
                Ok(())
            }
            // Exit never reaches execute; the loop handles it.
            Command::Exit => Ok(()),
        }
    }

    /// Best-effort save after a mutating command. A failing save keeps the
    /// session alive; the shutdown save reports errors properly.
    async fn persist(&self) {
        let blob = match self.fs.with_engine(codec::encode) {
            Ok(blob) => blob,
            Err(e) => {
                warn!("Failed to encode snapshot: {e}");
                return;
            }
        };
        match self.store.save(blob).await {
            Ok(()) => debug!("State saved to {}", self.store.path().display()),
            Err(e) => warn!("Failed to persist snapshot: {e}"),
        }
    }
}

fn render_entry(entry: &DirEntry) -> String {
    let size = entry.size.map_or_else(|| "-".to_string(), |s| s.to_string());
    let name = match entry.kind {
        EntryKind::Directory => format!("{}/", entry.name).blue().bold(),
        EntryKind::File => entry.name.normal(),
    };
    format!("{:>4} {:>8}  {}", entry.kind.to_string(), size, name)
}

const HELP: &str = "\
Commands:
  mkdir [-p] <path>         create a directory (-p creates parents)
  cd <path>                 change the current directory
  ls [path]                 list a directory (default: current)
  pwd                       print the current directory
  touch <path>              create an empty file
  echo <file> <text...>     write text to a file (creates it if needed)
  cat <file>                print a file's content
  grep <file> <pattern>     print the file's lines containing the pattern
  find <path> <pattern>     search names below path (-c: also content,
         [-c] [-i]          -i: ignore case)
  mv [-f] <src> <dest>      move/rename (-f overwrites an existing file)
  cp [-f] <src> <dest>      copy (-f overwrites an existing file)
  rm <path>                 remove a file or directory tree
  help                      show this help
  exit                      save and leave
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::TreeEngine;

    fn entry(kind: EntryKind, size: Option<u64>) -> DirEntry {
        DirEntry {
            name: "x".into(),
            kind,
            size,
            created_at: 0,
            modified_at: 0,
        }
    }

    #[test]
    fn rendered_entries_show_kind_and_size() {
        colored::control::set_override(false);
        let file = render_entry(&entry(EntryKind::File, Some(12)));
        assert_eq!(file, format!("{:>4} {:>8}  {}", "file", "12", "x"));
        let dir = render_entry(&entry(EntryKind::Directory, None));
        assert_eq!(dir, format!("{:>4} {:>8}  {}", "dir", "-", "x/"));
    }

    #[compio::test]
    async fn persist_writes_a_loadable_snapshot() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let store = SnapshotStore::new(dir.path().join("state.bin"));
        let session = Session::new(SharedFs::new(TreeEngine::new()), store.clone());

        session.fs.write_file("/kept.txt", "still here").unwrap();
        session.persist().await;

        let restored = store.load().await.unwrap().expect("snapshot should exist");
        assert_eq!(restored.read_file("/kept.txt").unwrap(), "still here");
    }
}
