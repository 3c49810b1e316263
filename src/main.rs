// SPDX-License-Identifier: MIT
//
// n-modal: feed Vim-style key symbols to the n-vi interpreter.
//
//   FILE → Buffer → BufferDocument
//   --keys / stdin → symbol → Interpreter::handle_key → FileHost
//
// The interpreter never touches the filesystem. It files save, load and
// close requests with the host; after every key the driver carries them
// out against the document, in the order they were made. Errors and
// messages go to stderr, the final text to stdout with --print.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;

use n_vi::buffer::Buffer;
use n_vi::{BufferDocument, Config, ExError, Host, Interpreter};

#[derive(Parser, Debug)]
#[command(name = "n-modal", version, about = "Run Vim-style keystrokes against a file")]
struct Cli {
    /// File to edit; created on `:w` if it does not exist
    file: Option<PathBuf>,

    /// Whitespace-separated key symbols, e.g. "d d : w Enter".
    /// Without this, one symbol is read per line of stdin.
    #[arg(short, long)]
    keys: Option<String>,

    /// TOML config file (options, jumplist_limit, macro_depth_limit)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the final document to stdout
    #[arg(short, long)]
    print: bool,
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// Something the interpreter asked the host to do.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Request {
    Save,
    Load(PathBuf),
    Close,
}

/// Queues requests and collects text meant for the user.
#[derive(Debug, Default)]
struct FileHost {
    requests: Vec<Request>,
    output: Vec<String>,
}

impl Host for FileHost {
    fn request_save(&mut self) {
        self.requests.push(Request::Save);
    }

    fn request_load(&mut self, path: &Path) {
        self.requests.push(Request::Load(path.to_path_buf()));
    }

    fn request_close(&mut self, _force: bool) {
        self.requests.push(Request::Close);
    }

    fn option_changed(&mut self, name: &str, value: bool) {
        log::debug!("option {name} = {value}");
    }

    fn show_error(&mut self, error: &ExError) {
        self.output.push(error.to_string());
    }

    fn show_message(&mut self, message: &str) {
        self.output.push(message.to_string());
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

struct Driver {
    vi: Interpreter,
    doc: BufferDocument,
    host: FileHost,
    closed: bool,
}

impl Driver {
    fn new(config: Config, buffer: Buffer) -> Self {
        Self {
            vi: Interpreter::with_config(config),
            doc: BufferDocument::new(buffer),
            host: FileHost::default(),
            closed: false,
        }
    }

    /// Feed one symbol and carry out whatever it requested. Returns
    /// false once the document has been closed.
    fn feed(&mut self, symbol: &str) -> bool {
        if self.closed {
            return false;
        }
        if !self.vi.handle_key(&mut self.doc, &mut self.host, symbol) {
            log::debug!("key {symbol:?} had no effect");
        }
        for request in std::mem::take(&mut self.host.requests) {
            match request {
                Request::Save => {
                    // `:wq` must not close after a failed write.
                    if !self.save() {
                        break;
                    }
                }
                Request::Load(path) => self.load(&path),
                Request::Close => {
                    self.closed = true;
                    break;
                }
            }
        }
        !self.closed
    }

    fn save(&mut self) -> bool {
        let buffer = &mut self.doc.buffer;
        let Some(path) = buffer.path().map(Path::to_path_buf) else {
            self.host.output.push(ExError::MissingFileName.to_string());
            return false;
        };
        match buffer.save() {
            Ok(()) => {
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("???");
                let bytes = buffer.contents().len();
                self.host.output.push(format!("\"{name}\" written, {bytes}B"));
                true
            }
            Err(e) => {
                log::warn!("save {} failed: {e}", path.display());
                self.host.output.push(format!("E212: Can't save file: {e}"));
                false
            }
        }
    }

    fn load(&mut self, path: &Path) {
        match open_buffer(path) {
            Ok(buffer) => {
                log::info!("loaded {}", path.display());
                self.doc = BufferDocument::new(buffer);
            }
            Err(e) => self.host.output.push(format!("E484: Can't open file {}: {e}", path.display())),
        }
    }

    /// Drain pending user-facing text.
    fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.host.output)
    }
}

/// Read `path`, or start an empty buffer bound to it when it does not exist.
fn open_buffer(path: &Path) -> io::Result<Buffer> {
    match Buffer::from_file(path) {
        Ok(buffer) => Ok(buffer),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let mut buffer = Buffer::new();
            buffer.set_path(path.to_path_buf());
            Ok(buffer)
        }
        Err(e) => Err(e),
    }
}

fn flush_output(driver: &mut Driver) {
    for line in driver.take_output() {
        eprintln!("{line}");
    }
}

fn init_logging() {
    let mut logger = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        logger.filter_level(LevelFilter::Warn);
    }
    logger.init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    let buffer = match &cli.file {
        Some(path) => open_buffer(path).with_context(|| format!("failed to open {}", path.display()))?,
        None => Buffer::new(),
    };

    let mut driver = Driver::new(config, buffer);

    if let Some(keys) = &cli.keys {
        for symbol in keys.split_whitespace() {
            let open = driver.feed(symbol);
            flush_output(&mut driver);
            if !open {
                break;
            }
        }
    } else {
        for line in io::stdin().lock().lines() {
            let line = line.context("failed to read keys from stdin")?;
            let symbol = line.trim();
            if symbol.is_empty() {
                continue;
            }
            let open = driver.feed(symbol);
            flush_output(&mut driver);
            if !open {
                break;
            }
        }
    }

    if cli.print {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", driver.doc.text()).context("failed to write document")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn feed_all(driver: &mut Driver, symbols: &str) {
        for symbol in symbols.split_whitespace() {
            if !driver.feed(symbol) {
                break;
            }
        }
    }

    fn driver_for(path: &Path) -> Driver {
        Driver::new(Config::default(), open_buffer(path).unwrap())
    }

    // -- Save -----------------------------------------------------------------

    #[test]
    fn write_saves_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "one\ntwo\nthree").unwrap();

        let mut driver = driver_for(&path);
        feed_all(&mut driver, "j d d : w Enter");

        assert_eq!(fs::read_to_string(&path).unwrap(), "one\nthree");
        assert_eq!(driver.take_output(), vec!["\"a.txt\" written, 9B".to_string()]);
        assert!(!driver.closed);
    }

    #[test]
    fn write_without_name_reports_error() {
        let mut driver = Driver::new(Config::default(), Buffer::new());
        feed_all(&mut driver, "i x Escape : w Enter");
        assert_eq!(driver.take_output(), vec!["E32: No file name".to_string()]);
    }

    #[test]
    fn missing_file_starts_empty_and_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.txt");

        let mut driver = driver_for(&path);
        assert_eq!(driver.doc.text(), "");
        feed_all(&mut driver, "i h i Escape : w q Enter");

        assert_eq!(fs::read_to_string(&path).unwrap(), "hi");
        assert!(driver.closed);
    }

    // -- Close ----------------------------------------------------------------

    #[test]
    fn quit_stops_feeding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.txt");
        fs::write(&path, "abc").unwrap();

        let mut driver = driver_for(&path);
        feed_all(&mut driver, ": q Enter x");
        assert!(driver.closed);
        assert_eq!(driver.doc.text(), "abc");
        assert!(!driver.feed("x"));
    }

    #[test]
    fn quit_with_changes_is_refused() {
        let mut driver = Driver::new(Config::default(), Buffer::from_text("abc"));
        feed_all(&mut driver, "x : q Enter");
        assert!(!driver.closed);
        assert_eq!(
            driver.take_output(),
            vec!["E37: No write since last change (add ! to override)".to_string()]
        );
    }

    #[test]
    fn failed_write_keeps_document_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("f.txt");

        let mut driver = driver_for(&path);
        feed_all(&mut driver, "i z Escape : w q Enter");
        assert!(!driver.closed);
        let out = driver.take_output();
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("E212: Can't save file:"));
    }

    // -- Load -----------------------------------------------------------------

    #[test]
    fn edit_replaces_document() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");
        fs::write(&first, "first").unwrap();
        fs::write(&second, "second\nfile").unwrap();

        let mut driver = driver_for(&first);
        let cmd: Vec<String> = second.display().to_string().chars().map(String::from).collect();
        feed_all(&mut driver, ": e Space");
        feed_all(&mut driver, &cmd.join(" "));
        feed_all(&mut driver, "Enter");

        assert_eq!(driver.doc.text(), "second\nfile");
        assert_eq!(driver.doc.buffer.path(), Some(second.as_path()));
    }

    #[test]
    fn open_buffer_binds_path_for_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.txt");
        let buffer = open_buffer(&path).unwrap();
        assert_eq!(buffer.path(), Some(path.as_path()));
        assert!(!buffer.is_modified());
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::parse_from(["n-modal", "f.txt", "--keys", "d d", "--print"]);
        assert_eq!(cli.file, Some(PathBuf::from("f.txt")));
        assert_eq!(cli.keys.as_deref(), Some("d d"));
        assert!(cli.print);
        assert!(cli.config.is_none());
    }
}
