//! Render a static HTML page from a Journey journaling-app ZIP backup.
//!
//! A backup holds one JSON record per journal entry plus the JPEG attachments
//! the records reference. The archive is expanded into a directory named after
//! the backup, and the generated `index.html` lands next to the photos so they
//! can be linked by bare filename.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use askama::Template;
use chrono::{DateTime, Utc};
use inkjet::{formatter, Highlighter, Language};
use pulldown_cmark::{CodeBlockKind, Event, Options, Tag};
use serde::Deserialize;
use tracing::{debug, info};

/// Stylesheet the generated page links when `--css` is not given.
pub const DEFAULT_CSS: &str = "https://unpkg.com/sakura.css/css/sakura-dark.css";

// The subset of a Journey entry record the page needs. Everything else in the
// backup JSON is ignored. Only the timestamp is mandatory; the app writes the
// other fields but older backups may omit them.
#[derive(Deserialize)]
struct Record {
    text: Option<String>,
    photos: Option<Vec<String>>,
    address: Option<String>,
    date_journal: i64,
}

#[derive(Debug)]
pub struct Entry {
    date: DateTime<Utc>,
    address: String,
    photos: Vec<String>,
    body: String,
}

impl Entry {
    fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read entry {}", path.display()))?;
        let record: Record = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse entry {}", path.display()))?;
        // date_journal is POSIX milliseconds: 1509022007088 => 2017-10-26T12:46:47Z
        let date = DateTime::from_timestamp_millis(record.date_journal).ok_or_else(|| {
            anyhow!(
                "entry {} has an out-of-range date_journal",
                path.display()
            )
        })?;
        Ok(Self {
            date,
            address: record.address.unwrap_or_default(),
            photos: record.photos.unwrap_or_default(),
            body: markdown_to_html(record.text.as_deref().unwrap_or_default()),
        })
    }

    fn from_dir(dir: &Path) -> Result<Vec<Self>> {
        let mut entries = Vec::new();
        for file in fs::read_dir(dir)? {
            let path = file?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            debug!("loading entry {}", path.display());
            entries.push(Self::from_file(&path)?);
        }
        // Journey names entry files by timestamp; sorting keeps that reading
        // order no matter how the archive happened to extract.
        entries.sort_by_key(|entry| entry.date);
        Ok(entries)
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct Index<'a> {
    title: &'a str,
    css: &'a str,
    entries: &'a [Entry],
}

impl<'a> Index<'a> {
    fn new(title: &'a str, css: &'a str, entries: &'a [Entry]) -> Self {
        Self {
            title,
            css,
            entries,
        }
    }

    fn write(&self, dir: &Path) -> Result<()> {
        fs::write(dir.join("index.html"), self.render()?)?;
        Ok(())
    }
}

#[derive(Template)]
#[template(path = "styles.css", escape = "none")]
pub struct Styles {
    dark_theme: String,
    light_theme: String,
}

fn theme_to_css(theme: inkjet::theme::Theme) -> String {
    let mut css = format!(
        ".code {{\ncolor: {};\nbackground-color: {};\n}}\n",
        theme.fg.into_hex(),
        theme.bg.into_hex()
    );

    for (name, style) in theme.styles {
        css.push_str(&format!(".{name} {{\n"));
        if let Some(color) = style.fg {
            css.push_str(&format!("color: {};\n", color.into_hex()));
        }
        if let Some(color) = style.bg {
            css.push_str(&format!("background-color: {};\n", color.into_hex()));
        }
        css.push_str("}\n");
    }

    css
}

impl Styles {
    pub fn new() -> Result<Self> {
        let dark_theme = inkjet::theme::Theme::from_helix(inkjet::theme::vendored::SOLARIZED_DARK)?;
        let light_theme =
            inkjet::theme::Theme::from_helix(inkjet::theme::vendored::SOLARIZED_LIGHT)?;

        Ok(Self {
            dark_theme: theme_to_css(dark_theme),
            light_theme: theme_to_css(light_theme),
        })
    }

    pub fn write(&self, dir: &Path) -> Result<()> {
        fs::write(dir.join("styles.css"), self.render()?)?;
        Ok(())
    }
}

fn highlight(lang: &str, code: &str) -> Option<String> {
    let language = Language::from_token(lang)?;
    Highlighter::new()
        .highlight_to_string(language, &formatter::Html, code)
        .ok()
}

fn codeblock_events<'a>(
    lang: &str,
    parser: &mut impl Iterator<Item = Event<'a>>,
    output: &mut Vec<Event<'a>>,
) {
    for event in parser {
        match event {
            Event::Text(text) => {
                // Unknown fence languages fall back to an unhighlighted block.
                let block = match highlight(lang, &text) {
                    Some(html) => format!(r#"<pre class="code">{html}</pre>"#),
                    None => format!(r#"<pre class="code">{text}</pre>"#),
                };
                output.push(Event::Html(block.into()));
            }
            Event::End(_) => break,
            other => output.push(other),
        }
    }
}

pub fn markdown_events(markdown: &str) -> impl Iterator<Item = Event<'_>> {
    let mut parser = pulldown_cmark::Parser::new_ext(markdown, Options::all());
    let mut events = Vec::new();

    while let Some(event) = parser.next() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(lang))) => {
                codeblock_events(&lang, &mut parser, &mut events);
            }
            other => events.push(other),
        }
    }

    events.into_iter()
}

pub fn markdown_to_html(markdown: &str) -> String {
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, markdown_events(markdown));
    html
}

pub fn expand_backup(archive: &Path, dest: &Path) -> Result<()> {
    let file = fs::File::open(archive)
        .with_context(|| format!("failed to open backup {}", archive.display()))?;
    let mut backup = zip::ZipArchive::new(file)
        .with_context(|| format!("failed to read backup {}", archive.display()))?;
    info!(
        "expanding {} files into {}",
        backup.len(),
        dest.display()
    );
    backup
        .extract(dest)
        .with_context(|| format!("failed to expand backup into {}", dest.display()))?;
    Ok(())
}

pub fn compile(zipfile: &Path, outdir: &Path, css: &str) -> Result<()> {
    expand_backup(zipfile, outdir)?;
    let entries = Entry::from_dir(outdir)?;
    info!("rendering {} entries", entries.len());
    let styles = Styles::new()?;
    styles.write(outdir)?;
    let title = outdir
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("Journal");
    let index = Index::new(title, css, &entries);
    index.write(outdir)?;
    Ok(())
}

/// Map a failure to the process exit code: 10 for a malformed entry record,
/// 20 for a missing file, 1 otherwise.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if cause.downcast_ref::<serde_json::Error>().is_some() {
            return 10;
        }
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::NotFound {
                return 20;
            }
        }
    }
    1
}

/// The directory a backup expands into: the ZIP stem, in the current
/// directory. `journey-foo.zip` => `journey-foo/`.
pub fn backup_dir(zipfile: &Path) -> Result<PathBuf> {
    let stem = zipfile
        .file_stem()
        .with_context(|| format!("backup path {} has no file name", zipfile.display()))?;
    Ok(PathBuf::from(stem))
}

mod filters {
    use chrono::{DateTime, Local, Utc};

    pub fn fmt_date(date: &DateTime<Utc>) -> ::askama::Result<String> {
        Ok(date
            .with_timezone(&Local)
            .format("%B %d, %Y %H:%M")
            .to_string())
    }
}
