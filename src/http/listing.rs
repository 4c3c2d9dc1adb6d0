//! Directory listing generation.

use std::io;
use std::path::Path;

/// One directory entry as reported by the enumerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub is_dir: bool,
}

impl Entry {
    pub fn new(name: impl Into<String>, is_dir: bool) -> Self {
        Self {
            name: name.into(),
            is_dir,
        }
    }
}

/// Enumerates `dir`, including the `.` and `..` pseudo entries, sorted by
/// name.
pub async fn read_entries(dir: &Path) -> io::Result<Vec<Entry>> {
    let mut entries = vec![Entry::new(".", true), Entry::new("..", true)];

    let mut read_dir = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        entries.push(Entry::new(entry.file_name().to_string_lossy(), is_dir));
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Renders `entries` of the directory at `target` as an HTML list.
///
/// Links point at `/target/name`. The `.` entry is always skipped and `..`
/// is skipped at the root; elsewhere it links to the parent directory
/// itself, since targets containing `..` are refused. When `rate` is given
/// it is appended to every link so throttling survives navigation.
pub fn render(target: &str, entries: &[Entry], rate: Option<&str>) -> String {
    let is_root = target.is_empty();
    let base = if is_root {
        String::new()
    } else {
        format!("/{}", target)
    };
    let query = rate
        .map(|r| format!("?rate={}", escape(r)))
        .unwrap_or_default();

    let mut html = String::from("<html><body><ul>\n");
    for entry in entries {
        if entry.name == "." || (is_root && entry.name == "..") {
            continue;
        }

        let name = escape(&entry.name);
        let slash = if entry.is_dir { "/" } else { "" };
        let href = if entry.name == ".." {
            parent_href(target)
        } else {
            format!("{base}/{name}{slash}")
        };
        html.push_str(&format!(
            "<li><a href=\"{href}{query}\">{name}{slash}</a></li>\n"
        ));
    }
    html.push_str("</ul></body></html>\n");

    html
}

/// Absolute link to the directory containing `target`, with a trailing
/// slash. A top-level target links to `/`.
fn parent_href(target: &str) -> String {
    match target.rsplit_once('/') {
        Some((parent, _)) => format!("/{}/", escape(parent)),
        None => "/".to_string(),
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
