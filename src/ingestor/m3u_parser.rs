//! Line-oriented M3U playlist parser
//!
//! Pairs each `#EXTINF:` metadata line with the next non-comment line. Parsing
//! never fails: malformed metadata degrades to defaults and orphaned lines are
//! skipped.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, trace};
use url::Url;

use crate::models::PlaylistEntry;

const EXTINF_PREFIX: &str = "#EXTINF:";

static ATTRIBUTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([\w-]+)="([^"]*)""#).expect("attribute pattern is valid"));

/// Metadata carried by an `#EXTINF:` line until its URL line arrives
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ExtInf {
    duration: i64,
    title: String,
    logo: String,
    group: String,
}

/// Parse playlist text into entries in file order
///
/// Relative URL lines are resolved against `base`, the playlist's own location.
pub fn parse_playlist(content: &str, base: &Url) -> Vec<PlaylistEntry> {
    let mut entries = Vec::new();
    let mut pending: Option<ExtInf> = None;

    for raw_line in content.lines() {
        let line = raw_line.trim_start_matches('\u{feff}').trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix(EXTINF_PREFIX) {
            if pending.is_some() {
                trace!("Discarding metadata line with no stream URL");
            }
            pending = Some(parse_extinf(rest));
            continue;
        }

        // Other directives (#EXTM3U, #EXTVLCOPT, ...) leave pending metadata intact
        if line.starts_with('#') {
            continue;
        }

        let Some(info) = pending.take() else {
            trace!("Skipping URL line without metadata: {}", line);
            continue;
        };

        let Some(url) = resolve_stream_url(line, base) else {
            debug!("Dropping entry '{}' with unresolvable URL: {}", info.title, line);
            continue;
        };

        entries.push(PlaylistEntry {
            duration: info.duration,
            title: info.title,
            logo: info.logo,
            group: info.group,
            url,
        });
    }

    entries
}

fn parse_extinf(rest: &str) -> ExtInf {
    let mut info = ExtInf {
        duration: parse_duration(rest),
        ..Default::default()
    };

    for caps in ATTRIBUTE_RE.captures_iter(rest) {
        match &caps[1] {
            "tvg-logo" => info.logo = caps[2].to_string(),
            "group-title" => info.group = caps[2].to_string(),
            _ => {}
        }
    }

    if let Some(comma) = first_unquoted_comma(rest) {
        let title = &rest[comma + 1..];
        info.title = ATTRIBUTE_RE.replace_all(title, "").trim().to_string();
    }

    info
}

/// Leading signed integer, 0 when absent or out of range
fn parse_duration(rest: &str) -> i64 {
    let digits_start = usize::from(rest.starts_with('-'));
    let digits_len = rest[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return 0;
    }
    rest[..digits_start + digits_len].parse().unwrap_or(0)
}

fn first_unquoted_comma(text: &str) -> Option<usize> {
    let mut in_quotes = false;
    for (idx, ch) in text.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => return Some(idx),
            _ => {}
        }
    }
    None
}

fn resolve_stream_url(line: &str, base: &Url) -> Option<String> {
    let lower = line.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(line.to_string());
    }
    base.join(line).ok().map(String::from)
}
