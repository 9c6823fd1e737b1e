//! M3U8 rewriting
//!
//! Every URI line of an upstream playlist is replaced by
//! `{proxy_origin}/{channel}/{resource}` so players only ever talk to the proxy.
//! Tag lines (`#...`) and blank lines are copied through untouched.

use url::{form_urlencoded, Url};

/// How an absolute upstream URL is reduced to a proxy resource name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewriteMode {
    /// Keep only the last path segment (`https://cdn/a/b/seg.aac` -> `seg.aac`)
    #[default]
    LastSegment,
    /// Keep everything after the leading numeric stream id
    /// (`https://cdn/1002/2024/05/01/12/30/01-00042.ts` -> `2024/05/01/12/30/01-00042.ts`)
    PreserveAfterStreamId,
}

/// Rewrite a playlist body for `channel`, keeping original line endings.
#[must_use]
pub fn rewrite_playlist(
    body: &str,
    channel: &str,
    proxy_origin: &str,
    mode: RewriteMode,
) -> String {
    let prefix = format!("{}/{}/", proxy_origin.trim_end_matches('/'), channel);
    let mut output = String::with_capacity(body.len() + body.len() / 4);

    for raw in body.split_inclusive('\n') {
        let (line, ending) = split_line_ending(raw);
        output.push_str(&rewrite_line(line, &prefix, mode));
        output.push_str(ending);
    }

    output
}

fn split_line_ending(raw: &str) -> (&str, &str) {
    if let Some(line) = raw.strip_suffix("\r\n") {
        (line, "\r\n")
    } else if let Some(line) = raw.strip_suffix('\n') {
        (line, "\n")
    } else {
        (raw, "")
    }
}

fn rewrite_line(line: &str, prefix: &str, mode: RewriteMode) -> String {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return line.to_string();
    }

    // Older tunnel playlists reference resources as `...?channel=x&path=<resource>`
    if let Some(resource) = legacy_path_param(trimmed) {
        return format!("{prefix}{}", resource.trim_start_matches('/'));
    }

    if let Some(absolute) = absolute_url(trimmed) {
        return format!("{prefix}{}", resource_from_path(absolute.path(), mode));
    }

    if trimmed.starts_with('/') {
        let path = trimmed.split(['?', '#']).next().unwrap_or_default();
        return format!("{prefix}{}", resource_from_path(path, mode));
    }

    format!("{prefix}{trimmed}")
}

/// Parse `line` as a URL with a host, including scheme-relative `//host/path` lines.
fn absolute_url(line: &str) -> Option<Url> {
    let parsed = if line.starts_with("//") {
        Url::parse(&format!("https:{line}"))
    } else {
        Url::parse(line)
    };
    parsed.ok().filter(Url::has_host)
}

fn legacy_path_param(line: &str) -> Option<String> {
    let (_, query) = line.split_once('?')?;
    let query = query.split('#').next().unwrap_or_default();
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "path")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

fn resource_from_path(path: &str, mode: RewriteMode) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match mode {
        RewriteMode::LastSegment => segments.last().copied().unwrap_or_default().to_string(),
        RewriteMode::PreserveAfterStreamId => match segments.split_first() {
            Some((first, rest)) if is_stream_id(first) && !rest.is_empty() => rest.join("/"),
            _ => segments.join("/"),
        },
    }
}

pub(crate) fn is_stream_id(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}
