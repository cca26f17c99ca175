//! Link spam classification.

use url::Url;

const TRIM_CHARS: &[char] = &[
    '(', ')', '[', ']', '{', '}', '<', '>', '"', '\'', ',', '.', '!', '?', ';', ':', '*', '_',
    '`', '«', '»',
];

/// Decides whether message text carries a link that is not allowed.
///
/// Recognizes scheme-prefixed URLs (`https://…`, `tg://…`) and bare
/// domain-like tokens (`example.com/path`, `www.example.org`). Matching is
/// case-insensitive. Domains on the allow-list, and their subdomains, pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkClassifier {
    enabled: bool,
    allow_list: Vec<String>,
}

impl LinkClassifier {
    /// Creates a classifier; a disabled classifier never flags anything.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            allow_list: Vec::new(),
        }
    }

    /// Returns a classifier that lets links to the given domains through.
    #[must_use]
    pub fn with_allow_list<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allow_list = domains
            .into_iter()
            .map(|domain| {
                domain
                    .as_ref()
                    .trim()
                    .trim_start_matches("*.")
                    .trim_matches('.')
                    .to_lowercase()
            })
            .map(|domain| {
                Url::parse(format!("http://{domain}").as_str())
                    .ok()
                    .and_then(|url| url.host_str().map(str::to_owned))
                    .unwrap_or(domain)
            })
            .filter(|domain| !domain.is_empty())
            .collect();
        self
    }

    /// Returns whether link classification is turned on.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns true when `text` contains a link that is not allow-listed.
    #[must_use]
    pub fn is_disallowed_link(&self, text: &str) -> bool {
        if !self.enabled {
            return false;
        }

        text.split_whitespace()
            .filter_map(link_host)
            .any(|host| !self.is_allowed(host.as_str()))
    }

    fn is_allowed(&self, host: &str) -> bool {
        let host = host.trim_start_matches("www.");
        self.allow_list.iter().any(|domain| {
            host == domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

/// Extracts the lowercase ASCII host of a link-like token.
fn link_host(token: &str) -> Option<String> {
    let token = token.trim_matches(TRIM_CHARS).to_lowercase();
    if token.is_empty() {
        return None;
    }

    if let Some(host) = scheme_link_host(token.as_str()) {
        return Some(host);
    }

    // Mentions and email addresses are not links.
    if token.contains('@') {
        return None;
    }

    bare_link_candidates(token.as_str()).find_map(bare_link_host)
}

/// Finds a `scheme://` link anywhere in the token, including one glued to a
/// prefix such as `👉https://…` or `link:https://…`.
fn scheme_link_host(token: &str) -> Option<String> {
    token.match_indices("://").find_map(|(index, _)| {
        let prefix = &token[..index];
        let start = scheme_start(prefix);
        let rest = &token[index + 3..];
        if start == index || rest.is_empty() {
            return None;
        }

        let scheme = &token[start..index];
        Some(match Url::parse(&token[start..]) {
            Ok(url) => url.host_str().unwrap_or(scheme).to_owned(),
            Err(_) => scheme.to_owned(),
        })
    })
}

/// Byte offset where the scheme ending at `prefix.len()` begins.
fn scheme_start(prefix: &str) -> usize {
    let mut start = prefix.len();
    for (index, character) in prefix.char_indices().rev() {
        if !is_scheme_char(character) {
            break;
        }
        start = index;
    }

    // A scheme starts with a letter.
    prefix[start..]
        .find(|character: char| character.is_ascii_alphabetic())
        .map_or(prefix.len(), |offset| start + offset)
}

/// The whole token, then every suffix that follows a separator in the host
/// part (`join:t.me/x`, `👉t.me/x`).
fn bare_link_candidates(token: &str) -> impl Iterator<Item = &str> {
    let host_part = token.find('/').unwrap_or(token.len());
    let suffixes = token[..host_part]
        .char_indices()
        .filter(|(_, character)| !is_host_char(*character))
        .map(move |(index, character)| &token[index + character.len_utf8()..]);

    std::iter::once(token).chain(suffixes)
}

fn bare_link_host(candidate: &str) -> Option<String> {
    if candidate.is_empty() || !candidate.starts_with(|character: char| character.is_alphanumeric())
    {
        return None;
    }

    let url = Url::parse(format!("http://{candidate}").as_str()).ok()?;
    let host = url.host_str()?;
    if !is_domain_like(host) {
        return None;
    }

    let has_path = candidate.contains(['/', '?', '#']);
    let strong_signal = host.starts_with("www.")
        || has_path
        || url.port().is_some()
        || has_known_top_level(host);
    strong_signal.then(|| host.to_owned())
}

fn is_scheme_char(character: char) -> bool {
    character.is_ascii_alphanumeric() || matches!(character, '+' | '-' | '.')
}

fn is_host_char(character: char) -> bool {
    character.is_alphanumeric() || matches!(character, '-' | '.')
}

fn is_domain_like(host: &str) -> bool {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    let Some(top_level) = labels.last() else {
        return false;
    };
    let punycode = top_level.starts_with("xn--");
    if !punycode
        && (top_level.chars().count() < 2 || !top_level.chars().all(|c| c.is_ascii_alphabetic()))
    {
        return false;
    }

    labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|character| character.is_ascii_alphanumeric() || character == '-')
    })
}

/// Top-level domains that make a bare `name.tld` token a link on its own.
/// Ones that collide with file extensions (`rs`, `md`, `sh`, `py`, `pl`) are
/// left out; such hosts still count with `www.`, a path or a port.
const KNOWN_TOP_LEVEL: &[&str] = &[
    "com", "net", "org", "info", "biz", "io", "co", "me", "ru", "ua", "by", "kz", "su", "uz",
    "xyz", "top", "site", "online", "club", "shop", "store", "app", "dev", "ly", "gg", "cc",
    "tk", "ml", "ga", "cf", "gq", "link", "click", "live", "pro", "tv", "us", "uk", "de", "fr",
    "eu", "cn", "br", "tr", "ir", "es", "it", "nl", "ws", "to", "vip", "win", "bet", "casino",
    "money", "work", "fun", "space", "website", "icu", "buzz",
];

fn has_known_top_level(host: &str) -> bool {
    host.rsplit('.').next().is_some_and(|top_level| {
        top_level.starts_with("xn--") || KNOWN_TOP_LEVEL.contains(&top_level)
    })
}
