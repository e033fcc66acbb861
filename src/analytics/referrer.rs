//! Referrer classification
//!
//! Maps a raw referrer URL to a traffic source and category using an ordered
//! substring table over the hostname. The table is data, not control flow:
//! adding a source is a one-line change.

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferrerCategory {
    Direct,
    Social,
    Messaging,
    Search,
    Email,
    Website,
    Unknown,
}

impl ReferrerCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferrerCategory::Direct => "direct",
            ReferrerCategory::Social => "social",
            ReferrerCategory::Messaging => "messaging",
            ReferrerCategory::Search => "search",
            ReferrerCategory::Email => "email",
            ReferrerCategory::Website => "website",
            ReferrerCategory::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub source: String,
    pub category: ReferrerCategory,
}

/// First match wins; order matters (e.g. "mail.google.com" is Google/search
/// because the google row precedes the mail row).
const SOURCE_TABLE: &[(&str, &str, ReferrerCategory)] = &[
    ("linkedin.com", "LinkedIn", ReferrerCategory::Social),
    ("facebook.com", "Facebook", ReferrerCategory::Social),
    ("fb.com", "Facebook", ReferrerCategory::Social),
    ("twitter.com", "Twitter-X", ReferrerCategory::Social),
    ("x.com", "Twitter-X", ReferrerCategory::Social),
    ("instagram.com", "Instagram", ReferrerCategory::Social),
    ("tiktok.com", "TikTok", ReferrerCategory::Social),
    ("youtube.com", "YouTube", ReferrerCategory::Social),
    ("youtu.be", "YouTube", ReferrerCategory::Social),
    ("whatsapp.com", "WhatsApp", ReferrerCategory::Messaging),
    ("wa.me", "WhatsApp", ReferrerCategory::Messaging),
    ("telegram.org", "Telegram", ReferrerCategory::Messaging),
    ("t.me", "Telegram", ReferrerCategory::Messaging),
    ("google.", "Google", ReferrerCategory::Search),
    ("bing.com", "Bing", ReferrerCategory::Search),
    ("yahoo.com", "Yahoo", ReferrerCategory::Search),
    ("duckduckgo.com", "DuckDuckGo", ReferrerCategory::Search),
    ("mail.", "Email", ReferrerCategory::Email),
    ("outlook.", "Email", ReferrerCategory::Email),
];

/// Classify a raw referrer URL.
///
/// `None` or the literal `"direct"` means the browser sent no referrer;
/// anything that fails URL parsing is Unknown; an unmatched hostname is
/// reported as itself with the generic `website` category.
pub fn classify(referrer: Option<&str>) -> Classified {
    let raw = match referrer {
        None => {
            return Classified {
                source: "Direct".to_string(),
                category: ReferrerCategory::Direct,
            }
        }
        Some(r) if r.is_empty() || r.eq_ignore_ascii_case("direct") => {
            return Classified {
                source: "Direct".to_string(),
                category: ReferrerCategory::Direct,
            }
        }
        Some(r) => r,
    };

    let host = match Url::parse(raw).ok().and_then(|u| {
        u.host_str().map(|h| h.to_ascii_lowercase())
    }) {
        Some(h) => h,
        None => {
            return Classified {
                source: "Unknown".to_string(),
                category: ReferrerCategory::Unknown,
            }
        }
    };

    for (needle, source, category) in SOURCE_TABLE {
        if host.contains(needle) {
            return Classified {
                source: (*source).to_string(),
                category: *category,
            };
        }
    }

    Classified {
        source: host,
        category: ReferrerCategory::Website,
    }
}
