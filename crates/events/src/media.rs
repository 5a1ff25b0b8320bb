//! Recognition of third-party media links shown on event pages.

use serde::Serialize;
use url::Url;

use crate::entities::Event;

const MAP_SEARCH_BASE: &str = "https://www.google.com/maps/search/?api=1&query=";
const YOUTUBE_ID_LEN: usize = 11;

fn parse_host(link: &str) -> Option<(Url, String)> {
    let parsed = Url::parse(link.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?.to_ascii_lowercase();
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .unwrap_or(&host)
        .to_string();
    Some((parsed, host))
}

fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|segment| !segment.is_empty()).collect())
        .unwrap_or_default()
}

fn valid_video_id(id: &str) -> bool {
    id.len() == YOUTUBE_ID_LEN
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

/// Video id of a YouTube watch, short, live, embed or youtu.be link.
pub fn youtube_video_id(link: &str) -> Option<String> {
    let (url, host) = parse_host(link)?;
    let segments = path_segments(&url);

    let candidate = match host.as_str() {
        "youtu.be" => segments.first().map(|id| id.to_string()),
        "youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => match segments.as_slice() {
            ["watch"] => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            ["shorts" | "live" | "embed" | "v", id, ..] => Some(id.to_string()),
            _ => None,
        },
        _ => None,
    }?;

    valid_video_id(&candidate).then_some(candidate)
}

pub fn is_youtube_video_url(link: &str) -> bool {
    youtube_video_id(link).is_some()
}

pub fn youtube_embed_url(link: &str) -> Option<String> {
    youtube_video_id(link).map(|id| format!("https://www.youtube.com/embed/{id}"))
}

/// Links to a channel page rather than a single video.
pub fn is_youtube_channel_url(link: &str) -> bool {
    let Some((url, host)) = parse_host(link) else {
        return false;
    };
    if host != "youtube.com" {
        return false;
    }
    match path_segments(&url).as_slice() {
        [handle, ..] if handle.starts_with('@') && handle.len() > 1 => true,
        ["channel" | "c" | "user", _, ..] => true,
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstagramLinkKind {
    Post,
    Profile,
    Other,
}

const INSTAGRAM_RESERVED: &[&str] = &["explore", "accounts", "stories", "direct", "about"];

/// Classify an Instagram link; `None` for anything else.
pub fn instagram_link_kind(link: &str) -> Option<InstagramLinkKind> {
    let (url, host) = parse_host(link)?;
    if host != "instagram.com" && host != "instagr.am" {
        return None;
    }

    let kind = match path_segments(&url).as_slice() {
        ["p" | "reel" | "reels" | "tv", _, ..] => InstagramLinkKind::Post,
        [name] if !INSTAGRAM_RESERVED.contains(name) => InstagramLinkKind::Profile,
        _ => InstagramLinkKind::Other,
    };
    Some(kind)
}

pub fn is_instagram_url(link: &str) -> bool {
    instagram_link_kind(link).is_some()
}

/// Embeddable URL for an Instagram post, reel or tv link.
pub fn instagram_embed_url(link: &str) -> Option<String> {
    let (url, _) = parse_host(link)?;
    if instagram_link_kind(link)? != InstagramLinkKind::Post {
        return None;
    }
    let code = path_segments(&url).get(1)?.to_string();
    Some(format!("https://www.instagram.com/p/{code}/embed"))
}

/// Map search for the venue; only offered when a venue name is set.
pub fn map_search_link(venue_name: Option<&str>, venue_address: Option<&str>) -> Option<String> {
    let name = venue_name.map(str::trim).filter(|name| !name.is_empty())?;
    let query = format!("{} {}", name, venue_address.unwrap_or_default().trim());
    Some(format!(
        "{MAP_SEARCH_BASE}{}",
        urlencoding::encode(query.trim())
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoHighlight {
    pub url: String,
    pub embed_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstagramHighlight {
    pub url: String,
    pub kind: InstagramLinkKind,
    pub embed_url: Option<String>,
}

/// The media section of an event page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MediaHighlights {
    pub video: Option<VideoHighlight>,
    pub instagram: Vec<InstagramHighlight>,
    pub photo_album_url: Option<String>,
}

impl MediaHighlights {
    pub fn for_event(event: &Event) -> Self {
        let video = event.youtube_link.as_deref().and_then(|link| {
            youtube_embed_url(link).map(|embed_url| VideoHighlight {
                url: link.to_string(),
                embed_url,
            })
        });

        let instagram = event
            .custom_social_links
            .iter()
            .filter_map(|link| {
                let kind = instagram_link_kind(&link.url)?;
                Some(InstagramHighlight {
                    url: link.url.clone(),
                    kind,
                    embed_url: instagram_embed_url(&link.url),
                })
            })
            .collect();

        Self {
            video,
            instagram,
            photo_album_url: event.google_photos_url.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.video.is_none() && self.instagram.is_empty() && self.photo_album_url.is_none()
    }
}
