// Video URL classification for cited sources

use once_cell::sync::Lazy;
use regex::Regex;

static YOUTUBE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#)
        .expect("youtube pattern is valid")
});

static VIMEO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"vimeo\.com/(?:video/)?(\d+)").expect("vimeo pattern is valid"));

static LOOM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"loom\.com/share/([a-zA-Z0-9]+)").expect("loom pattern is valid"));

/// Map a video URL to its canonical embeddable form.
///
/// Providers are tried in a fixed order and the first match wins; anything
/// unrecognized is unsupported and yields `None`. Pure function, no I/O.
pub fn embed_url(url: &str) -> Option<String> {
    if let Some(captures) = YOUTUBE_RE.captures(url) {
        return Some(format!("https://www.youtube.com/embed/{}", &captures[1]));
    }

    if let Some(captures) = VIMEO_RE.captures(url) {
        return Some(format!("https://player.vimeo.com/video/{}", &captures[1]));
    }

    if let Some(captures) = LOOM_RE.captures(url) {
        return Some(format!("https://www.loom.com/embed/{}", &captures[1]));
    }

    None
}
