use jiff::civil::Date;
use tracing::warn;

use crate::tmdb::{CastFragment, CrewFragment, KeywordFragment, MovieDetails, Video};

/// A movie's merged upstream payloads: detail body plus the credit and
/// keyword fragments fetched alongside it, ready for persistence.
#[derive(Clone, Debug)]
pub struct MovieBundle {
    pub details: MovieDetails,
    pub cast: Vec<CastFragment>,
    pub crew: Vec<CrewFragment>,
    pub keywords: Vec<KeywordFragment>,
    pub links: VideoLinks,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VideoLinks {
    pub trailer: Option<String>,
    pub teaser: Option<String>,
}

impl VideoLinks {
    /// Picks the first YouTube-hosted trailer and teaser out of a videos
    /// list; entries on other platforms are ignored.
    pub fn from_videos(videos: &[Video]) -> Self {
        let mut links = VideoLinks::default();
        for video in videos {
            if video.site != "YouTube" {
                continue;
            }
            let url = format!("https://www.youtube.com/watch?v={}", video.key);
            match video.kind.as_str() {
                "Trailer" if links.trailer.is_none() => links.trailer = Some(url),
                "Teaser" if links.teaser.is_none() => links.teaser = Some(url),
                _ => {},
            }
        }
        links
    }
}

/// Strips any time suffix (`2025-01-23T00:00:00.000Z` -> `2025-01-23`) and
/// parses the remainder as a civil date. Unparseable input yields `None`.
pub fn clean_date(raw: &str) -> Option<Date> {
    let date_part = raw.split('T').next().unwrap_or(raw);
    if date_part.is_empty() {
        return None;
    }
    match date_part.parse::<Date>() {
        Ok(date) => Some(date),
        Err(err) => {
            warn!(raw = %raw, error = %err, "dropping invalid date");
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(site: &str, kind: &str, key: &str) -> Video {
        Video { site: site.to_string(), kind: kind.to_string(), key: key.to_string() }
    }

    #[test]
    fn clean_date_strips_time_suffix() {
        let date = clean_date("2025-01-23T00:00:00.000Z").unwrap();
        assert_eq!(date, Date::constant(2025, 1, 23));
    }

    #[test]
    fn clean_date_accepts_plain_dates() {
        assert_eq!(clean_date("1994-09-23"), Some(Date::constant(1994, 9, 23)));
    }

    #[test]
    fn clean_date_rejects_garbage() {
        assert_eq!(clean_date("not-a-date"), None);
        assert_eq!(clean_date(""), None);
    }

    #[test]
    fn video_links_take_first_of_each_kind() {
        let videos = vec![
            video("Vimeo", "Trailer", "ignored"),
            video("YouTube", "Teaser", "teaser1"),
            video("YouTube", "Trailer", "trailer1"),
            video("YouTube", "Trailer", "trailer2"),
            video("YouTube", "Clip", "clip1"),
        ];
        let links = VideoLinks::from_videos(&videos);
        assert_eq!(links.trailer.as_deref(), Some("https://www.youtube.com/watch?v=trailer1"));
        assert_eq!(links.teaser.as_deref(), Some("https://www.youtube.com/watch?v=teaser1"));
    }

    #[test]
    fn video_links_empty_when_no_youtube_entries() {
        let videos = vec![video("Vimeo", "Trailer", "v1")];
        assert_eq!(VideoLinks::from_videos(&videos), VideoLinks::default());
    }
}
