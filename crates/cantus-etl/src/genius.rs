//! Genius fetch adapter.
//!
//! Resolves an artist name through the Genius search API, pages through
//! the artist's own songs sorted by popularity (guest features are
//! dropped), and scrapes the lyrics body from each song page. Every
//! failure is folded into a [`FetchOutcome`]; the retry controller decides
//! what to do with it.

use std::time::Duration;

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{CollectError, CollectResult};
use crate::provider::{FetchAdapter, FetchOutcome, RawAlbum, RawSong};
use crate::resilience::RateLimiter;

const GENIUS_API_BASE: &str = "https://api.genius.com";
const SOURCE_NAME: &str = "Genius";

/// Songs requested per catalog page (the API maximum).
const PER_PAGE: &str = "50";

/// Title patterns of Genius pages that are not songs.
const NON_SONG_PATTERN: &str =
    r"track\s?list|album art(work)?|liner notes|booklet|credits|interview|skit|instrumental|setlist";

// ---------------------------------------------------------------------------
// API response types (private -- every payload sits under "response")
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: T,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    result: SearchResult,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    primary_artist: GeniusArtist,
}

#[derive(Debug, Deserialize)]
struct ArtistSongsResponse {
    #[serde(default)]
    songs: Vec<GeniusSong>,
    #[serde(default)]
    next_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SongResponse {
    song: GeniusSong,
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// An artist as referenced by Genius.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeniusArtist {
    pub id: u64,
    pub name: String,
}

/// A song entry from the Genius API.
#[derive(Debug, Clone, Deserialize)]
pub struct GeniusSong {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub lyrics_state: Option<String>,
    #[serde(default)]
    pub instrumental: bool,
    #[serde(default)]
    pub primary_artist: Option<GeniusArtist>,
    #[serde(default)]
    pub album: Option<RawAlbum>,
}

/// Which songs to keep and how to clean their lyrics.
#[derive(Debug, Clone)]
pub struct GeniusOptions {
    pub excluded_terms: Vec<String>,
    pub skip_non_songs: bool,
    pub remove_section_headers: bool,
}

impl Default for GeniusOptions {
    fn default() -> Self {
        Self {
            excluded_terms: vec!["(Live)".to_string(), "(Remix)".to_string()],
            skip_non_songs: true,
            remove_section_headers: true,
        }
    }
}

impl From<&Config> for GeniusOptions {
    fn from(config: &Config) -> Self {
        Self {
            excluded_terms: config.excluded_terms.clone(),
            skip_non_songs: config.skip_non_songs,
            remove_section_headers: config.remove_section_headers,
        }
    }
}

// ---------------------------------------------------------------------------
// Song filtering
// ---------------------------------------------------------------------------

/// Decides whether a catalog entry is worth collecting.
#[derive(Debug, Clone)]
pub struct SongFilter {
    excluded: Option<Regex>,
    non_songs: Option<Regex>,
}

impl SongFilter {
    /// Build a filter. Excluded terms match literally and case-insensitively.
    pub fn new(options: &GeniusOptions) -> Result<Self, regex::Error> {
        let terms: Vec<String> = options
            .excluded_terms
            .iter()
            .map(|term| term.trim())
            .filter(|term| !term.is_empty())
            .map(regex::escape)
            .collect();

        let excluded = if terms.is_empty() {
            None
        } else {
            Some(
                RegexBuilder::new(&terms.join("|"))
                    .case_insensitive(true)
                    .build()?,
            )
        };

        let non_songs = if options.skip_non_songs {
            Some(
                RegexBuilder::new(NON_SONG_PATTERN)
                    .case_insensitive(true)
                    .build()?,
            )
        } else {
            None
        };

        Ok(Self {
            excluded,
            non_songs,
        })
    }

    /// Keep `song` when it belongs to `artist_id` and passes the title and
    /// lyrics-state checks.
    pub fn accepts(&self, song: &GeniusSong, artist_id: u64) -> bool {
        if song.primary_artist.as_ref().map(|a| a.id) != Some(artist_id) {
            return false;
        }
        if self
            .excluded
            .as_ref()
            .is_some_and(|re| re.is_match(&song.title))
        {
            return false;
        }
        if let Some(non_songs) = &self.non_songs {
            let complete = song.lyrics_state.as_deref() == Some("complete");
            if !complete || song.instrumental || non_songs.is_match(&song.title) {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Lyrics extraction
// ---------------------------------------------------------------------------

/// Pulls the lyrics body out of a Genius song page.
#[derive(Debug, Clone)]
pub struct LyricsExtractor {
    line_break: Regex,
    tag: Regex,
    numeric_entity: Regex,
    section_header: Option<Regex>,
    blank_lines: Regex,
}

impl LyricsExtractor {
    pub fn new(remove_section_headers: bool) -> Result<Self, regex::Error> {
        Ok(Self {
            line_break: Regex::new(r"(?i)<br\s*/?>")?,
            tag: Regex::new(r"<[^>]*>")?,
            numeric_entity: Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);")?,
            section_header: if remove_section_headers {
                Some(Regex::new(r"\[[^\]\n]*\]")?)
            } else {
                None
            },
            blank_lines: Regex::new(r"\n{2,}")?,
        })
    }

    /// Extract the lyrics text from a song page, or `None` when the page
    /// carries no lyrics container.
    pub fn extract(&self, html: &str) -> Option<String> {
        let containers = div_blocks(html, "data-lyrics-container=\"true\"");
        if containers.is_empty() {
            return None;
        }

        let mut text = String::new();
        for (start, end) in containers {
            let block = strip_blocks(&html[start..end], "data-exclude-from-selection=\"true\"");
            let block = self.line_break.replace_all(&block, "\n");
            let block = self.tag.replace_all(&block, "");
            text.push_str(&self.decode_entities(&block));
            text.push('\n');
        }

        let text = match &self.section_header {
            Some(header) => {
                let stripped = header.replace_all(&text, "");
                self.blank_lines.replace_all(&stripped, "\n").into_owned()
            }
            None => text,
        };

        Some(text.trim().to_string())
    }

    fn decode_entities(&self, text: &str) -> String {
        let named = text
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&nbsp;", " ");

        let numeric = self.numeric_entity.replace_all(&named, |caps: &regex::Captures<'_>| {
            let code = &caps[1];
            let value = match code.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => code.parse::<u32>().ok(),
            };
            value
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        });

        // Last, so "&amp;lt;" decodes to "&lt;" rather than "<".
        numeric.replace("&amp;", "&")
    }
}

/// Byte ranges of every `<div ...>` element whose opening tag contains
/// `marker`, including nested `<div>` children.
fn div_blocks(html: &str, marker: &str) -> Vec<(usize, usize)> {
    let mut blocks = Vec::new();
    let mut cursor = 0;

    while let Some(found) = html[cursor..].find(marker) {
        let marker_at = cursor + found;
        let Some(start) = html[..marker_at].rfind("<div") else {
            cursor = marker_at + marker.len();
            continue;
        };

        let mut depth = 0usize;
        let mut pos = start;
        let mut end = html.len();
        while pos < html.len() {
            let rest = &html[pos..];
            let next_open = rest.find("<div");
            let next_close = rest.find("</div>");
            match (next_open, next_close) {
                (Some(open), Some(close)) if open < close => {
                    depth += 1;
                    pos += open + "<div".len();
                }
                (_, Some(close)) => {
                    depth = depth.saturating_sub(1);
                    pos += close + "</div>".len();
                    if depth == 0 {
                        end = pos;
                        break;
                    }
                }
                (_, None) => break,
            }
        }

        blocks.push((start, end));
        cursor = end.max(marker_at + marker.len());
    }

    blocks
}

/// `html` with every `<div>` block carrying `marker` removed.
fn strip_blocks(html: &str, marker: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for (start, end) in div_blocks(html, marker) {
        if start < last {
            continue;
        }
        out.push_str(&html[last..start]);
        last = end;
    }
    out.push_str(&html[last..]);
    out
}

/// Pick the artist a search refers to: an exact (case-insensitive) name
/// match among the hits, else the first hit's primary artist.
fn select_artist(hits: Vec<SearchHit>, artist_name: &str) -> Option<GeniusArtist> {
    let wanted = artist_name.trim().to_lowercase();
    let mut artists = hits.into_iter().map(|hit| hit.result.primary_artist);
    let first = artists.next()?;
    if first.name.trim().to_lowercase() == wanted {
        return Some(first);
    }
    Some(
        artists
            .find(|artist| artist.name.trim().to_lowercase() == wanted)
            .unwrap_or(first),
    )
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Genius API client and [`FetchAdapter`].
///
/// Requests are authenticated with a client access token and paced by a
/// [`RateLimiter`] at 4 requests per second.
#[derive(Debug, Clone)]
pub struct GeniusClient {
    http: Client,
    token: String,
    api_base: String,
    filter: SongFilter,
    extractor: LyricsExtractor,
    rate_limiter: RateLimiter,
}

impl GeniusClient {
    /// Create a new Genius client.
    ///
    /// # Errors
    /// Returns [`CollectError::Configuration`] if the token is blank or an
    /// excluded term cannot be compiled, and [`CollectError::Request`] if
    /// the HTTP client cannot be created.
    pub fn new(token: impl Into<String>, options: &GeniusOptions) -> CollectResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(CollectError::Configuration(
                "Genius access token is empty".to_string(),
            ));
        }

        let http = Client::builder()
            .user_agent("cantus/0.1.0 (https://github.com/oxur/cantus)")
            .timeout(Duration::from_secs(30))
            .build()?;

        let filter = SongFilter::new(options)
            .map_err(|e| CollectError::Configuration(format!("invalid excluded term: {e}")))?;
        let extractor = LyricsExtractor::new(options.remove_section_headers)
            .map_err(|e| CollectError::Configuration(format!("lyrics patterns: {e}")))?;

        Ok(Self {
            http,
            token,
            api_base: GENIUS_API_BASE.to_string(),
            filter,
            extractor,
            rate_limiter: RateLimiter::new(4),
        })
    }

    /// Create a client from the loaded configuration.
    ///
    /// # Errors
    /// Returns [`CollectError::Configuration`] when no token is configured.
    pub fn from_config(config: &Config) -> CollectResult<Self> {
        let token = config.genius_access_token.clone().ok_or_else(|| {
            CollectError::Configuration("Genius access token not set".to_string())
        })?;
        Self::new(token, &GeniusOptions::from(config))
    }

    /// Point the client at another API host (e.g. a local mirror).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// GET an API path and unwrap the `response` envelope. `Ok(None)` on 404.
    async fn get_api<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> CollectResult<Option<T>> {
        self.rate_limiter.acquire().await;

        let response = self
            .http
            .get(format!("{}{}", self.api_base, path))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(CollectError::RateLimited {
                    source_name: SOURCE_NAME.to_string(),
                })
            }
            _ => {}
        }

        let response = response.error_for_status().map_err(|e| CollectError::Http {
            source_name: SOURCE_NAME.to_string(),
            message: e.to_string(),
        })?;

        let envelope: Envelope<T> = response.json().await.map_err(|e| CollectError::Parse {
            source_name: SOURCE_NAME.to_string(),
            message: e.to_string(),
        })?;

        Ok(Some(envelope.response))
    }

    /// Resolve `artist_name` to a Genius artist.
    pub async fn search_artist(&self, artist_name: &str) -> CollectResult<GeniusArtist> {
        let not_found = || CollectError::NotFound {
            entity: format!("artist {artist_name}"),
            source_name: SOURCE_NAME.to_string(),
        };

        let search: SearchResponse = self
            .get_api("/search", &[("q", artist_name)])
            .await?
            .ok_or_else(not_found)?;

        select_artist(search.hits, artist_name).ok_or_else(not_found)
    }

    /// The artist's own songs, most popular first, after filtering.
    pub async fn artist_songs(
        &self,
        artist: &GeniusArtist,
        max_songs: usize,
    ) -> CollectResult<Vec<GeniusSong>> {
        let path = format!("/artists/{}/songs", artist.id);
        let mut kept = Vec::new();
        let mut page = 1u32;

        loop {
            let page_str = page.to_string();
            let Some(response) = self
                .get_api::<ArtistSongsResponse>(
                    &path,
                    &[
                        ("sort", "popularity"),
                        ("per_page", PER_PAGE),
                        ("page", &page_str),
                    ],
                )
                .await?
            else {
                return Err(CollectError::NotFound {
                    entity: format!("artist {} (id {})", artist.name, artist.id),
                    source_name: SOURCE_NAME.to_string(),
                });
            };

            for song in response.songs {
                if self.filter.accepts(&song, artist.id) {
                    kept.push(song);
                } else {
                    log::debug!("Skipping {:?} by {}", song.title, artist.name);
                }
                if kept.len() >= max_songs {
                    return Ok(kept);
                }
            }

            match response.next_page {
                Some(next) if next > page => page = next,
                _ => return Ok(kept),
            }
        }
    }

    /// Full song details; falls back to `song` itself when the lookup 404s.
    async fn song_details(&self, song: GeniusSong) -> CollectResult<GeniusSong> {
        let details: Option<SongResponse> =
            self.get_api(&format!("/songs/{}", song.id), &[]).await?;
        Ok(details.map_or(song, |d| d.song))
    }

    /// Download a song page and extract its lyrics.
    pub async fn song_lyrics(&self, url: &str) -> CollectResult<Option<String>> {
        self.rate_limiter.acquire().await;

        let response = self.http.get(url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(CollectError::RateLimited {
                    source_name: SOURCE_NAME.to_string(),
                })
            }
            _ => {}
        }

        let html = response
            .error_for_status()
            .map_err(|e| CollectError::Http {
                source_name: SOURCE_NAME.to_string(),
                message: e.to_string(),
            })?
            .text()
            .await?;

        Ok(self.extractor.extract(&html))
    }

    /// Search, list, and download in one unit.
    async fn collect(&self, artist_name: &str, max_songs: usize) -> CollectResult<Vec<RawSong>> {
        let artist = self.search_artist(artist_name).await?;
        log::info!(
            "Resolved {} to Genius artist {} (id {})",
            artist_name,
            artist.name,
            artist.id
        );

        let listed = self.artist_songs(&artist, max_songs).await?;
        if listed.is_empty() {
            return Err(CollectError::Empty {
                artist: artist.name,
            });
        }

        let mut songs = Vec::with_capacity(listed.len());
        for song in listed {
            let song = self.song_details(song).await?;
            let lyrics = match song.url.as_deref() {
                Some(url) => self.song_lyrics(url).await?,
                None => None,
            };
            if lyrics.is_none() {
                log::warn!("No lyrics found for {:?} by {}", song.title, artist.name);
            }
            songs.push(RawSong {
                title: Some(song.title),
                lyrics,
                album: song.album,
            });
        }

        log::info!("Fetched {} songs by {}", songs.len(), artist.name);
        Ok(songs)
    }
}

#[async_trait]
impl FetchAdapter for GeniusClient {
    async fn fetch(&self, artist_name: &str, max_songs: usize) -> FetchOutcome {
        match self.collect(artist_name, max_songs).await {
            Ok(songs) => FetchOutcome::Success { songs },
            Err(e) => FetchOutcome::from_error(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: u64, title: &str, artist_id: u64) -> GeniusSong {
        GeniusSong {
            id,
            title: title.to_string(),
            url: Some(format!("https://genius.com/song-{id}")),
            lyrics_state: Some("complete".to_string()),
            instrumental: false,
            primary_artist: Some(GeniusArtist {
                id: artist_id,
                name: "Artist".to_string(),
            }),
            album: None,
        }
    }

    fn hit(id: u64, name: &str) -> SearchHit {
        SearchHit {
            result: SearchResult {
                primary_artist: GeniusArtist {
                    id,
                    name: name.to_string(),
                },
            },
        }
    }

    #[test]
    fn test_genius_client_creation() {
        let client = GeniusClient::new("test-token", &GeniusOptions::default()).unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("GeniusClient"));
        assert!(debug.contains("RateLimiter"));
    }

    #[test]
    fn test_genius_client_rejects_blank_token() {
        let err = GeniusClient::new(" ", &GeniusOptions::default()).unwrap_err();
        assert!(matches!(err, CollectError::Configuration(_)));
    }

    #[test]
    fn test_from_config_requires_token() {
        let err = GeniusClient::from_config(&Config::default()).unwrap_err();
        assert!(matches!(err, CollectError::Configuration(_)));
    }

    #[test]
    fn test_with_api_base_trims_slash() {
        let client = GeniusClient::new("t", &GeniusOptions::default())
            .unwrap()
            .with_api_base("http://localhost:8080/");
        assert_eq!(client.api_base, "http://localhost:8080");
    }

    #[test]
    fn test_search_response_deserialize() {
        let json = r#"{
            "meta": {"status": 200},
            "response": {
                "hits": [
                    {"type": "song", "result": {"id": 1, "title": "Emily",
                        "primary_artist": {"id": 42, "name": "Joanna Newsom"}}}
                ]
            }
        }"#;
        let envelope: Envelope<SearchResponse> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.response.hits.len(), 1);
        assert_eq!(envelope.response.hits[0].result.primary_artist.id, 42);
    }

    #[test]
    fn test_artist_songs_deserialize() {
        let json = r#"{
            "response": {
                "songs": [
                    {"id": 7, "title": "Sprout and the Bean", "url": "https://genius.com/x",
                     "lyrics_state": "complete",
                     "primary_artist": {"id": 42, "name": "Joanna Newsom"}}
                ],
                "next_page": null
            }
        }"#;
        let envelope: Envelope<ArtistSongsResponse> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.response.songs.len(), 1);
        assert!(envelope.response.next_page.is_none());
        assert!(envelope.response.songs[0].album.is_none());
    }

    #[test]
    fn test_song_detail_album_deserialize() {
        let json = r#"{"response": {"song": {"id": 7, "title": "Emily",
            "album": {"id": 3, "name": "Ys"}}}}"#;
        let envelope: Envelope<SongResponse> = serde_json::from_str(json).unwrap();
        let album = envelope.response.song.album.unwrap();
        assert_eq!(album.name.as_deref(), Some("Ys"));
    }

    #[test]
    fn test_select_artist_prefers_exact_match() {
        let hits = vec![hit(1, "Joni Mitchell & Friends"), hit(2, "joni mitchell")];
        let artist = select_artist(hits, "Joni Mitchell").unwrap();
        assert_eq!(artist.id, 2);
    }

    #[test]
    fn test_select_artist_falls_back_to_first_hit() {
        let hits = vec![hit(5, "Tori Amos & Band"), hit(6, "Someone Else")];
        assert_eq!(select_artist(hits, "Tori Amos").unwrap().id, 5);
        assert!(select_artist(Vec::new(), "Tori Amos").is_none());
    }

    #[test]
    fn test_filter_drops_features_and_excluded_terms() {
        let filter = SongFilter::new(&GeniusOptions::default()).unwrap();
        assert!(filter.accepts(&song(1, "Cosmia", 42), 42));
        assert!(!filter.accepts(&song(2, "Guest Verse", 99), 42));
        assert!(!filter.accepts(&song(3, "Cosmia (Live)", 42), 42));
        assert!(!filter.accepts(&song(4, "Cosmia (REMIX)", 42), 42));
        // Terms match literally, so a bare "Live" in a title is kept.
        assert!(filter.accepts(&song(5, "Live Forever", 42), 42));
    }

    #[test]
    fn test_filter_skips_non_songs() {
        let filter = SongFilter::new(&GeniusOptions::default()).unwrap();
        assert!(!filter.accepts(&song(1, "Ys (Tracklist)", 42), 42));
        assert!(!filter.accepts(&song(2, "Liner Notes", 42), 42));

        let mut unreleased = song(3, "Unfinished", 42);
        unreleased.lyrics_state = Some("unreleased".to_string());
        assert!(!filter.accepts(&unreleased, 42));

        let lenient = SongFilter::new(&GeniusOptions {
            skip_non_songs: false,
            ..GeniusOptions::default()
        })
        .unwrap();
        assert!(lenient.accepts(&unreleased, 42));
        assert!(lenient.accepts(&song(4, "Liner Notes", 42), 42));
    }

    #[test]
    fn test_extract_lyrics_from_page() {
        let html = r#"<html><body>
            <div class="header">Emily Lyrics</div>
            <div data-lyrics-container="true" class="Lyrics__Container">
                <div data-exclude-from-selection="true"><span>12 Contributors</span><div>Emily Lyrics</div></div>[Verse 1]<br/>The meadowlark &amp; the<br>chirruping <a href="/x"><span>frog</span></a><br/><br/>[Chorus]<br/>Don&#x27;t you know
            </div>
            <div class="footer">Embed</div>
        </body></html>"#;

        let extractor = LyricsExtractor::new(true).unwrap();
        let lyrics = extractor.extract(html).unwrap();
        assert_eq!(
            lyrics,
            "The meadowlark & the\nchirruping frog\nDon't you know"
        );
    }

    #[test]
    fn test_extract_keeps_headers_when_asked() {
        let html = r#"<div data-lyrics-container="true">[Intro]<br/>la la</div>"#;
        let extractor = LyricsExtractor::new(false).unwrap();
        assert_eq!(extractor.extract(html).unwrap(), "[Intro]\nla la");
    }

    #[test]
    fn test_extract_joins_multiple_containers() {
        let html = r#"<div data-lyrics-container="true">one</div><p>ad</p><div data-lyrics-container="true">two</div>"#;
        let extractor = LyricsExtractor::new(true).unwrap();
        assert_eq!(extractor.extract(html).unwrap(), "one\ntwo");
    }

    #[test]
    fn test_extract_without_container_is_none() {
        let extractor = LyricsExtractor::new(true).unwrap();
        assert!(extractor
            .extract("<div>This song is an instrumental</div>")
            .is_none());
    }

    #[test]
    fn test_decode_entities() {
        let extractor = LyricsExtractor::new(true).unwrap();
        assert_eq!(
            extractor.decode_entities("&quot;hi&quot; &#39;you&#39; &amp;lt;3"),
            "\"hi\" 'you' &lt;3"
        );
    }
}
