use serde::{Deserialize, Serialize};

/// A request to collect up to `max_songs` songs for one artist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRequest {
    pub name: String,
    pub max_songs: usize,
}

impl ArtistRequest {
    /// Build a request. A `max_songs` of zero is raised to one.
    #[must_use]
    pub fn new(name: impl Into<String>, max_songs: usize) -> Self {
        Self {
            name: name.into(),
            max_songs: max_songs.max(1),
        }
    }

    /// Build one request per roster entry, all with the same song cap.
    #[must_use]
    pub fn roster<S: AsRef<str>>(names: &[S], max_songs: usize) -> Vec<Self> {
        names
            .iter()
            .map(|name| Self::new(name.as_ref(), max_songs))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artist_request_new() {
        let request = ArtistRequest::new("Kate Bush", 5);
        assert_eq!(request.name, "Kate Bush");
        assert_eq!(request.max_songs, 5);
    }

    #[test]
    fn test_artist_request_zero_songs_is_raised() {
        let request = ArtistRequest::new("Tori Amos", 0);
        assert_eq!(request.max_songs, 1);
    }

    #[test]
    fn test_roster_preserves_order() {
        let requests = ArtistRequest::roster(&["Fiona Apple", "Joni Mitchell"], 3);
        let names: Vec<&str> = requests.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Fiona Apple", "Joni Mitchell"]);
        assert!(requests.iter().all(|r| r.max_songs == 3));
    }
}
