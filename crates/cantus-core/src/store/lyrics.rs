use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::model::SongRecord;
use crate::sanitize::sanitize;

const LYRICS_DIR: &str = "lyrics";
const METADATA_DIR: &str = "metadata";

/// Paths of the two files written for one song.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedPaths {
    pub lyrics: PathBuf,
    pub metadata: PathBuf,
}

/// Number of lyrics files stored for one artist directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistInventory {
    pub artist: String,
    pub songs: usize,
}

/// On-disk store for lyrics bodies and their metadata sidecars.
///
/// Layout under `root`:
///
/// ```text
/// lyrics/<artist>/<title>.txt
/// metadata/<artist>/<title>.json
/// ```
///
/// Both path components are [`sanitize`]d. Writes overwrite any existing
/// file with the same identifier.
#[derive(Debug, Clone)]
pub struct LyricsStore {
    root: PathBuf,
}

impl LyricsStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the lyrics files for `artist`.
    pub fn lyrics_dir(&self, artist: &str) -> Result<PathBuf> {
        Ok(self.root.join(LYRICS_DIR).join(identifier(artist)?))
    }

    /// Directory holding the metadata files for `artist`.
    pub fn metadata_dir(&self, artist: &str) -> Result<PathBuf> {
        Ok(self.root.join(METADATA_DIR).join(identifier(artist)?))
    }

    /// Write the lyrics body and the metadata sidecar for `record`.
    ///
    /// Both files are staged next to their targets and renamed into place
    /// only once both writes succeeded. On failure the staged files are
    /// removed and any pair from an earlier run is left as it was.
    pub fn persist(&self, record: &SongRecord) -> Result<PersistedPaths> {
        let title = identifier(&record.title)?;
        let lyrics_dir = self.lyrics_dir(&record.artist)?;
        let metadata_dir = self.metadata_dir(&record.artist)?;

        create_dir(&lyrics_dir)?;
        create_dir(&metadata_dir)?;

        let lyrics_path = lyrics_dir.join(format!("{title}.txt"));
        let metadata_path = metadata_dir.join(format!("{title}.json"));

        let metadata = serde_json::to_string_pretty(&record.metadata())?;

        let staged_lyrics = staging_path(&lyrics_path);
        let staged_metadata = staging_path(&metadata_path);

        let committed = write_file(&staged_lyrics, record.lyrics.as_bytes())
            .and_then(|()| write_file(&staged_metadata, metadata.as_bytes()))
            .and_then(|()| rename(&staged_metadata, &metadata_path))
            .and_then(|()| rename(&staged_lyrics, &lyrics_path));

        if let Err(e) = committed {
            discard(&staged_lyrics);
            discard(&staged_metadata);
            return Err(e);
        }

        log::debug!(
            "Persisted {} - {} to {}",
            record.artist,
            record.title,
            lyrics_path.display()
        );

        Ok(PersistedPaths {
            lyrics: lyrics_path,
            metadata: metadata_path,
        })
    }

    /// Count stored lyrics files per artist directory, sorted by artist.
    ///
    /// A missing store yields an empty inventory.
    pub fn inventory(&self) -> Result<Vec<ArtistInventory>> {
        let lyrics_root = self.root.join(LYRICS_DIR);
        if !lyrics_root.exists() {
            return Ok(Vec::new());
        }

        let mut inventory = Vec::new();
        for entry in WalkDir::new(&lyrics_root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| Error::InvalidData(e.to_string()))?;
            if !entry.file_type().is_dir() {
                continue;
            }

            let songs = WalkDir::new(entry.path())
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(std::result::Result::ok)
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "txt"))
                .count();

            inventory.push(ArtistInventory {
                artist: entry.file_name().to_string_lossy().into_owned(),
                songs,
            });
        }

        Ok(inventory)
    }
}

fn identifier(text: &str) -> Result<String> {
    let id = sanitize(text);
    if id.trim().is_empty() {
        return Err(Error::InvalidIdentifier(text.to_string()));
    }
    Ok(id)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn rename(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|source| Error::Write {
        path: to.to_path_buf(),
        source,
    })
}

/// `<path>.tmp`, the name a file is written under before it is committed.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn discard(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Could not remove staged file {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SongMetadata;
    use tempfile::TempDir;

    #[test]
    fn test_persist_writes_pair() {
        let temp_dir = TempDir::new().unwrap();
        let store = LyricsStore::new(temp_dir.path());
        let record = SongRecord::new(
            "Joanna Newsom",
            "Peach, Plum, Pear",
            Some("The Milk-Eyed Mender".to_string()),
            "hello world",
        );

        let paths = store.persist(&record).unwrap();

        assert_eq!(
            paths.lyrics,
            temp_dir
                .path()
                .join("lyrics/Joanna Newsom/Peach Plum Pear.txt")
        );
        assert_eq!(
            paths.metadata,
            temp_dir
                .path()
                .join("metadata/Joanna Newsom/Peach Plum Pear.json")
        );
        assert_eq!(fs::read_to_string(&paths.lyrics).unwrap(), "hello world");

        let metadata: SongMetadata =
            serde_json::from_str(&fs::read_to_string(&paths.metadata).unwrap()).unwrap();
        assert_eq!(metadata, record.metadata());
    }

    #[test]
    fn test_metadata_file_has_no_lyrics_body() {
        let temp_dir = TempDir::new().unwrap();
        let store = LyricsStore::new(temp_dir.path());
        let record = SongRecord::new("A", "Song", None, "secret words");

        let paths = store.persist(&record).unwrap();
        let raw = fs::read_to_string(&paths.metadata).unwrap();
        assert!(!raw.contains("secret words"));
        assert!(raw.contains('\n'), "metadata should be indented");
    }

    #[test]
    fn test_colliding_titles_last_write_wins() {
        let temp_dir = TempDir::new().unwrap();
        let store = LyricsStore::new(temp_dir.path());
        let first = SongRecord::new("Fiona Apple", "Hey?", None, "first version");
        let second = SongRecord::new("Fiona Apple", "Hey!", None, "second one here");

        let first_paths = store.persist(&first).unwrap();
        let second_paths = store.persist(&second).unwrap();

        assert_eq!(first_paths, second_paths);
        assert_eq!(
            fs::read_to_string(&second_paths.lyrics).unwrap(),
            "second one here"
        );
        let metadata: SongMetadata =
            serde_json::from_str(&fs::read_to_string(&second_paths.metadata).unwrap()).unwrap();
        assert_eq!(metadata.title, "Hey!");
        assert_eq!(metadata.lyrics_word_count, 3);
    }

    #[test]
    fn test_persist_is_idempotent_on_directories() {
        let temp_dir = TempDir::new().unwrap();
        let store = LyricsStore::new(temp_dir.path());
        store
            .persist(&SongRecord::new("Kate Bush", "Cloudbusting", None, "a"))
            .unwrap();
        store
            .persist(&SongRecord::new("Kate Bush", "Hounds of Love", None, "b"))
            .unwrap();

        let dir = store.lyrics_dir("Kate Bush").unwrap();
        assert_eq!(fs::read_dir(dir).unwrap().count(), 2);
    }

    #[test]
    fn test_persist_rejects_empty_identifier() {
        let temp_dir = TempDir::new().unwrap();
        let store = LyricsStore::new(temp_dir.path());
        let record = SongRecord::new("Tori Amos", "???", None, "x");

        let err = store.persist(&record).unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier(_)));
        assert!(!temp_dir.path().join("lyrics").exists());
    }

    #[test]
    fn test_persist_into_unwritable_root_fails() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let store = LyricsStore::new(&blocker);

        let err = store
            .persist(&SongRecord::new("A", "B", None, "c"))
            .unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
    }

    #[test]
    fn test_failed_metadata_write_leaves_no_lyrics() {
        let temp_dir = TempDir::new().unwrap();
        let store = LyricsStore::new(temp_dir.path());
        let blocked = temp_dir.path().join("metadata/A/Song.json");
        fs::create_dir_all(&blocked).unwrap();

        let err = store
            .persist(&SongRecord::new("A", "Song", None, "words"))
            .unwrap_err();

        assert!(matches!(err, Error::Write { .. }));
        let lyrics_dir = temp_dir.path().join("lyrics/A");
        assert!(!lyrics_dir.join("Song.txt").exists());
        assert!(!lyrics_dir.join("Song.txt.tmp").exists());
        assert!(!temp_dir.path().join("metadata/A/Song.json.tmp").exists());
    }

    #[test]
    fn test_failed_rewrite_keeps_previous_pair() {
        let temp_dir = TempDir::new().unwrap();
        let store = LyricsStore::new(temp_dir.path());
        let paths = store
            .persist(&SongRecord::new("A", "Song", None, "first take"))
            .unwrap();

        // A directory squatting on the staging name makes the next write fail.
        fs::create_dir_all(staging_path(&paths.metadata)).unwrap();
        let err = store
            .persist(&SongRecord::new("A", "Song", None, "second take here"))
            .unwrap_err();

        assert!(matches!(err, Error::Write { .. }));
        assert_eq!(fs::read_to_string(&paths.lyrics).unwrap(), "first take");
        let metadata: SongMetadata =
            serde_json::from_str(&fs::read_to_string(&paths.metadata).unwrap()).unwrap();
        assert_eq!(metadata.lyrics_word_count, 2);
        assert!(!staging_path(&paths.lyrics).exists());
    }

    #[test]
    fn test_inventory_counts_per_artist() {
        let temp_dir = TempDir::new().unwrap();
        let store = LyricsStore::new(temp_dir.path());
        for title in ["One", "Two", "Three"] {
            store
                .persist(&SongRecord::new("Sufjan Stevens", title, None, "x"))
                .unwrap();
        }
        store
            .persist(&SongRecord::new("Joni Mitchell", "River", None, "x"))
            .unwrap();

        let inventory = store.inventory().unwrap();
        assert_eq!(
            inventory,
            vec![
                ArtistInventory {
                    artist: "Joni Mitchell".to_string(),
                    songs: 1,
                },
                ArtistInventory {
                    artist: "Sufjan Stevens".to_string(),
                    songs: 3,
                },
            ]
        );
    }

    #[test]
    fn test_inventory_of_missing_store_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = LyricsStore::new(temp_dir.path().join("nowhere"));
        assert!(store.inventory().unwrap().is_empty());
    }
}
