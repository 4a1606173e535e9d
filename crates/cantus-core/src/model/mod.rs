pub mod artist;
pub mod collection;
pub mod song;

pub use artist::ArtistRequest;
pub use collection::{ArtistCollectionResult, CollectionStatus};
pub use song::{SongMetadata, SongRecord};
