//! Album item identity, filename derivation, and the transient download task.

use std::sync::LazyLock;

use regex::Regex;

/// Extension used for every downloaded asset.
pub const ASSET_EXTENSION: &str = ".jpg";

#[allow(clippy::expect_used)]
static PHOTO_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/photos/([^/]+)/(\d+)").expect("photo path regex is valid")
});

/// Stable identity of an album item, taken from its detail-page URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhotoId {
    /// Account segment of the detail URL (user name or numeric NSID).
    pub owner: String,
    /// Numeric photo id.
    pub id: String,
}

impl PhotoId {
    /// Extracts `(owner, id)` from a detail-page URL such as
    /// `https://www.flickr.com/photos/someone/53211234567/in/album-721.../`.
    ///
    /// Returns `None` when the URL does not contain a `/photos/{owner}/{id}` segment.
    #[must_use]
    pub fn from_detail_url(url: &str) -> Option<Self> {
        let captures = PHOTO_PATH.captures(url)?;
        Some(Self {
            owner: captures[1].to_string(),
            id: captures[2].to_string(),
        })
    }
}

/// One gallery card extracted from an album page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumItem {
    pub title: String,
    pub detail_url: String,
    pub photo: PhotoId,
    pub filename: String,
}

impl AlbumItem {
    /// Builds an item from a card's title and detail link.
    ///
    /// Returns `None` when the link carries no photo id; such cards cannot be
    /// given a deterministic filename and are skipped by the crawler.
    #[must_use]
    pub fn from_card(title: &str, detail_url: &str) -> Option<Self> {
        let photo = PhotoId::from_detail_url(detail_url)?;
        let filename = derive_filename(title, &photo.id);
        Some(Self {
            title: title.to_string(),
            detail_url: detail_url.to_string(),
            photo,
            filename,
        })
    }
}

/// Derives the on-disk filename for an item: `{sanitized title}_{photo id}.jpg`.
///
/// This is the resume key, so it must stay a pure function of title and id.
#[must_use]
pub fn derive_filename(title: &str, photo_id: &str) -> String {
    format!("{}_{photo_id}{ASSET_EXTENSION}", sanitize_title(title))
}

/// Replaces characters that are invalid in filenames on common platforms with `_`.
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect()
}

/// A unit of work for the download pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// Direct asset URL.
    pub url: String,
    /// Target filename inside the output directory.
    pub filename: String,
    /// Global discovery order, used for progress display only.
    pub sequence: u64,
}

impl DownloadTask {
    #[must_use]
    pub fn new(url: impl Into<String>, filename: impl Into<String>, sequence: u64) -> Self {
        Self {
            url: url.into(),
            filename: filename.into(),
            sequence,
        }
    }
}
