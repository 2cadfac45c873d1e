use std::{collections::BTreeSet, path::Path};

use crate::{
    content::{AssetRef, SiteContent},
    PortfolioError, Result,
};

/// Registry of the public assets available to the page.
#[derive(Debug, Default)]
pub struct AssetStore {
    assets: BTreeSet<String>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self {
            assets: BTreeSet::new(),
        }
    }

    /// Registers every file below `root`, keyed by its path relative to
    /// `root` with `/` separators.
    pub fn from_dir(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let mut store = Self::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            for entry in std::fs::read_dir(&dir)? {
                let entry = entry?;
                let path = entry.path();
                // Symlinked directories are not followed.
                if entry.file_type()?.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(root) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|part| part.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                store.register(AssetRef::new(key));
            }
        }

        tracing::debug!(root = %root.display(), assets = store.len(), "indexed public assets");
        Ok(store)
    }

    pub fn register(&mut self, asset: AssetRef) {
        self.assets.insert(normalize(asset.as_str()).to_string());
    }

    pub fn contains(&self, asset: &AssetRef) -> bool {
        self.assets.contains(normalize(asset.as_str()))
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Every content reference that has no registered asset, in display order.
    pub fn missing<'a>(&self, content: &'a SiteContent) -> Vec<&'a AssetRef> {
        content
            .asset_refs()
            .into_iter()
            .filter(|asset| !self.contains(asset))
            .collect()
    }

    /// Fails on the first content reference with no registered asset.
    pub fn resolve_content_assets(&self, content: &SiteContent) -> Result<()> {
        match self.missing(content).first() {
            Some(asset) => Err(PortfolioError::UnknownAsset(asset.to_string())),
            None => Ok(()),
        }
    }
}

fn normalize(path: &str) -> &str {
    path.trim_start_matches("./").trim_start_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content() -> SiteContent {
        SiteContent::builtin().unwrap()
    }

    fn store_for(content: &SiteContent) -> AssetStore {
        let mut store = AssetStore::new();
        for asset in content.asset_refs() {
            store.register(asset.clone());
        }
        store
    }

    #[test]
    fn resolves_registered_assets() {
        let content = content();
        let store = store_for(&content);
        assert!(store.resolve_content_assets(&content).is_ok());
        assert!(store.missing(&content).is_empty());
    }

    #[test]
    fn errors_on_missing_assets() {
        let content = content();
        let mut store = AssetStore::new();
        store.register(content.profile.headshot.clone());

        let err = store.resolve_content_assets(&content).unwrap_err();
        let missing = content.asset_refs()[1].to_string();
        assert!(matches!(err, PortfolioError::UnknownAsset(ref asset) if *asset == missing));
        assert_eq!(store.missing(&content).len(), content.asset_refs().len() - 1);
    }

    #[test]
    fn leading_dot_slash_is_ignored() {
        let mut store = AssetStore::new();
        store.register(AssetRef::new("./images/logo.png"));
        assert!(store.contains(&AssetRef::new("images/logo.png")));
        assert!(store.contains(&AssetRef::new("/images/logo.png")));
    }

    #[test]
    fn indexes_directory_tree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("projects")).unwrap();
        std::fs::write(dir.path().join("headshot.png"), b"png").unwrap();
        std::fs::write(dir.path().join("projects").join("one.jpg"), b"jpg").unwrap();

        let store = AssetStore::from_dir(dir.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.contains(&AssetRef::new("headshot.png")));
        assert!(store.contains(&AssetRef::new("projects/one.jpg")));
        assert!(!store.contains(&AssetRef::new("projects")));
    }

    #[cfg(unix)]
    #[test]
    fn directory_symlinks_are_not_walked() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("headshot.png"), b"png").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();

        let store = AssetStore::from_dir(dir.path()).unwrap();
        assert!(store.contains(&AssetRef::new("headshot.png")));
        assert!(!store.contains(&AssetRef::new("loop/headshot.png")));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AssetStore::from_dir(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, PortfolioError::Io(_)));
    }
}
