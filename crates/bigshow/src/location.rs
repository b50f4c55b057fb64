//! The position token: the current slide index kept in a small text file so
//! a restarted or second process can pick up where the talk is.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const APP_DIR: &str = "bigshow";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionFile {
    path: PathBuf,
}

impl PositionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<cache dir>/bigshow/<deck stem>.position`
    pub fn for_deck(deck: &Path) -> Result<Self> {
        let stem = deck
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "deck".to_string());
        let dir = dirs::cache_dir().ok_or(Error::NoDirectory("cache"))?;
        Ok(Self::new(dir.join(APP_DIR).join(format!("{stem}.position"))))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored index, if the file exists and holds a valid token.
    pub fn read(&self) -> Option<usize> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        let token = parse_token(&contents);
        if token.is_none() {
            log::debug!("ignoring position token {:?}", contents.trim());
        }
        token
    }

    pub fn write(&self, index: usize) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| Error::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, format!("#{index}\n")).map_err(|source| Error::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Parse `#N` or `N` into a slide index.
pub fn parse_token(token: &str) -> Option<usize> {
    let token = token.trim();
    token.strip_prefix('#').unwrap_or(token).parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token() {
        assert_eq!(parse_token("#3"), Some(3));
        assert_eq!(parse_token(" 12\n"), Some(12));
        assert_eq!(parse_token("#"), None);
        assert_eq!(parse_token("#-1"), None);
        assert_eq!(parse_token("slide"), None);
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let file = PositionFile::new(dir.path().join("nested").join("talk.position"));
        assert_eq!(file.read(), None);
        file.write(4).unwrap();
        assert_eq!(file.read(), Some(4));
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "#4\n");
    }

    #[test]
    fn test_garbage_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("talk.position");
        std::fs::write(&path, "not a number").unwrap();
        assert_eq!(PositionFile::new(path).read(), None);
    }

    #[test]
    fn test_write_error_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let file = PositionFile::new(blocker.join("talk.position"));
        let err = file.write(1).unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
    }
}
