// File acquisition: turns a picker result into the current selection
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Extensions offered in the file dialog. Decoding does not depend on them.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "ogg", "wav", "m4a", "aac", "mp4",
];

/// Where the selected file's bytes can be fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLocation(PathBuf);

impl FileLocation {
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Lowercase extension, passed to the decoder as a format hint
    pub fn extension_hint(&self) -> Option<String> {
        self.0
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    pub async fn fetch(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.0).await?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    location: FileLocation,
    display_name: String,
}

impl SelectedFile {
    /// Take the first chosen file; `None` when the picker returned nothing
    pub fn from_choices(choices: &[PathBuf]) -> Option<Self> {
        let path = choices.first()?;
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        Some(Self {
            location: FileLocation(path.clone()),
            display_name,
        })
    }

    pub fn location(&self) -> &FileLocation {
        &self.location
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_choice_wins() {
        let choices = vec![PathBuf::from("/music/Track.MP3"), PathBuf::from("/music/b.wav")];
        let file = SelectedFile::from_choices(&choices).unwrap();
        assert_eq!(file.display_name(), "Track.MP3");
        assert_eq!(file.location().extension_hint().as_deref(), Some("mp3"));
    }

    #[test]
    fn empty_choice_selects_nothing() {
        assert!(SelectedFile::from_choices(&[]).is_none());
    }

    #[tokio::test]
    async fn fetch_reads_file_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        std::fs::write(&path, b"RIFF").unwrap();

        let file = SelectedFile::from_choices(&[path]).unwrap();
        assert_eq!(file.location().fetch().await.unwrap(), b"RIFF".to_vec());
    }
}
