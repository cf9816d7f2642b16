//! Configuration types for the media sorter

use crate::error::{Error, Result};
use crate::time::ZonePolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Extension family a supported file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFamily {
    /// Still images (jpg, png, heic, ...)
    Image,
    /// Video containers (mp4, mov, ...)
    Video,
}

/// Configuration for one sorting run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory tree to scan for media files
    pub input_dir: PathBuf,

    /// Root under which the `IMG` and `RND` folders are placed
    pub output_dir: PathBuf,

    /// Directory receiving a copy of every original before it is moved
    pub backup_dir: Option<PathBuf>,

    /// Copy originals to `backup_dir` before moving them
    pub backup: bool,

    /// Remove directories of the input tree that end up empty
    pub clean_empty: bool,

    /// Dry run mode - log what would happen without touching any file
    pub dry_run: bool,

    /// Verbose output
    pub verbose: bool,

    /// Zone assumed for timestamps that carry no offset:
    /// "local", "utc" or a fixed offset such as "+09:00"
    pub timezone: String,

    /// Program used to read container metadata
    pub ffprobe: PathBuf,

    /// Image extensions (EXIF, then container metadata)
    pub image_extensions: Vec<String>,

    /// Video extensions (container metadata only)
    pub video_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            output_dir: PathBuf::from("output"),
            backup_dir: None,
            backup: true,
            clean_empty: false,
            dry_run: false,
            verbose: false,
            timezone: "local".into(),
            ffprobe: PathBuf::from("ffprobe"),
            image_extensions: vec![
                "jpg".into(), "jpeg".into(), "png".into(), "heic".into(), "heif".into(),
            ],
            video_extensions: vec!["mov".into(), "mp4".into(), "avi".into(), "mkv".into()],
        }
    }
}

impl Config {
    /// Check if a file extension is a supported image format
    pub fn is_image(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.image_extensions.iter().any(|e| e == &ext_lower)
    }

    /// Check if a file extension is a supported video format
    pub fn is_video(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.video_extensions.iter().any(|e| e == &ext_lower)
    }

    /// Check if a file extension is supported
    pub fn is_supported(&self, ext: &str) -> bool {
        self.is_image(ext) || self.is_video(ext)
    }

    /// Get the extension family of a path, if it has a supported extension
    pub fn family_of(&self, path: &Path) -> Option<MediaFamily> {
        let ext = path.extension().and_then(|e| e.to_str())?;
        if self.is_image(ext) {
            Some(MediaFamily::Image)
        } else if self.is_video(ext) {
            Some(MediaFamily::Video)
        } else {
            None
        }
    }

    /// Backup directory, if backups are enabled
    pub fn active_backup_dir(&self) -> Option<&Path> {
        if self.backup {
            self.backup_dir.as_deref()
        } else {
            None
        }
    }

    /// Parse the configured timezone into a zone policy
    pub fn zone_policy(&self) -> Result<ZonePolicy> {
        ZonePolicy::parse(&self.timezone)
    }

    /// Check the rules a run cannot start without
    pub fn validate(&self) -> Result<()> {
        if self.input_dir.as_os_str().is_empty() {
            return Err(Error::Config("no input directory given".into()));
        }
        if self.backup && self.backup_dir.is_none() {
            return Err(Error::Config(
                "a backup directory is required unless backups are disabled".into(),
            ));
        }
        if normalize_path(&self.output_dir).starts_with(normalize_path(&self.input_dir)) {
            return Err(Error::Config(format!(
                "output directory {} is inside input directory {}",
                self.output_dir.display(),
                self.input_dir.display()
            )));
        }
        self.zone_policy()?;
        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> std::result::Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError { source: e })?;

        fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Absolute form of `path` with its deepest existing ancestor canonicalized
///
/// Lets relative, `..` and symlinked spellings of the same folder compare
/// equal even when the tail does not exist yet.
fn normalize_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(canonical) = fs::canonicalize(existing) {
            return missing
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, part| acc.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return absolute,
        }
    }
}

/// Errors that can occur when loading or saving configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read configuration file
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse configuration file
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Failed to write configuration file
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to serialize configuration
    SerializeError { source: toml::ser::Error },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path.display(), source)
            }
            ConfigError::ParseError { path, source } => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), source)
            }
            ConfigError::WriteError { path, source } => {
                write!(f, "Failed to write config file '{}': {}", path.display(), source)
            }
            ConfigError::SerializeError { source } => {
                write!(f, "Failed to serialize config: {}", source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::WriteError { source, .. } => Some(source),
            ConfigError::SerializeError { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_family_of() {
        let config = Config::default();
        assert_eq!(config.family_of(Path::new("a/B.JPG")), Some(MediaFamily::Image));
        assert_eq!(config.family_of(Path::new("clip.mkv")), Some(MediaFamily::Video));
        assert_eq!(config.family_of(Path::new("notes.txt")), None);
        assert_eq!(config.family_of(Path::new("README")), None);
    }

    #[test]
    fn test_validate_requires_backup_dir() {
        let mut config = Config {
            input_dir: PathBuf::from("/in"),
            output_dir: PathBuf::from("/out"),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        config.backup = false;
        assert!(config.validate().is_ok());

        config.backup = true;
        config.backup_dir = Some(PathBuf::from("/bak"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_output_inside_input() {
        let config = Config {
            input_dir: PathBuf::from("/in"),
            output_dir: PathBuf::from("/in/sorted"),
            backup: false,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_timezone() {
        let config = Config {
            input_dir: PathBuf::from("/in"),
            output_dir: PathBuf::from("/out"),
            backup: false,
            timezone: "Mars/Olympus".into(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidTimezone(_))));
    }

    #[test]
    fn test_validate_rejects_output_inside_input_spelled_differently() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in");
        fs::create_dir_all(&input).unwrap();

        let dotted = Config {
            input_dir: input.clone(),
            output_dir: input.join("..").join("in").join("sorted"),
            backup: false,
            ..Config::default()
        };
        assert!(matches!(dotted.validate(), Err(Error::Config(_))));

        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&input, &link).unwrap();
        let linked = Config {
            output_dir: link.join("sorted"),
            ..dotted.clone()
        };
        assert!(matches!(linked.validate(), Err(Error::Config(_))));

        let sibling = Config {
            output_dir: dir.path().join("out"),
            ..dotted
        };
        assert!(sibling.validate().is_ok());
    }

    #[test]
    fn test_validate_compares_relative_input_with_absolute_output() {
        let cwd = std::env::current_dir().unwrap();
        let config = Config {
            input_dir: PathBuf::from("not-created-input"),
            output_dir: cwd.join("not-created-input").join("sorted"),
            backup: false,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf").join("sorter.toml");
        let config = Config {
            input_dir: PathBuf::from("/photos"),
            timezone: "+09:00".into(),
            ..Config::default()
        };
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.input_dir, PathBuf::from("/photos"));
        assert_eq!(loaded.timezone, "+09:00");
        assert!(loaded.backup);
    }
}
