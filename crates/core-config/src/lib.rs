//! Configuration loading and parsing.
//!
//! Parses `kbmacro.toml` (or an override path provided by the binary). Every
//! section and field is optional; unknown fields are ignored so older config
//! files keep loading. A missing file or a parse error falls back to
//! defaults rather than failing startup.
//!
//! ```toml
//! [sync]
//! timeout_ms = 200          # how long a command waits for its selection event
//!
//! [replay]
//! sync_retries = 5          # post-step waits before forcing a re-sync
//! sync_interval_ms = 20
//!
//! [classifier]
//! strict_outdent = false    # require whitespace-only outdent diffs
//!
//! [host]
//! indent_unit = "    "
//! auto_close_brackets = true
//! ```

use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::info;

pub const CONFIG_FILE_NAME: &str = "kbmacro.toml";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    #[serde(default = "SyncConfig::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Self::default_timeout_ms(),
        }
    }
}

impl SyncConfig {
    const fn default_timeout_ms() -> u64 {
        200
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ReplayConfig {
    #[serde(default = "ReplayConfig::default_sync_retries")]
    pub sync_retries: u32,
    #[serde(default = "ReplayConfig::default_sync_interval_ms")]
    pub sync_interval_ms: u64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            sync_retries: Self::default_sync_retries(),
            sync_interval_ms: Self::default_sync_interval_ms(),
        }
    }
}

impl ReplayConfig {
    const fn default_sync_retries() -> u32 {
        5
    }
    const fn default_sync_interval_ms() -> u64 {
        20
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// When set, an outdent is only recognized if every diff's replacement
    /// text is whitespace. Off by default: the removed text is not checked.
    #[serde(default)]
    pub strict_outdent: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct HostConfig {
    #[serde(default = "HostConfig::default_indent_unit")]
    pub indent_unit: String,
    #[serde(default = "HostConfig::default_auto_close")]
    pub auto_close_brackets: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            indent_unit: Self::default_indent_unit(),
            auto_close_brackets: Self::default_auto_close(),
        }
    }
}

impl HostConfig {
    fn default_indent_unit() -> String {
        "    ".to_string()
    }
    const fn default_auto_close() -> bool {
        true
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub host: HostConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub file: ConfigFile, // parsed (or default) data, clamped
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("kbmacro").join(CONFIG_FILE_NAME);
    }
    PathBuf::from(CONFIG_FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        info!(target: "config", path = %path.display(), "config_missing_using_defaults");
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(target: "config", path = %path.display(), size_bytes = content.len(), "config_loaded");
            let mut cfg = Config { file };
            cfg.clamp();
            Ok(cfg)
        }
        Err(e) => {
            info!(target: "config", path = %path.display(), error = %e, "config_parse_failed_using_defaults");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// Parse a config from an in-memory TOML string (tests, embedded scenarios).
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file = toml::from_str::<ConfigFile>(content)?;
        let mut cfg = Config { file };
        cfg.clamp();
        Ok(cfg)
    }

    /// Enforce lower bounds that keep sync waits and replay progress meaningful.
    fn clamp(&mut self) {
        if self.file.sync.timeout_ms == 0 {
            info!(target: "config", raw = 0, clamped = 1, "sync_timeout_clamped");
            self.file.sync.timeout_ms = 1;
        }
        if self.file.replay.sync_retries == 0 {
            info!(target: "config", raw = 0, clamped = 1, "replay_sync_retries_clamped");
            self.file.replay.sync_retries = 1;
        }
        if self.file.host.indent_unit.is_empty()
            || !self.file.host.indent_unit.chars().all(|c| c == ' ' || c == '\t')
        {
            info!(target: "config", "indent_unit_invalid_using_default");
            self.file.host.indent_unit = HostConfig::default_indent_unit();
        }
    }

    pub fn sync(&self) -> &SyncConfig {
        &self.file.sync
    }

    pub fn replay(&self) -> &ReplayConfig {
        &self.file.replay
    }

    pub fn classifier(&self) -> &ClassifierConfig {
        &self.file.classifier
    }

    pub fn host(&self) -> &HostConfig {
        &self.file.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.sync().timeout_ms, 200);
        assert_eq!(cfg.replay().sync_retries, 5);
        assert_eq!(cfg.replay().sync_interval_ms, 20);
        assert!(!cfg.classifier().strict_outdent);
        assert_eq!(cfg.host().indent_unit, "    ");
        assert!(cfg.host().auto_close_brackets);
    }

    #[test]
    fn parses_partial_sections() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[sync]\ntimeout_ms = 50\n[classifier]\nstrict_outdent = true\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.sync().timeout_ms, 50);
        assert_eq!(cfg.sync().timeout(), Duration::from_millis(50));
        assert!(cfg.classifier().strict_outdent);
        // untouched sections keep defaults
        assert_eq!(cfg.replay().sync_retries, 5);
    }

    #[test]
    fn parse_error_falls_back_to_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[sync\ntimeout_ms = ").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file, ConfigFile::default());
    }

    #[test]
    fn zero_values_are_clamped() {
        let cfg = Config::from_toml_str(
            "[sync]\ntimeout_ms = 0\n[replay]\nsync_retries = 0\n[host]\nindent_unit = \"x\"\n",
        )
        .unwrap();
        assert_eq!(cfg.sync().timeout_ms, 1);
        assert_eq!(cfg.replay().sync_retries, 1);
        assert_eq!(cfg.host().indent_unit, "    ");
    }

    #[test]
    fn tab_indent_unit_is_accepted() {
        let cfg = Config::from_toml_str("[host]\nindent_unit = \"\\t\"\nauto_close_brackets = false\n")
            .unwrap();
        assert_eq!(cfg.host().indent_unit, "\t");
        assert!(!cfg.host().auto_close_brackets);
    }

    #[test]
    fn clamp_logging_uses_config_target() {
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        let cfg = with_default(subscriber, || {
            Config::from_toml_str("[sync]\ntimeout_ms = 0\n").unwrap()
        });

        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("INFO config:"));
        assert!(log_output.contains("sync_timeout_clamped"));
        assert_eq!(cfg.sync().timeout_ms, 1);
    }

    #[test]
    fn loaded_file_is_logged_with_its_size() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let content = "[sync]\ntimeout_ms = 75\n";
        std::fs::write(tmp.path(), content).unwrap();
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        let cfg = with_default(subscriber, || load_from(Some(tmp.path().to_path_buf())).unwrap());

        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("config_loaded"));
        assert!(log_output.contains(&format!("size_bytes={}", content.len())));
        assert_eq!(cfg.sync().timeout_ms, 75);
    }
}
