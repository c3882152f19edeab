use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Global configuration loaded from `~/.config/vdm/config.toml`.
///
/// Built once at startup and passed by reference into the scheduler, store,
/// and extractor; there is no ambient global.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VdmConfig {
    /// Directory where finished artifacts land. `None` means
    /// `$HOME/VideoDownloads`.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Maximum number of download jobs running at once. Submissions beyond
    /// this wait in the admission queue; the submit call itself never blocks.
    pub max_concurrent_jobs: usize,
    /// Name or path of the extraction engine binary.
    pub ytdlp_bin: String,
    /// Timeout for the metadata-only probe, in seconds.
    pub probe_timeout_secs: u64,
    /// Timeout for the whole transfer, in seconds. The engine process is
    /// killed when it expires.
    pub transfer_timeout_secs: u64,
}

impl Default for VdmConfig {
    fn default() -> Self {
        Self {
            download_dir: None,
            max_concurrent_jobs: 4,
            ytdlp_bin: "yt-dlp".to_string(),
            probe_timeout_secs: 30,
            transfer_timeout_secs: 3600,
        }
    }
}

impl VdmConfig {
    /// Effective download directory: the configured one, or `$HOME/VideoDownloads`.
    pub fn resolved_download_dir(&self) -> PathBuf {
        if let Some(dir) = &self.download_dir {
            return dir.clone();
        }
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("VideoDownloads")
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vdm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<VdmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = VdmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: VdmConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = VdmConfig::default();
        assert_eq!(cfg.max_concurrent_jobs, 4);
        assert_eq!(cfg.ytdlp_bin, "yt-dlp");
        assert_eq!(cfg.probe_timeout_secs, 30);
        assert_eq!(cfg.transfer_timeout_secs, 3600);
        assert!(cfg.download_dir.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = VdmConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: VdmConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.max_concurrent_jobs, cfg.max_concurrent_jobs);
        assert_eq!(parsed.ytdlp_bin, cfg.ytdlp_bin);
        assert_eq!(parsed.transfer_timeout_secs, cfg.transfer_timeout_secs);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            download_dir = "/srv/media"
            max_concurrent_jobs = 2
            ytdlp_bin = "/usr/local/bin/yt-dlp"
            probe_timeout_secs = 10
            transfer_timeout_secs = 600
        "#;
        let cfg: VdmConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.download_dir.as_deref(), Some(std::path::Path::new("/srv/media")));
        assert_eq!(cfg.max_concurrent_jobs, 2);
        assert_eq!(cfg.ytdlp_bin, "/usr/local/bin/yt-dlp");
        assert_eq!(cfg.probe_timeout_secs, 10);
        assert_eq!(cfg.transfer_timeout_secs, 600);
    }

    #[test]
    fn resolved_download_dir_prefers_configured() {
        let cfg = VdmConfig {
            download_dir: Some(PathBuf::from("/data/videos")),
            ..VdmConfig::default()
        };
        assert_eq!(cfg.resolved_download_dir(), PathBuf::from("/data/videos"));
    }
}
