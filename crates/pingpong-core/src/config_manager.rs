//! 설정 파일 관리.
//!
//! `AppConfig`를 JSON 파일 하나로 보관한다. 파일이 없으면 기본값으로 만들고,
//! 기본 파일은 임시 파일에 쓴 뒤 교체하여 중간 상태가 남지 않게 한다.

use crate::config::AppConfig;
use crate::error::CoreError;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CONFIG_FILE_NAME: &str = "config.json";

/// 로드된 설정 파일
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
    config: AppConfig,
}

impl ConfigManager {
    /// 플랫폼 설정 디렉토리의 `config.json` 열기
    pub fn open_default() -> Result<Self, CoreError> {
        Self::open(Self::default_path()?)
    }

    /// 지정한 파일 열기. 없으면 기본 설정으로 생성한다.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let config = if path.exists() {
            read_config(&path)?
        } else {
            let config = AppConfig::default_config();
            write_config(&path, &config)?;
            info!("기본 설정 파일 생성: {}", path.display());
            config
        };

        Ok(Self { path, config })
    }

    /// 설정 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 파일에서 읽은 설정
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 플랫폼별 기본 설정 파일 경로
    ///
    /// - Linux: `~/.config/dashboard/config.json`
    /// - macOS: `~/Library/Application Support/dev.pingpong.dashboard/config.json`
    /// - Windows: `%APPDATA%\pingpong\dashboard\config\config.json`
    pub fn default_path() -> Result<PathBuf, CoreError> {
        ProjectDirs::from("dev", "pingpong", "dashboard")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
            .ok_or_else(|| CoreError::Config("홈 디렉토리를 찾을 수 없습니다".to_string()))
    }
}

fn read_config(path: &Path) -> Result<AppConfig, CoreError> {
    let content = fs::read_to_string(path)?;
    let config = serde_json::from_str(&content)?;
    debug!("설정 파일 로드: {}", path.display());
    Ok(config)
}

fn write_config(path: &Path, config: &AppConfig) -> Result<(), CoreError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let staging = path.with_extension("json.tmp");
    fs::write(&staging, serde_json::to_vec_pretty(config)?)?;
    fs::rename(&staging, path)?;
    Ok(())
}
