//! 설정 관리 — matchlock.toml 파싱 및 런타임 설정
//!
//! [`MatchlockConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`MATCHLOCK_FEED_DIR=/feeds` 형식)
//! 2. 설정 파일 (`matchlock.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), matchlock_core::error::MatchlockError> {
//! use matchlock_core::config::MatchlockConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = MatchlockConfig::load("matchlock.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = MatchlockConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, MatchlockError};

/// Matchlock 통합 설정
///
/// `matchlock.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchlockConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 피드 인제스트 설정
    #[serde(default)]
    pub feed: FeedConfig,
    /// 디스크 캐시 설정
    #[serde(default)]
    pub cache: CacheConfig,
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 데이터 디렉토리 (캐시, 로컬 저장소의 루트)
    pub data_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            data_dir: "/var/lib/matchlock".to_owned(),
        }
    }
}

/// 피드 인제스트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// 피드 파일 디렉토리
    pub feed_dir: String,
    /// CPE 스코프 필터 — 이 접두어로 시작하는 술어를 하나라도 가진
    /// 엔트리만 저장소에 기록됩니다
    pub cpe_starts_with_filter: String,
    /// 동시에 파싱할 피드 파일 수
    pub parse_workers: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            feed_dir: "/var/lib/matchlock/feeds".to_owned(),
            cpe_starts_with_filter: "cpe:2.3:a:".to_owned(),
            parse_workers: 4,
        }
    }
}

/// 디스크 캐시 설정
///
/// 캐시 초기화에 필요한 베이스 디렉토리와 알려진 리전 목록입니다.
/// 전역 가변 상태 대신 이 구조체를 캐시 팩토리에 명시적으로 주입합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 캐시 베이스 디렉토리 (`{data_dir}/cache` 권장)
    pub cache_dir: String,
    /// 초기화 시 디렉토리를 만들 리전 이름 목록
    pub regions: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: "/var/lib/matchlock/cache".to_owned(),
            regions: vec!["NODEAUDIT".to_owned(), "CENTRAL".to_owned()],
        }
    }
}

impl MatchlockConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, MatchlockError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, MatchlockError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MatchlockError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                MatchlockError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, MatchlockError> {
        toml::from_str(toml_str).map_err(|e| {
            MatchlockError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `MATCHLOCK_{SECTION}_{FIELD}`
    /// 예: `MATCHLOCK_FEED_FEED_DIR=/mnt/feeds`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "MATCHLOCK_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.data_dir, "MATCHLOCK_GENERAL_DATA_DIR");

        // Feed
        override_string(&mut self.feed.feed_dir, "MATCHLOCK_FEED_FEED_DIR");
        override_string(
            &mut self.feed.cpe_starts_with_filter,
            "MATCHLOCK_FEED_CPE_STARTS_WITH_FILTER",
        );
        override_usize(&mut self.feed.parse_workers, "MATCHLOCK_FEED_PARSE_WORKERS");

        // Cache
        override_string(&mut self.cache.cache_dir, "MATCHLOCK_CACHE_CACHE_DIR");
        override_csv(&mut self.cache.regions, "MATCHLOCK_CACHE_REGIONS");
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `general.log_level`: trace/debug/info/warn/error 중 하나
    /// - `feed.cpe_starts_with_filter`: `cpe:` 접두어 필수
    /// - `feed.parse_workers`: 1-64
    /// - `cache.regions`: 비어있지 않은 이름만 허용
    pub fn validate(&self) -> Result<(), MatchlockError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        if self.general.data_dir.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "general.data_dir".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if !self.feed.cpe_starts_with_filter.starts_with("cpe:") {
            return Err(ConfigError::InvalidValue {
                field: "feed.cpe_starts_with_filter".to_owned(),
                reason: "must start with 'cpe:'".to_owned(),
            }
            .into());
        }

        const MAX_PARSE_WORKERS: usize = 64;
        if self.feed.parse_workers == 0 || self.feed.parse_workers > MAX_PARSE_WORKERS {
            return Err(ConfigError::InvalidValue {
                field: "feed.parse_workers".to_owned(),
                reason: format!("must be 1-{MAX_PARSE_WORKERS}"),
            }
            .into());
        }

        if self.cache.cache_dir.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "cache.cache_dir".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        for region in &self.cache.regions {
            if region.is_empty() || !region.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(ConfigError::InvalidValue {
                    field: "cache.regions".to_owned(),
                    reason: format!("invalid region name '{region}'"),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// 환경변수가 설정되어 있으면 문자열 필드를 덮어씁니다.
fn override_string(field: &mut String, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        *field = value;
    }
}

/// 환경변수가 설정되어 있으면 usize 필드를 덮어씁니다.
///
/// 파싱에 실패하면 경고를 남기고 기존 값을 유지합니다.
fn override_usize(field: &mut usize, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse() {
            Ok(parsed) => *field = parsed,
            Err(_) => {
                tracing::warn!(env = env_key, value = %value, "invalid usize in env override, keeping default");
            }
        }
    }
}

/// 환경변수가 설정되어 있으면 쉼표 구분 목록 필드를 덮어씁니다.
fn override_csv(field: &mut Vec<String>, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        *field = value
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
