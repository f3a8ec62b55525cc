//! 엔진 런타임 설정
//!
//! [`matchlock_core::config::MatchlockConfig`]의 피드·캐시 섹션을
//! 엔진이 실제로 쓰는 형태(경로 타입, 검증 완료)로 굳힌 것입니다.
//! 빌더의 `build()`는 검증을 통과한 값만 반환합니다.

use std::path::PathBuf;

use matchlock_core::config::MatchlockConfig;
use matchlock_core::error::ConfigError;

const MAX_PARSE_WORKERS: usize = 64;

/// 엔진 설정 — 생성은 [`EngineConfigBuilder`] 또는
/// [`EngineConfig::from_core`]를 통해서만
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 피드 파일(.json.gz) 디렉토리
    pub feed_dir: PathBuf,
    /// 스코프 필터 접두어
    pub cpe_starts_with_filter: String,
    /// 동시에 파싱할 피드 파일 수
    pub parse_workers: usize,
    /// 디스크 캐시 베이스 디렉토리
    pub cache_dir: PathBuf,
    /// 캐시 리전 이름 목록
    pub cache_regions: Vec<String>,
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// 통합 설정에서 엔진 설정을 만듭니다.
    pub fn from_core(config: &MatchlockConfig) -> Result<Self, ConfigError> {
        Self::builder()
            .feed_dir(&config.feed.feed_dir)
            .cpe_starts_with_filter(config.feed.cpe_starts_with_filter.as_str())
            .parse_workers(config.feed.parse_workers)
            .cache_dir(&config.cache.cache_dir)
            .cache_regions(config.cache.regions.clone())
            .build()
    }
}

/// [`EngineConfig`] 빌더
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    feed_dir: PathBuf,
    cpe_starts_with_filter: String,
    parse_workers: usize,
    cache_dir: PathBuf,
    cache_regions: Vec<String>,
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        let core = MatchlockConfig::default();
        Self {
            feed_dir: PathBuf::from(core.feed.feed_dir),
            cpe_starts_with_filter: core.feed.cpe_starts_with_filter,
            parse_workers: core.feed.parse_workers,
            cache_dir: PathBuf::from(core.cache.cache_dir),
            cache_regions: core.cache.regions,
        }
    }
}

impl EngineConfigBuilder {
    pub fn feed_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.feed_dir = dir.into();
        self
    }

    pub fn cpe_starts_with_filter(mut self, filter: impl Into<String>) -> Self {
        self.cpe_starts_with_filter = filter.into();
        self
    }

    pub fn parse_workers(mut self, workers: usize) -> Self {
        self.parse_workers = workers;
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn cache_regions(mut self, regions: Vec<String>) -> Self {
        self.cache_regions = regions;
        self
    }

    /// 설정값을 검증하고 [`EngineConfig`]를 생성합니다.
    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        if !self.cpe_starts_with_filter.starts_with("cpe:") {
            return Err(ConfigError::InvalidValue {
                field: "cpe_starts_with_filter".to_owned(),
                reason: "must start with 'cpe:'".to_owned(),
            });
        }
        if self.parse_workers == 0 || self.parse_workers > MAX_PARSE_WORKERS {
            return Err(ConfigError::InvalidValue {
                field: "parse_workers".to_owned(),
                reason: format!("must be 1-{MAX_PARSE_WORKERS}"),
            });
        }
        for region in &self.cache_regions {
            if region.is_empty() || !region.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(ConfigError::InvalidValue {
                    field: "cache_regions".to_owned(),
                    reason: format!("invalid region name '{region}'"),
                });
            }
        }
        Ok(EngineConfig {
            feed_dir: self.feed_dir,
            cpe_starts_with_filter: self.cpe_starts_with_filter,
            parse_workers: self.parse_workers,
            cache_dir: self.cache_dir,
            cache_regions: self.cache_regions,
        })
    }
}
