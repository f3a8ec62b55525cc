//! 피드 인제스트 오케스트레이터
//!
//! 피드 디렉토리의 `.json.gz` 파일들을 워커 수 한도 안에서 동시에
//! 파싱합니다. 파일 하나의 파싱은 블로킹 스트리밍 작업이므로
//! `spawn_blocking`으로 내리고, 동시성은 세마포어로 제한합니다.
//!
//! 파일 단위 읽기 실패는 해당 파일만 건너뛰고 리포트에 기록합니다.
//! 저장소 쓰기 실패는 실행 전체를 중단시킵니다 — 쓰기가 실패하는
//! 저장소에 계속 쓰는 것은 의미가 없습니다.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use matchlock_core::error::{CacheError, ConfigError, FeedReadError, MatchlockError};

use crate::cache::DiskCacheFactory;
use crate::config::EngineConfig;
use crate::feed::{FeedParser, IngestStats};
use crate::store::VulnerabilityStore;

/// 인제스트 실행 하나의 결과
#[derive(Debug)]
pub struct IngestReport {
    /// 실행 식별자 (로그 상관관계용)
    pub run_id: Uuid,
    /// 파싱을 끝낸 파일 수
    pub files_parsed: usize,
    /// 읽기 실패로 건너뛴 파일과 사유
    pub files_failed: Vec<(String, String)>,
    /// 전체 파일의 엔트리 집계
    pub stats: IngestStats,
    /// 실행 소요 시간
    pub elapsed: Duration,
}

/// 피드 인제스트 오케스트레이터
pub struct FeedIngestor {
    config: EngineConfig,
    parser: FeedParser,
    store: Arc<dyn VulnerabilityStore>,
}

impl FeedIngestor {
    pub fn builder() -> FeedIngestorBuilder {
        FeedIngestorBuilder::default()
    }

    /// 설정의 캐시 섹션으로 팩토리를 초기화합니다.
    ///
    /// 전역 팩토리를 쓸지 주입된 팩토리를 쓸지는 호출자가 정합니다.
    pub fn initialize_cache(&self, factory: &DiskCacheFactory) -> Result<(), CacheError> {
        factory.initialize(&self.config.cache_dir, &self.config.cache_regions)
    }

    /// 피드 디렉토리 전체를 인제스트합니다.
    pub async fn run(&self) -> Result<IngestReport, MatchlockError> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();

        let files = self.discover_files().await?;
        info!(run_id = %run_id, files = files.len(), "starting feed ingest");

        let semaphore = Arc::new(Semaphore::new(self.config.parse_workers));
        let mut workers: JoinSet<(PathBuf, Result<IngestStats, MatchlockError>)> = JoinSet::new();

        for path in files {
            let semaphore = semaphore.clone();
            let parser = self.parser.clone();
            let store = self.store.clone();
            workers.spawn(async move {
                let permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        let err = FeedReadError::Read {
                            path: path.display().to_string(),
                            reason: format!("worker pool closed: {e}"),
                        };
                        return (path, Err(err.into()));
                    }
                };
                let worker_path = path.clone();
                let result = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    parser.parse_file(&worker_path, store.as_ref())
                })
                .await;
                let result = match result {
                    Ok(inner) => inner,
                    Err(e) => Err(FeedReadError::Read {
                        path: path.display().to_string(),
                        reason: format!("parse worker failed: {e}"),
                    }
                    .into()),
                };
                (path, result)
            });
        }

        let mut stats = IngestStats::default();
        let mut files_parsed = 0;
        let mut files_failed = Vec::new();
        while let Some(joined) = workers.join_next().await {
            let (path, result) = joined.map_err(|e| {
                MatchlockError::Io(std::io::Error::other(format!("ingest task failed: {e}")))
            })?;
            match result {
                Ok(file_stats) => {
                    stats.merge(&file_stats);
                    files_parsed += 1;
                }
                Err(MatchlockError::FeedRead(e)) => {
                    warn!(run_id = %run_id, error = %e, "feed file skipped");
                    files_failed.push((path.display().to_string(), e.to_string()));
                }
                Err(fatal) => return Err(fatal),
            }
        }

        let elapsed = started.elapsed();
        info!(
            run_id = %run_id,
            files_parsed,
            files_failed = files_failed.len(),
            entries_ingested = stats.entries_ingested,
            entries_filtered = stats.entries_filtered,
            entries_skipped = stats.entries_skipped,
            predicates_skipped = stats.predicates_skipped,
            elapsed_ms = elapsed.as_millis() as u64,
            "feed ingest finished"
        );

        Ok(IngestReport {
            run_id,
            files_parsed,
            files_failed,
            stats,
            elapsed,
        })
    }

    /// 피드 디렉토리에서 `.json.gz` 파일을 결정적 순서로 찾습니다.
    async fn discover_files(&self) -> Result<Vec<PathBuf>, MatchlockError> {
        let mut entries = tokio::fs::read_dir(&self.config.feed_dir).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_feed = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".json.gz"));
            if is_feed {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// [`FeedIngestor`] 빌더 — 저장소는 필수입니다.
#[derive(Default)]
pub struct FeedIngestorBuilder {
    config: Option<EngineConfig>,
    store: Option<Arc<dyn VulnerabilityStore>>,
}

impl FeedIngestorBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn store(mut self, store: Arc<dyn VulnerabilityStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<FeedIngestor, ConfigError> {
        let store = self.store.ok_or_else(|| ConfigError::InvalidValue {
            field: "store".to_owned(),
            reason: "vulnerability store is required".to_owned(),
        })?;
        let config = match self.config {
            Some(config) => config,
            None => EngineConfig::builder().build()?,
        };
        let parser = FeedParser::new(config.cpe_starts_with_filter.clone());
        Ok(FeedIngestor {
            config,
            parser,
            store,
        })
    }
}
