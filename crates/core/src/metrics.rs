//! 메트릭 상수
//!
//! 모든 Prometheus 메트릭의 이름을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `matchlock_`
//! - 모듈명: `feed_`, `matcher_`, `cache_`
//! - 접미어: `_total` (counter), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 캐시 리전 레이블 키
pub const LABEL_REGION: &str = "region";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Feed Ingest 메트릭 ────────────────────────────────────────────

/// Feed: 파싱된 피드 파일 수 (counter)
pub const FEED_FILES_PARSED_TOTAL: &str = "matchlock_feed_files_parsed_total";

/// Feed: 저장소에 기록된 엔트리 수 (counter)
pub const FEED_ENTRIES_INGESTED_TOTAL: &str = "matchlock_feed_entries_ingested_total";

/// Feed: 스코프 필터로 제외된 엔트리 수 (counter)
pub const FEED_ENTRIES_FILTERED_TOTAL: &str = "matchlock_feed_entries_filtered_total";

/// Feed: 파싱 실패로 스킵된 엔트리 수 (counter)
pub const FEED_ENTRIES_SKIPPED_TOTAL: &str = "matchlock_feed_entries_skipped_total";

/// Feed: 파싱 실패로 스킵된 술어 수 (counter)
pub const FEED_PREDICATES_SKIPPED_TOTAL: &str = "matchlock_feed_predicates_skipped_total";

// ─── Matcher 메트릭 ────────────────────────────────────────────────

/// Matcher: 평가된 후보 수 (counter)
pub const MATCHER_CANDIDATES_EVALUATED_TOTAL: &str = "matchlock_matcher_candidates_evaluated_total";

// ─── Disk Cache 메트릭 ─────────────────────────────────────────────

/// Cache: 히트 수 (counter, label: region)
pub const CACHE_HITS_TOTAL: &str = "matchlock_cache_hits_total";

/// Cache: 미스 수 (counter, label: region) — 손상 강등 포함
pub const CACHE_MISSES_TOTAL: &str = "matchlock_cache_misses_total";

/// Cache: 손상으로 미스 처리된 엔트리 수 (counter, label: region)
pub const CACHE_CORRUPT_ENTRIES_TOTAL: &str = "matchlock_cache_corrupt_entries_total";
