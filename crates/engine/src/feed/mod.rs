//! 피드 스트리밍 파서
//!
//! gzip으로 압축된 피드 파일(최상위 JSON 배열)을 전체 문서를 메모리에
//! 올리지 않고 엔트리 단위로 스트리밍 파싱합니다. 피드는 수십 MB에
//! 달합니다.
//!
//! # 실패 정책
//!
//! - 파일 열기·읽기·압축 해제·배열 프레이밍 손상: 해당 파일에 대해
//!   fatal ([`FeedReadError`]). 호출자가 재시도를 결정합니다.
//! - 엔트리·술어 단위 손상: 해당 항목만 스킵하고 카운트. 잘못된 엔트리
//!   하나가 나머지 인제스트를 막지 않습니다.
//! - 저장소 쓰기 실패: fatal, [`DatabaseError`] 그대로 전파.

pub(crate) mod model;
pub mod node;

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use flate2::read::GzDecoder;
use metrics::counter;
use serde::de::{self, DeserializeSeed, SeqAccess, Visitor};
use serde_json::Value;
use tracing::{debug, warn};

use matchlock_core::error::{DatabaseError, FeedReadError, MatchlockError, ParseError};
use matchlock_core::metrics::{
    FEED_ENTRIES_FILTERED_TOTAL, FEED_ENTRIES_INGESTED_TOTAL, FEED_ENTRIES_SKIPPED_TOTAL,
    FEED_FILES_PARSED_TOTAL, FEED_PREDICATES_SKIPPED_TOTAL, LABEL_RESULT,
};

use crate::cpe::Cpe;
use crate::store::VulnerabilityStore;
use crate::vuln::{VulnerableSoftware, VulnerableSoftwareBuilder};

use model::RawEntry;
use node::{ConfigNode, MatchPredicate};

/// 파일 하나의 인제스트 집계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// 배열에서 읽은 엔트리 수 (역직렬화 실패 포함)
    pub entries_read: u64,
    /// 저장소에 기록된 엔트리 수
    pub entries_ingested: u64,
    /// 스코프 필터로 제외된 엔트리 수
    pub entries_filtered: u64,
    /// 손상으로 스킵된 엔트리 수
    pub entries_skipped: u64,
    /// 손상으로 스킵된 개별 술어 수
    pub predicates_skipped: u64,
}

impl IngestStats {
    /// 다른 파일의 집계를 합산합니다.
    pub fn merge(&mut self, other: &IngestStats) {
        self.entries_read += other.entries_read;
        self.entries_ingested += other.entries_ingested;
        self.entries_filtered += other.entries_filtered;
        self.entries_skipped += other.entries_skipped;
        self.predicates_skipped += other.predicates_skipped;
    }
}

/// 피드 파일 파서
///
/// 스코프 필터 접두어 하나로 구성됩니다. 기본값은 애플리케이션
/// part(`cpe:2.3:a:`)로, OS·하드웨어 전용 엔트리를 저장소에서
/// 배제합니다.
#[derive(Debug, Clone)]
pub struct FeedParser {
    cpe_starts_with: String,
}

impl Default for FeedParser {
    fn default() -> Self {
        Self::new("cpe:2.3:a:")
    }
}

impl FeedParser {
    pub fn new(cpe_starts_with: impl Into<String>) -> Self {
        Self {
            cpe_starts_with: cpe_starts_with.into(),
        }
    }

    /// 피드 파일 하나를 파싱해 저장소에 기록합니다.
    ///
    /// 블로킹 I/O입니다 — async 문맥에서는 `spawn_blocking`으로
    /// 감싸 호출합니다 ([`crate::ingest`] 참조).
    pub fn parse_file(
        &self,
        path: &Path,
        store: &dyn VulnerabilityStore,
    ) -> Result<IngestStats, MatchlockError> {
        let path_str = path.display().to_string();
        let file = File::open(path).map_err(|source| FeedReadError::Open {
            path: path_str.clone(),
            source,
        })?;
        let gz = GzDecoder::new(BufReader::new(file));
        let mut deserializer = serde_json::Deserializer::from_reader(BufReader::new(gz));

        let mut sink = EntrySink {
            parser: self,
            store,
            stats: IngestStats::default(),
            failure: None,
        };
        let outcome = (&mut sink)
            .deserialize(&mut deserializer)
            .and_then(|()| deserializer.end());

        match outcome {
            Ok(()) => {
                counter!(FEED_FILES_PARSED_TOTAL, LABEL_RESULT => "success").increment(1);
                debug!(
                    path = %path_str,
                    entries_read = sink.stats.entries_read,
                    entries_ingested = sink.stats.entries_ingested,
                    "feed file parsed"
                );
                Ok(sink.stats)
            }
            Err(err) => {
                counter!(FEED_FILES_PARSED_TOTAL, LABEL_RESULT => "failure").increment(1);
                if let Some(db) = sink.failure.take() {
                    return Err(db.into());
                }
                let feed_err = match err.classify() {
                    serde_json::error::Category::Io => FeedReadError::Read {
                        path: path_str,
                        reason: err.to_string(),
                    },
                    _ => FeedReadError::MalformedDocument {
                        path: path_str,
                        reason: err.to_string(),
                    },
                };
                Err(feed_err.into())
            }
        }
    }
}

/// 스트리밍 배열 원소를 엔트리 처리로 연결하는 싱크
struct EntrySink<'a> {
    parser: &'a FeedParser,
    store: &'a dyn VulnerabilityStore,
    stats: IngestStats,
    failure: Option<DatabaseError>,
}

impl<'de> DeserializeSeed<'de> for &mut EntrySink<'_> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<(), D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(EntryVisitor { sink: self })
    }
}

struct EntryVisitor<'a, 'b> {
    sink: &'b mut EntrySink<'a>,
}

impl<'de> Visitor<'de> for EntryVisitor<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a top-level array of feed entries")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        // 원소 하나씩만 Value로 구체화 — 전체 문서는 절대 올리지 않음
        while let Some(value) = seq.next_element::<Value>()? {
            if let Err(db) = self.sink.process(value) {
                self.sink.failure = Some(db);
                return Err(de::Error::custom("vulnerability store write failed"));
            }
        }
        Ok(())
    }
}

impl EntrySink<'_> {
    /// 배열 원소 하나를 처리합니다. 저장소 쓰기 실패만 에러로
    /// 올라가며, 엔트리 손상은 스킵 후 계속합니다.
    fn process(&mut self, value: Value) -> Result<(), DatabaseError> {
        self.stats.entries_read += 1;

        let id = value
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_owned);
        match serde_json::from_value::<RawEntry>(value) {
            Ok(entry) => self.handle_entry(entry),
            Err(e) => {
                let err = ParseError::MalformedEntry {
                    id,
                    reason: e.to_string(),
                };
                warn!(error = %err, "skipping malformed feed entry");
                self.stats.entries_skipped += 1;
                counter!(FEED_ENTRIES_SKIPPED_TOTAL).increment(1);
                Ok(())
            }
        }
    }

    fn handle_entry(&mut self, entry: RawEntry) -> Result<(), DatabaseError> {
        let nodes: Vec<ConfigNode> = entry
            .configurations
            .nodes
            .into_iter()
            .map(ConfigNode::from)
            .collect();
        let predicates: Vec<&MatchPredicate> =
            nodes.iter().flat_map(ConfigNode::flatten).collect();

        // 스코프 필터: 접두어가 일치하는 술어가 하나라도 있어야 엔트리 유지.
        // 유지되면 불일치 술어까지 전부 함께 저장됩니다.
        let in_scope = predicates.iter().any(|p| {
            p.cpe23_uri
                .as_deref()
                .is_some_and(|uri| uri.starts_with(&self.parser.cpe_starts_with))
        });
        if !in_scope {
            debug!(id = %entry.id, "entry outside scope filter; dropped");
            self.stats.entries_filtered += 1;
            counter!(FEED_ENTRIES_FILTERED_TOTAL).increment(1);
            return Ok(());
        }

        let weaknesses: Vec<String> = entry
            .weaknesses
            .iter()
            .map(|w| w.value.clone())
            .collect();

        let mut records: Vec<VulnerableSoftware> = Vec::with_capacity(predicates.len());
        for &predicate in &predicates {
            match self.resolve(&entry.id, predicate) {
                Some(record) => records.push(record),
                None => {
                    self.stats.predicates_skipped += 1;
                    counter!(FEED_PREDICATES_SKIPPED_TOTAL).increment(1);
                }
            }
        }

        if records.is_empty() {
            warn!(id = %entry.id, "no resolvable predicates; entry skipped");
            self.stats.entries_skipped += 1;
            counter!(FEED_ENTRIES_SKIPPED_TOTAL).increment(1);
            return Ok(());
        }

        self.store
            .upsert_vulnerability(&entry.id, records, weaknesses)?;
        self.stats.entries_ingested += 1;
        counter!(FEED_ENTRIES_INGESTED_TOTAL).increment(1);
        Ok(())
    }

    /// 술어 하나를 레코드로 변환합니다. 2.3 문자열을 먼저 시도하고,
    /// 실패하면 2.2 문자열로 폴백합니다. 둘 다 실패하면 `None`.
    fn resolve(&self, id: &str, predicate: &MatchPredicate) -> Option<VulnerableSoftware> {
        let cpe = self
            .try_parse(id, predicate.cpe23_uri.as_deref())
            .or_else(|| self.try_parse(id, predicate.cpe22_uri.as_deref()));
        let Some(cpe) = cpe else {
            warn!(
                id,
                cpe23 = predicate.cpe23_uri.as_deref().unwrap_or("-"),
                cpe22 = predicate.cpe22_uri.as_deref().unwrap_or("-"),
                "skipping unparsable match predicate"
            );
            return None;
        };

        let mut builder = VulnerableSoftwareBuilder::new(cpe).vulnerable(predicate.vulnerable);
        if let Some(v) = &predicate.version_start_including {
            builder = builder.version_start_including(v);
        }
        if let Some(v) = &predicate.version_start_excluding {
            builder = builder.version_start_excluding(v);
        }
        if let Some(v) = &predicate.version_end_including {
            builder = builder.version_end_including(v);
        }
        if let Some(v) = &predicate.version_end_excluding {
            builder = builder.version_end_excluding(v);
        }

        match builder.build() {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(id, error = %e, "skipping predicate with invalid boundaries");
                None
            }
        }
    }

    /// 피드 데이터는 관용 모드로 파싱합니다 — stray 백슬래시가 실제로
    /// 섞여 들어옵니다.
    fn try_parse(&self, id: &str, uri: Option<&str>) -> Option<Cpe> {
        let uri = uri?;
        match Cpe::parse_lenient(uri) {
            Ok(cpe) => Some(cpe),
            Err(e) => {
                debug!(id, uri, error = %e, "CPE string did not parse");
                None
            }
        }
    }
}
