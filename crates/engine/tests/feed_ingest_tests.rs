//! 피드 인제스트 경로의 끝-대-끝 테스트
//!
//! gzip 피드 파일 생성 → 인제스트 → 저장소 조회까지의 전체 쓰기/읽기
//! 경로를 검증합니다.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use matchlock_engine::{
    CpeBuilder, EngineConfig, FeedIngestor, FeedParser, MemoryStore, Part,
};

fn write_feed(dir: &Path, name: &str, json: &str) {
    let file = std::fs::File::create(dir.join(name)).unwrap();
    let mut gz = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    gz.write_all(json.as_bytes()).unwrap();
    gz.finish().unwrap();
}

fn good_entry(id: &str) -> String {
    format!(
        r#"{{"id": "{id}",
            "weaknesses": [{{"lang": "en", "value": "CWE-79"}}],
            "configurations": {{"nodes": [{{
                "operator": "OR",
                "cpeMatch": [{{
                    "cpe23Uri": "cpe:2.3:a:apache:struts:*:*:*:*:*:*:*:*",
                    "versionStartIncluding": "2.0",
                    "versionEndExcluding": "3.0"
                }}]
            }}]}}}}"#
    )
}

#[test]
fn nine_good_one_bad_ingests_nine_and_reports_one_skip() {
    let dir = tempfile::tempdir().unwrap();
    let mut entries: Vec<String> = (1..=9)
        .map(|i| good_entry(&format!("CVE-2024-{i:04}")))
        .collect();
    // 술어의 CPE 문자열이 파싱 불가능한 엔트리 하나
    entries.push(
        r#"{"id": "CVE-2024-9999",
            "configurations": {"nodes": [{
                "cpeMatch": [{"cpe23Uri": "cpe:2.3:a:totally broken"}]
            }]}}"#
            .to_owned(),
    );
    write_feed(dir.path(), "feed.json.gz", &format!("[{}]", entries.join(",")));

    let store = MemoryStore::new();
    let stats = FeedParser::default()
        .parse_file(&dir.path().join("feed.json.gz"), &store)
        .unwrap();

    assert_eq!(stats.entries_read, 10);
    assert_eq!(stats.entries_ingested, 9);
    assert_eq!(stats.entries_skipped, 1);
    assert_eq!(store.len(), 9);
    assert!(store.get("CVE-2024-9999").unwrap().is_none());
}

#[test]
fn weakness_set_is_persisted_completely() {
    let dir = tempfile::tempdir().unwrap();
    write_feed(
        dir.path(),
        "feed.json.gz",
        r#"[{"id": "CVE-2024-0001",
            "weaknesses": [
                {"lang": "en", "value": "CWE-79"},
                {"lang": "en", "value": "CWE-89"},
                {"lang": "es", "value": "CWE-79"}
            ],
            "configurations": {"nodes": [{
                "cpeMatch": [{"cpe23Uri": "cpe:2.3:a:apache:struts:2.5:*:*:*:*:*:*:*"}]
            }]}}]"#,
    );

    let store = MemoryStore::new();
    FeedParser::default()
        .parse_file(&dir.path().join("feed.json.gz"), &store)
        .unwrap();

    // 마지막 값 하나가 아니라 중복 제거된 전체 집합이 남아야 함
    let stored = store.get("CVE-2024-0001").unwrap().unwrap();
    assert_eq!(stored.weaknesses, vec!["CWE-79", "CWE-89"]);
}

#[test]
fn nested_and_or_tree_is_flattened() {
    let dir = tempfile::tempdir().unwrap();
    write_feed(
        dir.path(),
        "feed.json.gz",
        r#"[{"id": "CVE-2024-0002",
            "configurations": {"nodes": [{
                "operator": "AND",
                "children": [
                    {"operator": "OR", "cpeMatch": [
                        {"cpe23Uri": "cpe:2.3:a:apache:struts:2.5:*:*:*:*:*:*:*"}
                    ]},
                    {"operator": "OR", "cpeMatch": [
                        {"cpe23Uri": "cpe:2.3:o:linux:linux_kernel:5.15:*:*:*:*:*:*:*", "vulnerable": false}
                    ]}
                ]
            }]}}]"#,
    );

    let store = MemoryStore::new();
    FeedParser::default()
        .parse_file(&dir.path().join("feed.json.gz"), &store)
        .unwrap();

    // 평탄화는 AND/OR 구분을 버리고 모든 리프를 레코드로 만든다
    let stored = store.get("CVE-2024-0002").unwrap().unwrap();
    assert_eq!(stored.records.len(), 2);
}

#[tokio::test]
async fn end_to_end_ingest_then_match() {
    let dir = tempfile::tempdir().unwrap();
    write_feed(
        dir.path(),
        "nvdcve-2024.json.gz",
        &format!("[{}]", good_entry("CVE-2024-0001")),
    );

    let store = Arc::new(MemoryStore::new());
    let config = EngineConfig::builder()
        .feed_dir(dir.path())
        .parse_workers(1)
        .build()
        .unwrap();
    let report = FeedIngestor::builder()
        .config(config)
        .store(store.clone())
        .build()
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.files_parsed, 1);
    assert_eq!(report.stats.entries_ingested, 1);

    let query = CpeBuilder::new()
        .part(Part::Application)
        .vendor("apache")
        .product("struts")
        .version("2.5")
        .build()
        .unwrap();
    let hits = store.find_matches(&query).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0, "CVE-2024-0001");

    let outside = CpeBuilder::new()
        .part(Part::Application)
        .vendor("apache")
        .product("struts")
        .version("3.0")
        .build()
        .unwrap();
    assert!(store.find_matches(&outside).unwrap().is_empty());
}

#[test]
fn overlapping_reingest_is_last_writer_wins() {
    let dir = tempfile::tempdir().unwrap();
    write_feed(dir.path(), "first.json.gz", &format!("[{}]", good_entry("CVE-2024-0001")));
    write_feed(
        dir.path(),
        "second.json.gz",
        r#"[{"id": "CVE-2024-0001",
            "weaknesses": [{"lang": "en", "value": "CWE-89"}],
            "configurations": {"nodes": [{
                "cpeMatch": [{"cpe23Uri": "cpe:2.3:a:apache:struts:2.5.1:*:*:*:*:*:*:*"}]
            }]}}]"#,
    );

    let store = MemoryStore::new();
    let parser = FeedParser::default();
    parser
        .parse_file(&dir.path().join("first.json.gz"), &store)
        .unwrap();
    parser
        .parse_file(&dir.path().join("second.json.gz"), &store)
        .unwrap();

    // 두 번째 파싱이 엔트리를 통째로 교체 — 부분 병합 없음
    let stored = store.get("CVE-2024-0001").unwrap().unwrap();
    assert_eq!(stored.weaknesses, vec!["CWE-89"]);
    assert_eq!(stored.records.len(), 1);
    assert_eq!(
        stored.records[0].cpe().version().as_wf_str(),
        "2.5.1"
    );
}
