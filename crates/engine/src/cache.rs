//! 리전 분할 디스크 캐시
//!
//! 외부 조회(중앙 저장소 좌표 해석 등)의 결과를 디스크에 메모이즈하는
//! 범용 캐시입니다. 리전마다 디렉토리 하나, 엔트리마다 파일 하나를
//! 쓰고, 쓰기 즉시 flush하므로 크래시로 잃는 것은 최대 진행 중이던
//! 쓰기 하나입니다. TTL은 없습니다 — 상류 데이터가 바뀌면 호출자가
//! 직접 [`DataCache::evict`]합니다.
//!
//! # 초기화 계약
//!
//! [`DiskCacheFactory::initialize`]는 프로세스 전역에서 정확히 한 번만
//! 디렉토리 셋업을 수행합니다. 동시에 도착한 첫 호출들은 뮤텍스로
//! 직렬화되어, 셋업이 끝나기 전에 온 호출은 대기 후 no-op으로
//! 통과합니다. 단순 check-then-act 불리언으로는 이 계약을 지킬 수
//! 없습니다.

use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use metrics::counter;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use matchlock_core::error::CacheError;
use matchlock_core::metrics::{
    CACHE_CORRUPT_ENTRIES_TOTAL, CACHE_HITS_TOTAL, CACHE_MISSES_TOTAL, LABEL_REGION,
};

/// 프로세스 전역 캐시 팩토리
static GLOBAL_CACHE: DiskCacheFactory = DiskCacheFactory::new();

/// 프로세스 전역 [`DiskCacheFactory`]를 반환합니다.
///
/// 테스트나 임베딩 환경에서는 팩토리를 직접 만들어 주입해도 됩니다 —
/// 전역은 편의일 뿐 유일한 경로가 아닙니다.
pub fn disk_cache() -> &'static DiskCacheFactory {
    &GLOBAL_CACHE
}

struct CacheLayout {
    base: PathBuf,
    regions: Vec<String>,
}

/// 디스크 캐시 팩토리 — 1회 초기화 후 리전 핸들을 발급
pub struct DiskCacheFactory {
    layout: OnceLock<CacheLayout>,
    init_guard: Mutex<()>,
}

impl DiskCacheFactory {
    pub const fn new() -> Self {
        Self {
            layout: OnceLock::new(),
            init_guard: Mutex::new(()),
        }
    }

    /// 베이스 디렉토리 아래에 리전 디렉토리들을 만듭니다.
    ///
    /// 멱등합니다: 이미 초기화된 팩토리에 대한 호출은 no-op으로
    /// 성공합니다(인자가 달라도 첫 초기화가 이깁니다).
    pub fn initialize(&self, base: &Path, regions: &[String]) -> Result<(), CacheError> {
        let _guard = self.init_guard.lock().map_err(|e| CacheError::Setup {
            path: base.display().to_string(),
            reason: format!("init lock poisoned: {e}"),
        })?;

        if self.layout.get().is_some() {
            debug!("disk cache already initialized; no-op");
            return Ok(());
        }

        for region in regions {
            let dir = base.join(region);
            fs::create_dir_all(&dir).map_err(|e| CacheError::Setup {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        debug!(base = %base.display(), regions = regions.len(), "disk cache initialized");

        // guard를 잡은 상태이므로 경합 없이 정확히 한 번만 설정됨
        let _ = self.layout.set(CacheLayout {
            base: base.to_path_buf(),
            regions: regions.to_vec(),
        });
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.layout.get().is_some()
    }

    /// 이름으로 리전 핸들을 발급합니다.
    pub fn region<V>(&self, name: &str) -> Result<DataCache<V>, CacheError> {
        let layout = self.layout.get().ok_or(CacheError::NotInitialized)?;
        if !layout.regions.iter().any(|r| r == name) {
            return Err(CacheError::UnknownRegion(name.to_owned()));
        }
        Ok(DataCache {
            dir: layout.base.join(name),
            region: name.to_owned(),
            _value: PhantomData,
        })
    }
}

impl Default for DiskCacheFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// 리전 하나에 대한 타입 지정 캐시 핸들
///
/// 엔트리는 키의 16진수 인코딩을 파일명으로 하는 JSON 파일입니다.
/// 키에 경로 구분자나 비ASCII가 들어와도 안전합니다.
#[derive(Debug)]
pub struct DataCache<V> {
    dir: PathBuf,
    region: String,
    _value: PhantomData<fn() -> V>,
}

impl<V> DataCache<V>
where
    V: Serialize + DeserializeOwned,
{
    /// 키를 조회합니다.
    ///
    /// 반환: 값, 미스(`None`), 또는 디스크 손상 시
    /// [`CacheError::Corrupt`]. 손상은 치명적이지 않습니다 —
    /// 호출자는 미스로 강등하고 원본에서 재계산해야 합니다
    /// ([`DataCache::get_or_miss`] 참조).
    pub fn get(&self, key: &str) -> Result<Option<V>, CacheError> {
        let path = self.entry_path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                counter!(CACHE_MISSES_TOTAL, LABEL_REGION => self.region.clone()).increment(1);
                return Ok(None);
            }
            Err(e) => return Err(self.corrupt(key, e.to_string())),
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                counter!(CACHE_HITS_TOTAL, LABEL_REGION => self.region.clone()).increment(1);
                Ok(Some(value))
            }
            Err(e) => Err(self.corrupt(key, e.to_string())),
        }
    }

    /// [`DataCache::get`]에서 손상을 미스로 강등한 버전입니다.
    pub fn get_or_miss(&self, key: &str) -> Option<V> {
        match self.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "cache entry downgraded to miss");
                None
            }
        }
    }

    /// 키에 값을 무조건 덮어씁니다. 쓰기 직후 flush합니다.
    pub fn put(&self, key: &str, value: &V) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value).map_err(|e| self.write_err(key, e.to_string()))?;
        let path = self.entry_path(key);

        let mut file =
            fs::File::create(&path).map_err(|e| self.write_err(key, e.to_string()))?;
        file.write_all(&bytes)
            .and_then(|()| file.sync_all())
            .map_err(|e| self.write_err(key, e.to_string()))?;
        Ok(())
    }

    /// 키를 제거합니다. 없는 키는 no-op입니다.
    pub fn evict(&self, key: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.write_err(key, e.to_string())),
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let mut name = String::with_capacity(key.len() * 2 + 5);
        for byte in key.bytes() {
            name.push_str(&format!("{byte:02x}"));
        }
        name.push_str(".json");
        self.dir.join(name)
    }

    fn corrupt(&self, key: &str, reason: String) -> CacheError {
        counter!(CACHE_CORRUPT_ENTRIES_TOTAL, LABEL_REGION => self.region.clone()).increment(1);
        counter!(CACHE_MISSES_TOTAL, LABEL_REGION => self.region.clone()).increment(1);
        CacheError::Corrupt {
            region: self.region.clone(),
            key: key.to_owned(),
            reason,
        }
    }

    fn write_err(&self, key: &str, reason: String) -> CacheError {
        CacheError::Write {
            region: self.region.clone(),
            key: key.to_owned(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn regions() -> Vec<String> {
        vec!["NODEAUDIT".to_owned(), "CENTRAL".to_owned()]
    }

    #[test]
    fn put_then_get_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let factory = DiskCacheFactory::new();
        factory.initialize(dir.path(), &regions()).unwrap();

        let cache: DataCache<Vec<String>> = factory.region("CENTRAL").unwrap();
        cache
            .put("org.example:lib", &vec!["CVE-2024-0001".to_owned()])
            .unwrap();
        let hit = cache.get("org.example:lib").unwrap();
        assert_eq!(hit, Some(vec!["CVE-2024-0001".to_owned()]));
    }

    #[test]
    fn get_unset_key_is_miss_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let factory = DiskCacheFactory::new();
        factory.initialize(dir.path(), &regions()).unwrap();

        let cache: DataCache<String> = factory.region("CENTRAL").unwrap();
        assert_eq!(cache.get("missing").unwrap(), None);
    }

    #[test]
    fn put_overwrites_unconditionally() {
        let dir = tempfile::tempdir().unwrap();
        let factory = DiskCacheFactory::new();
        factory.initialize(dir.path(), &regions()).unwrap();

        let cache: DataCache<u32> = factory.region("NODEAUDIT").unwrap();
        cache.put("k", &1).unwrap();
        cache.put("k", &2).unwrap();
        assert_eq!(cache.get("k").unwrap(), Some(2));
    }

    #[test]
    fn corrupt_entry_errors_and_downgrades() {
        let dir = tempfile::tempdir().unwrap();
        let factory = DiskCacheFactory::new();
        factory.initialize(dir.path(), &regions()).unwrap();

        let cache: DataCache<Vec<u32>> = factory.region("CENTRAL").unwrap();
        cache.put("k", &vec![1, 2, 3]).unwrap();

        // 디스크 손상 시뮬레이션
        let entry = std::fs::read_dir(dir.path().join("CENTRAL"))
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        std::fs::write(&entry, b"{ not json").unwrap();

        let err = cache.get("k").unwrap_err();
        assert!(matches!(err, CacheError::Corrupt { .. }));
        assert_eq!(cache.get_or_miss("k"), None);
    }

    #[test]
    fn evict_removes_entry_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let factory = DiskCacheFactory::new();
        factory.initialize(dir.path(), &regions()).unwrap();

        let cache: DataCache<u32> = factory.region("CENTRAL").unwrap();
        cache.put("k", &7).unwrap();
        cache.evict("k").unwrap();
        assert_eq!(cache.get("k").unwrap(), None);
        cache.evict("k").unwrap();
    }

    #[test]
    fn uninitialized_factory_rejects_region() {
        let factory = DiskCacheFactory::new();
        let err = factory.region::<u32>("CENTRAL").unwrap_err();
        assert!(matches!(err, CacheError::NotInitialized));
    }

    #[test]
    fn unknown_region_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let factory = DiskCacheFactory::new();
        factory.initialize(dir.path(), &regions()).unwrap();
        let err = factory.region::<u32>("BOGUS").unwrap_err();
        assert!(matches!(err, CacheError::UnknownRegion(_)));
    }

    #[test]
    fn second_initialize_is_noop() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let factory = DiskCacheFactory::new();
        factory.initialize(first.path(), &regions()).unwrap();
        factory.initialize(second.path(), &regions()).unwrap();

        // 첫 초기화가 이김 — 리전은 첫 베이스 아래에만 존재
        assert!(first.path().join("CENTRAL").is_dir());
        assert!(!second.path().join("CENTRAL").exists());
    }

    #[test]
    fn concurrent_initialize_runs_setup_once() {
        let dir = tempfile::tempdir().unwrap();
        let factory = std::sync::Arc::new(DiskCacheFactory::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let factory = factory.clone();
                let base = dir.path().to_path_buf();
                std::thread::spawn(move || factory.initialize(&base, &regions()))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert!(factory.is_initialized());
        assert!(dir.path().join("NODEAUDIT").is_dir());
    }

    #[test]
    fn keys_with_path_separators_are_safe() {
        let dir = tempfile::tempdir().unwrap();
        let factory = DiskCacheFactory::new();
        factory.initialize(dir.path(), &regions()).unwrap();

        let cache: DataCache<u32> = factory.region("CENTRAL").unwrap();
        cache.put("../escape/attempt", &9).unwrap();
        assert_eq!(cache.get("../escape/attempt").unwrap(), Some(9));
    }

    #[test]
    #[serial]
    fn process_wide_factory_initializes_once() {
        let dir = tempfile::tempdir().unwrap();
        disk_cache().initialize(dir.path(), &regions()).unwrap();
        assert!(disk_cache().is_initialized());
        // 재호출은 no-op
        disk_cache().initialize(dir.path(), &regions()).unwrap();
    }
}
