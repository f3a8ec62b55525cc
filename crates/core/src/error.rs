//! 에러 타입 — 도메인별 에러 정의
//!
//! 취약점 매칭 코어의 에러 분류 체계입니다.
//!
//! # 전파 정책
//!
//! - [`ValidationError`] / [`ParseError`]: 엔트리·술어 단위로 발생하며,
//!   피드 파싱은 해당 항목만 스킵하고 계속 진행합니다.
//! - [`FeedReadError`]: 파일 열기·읽기·압축 해제 실패. 해당 파일의 파싱만
//!   중단되며 호출자가 재시도 여부를 결정합니다.
//! - [`DatabaseError`]: 저장소 쓰기 실패. 호출자에게 그대로 전파됩니다.
//! - [`CacheError`]: 디스크 캐시 손상. 호출자는 캐시 미스로 강등하여
//!   원본 소스에서 값을 재계산해야 하며, 매칭 작업을 중단시키지 않습니다.

/// Matchlock 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum MatchlockError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// CPE 속성 유효성 검증 실패
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// CPE 문자열 또는 피드 엔트리 파싱 실패
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// 피드 파일 읽기 실패
    #[error("feed read error: {0}")]
    FeedRead(#[from] FeedReadError),

    /// 저장소 쓰기 실패
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// 디스크 캐시 에러
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// CPE 속성 유효성 검증 에러
///
/// 빌더의 `build()` 단계에서 반환되며, 부분적으로 유효한 값은
/// 절대 생성되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// 허용되지 않는 문자 포함
    #[error("attribute '{attribute}' contains invalid character '{ch}' in value '{value}'")]
    InvalidCharacter {
        /// 속성명
        attribute: &'static str,
        /// 문제가 된 문자
        ch: char,
        /// 검증 대상 값
        value: String,
    },

    /// 이스케이프 시퀀스가 잘못됨 (후행 백슬래시 등)
    #[error("attribute '{attribute}' has malformed escape in value '{value}'")]
    MalformedEscape {
        /// 속성명
        attribute: &'static str,
        /// 검증 대상 값
        value: String,
    },

    /// 와일드카드가 리터럴 중간에 위치함
    #[error("attribute '{attribute}' has embedded wildcard in value '{value}'")]
    EmbeddedWildcard {
        /// 속성명
        attribute: &'static str,
        /// 검증 대상 값
        value: String,
    },
}

/// CPE 문자열 / 피드 엔트리 파싱 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// `cpe:2.3:` 또는 `cpe:/` 접두어가 아님
    #[error("not a CPE identifier: '{input}'")]
    InvalidPrefix { input: String },

    /// 속성 필드 개수가 맞지 않음
    #[error("CPE '{input}' has {found} fields, expected {expected}")]
    FieldCount {
        input: String,
        found: usize,
        expected: usize,
    },

    /// 이스케이프되지 않은 백슬래시 (lenient 모드에서만 허용)
    #[error("CPE '{input}' contains unescaped backslash")]
    StrayBackslash { input: String },

    /// 잘못된 part 값
    #[error("invalid CPE part '{part}'")]
    InvalidPart { part: String },

    /// 속성 값이 well-formed가 아님
    #[error("CPE attribute invalid: {0}")]
    Attribute(#[from] ValidationError),

    /// 피드 엔트리 구조가 스키마와 맞지 않음
    #[error("malformed feed entry '{}': {reason}", .id.as_deref().unwrap_or("?"))]
    MalformedEntry {
        /// 엔트리 식별자 (파싱 가능했던 경우)
        id: Option<String>,
        /// 실패 사유
        reason: String,
    },
}

/// 피드 파일 읽기 에러 — 파일 단위 fatal
#[derive(Debug, thiserror::Error)]
pub enum FeedReadError {
    /// 파일 열기 실패
    #[error("failed to open feed file: {path}: {source}")]
    Open {
        /// 피드 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 읽기 또는 압축 해제 실패
    #[error("failed to read feed file: {path}: {reason}")]
    Read {
        /// 피드 파일 경로
        path: String,
        /// 실패 사유 (I/O 또는 gzip)
        reason: String,
    },

    /// 최상위 JSON 구조가 배열이 아니거나 스트림이 손상됨
    #[error("malformed feed document: {path}: {reason}")]
    MalformedDocument {
        /// 피드 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },
}

/// 저장소 쓰기 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatabaseError {
    /// upsert 실패
    #[error("failed to upsert vulnerability '{id}': {reason}")]
    Upsert {
        /// 취약점 ID
        id: String,
        /// 실패 사유
        reason: String,
    },

    /// 저장소 조회 실패
    #[error("store query failed: {0}")]
    Query(String),
}

/// 디스크 캐시 에러
///
/// 캐시 값은 항상 원본 소스에서 재계산할 수 있으므로, 호출자는
/// 이 에러를 캐시 미스로 취급해야 합니다 (치명적이지 않음).
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// 캐시가 초기화되지 않음
    #[error("disk cache not initialized")]
    NotInitialized,

    /// 알 수 없는 리전
    #[error("unknown cache region: {0}")]
    UnknownRegion(String),

    /// 캐시 디렉토리 생성 실패
    #[error("failed to create cache directory: {path}: {reason}")]
    Setup {
        /// 대상 디렉토리
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 엔트리 읽기·역직렬화 실패 (디스크 손상)
    #[error("corrupt cache entry '{key}' in region '{region}': {reason}")]
    Corrupt {
        /// 리전명
        region: String,
        /// 엔트리 키
        key: String,
        /// 실패 사유
        reason: String,
    },

    /// 엔트리 쓰기 실패
    #[error("failed to write cache entry '{key}' in region '{region}': {reason}")]
    Write {
        /// 리전명
        region: String,
        /// 엔트리 키
        key: String,
        /// 실패 사유
        reason: String,
    },
}
