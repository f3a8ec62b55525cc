//! CPE 식별자 — 값 타입, 정규 직렬화, 전순서 비교
//!
//! CPE 2.3 속성 튜플(part + 10개 속성)을 불변 값 객체로 표현합니다.
//! 모든 속성은 well-formed 문자열(ANY `*`, NA `-`, 또는 이스케이프된
//! 리터럴)이며, 값 생성은 검증 빌더([`builder::CpeBuilder`]) 또는
//! 파서([`Cpe::parse`])를 통해서만 가능합니다.
//!
//! # 비교 계약
//!
//! `Ord`는 고정된 속성 순서(part, vendor, product, version, update,
//! edition, language, sw_edition, target_sw, target_hw, other)에 대한
//! 필드 단위 사전식 비교입니다. 서로 다른 튜플은 절대 같게 비교되지
//! 않으며(`cmp == Equal ⇔ eq`), 이 전순서는 저장소의 결정적 순회와
//! 안정적인 리포트 출력에도 사용됩니다.

pub mod builder;
pub mod identifier;
pub mod parser;

use std::fmt;

use serde::{Deserialize, Serialize};

use matchlock_core::error::ValidationError;

/// CPE part 속성
///
/// 바인딩 형식: `a`(애플리케이션), `o`(운영체제), `h`(하드웨어),
/// `*`(ANY), `-`(NA).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Part {
    /// 애플리케이션
    Application,
    /// 운영체제
    OperatingSystem,
    /// 하드웨어
    Hardware,
    /// ANY — 모든 part와 매칭
    #[default]
    Any,
    /// NA — 해당 없음
    Na,
}

impl Part {
    /// 바인딩된 한 글자 형식을 반환합니다.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Application => "a",
            Self::OperatingSystem => "o",
            Self::Hardware => "h",
            Self::Any => "*",
            Self::Na => "-",
        }
    }

    /// 바인딩 형식에서 part를 파싱합니다.
    pub fn from_bound(s: &str) -> Option<Self> {
        match s {
            "a" => Some(Self::Application),
            "o" => Some(Self::OperatingSystem),
            "h" => Some(Self::Hardware),
            "*" => Some(Self::Any),
            "-" => Some(Self::Na),
            _ => None,
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPE 속성 하나의 논리 값
///
/// `Value`는 well-formed(이스케이프 보존) 형식의 리터럴을 담습니다.
/// 예: 콜론을 포함하는 제품명은 `jquery\:ui`로 저장됩니다.
/// 와일드카드 `*`/`?`는 리터럴의 맨 앞 또는 맨 뒤에서만 허용됩니다.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Attribute {
    /// ANY — 모든 값과 매칭 (`*`)
    Any,
    /// NA — 해당 없음 (`-`)
    Na,
    /// well-formed 리터럴
    Value(String),
}

impl Default for Attribute {
    fn default() -> Self {
        Self::Any
    }
}

impl Attribute {
    /// well-formed 문자열에서 속성을 만들고 검증합니다.
    ///
    /// `*` → ANY, `-` → NA, 그 외에는 리터럴 문법 검증 후 `Value`.
    pub fn from_wf(name: &'static str, s: &str) -> Result<Self, ValidationError> {
        match s {
            "*" => Ok(Self::Any),
            "-" => Ok(Self::Na),
            literal => {
                validate_literal(name, literal)?;
                Ok(Self::Value(literal.to_owned()))
            }
        }
    }

    /// 바인딩된 well-formed 형식을 반환합니다.
    pub fn as_wf_str(&self) -> &str {
        match self {
            Self::Any => "*",
            Self::Na => "-",
            Self::Value(v) => v,
        }
    }

    /// 구체적 리터럴 값인지 반환합니다.
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wf_str())
    }
}

/// 리터럴 속성 값의 well-formed 문법을 검증합니다.
///
/// # 문법
///
/// - 허용 문자: `[A-Za-z0-9_]`와 대부분의 구두점 (`1.0-beta` 등은
///   이스케이프 없이 유효 — NVD 피드의 실제 표기)
/// - `\` `*` `?` `:` 공백은 백슬래시 이스케이프가 필요
/// - 이스케이프되지 않은 `*`는 맨 앞/맨 뒤에서 각각 최대 한 번,
///   `?`는 맨 앞/맨 뒤 연속 허용 (와일드카드)
/// - 후행 단독 백슬래시는 거부
pub(crate) fn validate_literal(name: &'static str, s: &str) -> Result<(), ValidationError> {
    if s.is_empty() {
        return Err(ValidationError::InvalidCharacter {
            attribute: name,
            ch: ' ',
            value: s.to_owned(),
        });
    }

    let chars: Vec<char> = s.chars().collect();
    let mut i = 0;

    // 선행 와일드카드: `*` 한 개 또는 `?` 연속
    if chars[i] == '*' {
        i += 1;
    } else {
        while i < chars.len() && chars[i] == '?' {
            i += 1;
        }
    }

    // 후행 와일드카드 경계 계산
    let mut end = chars.len();
    if end > i && chars[end - 1] == '*' && chars.get(end.wrapping_sub(2)) != Some(&'\\') {
        end -= 1;
    } else {
        while end > i && chars[end - 1] == '?' && chars.get(end.wrapping_sub(2)) != Some(&'\\') {
            end -= 1;
        }
    }

    // 본문: 영숫자/밑줄 또는 이스케이프 시퀀스만 허용
    while i < end {
        let ch = chars[i];
        if ch == '\\' {
            match chars.get(i + 1) {
                Some(next) if next.is_ascii_punctuation() || *next == ' ' => i += 2,
                _ => {
                    return Err(ValidationError::MalformedEscape {
                        attribute: name,
                        value: s.to_owned(),
                    });
                }
            }
        } else if ch == '*' || ch == '?' {
            return Err(ValidationError::EmbeddedWildcard {
                attribute: name,
                value: s.to_owned(),
            });
        } else if ch.is_ascii_alphanumeric()
            || ch == '_'
            || (ch.is_ascii_punctuation() && ch != ':')
        {
            i += 1;
        } else {
            return Err(ValidationError::InvalidCharacter {
                attribute: name,
                ch,
                value: s.to_owned(),
            });
        }
    }

    Ok(())
}

/// CPE 2.3 식별자 — 불변 속성 튜플
///
/// 필드 선언 순서가 곧 비교 순서입니다. `Eq`/`Ord`/`Hash` 파생으로
/// 튜플에 대한 전순서가 성립합니다.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cpe {
    part: Part,
    vendor: Attribute,
    product: Attribute,
    version: Attribute,
    update: Attribute,
    edition: Attribute,
    language: Attribute,
    sw_edition: Attribute,
    target_sw: Attribute,
    target_hw: Attribute,
    other: Attribute,
}

impl Cpe {
    /// 검증 없이 필드에서 조립합니다. 크레이트 내부 전용 —
    /// 빌더와 파서만 사용합니다.
    pub(crate) fn from_parts(
        part: Part,
        vendor: Attribute,
        product: Attribute,
        version: Attribute,
        update: Attribute,
        edition: Attribute,
        language: Attribute,
        sw_edition: Attribute,
        target_sw: Attribute,
        target_hw: Attribute,
        other: Attribute,
    ) -> Self {
        Self {
            part,
            vendor,
            product,
            version,
            update,
            edition,
            language,
            sw_edition,
            target_sw,
            target_hw,
            other,
        }
    }

    pub fn part(&self) -> Part {
        self.part
    }

    pub fn vendor(&self) -> &Attribute {
        &self.vendor
    }

    pub fn product(&self) -> &Attribute {
        &self.product
    }

    pub fn version(&self) -> &Attribute {
        &self.version
    }

    pub fn update(&self) -> &Attribute {
        &self.update
    }

    pub fn edition(&self) -> &Attribute {
        &self.edition
    }

    pub fn language(&self) -> &Attribute {
        &self.language
    }

    pub fn sw_edition(&self) -> &Attribute {
        &self.sw_edition
    }

    pub fn target_sw(&self) -> &Attribute {
        &self.target_sw
    }

    pub fn target_hw(&self) -> &Attribute {
        &self.target_hw
    }

    pub fn other(&self) -> &Attribute {
        &self.other
    }

    /// part를 제외한 10개 속성을 고정 순서로 반환합니다.
    pub fn components(&self) -> [&Attribute; 10] {
        [
            &self.vendor,
            &self.product,
            &self.version,
            &self.update,
            &self.edition,
            &self.language,
            &self.sw_edition,
            &self.target_sw,
            &self.target_hw,
            &self.other,
        ]
    }

    /// 정규 CPE 2.3 formatted string을 생성합니다.
    ///
    /// 속성은 항상 고정 순서로 출력되며, 튜플이 같으면 출력도 같습니다
    /// (`Cpe::parse(&c.to_canonical()) == c` 라운드트립 보장).
    pub fn to_canonical(&self) -> String {
        let c = self.components();
        format!(
            "cpe:2.3:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}",
            self.part, c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7], c[8], c[9],
        )
    }
}

impl fmt::Display for Cpe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical())
    }
}
