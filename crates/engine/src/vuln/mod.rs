//! 취약 소프트웨어 레코드
//!
//! 피드의 매치 술어 하나가 레코드 하나가 됩니다. CPE 튜플에 버전 경계
//! 4종(시작 포함/제외, 끝 포함/제외)과 vulnerable 플래그를 더한 불변
//! 값 객체입니다. 경계가 하나도 없으면 정확-인스턴스 취약점(식별자의
//! version 속성으로만 매칭), 하나라도 있으면 범위 취약점입니다.

pub mod version;

use std::fmt;

use serde::{Deserialize, Serialize};

use matchlock_core::error::ValidationError;

use crate::cpe::Cpe;

/// 취약 소프트웨어 레코드
///
/// `Ord`는 CPE 튜플, 경계 4종(고정 순서), vulnerable 플래그 순의
/// 필드 단위 비교입니다. 파생 구현이 필드 선언 순서를 따릅니다.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VulnerableSoftware {
    cpe: Cpe,
    version_start_including: Option<String>,
    version_start_excluding: Option<String>,
    version_end_including: Option<String>,
    version_end_excluding: Option<String>,
    vulnerable: bool,
}

impl VulnerableSoftware {
    pub fn cpe(&self) -> &Cpe {
        &self.cpe
    }

    pub fn version_start_including(&self) -> Option<&str> {
        self.version_start_including.as_deref()
    }

    pub fn version_start_excluding(&self) -> Option<&str> {
        self.version_start_excluding.as_deref()
    }

    pub fn version_end_including(&self) -> Option<&str> {
        self.version_end_including.as_deref()
    }

    pub fn version_end_excluding(&self) -> Option<&str> {
        self.version_end_excluding.as_deref()
    }

    pub fn vulnerable(&self) -> bool {
        self.vulnerable
    }

    /// 경계가 하나라도 선언되어 있으면 범위 취약점입니다.
    pub fn has_range(&self) -> bool {
        self.version_start_including.is_some()
            || self.version_start_excluding.is_some()
            || self.version_end_including.is_some()
            || self.version_end_excluding.is_some()
    }
}

impl fmt::Display for VulnerableSoftware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cpe.to_canonical())?;
        if let Some(v) = &self.version_start_including {
            write!(f, " [{v}")?;
        } else if let Some(v) = &self.version_start_excluding {
            write!(f, " ({v}")?;
        } else if self.has_range() {
            write!(f, " (")?;
        }
        if let Some(v) = &self.version_end_including {
            write!(f, ", {v}]")?;
        } else if let Some(v) = &self.version_end_excluding {
            write!(f, ", {v})")?;
        } else if self.has_range() {
            write!(f, ", )")?;
        }
        Ok(())
    }
}

/// [`VulnerableSoftware`] 검증 빌더
#[derive(Debug, Clone)]
pub struct VulnerableSoftwareBuilder {
    cpe: Cpe,
    version_start_including: Option<String>,
    version_start_excluding: Option<String>,
    version_end_including: Option<String>,
    version_end_excluding: Option<String>,
    vulnerable: bool,
}

impl VulnerableSoftwareBuilder {
    pub fn new(cpe: Cpe) -> Self {
        Self {
            cpe,
            version_start_including: None,
            version_start_excluding: None,
            version_end_including: None,
            version_end_excluding: None,
            vulnerable: true,
        }
    }

    pub fn version_start_including(mut self, v: impl Into<String>) -> Self {
        self.version_start_including = Some(v.into());
        self
    }

    pub fn version_start_excluding(mut self, v: impl Into<String>) -> Self {
        self.version_start_excluding = Some(v.into());
        self
    }

    pub fn version_end_including(mut self, v: impl Into<String>) -> Self {
        self.version_end_including = Some(v.into());
        self
    }

    pub fn version_end_excluding(mut self, v: impl Into<String>) -> Self {
        self.version_end_excluding = Some(v.into());
        self
    }

    pub fn vulnerable(mut self, vulnerable: bool) -> Self {
        self.vulnerable = vulnerable;
        self
    }

    /// 레코드를 생성합니다. 빈 문자열 경계는 거부됩니다.
    pub fn build(self) -> Result<VulnerableSoftware, ValidationError> {
        check_boundary("version_start_including", &self.version_start_including)?;
        check_boundary("version_start_excluding", &self.version_start_excluding)?;
        check_boundary("version_end_including", &self.version_end_including)?;
        check_boundary("version_end_excluding", &self.version_end_excluding)?;
        Ok(VulnerableSoftware {
            cpe: self.cpe,
            version_start_including: self.version_start_including,
            version_start_excluding: self.version_start_excluding,
            version_end_including: self.version_end_including,
            version_end_excluding: self.version_end_excluding,
            vulnerable: self.vulnerable,
        })
    }
}

fn check_boundary(name: &'static str, value: &Option<String>) -> Result<(), ValidationError> {
    match value {
        Some(v) if v.is_empty() => Err(ValidationError::InvalidCharacter {
            attribute: name,
            ch: ' ',
            value: String::new(),
        }),
        _ => Ok(()),
    }
}
