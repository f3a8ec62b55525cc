//! CPE 검증 빌더
//!
//! [`Cpe`]를 만드는 유일한 공개 경로입니다(파서 제외). 설정하지 않은
//! 속성은 ANY이며, `build()`는 모든 속성을 검증한 뒤에만 값을
//! 반환합니다 — 부분적으로 유효한 식별자는 생성되지 않습니다.

use matchlock_core::error::ValidationError;

use super::{Attribute, Cpe, Part};

/// [`Cpe`] 검증 빌더
///
/// ```
/// use matchlock_engine::{CpeBuilder, Part};
///
/// let cpe = CpeBuilder::new()
///     .part(Part::Application)
///     .vendor("apache")
///     .product("tomcat")
///     .version("9.0.1")
///     .build()
///     .unwrap();
/// assert_eq!(cpe.to_canonical(), "cpe:2.3:a:apache:tomcat:9.0.1:*:*:*:*:*:*:*");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CpeBuilder {
    part: Part,
    vendor: Option<String>,
    product: Option<String>,
    version: Option<String>,
    update: Option<String>,
    edition: Option<String>,
    language: Option<String>,
    sw_edition: Option<String>,
    target_sw: Option<String>,
    target_hw: Option<String>,
    other: Option<String>,
}

impl CpeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn part(mut self, part: Part) -> Self {
        self.part = part;
        self
    }

    pub fn vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn update(mut self, update: impl Into<String>) -> Self {
        self.update = Some(update.into());
        self
    }

    pub fn edition(mut self, edition: impl Into<String>) -> Self {
        self.edition = Some(edition.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn sw_edition(mut self, sw_edition: impl Into<String>) -> Self {
        self.sw_edition = Some(sw_edition.into());
        self
    }

    pub fn target_sw(mut self, target_sw: impl Into<String>) -> Self {
        self.target_sw = Some(target_sw.into());
        self
    }

    pub fn target_hw(mut self, target_hw: impl Into<String>) -> Self {
        self.target_hw = Some(target_hw.into());
        self
    }

    pub fn other(mut self, other: impl Into<String>) -> Self {
        self.other = Some(other.into());
        self
    }

    /// 모든 속성을 검증하고 [`Cpe`]를 생성합니다.
    ///
    /// # Errors
    ///
    /// 속성 하나라도 well-formed 문법을 위반하면 [`ValidationError`].
    pub fn build(self) -> Result<Cpe, ValidationError> {
        Ok(Cpe::from_parts(
            self.part,
            attr("vendor", self.vendor)?,
            attr("product", self.product)?,
            attr("version", self.version)?,
            attr("update", self.update)?,
            attr("edition", self.edition)?,
            attr("language", self.language)?,
            attr("sw_edition", self.sw_edition)?,
            attr("target_sw", self.target_sw)?,
            attr("target_hw", self.target_hw)?,
            attr("other", self.other)?,
        ))
    }
}

fn attr(name: &'static str, value: Option<String>) -> Result<Attribute, ValidationError> {
    match value {
        None => Ok(Attribute::Any),
        Some(v) => Attribute::from_wf(name, &v),
    }
}
