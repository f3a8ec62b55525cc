//! CPE 문자열 파서
//!
//! CPE 2.3 formatted string을 파싱하고, 접두어가 `cpe:/`인 입력은
//! 레거시 2.2 URI 바인딩으로 파싱합니다.
//!
//! NVD 피드에는 이스케이프 규칙을 위반한 식별자가 실제로 섞여 있어서
//! (예: `\` 뒤에 구두점이 아닌 문자), 관용 모드([`Cpe::parse_lenient`])는
//! 단독 stray 백슬래시만 제거하고 파싱을 계속합니다. 그 외의 문법 위반은
//! 관용 모드에서도 거부됩니다.

use matchlock_core::error::ParseError;

use super::{Attribute, Cpe, Part};

/// CPE 2.3 formatted string의 콜론 구분 필드 수
/// (`cpe` + `2.3` + part + 속성 10개)
const FS_FIELD_COUNT: usize = 13;

/// 2.2 URI 바인딩의 최대 필드 수 (part..language)
const URI_MAX_FIELDS: usize = 7;

const ATTRIBUTE_NAMES: [&'static str; 10] = [
    "vendor",
    "product",
    "version",
    "update",
    "edition",
    "language",
    "sw_edition",
    "target_sw",
    "target_hw",
    "other",
];

impl Cpe {
    /// CPE 문자열을 엄격 모드로 파싱합니다.
    ///
    /// `cpe:2.3:` 접두어는 formatted string으로, `cpe:/` 접두어는
    /// 2.2 URI 바인딩으로 해석합니다. 그 외 접두어는
    /// [`ParseError::InvalidPrefix`]입니다.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        Self::parse_mode(input, false)
    }

    /// CPE 문자열을 관용 모드로 파싱합니다.
    ///
    /// 단독 stray 백슬래시(뒤따르는 문자가 구두점이 아닌 `\`)를
    /// 제거한 뒤 파싱합니다. 다른 오류는 엄격 모드와 동일하게 거부됩니다.
    pub fn parse_lenient(input: &str) -> Result<Self, ParseError> {
        Self::parse_mode(input, true)
    }

    fn parse_mode(input: &str, lenient: bool) -> Result<Self, ParseError> {
        if let Some(rest) = input.strip_prefix("cpe:2.3:") {
            parse_formatted(input, rest, lenient)
        } else if let Some(rest) = input.strip_prefix("cpe:/") {
            parse_uri(input, rest)
        } else {
            Err(ParseError::InvalidPrefix {
                input: input.to_owned(),
            })
        }
    }
}

/// `cpe:2.3:` 이후의 필드들을 파싱합니다.
fn parse_formatted(input: &str, rest: &str, lenient: bool) -> Result<Cpe, ParseError> {
    let fields = split_unescaped_colons(rest);
    if fields.len() != FS_FIELD_COUNT - 2 {
        return Err(ParseError::FieldCount {
            input: input.to_owned(),
            found: fields.len() + 2,
            expected: FS_FIELD_COUNT,
        });
    }

    let part = Part::from_bound(&fields[0]).ok_or_else(|| ParseError::InvalidPart {
        part: fields[0].clone(),
    })?;

    let mut attrs: Vec<Attribute> = Vec::with_capacity(10);
    for (name, raw) in ATTRIBUTE_NAMES.iter().zip(&fields[1..]) {
        let wf = if lenient {
            strip_stray_backslashes(raw)
        } else {
            if has_stray_backslash(raw) {
                return Err(ParseError::StrayBackslash {
                    input: input.to_owned(),
                });
            }
            raw.clone()
        };
        attrs.push(Attribute::from_wf(name, &wf)?);
    }

    let mut it = attrs.into_iter();
    // zip 길이를 위에서 확인했으므로 10개가 보장됨
    Ok(Cpe::from_parts(
        part,
        it.next().unwrap_or_default(),
        it.next().unwrap_or_default(),
        it.next().unwrap_or_default(),
        it.next().unwrap_or_default(),
        it.next().unwrap_or_default(),
        it.next().unwrap_or_default(),
        it.next().unwrap_or_default(),
        it.next().unwrap_or_default(),
        it.next().unwrap_or_default(),
        it.next().unwrap_or_default(),
    ))
}

/// `cpe:/` 이후의 2.2 URI 바인딩 필드들을 파싱합니다.
///
/// URI 바인딩은 퍼센트 인코딩을 사용하며 콜론 이스케이프가 없습니다.
/// 빈 필드와 생략된 후행 필드는 ANY로 해석합니다.
fn parse_uri(input: &str, rest: &str) -> Result<Cpe, ParseError> {
    let fields: Vec<&str> = rest.split(':').collect();
    if fields.is_empty() || fields.len() > URI_MAX_FIELDS {
        return Err(ParseError::FieldCount {
            input: input.to_owned(),
            found: fields.len(),
            expected: URI_MAX_FIELDS,
        });
    }

    let part = match fields[0] {
        "" => Part::Any,
        p => Part::from_bound(p).ok_or_else(|| ParseError::InvalidPart { part: p.to_owned() })?,
    };

    // URI 필드 순서: vendor, product, version, update, edition, language
    let mut attrs = [const { Attribute::Any }; 10];
    for (idx, raw) in fields[1..].iter().enumerate() {
        let wf = decode_uri_component(raw);
        attrs[idx] = Attribute::from_wf(ATTRIBUTE_NAMES[idx], &wf)?;
    }

    let [vendor, product, version, update, edition, language, sw_edition, target_sw, target_hw, other] =
        attrs;
    Ok(Cpe::from_parts(
        part, vendor, product, version, update, edition, language, sw_edition, target_sw,
        target_hw, other,
    ))
}

/// 이스케이프되지 않은 콜론으로 분할합니다. `\:`는 필드 내부 문자입니다.
fn split_unescaped_colons(s: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for ch in s.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
        } else if ch == '\\' {
            current.push(ch);
            escaped = true;
        } else if ch == ':' {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    fields.push(current);
    fields
}

/// stray 백슬래시(구두점·공백이 뒤따르지 않는 `\`) 존재 여부
fn has_stray_backslash(s: &str) -> bool {
    let chars: Vec<char> = s.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' {
            match chars.get(i + 1) {
                Some(next) if next.is_ascii_punctuation() || *next == ' ' => i += 2,
                _ => return true,
            }
        } else {
            i += 1;
        }
    }
    false
}

/// stray 백슬래시를 제거합니다. 유효한 이스케이프 시퀀스는 보존합니다.
fn strip_stray_backslashes(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' {
            match chars.get(i + 1) {
                Some(next) if next.is_ascii_punctuation() || *next == ' ' => {
                    out.push('\\');
                    out.push(*next);
                    i += 2;
                }
                Some(_) => i += 1, // stray — 제거하고 다음 문자부터 재개
                None => i += 1,    // 후행 단독 백슬래시 — 제거
            }
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

/// 2.2 URI 필드를 well-formed 2.3 형식으로 변환합니다.
///
/// - 빈 필드 → `*` (ANY)
/// - `%01` → `?`, `%02` → `*` (2.2 와일드카드 인코딩)
/// - 그 외 퍼센트 시퀀스는 디코드; 예약 문자(`\` `*` `?` `:` 공백)는
///   백슬래시로 이스케이프
fn decode_uri_component(raw: &str) -> String {
    if raw.is_empty() {
        return "*".to_owned();
    }
    if raw == "-" {
        return "-".to_owned();
    }

    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < bytes.len() {
        let ch = bytes[i] as char;
        if ch == '%' {
            match percent_pair(bytes, i) {
                Some(0x01) => out.push('?'),
                Some(0x02) => out.push('*'),
                Some(b) => push_wf_char(&mut out, b as char),
                None => push_wf_char(&mut out, '%'),
            }
            if percent_pair(bytes, i).is_some() {
                i += 3;
            } else {
                i += 1;
            }
        } else {
            push_wf_char(&mut out, ch);
            i += 1;
        }
    }
    out
}

/// `bytes[i]`가 `%`일 때 뒤 두 자리 16진수를 디코드합니다.
fn percent_pair(bytes: &[u8], i: usize) -> Option<u8> {
    let hi = *bytes.get(i + 1)? as char;
    let lo = *bytes.get(i + 2)? as char;
    let hi = hi.to_digit(16)? as u8;
    let lo = lo.to_digit(16)? as u8;
    Some(hi * 16 + lo)
}

/// 디코드된 문자를 well-formed 형식으로 추가합니다.
/// 이스케이프가 필요한 예약 문자만 백슬래시를 앞에 붙입니다.
fn push_wf_char(out: &mut String, ch: char) {
    if matches!(ch, '\\' | '*' | '?' | ':' | ' ') {
        out.push('\\');
    }
    out.push(ch);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formatted_string() {
        let cpe = Cpe::parse("cpe:2.3:a:apache:tomcat:9.0.1:*:*:*:*:*:*:*").unwrap();
        assert_eq!(cpe.part(), Part::Application);
        assert_eq!(cpe.vendor().as_wf_str(), "apache");
        assert_eq!(cpe.product().as_wf_str(), "tomcat");
        assert_eq!(cpe.version().as_wf_str(), "9.0.1");
        assert_eq!(cpe.update(), &Attribute::Any);
    }

    #[test]
    fn parses_na_attribute() {
        let cpe = Cpe::parse("cpe:2.3:a:apache:tomcat:9.0.1:-:*:*:*:*:*:*").unwrap();
        assert_eq!(cpe.update(), &Attribute::Na);
    }

    #[test]
    fn parses_escaped_colon_inside_field() {
        let cpe = Cpe::parse(r"cpe:2.3:a:jquery:jquery\:ui:1.12.1:*:*:*:*:*:*:*").unwrap();
        assert_eq!(cpe.product().as_wf_str(), r"jquery\:ui");
    }

    #[test]
    fn roundtrips_canonical_form() {
        let inputs = [
            "cpe:2.3:a:mortbay:jetty:6.1:*:*:*:*:*:*:*",
            r"cpe:2.3:a:vendor:product\-x:1.0\.beta:-:*:*:*:*:*:*",
            "cpe:2.3:o:linux:linux_kernel:5.15:*:*:*:*:*:*:*",
        ];
        for input in inputs {
            let cpe = Cpe::parse(input).unwrap();
            assert_eq!(cpe.to_canonical(), input);
            assert_eq!(Cpe::parse(&cpe.to_canonical()).unwrap(), cpe);
        }
    }

    #[test]
    fn rejects_wrong_prefix() {
        let err = Cpe::parse("cpx:2.3:a:v:p:1:*:*:*:*:*:*:*").unwrap_err();
        assert!(matches!(err, ParseError::InvalidPrefix { .. }));
    }

    #[test]
    fn rejects_wrong_field_count() {
        let err = Cpe::parse("cpe:2.3:a:vendor:product").unwrap_err();
        assert!(matches!(
            err,
            ParseError::FieldCount {
                found: 5,
                expected: 13,
                ..
            }
        ));
    }

    #[test]
    fn rejects_invalid_part() {
        let err = Cpe::parse("cpe:2.3:x:v:p:1:*:*:*:*:*:*:*").unwrap_err();
        assert!(matches!(err, ParseError::InvalidPart { .. }));
    }

    #[test]
    fn strict_rejects_stray_backslash() {
        let err = Cpe::parse(r"cpe:2.3:a:v:bad\product:1:*:*:*:*:*:*:*").unwrap_err();
        assert!(matches!(err, ParseError::StrayBackslash { .. }));
    }

    #[test]
    fn lenient_strips_stray_backslash() {
        let cpe = Cpe::parse_lenient(r"cpe:2.3:a:v:bad\product:1:*:*:*:*:*:*:*").unwrap();
        assert_eq!(cpe.product().as_wf_str(), "badproduct");
    }

    #[test]
    fn lenient_preserves_valid_escapes() {
        let cpe = Cpe::parse_lenient(r"cpe:2.3:a:v:a\.b\cd:1:*:*:*:*:*:*:*").unwrap();
        assert_eq!(cpe.product().as_wf_str(), r"a\.bcd");
    }

    #[test]
    fn lenient_still_rejects_embedded_wildcard() {
        let err = Cpe::parse_lenient("cpe:2.3:a:v:p:1*2:*:*:*:*:*:*:*").unwrap_err();
        assert!(matches!(err, ParseError::Attribute(_)));
    }

    #[test]
    fn parses_legacy_uri() {
        let cpe = Cpe::parse("cpe:/a:mortbay:jetty:6.1").unwrap();
        assert_eq!(cpe.part(), Part::Application);
        assert_eq!(cpe.vendor().as_wf_str(), "mortbay");
        assert_eq!(cpe.product().as_wf_str(), "jetty");
        assert_eq!(cpe.version().as_wf_str(), "6.1");
        assert_eq!(cpe.update(), &Attribute::Any);
        assert_eq!(cpe.other(), &Attribute::Any);
    }

    #[test]
    fn uri_percent_decodes_literal() {
        let cpe = Cpe::parse("cpe:/a:acme:web%2dserver:1.0").unwrap();
        assert_eq!(cpe.product().as_wf_str(), "web-server");
    }

    #[test]
    fn uri_percent_decoded_colon_is_escaped() {
        let cpe = Cpe::parse("cpe:/a:jquery:jquery%3aui:1.12").unwrap();
        assert_eq!(cpe.product().as_wf_str(), r"jquery\:ui");
    }

    #[test]
    fn uri_empty_field_is_any() {
        let cpe = Cpe::parse("cpe:/a:acme::1.0").unwrap();
        assert_eq!(cpe.product(), &Attribute::Any);
    }

    #[test]
    fn uri_wildcard_encoding() {
        let cpe = Cpe::parse("cpe:/a:acme:server%02:1.0").unwrap();
        assert_eq!(cpe.product().as_wf_str(), "server*");
    }

    #[test]
    fn uri_version_dots_stay_bare() {
        let cpe = Cpe::parse("cpe:/a:acme:server:1.0.2").unwrap();
        assert_eq!(cpe.version().as_wf_str(), "1.0.2");
    }

    #[test]
    fn uri_rejects_too_many_fields() {
        let err = Cpe::parse("cpe:/a:b:c:d:e:f:g:h").unwrap_err();
        assert!(matches!(err, ParseError::FieldCount { .. }));
    }
}
