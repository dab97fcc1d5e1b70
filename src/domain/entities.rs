//! Domain entities: core data structures

use std::fmt;

use crate::domain::error::DomainError;

/// Number of ASCII digits in a region code.
pub const CODE_LENGTH: usize = 12;

/// Exclusive upper bound (in bytes) for a region name.
pub const MAX_NAME_LENGTH: usize = 100;

/// Parent code meaning "attach directly under the synthetic root".
pub const ROOT_PARENT_CODE: &str = "0";

/// Reserved code of the synthetic root. All-zero codes never occur in real data.
pub const ROOT_CODE: &str = "000000000000";

/// Display name of the synthetic root.
pub const ROOT_NAME: &str = "中华人民共和国";

/// Administrative level. `Country` is reserved for the synthetic root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Country = 0,
    Province = 1,
    Prefecture = 2,
    County = 3,
    Township = 4,
    Village = 5,
}

impl Level {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Human readable label, as shown by the original query tool.
    pub fn label(self) -> &'static str {
        match self {
            Level::Country => "国家级",
            Level::Province => "省级",
            Level::Prefecture => "地级",
            Level::County => "县级",
            Level::Township => "乡级",
            Level::Village => "村级",
        }
    }
}

impl TryFrom<u8> for Level {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Level::Country),
            1 => Ok(Level::Province),
            2 => Ok(Level::Prefecture),
            3 => Ok(Level::County),
            4 => Ok(Level::Township),
            5 => Ok(Level::Village),
            other => Err(DomainError::InvalidLevel(other)),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.label(), self.as_u8())
    }
}

/// Optional per-region statistics. A record carries at most one of them;
/// `None` on the record means "no data", which is not the same as zero.
#[derive(Debug, Clone, PartialEq)]
pub enum Extension {
    /// Average house price
    HousePrice(f64),
    /// Employment rate, kept verbatim (e.g. "95.2%")
    EmploymentRate(String),
}

/// One administrative region as delivered by the record store.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub code: String,
    pub name: String,
    pub level: Level,
    /// Code of the parent region, or [`ROOT_PARENT_CODE`]
    pub parent_code: String,
    /// Opaque classification
    pub kind: i32,
    pub extension: Option<Extension>,
}

impl Region {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        level: Level,
        parent_code: impl Into<String>,
        kind: i32,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            level,
            parent_code: parent_code.into(),
            kind,
            extension: None,
        }
    }

    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.extension = Some(extension);
        self
    }

    /// The manufactured top of the hierarchy.
    pub fn synthetic_root() -> Self {
        Self::new(ROOT_CODE, ROOT_NAME, Level::Country, ROOT_PARENT_CODE, 0)
    }

    /// True if this region hangs directly below the synthetic root.
    pub fn is_top_level(&self) -> bool {
        self.parent_code == ROOT_PARENT_CODE
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.name)
    }
}

/// True for a non-empty ASCII digit string, of exactly `length` digits if given.
pub fn is_code_of_length(code: &str, length: Option<usize>) -> bool {
    !code.is_empty()
        && code.bytes().all(|b| b.is_ascii_digit())
        && length.map_or(true, |len| code.len() == len)
}

/// Validate and normalize a code query.
///
/// Surrounding whitespace is stripped; what remains must be digits only,
/// and exactly `length` of them when a length is given.
pub fn validate_code_with(input: &str, length: Option<usize>) -> Result<&str, DomainError> {
    let code = input.trim();
    if !is_code_of_length(code, length) {
        return Err(DomainError::InvalidCode(code.to_string()));
    }
    Ok(code)
}

/// Validate and normalize a name query.
pub fn validate_name(input: &str) -> Result<&str, DomainError> {
    let name = input.trim();
    if name.is_empty() {
        return Err(DomainError::EmptyName);
    }
    if name.len() >= MAX_NAME_LENGTH {
        return Err(DomainError::NameTooLong {
            length: name.len(),
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_twelve_digits_when_validating_code_then_accepts_trimmed() {
        assert_eq!(
            validate_code_with(" 110101000000\n", Some(CODE_LENGTH)).unwrap(),
            "110101000000"
        );
    }

    #[test]
    fn given_short_or_alpha_code_when_validating_then_rejects() {
        assert!(matches!(
            validate_code_with("1101", Some(CODE_LENGTH)),
            Err(DomainError::InvalidCode(_))
        ));
        assert!(matches!(
            validate_code_with("11010100000a", Some(CODE_LENGTH)),
            Err(DomainError::InvalidCode(_))
        ));
    }

    #[test]
    fn given_no_fixed_length_when_validating_code_then_accepts_any_digit_string() {
        assert_eq!(validate_code_with("1101", None).unwrap(), "1101");
        assert!(validate_code_with("", None).is_err());
        assert!(validate_code_with("11a", None).is_err());
    }

    #[test]
    fn given_blank_name_when_validating_then_empty_name() {
        assert!(matches!(validate_name("  \t"), Err(DomainError::EmptyName)));
    }

    #[test]
    fn given_overlong_name_when_validating_then_rejects() {
        let name = "x".repeat(MAX_NAME_LENGTH);
        assert!(matches!(
            validate_name(&name),
            Err(DomainError::NameTooLong { .. })
        ));
    }

    #[test]
    fn given_level_out_of_range_when_converting_then_errors() {
        assert_eq!(Level::try_from(3).unwrap(), Level::County);
        assert!(Level::try_from(6).is_err());
    }

    #[test]
    fn given_synthetic_root_then_uses_reserved_code_and_sentinel_parent() {
        let root = Region::synthetic_root();
        assert_eq!(root.code, ROOT_CODE);
        assert!(root.is_top_level());
        assert_eq!(root.level, Level::Country);
        assert!(!is_code_of_length("0", Some(CODE_LENGTH)));
    }
}
