//! Region record store: CSV text to validated regions.
//!
//! Line format: `code,name,level,parent_code,type[,avg_house_price[,employment_rate]]`.
//! The first line is treated as a header only if it does not parse as a record.

use tracing::{debug, warn};

use crate::domain::{
    is_code_of_length, Extension, Level, Region, MAX_NAME_LENGTH, ROOT_CODE, ROOT_PARENT_CODE,
};

/// Placeholder used by the source data for a missing employment rate.
const NOT_AVAILABLE: &str = "N/A";

/// A line the loader refused, with a reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    /// 1-based line number
    pub line: usize,
    pub reason: String,
}

/// Records parsed from one input.
#[derive(Debug, Clone, Default)]
pub struct LoadedRecords {
    pub regions: Vec<Region>,
    pub rejected: Vec<RejectedLine>,
    /// True if the first line was skipped as a header
    pub header_skipped: bool,
    /// Number of data lines ignored because `max_records` was reached
    pub ignored_over_limit: usize,
}

/// Parse CSV `content` into regions, keeping at most `max_records`.
///
/// Codes must have exactly `code_length` digits when a length is given.
pub fn parse_regions(
    content: &str,
    max_records: usize,
    code_length: Option<usize>,
) -> LoadedRecords {
    let mut loaded = LoadedRecords::default();

    for (i, raw) in content.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        match parse_line(line, code_length) {
            Ok(region) => {
                if loaded.regions.len() >= max_records {
                    loaded.ignored_over_limit += 1;
                    continue;
                }
                loaded.regions.push(region);
            }
            Err(_) if line_no == 1 => {
                debug!("skipping header: {}", line);
                loaded.header_skipped = true;
            }
            Err(reason) => {
                warn!("line {} rejected: {}", line_no, reason);
                loaded.rejected.push(RejectedLine {
                    line: line_no,
                    reason,
                });
            }
        }
    }

    if loaded.ignored_over_limit > 0 {
        warn!(
            "record limit {} reached, {} lines ignored",
            max_records, loaded.ignored_over_limit
        );
    }
    loaded
}

/// Parse one data line into a [`Region`].
pub fn parse_line(line: &str, code_length: Option<usize>) -> Result<Region, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 5 {
        return Err(format!("expected at least 5 fields, got {}", fields.len()));
    }

    let code = fields[0];
    if !is_code_of_length(code, code_length) {
        return Err(format!("invalid code '{}'", code));
    }
    if code == ROOT_CODE {
        return Err(format!("code '{}' is reserved for the country root", code));
    }

    let name = fields[1];
    if name.is_empty() {
        return Err("empty name".to_string());
    }
    if name.len() >= MAX_NAME_LENGTH {
        return Err(format!("name too long ({} bytes)", name.len()));
    }

    let level = fields[2]
        .parse::<u8>()
        .map_err(|_| format!("invalid level '{}'", fields[2]))
        .and_then(|l| Level::try_from(l).map_err(|e| e.to_string()))?;

    let parent_code = fields[3];
    if parent_code != ROOT_PARENT_CODE && !is_code_of_length(parent_code, code_length) {
        return Err(format!("invalid parent code '{}'", parent_code));
    }

    let kind = fields[4]
        .parse::<i32>()
        .map_err(|_| format!("invalid type '{}'", fields[4]))?;

    let mut region = Region::new(code, name, level, parent_code, kind);
    region.extension = parse_extension(fields.get(5).copied(), fields.get(6).copied());
    Ok(region)
}

/// A positive price wins; otherwise a rate other than "N/A"; otherwise no data.
fn parse_extension(price: Option<&str>, rate: Option<&str>) -> Option<Extension> {
    if let Some(price) = price.and_then(|p| p.parse::<f64>().ok()) {
        if price > 0.0 {
            return Some(Extension::HousePrice(price));
        }
    }
    match rate {
        Some(rate) if !rate.is_empty() && rate != NOT_AVAILABLE => {
            Some(Extension::EmploymentRate(rate.to_string()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CODE_LENGTH;
    use rstest::rstest;

    const STRICT: Option<usize> = Some(CODE_LENGTH);

    #[test]
    fn given_header_line_when_parsing_then_skips_it() {
        let content = "code,name,level,parent_code,type\n110000000000,北京市,1,0,0\n";
        let loaded = parse_regions(content, 10, STRICT);
        assert!(loaded.header_skipped);
        assert!(loaded.rejected.is_empty());
        assert_eq!(loaded.regions.len(), 1);
        assert_eq!(loaded.regions[0].name, "北京市");
    }

    #[test]
    fn given_no_header_when_parsing_then_first_line_is_data() {
        let content = "110000000000,北京市,1,0,0\r\n110100000000,市辖区,2,110000000000,0\r\n";
        let loaded = parse_regions(content, 10, STRICT);
        assert!(!loaded.header_skipped);
        assert_eq!(loaded.regions.len(), 2);
        assert_eq!(loaded.regions[1].parent_code, "110000000000");
    }

    #[rstest]
    #[case("110000000000,北京市,1,0", "expected at least 5 fields")]
    #[case("1100,北京市,1,0,0", "invalid code")]
    #[case("110000000000,,1,0,0", "empty name")]
    #[case("110000000000,北京市,9,0,0", "invalid level")]
    #[case("110000000000,北京市,x,0,0", "invalid level")]
    #[case("110000000000,北京市,1,11,0", "invalid parent code")]
    #[case("110000000000,北京市,1,0,abc", "invalid type")]
    #[case("000000000000,伪造,1,0,0", "reserved for the country root")]
    fn given_malformed_line_when_parsing_then_rejects_with_reason(
        #[case] line: &str,
        #[case] reason: &str,
    ) {
        let err = parse_line(line, STRICT).unwrap_err();
        assert!(err.contains(reason), "{err}");
    }

    #[test]
    fn given_malformed_data_line_when_loading_then_continues_and_reports() {
        let content = "110000000000,北京市,1,0,0\nbroken\n120000000000,天津市,1,0,0\n";
        let loaded = parse_regions(content, 10, STRICT);
        assert_eq!(loaded.regions.len(), 2);
        assert_eq!(loaded.rejected.len(), 1);
        assert_eq!(loaded.rejected[0].line, 2);
    }

    #[rstest]
    #[case("110000000000,a,1,0,0", None)]
    #[case("110000000000,a,1,0,0,52000.5", Some(Extension::HousePrice(52000.5)))]
    #[case("110000000000,a,1,0,0,0,95%", Some(Extension::EmploymentRate("95%".into())))]
    #[case("110000000000,a,1,0,0,0,N/A", None)]
    #[case("110000000000,a,1,0,0,1200,95%", Some(Extension::HousePrice(1200.0)))]
    fn given_optional_columns_when_parsing_then_picks_extension(
        #[case] line: &str,
        #[case] expected: Option<Extension>,
    ) {
        assert_eq!(parse_line(line, STRICT).unwrap().extension, expected);
    }

    #[test]
    fn given_free_code_length_when_parsing_then_accepts_short_codes() {
        let region = parse_line("1101,Dongcheng,2,11,0", None).unwrap();
        assert_eq!(region.code, "1101");
        assert!(parse_line("1101,Dongcheng,2,11,0", STRICT).is_err());
    }

    #[test]
    fn given_record_limit_when_parsing_then_ignores_excess_lines() {
        let content = "110000000000,a,1,0,0\n120000000000,b,1,0,0\n130000000000,c,1,0,0\n";
        let loaded = parse_regions(content, 2, STRICT);
        assert_eq!(loaded.regions.len(), 2);
        assert_eq!(loaded.ignored_over_limit, 1);
    }
}
