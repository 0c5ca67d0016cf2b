//! Version stamps for reports and IR bundles.
//!
//! Consumers replaying stored documents must check compatibility before
//! relying on field shapes. Compatibility is decided by the major component
//! only: the integer before the first `.` or `-`, defaulting to 0.

pub const IR_VERSION: &str = "2.0.0-alpha.0";
pub const SCHEMA_VERSION: &str = "2.0.0-alpha.0";

/// Major component of a dotted or hyphenated version string.
pub fn major(version: &str) -> u64 {
    let v = version.trim();
    let head = v.split('-').next().unwrap_or_default();
    let first = head.split('.').next().unwrap_or_default();
    first.parse().unwrap_or(0)
}

pub fn versions_compatible(a: &str, b: &str) -> bool {
    major(a) == major(b)
}

pub fn is_schema_compatible(schema_version: &str) -> bool {
    versions_compatible(schema_version, SCHEMA_VERSION)
}

pub fn is_ir_compatible(ir_version: &str) -> bool {
    versions_compatible(ir_version, IR_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn major_parses_leading_integer() {
        assert_eq!(major("2.0.0-alpha.0"), 2);
        assert_eq!(major("3-rc1"), 3);
        assert_eq!(major(" 10.4 "), 10);
    }

    #[test]
    fn major_defaults_to_zero() {
        assert_eq!(major(""), 0);
        assert_eq!(major("v2.0"), 0);
        assert_eq!(major("alpha"), 0);
    }

    #[test]
    fn compatibility_compares_majors() {
        assert!(is_schema_compatible("2.1.0"));
        assert!(is_ir_compatible("2-beta"));
        assert!(!is_schema_compatible("1.9.9"));
        assert!(versions_compatible("garbage", "0.1"));
    }
}
