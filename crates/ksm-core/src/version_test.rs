use super::*;
use std::collections::HashSet;

fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

#[test]
fn test_parse_simple() {
    assert_eq!(v("0.1").parts(), &[0, 1]);
    assert_eq!(v("1.2.3").parts(), &[1, 2, 3]);
    assert_eq!(v("7").parts(), &[7]);
}

#[test]
fn test_parse_strips_v_prefix_and_whitespace() {
    assert_eq!(v("v0.2").parts(), &[0, 2]);
    assert_eq!(v("V10.0").parts(), &[10, 0]);
    assert_eq!(v("  1.4 ").parts(), &[1, 4]);
}

#[test]
fn test_parse_rejects_malformed() {
    for bad in ["", "   ", "v", ".1", "1.", "1..2", "1.a", "1.-2", "+1", "1.2 .3", "a.b"] {
        let err = Version::parse(bad).unwrap_err();
        assert!(
            matches!(err, CoreError::InvalidVersion { .. }),
            "expected InvalidVersion for {bad:?}, got {err:?}"
        );
    }
}

#[test]
fn test_parse_rejects_overflow() {
    assert!(Version::parse("99999999999999999999999.1").is_err());
}

#[test]
fn test_display_is_canonical() {
    assert_eq!(v("v0.02").to_string(), "0.2");
    assert_eq!(v("1.0.0").to_string(), "1.0.0");
}

#[test]
fn test_compare_zero_pads_shorter() {
    assert_eq!(v("1.2").cmp(&v("1.2.0")), Ordering::Equal);
    assert_eq!(v("1.2"), v("1.2.0.0"));
    assert!(v("1.2") < v("1.2.1"));
    assert!(v("1.10") > v("1.9"));
    assert!(v("2") > v("1.99.99"));
}

#[test]
fn test_compare_reflexive() {
    for s in ["0", "0.1", "3.2.1", "10.0.7"] {
        assert_eq!(v(s).cmp(&v(s)), Ordering::Equal);
    }
}

#[test]
fn test_compare_is_total_order() {
    let all: Vec<Version> = ["0.1", "0.2", "0.10", "1", "1.0.1", "1.1", "2.0", "0.1.0"]
        .iter()
        .map(|s| v(s))
        .collect();

    for a in &all {
        for b in &all {
            // antisymmetry
            assert_eq!(a.cmp(b), b.cmp(a).reverse(), "{a} vs {b}");
            for c in &all {
                if a <= b && b <= c {
                    assert!(a <= c, "transitivity failed for {a} {b} {c}");
                }
            }
        }
    }
}

#[test]
fn test_hash_consistent_with_eq() {
    let mut set = HashSet::new();
    set.insert(v("1.2"));
    assert!(set.contains(&v("1.2.0")));
    assert!(!set.contains(&v("1.2.1")));
}

#[test]
fn test_sorting() {
    let mut versions = vec![v("0.10"), v("0.2"), v("1.0"), v("0.9.1")];
    versions.sort();
    let sorted: Vec<String> = versions.iter().map(ToString::to_string).collect();
    assert_eq!(sorted, vec!["0.2", "0.9.1", "0.10", "1.0"]);
}
