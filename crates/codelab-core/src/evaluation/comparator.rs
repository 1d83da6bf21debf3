//! Output comparison for challenge checks.

/// `true` when `output`, stripped of leading and trailing whitespace, equals
/// `expected` exactly. `expected` is used as given.
pub fn evaluate(output: &str, expected: &str) -> bool {
    output.trim() == expected
}
