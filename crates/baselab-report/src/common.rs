//! Shared helpers for the report writers.

use std::path::Path;

use anyhow::{Context, Result};

/// Create the output directory if it does not exist yet.
pub(crate) fn ensure_output_dir(output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("create {}", output_dir.display()))
}

/// Format a float for the row-oriented CSVs. Integral values keep a
/// trailing `.0`, matching how polars renders the wide matrix.
pub(crate) fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_floats_keep_a_decimal_point() {
        assert_eq!(format_float(140.0), "140.0");
        assert_eq!(format_float(-2.0), "-2.0");
        assert_eq!(format_float(4.1), "4.1");
        assert_eq!(format_float(0.35), "0.35");
    }
}
