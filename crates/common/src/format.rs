//! Display formatting helpers shared across domains

/// Format a byte count into a human readable size ("1.5 MB").
///
/// Rounded to two decimal places, matching what the lesson material
/// listings display.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (value * 100.0).round() / 100.0;

    // Trim trailing zeros so whole sizes print as "4 KB", not "4.00 KB"
    let mut text = format!("{:.2}", rounded);
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }

    format!("{} {}", text, UNITS[exponent])
}
