/// Shorten an identifier for table display
pub fn format_id(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() <= 12 {
        id.to_string()
    } else {
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

/// Format timestamp in human-readable format
pub fn format_timestamp(timestamp: &chrono::DateTime<chrono::Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn format_optional_id(id: Option<i64>) -> String {
    id.map(|id| format!("#{}", id)).unwrap_or_else(|| "-".to_string())
}

/// Prompt user for yes/no confirmation. Unreadable input counts as "no".
pub fn confirm_action(prompt: &str) -> bool {
    use std::io::{self, Write};

    print!("{} (y/N): ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }

    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Print a formatted table border
pub fn print_table_border(width: usize) {
    println!("{}", "=".repeat(width));
}

/// Print a table row with columns
pub fn print_table_row(columns: &[&str], widths: &[usize]) {
    let mut row = String::new();
    for (i, col) in columns.iter().enumerate() {
        if i < widths.len() {
            row.push_str(&format!("{:<width$}  ", col, width = widths[i]));
        }
    }
    println!("{}", row.trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_id() {
        assert_eq!(format_id("short"), "short");
        assert_eq!(
            format_id("7f3c2a10-9b1e-4c55-8d7e-0a1b2c3d4e5f"),
            "7f3c2a...4e5f"
        );
    }

    #[test]
    fn test_format_id_counts_characters() {
        assert_eq!(format_id("séance-über-ñandú"), "séance...andú");
        assert_eq!(format_id("ééééééééééé"), "ééééééééééé");
    }

    #[test]
    fn test_format_optional_id() {
        assert_eq!(format_optional_id(Some(4)), "#4");
        assert_eq!(format_optional_id(None), "-");
    }
}
