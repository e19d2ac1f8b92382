use anyhow::Result;
use url::Url;

/// Validate a service base URL and strip trailing slashes
pub fn normalize_base_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');

    let parsed = Url::parse(trimmed)
        .map_err(|_| anyhow::anyhow!("Invalid API URL format: {}", url))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("API URL must use HTTP or HTTPS protocol");
    }

    Ok(trimmed.to_string())
}

/// Format file size in human-readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let unit_index = (bytes_f.log10() / THRESHOLD.log10()).floor() as usize;
    let unit_index = unit_index.min(UNITS.len() - 1);

    let size = bytes_f / THRESHOLD.powi(unit_index as i32);

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Format a snippet start time as `m:ss`
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u64;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Characters no common filesystem accepts in a file name
const RESERVED_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Drop reserved and control characters; everything else is kept as sent
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| !c.is_control() && !RESERVED_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// The last path component of a suggested filename, sanitized.
///
/// Both `/` and `\` count as separators; names made only of dots are rejected.
pub fn safe_file_name(suggested: &str) -> Option<String> {
    let last = suggested.rsplit(['/', '\\']).next().unwrap_or(suggested);
    let name = sanitize_filename(last);

    if name.is_empty() || name.chars().all(|c| c == '.') {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1048576), "1.0 MB");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "0:00");
        assert_eq!(format_timestamp(9.9), "0:09");
        assert_eq!(format_timestamp(61.2), "1:01");
        assert_eq!(format_timestamp(3725.0), "62:05");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Hello World!"), "Hello World!");
        assert_eq!(sanitize_filename("test:file?name*.txt"), "testfilename.txt");
        assert_eq!(sanitize_filename("a\u{0}b\tc.txt"), "abc.txt");
        assert_eq!(sanitize_filename("  spaced  "), "spaced");
    }

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("abc123_en.txt").as_deref(), Some("abc123_en.txt"));
        assert_eq!(safe_file_name("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(safe_file_name(r"C:\temp\out.pdf").as_deref(), Some("out.pdf"));
        assert_eq!(
            safe_file_name("Talk (2024), part 1.pdf").as_deref(),
            Some("Talk (2024), part 1.pdf")
        );
        assert_eq!(safe_file_name("It's <final>.docx").as_deref(), Some("It's final.docx"));
        assert_eq!(safe_file_name(".."), None);
        assert_eq!(safe_file_name("dir/"), None);
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("http://localhost:8000/").unwrap(),
            "http://localhost:8000"
        );
        assert_eq!(
            normalize_base_url("https://api.example.com/v1///").unwrap(),
            "https://api.example.com/v1"
        );
        assert!(normalize_base_url("ftp://example.com").is_err());
        assert!(normalize_base_url("not-a-url").is_err());
    }
}
