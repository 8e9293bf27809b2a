use std::path::Path;
use tracing::{error, info};

/// Splits file content into trimmed, non-empty lines, keeping their order.
pub fn parse_recipients(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Loads the recipient list once at startup.
///
/// A read failure is logged and yields an empty list, which later makes every
/// attempt skip at selection instead of aborting the run.
pub async fn load_recipients<P: AsRef<Path>>(path: P) -> Vec<String> {
    let path = path.as_ref();
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            let recipients = parse_recipients(&content);
            info!("Loaded {} recipient addresses from {:?}", recipients.len(), path);
            recipients
        }
        Err(e) => {
            error!("Failed to read address file {:?}: {}", path, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn drops_blank_lines_and_keeps_order() {
        assert_eq!(parse_recipients("0xA\n\n0xB"), vec!["0xA", "0xB"]);
        assert_eq!(
            parse_recipients("  0xC \r\n\t\n0xA\r\n   \n0xB\n"),
            vec!["0xC", "0xA", "0xB"]
        );
        assert!(parse_recipients("\n \n\t\n").is_empty());
    }

    #[tokio::test]
    async fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0x1111111111111111111111111111111111111111").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "0x2222222222222222222222222222222222222222").unwrap();

        let recipients = load_recipients(file.path()).await;
        assert_eq!(recipients.len(), 2);
        assert_eq!(recipients[1], "0x2222222222222222222222222222222222222222");
    }

    #[tokio::test]
    async fn missing_file_yields_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let recipients = load_recipients(dir.path().join("address.txt")).await;
        assert!(recipients.is_empty());
    }
}
