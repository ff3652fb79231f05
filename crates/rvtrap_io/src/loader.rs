use crate::parser::{TraceLine, parse_trace};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Loads and parses a trap trace file.
pub fn load_trace_file<P: AsRef<Path>>(path: P) -> Result<Vec<TraceLine>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to open trace file {}", path.display()))?;
    parse_trace(&text).with_context(|| format!("Malformed trace file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::TraceEvent;
    use std::io::Write;

    #[test]
    fn loads_from_disk() {
        let path = std::env::temp_dir().join(format!("rvtrap-loader-{}.trace", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "# boot").unwrap();
        writeln!(file, "init").unwrap();
        writeln!(file, "@2 soft").unwrap();
        drop(file);

        let lines = load_trace_file(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].event, TraceEvent::Init);
        assert_eq!(lines[1].hart, Some(2));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_trace_file("/nonexistent/boot.trace").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/boot.trace"));
    }
}
