//! Directory listing formats

use crate::storage::DirEntry;

/// Placeholder timestamp used by LIST lines.
const LIST_DATE: &str = "01-01-2000  00:00AM";
/// Placeholder `modify` fact used by MLSD lines.
const MLSD_MODIFY: &str = "20000101000000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormat {
    List,
    Nlst,
    Mlsd,
}

impl ListFormat {
    pub fn format_entry(&self, entry: &DirEntry) -> String {
        match self {
            ListFormat::List if entry.is_dir => format!("{} <DIR> {}", LIST_DATE, entry.name),
            ListFormat::List => format!("{} {} {}", LIST_DATE, entry.size, entry.name),
            ListFormat::Nlst => entry.name.clone(),
            ListFormat::Mlsd => format!(
                "Type={};Size={};modify={}; {}",
                if entry.is_dir { "dir" } else { "file" },
                entry.size,
                MLSD_MODIFY,
                entry.name
            ),
        }
    }

    /// Reply lines sent on the control channel after `count` entries.
    pub fn completion(&self, count: usize) -> String {
        match self {
            ListFormat::Mlsd => format!("226-options: -a -l\r\n226 {} matches total", count),
            _ => format!("226 {} matches total", count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_lines() {
        assert_eq!(
            ListFormat::List.format_entry(&DirEntry::dir("music")),
            "01-01-2000  00:00AM <DIR> music"
        );
        assert_eq!(
            ListFormat::List.format_entry(&DirEntry::file("a.txt", 42)),
            "01-01-2000  00:00AM 42 a.txt"
        );
    }

    #[test]
    fn test_mlsd_and_nlst_lines() {
        assert_eq!(
            ListFormat::Mlsd.format_entry(&DirEntry::file("a.txt", 42)),
            "Type=file;Size=42;modify=20000101000000; a.txt"
        );
        assert_eq!(
            ListFormat::Mlsd.format_entry(&DirEntry::dir("d")),
            "Type=dir;Size=0;modify=20000101000000; d"
        );
        assert_eq!(ListFormat::Nlst.format_entry(&DirEntry::file("a.txt", 42)), "a.txt");
    }

    #[test]
    fn test_completion() {
        assert_eq!(ListFormat::List.completion(3), "226 3 matches total");
        assert_eq!(
            ListFormat::Mlsd.completion(0),
            "226-options: -a -l\r\n226 0 matches total"
        );
    }
}
