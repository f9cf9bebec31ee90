//! Seed channel-list reader
//!
//! The seed file is a plain list of category headers and channel lines:
//!
//! ```text
//! 央视频道,#genre#
//! CCTV1,http://a.test/cctv1.m3u8
//! CCTV1,http://b.test/cctv1.m3u8
//! CCTV2,
//! ```
//!
//! Categories and channels keep their first-seen order. A repeated channel
//! name accumulates its distinct URLs; `NAME,` registers the channel with no
//! URL. Lines before the first category header and lines without a comma are
//! skipped.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::models::{Category, SeedChannel};
use crate::error::SiftErrorTrait;
use crate::utils::error::ParseError;

/// Marker that turns a line into a category header
pub const GENRE_MARKER: &str = "#genre#";

/// One classified line of the seed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedLine<'a> {
    /// `CATEGORY,#genre#`
    Category(&'a str),
    /// `NAME,URL` with the URL possibly empty
    Channel { name: &'a str, url: &'a str },
}

/// Classify a single seed line
pub fn parse_seed_line(line: &str) -> Result<SeedLine<'_>, ParseError> {
    let line = line.trim();
    let (head, tail) = line
        .split_once(',')
        .ok_or_else(|| ParseError::MalformedLine(line.to_string()))?;

    if line.contains(GENRE_MARKER) {
        return Ok(SeedLine::Category(head.trim()));
    }

    let name = head.trim();
    if name.is_empty() {
        return Err(ParseError::MissingChannelName);
    }

    Ok(SeedLine::Channel {
        name,
        url: tail.trim(),
    })
}

/// Parse seed file content into categories
pub fn parse_seed(text: &str) -> Vec<Category> {
    let mut categories: Vec<Category> = Vec::new();
    let mut current: Option<usize> = None;

    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        match parse_seed_line(line) {
            Ok(SeedLine::Category(name)) => {
                // a repeated header reopens the existing category
                let idx = match categories.iter().position(|c| c.name == name) {
                    Some(idx) => idx,
                    None => {
                        categories.push(Category {
                            name: name.to_string(),
                            channels: Vec::new(),
                        });
                        categories.len() - 1
                    }
                };
                current = Some(idx);
            }
            Ok(SeedLine::Channel { name, url }) => {
                let Some(idx) = current else {
                    tracing::debug!(line, "Skipping channel line before any category");
                    continue;
                };
                add_channel_url(&mut categories[idx], name, url);
            }
            Err(e) => {
                tracing::debug!(line, error = %e, category = e.category().as_str(), "Skipping seed line");
            }
        }
    }

    categories
}

fn add_channel_url(category: &mut Category, name: &str, url: &str) {
    let channel = match category.channels.iter().position(|c| c.name == name) {
        Some(idx) => &mut category.channels[idx],
        None => {
            category.channels.push(SeedChannel {
                name: name.to_string(),
                urls: Vec::new(),
            });
            let last = category.channels.len() - 1;
            &mut category.channels[last]
        }
    };

    if !url.is_empty() && !channel.urls.iter().any(|u| u == url) {
        channel.urls.push(url.to_string());
    }
}

/// Read and parse a seed file
pub fn read_seed(path: &Path) -> Result<Vec<Category>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;

    let categories = parse_seed(&content);
    tracing::info!(
        path = %path.display(),
        categories = categories.len(),
        channels = Category::channel_names(&categories).len(),
        "Loaded seed file"
    );

    Ok(categories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SEED: &str = "\
orphan,http://orphan.test/live
央视频道,#genre#
CCTV1,http://a.test/1.m3u8
CCTV1,http://b.test/1.m3u8
CCTV1,http://a.test/1.m3u8
CCTV2,
no comma here

卫视频道,#genre#
湖南卫视,http://c.test/hn
CCTV2,http://d.test/2
";

    #[test]
    fn test_parse_seed_line() {
        assert_eq!(
            parse_seed_line("央视频道,#genre#").unwrap(),
            SeedLine::Category("央视频道")
        );
        assert_eq!(
            parse_seed_line(" CCTV1 , http://a.test ").unwrap(),
            SeedLine::Channel {
                name: "CCTV1",
                url: "http://a.test"
            }
        );
        assert_eq!(
            parse_seed_line("CCTV2,").unwrap(),
            SeedLine::Channel {
                name: "CCTV2",
                url: ""
            }
        );
        assert!(matches!(
            parse_seed_line("no comma"),
            Err(ParseError::MalformedLine(_))
        ));
        assert_eq!(
            parse_seed_line(",http://a.test"),
            Err(ParseError::MissingChannelName)
        );
    }

    #[test]
    fn test_parse_seed_structure() {
        let categories = parse_seed(SEED);
        assert_eq!(categories.len(), 2);

        let cctv = &categories[0];
        assert_eq!(cctv.name, "央视频道");
        assert_eq!(cctv.channels.len(), 2);
        assert_eq!(cctv.channels[0].name, "CCTV1");
        assert_eq!(
            cctv.channels[0].urls,
            vec!["http://a.test/1.m3u8", "http://b.test/1.m3u8"]
        );
        assert_eq!(cctv.channels[1].name, "CCTV2");
        assert!(cctv.channels[1].urls.is_empty());

        // channels are scoped to their category
        let satellite = &categories[1];
        assert_eq!(satellite.channels.len(), 2);
        assert_eq!(satellite.channels[1].urls, vec!["http://d.test/2"]);
    }

    #[test]
    fn test_orphan_lines_skipped() {
        let categories = parse_seed(SEED);
        let names = Category::channel_names(&categories);
        assert!(!names.contains(&"orphan".to_string()));
        assert_eq!(names, vec!["CCTV1", "CCTV2", "湖南卫视", "CCTV2"]);
    }

    #[test]
    fn test_read_seed_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();

        let categories = read_seed(file.path()).unwrap();
        assert_eq!(categories.len(), 2);
    }

    #[test]
    fn test_read_missing_seed_file() {
        let err = read_seed(Path::new("/nonexistent/seed.txt")).unwrap_err();
        assert!(err.to_string().contains("Failed to read seed file"));
    }
}
