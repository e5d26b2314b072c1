//! Story file loader
//!
//! Stories are plain text:
//!
//! ```text
//! # comments start with '#'
//! Scenario: search for rust
//! Given the user is in the Google search page
//! When the user fills in the fields:
//! | key | value |
//! | q   | rust  |
//! And the user does a search
//! Then there should be results
//! ```
//!
//! Table lines belong to the step right above them.

use std::path::Path;

use super::ScenarioError;
use crate::page::ImportTable;

/// Extension of story files picked up from a directory
pub const STORY_EXTENSION: &str = "story";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Given,
    When,
    Then,
    And,
    But,
}

impl Keyword {
    fn split(line: &str) -> Option<(Keyword, &str)> {
        let (word, rest) = line.split_once(char::is_whitespace)?;
        let keyword = match word {
            "Given" => Keyword::Given,
            "When" => Keyword::When,
            "Then" => Keyword::Then,
            "And" => Keyword::And,
            "But" => Keyword::But,
            _ => return None,
        };
        Some((keyword, rest.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub keyword: Keyword,
    pub text: String,
    pub table: Option<ImportTable>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Story {
    pub file: String,
    pub scenarios: Vec<Scenario>,
}

struct PendingStep {
    keyword: Keyword,
    text: String,
    line: usize,
    table_lines: Vec<(usize, String)>,
}

pub struct StoryLoader;

impl StoryLoader {
    /// Parse story text; `file` only labels error messages
    pub fn parse(content: &str, file: &str) -> Result<Story, ScenarioError> {
        let parse_error = |line: usize, message: String| ScenarioError::Parse {
            file: file.to_string(),
            line,
            message,
        };

        let mut scenarios: Vec<Scenario> = Vec::new();
        let mut pending: Option<PendingStep> = None;

        for (index, raw) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('|') {
                match pending.as_mut() {
                    Some(step) => step.table_lines.push((line_no, line.to_string())),
                    None => {
                        return Err(parse_error(line_no, "table without a step".to_string()))
                    }
                }
                continue;
            }

            if let Some(step) = pending.take() {
                Self::finish_step(step, &mut scenarios, file)?;
            }

            if let Some(name) = line.strip_prefix("Scenario:") {
                scenarios.push(Scenario {
                    name: name.trim().to_string(),
                    steps: Vec::new(),
                });
                continue;
            }

            let (keyword, text) = Keyword::split(line)
                .ok_or_else(|| parse_error(line_no, format!("unrecognised line '{}'", line)))?;
            if scenarios.is_empty() {
                return Err(parse_error(line_no, "step outside of a scenario".to_string()));
            }
            pending = Some(PendingStep {
                keyword,
                text: text.to_string(),
                line: line_no,
                table_lines: Vec::new(),
            });
        }

        if let Some(step) = pending.take() {
            Self::finish_step(step, &mut scenarios, file)?;
        }

        Ok(Story {
            file: file.to_string(),
            scenarios,
        })
    }

    fn finish_step(
        step: PendingStep,
        scenarios: &mut [Scenario],
        file: &str,
    ) -> Result<(), ScenarioError> {
        let table = if step.table_lines.is_empty() {
            None
        } else {
            let first_line = step.table_lines[0].0;
            let table = ImportTable::parse(step.table_lines.iter().map(|(_, l)| l.as_str()))
                .map_err(|e| ScenarioError::Parse {
                    file: file.to_string(),
                    line: first_line,
                    message: e.to_string(),
                })?;
            Some(table)
        };

        if let Some(scenario) = scenarios.last_mut() {
            scenario.steps.push(Step {
                keyword: step.keyword,
                text: step.text,
                table,
                line: step.line,
            });
        }
        Ok(())
    }

    pub fn load_file(path: &Path) -> Result<Story, ScenarioError> {
        let content = std::fs::read_to_string(path).map_err(|e| ScenarioError::Parse {
            file: path.display().to_string(),
            line: 0,
            message: e.to_string(),
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Load every `.story` file in `dir`, sorted by file name
    pub fn load_directory(dir: &Path) -> Result<Vec<Story>, ScenarioError> {
        let io_error = |e: std::io::Error| ScenarioError::Parse {
            file: dir.display().to_string(),
            line: 0,
            message: e.to_string(),
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(STORY_EXTENSION)
            {
                paths.push(path);
            }
        }
        paths.sort();

        paths.iter().map(|p| Self::load_file(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const STORY: &str = r#"
# Search
Scenario: search for rust
Given the user is in the Google search page
When the user fills in the fields:
| key | value |
| q   | rust  |
And the user does a search
Then there should be results

Scenario: random data
Given the user is in the Google search page
And the page is populated with random data
"#;

    #[test]
    fn test_parse_story() {
        let story = StoryLoader::parse(STORY, "search.story").unwrap();

        assert_eq!(story.scenarios.len(), 2);
        let first = &story.scenarios[0];
        assert_eq!(first.name, "search for rust");
        assert_eq!(first.steps.len(), 4);
        assert_eq!(first.steps[0].keyword, Keyword::Given);
        assert_eq!(first.steps[0].text, "the user is in the Google search page");
        assert_eq!(first.steps[0].line, 4);

        let table = first.steps[1].table.as_ref().unwrap();
        assert_eq!(table.headers, vec!["key", "value"]);
        assert_eq!(table.rows[0].get("value"), Some("rust"));
        assert!(first.steps[2].table.is_none());

        assert_eq!(story.scenarios[1].steps[1].keyword, Keyword::And);
    }

    #[test]
    fn test_step_outside_scenario() {
        let err = StoryLoader::parse("Given the user is in the Home page", "x.story").unwrap_err();
        match err {
            ScenarioError::Parse { file, line, message } => {
                assert_eq!(file, "x.story");
                assert_eq!(line, 1);
                assert!(message.contains("outside"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unrecognised_line() {
        let err = StoryLoader::parse("Scenario: a\nPerhaps the user waits", "x.story").unwrap_err();
        assert!(matches!(err, ScenarioError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_table_without_step() {
        let err = StoryLoader::parse("Scenario: a\n| key | value |", "x.story").unwrap_err();
        assert!(err.to_string().contains("table without a step"));
    }

    #[test]
    fn test_ragged_table() {
        let content = "Scenario: a\nWhen the user enters the values:\n| a | b |\n| 1 |";
        let err = StoryLoader::parse(content, "x.story").unwrap_err();
        assert!(matches!(err, ScenarioError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_load_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.story"), STORY).unwrap();
        fs::write(
            dir.path().join("a.story"),
            "Scenario: only\nGiven the user is in the Google results page\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let stories = StoryLoader::load_directory(dir.path()).unwrap();
        assert_eq!(stories.len(), 2);
        assert!(stories[0].file.ends_with("a.story"));
        assert_eq!(stories[1].scenarios.len(), 2);
    }
}
