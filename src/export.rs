use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::library::ScenarioContent;
use crate::store::schema::Notation;

fn reading_for<'a>(notation: Notation, reading: &'a str, romaji: &'a str) -> &'a str {
    match notation {
        Notation::Furigana => reading,
        Notation::Romaji => romaji,
    }
}

fn annotated(text: &str, reading: &str) -> String {
    if reading.is_empty() || reading == text {
        text.to_string()
    } else {
        format!("{text} ({reading})")
    }
}

/// Markdown study sheet for one version.
pub fn render_markdown(content: &ScenarioContent, notation: Notation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", content.scenario);

    let _ = writeln!(out, "## Vocabulary\n");
    let _ = writeln!(out, "| Word | Reading | Meaning |");
    let _ = writeln!(out, "| --- | --- | --- |");
    for v in &content.vocabulary {
        let _ = writeln!(
            out,
            "| {} | {} | {} |",
            v.word,
            reading_for(notation, &v.reading, &v.romaji),
            v.meaning
        );
    }

    let _ = writeln!(out, "\n## Expressions\n");
    for e in &content.expressions {
        let reading = reading_for(notation, &e.reading, &e.romaji);
        let _ = writeln!(out, "- **{}**: {}", annotated(&e.phrase, reading), e.meaning);
        if let Some(note) = e.note.as_deref().filter(|n| !n.is_empty()) {
            let _ = writeln!(out, "  - {note}");
        }
    }

    let _ = writeln!(out, "\n## Dialogue");
    for section in &content.dialogue {
        let _ = writeln!(out, "\n### {}\n", section.title);
        for line in &section.lines {
            let reading = reading_for(notation, &line.reading, &line.romaji);
            let _ = writeln!(
                out,
                "**{}**: {}  ",
                line.speaker.label(),
                annotated(&line.text, reading)
            );
            if !line.translation.is_empty() {
                let _ = writeln!(out, "_{}_\n", line.translation);
            }
        }
    }
    out
}

/// File name derived from the scenario, safe for any filesystem.
pub fn sheet_file_name(content: &ScenarioContent) -> String {
    let stem: String = content
        .scenario
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    let stem = stem.trim_matches('-');
    if stem.is_empty() {
        "scenario.md".to_string()
    } else {
        format!("{stem}.md")
    }
}

pub fn write_sheet(content: &ScenarioContent, notation: Notation, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(sheet_file_name(content));
    fs::write(&path, render_markdown(content, notation))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::fixtures::content;
    use tempfile::TempDir;

    #[test]
    fn test_furigana_sheet() {
        let md = render_markdown(&content("ordering coffee", 1), Notation::Furigana);
        assert!(md.starts_with("# ordering coffee\n"));
        assert!(md.contains("| 注文 | ちゅうもん | order |"));
        assert!(md.contains("**お願いします (おねがいします)**: please"));
        // reading identical to the text is not repeated
        assert!(md.contains("**A**: いらっしゃいませ  "));
        assert!(md.contains("_Welcome_"));
    }

    #[test]
    fn test_romaji_sheet() {
        let md = render_markdown(&content("ordering coffee", 1), Notation::Romaji);
        assert!(md.contains("| 注文 | chuumon | order |"));
        assert!(md.contains("いらっしゃいませ (irasshaimase)"));
    }

    #[test]
    fn test_sheet_file_name() {
        let mut c = content("ordering coffee / cafe", 1);
        assert_eq!(sheet_file_name(&c), "ordering-coffee---cafe.md");
        c.scenario = "  ??  ".to_string();
        assert_eq!(sheet_file_name(&c), "scenario.md");
    }

    #[test]
    fn test_write_sheet() {
        let dir = TempDir::new().unwrap();
        let path = write_sheet(&content("ordering coffee", 1), Notation::Furigana, dir.path())
            .unwrap();
        assert!(fs::read_to_string(path).unwrap().contains("## Dialogue"));
    }
}
