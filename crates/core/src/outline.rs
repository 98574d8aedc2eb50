//! Heading-delimited sections and the hierarchy fold.

use serde::Serialize;

use crate::code_fence::{FenceState, advance_fence_state};
use crate::slug::normalize;

/// An ATX heading line: level and trimmed title text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingLine<'a> {
    /// Heading level (1-6).
    pub level: u8,
    /// Trimmed title text after the markers.
    pub title: &'a str,
}

/// Parse `#{1,6}<whitespace><text>` with up to three spaces of indentation.
///
/// Trailing `#` characters are kept as part of the title.
pub fn parse_heading_line(line: &str) -> Option<HeadingLine<'_>> {
    let indent = line.bytes().take_while(|b| *b == b' ').count();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let level = rest.bytes().take_while(|b| *b == b'#').count();
    if !(1..=6).contains(&level) {
        return None;
    }

    let after = &rest[level..];
    if !after.starts_with([' ', '\t']) {
        return None;
    }
    let title = after.trim();
    if title.is_empty() {
        return None;
    }

    Some(HeadingLine {
        level: level as u8,
        title,
    })
}

/// One heading and the content up to the next heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Anchor id derived from the title.
    pub id: String,
    /// Heading text as written.
    pub title: String,
    /// Heading level (1-6).
    pub level: u8,
    /// Section body. Raw Markdown straight out of [`split_sections`],
    /// rendered HTML once the pipeline has processed it.
    pub content: String,
    /// Nested sections, strictly deeper, in source order.
    pub children: Vec<Section>,
}

impl Section {
    /// Depth-first lookup by id within this section and its descendants.
    pub fn find(&self, id: &str) -> Option<&Section> {
        if self.id == id {
            return Some(self);
        }
        find_section(&self.children, id)
    }

    /// Number of sections in this subtree, including itself.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Section::count).sum::<usize>()
    }
}

/// Split a document into a flat list of sections.
///
/// Lines before the first heading belong to no section. Headings inside
/// fenced code blocks do not split. Content is left unrendered.
pub fn split_sections(raw: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;
    let mut body: Vec<&str> = Vec::new();
    let mut fence_state = FenceState::default();

    for line in raw.lines() {
        let outcome = advance_fence_state(line, fence_state);
        fence_state = outcome.next_state;

        let heading = if outcome.in_code {
            None
        } else {
            parse_heading_line(line)
        };

        match heading {
            Some(heading) => {
                if let Some(mut done) = current.take() {
                    done.content = body.join("\n");
                    sections.push(done);
                }
                body.clear();
                current = Some(Section {
                    id: normalize(heading.title),
                    title: heading.title.to_string(),
                    level: heading.level,
                    content: String::new(),
                    children: Vec::new(),
                });
            }
            None => body.push(line),
        }
    }

    if let Some(mut done) = current {
        done.content = body.join("\n");
        sections.push(done);
    }

    sections
}

/// Fold a flat, source-ordered section list into a tree.
///
/// Keeps a stack of open sections; an incoming section closes every open
/// section at the same or a deeper level, then nests under whatever is left.
pub fn build_hierarchy(flat: Vec<Section>) -> Vec<Section> {
    let mut roots = Vec::new();
    let mut stack: Vec<Section> = Vec::new();

    for section in flat {
        while stack.last().is_some_and(|top| top.level >= section.level) {
            close_top(&mut stack, &mut roots);
        }
        stack.push(section);
    }
    while !stack.is_empty() {
        close_top(&mut stack, &mut roots);
    }

    roots
}

fn close_top(stack: &mut Vec<Section>, roots: &mut Vec<Section>) {
    if let Some(done) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.push(done),
            None => roots.push(done),
        }
    }
}

/// Depth-first lookup of the first section with the given id.
pub fn find_section<'a>(sections: &'a [Section], id: &str) -> Option<&'a Section> {
    sections.iter().find_map(|section| section.find(id))
}

/// Title of the first level-1 heading outside code fences.
pub fn first_title(raw: &str) -> Option<&str> {
    let mut fence_state = FenceState::default();
    for line in raw.lines() {
        let outcome = advance_fence_state(line, fence_state);
        fence_state = outcome.next_state;
        if outcome.in_code {
            continue;
        }
        if let Some(heading) = parse_heading_line(line)
            && heading.level == 1
        {
            return Some(heading.title);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(sections: &[Section]) -> String {
        fn walk(sections: &[Section], depth: usize, out: &mut String) {
            for section in sections {
                out.push_str(&format!(
                    "{}h{} {} #{}\n",
                    "  ".repeat(depth),
                    section.level,
                    section.title,
                    section.id
                ));
                walk(&section.children, depth + 1, out);
            }
        }
        let mut out = String::new();
        walk(sections, 0, &mut out);
        out
    }

    #[test]
    fn parses_heading_lines() {
        let h = parse_heading_line("## Hello").unwrap();
        assert_eq!((h.level, h.title), (2, "Hello"));
        assert_eq!(parse_heading_line("###### Six").unwrap().level, 6);
        assert_eq!(parse_heading_line("#\tTab").unwrap().title, "Tab");
        assert_eq!(parse_heading_line("   # Indented").unwrap().title, "Indented");
        assert_eq!(parse_heading_line("# C# ##").unwrap().title, "C# ##");
    }

    #[test]
    fn rejects_non_headings() {
        assert!(parse_heading_line("####### Seven").is_none());
        assert!(parse_heading_line("#hashtag").is_none());
        assert!(parse_heading_line("#   ").is_none());
        assert!(parse_heading_line("    # code").is_none());
        assert!(parse_heading_line("text # not").is_none());
    }

    #[test]
    fn splits_on_headings_and_keeps_trailing_lines() {
        let raw = "intro dropped\n# A\nalpha\n\n## B\nbeta\ntail";
        let sections = split_sections(raw);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "A");
        assert_eq!(sections[0].content, "alpha\n");
        assert_eq!(sections[1].content, "beta\ntail");
    }

    #[test]
    fn no_heading_means_no_sections() {
        assert!(split_sections("just text\nmore").is_empty());
        assert!(split_sections("").is_empty());
    }

    #[test]
    fn fenced_hash_lines_do_not_split() {
        let raw = "# Real\n```bash\n# comment\n```\nafter";
        let sections = split_sections(raw);
        assert_eq!(sections.len(), 1);
        assert!(sections[0].content.contains("# comment"));
    }

    #[test]
    fn hierarchy_two_roots() {
        let raw = "# A\n## B\n## C\n# D";
        let tree = build_hierarchy(split_sections(raw));
        insta::assert_snapshot!(shape(&tree), @r"
        h1 A #a
          h2 B #b
          h2 C #c
        h1 D #d
        ");
    }

    #[test]
    fn hierarchy_handles_level_jumps_and_regressions() {
        let raw = "## Start\n#### Deep\n### Mid\n# Top\n### Under top\n## Back";
        let tree = build_hierarchy(split_sections(raw));
        insta::assert_snapshot!(shape(&tree), @r"
        h2 Start #start
          h4 Deep #deep
          h3 Mid #mid
        h1 Top #top
          h3 Under top #under-top
          h2 Back #back
        ");
    }

    #[test]
    fn duplicate_titles_share_ids() {
        let tree = build_hierarchy(split_sections("# Exempel\n# Exempel"));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].id, tree[1].id);
    }

    #[test]
    fn find_section_searches_depth_first() {
        let tree = build_hierarchy(split_sections("# A\n## B\n### C\n# D"));
        assert_eq!(find_section(&tree, "c").map(|s| s.level), Some(3));
        assert_eq!(find_section(&tree, "d").map(|s| s.title.as_str()), Some("D"));
        assert!(find_section(&tree, "missing").is_none());
        assert_eq!(tree[0].count(), 3);
    }

    #[test]
    fn first_title_skips_code_and_lower_levels() {
        let raw = "## Sub\n```\n# Fake\n```\n# Vägledning för HERAF\n# Second";
        assert_eq!(first_title(raw), Some("Vägledning för HERAF"));
        assert_eq!(first_title("## Only sub"), None);
    }
}
