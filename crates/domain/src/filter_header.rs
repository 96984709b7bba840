const HEADER_LINES_TO_PARSE: usize = 50;

/// Metadata found in the `! Tag: value` comment block at the top of a filter list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterHeader {
    pub title: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub version: Option<String>,
    pub expires: Option<String>,
    pub time_updated: Option<String>,
}

pub fn parse_filter_header<S: AsRef<str>>(rules: &[S]) -> FilterHeader {
    let head = &rules[..rules.len().min(HEADER_LINES_TO_PARSE)];

    FilterHeader {
        title: parse_tag(head, "Title"),
        description: parse_tag(head, "Description"),
        homepage: parse_tag(head, "Homepage"),
        version: parse_tag(head, "Version"),
        expires: parse_tag(head, "Expires"),
        time_updated: parse_tag(head, "TimeUpdated"),
    }
}

// Last occurrence wins.
fn parse_tag<S: AsRef<str>>(lines: &[S], tag: &str) -> Option<String> {
    let needle = format!("! {}: ", tag);
    lines
        .iter()
        .filter_map(|line| {
            let line = line.as_ref();
            line.find(&needle)
                .map(|idx| line[idx + needle.len()..].trim().to_string())
        })
        .filter(|value| !value.is_empty())
        .last()
}
