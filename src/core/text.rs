use super::error::ParseError;

/// Replace Slack link markup (`<target>` or `<target|display>`) with its display text.
///
/// Unterminated markup is passed through unchanged.
pub fn strip_links(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    loop {
        let Some(open) = rest.find('<') else {
            out.push_str(rest);
            break;
        };
        let span = &rest[open..];
        let Some(close) = span.find('>') else {
            out.push_str(rest);
            break;
        };
        out.push_str(&rest[..open]);
        match span.find('|') {
            Some(pipe) if pipe < close => out.push_str(&span[pipe + 1..close]),
            _ => out.push_str(&span[1..close]),
        }
        rest = &span[close + 1..];
    }
    out
}

/// Split a comma-delimited list of images, versions or PR references.
///
/// Blank input is an empty list; callers decide whether that is allowed.
pub fn parse_image_input(input: &str) -> Result<Vec<String>, ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(Vec::new());
    }
    let input = strip_links(input);
    let parts: Vec<String> = input.split(',').map(str::to_string).collect();
    if parts.iter().any(|part| part.is_empty()) {
        return Err(ParseError::EmptyInputItem);
    }
    Ok(parts)
}

/// Backtick-quote each item and join with ", " for chat output.
pub fn code_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| format!("`{}`", item.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn is_direct_message(channel: &str) -> bool {
    channel.starts_with('D')
}
