//! Text layout: newline splitting and fixed-width line wrapping.

use crate::CHAR_WIDTH;

/// Split a message into lines on embedded newlines (`\n` or `\r\n`).
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

/// Number of character cells that fit in `width_px` pixels.
pub fn columns_for(width_px: u32) -> usize {
    (width_px / CHAR_WIDTH) as usize
}

/// Wrap each line into chunks of at most `width_chars` characters.
///
/// Line order is preserved and chunks of one line stay consecutive. A line
/// with no characters produces no chunks. A width of zero is treated as one.
///
/// ```
/// use pollpanel::text::auto_return;
///
/// assert_eq!(auto_return(&["abcdefgh"], 4), vec!["abcd", "efgh"]);
/// assert_eq!(auto_return(&["ab"], 4), vec!["ab"]);
/// ```
pub fn auto_return<S: AsRef<str>>(lines: &[S], width_chars: usize) -> Vec<String> {
    let width = width_chars.max(1);
    let mut wrapped = Vec::with_capacity(lines.len());

    for line in lines {
        let chars: Vec<char> = line.as_ref().chars().collect();
        wrapped.extend(chars.chunks(width).map(|chunk| chunk.iter().collect::<String>()));
    }

    wrapped
}
