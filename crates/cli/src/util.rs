use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Display width of a string, accounting for CJK double-width, emoji, etc.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate a string to fit within `width` display columns, ending in "…"
/// when cut. Works on display width so accented and CJK text stays aligned.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    if width == 0 {
        return String::new();
    }

    // Leave one column for the ellipsis
    let budget = width - 1;
    let mut used = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let cw = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            break;
        }
        used += cw;
        out.push(ch);
    }
    out.push('…');
    out
}

/// Pad or truncate to exactly `width` columns, text flush left.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let t = truncate_display(s, width);
    let tw = display_width(&t);
    format!("{}{}", t, " ".repeat(width.saturating_sub(tw)))
}

/// Pad or truncate to exactly `width` columns, text flush right (numbers).
pub(crate) fn pad_left(s: &str, width: usize) -> String {
    let t = truncate_display(s, width);
    let tw = display_width(&t);
    format!("{}{}", " ".repeat(width.saturating_sub(tw)), t)
}

/// Shrink column widths until they fit in `available` columns, one space
/// between columns. The widest column gives up space first; no column goes
/// below `min`.
pub(crate) fn fit_widths(widths: &[usize], available: usize, min: usize) -> Vec<usize> {
    let mut fitted = widths.to_vec();
    let total = |w: &[usize]| w.iter().sum::<usize>() + w.len().saturating_sub(1);
    while total(&fitted) > available {
        let Some((idx, widest)) = fitted
            .iter()
            .copied()
            .enumerate()
            .max_by_key(|(i, w)| (*w, std::cmp::Reverse(*i)))
        else {
            break;
        };
        if widest <= min {
            break;
        }
        fitted[idx] = widest - 1;
    }
    fitted
}
