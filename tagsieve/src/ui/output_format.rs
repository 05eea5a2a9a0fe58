// tagsieve/src/ui/output_format.rs
//! Themed one-line status messages.

use owo_colors::OwoColorize;
use std::io::{self, Write};

use crate::ui::theme::{ThemeEntry, ThemeMap};

/// Applies the theme color for `entry` when `enable_colors` is set.
pub fn styled(text: &str, entry: ThemeEntry, theme: &ThemeMap, enable_colors: bool) -> String {
    if !enable_colors {
        return text.to_string();
    }
    match theme.get(&entry).and_then(|style| style.fg.as_ref()) {
        Some(color) => text.color(color.to_ansi_color()).to_string(),
        None => text.to_string(),
    }
}

fn print_message<W: Write>(
    writer: &mut W,
    prefix: &str,
    message: &str,
    entry: ThemeEntry,
    theme: &ThemeMap,
    enable_colors: bool,
) -> io::Result<()> {
    writeln!(
        writer,
        "{}",
        styled(&format!("{}{}", prefix, message), entry, theme, enable_colors)
    )
}

pub fn print_info_message<W: Write>(
    writer: &mut W,
    message: &str,
    theme: &ThemeMap,
    enable_colors: bool,
) -> io::Result<()> {
    print_message(writer, "", message, ThemeEntry::Info, theme, enable_colors)
}

pub fn print_success_message<W: Write>(
    writer: &mut W,
    message: &str,
    theme: &ThemeMap,
    enable_colors: bool,
) -> io::Result<()> {
    print_message(writer, "", message, ThemeEntry::Success, theme, enable_colors)
}

pub fn print_warn_message<W: Write>(
    writer: &mut W,
    message: &str,
    theme: &ThemeMap,
    enable_colors: bool,
) -> io::Result<()> {
    print_message(writer, "Warning: ", message, ThemeEntry::Warn, theme, enable_colors)
}

pub fn print_error_message<W: Write>(
    writer: &mut W,
    message: &str,
    theme: &ThemeMap,
    enable_colors: bool,
) -> io::Result<()> {
    print_message(writer, "Error: ", message, ThemeEntry::Error, theme, enable_colors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::ThemeStyle;

    #[test]
    fn plain_output_has_no_escapes() {
        let theme = ThemeStyle::default_theme_map();
        let mut out = Vec::new();
        print_error_message(&mut out, "boom", &theme, false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Error: boom\n");
    }

    #[test]
    fn colored_output_strips_back_to_plain() {
        let theme = ThemeStyle::default_theme_map();
        let colored = styled("ok", ThemeEntry::Success, &theme, true);
        assert_ne!(colored, "ok");
        let stripped = strip_ansi_escapes::strip(colored.as_bytes());
        assert_eq!(String::from_utf8(stripped).unwrap(), "ok");
    }
}
