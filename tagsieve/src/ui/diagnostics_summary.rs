// tagsieve/src/ui/diagnostics_summary.rs
//! Prints the per-kind counts and the messages of a scan.

use std::io::{self, Write};
use tagsieve_core::{DiagnosticKind, ScanResult};

use crate::ui::output_format::styled;
use crate::ui::theme::{ThemeEntry, ThemeMap};

pub fn print_summary<W: Write>(
    result: &ScanResult,
    writer: &mut W,
    theme: &ThemeMap,
    enable_colors: bool,
) -> io::Result<()> {
    if result.is_clean() {
        return writeln!(
            writer,
            "{}",
            styled("No changes were needed.", ThemeEntry::Success, theme, enable_colors)
        );
    }

    writeln!(
        writer,
        "{}",
        styled("Scan Summary:", ThemeEntry::Header, theme, enable_colors)
    )?;
    for kind in DiagnosticKind::ALL {
        let count = result.count_of(kind);
        if count == 0 {
            continue;
        }
        writeln!(
            writer,
            "  {}: {}",
            styled(kind.as_str(), ThemeEntry::SummaryKind, theme, enable_colors),
            styled(&count.to_string(), ThemeEntry::SummaryCount, theme, enable_colors)
        )?;
    }

    writeln!(
        writer,
        "{}",
        styled("Diagnostics:", ThemeEntry::Header, theme, enable_colors)
    )?;
    for (index, diagnostic) in result.diagnostics().iter().enumerate() {
        writeln!(
            writer,
            "  {}. {}",
            index + 1,
            styled(&diagnostic.message, ThemeEntry::DiagnosticMessage, theme, enable_colors)
        )?;
    }
    writeln!(
        writer,
        "Total: {} change(s) in {:.3?}",
        result.diagnostics().len(),
        result.elapsed()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::ThemeStyle;
    use tagsieve_core::{headless_scan, Policy};

    #[test]
    fn lists_counts_then_messages() {
        let policy = Policy::load_default().unwrap();
        let result = headless_scan("<blink>a</blink><script>b</script>", &policy).unwrap();
        let mut out = Vec::new();
        print_summary(&result, &mut out, &ThemeStyle::default_theme_map(), false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("  tag_filtered: 1"));
        assert!(text.contains("  tag_removed: 1"));
        assert!(text.contains("  2. The \"script\" tag has been removed for security reasons."));
        assert!(text.contains("Total: 2 change(s)"));
    }

    #[test]
    fn clean_input_prints_one_line() {
        let policy = Policy::load_default().unwrap();
        let result = headless_scan("<b>fine</b>", &policy).unwrap();
        let mut out = Vec::new();
        print_summary(&result, &mut out, &ThemeStyle::default_theme_map(), false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No changes were needed.\n");
    }
}
