use std::io::Write;

use crossterm::{cursor, queue, style, terminal};

/// Print a menu item string, bolding any text inside `[...]` brackets.
/// Text outside brackets is printed dim.
pub fn print_menu_item<W: Write>(out: &mut W, item: &str) -> anyhow::Result<()> {
    let mut rest = item;
    while !rest.is_empty() {
        let Some(open) = rest.find('[') else {
            queue!(
                out,
                style::SetAttribute(style::Attribute::Dim),
                style::Print(rest),
                style::SetAttribute(style::Attribute::Reset),
            )?;
            break;
        };
        if open > 0 {
            queue!(
                out,
                style::SetAttribute(style::Attribute::Dim),
                style::Print(&rest[..open]),
                style::SetAttribute(style::Attribute::Reset),
            )?;
        }
        rest = &rest[open..];
        match rest.find(']') {
            Some(close) => {
                queue!(
                    out,
                    style::SetAttribute(style::Attribute::Bold),
                    style::Print(&rest[..=close]),
                    style::SetAttribute(style::Attribute::Reset),
                )?;
                rest = &rest[close + 1..];
            }
            None => {
                queue!(out, style::Print(rest))?;
                break;
            }
        }
    }
    Ok(())
}

/// Draw a one-line menu bar of key hints on row `y`.
pub fn render_menubar<W: Write>(out: &mut W, y: u16, items: &[String]) -> anyhow::Result<()> {
    queue!(
        out,
        cursor::MoveTo(0, y),
        terminal::Clear(terminal::ClearType::CurrentLine),
        style::Print(" "),
    )?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            queue!(out, style::Print("  "))?;
        }
        print_menu_item(out, item)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printed(item: &str) -> String {
        let mut buf = Vec::new();
        print_menu_item(&mut buf, item).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn bracketed_keys_are_bold_and_labels_dim() {
        let out = printed("[q] quit");
        let bold = out.find("\x1b[1m[q]").expect("bold key");
        let dim = out.find("\x1b[2m quit").expect("dim label");
        assert!(bold < dim);
    }

    #[test]
    fn unclosed_bracket_prints_rest_verbatim() {
        assert!(printed("oops [x").ends_with("[x"));
    }
}
