//! Terminal output for the markdown produced by the core display types.

use std::io::{self, Write};

use anyhow::Result;
use termimad::{crossterm::style::Color, Alignment, MadSkin};

/// Prints markdown either styled through termimad or as-is.
pub struct TerminalRenderer {
    rich_enabled: bool,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new(rich_enabled: bool) -> Self {
        let mut skin = MadSkin::default();
        skin.set_headers_fg(Color::Blue);
        for header in &mut skin.headers {
            header.align = Alignment::Left;
        }
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::DarkGrey);
        skin.inline_code.set_bg(Color::AnsiValue(238));

        Self { rich_enabled, skin }
    }

    /// Write `markdown` to stdout.
    pub fn render(&self, markdown: &str) -> Result<()> {
        let mut stdout = io::stdout().lock();
        if self.rich_enabled {
            write!(stdout, "{}", self.skin.term_text(markdown))?;
        } else {
            write!(stdout, "{markdown}")?;
        }
        stdout.flush()?;
        Ok(())
    }

    /// Write several markdown blocks separated by blank lines.
    pub fn render_all<I, S>(&self, blocks: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = blocks
            .into_iter()
            .map(|block| block.as_ref().trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n\n");
        self.render(&format!("{joined}\n"))
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}
