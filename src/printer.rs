use std::io::Write;

use crossterm::{cursor, execute, terminal};

use crate::prelude::*;

// Markdown language constant string
const DEFAULT_THEME: &str = "ansi";
const DEFAULT_LANGUAGE: &str = "markdown";
const DEFAULT_WIDTH: usize = 80;

/// Writes assistant replies and shows progress while requests are in flight.
#[derive(Debug, Clone, Copy, Default)]
pub struct Printer {
    pretty: bool,
    spinner: bool,
}

impl Printer {
    pub fn new(pretty: bool, spinner: bool) -> Self {
        Self { pretty, spinner }
    }

    /// No markdown rendering and no spinner.
    pub fn plain() -> Self {
        Self::default()
    }

    /// Runs `f` with a spinner on stdout.
    ///
    /// Failing to clear the spinner line is logged and otherwise ignored.
    pub fn wait<T>(&self, f: impl FnOnce() -> T) -> T {
        if !self.spinner {
            return f();
        }

        let mut sp = spinners::Spinner::new(
            spinners::Spinners::OrangeBluePulse,
            "Loading...".into(),
        );
        let value = f();
        sp.stop();

        if let Err(e) = clear_line() {
            log::warn!("unable to clear the spinner: {e}");
        }

        value
    }

    /// Writes an assistant reply. In pretty mode a markdown rendering failure falls back to the
    /// plain line.
    ///
    /// # Errors
    ///
    /// Will return `Err` only if writing to `output` fails.
    pub fn reply(&self, output: &mut impl Write, content: &str) -> Result<()> {
        let rendered = if self.pretty {
            Some(render_markdown(content))
        } else {
            None
        };

        write_reply(output, content, rendered)
    }
}

fn clear_line() -> Result<()> {
    let mut stdout = std::io::stdout();
    execute!(
        stdout,
        cursor::MoveToColumn(0),
        terminal::Clear(terminal::ClearType::CurrentLine)
    )?;
    stdout.flush()?;

    Ok(())
}

fn write_reply(
    output: &mut impl Write,
    content: &str,
    rendered: Option<Result<String>>,
) -> Result<()> {
    match rendered {
        Some(Ok(markdown)) => {
            writeln!(output, "Assistant:")?;
            writeln!(output, "{markdown}")?;
        }
        Some(Err(e)) => {
            log::warn!("{e}, printing the reply as plain text");
            writeln!(output, "Assistant: {content}")?;
        }
        None => writeln!(output, "Assistant: {content}")?,
    }

    output.flush()?;
    Ok(())
}

/// Highlights markdown with `bat`, returning the colored text instead of printing it.
pub fn render_markdown(content: &str) -> Result<String> {
    let theme = std::env::var("BAT_THEME").unwrap_or_else(|_| DEFAULT_THEME.to_string());
    let term_width = terminal::size()
        .map(|(width, _)| width as usize)
        .unwrap_or(DEFAULT_WIDTH);

    let config = bat::config::Config {
        colored_output: true,
        true_color: true,
        language: Some(DEFAULT_LANGUAGE),
        theme,
        term_width,
        use_italic_text: true,
        wrapping_mode: bat::WrappingMode::Character,
        ..Default::default()
    };
    let assets = bat::assets::HighlightingAssets::from_binary();
    let inputs = vec![bat::input::Input::from_reader(Box::new(content.as_bytes()))];

    let mut output = String::new();

    let controller = bat::controller::Controller::new(&config, &assets);
    controller.run(inputs, Some(&mut output))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_replies_are_prefixed() {
        let mut output = Vec::new();

        Printer::plain().reply(&mut output, "Hi there").unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "Assistant: Hi there\n");
    }

    #[test]
    fn wait_without_spinner_just_runs() {
        assert_eq!(Printer::plain().wait(|| 42), 42);
    }

    #[test]
    fn wait_with_spinner_returns_the_value() {
        assert_eq!(Printer::new(false, true).wait(|| "done"), "done");
    }

    #[test]
    fn pretty_replies_are_rendered_below_the_label() {
        let mut output = Vec::new();

        Printer::new(true, false)
            .reply(&mut output, "# Title")
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("Assistant:\n"), "{output:?}");
        assert!(output.contains("Title"), "{output:?}");
    }

    #[test]
    fn render_failures_fall_back_to_plain_text() {
        let mut output = Vec::new();

        write_reply(
            &mut output,
            "Hi there",
            Some(Err(Error::Io(std::io::Error::other("no terminal")))),
        )
        .unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "Assistant: Hi there\n");
    }
}
