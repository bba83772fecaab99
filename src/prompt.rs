//! Interactive questions asked during a run
//!
//! Two kinds of question exist: a yes/no confirmation and a numbered choice
//! among suggested alternates with a skip option.

use std::io::{self, BufRead, Write};

use crate::suggest::Suggestion;
use crate::Result;

/// Source of answers to the questions the orchestrator asks
pub trait Prompter {
    /// Ask a yes/no question; anything but an explicit yes is a no
    fn confirm(&mut self, question: &str) -> Result<bool>;

    /// Offer numbered alternates for a failed package.
    ///
    /// Returns the zero-based index of the chosen suggestion, or `None` to skip.
    fn choose_alternate(
        &mut self,
        package: &str,
        suggestions: &[Suggestion],
    ) -> Result<Option<usize>>;
}

/// Prompter reading answers line by line from a reader
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompter<io::StdinLock<'static>, io::Stdout> {
    /// Prompter on the process's stdin and stdout
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `prompt` and read one trimmed line; `None` at end of input
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("\n{question} [y/N]: "))?;
        Ok(answer.is_some_and(|a| is_yes(&a)))
    }

    fn choose_alternate(
        &mut self,
        package: &str,
        suggestions: &[Suggestion],
    ) -> Result<Option<usize>> {
        if suggestions.is_empty() {
            return Ok(None);
        }

        let prompt = format!(
            "\nInstall a suggested package instead of {package}? [1-{}, Enter to skip]: ",
            suggestions.len()
        );
        let Some(answer) = self.ask(&prompt)? else {
            return Ok(None);
        };

        let choice = parse_choice(&answer, suggestions.len());
        if choice.is_none() && !answer.is_empty() && !is_skip(&answer) {
            writeln!(self.output, "'{answer}' is not one of the options, skipping")?;
        }
        Ok(choice)
    }
}

/// Prompter for unattended runs: every question is declined
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractive;

impl Prompter for NonInteractive {
    fn confirm(&mut self, _question: &str) -> Result<bool> {
        Ok(false)
    }

    fn choose_alternate(
        &mut self,
        _package: &str,
        _suggestions: &[Suggestion],
    ) -> Result<Option<usize>> {
        Ok(None)
    }
}

impl<P: Prompter + ?Sized> Prompter for Box<P> {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        (**self).confirm(question)
    }

    fn choose_alternate(
        &mut self,
        package: &str,
        suggestions: &[Suggestion],
    ) -> Result<Option<usize>> {
        (**self).choose_alternate(package, suggestions)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.to_lowercase().as_str(), "y" | "yes")
}

fn is_skip(answer: &str) -> bool {
    matches!(answer.to_lowercase().as_str(), "n" | "no" | "s" | "skip")
}

/// One-based choice to zero-based index, if within `1..=count`
fn parse_choice(answer: &str, count: usize) -> Option<usize> {
    let n: usize = answer.parse().ok()?;
    (1..=count).contains(&n).then(|| n - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;

    fn suggestions(names: &[&str]) -> Vec<Suggestion> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Suggestion {
                entry: CatalogEntry::new(i as u64 + 1, name, 0),
                similarity: 0.9 - i as f64 * 0.1,
            })
            .collect()
    }

    fn prompter(input: &str) -> TerminalPrompter<&[u8], Vec<u8>> {
        TerminalPrompter::new(input.as_bytes(), Vec::new())
    }

    #[test]
    fn test_confirm_answers() {
        assert!(prompter("y\n").confirm("Contribute?").unwrap());
        assert!(prompter("YES\n").confirm("Contribute?").unwrap());
        assert!(!prompter("n\n").confirm("Contribute?").unwrap());
        assert!(!prompter("\n").confirm("Contribute?").unwrap());
        assert!(!prompter("").confirm("Contribute?").unwrap());
    }

    #[test]
    fn test_choose_alternate() {
        let list = suggestions(&["loadash", "lodash-es", "lodash.merge"]);

        assert_eq!(prompter("1\n").choose_alternate("lodash", &list).unwrap(), Some(0));
        assert_eq!(prompter(" 3 \n").choose_alternate("lodash", &list).unwrap(), Some(2));
        assert_eq!(prompter("\n").choose_alternate("lodash", &list).unwrap(), None);
        assert_eq!(prompter("n\n").choose_alternate("lodash", &list).unwrap(), None);
        assert_eq!(prompter("4\n").choose_alternate("lodash", &list).unwrap(), None);
        assert_eq!(prompter("0\n").choose_alternate("lodash", &list).unwrap(), None);
        assert_eq!(prompter("").choose_alternate("lodash", &list).unwrap(), None);
    }

    #[test]
    fn test_invalid_choice_is_reported() {
        let list = suggestions(&["loadash"]);
        let mut p = prompter("abc\n");

        assert_eq!(p.choose_alternate("lodash", &list).unwrap(), None);
        let output = String::from_utf8(p.output).unwrap();
        assert!(output.contains("[1-1, Enter to skip]"));
        assert!(output.contains("'abc' is not one of the options"));
    }

    #[test]
    fn test_non_interactive_declines() {
        let list = suggestions(&["loadash"]);
        let mut p = NonInteractive;

        assert!(!p.confirm("Contribute?").unwrap());
        assert_eq!(p.choose_alternate("lodash", &list).unwrap(), None);
    }
}
