use std::borrow::Cow;
use std::collections::HashSet;
use std::marker::PhantomData;

use anstyle::Style;
use clap::{Command, CommandFactory};
use rustyline::{
    completion::Completer,
    highlight::Highlighter,
    hint::Hinter,
    validate::{ValidationContext, ValidationResult, Validator},
    Context,
};
use rustyline_derive::Helper;

/// Rustyline helper, that handles interactive completion, highlighting and hinting.
#[derive(Helper, Debug)]
pub(crate) struct RunHelper<T: CommandFactory> {
    app: PhantomData<T>,

    /// Labels of the program, suggested where a location is expected
    labels: Vec<String>,
}

impl<T: CommandFactory> RunHelper<T> {
    pub fn new(labels: Vec<String>) -> Self {
        RunHelper {
            app: PhantomData,
            labels,
        }
    }

    /// Split the line before the cursor in words, with an empty last word if the cursor is after
    /// a space
    fn words(line: &str) -> Option<Vec<String>> {
        // Line is considered "complete" if the last char is a space
        let complete = line.ends_with([' ', '\t']);
        let mut words = shell_words::split(line).ok()?;
        if complete {
            words.push(String::new());
        }
        Some(words)
    }
}

fn paint(style: Style, text: &str) -> String {
    format!("{style}{text}{style:#}")
}

fn suggest(command: &Command, labels: &[String], input: &[String]) -> (usize, HashSet<String>) {
    let mut suggestions: HashSet<_> = command
        .get_subcommands()
        .flat_map(|cmd| {
            std::iter::once(cmd.get_name().to_string())
                .chain(cmd.get_visible_aliases().map(ToString::to_string))
        })
        .collect();

    // If the app has subcommands, it has a `help` command
    if command.has_subcommands() {
        suggestions.insert("help".to_string());
    }

    let index = input.len().saturating_sub(1);

    // Suggest labels for the arguments taking a location
    if let Some(arg) = command.get_positionals().nth(index) {
        if arg.get_id().as_str() == "location" {
            suggestions.extend(labels.iter().cloned());
        }
    }

    match input {
        [last] => (
            last.len(),
            suggestions
                .into_iter()
                .filter(|candidate| candidate.starts_with(last))
                .collect(),
        ),

        [head, tail @ ..] => command
            .find_subcommand(head)
            .map(|sub: &Command| suggest(sub, labels, tail))
            .unwrap_or_default(),

        [] => (0, suggestions),
    }
}

impl<T: CommandFactory> Completer for RunHelper<T> {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let Some(words) = Self::words(&line[..pos]) else {
            return Ok((0, Vec::new()));
        };

        let app = T::command();
        let (offset, candidates) = suggest(&app, &self.labels, &words);
        Ok((pos - offset, candidates.into_iter().collect()))
    }
}

impl<T: CommandFactory> Highlighter for RunHelper<T> {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(paint(Style::new().dimmed(), hint))
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        Cow::Owned(paint(Style::new().bold(), prompt))
    }
}

impl<T: CommandFactory> Hinter for RunHelper<T> {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let words = Self::words(&line[..pos])?;
        let app = T::command();
        let (offset, candidates) = suggest(&app, &self.labels, &words);

        // Only hint when there is a single way to complete the word
        let mut candidates = candidates.into_iter();
        match (candidates.next(), candidates.next()) {
            (Some(candidate), None) => candidate.get(offset..).map(ToString::to_string),
            _ => None,
        }
    }
}

impl<T: CommandFactory> Validator for RunHelper<T> {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        if shell_words::split(ctx.input()).is_err() {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}
