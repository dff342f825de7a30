//! Line-oriented front-end: renders the visible page as text and turns typed
//! lines into session events.

use std::fmt::Write as _;
use std::io::{BufRead, Write};

use anyhow::Context;
use chrono::NaiveDate;

use crate::form::NO_ANSWER;
use crate::report::{render_history, render_report};
use crate::session::{DaySelector, Event, MenuChoice, Outcome, Page, Session};

pub fn parse_command(page: &Page, line: &str) -> Result<Event, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_lowercase().as_str() {
        "q" | "quit" | "exit" => return Ok(Event::Quit),
        "b" | "back" => return Ok(Event::Back),
        _ => {}
    }

    match page {
        Page::MainMenu => {
            let number: usize = line
                .parse()
                .map_err(|_| "Please input the option number only.".to_string())?;
            MenuChoice::from_number(number)
                .map(Event::Menu)
                .ok_or_else(|| "Invalid option.".to_string())
        }
        Page::SurveyForm(_) => match word {
            "submit" => Ok(Event::Submit),
            "set" => parse_field(rest),
            _ => parse_field(line),
        },
        Page::HistoryList(_) => match word {
            "open" => parse_day(rest).map(Event::OpenDay),
            "track" => parse_day(rest).map(Event::TrackDay),
            _ => parse_day(line).map(Event::OpenDay),
        },
        Page::Report(_) => match word {
            "note" => Ok(Event::OpenNote),
            _ => Err("Type 'note' to edit this day's note or 'back' to return.".to_string()),
        },
        Page::NoteEditor { .. } => match word {
            "save" => Ok(Event::SaveNote),
            "clear" => Ok(Event::ClearNote),
            "append" => Ok(Event::AppendNote(rest.to_string())),
            _ => Err("Use 'append <text>', 'clear', 'save' or 'back'.".to_string()),
        },
        Page::SymptomCatalog(_) | Page::SuggestedActions(_) => {
            Err("Type 'back' to return to the menu.".to_string())
        }
    }
}

fn parse_field(args: &str) -> Result<Event, String> {
    let usage = || format!("Use 'set <field> <0-10 or {NO_ANSWER}>' or 'submit'.");
    let (index, value) = match args.split_once(char::is_whitespace) {
        Some((index, value)) => (index, value.trim()),
        // A bare field number clears it.
        None if !args.is_empty() => (args, NO_ANSWER),
        None => return Err(usage()),
    };
    let index: usize = index.parse().map_err(|_| usage())?;
    Ok(Event::SetField {
        index,
        input: value.to_string(),
    })
}

fn parse_day(args: &str) -> Result<DaySelector, String> {
    if let Ok(position) = args.parse::<usize>() {
        return Ok(DaySelector::Position(position));
    }
    NaiveDate::parse_from_str(args, "%Y-%m-%d")
        .map(DaySelector::Date)
        .map_err(|_| format!("'{args}' is not a list number or a date like 2024-01-31."))
}

pub fn render_page(session: &Session) -> String {
    let mut output = String::new();
    let page = session.current_page();

    let _ = writeln!(output, "== {} ==", page.title());
    match page {
        Page::MainMenu => {
            let dataset = session.dataset();
            let today = session.today();
            let _ = writeln!(
                output,
                "Hello {}, today's date is {}. What would you like to do?",
                dataset.profile.name, today
            );
            if dataset.profile.is_off_day(today) {
                let _ = writeln!(output, "Today is one of your off days.");
            }
            let _ = writeln!(output);
            for (index, choice) in MenuChoice::ALL.iter().enumerate() {
                let _ = writeln!(output, "{}. {}", index + 1, choice.label());
            }
            let _ = writeln!(output, "q. Quit");
        }
        Page::SurveyForm(form) => {
            let _ = writeln!(output, "How were your symptoms on {}?", form.date);
            let _ = writeln!(output, "Enter 0-10, or {NO_ANSWER} for no answer.");
            for (index, field) in form.fields.iter().enumerate() {
                let marker = if session.focus() == Some(field.symptom_id.as_str()) {
                    '>'
                } else {
                    ' '
                };
                let _ = writeln!(output, "{marker}{:>3}. {}: {}", index + 1, field.label, field.input);
            }
            let _ = writeln!(output, "Commands: set <n> <value>, submit, back");
        }
        Page::Report(report) => {
            output.push_str(&render_report(report));
            let _ = writeln!(output, "Commands: note, back");
        }
        Page::HistoryList(entries) => {
            output.push_str(&render_history(entries));
            let _ = writeln!(output, "Commands: open <n|date>, track <n|date>, back");
        }
        Page::NoteEditor { date, text } => {
            let _ = writeln!(output, "Note for {date}:");
            if text.is_empty() {
                let _ = writeln!(output, "(empty)");
            } else {
                output.push_str(text);
                if !text.ends_with('\n') {
                    output.push('\n');
                }
            }
            let _ = writeln!(output, "Commands: append <text>, clear, save, back");
        }
        Page::SymptomCatalog(symptoms) => {
            for symptom in symptoms {
                let polarity = if symptom.higher_is_better {
                    "higher is better"
                } else {
                    "lower is better"
                };
                let _ = writeln!(
                    output,
                    "- {} ({}): weight {}, {}",
                    symptom.name, symptom.id, symptom.weight, polarity
                );
            }
        }
        Page::SuggestedActions(actions) => {
            if actions.is_empty() {
                let _ = writeln!(output, "No suggested actions configured.");
            }
            for action in actions {
                let _ = writeln!(
                    output,
                    "- {}: scores {:.1} to {:.1}",
                    action.name, action.min_score, action.max_score
                );
            }
        }
    }

    output
}

/// Drives the session until the user quits or input ends.
pub fn run<R: BufRead, W: Write>(session: &mut Session, mut input: R, mut output: W) -> anyhow::Result<()> {
    let mut line = String::new();
    loop {
        write!(output, "\n{}", render_page(session)).context("failed to write page")?;
        if let Some(status) = session.take_status() {
            writeln!(output, "{status}").context("failed to write status")?;
        }
        write!(output, "> ").context("failed to write prompt")?;
        output.flush().context("failed to flush output")?;

        line.clear();
        if input.read_line(&mut line).context("failed to read input")? == 0 {
            return Ok(());
        }
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(session.current_page(), &line) {
            Ok(event) => {
                if session.handle(event) == Outcome::Quit {
                    return Ok(());
                }
            }
            Err(message) => writeln!(output, "{message}").context("failed to write message")?,
        }
    }
}
