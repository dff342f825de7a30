//! The interactive session: owns the dataset and the page stack, and turns
//! user events into explicit page transitions.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::{Result, TrackerError};
use crate::form::{self, SurveyForm};
use crate::models::{Dataset, SuggestedAction, Symptom};
use crate::nav::{Focus, NavigationStack};
use crate::report::{self, DayReport, HistoryEntry};
use crate::store::{NoteStore, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    TrackSymptoms,
    TodaysReport,
    EditNote,
    PreviousDays,
    MySymptoms,
    MyActions,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 6] = [
        MenuChoice::TrackSymptoms,
        MenuChoice::TodaysReport,
        MenuChoice::EditNote,
        MenuChoice::PreviousDays,
        MenuChoice::MySymptoms,
        MenuChoice::MyActions,
    ];

    pub fn from_number(number: usize) -> Option<Self> {
        number
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index).copied())
    }

    pub fn label(self) -> &'static str {
        match self {
            MenuChoice::TrackSymptoms => "Track my symptoms",
            MenuChoice::TodaysReport => "See today's report",
            MenuChoice::EditNote => "Edit daily note",
            MenuChoice::PreviousDays => "See previous days",
            MenuChoice::MySymptoms => "My symptoms",
            MenuChoice::MyActions => "My suggested actions",
        }
    }
}

#[derive(Debug)]
pub enum Page {
    MainMenu,
    SurveyForm(SurveyForm),
    Report(DayReport),
    HistoryList(Vec<HistoryEntry>),
    NoteEditor { date: NaiveDate, text: String },
    SymptomCatalog(Vec<Symptom>),
    SuggestedActions(Vec<SuggestedAction>),
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Page::MainMenu => "Main menu",
            Page::SurveyForm(_) => "Track symptoms",
            Page::Report(_) => "Report",
            Page::HistoryList(_) => "Previous days",
            Page::NoteEditor { .. } => "Daily note",
            Page::SymptomCatalog(_) => "My symptoms",
            Page::SuggestedActions(_) => "My suggested actions",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaySelector {
    /// 1-based position in the history list.
    Position(usize),
    Date(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Menu(MenuChoice),
    Back,
    Quit,
    SetField { index: usize, input: String },
    Submit,
    OpenDay(DaySelector),
    TrackDay(DaySelector),
    OpenNote,
    AppendNote(String),
    ClearNote,
    SaveNote,
}

#[derive(Debug)]
pub enum Transition {
    Stay,
    Push(Page, Option<Focus>),
    Pop,
    ReplaceTop(Page, Option<Focus>),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
}

pub struct Session {
    dataset: Dataset,
    store: Store,
    notes: NoteStore,
    nav: NavigationStack<Page>,
    today: NaiveDate,
    status: Option<String>,
}

impl Session {
    pub fn new(dataset: Dataset, store: Store, notes: NoteStore, today: NaiveDate) -> Self {
        Self {
            dataset,
            store,
            notes,
            nav: NavigationStack::new(Page::MainMenu),
            today,
            status: None,
        }
    }

    /// Loads the dataset; validation failures stop the session before it
    /// starts.
    pub fn open(store: Store, notes: NoteStore, today: NaiveDate) -> Result<Self> {
        let dataset = store.load()?;
        Ok(Self::new(dataset, store, notes, today))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn current_page(&self) -> &Page {
        const ROOT: &Page = &Page::MainMenu;
        // The root page is never popped, so this only covers an empty stack.
        self.nav.current().unwrap_or(ROOT)
    }

    pub fn navigation(&self) -> &NavigationStack<Page> {
        &self.nav
    }

    pub fn focus(&self) -> Option<&str> {
        self.nav.focus()
    }

    pub fn take_status(&mut self) -> Option<String> {
        self.status.take()
    }

    /// Runs one event to completion. Errors become a status message and
    /// leave the page stack where it was.
    pub fn handle(&mut self, event: Event) -> Outcome {
        match self.dispatch(event) {
            Ok(Transition::Quit) => return Outcome::Quit,
            Ok(transition) => self.apply(transition),
            Err(err) => {
                if err.is_empty_result() {
                    self.status = Some(format!("Nothing to show: {err}"));
                } else {
                    warn!(error = %err, page = self.current_page().title(), "action failed");
                    self.status = Some(format!("Error: {err}"));
                }
            }
        }
        Outcome::Continue
    }

    fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::Stay | Transition::Quit => {}
            Transition::Push(page, focus) => self.nav.push_page(page, focus),
            Transition::Pop => {
                if self.nav.pop_page(None) {
                    self.refresh_history();
                }
            }
            Transition::ReplaceTop(page, focus) => self.nav.replace_top(page, focus),
        }
    }

    /// Scores are never cached, so a history list shown again is re-listed.
    fn refresh_history(&mut self) {
        if let Some(Page::HistoryList(entries)) = self.nav.current_mut() {
            *entries = report::list_days(&self.dataset);
        }
    }

    fn dispatch(&mut self, event: Event) -> Result<Transition> {
        match event {
            Event::Quit => Ok(Transition::Quit),
            Event::Back => Ok(Transition::Pop),
            Event::Menu(choice) => self.on_menu(choice),
            Event::SetField { index, input } => self.on_set_field(index, &input),
            Event::Submit => self.on_submit(),
            Event::OpenDay(selector) => {
                let date = self.resolve_day(&selector)?;
                let report = report::build_report(&self.dataset, &self.notes, date)?;
                Ok(Transition::Push(Page::Report(report), None))
            }
            Event::TrackDay(selector) => {
                let date = self.resolve_day(&selector)?;
                Ok(self.survey_page(date))
            }
            Event::OpenNote => {
                let date = match self.current_page() {
                    Page::Report(report) => Some(report.date),
                    _ => None,
                };
                match date {
                    Some(date) => self.note_page(date),
                    None => self.unavailable("note"),
                }
            }
            Event::AppendNote(line) => self.edit_note(|text| {
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push('\n');
                }
                text.push_str(&line);
                text.push('\n');
            }),
            Event::ClearNote => self.edit_note(String::clear),
            Event::SaveNote => self.on_save_note(),
        }
    }

    fn on_menu(&mut self, choice: MenuChoice) -> Result<Transition> {
        if !matches!(self.current_page(), Page::MainMenu) {
            return self.unavailable("menu selection");
        }

        match choice {
            MenuChoice::TrackSymptoms => Ok(self.survey_page(self.today)),
            MenuChoice::TodaysReport => {
                let report = report::build_report(&self.dataset, &self.notes, self.today)?;
                Ok(Transition::Push(Page::Report(report), None))
            }
            MenuChoice::EditNote => self.note_page(self.today),
            MenuChoice::PreviousDays => {
                let entries = report::list_days(&self.dataset);
                let focus = entries.first().map(|entry| entry.date.to_string());
                Ok(Transition::Push(Page::HistoryList(entries), focus))
            }
            MenuChoice::MySymptoms => {
                let symptoms = self
                    .dataset
                    .symptoms_by_name()
                    .into_iter()
                    .cloned()
                    .collect();
                Ok(Transition::Push(Page::SymptomCatalog(symptoms), None))
            }
            MenuChoice::MyActions => Ok(Transition::Push(
                Page::SuggestedActions(self.dataset.actions.clone()),
                None,
            )),
        }
    }

    fn survey_page(&self, date: NaiveDate) -> Transition {
        let form = form::build_form(&self.dataset, date);
        let focus = form.fields.first().map(|field| field.symptom_id.clone());
        Transition::Push(Page::SurveyForm(form), focus)
    }

    fn note_page(&self, date: NaiveDate) -> Result<Transition> {
        let text = self.notes.read_note(date)?;
        Ok(Transition::Push(Page::NoteEditor { date, text }, None))
    }

    fn on_set_field(&mut self, index: usize, input: &str) -> Result<Transition> {
        if !matches!(self.nav.current(), Some(Page::SurveyForm(_))) {
            return self.unavailable("set");
        }
        let Some(Page::SurveyForm(form)) = self.nav.current_mut() else {
            return Ok(Transition::Stay);
        };
        // Positions are shown 1-based.
        let updated = index
            .checked_sub(1)
            .map(|index| form.set_field(index, input))
            .unwrap_or(false);
        if !updated {
            self.status = Some(format!("There is no field {index}."));
            return Ok(Transition::Stay);
        }
        // Focus moves to the next field, or stays on the last one.
        let focus = form
            .fields
            .get(index)
            .or_else(|| form.fields.last())
            .map(|field| field.symptom_id.clone());
        self.nav.set_focus(focus);
        Ok(Transition::Stay)
    }

    fn on_submit(&mut self) -> Result<Transition> {
        let form = match self.nav.current() {
            Some(Page::SurveyForm(form)) => Some(form.clone()),
            _ => None,
        };
        let Some(form) = form else {
            return self.unavailable("submit");
        };

        let previous = self.dataset.day(form.date).cloned();
        let day = form::submit(&mut self.dataset, &form)?;
        if let Err(err) = self.store.save(&self.dataset) {
            match previous {
                Some(previous) => self.dataset.put_day(previous),
                None => {
                    self.dataset.days.remove(&form.date);
                }
            }
            return Err(err);
        }
        info!(date = %day.date, readings = day.readings.len(), "survey submitted");

        match report::build_report(&self.dataset, &self.notes, day.date) {
            Ok(report) => Ok(Transition::ReplaceTop(Page::Report(report), None)),
            Err(TrackerError::NoSubmission(date)) => {
                self.status = Some(format!("Saved. No readings recorded for {date}."));
                Ok(Transition::Pop)
            }
            Err(err) => Err(err),
        }
    }

    fn edit_note(&mut self, edit: impl FnOnce(&mut String)) -> Result<Transition> {
        if let Some(Page::NoteEditor { text, .. }) = self.nav.current_mut() {
            edit(text);
            return Ok(Transition::Stay);
        }
        self.unavailable("note editing")
    }

    fn on_save_note(&mut self) -> Result<Transition> {
        let note = match self.nav.current() {
            Some(Page::NoteEditor { date, text }) => Some((*date, text.clone())),
            _ => None,
        };
        let Some((date, text)) = note else {
            return self.unavailable("save");
        };
        self.notes.write_note(date, &text)?;
        self.store.save(&self.dataset)?;
        self.status = Some(format!("Saved note for {date}."));
        Ok(Transition::Stay)
    }

    fn resolve_day(&self, selector: &DaySelector) -> Result<NaiveDate> {
        match selector {
            DaySelector::Date(date) => Ok(*date),
            DaySelector::Position(position) => match self.current_page() {
                Page::HistoryList(entries) => position
                    .checked_sub(1)
                    .and_then(|index| entries.get(index))
                    .map(|entry| entry.date)
                    .ok_or(TrackerError::NoSuchEntry(*position)),
                _ => Err(TrackerError::NoSuchEntry(*position)),
            },
        }
    }

    fn unavailable(&mut self, action: &str) -> Result<Transition> {
        self.status = Some(format!(
            "'{action}' is not available on the {} page.",
            self.current_page().title().to_lowercase()
        ));
        Ok(Transition::Stay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::parse_dataset;
    use tempfile::TempDir;

    const DATA: &str = r#"{
        "name": "Sam",
        "symptoms": [
            {"id": "sleep", "name": "Sleep", "weight": 1},
            {"id": "mood", "name": "Mood", "higherIsBetter": true, "weight": 0.5}
        ],
        "actions": [{"name": "Celebrate", "minScore": 7.5, "maxScore": 10}]
    }"#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn session(dir: &TempDir) -> Session {
        let store = Store::new(dir.path().join("data.json"));
        store.save(&parse_dataset(DATA).unwrap()).unwrap();
        let notes = NoteStore::new(dir.path().join("notes"));
        Session::open(store, notes, date(2024, 1, 1)).unwrap()
    }

    fn visible_count(session: &Session) -> usize {
        session.navigation().visible_pages().count()
    }

    /// Fields are sorted by name: 1 = Mood, 2 = Sleep.
    fn fill(session: &mut Session, mood: &str, sleep: &str) {
        session.handle(Event::SetField { index: 1, input: mood.to_string() });
        session.handle(Event::SetField { index: 2, input: sleep.to_string() });
    }

    #[test]
    fn submit_scores_persists_and_replaces_form() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);

        session.handle(Event::Menu(MenuChoice::TrackSymptoms));
        assert!(matches!(session.current_page(), Page::SurveyForm(_)));
        assert_eq!(session.focus(), Some("mood"));
        fill(&mut session, "8", "2");
        session.handle(Event::Submit);

        match session.current_page() {
            Page::Report(report) => {
                assert_eq!(report.score, 8.0);
                assert_eq!(report.actions, vec!["Celebrate".to_string()]);
            }
            other => panic!("expected report, got {other:?}"),
        }
        assert_eq!(session.navigation().depth(), 2);
        assert_eq!(visible_count(&session), 1);

        let reloaded = Store::new(dir.path().join("data.json")).load().unwrap();
        assert_eq!(reloaded, *session.dataset());
        assert_eq!(reloaded.day(date(2024, 1, 1)).unwrap().reading("sleep"), Some(2));

        session.handle(Event::Back);
        assert!(matches!(session.current_page(), Page::MainMenu));
    }

    #[test]
    fn abandoning_a_form_leaves_no_day() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);

        session.handle(Event::Menu(MenuChoice::TrackSymptoms));
        fill(&mut session, "5", "5");
        session.handle(Event::Back);

        assert!(session.dataset().days.is_empty());
        assert!(matches!(session.current_page(), Page::MainMenu));
    }

    #[test]
    fn invalid_submit_keeps_form_and_dataset() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);

        session.handle(Event::Menu(MenuChoice::TrackSymptoms));
        fill(&mut session, "8", "twelve");
        session.handle(Event::Submit);

        assert!(matches!(session.current_page(), Page::SurveyForm(_)));
        assert!(session.dataset().days.is_empty());
        let status = session.take_status().unwrap();
        assert!(status.starts_with("Error: invalid value 'twelve' for Sleep"), "{status}");

        fill(&mut session, "8", "2");
        session.handle(Event::Submit);
        assert!(matches!(session.current_page(), Page::Report(_)));
    }

    #[test]
    fn clearing_every_field_returns_to_menu() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);

        session.handle(Event::Menu(MenuChoice::TrackSymptoms));
        fill(&mut session, "4", "4");
        session.handle(Event::Submit);
        session.handle(Event::Back);

        session.handle(Event::Menu(MenuChoice::TrackSymptoms));
        fill(&mut session, "-", "-");
        session.handle(Event::Submit);

        assert!(matches!(session.current_page(), Page::MainMenu));
        assert!(session.dataset().day(date(2024, 1, 1)).unwrap().readings.is_empty());
        assert!(session.take_status().unwrap().starts_with("Saved."));
    }

    #[test]
    fn missing_report_is_a_message_not_a_page() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);

        session.handle(Event::Menu(MenuChoice::TodaysReport));

        assert!(matches!(session.current_page(), Page::MainMenu));
        assert_eq!(session.navigation().depth(), 1);
        let status = session.take_status().unwrap();
        assert_eq!(status, "Nothing to show: no submission found for 2024-01-01");
    }

    #[test]
    fn history_opens_reports_and_restores_focus() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);

        session.handle(Event::Menu(MenuChoice::TrackSymptoms));
        fill(&mut session, "8", "2");
        session.handle(Event::Submit);
        session.handle(Event::Back);

        session.handle(Event::Menu(MenuChoice::PreviousDays));
        assert_eq!(session.focus(), Some("2024-01-01"));
        session.handle(Event::OpenDay(DaySelector::Position(1)));
        assert!(matches!(session.current_page(), Page::Report(_)));
        assert_eq!(visible_count(&session), 1);

        session.handle(Event::Back);
        assert!(matches!(session.current_page(), Page::HistoryList(_)));
        assert_eq!(session.focus(), Some("2024-01-01"));

        session.handle(Event::OpenDay(DaySelector::Date(date(2023, 12, 31))));
        assert!(matches!(session.current_page(), Page::HistoryList(_)));
        assert!(session.take_status().unwrap().starts_with("Nothing to show"));
    }

    #[test]
    fn history_reflects_edits_made_from_it() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);

        session.handle(Event::Menu(MenuChoice::TrackSymptoms));
        fill(&mut session, "8", "2");
        session.handle(Event::Submit);
        session.handle(Event::Back);

        session.handle(Event::Menu(MenuChoice::PreviousDays));
        session.handle(Event::TrackDay(DaySelector::Position(1)));
        fill(&mut session, "-", "10");
        session.handle(Event::Submit);
        session.handle(Event::Back);

        match session.current_page() {
            Page::HistoryList(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(*entries[0].score.as_ref().unwrap(), 0.0);
            }
            other => panic!("expected history, got {other:?}"),
        }
    }

    #[test]
    fn notes_save_from_report_and_menu() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);

        session.handle(Event::Menu(MenuChoice::EditNote));
        session.handle(Event::AppendNote("headache after lunch".to_string()));
        session.handle(Event::AppendNote("better by evening".to_string()));
        session.handle(Event::SaveNote);

        let notes = NoteStore::new(dir.path().join("notes"));
        assert_eq!(
            notes.read_note(date(2024, 1, 1)).unwrap(),
            "headache after lunch\nbetter by evening\n"
        );

        session.handle(Event::Back);
        session.handle(Event::Menu(MenuChoice::TrackSymptoms));
        fill(&mut session, "6", "3");
        session.handle(Event::Submit);
        session.handle(Event::OpenNote);
        match session.current_page() {
            Page::NoteEditor { date: opened, text } => {
                assert_eq!(*opened, date(2024, 1, 1));
                assert_eq!(text, "headache after lunch\nbetter by evening\n");
            }
            other => panic!("expected note editor, got {other:?}"),
        }

        session.handle(Event::ClearNote);
        session.handle(Event::SaveNote);
        assert_eq!(notes.read_note(date(2024, 1, 1)).unwrap(), "");

        session.handle(Event::Back);
        assert!(matches!(session.current_page(), Page::Report(_)));
    }

    #[test]
    fn actions_out_of_context_do_not_move() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);

        session.handle(Event::Submit);
        session.handle(Event::Back);
        session.handle(Event::SaveNote);

        assert!(matches!(session.current_page(), Page::MainMenu));
        assert_eq!(session.navigation().depth(), 1);

        session.handle(Event::Menu(MenuChoice::MySymptoms));
        session.handle(Event::Menu(MenuChoice::MyActions));
        assert!(matches!(session.current_page(), Page::SymptomCatalog(_)));
        assert!(session.take_status().unwrap().contains("not available"));
    }

    #[test]
    fn failed_save_rolls_back_the_submit() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);

        session.handle(Event::Menu(MenuChoice::TrackSymptoms));
        fill(&mut session, "8", "2");
        session.handle(Event::Submit);
        session.handle(Event::Back);

        session.handle(Event::Menu(MenuChoice::TrackSymptoms));
        fill(&mut session, "3", "3");
        let before = session.dataset().clone();

        // A directory at the data file path makes the rename fail.
        let data_file = dir.path().join("data.json");
        std::fs::remove_file(&data_file).unwrap();
        std::fs::create_dir(&data_file).unwrap();
        session.handle(Event::Submit);

        assert_eq!(*session.dataset(), before);
        assert_eq!(session.dataset().day(date(2024, 1, 1)).unwrap().reading("mood"), Some(8));
        assert!(matches!(session.current_page(), Page::SurveyForm(_)));
        assert_eq!(session.navigation().depth(), 2);
        assert_eq!(visible_count(&session), 1);
        let status = session.take_status().unwrap();
        assert!(status.starts_with("Error: io error at"), "{status}");
    }

    #[test]
    fn failed_save_of_a_new_day_leaves_no_day() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);

        let data_file = dir.path().join("data.json");
        std::fs::remove_file(&data_file).unwrap();
        std::fs::create_dir(&data_file).unwrap();

        session.handle(Event::Menu(MenuChoice::TrackSymptoms));
        fill(&mut session, "8", "2");
        session.handle(Event::Submit);

        assert!(session.dataset().days.is_empty());
        assert!(matches!(session.current_page(), Page::SurveyForm(_)));
        assert!(session.take_status().unwrap().starts_with("Error: io error at"));
    }

    #[test]
    fn quit_ends_the_session() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);
        assert_eq!(session.handle(Event::Quit), Outcome::Quit);
    }
}
