use super::{MenuError, Note, NoteError, Result};
use crate::app::NoteService;
use crate::setup::{arguments, logging};
use crate::ui::cli;

use log::{error, info, trace, warn};
use std::fmt;
use std::ops::ControlFlow;

/// Abstraction for input/output
pub trait IO {
    /// Read a trimmed line of input ending at newline
    fn get_input(&self) -> Result<String>;
    /// Display a list of selectable options
    fn show_menu(&self, options: &[impl std::fmt::Display]);
    /// Display a bolded title
    fn show_title(&self, title: &str);
    /// Render a table of notes
    fn show_notes_list(&self, notes: &[Note]);
    /// Print a plain text message
    fn show_text(&self, msg: &str);
}

/// Actions available in the menu, one per engine operation plus exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    Add = 1,
    View = 2,
    Search = 3,
    Edit = 4,
    Delete = 5,
    Exit = 6,
}

/// All menu options in display order
pub const ALL_MENU_OPTIONS: [MenuOption; 6] = [
    MenuOption::Add,
    MenuOption::View,
    MenuOption::Search,
    MenuOption::Edit,
    MenuOption::Delete,
    MenuOption::Exit,
];

/// Convert a numeric choice into a `MenuOption`
///
/// # Errors
///
/// Returns `Err(())` if the value does not map to a valid variant
impl TryFrom<u8> for MenuOption {
    type Error = ();

    fn try_from(n: u8) -> std::result::Result<Self, Self::Error> {
        ALL_MENU_OPTIONS
            .into_iter()
            .find(|option| *option as u8 == n)
            .ok_or(())
    }
}

/// Show the option number and label, e.g. `(1) Add note`
impl fmt::Display for MenuOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Add => "Add note",
            Self::View => "View notes",
            Self::Search => "Search notes",
            Self::Edit => "Edit note",
            Self::Delete => "Delete note",
            Self::Exit => "Exit",
        };
        write!(f, "({}) {}", *self as u8, label)
    }
}

/// Parse args, set up logging, open storage and run the menu until the user exits
///
/// # Errors
///
/// Returns the storage error if the backend cannot be opened at startup, for `main` to report.
/// Errors during single operations are reported and the menu keeps going
pub fn run() -> Result<()> {
    let args = arguments::parse();
    logging::setup_log(args.log_level());

    let service = args.open_service()?;
    menu_loop(&cli::Cli, &service);
    Ok(())
}

/// Show the menu and dispatch choices until Exit is chosen, input ends or stdin fails
pub fn menu_loop(io: &impl IO, service: &NoteService) {
    loop {
        io.show_menu(&ALL_MENU_OPTIONS);
        let outcome = get_menu_input(io).and_then(|opt| handle_menu_option(io, service, opt));
        match outcome {
            Ok(ControlFlow::Continue(())) => {}
            Ok(ControlFlow::Break(())) => {
                io.show_text("Goodbye!");
                return;
            }
            Err(NoteError::Menu(MenuError::EndOfInput)) => {
                trace!("Input closed, leaving menu");
                return;
            }
            // Retrying a broken stdin would only spin
            Err(NoteError::Menu(e @ MenuError::StdinReadError(_))) => {
                error!("{e}");
                return;
            }
            Err(e) => error!("{e}"),
        }
    }
}

/// Try parsing input as `MenuOption` or return an error
///
/// # Errors
///
/// Returns `NoteError::Menu(MenuError::ParseError)` if input is not an integer
/// Returns `NoteError::Menu(MenuError::InvalidOption)` if integer is out of range
fn get_menu_input(io: &impl IO) -> Result<MenuOption> {
    let input = io.get_input()?;

    match input.parse::<u8>() {
        Ok(n) => MenuOption::try_from(n)
            .map_err(|()| NoteError::Menu(MenuError::InvalidOption(n))),
        Err(_) => Err(NoteError::Menu(MenuError::ParseError(input))),
    }
}

/// Dispatch chosen `MenuOption` to its handler. `Break` means the user asked to exit
///
/// # Errors
///
/// Only input errors are returned, engine errors are reported by the handlers
fn handle_menu_option(
    io: &impl IO,
    service: &NoteService,
    option: MenuOption,
) -> Result<ControlFlow<()>> {
    match option {
        MenuOption::Add => handle_add(io, service)?,
        MenuOption::View => handle_view(io, service),
        MenuOption::Search => handle_search(io, service)?,
        MenuOption::Edit => handle_edit(io, service)?,
        MenuOption::Delete => handle_delete(io, service)?,
        MenuOption::Exit => return Ok(ControlFlow::Break(())),
    }
    Ok(ControlFlow::Continue(()))
}

/// Prompt until `validate` accepts the input. With a `default`, empty input keeps it
fn prompt_valid(
    io: &impl IO,
    label: &str,
    default: Option<&str>,
    validate: fn(&str) -> Result<&str>,
) -> Result<String> {
    loop {
        match default {
            Some(current) => io.show_text(&format!("{label} [{current}]")),
            None => io.show_text(label),
        }
        let input = io.get_input()?;
        let input = match default {
            Some(current) if input.is_empty() => current.to_string(),
            _ => input,
        };
        match validate(&input) {
            Ok(valid) => return Ok(valid.to_string()),
            Err(e) => error!("{e}"),
        }
    }
}

/// Show `notes` and ask for the ID of one of them
fn select_note<'a>(io: &impl IO, notes: &'a [Note], action: &str) -> Result<&'a Note> {
    io.show_notes_list(notes);
    loop {
        io.show_text(&format!("ID of the note to {action}:"));
        let input = io.get_input()?;
        match input.parse::<i64>() {
            Ok(id) => match notes.iter().find(|note| note.id == id) {
                Some(note) => return Ok(note),
                None => warn!("No note with ID {id} in the list above"),
            },
            Err(e) => error!("Got invalid ID: {e}"),
        }
    }
}

/// Fetch notes for a selection prompt. `None` when there is nothing to pick from
fn notes_to_pick(io: &impl IO, service: &NoteService, action: &str) -> Option<Vec<Note>> {
    match service.list_notes() {
        Ok(notes) if notes.is_empty() => {
            io.show_text(&format!("No notes available to {action}."));
            None
        }
        Ok(notes) => Some(notes),
        Err(e) => {
            error!("{e}");
            None
        }
    }
}

fn report_stale(e: &NoteError) {
    match e {
        NoteError::NotFound(id) => {
            error!("Note with ID {id} no longer exists. View notes again to refresh the list");
        }
        other => error!("{other}"),
    }
}

/// Prompt for title and content and add the note
fn handle_add(io: &impl IO, service: &NoteService) -> Result<()> {
    io.show_title("Add note");

    let title = prompt_valid(io, "Title:", None, NoteService::validate_title)?;
    let content = prompt_valid(io, "Content:", None, NoteService::validate_content)?;

    match service.add_note(&title, &content) {
        Ok(note) => info!("Note added with ID: {}", note.id),
        Err(e) => error!("{e}"),
    }
    Ok(())
}

/// Fetch all notes and display in a table
fn handle_view(io: &impl IO, service: &NoteService) {
    match service.list_notes() {
        Ok(notes) if notes.is_empty() => io.show_text("No notes available."),
        Ok(notes) => io.show_notes_list(&notes),
        Err(e) => error!("{e}"),
    }
}

/// Prompt for a query and display matching notes
fn handle_search(io: &impl IO, service: &NoteService) -> Result<()> {
    io.show_title("Search notes");
    io.show_text("Text to look for:");
    let query = io.get_input()?;

    match service.search_notes(&query) {
        Ok(notes) if notes.is_empty() => io.show_text("No matching notes."),
        Ok(notes) => io.show_notes_list(&notes),
        Err(e) => error!("{e}"),
    }
    Ok(())
}

/// Pick a note from the list, prompt for new values with the current ones as defaults
fn handle_edit(io: &impl IO, service: &NoteService) -> Result<()> {
    io.show_title("Edit note");

    let Some(notes) = notes_to_pick(io, service, "edit") else {
        return Ok(());
    };
    let id = select_note(io, &notes, "edit")?.id;

    // Prefill from the stored note, not the listing, and catch a stale selection early
    let note = match service.get_note(id) {
        Ok(note) => note,
        Err(e) => {
            report_stale(&e);
            return Ok(());
        }
    };

    let title = prompt_valid(
        io,
        "New title:",
        Some(note.title.as_str()),
        NoteService::validate_title,
    )?;
    let content = prompt_valid(
        io,
        "New content:",
        Some(note.content.as_str()),
        NoteService::validate_content,
    )?;

    match service.edit_note(note.id, &title, &content) {
        Ok(_) => info!("Note with ID {} updated", note.id),
        Err(e) => report_stale(&e),
    }
    Ok(())
}

/// Pick a note from the list, confirm, and delete it
fn handle_delete(io: &impl IO, service: &NoteService) -> Result<()> {
    io.show_title("Delete note");

    let Some(notes) = notes_to_pick(io, service, "delete") else {
        return Ok(());
    };
    let id = select_note(io, &notes, "delete")?.id;

    loop {
        io.show_text("Are you sure? (y/n):");
        match io.get_input()?.to_lowercase().as_str() {
            "y" | "yes" => break,
            "n" | "no" => {
                info!("Not deleting note with ID: {id}");
                return Ok(());
            }
            _ => warn!("Invalid input. Please enter 'y' or 'n'"),
        }
    }

    match service.delete_note(id) {
        Ok(()) => info!("Deleted note with ID: {id}"),
        Err(e) => report_stale(&e),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryBackend;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::io;

    // Feeds scripted answers and records everything shown
    struct ScriptedIo {
        inputs: RefCell<VecDeque<String>>,
        shown: RefCell<Vec<String>>,
    }

    impl ScriptedIo {
        fn new(inputs: &[&str]) -> Self {
            Self {
                inputs: RefCell::new(inputs.iter().map(|s| (*s).to_string()).collect()),
                shown: RefCell::new(Vec::new()),
            }
        }

        fn saw(&self, text: &str) -> bool {
            self.shown.borrow().iter().any(|line| line.contains(text))
        }

        fn exhausted(&self) -> bool {
            self.inputs.borrow().is_empty()
        }
    }

    impl IO for ScriptedIo {
        fn get_input(&self) -> Result<String> {
            self.inputs
                .borrow_mut()
                .pop_front()
                .map(|s| s.trim().to_string())
                .ok_or(NoteError::Menu(MenuError::EndOfInput))
        }

        fn show_menu(&self, _options: &[impl std::fmt::Display]) {}

        fn show_title(&self, title: &str) {
            self.shown.borrow_mut().push(title.to_string());
        }

        fn show_notes_list(&self, notes: &[Note]) {
            self.shown
                .borrow_mut()
                .extend(notes.iter().map(ToString::to_string));
        }

        fn show_text(&self, msg: &str) {
            self.shown.borrow_mut().push(msg.to_string());
        }
    }

    fn service() -> NoteService {
        NoteService::new(Box::new(MemoryBackend::new()))
    }

    // Stdin that fails on every read, like a hung-up terminal
    struct BrokenIo {
        reads: Cell<usize>,
    }

    impl IO for BrokenIo {
        fn get_input(&self) -> Result<String> {
            self.reads.set(self.reads.get() + 1);
            Err(NoteError::Menu(MenuError::StdinReadError(io::Error::other(
                "input/output error",
            ))))
        }

        fn show_menu(&self, _options: &[impl std::fmt::Display]) {}
        fn show_title(&self, _title: &str) {}
        fn show_notes_list(&self, _notes: &[Note]) {}
        fn show_text(&self, _msg: &str) {}
    }

    #[test]
    fn menu_loop_stops_when_stdin_fails() {
        let io = BrokenIo {
            reads: Cell::new(0),
        };
        menu_loop(&io, &service());
        assert_eq!(io.reads.get(), 1);
    }

    #[test]
    fn menu_options_round_trip_through_numbers() {
        for option in ALL_MENU_OPTIONS {
            assert_eq!(MenuOption::try_from(option as u8), Ok(option));
        }
        assert_eq!(MenuOption::try_from(0), Err(()));
        assert_eq!(MenuOption::try_from(7), Err(()));
        assert_eq!(MenuOption::Search.to_string(), "(3) Search notes");
    }

    #[test]
    fn add_reprompts_on_blank_input() {
        let svc = service();
        let io = ScriptedIo::new(&["", "Groceries", "   ", "milk"]);

        handle_add(&io, &svc).unwrap();

        let notes = svc.list_notes().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!((notes[0].title.as_str(), notes[0].content.as_str()), ("Groceries", "milk"));
        assert!(io.exhausted());
    }

    #[test]
    fn menu_loop_adds_then_exits() {
        let svc = service();
        let io = ScriptedIo::new(&["abc", "9", "1", "Title", "Body", "2", "6", "1"]);

        menu_loop(&io, &svc);

        assert_eq!(svc.list_notes().unwrap().len(), 1);
        assert!(io.saw("ID: 1 | Title: Title | Content: Body"));
        assert!(io.saw("Goodbye!"));
        // The answer after Exit is never read
        assert_eq!(io.inputs.borrow().len(), 1);
    }

    #[test]
    fn menu_loop_stops_at_end_of_input() {
        let svc = service();
        let io = ScriptedIo::new(&["1", "only a title"]);

        menu_loop(&io, &svc);

        assert!(svc.list_notes().unwrap().is_empty());
        assert!(!io.saw("Goodbye!"));
    }

    #[test]
    fn view_reports_empty_store() {
        let io = ScriptedIo::new(&[]);
        handle_view(&io, &service());
        assert!(io.saw("No notes available."));
    }

    #[test]
    fn search_shows_matches_or_nothing() {
        let svc = service();
        svc.add_note("Category A", "x").unwrap();
        svc.add_note("Dog", "y").unwrap();

        let io = ScriptedIo::new(&["CAT", ""]);
        handle_search(&io, &svc).unwrap();
        assert!(io.saw("Title: Category A"));
        assert!(!io.saw("Title: Dog"));

        handle_search(&io, &svc).unwrap();
        assert!(io.saw("No matching notes."));
    }

    #[test]
    fn edit_keeps_defaults_on_empty_input() {
        let svc = service();
        let note = svc.add_note("Title", "old body").unwrap();
        let other = svc.add_note("Other", "untouched").unwrap();
        let id = note.id.to_string();

        // Unknown ID first, then a real one. Keep the title, replace the content
        let io = ScriptedIo::new(&["999", id.as_str(), "", "new body"]);
        handle_edit(&io, &svc).unwrap();

        let notes = svc.list_notes().unwrap();
        assert_eq!(notes[0].id, note.id);
        assert_eq!(notes[0].title, "Title");
        assert_eq!(notes[0].content, "new body");
        assert_eq!(notes[1], other);
        assert!(io.saw("New title: [Title]"));
    }

    #[test]
    fn edit_and_delete_with_empty_store_return_to_menu() {
        let svc = service();
        let io = ScriptedIo::new(&[]);

        handle_edit(&io, &svc).unwrap();
        handle_delete(&io, &svc).unwrap();

        assert!(io.saw("No notes available to edit."));
        assert!(io.saw("No notes available to delete."));
    }

    #[test]
    fn delete_asks_for_confirmation() {
        let svc = service();
        let note = svc.add_note("doomed", "bye").unwrap();
        let id = note.id.to_string();

        let io = ScriptedIo::new(&[id.as_str(), "maybe", "n"]);
        handle_delete(&io, &svc).unwrap();
        assert_eq!(svc.list_notes().unwrap(), vec![note]);

        let io = ScriptedIo::new(&[id.as_str(), "Y"]);
        handle_delete(&io, &svc).unwrap();
        assert!(svc.list_notes().unwrap().is_empty());
    }

    #[test]
    fn input_ending_mid_prompt_is_returned() {
        let svc = service();
        let io = ScriptedIo::new(&["Title"]);
        assert!(matches!(
            handle_add(&io, &svc),
            Err(NoteError::Menu(MenuError::EndOfInput))
        ));
    }
}
