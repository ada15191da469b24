//! Interactive text menu over a [`ContactBook`].
//!
//! The menu is a small state machine driven one input line at a time:
//!
//! ```text
//! MainMenu ──list──▶ ListView ──N──▶ RecordView(List)
//!    │                                   │ edit/delete: back to ListView
//!    └──search──▶ SearchPrompt ──▶ SearchView ──N──▶ RecordView(Search)
//!                      ▲──────again──────┘
//! ```
//!
//! Bad input never ends the session; it is reported and the menu either stays
//! put or falls back to the previous view. The session ends on `exit` or at
//! end of input, and both save the book.

use std::io::{BufRead, Write};

use thiserror::Error;
use tracing::{debug, error};

use crate::book::ContactBook;
use crate::error::Result;
use crate::record::{ContactKind, Field, Organization, Person, Record};

/// Why a typed list index was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
enum IndexError {
    #[error("Invalid action!")]
    NotANumber,
    #[error("Invalid index!")]
    OutOfRange,
}

/// Where the user drilled into a record from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Origin {
    List,
    Search { query: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    MainMenu,
    ListView,
    SearchPrompt,
    SearchView { query: String },
    RecordView { position: usize, origin: Origin },
    Exit,
}

/// Parse a 1-based list index typed by the user into a 0-based one.
fn parse_index(input: &str, len: usize) -> std::result::Result<usize, IndexError> {
    let Ok(index) = input.parse::<i64>() else {
        let digits = input.strip_prefix(['+', '-']).unwrap_or(input);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IndexError::OutOfRange);
        }
        return Err(IndexError::NotANumber);
    };
    match usize::try_from(index) {
        Ok(index) if (1..=len).contains(&index) => Ok(index - 1),
        _ => Err(IndexError::OutOfRange),
    }
}

/// Line-oriented menu session.
///
/// Reads commands from `input` and writes prompts and results to `output`.
#[derive(Debug)]
pub struct Menu<R, W> {
    book: ContactBook,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    /// Create a session over `book`.
    pub fn new(book: ContactBook, input: R, output: W) -> Self {
        Self {
            book,
            input,
            output,
        }
    }

    /// End the session and hand back the book.
    #[must_use]
    pub fn into_book(self) -> ContactBook {
        self.book
    }

    /// Run until `exit` or end of input, then save the book.
    ///
    /// # Errors
    ///
    /// Returns an error only if reading input or writing output fails. Bad
    /// commands and failed saves are reported and the session continues.
    pub fn run(&mut self) -> Result<()> {
        let mut state = State::MainMenu;
        loop {
            debug!(?state, "Menu state");
            state = match state {
                State::MainMenu => self.main_menu()?,
                State::ListView => self.list_view()?,
                State::SearchPrompt => self.search_prompt()?,
                State::SearchView { query } => self.search_view(query)?,
                State::RecordView { position, origin } => self.record_view(position, origin)?,
                State::Exit => {
                    self.persist();
                    return Ok(());
                }
            };
        }
    }

    /// Print `label` and read one trimmed line. `None` means input ended.
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn say(&mut self, message: impl std::fmt::Display) -> Result<()> {
        writeln!(self.output, "{message}")?;
        Ok(())
    }

    /// Save the book, reporting but otherwise ignoring failures.
    fn persist(&mut self) {
        if let Err(err) = self.book.save() {
            error!("Failed to save contacts: {err}; changes are kept in memory only");
        }
    }

    fn main_menu(&mut self) -> Result<State> {
        let Some(action) = self.prompt("[menu] Enter action (add, list, search, count, exit): ")?
        else {
            return Ok(State::Exit);
        };

        let next = match action.as_str() {
            "add" => self.add()?,
            "list" => self.enter_list()?,
            "search" => State::SearchPrompt,
            "count" => {
                let count = self.book.len();
                self.say(format_args!("The Phone Book has {count} records."))?;
                State::MainMenu
            }
            "exit" => return Ok(State::Exit),
            _ => {
                self.say("Unknown action!")?;
                State::MainMenu
            }
        };
        if next == State::MainMenu {
            writeln!(self.output)?;
        }
        Ok(next)
    }

    fn add(&mut self) -> Result<State> {
        let Some(kind) = self.prompt("Enter the type (person, organization): ")? else {
            return Ok(State::Exit);
        };

        let record = match ContactKind::from_name(&kind) {
            Some(ContactKind::Person) => self.read_person()?,
            Some(ContactKind::Organization) => self.read_organization()?,
            None => {
                self.say("Unknown type!")?;
                return Ok(State::MainMenu);
            }
        };
        let Some(record) = record else {
            return Ok(State::Exit);
        };

        self.book.add(record);
        self.persist();
        self.say("The record added.")?;
        Ok(State::MainMenu)
    }

    fn read_person(&mut self) -> Result<Option<Record>> {
        let Some(first_name) = self.prompt("Enter the name: ")? else {
            return Ok(None);
        };
        let Some(last_name) = self.prompt("Enter the surname: ")? else {
            return Ok(None);
        };
        let mut person = Person::new(first_name, last_name);

        let Some(birth_date) = self.prompt("Enter the birth date (yyyy-MM-dd): ")? else {
            return Ok(None);
        };
        if let Err(err) = person.set_birth_date(&birth_date) {
            self.say(err)?;
        }

        let Some(gender) = self.prompt("Enter the gender (M, F): ")? else {
            return Ok(None);
        };
        if let Err(err) = person.set_gender(&gender) {
            self.say(err)?;
        }

        let Some(number) = self.prompt("Enter the number: ")? else {
            return Ok(None);
        };
        Ok(Some(Record::new(person, number)))
    }

    fn read_organization(&mut self) -> Result<Option<Record>> {
        let Some(name) = self.prompt("Enter the organization name: ")? else {
            return Ok(None);
        };
        let Some(address) = self.prompt("Enter the address: ")? else {
            return Ok(None);
        };
        let Some(number) = self.prompt("Enter the number: ")? else {
            return Ok(None);
        };
        Ok(Some(Record::new(Organization::new(name, address), number)))
    }

    /// Print a numbered summary of the records at `positions`.
    fn print_summary(&mut self, positions: &[usize]) -> Result<()> {
        for (index, &position) in positions.iter().enumerate() {
            if let Some(record) = self.book.get(position) {
                writeln!(self.output, "{}. {}", index + 1, record.display_name())?;
            }
        }
        Ok(())
    }

    fn all_positions(&self) -> Vec<usize> {
        (0..self.book.len()).collect()
    }

    /// Render the full list and enter the list view.
    fn enter_list(&mut self) -> Result<State> {
        if self.book.is_empty() {
            self.say("No records to list!")?;
            return Ok(State::MainMenu);
        }
        let positions = self.all_positions();
        self.print_summary(&positions)?;
        Ok(State::ListView)
    }

    fn list_view(&mut self) -> Result<State> {
        let Some(action) = self.prompt("[list] Enter action ([number], back): ")? else {
            return Ok(State::Exit);
        };
        if action == "back" {
            writeln!(self.output)?;
            return Ok(State::MainMenu);
        }
        let positions = self.all_positions();
        self.select(&action, &positions, Origin::List, State::ListView)
    }

    fn search_prompt(&mut self) -> Result<State> {
        let Some(query) = self.prompt("Enter search query: ")? else {
            return Ok(State::Exit);
        };
        self.enter_search(query)
    }

    /// Run `query`, render the matches, and enter the search view.
    fn enter_search(&mut self, query: String) -> Result<State> {
        let positions = self.book.search(&query);
        if positions.is_empty() {
            self.say("No results found.")?;
            writeln!(self.output)?;
            return Ok(State::MainMenu);
        }
        self.say(format_args!("Found {} results:", positions.len()))?;
        self.print_summary(&positions)?;
        Ok(State::SearchView { query })
    }

    fn search_view(&mut self, query: String) -> Result<State> {
        let Some(action) = self.prompt("[search] Enter action ([number], back, again): ")? else {
            return Ok(State::Exit);
        };
        match action.as_str() {
            "back" => {
                writeln!(self.output)?;
                Ok(State::MainMenu)
            }
            "again" => Ok(State::SearchPrompt),
            _ => {
                let positions = self.book.search(&query);
                let origin = Origin::Search {
                    query: query.clone(),
                };
                self.select(&action, &positions, origin, State::SearchView { query })
            }
        }
    }

    /// Open the record picked by `action` from the rendered `positions`, or
    /// report the bad index and stay in `current`.
    fn select(
        &mut self,
        action: &str,
        positions: &[usize],
        origin: Origin,
        current: State,
    ) -> Result<State> {
        match parse_index(action, positions.len()) {
            Ok(index) => {
                let position = positions[index];
                if let Some(record) = self.book.get(position) {
                    writeln!(self.output, "{record}")?;
                    writeln!(self.output)?;
                }
                Ok(State::RecordView { position, origin })
            }
            Err(err) => {
                debug!(action, "Rejected list selection");
                self.say(err)?;
                Ok(current)
            }
        }
    }

    fn record_view(&mut self, position: usize, origin: Origin) -> Result<State> {
        let Some(action) = self.prompt("[record] Enter action (edit, delete, menu): ")? else {
            return Ok(State::Exit);
        };
        match action.as_str() {
            "edit" => {
                if !self.edit(position)? {
                    return Ok(State::Exit);
                }
            }
            "delete" => self.delete(position)?,
            "menu" => {
                writeln!(self.output)?;
                return Ok(State::MainMenu);
            }
            _ => self.say("Unknown action!")?,
        }
        writeln!(self.output)?;
        self.return_to(origin)
    }

    /// Re-render the view a record was opened from.
    fn return_to(&mut self, origin: Origin) -> Result<State> {
        match origin {
            Origin::List => self.enter_list(),
            Origin::Search { query } => self.enter_search(query),
        }
    }

    /// Edit one field of the record at `position`.
    ///
    /// Returns `false` if input ended mid-edit.
    fn edit(&mut self, position: usize) -> Result<bool> {
        let Some(fields) = self.book.get(position).map(Record::editable_fields) else {
            self.say("Invalid index!")?;
            return Ok(true);
        };
        let names = fields
            .iter()
            .map(|field| field.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let Some(name) = self.prompt(&format!("Select a field ({names}): "))? else {
            return Ok(false);
        };
        if !name
            .parse::<Field>()
            .is_ok_and(|field| fields.contains(&field))
        {
            self.say("Unknown field!")?;
            return Ok(true);
        }

        let Some(value) = self.prompt(&format!("Enter {name}: "))? else {
            return Ok(false);
        };
        let result = match self.book.get_mut(position) {
            Some(record) => record.edit_field(&name, &value),
            None => return Ok(true),
        };
        match result {
            Ok(()) => {
                self.persist();
                self.say("The record updated!")?;
            }
            Err(err) => self.say(err)?,
        }
        Ok(true)
    }

    /// Remove the record being viewed.
    fn delete(&mut self, position: usize) -> Result<()> {
        if self.book.remove(position).is_some() {
            self.persist();
            self.say("The record removed.")
        } else {
            self.say("No records to remove!")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::logging::init_test_logging;
    use crate::storage::Storage;

    fn run_script(book: ContactBook, script: &str) -> (ContactBook, String) {
        init_test_logging();
        let mut output = Vec::new();
        let mut menu = Menu::new(book, Cursor::new(script.as_bytes()), &mut output);
        menu.run().expect("menu run failed");
        let book = menu.into_book();
        (book, String::from_utf8(output).expect("output is utf-8"))
    }

    fn book_with(records: Vec<Record>) -> ContactBook {
        let mut book = ContactBook::new();
        for record in records {
            book.add(record);
        }
        book
    }

    fn person(first: &str, last: &str, number: &str) -> Record {
        Record::new(Person::new(first, last), number)
    }

    fn names(book: &ContactBook) -> Vec<String> {
        book.iter().map(Record::display_name).collect()
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("1", 3), Ok(0));
        assert_eq!(parse_index("3", 3), Ok(2));
        assert_eq!(parse_index("0", 3), Err(IndexError::OutOfRange));
        assert_eq!(parse_index("4", 3), Err(IndexError::OutOfRange));
        assert_eq!(parse_index("-1", 3), Err(IndexError::OutOfRange));
        assert_eq!(parse_index("one", 3), Err(IndexError::NotANumber));
        assert_eq!(parse_index("", 3), Err(IndexError::NotANumber));
        assert_eq!(parse_index("-", 3), Err(IndexError::NotANumber));
    }

    #[test]
    fn test_parse_index_overflow_is_out_of_range() {
        assert_eq!(parse_index("99999999999999999999", 3), Err(IndexError::OutOfRange));
        assert_eq!(parse_index("-99999999999999999999", 3), Err(IndexError::OutOfRange));
        assert_eq!(parse_index("+4", 3), Err(IndexError::OutOfRange));
    }

    #[test]
    fn test_count_and_exit() {
        let (book, output) = run_script(ContactBook::new(), "count\nexit\n");
        assert!(book.is_empty());
        assert!(output.contains("The Phone Book has 0 records."));
    }

    #[test]
    fn test_unknown_main_action() {
        let (_, output) = run_script(ContactBook::new(), "dance\nexit\n");
        assert!(output.contains("Unknown action!"));
    }

    #[test]
    fn test_end_of_input_exits() {
        let (book, output) = run_script(ContactBook::new(), "count\n");
        assert!(output.contains("The Phone Book has 0 records."));
        assert!(book.is_empty());
    }

    #[test]
    fn test_add_person_and_organization() {
        let script = "add\nperson\nAnn\nLee\n1990-01-01\nF\n555\n\
                      add\norganization\nAcme\n1 Main St\n555-0199\n\
                      count\nexit\n";
        let (book, output) = run_script(ContactBook::new(), script);

        assert_eq!(names(&book), ["Ann Lee", "Acme"]);
        assert_eq!(book.get(0).unwrap().field_value("birth"), Some("1990-01-01"));
        assert_eq!(book.get(0).unwrap().field_value("gender"), Some("F"));
        assert_eq!(book.get(1).unwrap().field_value("address"), Some("1 Main St"));
        assert_eq!(output.matches("The record added.").count(), 2);
        assert!(output.contains("The Phone Book has 2 records."));
    }

    #[test]
    fn test_add_person_with_bad_birth_date_and_gender() {
        let script = "add\nperson\nBob\nStone\n1990-02-30\nX\n777\nexit\n";
        let (book, output) = run_script(ContactBook::new(), script);

        assert!(output.contains("Bad birth date!"));
        assert!(output.contains("Bad gender!"));
        let record = book.get(0).unwrap();
        assert_eq!(record.field_value("birth"), None);
        assert_eq!(record.field_value("gender"), None);
        assert_eq!(record.phone_number(), "777");
    }

    #[test]
    fn test_add_unknown_type() {
        let (book, output) = run_script(ContactBook::new(), "add\nrobot\nexit\n");
        assert!(output.contains("Unknown type!"));
        assert!(book.is_empty());
    }

    #[test]
    fn test_add_interrupted_by_end_of_input() {
        let (book, _) = run_script(ContactBook::new(), "add\nperson\nAnn\n");
        assert!(book.is_empty());
    }

    #[test]
    fn test_list_empty() {
        let (_, output) = run_script(ContactBook::new(), "list\nexit\n");
        assert!(output.contains("No records to list!"));
        assert!(!output.contains("[list]"));
    }

    #[test]
    fn test_list_shows_numbered_names() {
        let book = book_with(vec![
            person("Ann", "Lee", "1"),
            Record::new(Organization::new("Acme", "Here"), "2"),
        ]);
        let (_, output) = run_script(book, "list\nback\nexit\n");
        assert!(output.contains("1. Ann Lee\n2. Acme\n"));
        assert!(output.contains("[list] Enter action ([number], back): "));
    }

    #[test]
    fn test_list_invalid_input_stays_in_view() {
        let book = book_with(vec![person("Ann", "Lee", "1")]);
        let (_, output) = run_script(book, "list\n5\nabc\n1\nmenu\nexit\n");

        assert!(output.contains("Invalid index!"));
        assert!(output.contains("Invalid action!"));
        assert_eq!(output.matches("[list] Enter action").count(), 3);
        assert!(output.contains("Name: Ann"));
    }

    #[test]
    fn test_record_view_shows_details() {
        let book = book_with(vec![Record::new(Organization::new("Acme", "1 Main St"), "42")]);
        let (_, output) = run_script(book, "list\n1\nmenu\nexit\n");

        assert!(output.contains("Organization name: Acme\nAddress: 1 Main St\nNumber: 42\n"));
        assert!(output.contains("Time created: "));
        assert!(output.contains("Time last edit: "));
        assert!(output.contains("[record] Enter action (edit, delete, menu): "));
    }

    #[test]
    fn test_edit_from_list_rerenders_list() {
        let book = book_with(vec![person("Ann", "Lee", "1"), person("Bob", "Stone", "2")]);
        let (book, output) = run_script(book, "list\n2\nedit\nsurname\nPark\nback\nexit\n");

        assert!(output.contains("Select a field (name, surname, birth, gender, number): "));
        assert!(output.contains("Enter surname: "));
        assert!(output.contains("The record updated!"));
        assert!(output.contains("1. Ann Lee\n2. Bob Park\n"));
        assert_eq!(names(&book), ["Ann Lee", "Bob Park"]);
    }

    #[test]
    fn test_edit_unknown_field() {
        let book = book_with(vec![person("Ann", "Lee", "1")]);
        let before = book.get(0).unwrap().clone();
        let (book, output) = run_script(book, "list\n1\nedit\naddress\nback\nexit\n");

        assert!(output.contains("Unknown field!"));
        assert_eq!(book.get(0).unwrap(), &before);
    }

    #[test]
    fn test_edit_rejected_value() {
        let book = book_with(vec![person("Ann", "Lee", "1")]);
        let before = book.get(0).unwrap().clone();
        let (book, output) = run_script(book, "list\n1\nedit\ngender\nQ\nback\nexit\n");

        assert!(output.contains("Bad gender!"));
        assert!(!output.contains("The record updated!"));
        assert_eq!(book.get(0).unwrap(), &before);
    }

    #[test]
    fn test_edit_organization_field_list() {
        let book = book_with(vec![Record::new(Organization::new("Acme", "Here"), "1")]);
        let (book, output) = run_script(book, "list\n1\nedit\norganization name\nAcme Ltd\nback\nexit\n");

        assert!(output.contains("Select a field (organization name, address, number): "));
        assert_eq!(names(&book), ["Acme Ltd"]);
    }

    #[test]
    fn test_unknown_record_action_returns_to_list() {
        let book = book_with(vec![person("Ann", "Lee", "1")]);
        let (_, output) = run_script(book, "list\n1\nfly\nback\nexit\n");

        assert!(output.contains("Unknown action!"));
        assert_eq!(output.matches("[list] Enter action").count(), 2);
    }

    #[test]
    fn test_delete_from_list() {
        let book = book_with(vec![
            person("Ann", "Lee", "1"),
            person("Bob", "Stone", "2"),
            person("Cat", "Moss", "3"),
        ]);
        let (book, output) = run_script(book, "list\n2\ndelete\nback\nexit\n");

        assert!(output.contains("The record removed."));
        assert_eq!(names(&book), ["Ann Lee", "Cat Moss"]);
        assert!(output.contains("1. Ann Lee\n2. Cat Moss\n"));
    }

    #[test]
    fn test_delete_last_record_returns_to_menu() {
        let book = book_with(vec![person("Ann", "Lee", "1")]);
        let (book, output) = run_script(book, "list\n1\ndelete\ncount\nexit\n");

        assert!(book.is_empty());
        assert!(output.contains("No records to list!"));
        assert!(output.contains("The Phone Book has 0 records."));
    }

    #[test]
    fn test_delete_from_search_removes_viewed_record() {
        let book = book_with(vec![
            person("Ann", "Lee", "1"),
            person("Bob", "Stone", "2"),
            person("Bobby", "Moss", "3"),
        ]);
        // "bob" matches positions 1 and 2; picking result 2 must remove Bobby.
        let (book, output) = run_script(book, "search\nbob\n2\ndelete\nback\nexit\n");

        assert!(output.contains("Found 2 results:\n1. Bob Stone\n2. Bobby Moss\n"));
        assert_eq!(names(&book), ["Ann Lee", "Bob Stone"]);
        assert!(output.contains("Found 1 results:\n1. Bob Stone\n"));
    }

    #[test]
    fn test_search_no_results() {
        let book = book_with(vec![person("Ann", "Lee", "1")]);
        let (_, output) = run_script(book, "search\nzzz\nexit\n");
        assert!(output.contains("No results found."));
        assert!(!output.contains("[search]"));
    }

    #[test]
    fn test_search_again_and_back() {
        let book = book_with(vec![person("Ann", "Lee", "1"), person("Bob", "Stone", "2")]);
        let (_, output) = run_script(book, "search\nann\nagain\nstone\nback\nexit\n");

        assert_eq!(output.matches("Enter search query: ").count(), 2);
        assert!(output.contains("1. Ann Lee"));
        assert!(output.contains("1. Bob Stone"));
    }

    #[test]
    fn test_search_invalid_index_stays() {
        let book = book_with(vec![person("Ann", "Lee", "1")]);
        let (_, output) = run_script(book, "search\nann\n2\nback\nexit\n");

        assert!(output.contains("Invalid index!"));
        assert_eq!(output.matches("[search] Enter action").count(), 2);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let script = "add\nperson\nAnn\nLee\n1990-01-01\nF\n555\n\
                      count\n\
                      search\nann\n1\nedit\nsurname\nPark\nback\n\
                      list\nback\n\
                      exit\n";
        let (book, output) = run_script(ContactBook::new(), script);

        assert!(output.contains("The Phone Book has 1 records."));
        assert!(output.contains("Found 1 results:\n1. Ann Lee\n"));
        assert!(output.contains("1. Ann Park\n[list]"));
        assert_eq!(names(&book), ["Ann Park"]);
    }

    #[test]
    fn test_changes_are_saved_to_storage() {
        let book = ContactBook::with_storage(Storage::open_in_memory().unwrap());
        let (mut book, _) = run_script(book, "add\norganization\nAcme\nHere\n1\n");

        let saved = book.records().to_vec();
        assert_eq!(book.load().unwrap(), 1);
        assert_eq!(book.records(), saved.as_slice());
    }

}
