//! Interactive text menu
//!
//! stdin/stdout <-> application::CatalogService
//!
//! 1 add, 2 delete, 3 find, 4 list, 5 change status, 6 exit

use std::io::{self, BufRead, Write};

use crate::application::error::AppError;
use crate::application::service::CatalogService;
use crate::domain::model::book::{Book, BookId};
use crate::domain::model::catalog::BookQuery;
use crate::domain::repository::CatalogRepository;

const MENU: &str = "\
Library catalog:
1. Add a book
2. Delete a book
3. Find books
4. List all books
5. Change book status
6. Exit";

/// 入力がEOFに達したら None。
type Input<T> = io::Result<Option<T>>;

/// メニューを実行する。`6` または入力のEOFで終了。
pub fn run<R, I, O>(svc: &mut CatalogService<R>, input: I, output: O) -> io::Result<()>
where
    R: CatalogRepository,
    I: BufRead,
    O: Write,
{
    Menu { svc, input, output }.run()
}

struct Menu<'a, R: CatalogRepository, I, O> {
    svc: &'a mut CatalogService<R>,
    input: I,
    output: O,
}

impl<R: CatalogRepository, I: BufRead, O: Write> Menu<'_, R, I, O> {
    fn run(&mut self) -> io::Result<()> {
        if let Some(warning) = self.svc.load_warning() {
            tracing::warn!(%warning, "catalog load fell back to empty");
            writeln!(self.output, "Warning: {warning}")?;
        }

        loop {
            writeln!(self.output, "\n{MENU}")?;
            let Some(choice) = self.prompt("Choose an action (1-6): ")? else {
                break;
            };
            tracing::debug!(choice = %choice, "menu command");

            let handled = match choice.as_str() {
                "1" => self.add()?,
                "2" => self.delete()?,
                "3" => self.find()?,
                "4" => self.list()?,
                "5" => self.change_status()?,
                "6" => None,
                _ => {
                    writeln!(self.output, "Unknown choice. Try again.")?;
                    Some(())
                }
            };
            if handled.is_none() {
                break;
            }
        }

        writeln!(self.output, "Goodbye.")?;
        self.output.flush()
    }

    fn add(&mut self) -> Input<()> {
        let Some(title) = self.prompt("Title: ")? else {
            return Ok(None);
        };
        let Some(author) = self.prompt("Author: ")? else {
            return Ok(None);
        };
        let Some(year) = self.prompt_int::<i32>("Year: ")? else {
            return Ok(None);
        };

        match self.svc.add(&title, &author, year) {
            Ok(book) => writeln!(self.output, "Added: {book}")?,
            Err(e) => self.report(e)?,
        }
        Ok(Some(()))
    }

    fn delete(&mut self) -> Input<()> {
        let Some(id) = self.prompt_id("Book ID to delete: ")? else {
            return Ok(None);
        };
        match self.svc.delete(id) {
            Ok(true) => writeln!(self.output, "Book deleted.")?,
            Ok(false) => writeln!(self.output, "No book with ID {id}.")?,
            Err(e) => self.report(e)?,
        }
        Ok(Some(()))
    }

    fn find(&mut self) -> Input<()> {
        writeln!(self.output, "Find books (leave a field blank to skip it):")?;
        let Some(title) = self.prompt("Title: ")? else {
            return Ok(None);
        };
        let Some(author) = self.prompt("Author: ")? else {
            return Ok(None);
        };
        let Some(year) = self.prompt("Year: ")? else {
            return Ok(None);
        };

        let query = BookQuery {
            title: Some(title).filter(|s| !s.is_empty()),
            author: Some(author).filter(|s| !s.is_empty()),
            year: year.parse().ok(),
        };
        let results = self.svc.find(&query);
        if results.is_empty() {
            writeln!(self.output, "No books found.")?;
        } else {
            writeln!(self.output, "\nFound books:")?;
            self.print_books(&results)?;
        }
        Ok(Some(()))
    }

    fn list(&mut self) -> Input<()> {
        let books = self.svc.list().to_vec();
        if books.is_empty() {
            writeln!(self.output, "The catalog is empty.")?;
        } else {
            writeln!(self.output, "\nAll books:")?;
            self.print_books(&books)?;
        }
        Ok(Some(()))
    }

    fn change_status(&mut self) -> Input<()> {
        let Some(id) = self.prompt_id("Book ID: ")? else {
            return Ok(None);
        };
        let Some(status) =
            self.prompt("New status (available / checked out, blank to toggle): ")?
        else {
            return Ok(None);
        };

        let result = if status.is_empty() {
            self.svc.toggle_status(id).map(|s| s.is_some())
        } else {
            self.svc.update_status_str(id, &status)
        };
        match result {
            Ok(true) => {
                let status = self.svc.get(id).map(|b| b.status().to_string());
                writeln!(
                    self.output,
                    "Status updated: {}",
                    status.unwrap_or_default()
                )?;
            }
            Ok(false) => writeln!(self.output, "No book with ID {id}.")?,
            Err(e) => self.report(e)?,
        }
        Ok(Some(()))
    }

    // --- helpers ---

    fn print_books(&mut self, books: &[Book]) -> io::Result<()> {
        for book in books {
            writeln!(self.output, "{book}")?;
        }
        Ok(())
    }

    fn report(&mut self, e: AppError) -> io::Result<()> {
        match &e {
            AppError::Persistence(_) => tracing::error!(error = %e, "failed to persist catalog"),
            AppError::Domain(_) => tracing::debug!(error = %e, "rejected input"),
        }
        writeln!(self.output, "Error: {e}")
    }

    fn prompt(&mut self, message: &str) -> Input<String> {
        write!(self.output, "{message}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// 整数として解釈できるまで再入力を求める。
    fn prompt_int<T: std::str::FromStr>(&mut self, message: &str) -> Input<T> {
        loop {
            let Some(raw) = self.prompt(message)? else {
                return Ok(None);
            };
            match raw.parse() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => writeln!(self.output, "Please enter a whole number.")?,
            }
        }
    }

    fn prompt_id(&mut self, message: &str) -> Input<BookId> {
        loop {
            let Some(raw) = self.prompt_int::<u64>(message)? else {
                return Ok(None);
            };
            match BookId::new(raw) {
                Some(id) => return Ok(Some(id)),
                None => writeln!(self.output, "IDs start at 1.")?,
            }
        }
    }
}
