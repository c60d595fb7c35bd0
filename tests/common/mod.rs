#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use memrepo::{
    CommitLog, Entities, Entity, ObjectStore, Persister, StoreConfig, Template,
};

#[derive(Debug, Clone, PartialEq, Entity)]
pub struct Book {
    #[id]
    pub isbn: String,
    #[column]
    pub title: String,
    #[column]
    pub author: String,
    #[column]
    pub edition: i32,
    #[column]
    pub release: NaiveDate,
    #[column]
    pub active: bool,
}

impl Book {
    pub fn new(isbn: &str, title: &str, author: &str, edition: i32, year: i32) -> Self {
        Self {
            isbn: isbn.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            edition,
            release: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
            active: false,
        }
    }

    pub fn active(mut self) -> Self {
        self.active = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Entity)]
#[entity(name = "car")]
pub struct Car {
    #[id]
    pub plate: String,
    #[column]
    pub model: String,
    #[column(name = "releaseYear")]
    pub release_year: i32,
}

impl Car {
    pub fn new(plate: &str, model: &str, release_year: i32) -> Self {
        Self {
            plate: plate.to_string(),
            model: model.to_string(),
            release_year,
        }
    }
}

/// Five books: editions {1, 1, 2, 3, 1}, isbns "11".."15".
pub fn library() -> Vec<Book> {
    vec![
        Book::new("11", "Clean Code", "Robert Martin", 1, 2008),
        Book::new("12", "Effective Java", "Joshua Bloch", 1, 2001),
        Book::new("13", "Effective Java", "Joshua Bloch", 2, 2008),
        Book::new("14", "Effective Java", "Joshua Bloch", 3, 2018).active(),
        Book::new("15", "Modern Software Engineering", "Dave Farley", 1, 2021),
    ]
}

pub fn entities() -> Entities {
    Entities::new()
        .with::<Book>()
        .unwrap()
        .with::<Car>()
        .unwrap()
}

pub fn template() -> Template {
    Template::new(Arc::new(ObjectStore::in_memory()), entities())
}

pub fn spied_template(config: StoreConfig) -> (Arc<CommitLog>, Template) {
    let log = Arc::new(CommitLog::new());
    let store = ObjectStore::with_config(Arc::clone(&log) as Arc<dyn Persister>, config);
    (log, Template::new(Arc::new(store), entities()))
}

pub fn loaded_template() -> Template {
    let template = template();
    template.insert_all(library()).unwrap();
    template
}

pub fn isbns(books: &[Arc<Book>]) -> Vec<String> {
    books.iter().map(|book| book.isbn.clone()).collect()
}

pub fn sorted_isbns(books: &[Arc<Book>]) -> Vec<String> {
    let mut isbns = isbns(books);
    isbns.sort();
    isbns
}
