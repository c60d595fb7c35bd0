/// Repository method query tests
///
/// Queries derived from method names: criteria, ordering, prefixes and
/// result shapes
/// Run with: cargo test --test repository_method_query_tests

mod common;

use common::{Book, Car, isbns, loaded_template, sorted_isbns};
use memrepo::query::MethodKind;
use memrepo::{
    MethodSignature, Param, Pageable, Repository, RepositoryDescriptor, ReturnShape, Sort,
    StoreError, Template, Value,
};

fn descriptor() -> RepositoryDescriptor {
    RepositoryDescriptor::new::<Book>("BookRepository")
        .query("findByTitleAndEdition", ReturnShape::List)
        .query("findByTitleOrEdition", ReturnShape::List)
        .query("findByEditionGreaterThan", ReturnShape::List)
        .query("findByEditionGreaterThanEqual", ReturnShape::List)
        .query("findByEditionLessThan", ReturnShape::List)
        .query("findByEditionLessThanEqual", ReturnShape::List)
        .query("findByIsbnIn", ReturnShape::List)
        .query("findByIsbnNotIn", ReturnShape::List)
        .query("findByEditionNot", ReturnShape::List)
        .query("findByActiveTrue", ReturnShape::List)
        .query("findByActiveFalse", ReturnShape::List)
        .query("findByTitleOrderByEditionDesc", ReturnShape::List)
        .query("findByEditionOrderByTitleAscIsbnDesc", ReturnShape::List)
        .query("findByTitle", ReturnShape::Page)
        .method(MethodSignature::returning("findByAuthor", "Set<Book>"))
        .method(MethodSignature::returning("findByEdition", "Stream<Book>"))
        .method(MethodSignature::returning("findByIsbn", "Optional<Book>"))
        .method(MethodSignature::returning("findByActive", "Deque<Book>"))
        .method(MethodSignature::returning("countByTitle", "long"))
        .method(MethodSignature::returning("existsByAuthor", "boolean"))
        .method(MethodSignature::returning("deleteByTitle", "void"))
        .method(MethodSignature::returning("deleteByEdition", "long"))
        .query("findByEditionBetween", ReturnShape::List)
        .query("findByTitleLike", ReturnShape::List)
        .query("findByPublisher", ReturnShape::List)
        .query("searchByTitle", ReturnShape::List)
        .method(MethodSignature::base("findById"))
}

fn repository() -> (Template, Repository<Book>) {
    let template = loaded_template();
    let repository = Repository::build(&descriptor(), template.clone()).unwrap();
    (template, repository)
}

fn list(repository: &Repository<Book>, method: &str, params: &[Param]) -> Vec<String> {
    let books = repository.invoke(method, params).unwrap().into_list().unwrap();
    sorted_isbns(&books)
}

#[test]
fn test_and_requires_both_clauses() {
    let (_, repository) = repository();
    let found = list(
        &repository,
        "findByTitleAndEdition",
        &[Param::value("Effective Java"), Param::value(1)],
    );
    assert_eq!(found, vec!["12"]);
}

#[test]
fn test_or_accepts_either_clause() {
    let (_, repository) = repository();
    let found = list(
        &repository,
        "findByTitleOrEdition",
        &[Param::value("Clean Code"), Param::value(3)],
    );
    assert_eq!(found, vec!["11", "14"]);
}

#[test]
fn test_range_suffixes() {
    let (_, repository) = repository();
    let edition = |method: &str, value: i32| list(&repository, method, &[Param::value(value)]);

    assert_eq!(edition("findByEditionGreaterThan", 1), vec!["13", "14"]);
    assert_eq!(edition("findByEditionGreaterThanEqual", 3), vec!["14"]);
    assert_eq!(edition("findByEditionLessThan", 2), vec!["11", "12", "15"]);
    assert_eq!(
        edition("findByEditionLessThanEqual", 2),
        vec!["11", "12", "13", "15"]
    );
}

#[test]
fn test_in_and_not_in() {
    let (_, repository) = repository();
    let ids = Value::from(vec!["11", "13"]);

    assert_eq!(
        list(&repository, "findByIsbnIn", &[Param::value(ids.clone())]),
        vec!["11", "13"]
    );
    assert_eq!(
        list(&repository, "findByIsbnNotIn", &[Param::value(ids)]),
        vec!["12", "14", "15"]
    );
}

#[test]
fn test_not_negates_equality() {
    let (_, repository) = repository();
    assert_eq!(
        list(&repository, "findByEditionNot", &[Param::value(1)]),
        vec!["13", "14"]
    );
}

#[test]
fn test_boolean_literal_suffixes_take_no_arguments() {
    let (_, repository) = repository();
    assert_eq!(list(&repository, "findByActiveTrue", &[]), vec!["14"]);
    assert_eq!(
        list(&repository, "findByActiveFalse", &[]),
        vec!["11", "12", "13", "15"]
    );
}

#[test]
fn test_order_by_in_method_name() {
    let (_, repository) = repository();
    let books = repository
        .invoke("findByTitleOrderByEditionDesc", &[Param::value("Effective Java")])
        .unwrap()
        .into_list()
        .unwrap();
    assert_eq!(isbns(&books), vec!["14", "13", "12"]);

    let books = repository
        .invoke("findByEditionOrderByTitleAscIsbnDesc", &[Param::value(1)])
        .unwrap()
        .into_list()
        .unwrap();
    assert_eq!(isbns(&books), vec!["11", "12", "15"]);
}

#[test]
fn test_sort_argument_follows_name_sorts() {
    let (_, repository) = repository();
    let books = repository
        .invoke(
            "findByEditionGreaterThan",
            &[Param::value(0), Param::from(Sort::desc("isbn"))],
        )
        .unwrap()
        .into_list()
        .unwrap();
    assert_eq!(isbns(&books), vec!["15", "14", "13", "12", "11"]);
}

#[test]
fn test_result_shapes() {
    let (_, repository) = repository();

    let set = repository
        .invoke("findByAuthor", &[Param::value("Joshua Bloch")])
        .unwrap()
        .into_set()
        .unwrap();
    assert_eq!(set.len(), 3);
    assert!(set.contains_key(&Value::from("13")));

    let stream = repository
        .invoke("findByEdition", &[Param::value(1)])
        .unwrap()
        .into_stream()
        .unwrap();
    assert_eq!(stream.count(), 3);

    let optional = repository
        .invoke("findByIsbn", &[Param::value("15")])
        .unwrap()
        .into_optional()
        .unwrap();
    assert_eq!(optional.unwrap().author, "Dave Farley");

    let deque = repository
        .invoke("findByActive", &[Param::value(true)])
        .unwrap()
        .into_deque()
        .unwrap();
    assert_eq!(deque.front().unwrap().isbn, "14");
}

#[test]
fn test_page_shape_uses_pageable_argument() {
    let (_, repository) = repository();
    let page = repository
        .invoke(
            "findByTitle",
            &[
                Param::value("Effective Java"),
                Param::from(
                    Pageable::of_size(2)
                        .unwrap()
                        .page(2)
                        .unwrap()
                        .sort_by(Sort::asc("edition")),
                ),
            ],
        )
        .unwrap()
        .into_page()
        .unwrap();

    assert_eq!(isbns(page.content()), vec!["14"]);
    assert_eq!(page.next_pageable().page_number(), 3);
}

#[test]
fn test_optional_shape_takes_first_match() {
    let template = loaded_template();
    let repository = Repository::<Book>::build(
        &RepositoryDescriptor::new::<Book>("BookRepository")
            .method(MethodSignature::returning("findByTitleOrderByEditionDesc", "Optional<Book>"))
            .method(MethodSignature::returning("findByAuthor", "Book")),
        template,
    )
    .unwrap();

    let first = repository
        .invoke("findByTitleOrderByEditionDesc", &[Param::value("Effective Java")])
        .unwrap()
        .into_optional()
        .unwrap();
    assert_eq!(first.unwrap().isbn, "14");

    let none = repository
        .invoke("findByAuthor", &[Param::value("Kent Beck")])
        .unwrap()
        .into_optional()
        .unwrap();
    assert!(none.is_none());
}

#[test]
fn test_count_and_exists_prefixes() {
    let (_, repository) = repository();

    let count = repository
        .invoke("countByTitle", &[Param::value("Effective Java")])
        .unwrap()
        .into_count()
        .unwrap();
    assert_eq!(count, 3);

    assert!(
        repository
            .invoke("existsByAuthor", &[Param::value("Dave Farley")])
            .unwrap()
            .into_bool()
            .unwrap()
    );
    assert!(
        !repository
            .invoke("existsByAuthor", &[Param::value("Kent Beck")])
            .unwrap()
            .into_bool()
            .unwrap()
    );
}

#[test]
fn test_delete_prefix_removes_matches() {
    let (template, repository) = repository();
    template.insert(Car::new("B-XY-1", "Effective Java", 2001)).unwrap();

    let output = repository
        .invoke("deleteByTitle", &[Param::value("Effective Java")])
        .unwrap();
    assert!(output.is_unit());
    assert_eq!(
        sorted_isbns(&template.entities::<Book>().unwrap()),
        vec!["11", "15"]
    );
    assert_eq!(template.entities::<Car>().unwrap().len(), 1);

    let removed = repository
        .invoke("deleteByEdition", &[Param::value(1)])
        .unwrap()
        .into_count()
        .unwrap();
    assert_eq!(removed, 2);
}

#[test]
fn test_unsupported_operators_fail_on_invoke() {
    let (_, repository) = repository();

    for method in ["findByEditionBetween", "findByTitleLike"] {
        let err = repository.invoke(method, &[Param::value(1)]).unwrap_err();
        assert!(matches!(err, StoreError::Mapping(_)), "{}: {:?}", method, err);
    }
}

#[test]
fn test_unknown_field_fails_on_invoke() {
    let (_, repository) = repository();
    let err = repository
        .invoke("findByPublisher", &[Param::value("Addison-Wesley")])
        .unwrap_err();
    assert!(matches!(err, StoreError::Mapping(_)));
}

#[test]
fn test_unsupported_method_name() {
    let (_, repository) = repository();
    assert_eq!(repository.kind("searchByTitle"), Some(MethodKind::Unsupported));

    let err = repository
        .invoke("searchByTitle", &[Param::value("Clean Code")])
        .unwrap_err();
    assert!(matches!(err, StoreError::Unsupported(_)));

    let err = repository.invoke("notDeclared", &[]).unwrap_err();
    assert!(matches!(err, StoreError::Unsupported(_)));
}

#[test]
fn test_missing_arguments() {
    let (_, repository) = repository();
    let err = repository
        .invoke("findByTitleAndEdition", &[Param::value("Effective Java")])
        .unwrap_err();
    assert!(matches!(err, StoreError::Argument(_)));
}

#[test]
fn test_classification() {
    let (_, repository) = repository();
    assert_eq!(repository.kind("findById"), Some(MethodKind::PlainForward));
    assert_eq!(repository.kind("findAll"), Some(MethodKind::PlainForward));
    assert_eq!(repository.kind("findByTitle"), Some(MethodKind::DerivedFind));
    assert_eq!(repository.kind("countByTitle"), Some(MethodKind::DerivedCount));
    assert_eq!(repository.kind("existsByAuthor"), Some(MethodKind::DerivedExists));
    assert_eq!(repository.kind("deleteByTitle"), Some(MethodKind::DerivedDelete));
    assert_eq!(repository.kind("notDeclared"), None);
}

#[test]
fn test_descriptor_for_other_entity_is_rejected() {
    let template = loaded_template();
    let err = Repository::<Book>::build(&RepositoryDescriptor::new::<Car>("CarRepository"), template)
        .unwrap_err();
    assert!(matches!(err, StoreError::Mapping(_)));
}
