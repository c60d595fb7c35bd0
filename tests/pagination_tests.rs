/// Pagination tests
///
/// Page windows, sort keys carried by the pageable and page navigation
/// Run with: cargo test --test pagination_tests

mod common;

use common::{Book, isbns, loaded_template};
use memrepo::{
    Pageable, Param, Repository, RepositoryDescriptor, ReturnShape, Sort, StoreError, Template,
};

fn books(template: &Template) -> Repository<Book> {
    Repository::build(
        &RepositoryDescriptor::new::<Book>("BookRepository")
            .query("findByEditionGreaterThanOrderByIsbn", ReturnShape::Page)
            .query("findByAuthor", ReturnShape::Page),
        template.clone(),
    )
    .unwrap()
}

fn by_isbn(size: usize, page: usize) -> Pageable {
    Pageable::new(size, page, vec![Sort::asc("isbn")]).unwrap()
}

#[test]
fn test_second_page_holds_third_and_fourth() {
    let template = loaded_template();
    let repository = books(&template);

    let page = repository.find_all_paged(by_isbn(2, 2)).unwrap();

    assert_eq!(isbns(page.content()), vec!["13", "14"]);
    assert_eq!(page.number_of_elements(), 2);
    assert_eq!(page.next_pageable().page_number(), 3);
}

#[test]
fn test_walk_pages_until_empty() {
    let template = loaded_template();
    let repository = books(&template);

    let mut pageable = by_isbn(2, 1);
    let mut seen = Vec::new();
    loop {
        let page = repository.find_all_paged(pageable).unwrap();
        if !page.has_content() {
            break;
        }
        seen.extend(isbns(page.content()));
        pageable = page.next_pageable();
    }

    assert_eq!(seen, vec!["11", "12", "13", "14", "15"]);
}

#[test]
fn test_page_sorts_descending() {
    let template = loaded_template();
    let repository = books(&template);

    let pageable = Pageable::of_size(3)
        .unwrap()
        .sort_by(Sort::desc("edition"))
        .sort_by(Sort::desc("isbn"));
    let page = repository.find_all_paged(pageable).unwrap();

    assert_eq!(isbns(page.content()), vec!["14", "13", "15"]);
}

#[test]
fn test_unknown_sort_field_is_mapping_error() {
    let template = loaded_template();
    let repository = books(&template);

    let err = repository
        .find_all_paged(Pageable::of_size(2).unwrap().sort_by(Sort::asc("publisher")))
        .unwrap_err();
    assert!(matches!(err, StoreError::Mapping(_)));
}

#[test]
fn test_find_all_by_name_with_pageable() {
    let template = loaded_template();
    let repository = books(&template);

    let page = repository
        .invoke("findAll", &[Param::from(by_isbn(2, 3))])
        .unwrap()
        .into_page()
        .unwrap();
    assert_eq!(isbns(page.content()), vec!["15"]);
}

#[test]
fn test_pageable_sorts_follow_name_sorts() {
    let template = loaded_template();
    let repository = books(&template);

    let pageable = Pageable::of_size(10).unwrap().sort_by(Sort::desc("edition"));
    let page = repository
        .invoke(
            "findByEditionGreaterThanOrderByIsbn",
            &[Param::value(0), Param::from(pageable)],
        )
        .unwrap()
        .into_page()
        .unwrap();

    assert_eq!(isbns(page.content()), vec!["11", "12", "13", "14", "15"]);
}

#[test]
fn test_page_shape_without_pageable_uses_default_size() {
    let template = loaded_template();
    let repository = books(&template);

    let page = repository
        .invoke("findByAuthor", &[Param::value("Joshua Bloch")])
        .unwrap()
        .into_page()
        .unwrap();

    assert_eq!(page.number_of_elements(), 3);
    assert_eq!(
        page.pageable().size(),
        template.store().config().default_page_size
    );
}

#[test]
fn test_totals_are_unsupported() {
    let template = loaded_template();
    let repository = books(&template);
    let page = repository.find_all_paged(by_isbn(2, 1)).unwrap();

    assert!(matches!(page.total_elements(), Err(StoreError::Unsupported(_))));
    assert!(matches!(page.total_pages(), Err(StoreError::Unsupported(_))));
}

#[test]
fn test_invalid_pageable() {
    assert!(matches!(Pageable::of_size(0), Err(StoreError::Argument(_))));
    assert!(matches!(
        Pageable::new(2, 0, Vec::new()),
        Err(StoreError::Argument(_))
    ));
}

#[test]
fn test_transported_pageable_is_validated() {
    let template = loaded_template();
    let repository = books(&template);

    let pageable: Pageable = serde_json::from_str(
        r#"{"size":2,"page":2,"sorts":[{"property":"isbn","direction":"Asc"}]}"#,
    )
    .unwrap();
    let page = repository.find_all_paged(pageable).unwrap();
    assert_eq!(isbns(page.content()), vec!["13", "14"]);

    assert!(serde_json::from_str::<Pageable>(r#"{"size":0,"page":1,"sorts":[]}"#).is_err());
    assert!(serde_json::from_str::<Pageable>(r#"{"size":2,"page":0,"sorts":[]}"#).is_err());
}

#[test]
fn test_page_iterates_content() {
    let template = loaded_template();
    let repository = books(&template);
    let page = repository.find_all_paged(by_isbn(2, 1)).unwrap();

    let editions: Vec<i32> = page.iter().map(|book| book.edition).collect();
    assert_eq!(editions, vec![1, 1]);
    assert_eq!((&page).into_iter().count(), 2);
    assert_eq!(page.into_iter().count(), 2);
}
