// ============================================================================
// Query-by-name grammar
// ============================================================================
//
//   findBy | deleteBy | countBy | existsBy
//   <Field>[Not][Suffix] ( (And|Or) <Field>[Not][Suffix] )*
//   ( OrderBy <Field>[Asc|Desc] ( <Field>[Asc|Desc] )* )*
//
// Suffix: LessThan, LessThanEqual, GreaterThan, GreaterThanEqual, In,
// True, False. Between and Like are rejected.
// ============================================================================

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use regex::Regex;

use crate::core::{Result, StoreError, Value};
use crate::query::condition::{Condition, Conjunction, Operand};
use crate::query::predicate::Operator;
use crate::query::sort::{Direction, Sort};
use crate::schema::entity::decapitalize;

const PARSE_CACHE_CAPACITY: NonZeroUsize = NonZeroUsize::new(256).unwrap();

lazy_static::lazy_static! {
    static ref CAMEL_WORD: Regex =
        Regex::new(r"[A-Z][^A-Z]*|[^A-Z]+").expect("camel case word pattern");
    static ref PARSE_CACHE: Arc<Mutex<LruCache<String, Arc<MethodQuery>>>> =
        Arc::new(Mutex::new(LruCache::new(PARSE_CACHE_CAPACITY)));
}

/// Classification of a declared repository method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// Part of the repository base vocabulary.
    PlainForward,
    /// The literal `findAll`: full scan.
    FindAll,
    DerivedFind,
    DerivedDelete,
    DerivedCount,
    DerivedExists,
    /// Fails on invocation.
    Unsupported,
}

const PREFIXES: [(&str, MethodKind); 4] = [
    ("findBy", MethodKind::DerivedFind),
    ("deleteBy", MethodKind::DerivedDelete),
    ("countBy", MethodKind::DerivedCount),
    ("existsBy", MethodKind::DerivedExists),
];

impl MethodKind {
    /// First match wins: base vocabulary, `findAll`, derived prefixes.
    pub fn classify(name: &str, is_base: bool) -> Self {
        if is_base {
            return Self::PlainForward;
        }
        if name == "findAll" {
            return Self::FindAll;
        }
        PREFIXES
            .iter()
            .find(|(prefix, _)| name.starts_with(prefix))
            .map(|(_, kind)| *kind)
            .unwrap_or(Self::Unsupported)
    }

    pub fn is_derived(self) -> bool {
        matches!(
            self,
            Self::DerivedFind | Self::DerivedDelete | Self::DerivedCount | Self::DerivedExists
        )
    }

    fn prefix(self) -> Option<&'static str> {
        PREFIXES
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(prefix, _)| *prefix)
    }
}

/// Parsed derived query: condition tree plus name-declared sort keys.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodQuery {
    pub kind: MethodKind,
    pub condition: Condition,
    pub sorts: Vec<Sort>,
}

impl MethodQuery {
    /// Parses a derived method name. Successful parses are cached.
    pub fn parse(name: &str) -> Result<Arc<MethodQuery>> {
        if let Some(cached) = PARSE_CACHE.lock()?.get(name) {
            return Ok(Arc::clone(cached));
        }

        let parsed = Arc::new(Self::parse_uncached(name)?);
        PARSE_CACHE
            .lock()?
            .put(name.to_string(), Arc::clone(&parsed));
        Ok(parsed)
    }

    fn parse_uncached(name: &str) -> Result<MethodQuery> {
        let kind = MethodKind::classify(name, false);
        let body = kind
            .prefix()
            .and_then(|prefix| name.strip_prefix(prefix))
            .ok_or_else(|| {
                StoreError::Mapping(format!("'{}' is not a derived query method", name))
            })?;

        let words: Vec<&str> = CAMEL_WORD.find_iter(body).map(|m| m.as_str()).collect();
        let order_at = words
            .windows(2)
            .position(|pair| pair == ["Order", "By"])
            .unwrap_or(words.len());
        let (criteria, ordering) = words.split_at(order_at);

        let condition = parse_criteria(name, criteria)?;
        let sorts = parse_ordering(name, ordering)?;
        Ok(MethodQuery {
            kind,
            condition,
            sorts,
        })
    }
}

fn parse_criteria(method: &str, words: &[&str]) -> Result<Condition> {
    let mut condition: Option<Condition> = None;
    let mut pending = None;
    let mut clause: Vec<&str> = Vec::new();

    for word in words.iter().copied().chain(std::iter::once("")) {
        let conjunction = match word {
            "And" => Some(Conjunction::And),
            "Or" => Some(Conjunction::Or),
            "" => None,
            _ => {
                clause.push(word);
                continue;
            }
        };

        let leaf = parse_clause(method, &clause)?;
        clause.clear();
        condition = Some(match (condition, pending) {
            (None, _) => leaf,
            (Some(current), Some(joined)) => current.combine(joined, leaf),
            (Some(current), None) => current.combine(Conjunction::And, leaf),
        });
        pending = conjunction;
    }

    condition.ok_or_else(|| StoreError::Mapping(format!("'{}' declares no criteria", method)))
}

fn parse_clause(method: &str, words: &[&str]) -> Result<Condition> {
    let (mut rest, operator, literal) = split_suffix(method, words)?;

    let negated = rest.len() > 1 && rest.last() == Some(&"Not");
    if negated {
        rest = &rest[..rest.len() - 1];
    }
    if rest.is_empty() {
        return Err(StoreError::Mapping(format!(
            "'{}' has a clause without a field name",
            method
        )));
    }

    let field = decapitalize(&rest.concat());
    let operand = match literal {
        Some(value) => Operand::Literal(value),
        None => Operand::Parameter,
    };
    let leaf = Condition::compare(field, operator, operand);
    Ok(if negated { leaf.negate() } else { leaf })
}

type Suffix = (&'static [&'static str], Operator, Option<bool>);

const SUFFIXES: [Suffix; 7] = [
    (&["Less", "Than", "Equal"], Operator::Lte, None),
    (&["Greater", "Than", "Equal"], Operator::Gte, None),
    (&["Less", "Than"], Operator::Lt, None),
    (&["Greater", "Than"], Operator::Gt, None),
    (&["In"], Operator::In, None),
    (&["True"], Operator::Eq, Some(true)),
    (&["False"], Operator::Eq, Some(false)),
];

const UNSUPPORTED_SUFFIXES: [&str; 2] = ["Between", "Like"];

fn split_suffix<'w, 'a>(
    method: &str,
    words: &'w [&'a str],
) -> Result<(&'w [&'a str], Operator, Option<Value>)> {
    if let [_, .., last] = words {
        if UNSUPPORTED_SUFFIXES.contains(last) {
            return Err(StoreError::Mapping(format!(
                "Unsupported operator '{}' in '{}'",
                last, method
            )));
        }
    }

    for (suffix, operator, literal) in SUFFIXES {
        if words.len() > suffix.len() && words.ends_with(suffix) {
            let rest = &words[..words.len() - suffix.len()];
            return Ok((rest, operator, literal.map(Value::Boolean)));
        }
    }
    Ok((words, Operator::Eq, None))
}

fn parse_ordering(method: &str, words: &[&str]) -> Result<Vec<Sort>> {
    let mut sorts = Vec::new();
    let mut field: Vec<&str> = Vec::new();
    let mut rest = words;

    while let Some((word, tail)) = rest.split_first() {
        match *word {
            "Order" if tail.first() == Some(&"By") => {
                flush_sort(method, &mut field, Direction::Asc, &mut sorts, false)?;
                rest = &tail[1..];
                continue;
            }
            "Asc" => flush_sort(method, &mut field, Direction::Asc, &mut sorts, true)?,
            "Desc" => flush_sort(method, &mut field, Direction::Desc, &mut sorts, true)?,
            other => field.push(other),
        }
        rest = tail;
    }
    flush_sort(method, &mut field, Direction::Asc, &mut sorts, false)?;

    if !words.is_empty() && sorts.is_empty() {
        return Err(StoreError::Mapping(format!(
            "'{}' has OrderBy without a field",
            method
        )));
    }
    Ok(sorts)
}

fn flush_sort(
    method: &str,
    field: &mut Vec<&str>,
    direction: Direction,
    sorts: &mut Vec<Sort>,
    required: bool,
) -> Result<()> {
    if field.is_empty() {
        if required {
            return Err(StoreError::Mapping(format!(
                "'{}' has a sort direction without a field",
                method
            )));
        }
        return Ok(());
    }
    sorts.push(Sort::new(decapitalize(&field.concat()), direction));
    field.clear();
    Ok(())
}
