use std::fmt;

use crate::core::{Result, StoreError, Value};
use crate::query::predicate::{self, EntityPredicate, Operator};
use crate::schema::{Entity, EntitySchema};

/// Where a comparison takes its right-hand side from.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    /// The next unconsumed positional call argument.
    Parameter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

/// Condition tree shared by derived queries and the fluent builder.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        field: String,
        operator: Operator,
        operand: Operand,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn compare(field: impl Into<String>, operator: Operator, operand: Operand) -> Self {
        Self::Compare {
            field: field.into(),
            operator,
            operand,
        }
    }

    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Appends `next` strictly left to right: the same conjunction extends
    /// the current node, a different one wraps everything so far.
    ///
    /// `a AND b OR c` becomes `(a AND b) OR c`, and `a OR b AND c` becomes
    /// `(a OR b) AND c`.
    pub fn combine(self, conjunction: Conjunction, next: Condition) -> Self {
        match (self, conjunction) {
            (Self::And(mut children), Conjunction::And) => {
                children.push(next);
                Self::And(children)
            }
            (Self::Or(mut children), Conjunction::Or) => {
                children.push(next);
                Self::Or(children)
            }
            (current, Conjunction::And) => Self::And(vec![current, next]),
            (current, Conjunction::Or) => Self::Or(vec![current, next]),
        }
    }

    /// Number of positional arguments the tree consumes.
    pub fn parameter_count(&self) -> usize {
        match self {
            Self::Compare { operand, .. } => usize::from(*operand == Operand::Parameter),
            Self::And(children) | Self::Or(children) => {
                children.iter().map(Condition::parameter_count).sum()
            }
            Self::Not(inner) => inner.parameter_count(),
        }
    }

    /// Resolves fields on `schema` and binds parameters in clause order.
    pub fn bind<'a, T: Entity>(
        &self,
        schema: &EntitySchema<T>,
        arguments: &mut impl Iterator<Item = &'a Value>,
    ) -> Result<EntityPredicate<T>> {
        match self {
            Self::Compare {
                field,
                operator,
                operand,
            } => {
                let accessor = schema.resolve(field)?;
                let value = match operand {
                    Operand::Literal(value) => value.clone(),
                    Operand::Parameter => arguments
                        .next()
                        .cloned()
                        .ok_or_else(|| StoreError::argument("There are arguments missing"))?,
                };
                predicate::build(*operator, value, accessor)
            }
            Self::And(children) => fold(schema, children, arguments, predicate::and),
            Self::Or(children) => fold(schema, children, arguments, predicate::or),
            Self::Not(inner) => Ok(predicate::not(inner.bind(schema, arguments)?)),
        }
    }
}

fn fold<'a, T: Entity>(
    schema: &EntitySchema<T>,
    children: &[Condition],
    arguments: &mut impl Iterator<Item = &'a Value>,
    join: fn(EntityPredicate<T>, EntityPredicate<T>) -> EntityPredicate<T>,
) -> Result<EntityPredicate<T>> {
    let mut iter = children.iter();
    let first = iter
        .next()
        .ok_or_else(|| StoreError::mapping("Empty conjunction in condition"))?;
    let mut folded = first.bind(schema, arguments)?;
    for child in iter {
        folded = join(folded, child.bind(schema, arguments)?);
    }
    Ok(folded)
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare {
                field,
                operator,
                operand,
            } => match operand {
                Operand::Literal(value) => write!(f, "{} {} {}", field, operator, value),
                Operand::Parameter => write!(f, "{} {} ?", field, operator),
            },
            Self::And(children) | Self::Or(children) => {
                let joiner = if matches!(self, Self::And(_)) { " AND " } else { " OR " };
                write!(f, "(")?;
                for (idx, child) in children.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(joiner)?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
            Self::Not(inner) => write!(f, "NOT {}", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> Condition {
        Condition::compare(name, Operator::Eq, Operand::Parameter)
    }

    #[test]
    fn test_combine_is_strictly_left_to_right() {
        let tree = leaf("a")
            .combine(Conjunction::And, leaf("b"))
            .combine(Conjunction::Or, leaf("c"));
        assert_eq!(tree.to_string(), "((a = ? AND b = ?) OR c = ?)");

        let tree = leaf("a")
            .combine(Conjunction::Or, leaf("b"))
            .combine(Conjunction::And, leaf("c"));
        assert_eq!(tree.to_string(), "((a = ? OR b = ?) AND c = ?)");
    }

    #[test]
    fn test_same_conjunction_extends_node() {
        let tree = leaf("a")
            .combine(Conjunction::And, leaf("b"))
            .combine(Conjunction::And, leaf("c"));
        assert!(matches!(&tree, Condition::And(children) if children.len() == 3));
        assert_eq!(tree.parameter_count(), 3);
    }

    #[test]
    fn test_literals_consume_no_parameters() {
        let tree = Condition::compare("active", Operator::Eq, Operand::Literal(Value::from(true)))
            .combine(Conjunction::And, leaf("title").negate());
        assert_eq!(tree.parameter_count(), 1);
        assert_eq!(tree.to_string(), "(active = true AND NOT title = ?)");
    }
}
