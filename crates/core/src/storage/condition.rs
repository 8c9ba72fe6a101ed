//! Structured scan filters.
//!
//! A [`Condition`] is built from typed parts instead of an expression string.
//! Backends with an expression engine render it with [`Condition::to_expression`];
//! backends without one evaluate it directly with [`Condition::matches`].

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use aws_sdk_dynamodb::types::AttributeValue;

use super::Item;

/// Comparison operators supported in filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparator {
    fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A filter over the attributes of a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        attribute: String,
        comparator: Comparator,
        value: AttributeValue,
    },
    BeginsWith {
        attribute: String,
        prefix: String,
    },
    Exists(String),
    NotExists(String),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
}

/// A rendered filter: expression text plus its placeholder bindings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

impl Condition {
    pub fn compare(
        attribute: impl Into<String>,
        comparator: Comparator,
        value: AttributeValue,
    ) -> Self {
        Self::Compare {
            attribute: attribute.into(),
            comparator,
            value,
        }
    }

    pub fn eq(attribute: impl Into<String>, value: AttributeValue) -> Self {
        Self::compare(attribute, Comparator::Eq, value)
    }

    pub fn ne(attribute: impl Into<String>, value: AttributeValue) -> Self {
        Self::compare(attribute, Comparator::Ne, value)
    }

    pub fn lt(attribute: impl Into<String>, value: AttributeValue) -> Self {
        Self::compare(attribute, Comparator::Lt, value)
    }

    pub fn le(attribute: impl Into<String>, value: AttributeValue) -> Self {
        Self::compare(attribute, Comparator::Le, value)
    }

    pub fn gt(attribute: impl Into<String>, value: AttributeValue) -> Self {
        Self::compare(attribute, Comparator::Gt, value)
    }

    pub fn ge(attribute: impl Into<String>, value: AttributeValue) -> Self {
        Self::compare(attribute, Comparator::Ge, value)
    }

    pub fn begins_with(attribute: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::BeginsWith {
            attribute: attribute.into(),
            prefix: prefix.into(),
        }
    }

    pub fn exists(attribute: impl Into<String>) -> Self {
        Self::Exists(attribute.into())
    }

    pub fn not_exists(attribute: impl Into<String>) -> Self {
        Self::NotExists(attribute.into())
    }

    pub fn and(self, other: Condition) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Condition) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Renders the condition with generated `#nN` / `:vN` placeholders.
    pub fn to_expression(&self) -> Expression {
        let mut expression = Expression::default();
        let text = self.render(&mut expression);
        expression.expression = text;
        expression
    }

    fn render(&self, out: &mut Expression) -> String {
        match self {
            Self::Compare {
                attribute,
                comparator,
                value,
            } => {
                let name = bind_name(out, attribute);
                let placeholder = bind_value(out, value.clone());
                format!("{name} {comparator} {placeholder}")
            }
            Self::BeginsWith { attribute, prefix } => {
                let name = bind_name(out, attribute);
                let placeholder = bind_value(out, AttributeValue::S(prefix.clone()));
                format!("begins_with({name}, {placeholder})")
            }
            Self::Exists(attribute) => {
                format!("attribute_exists({})", bind_name(out, attribute))
            }
            Self::NotExists(attribute) => {
                format!("attribute_not_exists({})", bind_name(out, attribute))
            }
            Self::And(left, right) => {
                let left = left.render(out);
                let right = right.render(out);
                format!("({left}) AND ({right})")
            }
            Self::Or(left, right) => {
                let left = left.render(out);
                let right = right.render(out);
                format!("({left}) OR ({right})")
            }
            Self::Not(inner) => format!("NOT ({})", inner.render(out)),
        }
    }

    /// Evaluates the condition against a row.
    ///
    /// Comparisons against an absent attribute, or between values of
    /// different types, are false.
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Self::Compare {
                attribute,
                comparator,
                value,
            } => item
                .get(attribute)
                .and_then(|actual| compare_values(actual, value))
                .is_some_and(|ordering| comparator.accepts(ordering)),
            Self::BeginsWith { attribute, prefix } => item
                .get(attribute)
                .and_then(|v| v.as_s().ok())
                .is_some_and(|s| s.starts_with(prefix.as_str())),
            Self::Exists(attribute) => item.contains_key(attribute),
            Self::NotExists(attribute) => !item.contains_key(attribute),
            Self::And(left, right) => left.matches(item) && right.matches(item),
            Self::Or(left, right) => left.matches(item) || right.matches(item),
            Self::Not(inner) => !inner.matches(item),
        }
    }
}

fn bind_name(out: &mut Expression, attribute: &str) -> String {
    let existing = out
        .names
        .iter()
        .find(|(_, name)| name.as_str() == attribute)
        .map(|(placeholder, _)| placeholder.clone());
    if let Some(placeholder) = existing {
        return placeholder;
    }
    let placeholder = format!("#n{}", out.names.len());
    out.names.insert(placeholder.clone(), attribute.to_string());
    placeholder
}

fn bind_value(out: &mut Expression, value: AttributeValue) -> String {
    let placeholder = format!(":v{}", out.values.len());
    out.values.insert(placeholder.clone(), value);
    placeholder
}

/// Orders two values of the same scalar type. Numbers compare numerically.
fn compare_values(left: &AttributeValue, right: &AttributeValue) -> Option<Ordering> {
    match (left, right) {
        (AttributeValue::S(l), AttributeValue::S(r)) => Some(l.cmp(r)),
        (AttributeValue::N(l), AttributeValue::N(r)) => {
            match (l.parse::<f64>(), r.parse::<f64>()) {
                (Ok(l), Ok(r)) => l.partial_cmp(&r),
                _ => Some(l.cmp(r)),
            }
        }
        (AttributeValue::Bool(l), AttributeValue::Bool(r)) => Some(l.cmp(r)),
        _ => None,
    }
}
