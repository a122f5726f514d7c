//! Structural matching of `Receiver.Method("category", "key")` invocations
//!
//! Matching is textual: the receiver expression's source text is compared to
//! the configured receiver name. An identically named receiver of a different
//! type also matches, and a call through an alias (`using L = ...; L.Get(..)`)
//! does not.

use super::literals::{decode_string_literal, STRING_LITERAL_KINDS};
use super::{node_text, SourceUnit};
use keyhoist_core::config::ExtractConfig;
use std::ops::Range;
use tree_sitter::Node;

/// One argument of a candidate call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    /// A plain string literal and its decoded value
    StringLiteral(String),
    /// Anything else: interpolation, concatenation, identifiers or
    /// `ref`/`out`/`in` arguments
    Other,
}

impl Argument {
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Argument::StringLiteral(value) => Some(value),
            Argument::Other => None,
        }
    }
}

/// A member-access invocation found in a syntax tree
#[derive(Debug, Clone)]
pub struct CallSite<'a> {
    /// Source text of the receiver expression
    pub receiver: &'a str,
    /// Invoked member name
    pub method: &'a str,
    pub arguments: Vec<Argument>,
    /// Parameter name of each argument written as `name: value`
    pub argument_names: Vec<Option<&'a str>>,
    /// Byte span of the whole invocation expression
    pub span: Range<usize>,
    /// 1-based line
    pub line: usize,
    /// 0-based byte column
    pub column: usize,
}

/// Category and key pulled from a matched call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMatch {
    pub category: String,
    pub raw_key: String,
}

/// Outcome of testing a call site against a matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Shape and category match
    Match(CallMatch),
    /// Shape matches, category does not
    Filtered(CallMatch),
    NoMatch,
}

/// Predicate deciding which calls are hoisted
pub trait CallMatcher: Send + Sync {
    fn evaluate(&self, call: &CallSite<'_>) -> Verdict;
}

/// Matches `receiver.method("category", "key")` with a fixed category filter
///
/// Named arguments are resolved through the parameter names; an unnamed
/// argument is taken by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelCall {
    pub receiver: String,
    pub method: String,
    pub category: String,
    pub category_parameter: String,
    pub key_parameter: String,
}

impl SentinelCall {
    pub fn new(
        receiver: impl Into<String>,
        method: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            receiver: receiver.into(),
            method: method.into(),
            category: category.into(),
            category_parameter: "category".to_string(),
            key_parameter: "key".to_string(),
        }
    }

    /// Parameter names used to resolve named arguments
    pub fn with_parameters(mut self, category: impl Into<String>, key: impl Into<String>) -> Self {
        self.category_parameter = category.into();
        self.key_parameter = key.into();
        self
    }

    pub fn from_config(config: &ExtractConfig) -> Self {
        Self::new(&config.receiver, &config.method, &config.category)
            .with_parameters(&config.category_parameter, &config.key_parameter)
    }
}

/// Literal bound to `parameter`: the argument named so, else the unnamed one at `position`
fn bound_literal<'c>(call: &'c CallSite<'_>, parameter: &str, position: usize) -> Option<&'c str> {
    let index = call
        .argument_names
        .iter()
        .position(|name| *name == Some(parameter))
        .or_else(|| {
            call.argument_names
                .get(position)
                .filter(|name| name.is_none())
                .map(|_| position)
        })?;
    call.arguments.get(index)?.as_literal()
}

impl CallMatcher for SentinelCall {
    fn evaluate(&self, call: &CallSite<'_>) -> Verdict {
        if call.receiver != self.receiver || call.method != self.method {
            return Verdict::NoMatch;
        }
        let (Some(category), Some(raw_key)) = (
            bound_literal(call, &self.category_parameter, 0),
            bound_literal(call, &self.key_parameter, 1),
        ) else {
            return Verdict::NoMatch;
        };

        let found = CallMatch {
            category: category.to_string(),
            raw_key: raw_key.to_string(),
        };
        if category == self.category {
            Verdict::Match(found)
        } else {
            Verdict::Filtered(found)
        }
    }
}

/// Traversal control returned by a call visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    /// Do not descend into the current invocation's children
    SkipChildren,
}

/// Visit every member-access invocation in document order, depth-first
pub fn for_each_call<F>(unit: &SourceUnit, mut visit: F)
where
    F: FnMut(&CallSite<'_>) -> Visit,
{
    let mut stack: Vec<Node<'_>> = vec![unit.root()];
    while let Some(node) = stack.pop() {
        if node.kind() == "invocation_expression" {
            if let Some(call) = call_site(&unit.text, node) {
                if visit(&call) == Visit::SkipChildren {
                    continue;
                }
            }
        }

        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
}

/// Build a call site if the invocation's function is `expr.Name`
pub(crate) fn call_site<'a>(source: &'a str, node: Node<'a>) -> Option<CallSite<'a>> {
    let function = node
        .child_by_field_name("function")
        .or_else(|| node.named_child(0))?;
    if function.kind() != "member_access_expression" {
        return None;
    }

    let receiver = function
        .child_by_field_name("expression")
        .or_else(|| function.named_child(0))?;
    let name = function
        .child_by_field_name("name")
        .or_else(|| function.named_child(function.named_child_count().checked_sub(1)?))?;
    // `Get<T>(..)` is a different member
    if name.kind() != "identifier" {
        return None;
    }

    let argument_list = node.child_by_field_name("arguments").or_else(|| {
        let mut cursor = node.walk();
        let found = node
            .named_children(&mut cursor)
            .find(|c| c.kind() == "argument_list");
        found
    })?;

    let mut cursor = argument_list.walk();
    let (argument_names, arguments): (Vec<Option<&str>>, Vec<Argument>) = argument_list
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "argument")
        .map(|arg| classify_argument(source, arg))
        .unzip();

    let start = node.start_position();
    Some(CallSite {
        receiver: node_text(source, receiver),
        method: node_text(source, name),
        arguments,
        argument_names,
        span: node.byte_range(),
        line: start.row + 1,
        column: start.column,
    })
}

fn classify_argument<'a>(source: &'a str, argument: Node<'_>) -> (Option<&'a str>, Argument) {
    let mut cursor = argument.walk();
    let mut name = None;
    let mut value = None;
    for child in argument.children(&mut cursor) {
        match child.kind() {
            "name_colon" => name = Some(parameter_name(source, child)),
            "ref" | "out" | "in" => return (name, Argument::Other),
            _ if child.is_named() && value.is_none() => value = Some(child),
            _ => {}
        }
    }

    let Some(mut value) = value else {
        return (name, Argument::Other);
    };
    if value.kind() == "literal" && value.named_child_count() == 1 {
        if let Some(inner) = value.named_child(0) {
            value = inner;
        }
    }

    if !STRING_LITERAL_KINDS.contains(&value.kind()) {
        return (name, Argument::Other);
    }
    let argument = decode_string_literal(value.kind(), node_text(source, value))
        .map(Argument::StringLiteral)
        .unwrap_or(Argument::Other);
    (name, argument)
}

/// `key` from `key:` (or `@key:`)
fn parameter_name<'a>(source: &'a str, name_colon: Node<'_>) -> &'a str {
    let text = match name_colon.named_child(0) {
        Some(identifier) => node_text(source, identifier),
        None => node_text(source, name_colon).trim_end_matches(':').trim(),
    };
    text.trim_start_matches('@')
}
