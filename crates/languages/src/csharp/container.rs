//! The generated constants container
//!
//! Renders a static class with one expression-bodied property per mapped key,
//! reads an existing container back into seed entries, and appends single
//! constants to it.

use super::literals::encode_string_literal;
use super::matcher::call_site;
use super::{node_text, CSharpParser};
use keyhoist_core::config::{CollisionPolicy, ExtractConfig};
use keyhoist_core::entities::ConstantEntry;
use keyhoist_core::error::{Error, Result};
use keyhoist_core::identifier::{IdentifierRegistry, NamingStrategy, UpperSnakeCase};
use keyhoist_core::mapping::SeedEntry;
use std::path::Path;
use tracing::{debug, info};
use tree_sitter::Node;

/// Shape of the generated class and of the lookup call inside each property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub receiver: String,
    pub method: String,
    pub namespace: Option<String>,
    pub usings: Vec<String>,
}

impl ContainerSpec {
    pub fn from_config(config: &ExtractConfig) -> Self {
        Self {
            name: config.container.clone(),
            receiver: config.receiver.clone(),
            method: config.method.clone(),
            namespace: config.namespace.clone(),
            usings: config.usings.clone(),
        }
    }

    /// `\tpublic static string IDENT => Receiver.Method("category", "key");`
    pub fn render_property(&self, identifier: &str, category: &str, raw_key: &str) -> String {
        format!(
            "\tpublic static string {identifier} => {}.{}({}, {});",
            self.receiver,
            self.method,
            encode_string_literal(category),
            encode_string_literal(raw_key)
        )
    }

    /// Render the whole file for the given entries, in order
    pub fn render<'a>(&self, entries: impl IntoIterator<Item = &'a ConstantEntry>) -> String {
        let mut out = String::new();

        for using in &self.usings {
            let using = using.trim().trim_start_matches("using ").trim_end_matches(';');
            out.push_str(&format!("using {using};\n"));
        }
        if !self.usings.is_empty() {
            out.push('\n');
        }
        if let Some(namespace) = &self.namespace {
            out.push_str(&format!("namespace {namespace};\n\n"));
        }

        out.push_str(&format!("public static class {}\n{{\n", self.name));
        for entry in entries {
            out.push_str(&self.render_property(&entry.identifier, &entry.category, &entry.raw_key));
            out.push('\n');
        }
        out.push_str("}\n");
        out
    }
}

/// Result of [`append_entry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Property inserted into the existing container
    Added { identifier: String },
    /// The pair was already declared; nothing written
    AlreadyPresent { identifier: String },
    /// The container did not exist and was created with this one property
    Created { identifier: String },
}

/// What an existing container declares
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerContents {
    /// Generated `(identifier, category, key)` properties, in file order
    pub entries: Vec<SeedEntry>,
    /// Names of every other member (hand-written properties, fields, methods)
    pub members: Vec<String>,
}

/// Read the members of an existing container
pub fn read_container(path: &Path, spec: &ContainerSpec) -> Result<ContainerContents> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io_at(path, e))?;
    parse_container(path, &text, spec)
}

/// Parse container source text into generated entries and other member names
pub fn parse_container(path: &Path, text: &str, spec: &ContainerSpec) -> Result<ContainerContents> {
    let mut parser = CSharpParser::new()?;
    let unit = parser.parse(path, text.to_string())?;
    let body = find_class_body(unit.root(), text, &spec.name).ok_or_else(|| {
        Error::parse_path(path, format!("No class named {} found", spec.name))
    })?;

    let mut contents = ContainerContents::default();
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        let seed = (member.kind() == "property_declaration")
            .then(|| seed_from_property(text, member, spec))
            .flatten();
        match seed {
            Some(seed) => contents.entries.push(seed),
            None => contents.members.extend(member_names(text, member)),
        }
    }

    debug!(
        "Read {} entries and {} other members from {}",
        contents.entries.len(),
        contents.members.len(),
        path.display()
    );
    Ok(contents)
}

/// Names a class member introduces into the class scope
fn member_names(text: &str, member: Node<'_>) -> Vec<String> {
    match member.kind() {
        "field_declaration" | "event_field_declaration" => {
            let mut names = Vec::new();
            let mut cursor = member.walk();
            for declaration in member
                .named_children(&mut cursor)
                .filter(|c| c.kind() == "variable_declaration")
            {
                let mut inner = declaration.walk();
                for declarator in declaration
                    .named_children(&mut inner)
                    .filter(|c| c.kind() == "variable_declarator")
                {
                    let name = declarator
                        .child_by_field_name("name")
                        .or_else(|| declarator.named_child(0))
                        .filter(|n| n.kind() == "identifier");
                    if let Some(name) = name {
                        names.push(node_text(text, name).to_string());
                    }
                }
            }
            names
        }
        // the class' own name, never a member name
        "constructor_declaration" | "destructor_declaration" => Vec::new(),
        _ => member
            .child_by_field_name("name")
            .filter(|n| n.kind() == "identifier")
            .map(|n| vec![node_text(text, n).to_string()])
            .unwrap_or_default(),
    }
}

fn find_class_body<'t>(root: Node<'t>, text: &str, name: &str) -> Option<Node<'t>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.kind() == "class_declaration" {
            let matches_name = node
                .child_by_field_name("name")
                .is_some_and(|n| node_text(text, n) == name);
            if matches_name {
                return node.child_by_field_name("body").or_else(|| {
                    let mut cursor = node.walk();
                    let body = node
                        .named_children(&mut cursor)
                        .find(|c| c.kind() == "declaration_list");
                    body
                });
            }
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}

fn seed_from_property(text: &str, property: Node<'_>, spec: &ContainerSpec) -> Option<SeedEntry> {
    let name = property.child_by_field_name("name")?;
    let mut cursor = property.walk();
    let arrow = property
        .named_children(&mut cursor)
        .find(|c| c.kind() == "arrow_expression_clause")?;
    let invocation = arrow.named_child(0)?;
    if invocation.kind() != "invocation_expression" {
        return None;
    }

    let call = call_site(text, invocation)?;
    if call.receiver != spec.receiver || call.method != spec.method {
        return None;
    }
    Some(SeedEntry {
        identifier: node_text(text, name).to_string(),
        category: call.arguments.first()?.as_literal()?.to_string(),
        raw_key: call.arguments.get(1)?.as_literal()?.to_string(),
    })
}

/// Insert properties before the closing brace of the container class
pub fn insert_entries<'a>(
    text: &str,
    spec: &ContainerSpec,
    entries: impl IntoIterator<Item = &'a ConstantEntry>,
) -> Result<String> {
    let mut parser = CSharpParser::new()?;
    let unit = parser.parse(Path::new(&spec.name), text.to_string())?;
    let body = find_class_body(unit.root(), text, &spec.name)
        .ok_or_else(|| Error::parse(&spec.name, format!("No class named {} found", spec.name)))?;

    let close = body
        .child(body.child_count().saturating_sub(1))
        .filter(|n| n.kind() == "}" && !n.is_missing())
        .ok_or_else(|| Error::parse(&spec.name, "Container class has no closing brace"))?;
    let close_at = close.start_byte();

    let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
    let mut block = String::new();
    for entry in entries {
        block.push_str(&spec.render_property(&entry.identifier, &entry.category, &entry.raw_key));
        block.push_str(newline);
    }
    if block.is_empty() {
        return Ok(text.to_string());
    }

    // Insert at the start of the brace's line when only indentation precedes it
    let line_start = text[..close_at].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let (insert_at, prefix) = if text[line_start..close_at].trim().is_empty() {
        (line_start, "")
    } else {
        (close_at, newline)
    };

    let mut out = String::with_capacity(text.len() + block.len() + prefix.len());
    out.push_str(&text[..insert_at]);
    out.push_str(prefix);
    out.push_str(&block);
    out.push_str(&text[insert_at..]);
    Ok(out)
}

/// Add one `(category, key)` constant to the container at `path`
pub fn append_entry(
    path: &Path,
    spec: &ContainerSpec,
    category: &str,
    raw_key: &str,
    policy: CollisionPolicy,
) -> Result<AppendOutcome> {
    let naming = UpperSnakeCase;
    let base = naming.base_name(category, raw_key);

    if !path.exists() {
        let entry = ConstantEntry {
            identifier: base.clone(),
            category: category.to_string(),
            raw_key: raw_key.to_string(),
            locations: Vec::new(),
        };
        write_container(path, &spec.render([&entry]))?;
        info!("Created {} with {}", path.display(), base);
        return Ok(AppendOutcome::Created { identifier: base });
    }

    let text = std::fs::read_to_string(path).map_err(|e| Error::io_at(path, e))?;
    let contents = parse_container(path, &text, spec)?;
    if let Some(seed) = contents
        .entries
        .iter()
        .find(|s| s.category == category && s.raw_key == raw_key)
    {
        return Ok(AppendOutcome::AlreadyPresent {
            identifier: seed.identifier.clone(),
        });
    }

    let mut registry = IdentifierRegistry::new(policy);
    for seed in &contents.entries {
        registry.reserve(&seed.identifier, &seed.category, &seed.raw_key);
    }
    for member in &contents.members {
        registry.reserve_member(member);
    }
    let entry = ConstantEntry {
        identifier: registry.assign(&base, category, raw_key)?,
        category: category.to_string(),
        raw_key: raw_key.to_string(),
        locations: Vec::new(),
    };

    let updated = insert_entries(&text, spec, [&entry])?;
    write_container(path, &updated)?;
    info!("Added {} to {}", entry.identifier, path.display());
    Ok(AppendOutcome::Added {
        identifier: entry.identifier,
    })
}

/// Write a container file, creating parent directories
pub fn write_container(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_at(parent, e))?;
    }
    std::fs::write(path, text).map_err(|e| Error::io_at(path, e))
}
