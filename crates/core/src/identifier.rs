//! Identifier synthesis for generated constants
//!
//! [`make_property_name`] is a pure transform from a raw lookup key to an
//! upper-snake-case identifier. Being pure, it cannot notice that two keys
//! normalize to the same name; [`IdentifierRegistry`] sits on top of it and
//! resolves those collisions before any code is generated.

use crate::config::CollisionPolicy;
use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

/// Turn a raw key into an upper-snake-case identifier
///
/// - `roomInspectionTitle` → `ROOM_INSPECTION_TITLE`
/// - `2ndFloor` → `_2ND_FLOOR`
/// - `Save & Close` → `SAVE___CLOSE`
///
/// Replacement counts UTF-16 code units, as .NET string regexes do: a
/// character outside the Basic Multilingual Plane (`a😀`) yields `A__`.
pub fn make_property_name(key: &str) -> String {
    let mut name = String::with_capacity(key.len() + 8);
    let mut prev: Option<char> = None;

    for c in key.chars() {
        // camelCase boundary: lowercase or digit followed by uppercase
        if c.is_ascii_uppercase()
            && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit())
        {
            name.push('_');
        }

        if c.is_ascii_alphanumeric() || c == '_' {
            name.push(c.to_ascii_uppercase());
        } else {
            // one `_` per UTF-16 unit, so astral characters become two
            for _ in 0..c.len_utf16() {
                name.push('_');
            }
        }
        prev = Some(c);
    }

    match name.chars().next() {
        None => "_".to_string(),
        Some(first) if first.is_ascii_digit() => format!("_{name}"),
        Some(_) => name,
    }
}

/// Strategy for deriving a base identifier from a lookup call
pub trait NamingStrategy: Send + Sync {
    /// Base identifier for the pair; uniqueness is handled by the registry
    fn base_name(&self, category: &str, raw_key: &str) -> String;
}

/// The default naming: [`make_property_name`] of the key, category ignored
#[derive(Debug, Clone, Copy, Default)]
pub struct UpperSnakeCase;

impl NamingStrategy for UpperSnakeCase {
    fn base_name(&self, _category: &str, raw_key: &str) -> String {
        make_property_name(raw_key)
    }
}

/// A base identifier that was already owned by another key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    /// The contested base identifier
    pub identifier: String,
    /// Key that owns `identifier` (`member NAME` for a hand-written member)
    pub existing_key: String,
    /// Key that lost and was renamed
    pub key: String,
    /// Identifier given to `key`
    pub assigned: String,
}

/// Who holds an identifier
#[derive(Debug, Clone, PartialEq, Eq)]
enum Owner {
    /// A generated constant for this `(category, raw_key)` pair
    Key { category: String, raw_key: String },
    /// A hand-written member of the container class
    Member,
}

impl Owner {
    fn key(category: &str, raw_key: &str) -> Self {
        Owner::Key {
            category: category.to_string(),
            raw_key: raw_key.to_string(),
        }
    }

    fn is_key(&self, category: &str, raw_key: &str) -> bool {
        matches!(self, Owner::Key { category: c, raw_key: k } if c == category && k == raw_key)
    }

    /// How the owner is named in collision messages
    fn describe(&self, identifier: &str) -> String {
        match self {
            Owner::Key { raw_key, .. } => raw_key.clone(),
            Owner::Member => format!("member {identifier}"),
        }
    }
}

/// Hands out unique identifiers, detecting collisions between distinct keys
///
/// Owners are `(category, raw_key)` pairs, so the same key under two
/// categories also counts as two distinct owners. Names of hand-written
/// container members are owned by no key and are never handed out.
#[derive(Debug)]
pub struct IdentifierRegistry {
    policy: CollisionPolicy,
    owners: HashMap<String, Owner>,
    collisions: Vec<Collision>,
}

impl IdentifierRegistry {
    pub fn new(policy: CollisionPolicy) -> Self {
        Self {
            policy,
            owners: HashMap::new(),
            collisions: Vec::new(),
        }
    }

    /// Claim an identifier verbatim (used for entries read back from a previous run)
    ///
    /// Returns false if the identifier already belongs to a different owner.
    pub fn reserve(&mut self, identifier: &str, category: &str, raw_key: &str) -> bool {
        match self.owners.get(identifier) {
            Some(owner) if owner.is_key(category, raw_key) => true,
            Some(owner) => {
                let kept = owner.describe(identifier);
                warn!(
                    "Identifier {identifier} is declared for both '{kept}' and '{raw_key}'; keeping '{kept}'"
                );
                false
            }
            None => {
                self.owners
                    .insert(identifier.to_string(), Owner::key(category, raw_key));
                true
            }
        }
    }

    /// Block a name declared by hand in the container class
    pub fn reserve_member(&mut self, identifier: &str) {
        self.owners
            .entry(identifier.to_string())
            .or_insert(Owner::Member);
    }

    /// Assign a unique identifier for the key starting from `base`
    pub fn assign(&mut self, base: &str, category: &str, raw_key: &str) -> Result<String> {
        let existing_key = match self.owners.get(base) {
            None => {
                self.owners
                    .insert(base.to_string(), Owner::key(category, raw_key));
                return Ok(base.to_string());
            }
            Some(owner) if owner.is_key(category, raw_key) => return Ok(base.to_string()),
            Some(owner) => owner.describe(base),
        };

        if self.policy == CollisionPolicy::Error {
            return Err(Error::collision(base, existing_key, raw_key));
        }

        let mut suffix = 2usize;
        let assigned = loop {
            let candidate = format!("{base}_{suffix}");
            if !self.owners.contains_key(&candidate) {
                break candidate;
            }
            suffix += 1;
        };

        warn!(
            "Identifier collision: '{raw_key}' and '{existing_key}' both map to {base}; using {assigned}"
        );
        self.owners
            .insert(assigned.clone(), Owner::key(category, raw_key));
        self.collisions.push(Collision {
            identifier: base.to_string(),
            existing_key,
            key: raw_key.to_string(),
            assigned: assigned.clone(),
        });
        Ok(assigned)
    }

    /// Collisions resolved by suffixing, in assignment order
    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    pub fn into_collisions(self) -> Vec<Collision> {
        self.collisions
    }
}
