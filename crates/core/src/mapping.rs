//! Key → constant mapping shared by the generator and the rewriter
//!
//! The mapping is built once per run from every extracted [`MatchRecord`]
//! (plus any entries read back from an earlier generated file) and is
//! immutable afterwards. Entries are keyed by `(category, raw_key)`; within a
//! single run every record shares one category, so this is dedup by key.
//! Identifiers are assigned in [`ConstantMappingBuilder::build`] after all
//! keys are known, so naming never depends on rewrite order.

use crate::config::CollisionPolicy;
use crate::entities::{ConstantEntry, MatchRecord};
use crate::error::Result;
use crate::identifier::{Collision, IdentifierRegistry, NamingStrategy, UpperSnakeCase};
use std::collections::{HashMap, HashSet};

type PairKey = (String, String);

fn pair(category: &str, raw_key: &str) -> PairKey {
    (category.to_string(), raw_key.to_string())
}

/// An entry read back from an existing constants container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedEntry {
    pub identifier: String,
    pub category: String,
    pub raw_key: String,
}

/// Immutable, insertion-ordered mapping from raw key to generated constant
#[derive(Debug, Clone, Default)]
pub struct ConstantMapping {
    entries: Vec<ConstantEntry>,
    by_key: HashMap<PairKey, usize>,
    by_identifier: HashMap<String, usize>,
    seeded_keys: HashSet<PairKey>,
    collisions: Vec<Collision>,
}

impl ConstantMapping {
    /// Look up the constant for a category / raw key pair
    pub fn lookup(&self, category: &str, raw_key: &str) -> Option<&ConstantEntry> {
        self.by_key
            .get(&pair(category, raw_key))
            .map(|&i| &self.entries[i])
    }

    /// Reverse lookup by generated identifier
    pub fn by_identifier(&self, identifier: &str) -> Option<&ConstantEntry> {
        self.by_identifier.get(identifier).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[ConstantEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the pair came from a previously generated container
    pub fn is_seeded(&self, category: &str, raw_key: &str) -> bool {
        self.seeded_keys.contains(&pair(category, raw_key))
    }

    /// Entries that did not exist in the previously generated container
    pub fn added(&self) -> impl Iterator<Item = &ConstantEntry> {
        self.entries
            .iter()
            .filter(|e| !self.seeded_keys.contains(&pair(&e.category, &e.raw_key)))
    }

    /// Collisions resolved while assigning identifiers
    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }
}

/// Collects records and seeds, then assigns identifiers in one step
pub struct ConstantMappingBuilder {
    naming: Box<dyn NamingStrategy>,
    policy: CollisionPolicy,
    seeds: Vec<SeedEntry>,
    members: Vec<String>,
    entries: Vec<ConstantEntry>,
    index: HashMap<PairKey, usize>,
}

impl ConstantMappingBuilder {
    pub fn new(policy: CollisionPolicy) -> Self {
        Self::with_naming(Box::new(UpperSnakeCase), policy)
    }

    pub fn with_naming(naming: Box<dyn NamingStrategy>, policy: CollisionPolicy) -> Self {
        Self {
            naming,
            policy,
            seeds: Vec::new(),
            members: Vec::new(),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add an entry from a previous run; its identifier is kept verbatim
    pub fn seed(&mut self, seed: SeedEntry) -> &mut Self {
        let key = pair(&seed.category, &seed.raw_key);
        if !self.index.contains_key(&key) {
            self.index.insert(key, self.entries.len());
            self.entries.push(ConstantEntry {
                identifier: seed.identifier.clone(),
                category: seed.category.clone(),
                raw_key: seed.raw_key.clone(),
                locations: Vec::new(),
            });
            self.seeds.push(seed);
        }
        self
    }

    /// Keep a hand-written container member's name out of reach of new keys
    pub fn reserve_member(&mut self, name: impl Into<String>) -> &mut Self {
        self.members.push(name.into());
        self
    }

    /// Record one observed call; the first occurrence of a key wins
    pub fn observe(&mut self, record: MatchRecord) -> &mut Self {
        let key = pair(&record.category, &record.raw_key);
        match self.index.get(&key) {
            Some(&i) => self.entries[i].locations.push(record.location),
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(ConstantEntry {
                    identifier: String::new(),
                    category: record.category,
                    raw_key: record.raw_key,
                    locations: vec![record.location],
                });
            }
        }
        self
    }

    pub fn observe_all(&mut self, records: impl IntoIterator<Item = MatchRecord>) -> &mut Self {
        for record in records {
            self.observe(record);
        }
        self
    }

    /// Number of distinct keys collected so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Assign identifiers and freeze the mapping
    pub fn build(self) -> Result<ConstantMapping> {
        let mut registry = IdentifierRegistry::new(self.policy);
        let mut seeded_keys = HashSet::new();
        let mut entries = self.entries;

        // Seeds claim their identifiers before any new key is named
        for seed in &self.seeds {
            seeded_keys.insert(pair(&seed.category, &seed.raw_key));
            registry.reserve(&seed.identifier, &seed.category, &seed.raw_key);
        }
        for member in &self.members {
            registry.reserve_member(member);
        }

        for entry in entries.iter_mut() {
            if seeded_keys.contains(&pair(&entry.category, &entry.raw_key)) {
                continue;
            }
            let base = self.naming.base_name(&entry.category, &entry.raw_key);
            entry.identifier = registry.assign(&base, &entry.category, &entry.raw_key)?;
        }

        let by_key = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (pair(&e.category, &e.raw_key), i))
            .collect();

        let mut by_identifier = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            by_identifier.entry(entry.identifier.clone()).or_insert(i);
        }

        Ok(ConstantMapping {
            entries,
            by_key,
            by_identifier,
            seeded_keys,
            collisions: registry.into_collisions(),
        })
    }
}
