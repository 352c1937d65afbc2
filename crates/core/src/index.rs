//! Secondary index definitions.

use crate::schema::KeyAttribute;

/// Which flavour of secondary index a definition describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Global,
    Local,
}

/// Which attributes are projected into an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexProjection {
    All,
    KeysOnly,
    /// Project the named attributes, minus any listed in `excludes`.
    Include {
        includes: Vec<&'static str>,
        excludes: Vec<&'static str>,
    },
}

/// Definition of a secondary index on a table.
///
/// Built with [`IndexDef::global`] or [`IndexDef::local`] and returned from
/// [`TableSchema::indexes`](crate::TableSchema::indexes).
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDef {
    pub name: &'static str,
    pub kind: IndexKind,
    pub hash_key: KeyAttribute,
    pub range_key: Option<KeyAttribute>,
    pub projection: IndexProjection,
    /// Read capacity override; falls back to the table's capacity.
    pub read_capacity: Option<i64>,
    /// Write capacity override; falls back to the table's capacity.
    pub write_capacity: Option<i64>,
}

impl IndexDef {
    pub fn global(name: &'static str, hash_key: KeyAttribute) -> Self {
        Self::new(name, IndexKind::Global, hash_key)
    }

    pub fn local(name: &'static str, hash_key: KeyAttribute) -> Self {
        Self::new(name, IndexKind::Local, hash_key)
    }

    fn new(name: &'static str, kind: IndexKind, hash_key: KeyAttribute) -> Self {
        Self {
            name,
            kind,
            hash_key,
            range_key: None,
            projection: IndexProjection::All,
            read_capacity: None,
            write_capacity: None,
        }
    }

    pub fn with_range_key(mut self, range_key: KeyAttribute) -> Self {
        self.range_key = Some(range_key);
        self
    }

    pub fn with_projection(mut self, projection: IndexProjection) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_throughput(mut self, read_capacity: i64, write_capacity: i64) -> Self {
        self.read_capacity = Some(read_capacity);
        self.write_capacity = Some(write_capacity);
        self
    }

    /// Key attributes of this index (hash, then range when present).
    pub fn key_attributes(&self) -> Vec<KeyAttribute> {
        let mut keys = vec![self.hash_key.clone()];
        if let Some(range) = &self.range_key {
            keys.push(range.clone());
        }
        keys
    }

    /// Attributes projected by an `Include` projection, with index keys and
    /// excluded names removed. Empty for other projection types.
    pub fn projected_attributes(&self) -> Vec<&'static str> {
        match &self.projection {
            IndexProjection::Include { includes, excludes } => includes
                .iter()
                .copied()
                .filter(|name| {
                    !excludes.contains(name)
                        && *name != self.hash_key.name
                        && self.range_key.as_ref().map(|k| k.name) != Some(*name)
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}
