//! Partial (per-source) and merged (per-identifier) records

use std::collections::{BTreeMap, HashSet};

/// Primary catalog identifier
pub type AppId = u64;

/// Store page URL derived from the identifier
pub fn store_url(appid: AppId) -> String {
    format!("https://store.steampowered.com/app/{appid}")
}

/// Scalar cell value. Records never hold nested structures.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<u64> for FieldValue {
    fn from(n: u64) -> Self {
        Self::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Fields produced by one source for one identifier
#[derive(Debug, Clone, PartialEq)]
pub struct PartialRecord {
    pub source: &'static str,
    pub appid: AppId,
    fields: BTreeMap<&'static str, FieldValue>,
}

impl PartialRecord {
    pub fn new(source: &'static str, appid: AppId) -> Self {
        Self {
            source,
            appid,
            fields: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, key: &'static str, value: impl Into<FieldValue>) {
        self.fields.insert(key, value.into());
    }

    /// Set only when a value is present; absent stays absent
    pub fn set_opt<V: Into<FieldValue>>(&mut self, key: &'static str, value: Option<V>) {
        if let Some(v) = value {
            self.set(key, v);
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Text value of a field, if it is text
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (*k, v))
    }

    /// Copy every field of `other` into `self` (same identifier)
    pub fn absorb(&mut self, other: PartialRecord) {
        debug_assert_eq!(self.appid, other.appid);
        self.fields.extend(other.fields);
    }
}

/// One output row: union of the partial records plus run metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub appid: AppId,
    pub url: String,
    pub export_date: String,
    pub export_time: String,
    fields: BTreeMap<&'static str, FieldValue>,
}

impl MergedRecord {
    /// Merge partial records. On a name collision the first value wins.
    pub fn merge(
        appid: AppId,
        export_date: &str,
        export_time: &str,
        partials: impl IntoIterator<Item = PartialRecord>,
    ) -> Self {
        let mut fields = BTreeMap::new();
        for partial in partials {
            if partial.appid != appid {
                log::warn!(
                    "{}: dropping {} record for {}",
                    appid,
                    partial.source,
                    partial.appid
                );
                continue;
            }
            for (key, value) in partial.fields {
                if fields.contains_key(key) {
                    log::debug!("{appid}: field '{key}' from {} ignored (already set)", partial.source);
                    continue;
                }
                fields.insert(key, value);
            }
        }
        Self {
            appid,
            url: store_url(appid),
            export_date: export_date.to_string(),
            export_time: export_time.to_string(),
            fields,
        }
    }

    /// Value of a column, run metadata included
    pub fn get(&self, column: &str) -> Option<FieldValue> {
        match column {
            "appid" => Some(FieldValue::from(self.appid)),
            "url" => Some(FieldValue::Text(self.url.clone())),
            "export_date" => Some(FieldValue::Text(self.export_date.clone())),
            "export_time" => Some(FieldValue::Text(self.export_time.clone())),
            _ => self.fields.get(column).cloned(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self.fields.get("name") {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// Records of one run, in processing order, at most one per identifier
#[derive(Debug, Default)]
pub struct ResultSet {
    records: Vec<MergedRecord>,
    seen: HashSet<AppId>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Returns false (and drops it) if the identifier is
    /// already present.
    pub fn push(&mut self, record: MergedRecord) -> bool {
        if !self.seen.insert(record.appid) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn contains(&self, appid: AppId) -> bool {
        self.seen.contains(&appid)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[MergedRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<MergedRecord> {
        self.records
    }
}
