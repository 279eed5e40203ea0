use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::formats::yolo::FIELD_COUNT;

/// Assigns dense class ids to class names in first-seen order.
///
/// Names are compared lower-cased. When the allow-list is non-empty, names
/// outside of it are skipped instead of being assigned an id.
#[derive(Debug, Default, Clone)]
pub struct ClassRegistry {
    allow_list: HashSet<String>,
    label_map: HashMap<String, usize>,
    names: Vec<String>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allow_list<I, S>(allow_list: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allow_list = allow_list
            .into_iter()
            .map(|name| name.as_ref().trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        Self {
            allow_list,
            ..Self::default()
        }
    }

    /// Return the id of `name`, assigning the next id if it is new.
    /// Returns `None` when the name is excluded by the allow-list.
    pub fn resolve(&mut self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        if !self.is_allowed(&name) {
            return None;
        }
        if let Some(&id) = self.label_map.get(&name) {
            return Some(id);
        }
        let id = self.names.len();
        self.label_map.insert(name.clone(), id);
        self.names.push(name);
        Some(id)
    }

    fn is_allowed(&self, lowercase_name: &str) -> bool {
        self.allow_list.is_empty() || self.allow_list.contains(lowercase_name)
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.label_map.get(&name.to_lowercase()).copied()
    }

    pub fn name_of(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Registered `(name, id)` pairs sorted by id.
    pub fn mapping(&self) -> impl Iterator<Item = (&str, usize)> {
        self.names
            .iter()
            .enumerate()
            .map(|(id, name)| (name.as_str(), id))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Display for ClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (name, id) in self.mapping() {
            if id > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{}': {}", name, id)?;
        }
        write!(f, "}}")
    }
}

/// Keeps YOLO label lines whose numeric class id is in a keep-set and merges
/// them all into class `0`.
#[derive(Debug, Clone)]
pub struct ClassFilter {
    keep: HashSet<usize>,
}

/// Outcome of filtering a single label line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilteredLine {
    Kept(String),
    Dropped,
    Malformed,
}

impl ClassFilter {
    pub fn new<I: IntoIterator<Item = usize>>(keep: I) -> Self {
        Self {
            keep: keep.into_iter().collect(),
        }
    }

    pub fn keeps(&self, class_id: usize) -> bool {
        self.keep.contains(&class_id)
    }

    /// Filter one label line, keeping the fields after the class id verbatim.
    ///
    /// Lines that are not exactly `FIELD_COUNT` fields with a numeric class
    /// id are malformed.
    pub fn filter_line(&self, line: &str) -> FilteredLine {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != FIELD_COUNT {
            return FilteredLine::Malformed;
        }
        let class_id = match parts[0].parse::<usize>() {
            Ok(class_id) => class_id,
            Err(_) => return FilteredLine::Malformed,
        };
        if !self.keeps(class_id) {
            return FilteredLine::Dropped;
        }
        FilteredLine::Kept(format!("0 {}", parts[1..].join(" ")))
    }
}
