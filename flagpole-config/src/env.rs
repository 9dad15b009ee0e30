// Environment variable loading

use serde_json::{Map, Value};
use std::env;

/// Separator between nesting levels in variable names
/// (`FLAGPOLE_ADMIN__BASE_PATH` becomes `admin.base_path`).
pub const NESTING_SEPARATOR: &str = "__";

/// Loads prefixed environment variables into a nested settings tree.
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Collect every matching variable from the process environment.
    pub fn load(&self) -> Map<String, Value> {
        self.load_from(env::vars())
    }

    /// Collect matching variables from an explicit list.
    pub fn load_from<I>(&self, vars: I) -> Map<String, Value>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut tree = Map::new();

        for (key, value) in vars {
            let Some(path) = self.key_path(&key) else {
                continue;
            };
            insert_path(&mut tree, &path, Value::String(value));
        }

        tree
    }

    /// Translate a variable name into a settings path, or `None` when the
    /// variable does not carry the prefix.
    pub fn key_path(&self, key: &str) -> Option<Vec<String>> {
        let rest = match self.prefix {
            Some(ref prefix) => key.strip_prefix(prefix.as_str())?.strip_prefix('_')?,
            None => key,
        };

        if rest.is_empty() {
            return None;
        }

        Some(
            rest.split(NESTING_SEPARATOR)
                .map(|segment| segment.to_lowercase())
                .collect(),
        )
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

fn insert_path(tree: &mut Map<String, Value>, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut node = tree;
    for segment in parents {
        let entry = node
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        node = next;
    }

    node.insert(last.clone(), value);
}
