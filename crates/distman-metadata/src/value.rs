use indexmap::IndexMap;

/// A Lua-style table: simultaneously an ordered positional list and a
/// string-keyed map, because the text format's constraint lists mix bare
/// entries with arch-keyed overrides in the same table (see
/// `constraint::ConstraintNode`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub list: Vec<Value>,
    pub map: IndexMap<String, Value>,
}

impl Table {
    pub fn new() -> Table {
        Table::default()
    }

    pub fn from_list(list: Vec<Value>) -> Table {
        Table { list, map: IndexMap::new() }
    }

    pub fn from_map(map: IndexMap<String, Value>) -> Table {
        Table { list: Vec::new(), map }
    }
}

/// A parsed scalar or table value from the dist.info / dist.manifest grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Num(f64),
    Table(Table),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn string_list(items: impl IntoIterator<Item = impl Into<String>>) -> Value {
        Value::Table(Table::from_list(
            items.into_iter().map(|s| Value::Str(s.into())).collect(),
        ))
    }
}
