use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Lookup::Found(v),
            None => Lookup::NotFound,
        }
    }
}

/// Entries grouped by path, in first-seen order.
pub struct PathIndex<'a, T> {
    by_path: IndexMap<&'a str, Vec<&'a T>>,
}

impl<'a, T> PathIndex<'a, T> {
    pub fn new(items: impl IntoIterator<Item = &'a T>, path_of: impl Fn(&'a T) -> &'a str) -> Self {
        let mut by_path: IndexMap<&'a str, Vec<&'a T>> = IndexMap::new();
        for item in items {
            by_path.entry(path_of(item)).or_default().push(item);
        }
        Self { by_path }
    }

    /// First entry at the path.
    pub fn first(&self, path: &str) -> Lookup<&'a T> {
        Lookup::from_option(self.by_path.get(path).and_then(|v| v.first().copied()))
    }

    pub fn all(&self, path: &str) -> &[&'a T] {
        self.by_path.get(path).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }
}
