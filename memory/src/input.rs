//! A single value, or a list paired element-wise with the contents being stored.

use memory_core::MemoryError;

#[derive(Debug, Clone, PartialEq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: Clone> OneOrMany<T> {
    /// Expands to exactly `len` values: a single value is repeated, a list must match `len`.
    pub fn expand(self, len: usize, field: &str) -> Result<Vec<T>, MemoryError> {
        match self {
            OneOrMany::One(v) => Ok(vec![v; len]),
            OneOrMany::Many(list) if list.len() == len => Ok(list),
            OneOrMany::Many(list) => Err(MemoryError::Validation(format!(
                "{} has {} items but content has {}",
                field,
                list.len(),
                len
            ))),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(list) => list,
        }
    }
}

impl From<&str> for OneOrMany<String> {
    fn from(s: &str) -> Self {
        OneOrMany::One(s.to_string())
    }
}

impl From<String> for OneOrMany<String> {
    fn from(s: String) -> Self {
        OneOrMany::One(s)
    }
}

impl From<Vec<String>> for OneOrMany<String> {
    fn from(list: Vec<String>) -> Self {
        OneOrMany::Many(list)
    }
}

impl From<Vec<&str>> for OneOrMany<String> {
    fn from(list: Vec<&str>) -> Self {
        OneOrMany::Many(list.into_iter().map(str::to_string).collect())
    }
}

impl From<f64> for OneOrMany<f64> {
    fn from(v: f64) -> Self {
        OneOrMany::One(v)
    }
}

impl From<Vec<f64>> for OneOrMany<f64> {
    fn from(list: Vec<f64>) -> Self {
        OneOrMany::Many(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_value_broadcasts() {
        let v: OneOrMany<f64> = 0.5.into();
        assert_eq!(v.expand(3, "importance").unwrap(), vec![0.5, 0.5, 0.5]);
    }

    #[test]
    fn list_length_must_match() {
        let v: OneOrMany<String> = vec!["fact", "event"].into();
        assert!(matches!(v.clone().expand(3, "type"), Err(MemoryError::Validation(_))));
        assert_eq!(v.expand(2, "type").unwrap().len(), 2);
    }
}
