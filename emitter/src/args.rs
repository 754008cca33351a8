use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A single type-erased value carried by an emission.
pub type Arg = Arc<dyn Any + Send + Sync>;

/// The ordered values passed to every listener of one emission.
///
/// Payloads are an open bag: each position may hold a different type and
/// listeners read them back with [`Args::get`]. Cloning is cheap, all
/// listeners of an emission share the same backing slice.
#[derive(Clone)]
pub struct Args {
    values: Arc<[Arg]>,
}

impl Args {
    pub fn new(values: Vec<Arg>) -> Self {
        Self {
            values: Arc::from(values),
        }
    }

    /// Arguments for an emission that carries no values.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Typed access to the value at `index`.
    ///
    /// Returns `None` if the index is out of range or the value is not a `T`.
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.values.get(index)?.downcast_ref::<T>()
    }

    /// Untyped access to the value at `index`.
    pub fn get_raw(&self, index: usize) -> Option<&Arg> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arg> {
        self.values.iter()
    }
}

impl Default for Args {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<Arg>> for Args {
    fn from(values: Vec<Arg>) -> Self {
        Self::new(values)
    }
}

impl FromIterator<Arg> for Args {
    fn from_iter<I: IntoIterator<Item = Arg>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args").field("len", &self.len()).finish()
    }
}

/// Build [`Args`] from a list of values.
///
/// # Example
///
/// ```
/// let args = emitter::args![5_i32, "five"];
/// assert_eq!(args.get::<i32>(0), Some(&5));
/// assert_eq!(args.get::<&str>(1), Some(&"five"));
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::empty()
    };
    ( $( $value:expr ),+ $(,)? ) => {
        $crate::Args::new(vec![ $( ::std::sync::Arc::new($value) as $crate::Arg ),+ ])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_access() {
        let args = crate::args![7_u64, String::from("seven")];
        assert_eq!(args.len(), 2);
        assert_eq!(args.get::<u64>(0), Some(&7));
        assert_eq!(args.get::<String>(1).map(String::as_str), Some("seven"));
    }

    #[test]
    fn test_raw_access_and_iteration() {
        let args = crate::args![1_i32, 2_i32, 3_i32];
        assert_eq!(args.get_raw(2).and_then(|v| v.downcast_ref::<i32>()), Some(&3));
        assert!(args.get_raw(3).is_none());
        let values: Vec<i32> = args
            .iter()
            .filter_map(|v| v.downcast_ref::<i32>().copied())
            .collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_wrong_type_or_index_is_none() {
        let args = crate::args![1_i32];
        assert!(args.get::<u32>(0).is_none());
        assert!(args.get::<i32>(1).is_none());
    }

    #[test]
    fn test_empty() {
        let args = crate::args![];
        assert!(args.is_empty());
        assert!(Args::default().is_empty());
    }
}
