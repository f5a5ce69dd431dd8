//! Positional query parameters and their binding type tags.
//!
//! Parameters are supplied as a list of [`ParamArg`]s. Each argument is
//! either a single scalar or a nested sequence of scalars; nested sequences
//! are flattened one level, in order, before binding. Every flattened
//! parameter is then assigned a single-character [`TypeTag`].

use std::fmt;

/// A single scalar bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// SQL NULL.
    Null,
    /// A boolean. There is no native boolean tag, so this binds under
    /// [`TypeTag::Blob`].
    Bool(bool),
    /// A signed 64-bit integer.
    Integer(i64),
    /// A double-precision float.
    Float(f64),
    /// A UTF-8 string.
    Text(String),
    /// Raw bytes.
    Blob(Vec<u8>),
}

/// One argument to [`query`](crate::StatementWrapper::query): a scalar or a
/// nested sequence of scalars.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamArg {
    /// A single positional parameter.
    One(Param),
    /// A nested sequence, bound positionally as if each element had been
    /// passed on its own.
    Many(Vec<Param>),
}

impl ParamArg {
    /// Builds a nested sequence argument from anything convertible to
    /// [`Param`].
    pub fn many<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Param>,
    {
        Self::Many(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Param>> From<T> for ParamArg {
    fn from(value: T) -> Self {
        Self::One(value.into())
    }
}

/// The binding type tag assigned to a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// `s`
    Str,
    /// `d`
    Double,
    /// `i`
    Int,
    /// `b`
    Blob,
}

impl TypeTag {
    /// Returns the single-character tag.
    pub fn as_char(self) -> char {
        match self {
            Self::Str => 's',
            Self::Double => 'd',
            Self::Int => 'i',
            Self::Blob => 'b',
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A flattened parameter paired with its inferred tag, as handed to the
/// driver.
#[derive(Debug, Clone, Copy)]
pub struct Binding<'a> {
    /// The inferred type tag.
    pub tag: TypeTag,
    /// The value to bind.
    pub value: &'a Param,
}

/// Infers the binding tag for a parameter.
///
/// Strings map to `s`, floats to `d`, integers to `i`. Everything else,
/// booleans and NULL included, falls through to `b`.
pub fn infer_type(param: &Param) -> TypeTag {
    match param {
        Param::Text(_) => TypeTag::Str,
        Param::Float(_) => TypeTag::Double,
        Param::Integer(_) => TypeTag::Int,
        Param::Bool(_) | Param::Blob(_) | Param::Null => TypeTag::Blob,
    }
}

/// Flattens one level of nested sequences, preserving positional order.
pub fn flatten_params(args: &[ParamArg]) -> Vec<Param> {
    let mut flat = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            ParamArg::One(param) => flat.push(param.clone()),
            ParamArg::Many(params) => flat.extend(params.iter().cloned()),
        }
    }
    flat
}

/// Returns the concatenated tag string for a flattened parameter list,
/// e.g. `"sdib"`.
pub fn type_string(params: &[Param]) -> String {
    params.iter().map(|p| infer_type(p).as_char()).collect()
}

/// Pairs each flattened parameter with its inferred tag.
pub fn bindings(params: &[Param]) -> Vec<Binding<'_>> {
    params
        .iter()
        .map(|value| Binding {
            tag: infer_type(value),
            value,
        })
        .collect()
}

/// Builds a `Vec<ParamArg>` from a list of expressions.
///
/// ```rust,ignore
/// use stmtwrap_db::{params, ParamArg};
///
/// let args = params!["abc", 3.14, 42, true, ParamArg::many([1, 2, 3])];
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::ParamArg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::ParamArg::from($arg)),+]
    };
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Param {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for Param {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<f32> for Param {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<bool> for Param {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<u8>> for Param {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

impl From<&[u8]> for Param {
    fn from(value: &[u8]) -> Self {
        Self::Blob(value.to_vec())
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
