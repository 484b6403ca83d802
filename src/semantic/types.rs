//! Static types inferred for variable references.

use std::fmt;

/// Static type of a value.
#[derive(Debug, Clone, PartialEq)]
pub enum StaticType {
    /// Unknown or dynamic.
    Any,

    Null,

    Missing,

    Bool,

    Int,

    Decimal,

    Float,

    String,

    Symbol,

    Timestamp,

    Date,

    Time,

    Clob,

    Blob,

    /// Ordered collection with element type.
    List(Box<StaticType>),

    /// S-expression with element type.
    Sexp(Box<StaticType>),

    /// Unordered collection with element type.
    Bag(Box<StaticType>),

    /// Struct with known fields; `open` structs may carry more.
    Struct {
        fields: Vec<(String, StaticType)>,
        open: bool,
    },

    /// Union of several types.
    AnyOf(Vec<StaticType>),
}

impl StaticType {
    /// A bag of unknown elements.
    pub fn any_bag() -> Self {
        StaticType::Bag(Box::new(StaticType::Any))
    }

    /// A list of unknown elements.
    pub fn any_list() -> Self {
        StaticType::List(Box::new(StaticType::Any))
    }

    /// A struct with no known fields.
    pub fn open_struct() -> Self {
        StaticType::Struct {
            fields: Vec::new(),
            open: true,
        }
    }

    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, StaticType::Int | StaticType::Decimal | StaticType::Float)
    }

    /// Returns true for collection types that a FROM clause can range over.
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            StaticType::List(_) | StaticType::Sexp(_) | StaticType::Bag(_)
        )
    }

    /// Element type of a collection type.
    pub fn element_type(&self) -> Option<&StaticType> {
        match self {
            StaticType::List(element) | StaticType::Sexp(element) | StaticType::Bag(element) => {
                Some(element)
            }
            _ => None,
        }
    }
}

impl fmt::Display for StaticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaticType::Any => write!(f, "ANY"),
            StaticType::Null => write!(f, "NULL"),
            StaticType::Missing => write!(f, "MISSING"),
            StaticType::Bool => write!(f, "BOOL"),
            StaticType::Int => write!(f, "INT"),
            StaticType::Decimal => write!(f, "DECIMAL"),
            StaticType::Float => write!(f, "FLOAT"),
            StaticType::String => write!(f, "STRING"),
            StaticType::Symbol => write!(f, "SYMBOL"),
            StaticType::Timestamp => write!(f, "TIMESTAMP"),
            StaticType::Date => write!(f, "DATE"),
            StaticType::Time => write!(f, "TIME"),
            StaticType::Clob => write!(f, "CLOB"),
            StaticType::Blob => write!(f, "BLOB"),
            StaticType::List(element) => write!(f, "LIST<{element}>"),
            StaticType::Sexp(element) => write!(f, "SEXP<{element}>"),
            StaticType::Bag(element) => write!(f, "BAG<{element}>"),
            StaticType::Struct { fields, open } => {
                write!(f, "STRUCT{{")?;
                for (index, (name, ty)) in fields.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                if *open {
                    if !fields.is_empty() {
                        write!(f, ", ")?;
                    }
                    write!(f, "...")?;
                }
                write!(f, "}}")
            }
            StaticType::AnyOf(types) => {
                let names: Vec<String> = types.iter().map(ToString::to_string).collect();
                write!(f, "{}", names.join(" | "))
            }
        }
    }
}
