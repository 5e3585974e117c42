use chrono::{DateTime, Utc};

// Expands the set of supported element types into the parallel
// `Values` (a column), `Value` (a cell), and `ElementType` enums.
macro_rules! element_types {
    ($( $variant:ident($ty:ty) => $name:literal ),* $(,)?) => {
        /// Values of a single column, all of one element type.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Values {
            $( $variant(Vec<$ty>), )*
        }

        /// A single typed cell, as appended by `Table::append_row`.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Value {
            $( $variant($ty), )*
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ElementType {
            $( $variant, )*
        }

        impl ElementType {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( ElementType::$variant => $name, )*
                }
            }
        }

        impl Values {
            pub fn len(&self) -> usize {
                match self {
                    $( Values::$variant(v) => v.len(), )*
                }
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            pub fn element_type(&self) -> ElementType {
                match self {
                    $( Values::$variant(_) => ElementType::$variant, )*
                }
            }

            /// Zero-length Values of the same element type.
            pub fn empty_like(&self) -> Self {
                match self {
                    $( Values::$variant(_) => Values::$variant(Vec::new()), )*
                }
            }

            /// Push `value`, which must match this column's element type.
            /// On mismatch the Value is handed back and nothing changes.
            pub(crate) fn push(&mut self, value: Value) -> Result<(), Value> {
                match (self, value) {
                    $( (Values::$variant(v), Value::$variant(x)) => v.push(x), )*
                    (_, value) => return Err(value),
                }
                Ok(())
            }

            /// Move all of `other` onto the end of this column.
            /// On mismatch `other` is handed back and nothing changes.
            pub(crate) fn extend(&mut self, other: Values) -> Result<(), Values> {
                match (self, other) {
                    $( (Values::$variant(v), Values::$variant(x)) => v.extend(x), )*
                    (_, other) => return Err(other),
                }
                Ok(())
            }
        }

        impl Value {
            pub fn element_type(&self) -> ElementType {
                match self {
                    $( Value::$variant(_) => ElementType::$variant, )*
                }
            }
        }

        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }

            impl From<Vec<$ty>> for Values {
                fn from(v: Vec<$ty>) -> Self {
                    Values::$variant(v)
                }
            }
        )*
    };
}

element_types! {
    F32(f32) => "f32",
    F64(f64) => "f64",
    Str(String) => "string",
    I8(i8) => "i8",
    I16(i16) => "i16",
    I32(i32) => "i32",
    I64(i64) => "i64",
    U8(u8) => "u8",
    U16(u16) => "u16",
    U32(u32) => "u32",
    U64(u64) => "u64",
    Time(DateTime<Utc>) => "time",
    Bool(bool) => "bool",
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
