//! Static types.
use std::fmt;

/// Base of a type, without array-ness.
///
/// `Str` exists only as the type of string literals; there are no string
/// variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseKind {
    Int,
    Float,
    Char,
    Bool,
    Void,
    Str,
}

impl fmt::Display for BaseKind {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BaseKind::Int   => write!(f, "int"),
            BaseKind::Float => write!(f, "float"),
            BaseKind::Char  => write!(f, "char"),
            BaseKind::Bool  => write!(f, "bool"),
            BaseKind::Void  => write!(f, "void"),
            BaseKind::Str   => write!(f, "string"),
        }
    }
}

/// A type as tracked by the analyzer. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub base: BaseKind,
    pub is_array: bool,
    /// Number of elements, only meaningful when `is_array`.
    pub array_size: i32,
    /// Element type, only present when `is_array`.
    pub element: Option<Box<Type>>,
}

impl Type {
    pub fn scalar(base: BaseKind) -> Self {
        Self {
            base,
            is_array: false,
            array_size: -1,
            element: None,
        }
    }

    pub fn array(element: Type, size: i32) -> Self {
        Self {
            base: element.base,
            is_array: true,
            array_size: size,
            element: Some(Box::new(element)),
        }
    }

    pub const INT: Type = Type {
        base: BaseKind::Int,
        is_array: false,
        array_size: -1,
        element: None,
    };

    pub const FLOAT: Type = Type {
        base: BaseKind::Float,
        is_array: false,
        array_size: -1,
        element: None,
    };

    pub const CHAR: Type = Type {
        base: BaseKind::Char,
        is_array: false,
        array_size: -1,
        element: None,
    };

    pub const BOOL: Type = Type {
        base: BaseKind::Bool,
        is_array: false,
        array_size: -1,
        element: None,
    };

    pub const VOID: Type = Type {
        base: BaseKind::Void,
        is_array: false,
        array_size: -1,
        element: None,
    };

    pub const STR: Type = Type {
        base: BaseKind::Str,
        is_array: false,
        array_size: -1,
        element: None,
    };

    /// int, float, char and bool count as numeric.
    pub fn is_numeric(&self) -> bool {
        !self.is_array
            && matches!(
                self.base,
                BaseKind::Int | BaseKind::Float | BaseKind::Char | BaseKind::Bool
            )
    }

    /// int, char and bool count as integral.
    pub fn is_integral(&self) -> bool {
        !self.is_array && matches!(self.base, BaseKind::Int | BaseKind::Char | BaseKind::Bool)
    }

    pub fn is_bool(&self) -> bool {
        !self.is_array && self.base == BaseKind::Bool
    }

    pub fn is_void(&self) -> bool {
        !self.is_array && self.base == BaseKind::Void
    }

    /// Element type of an array. Panics when called on a scalar.
    pub fn element_type(&self) -> &Type {
        debug_assert!(self.is_array);
        self.element
            .as_deref()
            .unwrap_or_else(|| unreachable!("array type without element type"))
    }

    /// Whether a value of type `src` may be assigned to a location of
    /// this type.
    ///
    /// Allowed: exact structural match, char into int, bool into int and
    /// int into float. Nothing else converts implicitly; arrays must
    /// match exactly.
    pub fn assignable_from(&self, src: &Type) -> bool {
        if self == src {
            return true;
        }
        if self.is_array || src.is_array {
            return false;
        }
        matches!(
            (self.base, src.base),
            (BaseKind::Int, BaseKind::Char)
                | (BaseKind::Int, BaseKind::Bool)
                | (BaseKind::Float, BaseKind::Int)
        )
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_array {
            write!(f, "{}[{}]", self.element_type(), self.array_size)
        } else {
            write!(f, "{}", self.base)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_type_equality_is_structural() {
        assert_eq!(Type::scalar(BaseKind::Int), Type::INT);
        assert_eq!(
            Type::array(Type::INT, 5),
            Type::array(Type::scalar(BaseKind::Int), 5)
        );
        assert_ne!(Type::array(Type::INT, 5), Type::array(Type::INT, 6));
        assert_ne!(Type::array(Type::INT, 5), Type::array(Type::CHAR, 5));
        assert_ne!(Type::INT, Type::array(Type::INT, 5));
    }

    #[test]
    fn test_predicates() {
        assert!(Type::BOOL.is_numeric());
        assert!(Type::CHAR.is_integral());
        assert!(!Type::FLOAT.is_integral());
        assert!(!Type::STR.is_numeric());
        assert!(!Type::array(Type::INT, 3).is_numeric());
    }

    #[test]
    fn test_assignability() {
        assert!(Type::INT.assignable_from(&Type::INT));
        assert!(Type::INT.assignable_from(&Type::CHAR));
        assert!(Type::INT.assignable_from(&Type::BOOL));
        assert!(Type::FLOAT.assignable_from(&Type::INT));

        assert!(!Type::INT.assignable_from(&Type::FLOAT));
        assert!(!Type::FLOAT.assignable_from(&Type::CHAR));
        assert!(!Type::CHAR.assignable_from(&Type::INT));
        assert!(!Type::BOOL.assignable_from(&Type::INT));

        let arr = Type::array(Type::INT, 4);
        assert!(arr.assignable_from(&Type::array(Type::INT, 4)));
        assert!(!arr.assignable_from(&Type::array(Type::INT, 5)));
        assert!(!arr.assignable_from(&Type::INT));
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::INT.to_string(), "int");
        assert_eq!(Type::array(Type::CHAR, 8).to_string(), "char[8]");
    }
}
