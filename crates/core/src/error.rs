use thiserror::Error;

/// Errors that can occur when converting attribute values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttrError {
    #[error("expected {0} attribute")]
    Expected(&'static str),
    #[error("invalid number: {0}")]
    InvalidNumber(String),
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("missing attribute: {0}")]
    MissingAttribute(String),
    #[error("attribute {name}: {message}")]
    Attribute { name: String, message: String },
}

impl AttrError {
    /// Attach the attribute name an error was raised for.
    pub fn named(self, name: &str) -> Self {
        match self {
            AttrError::MissingAttribute(_) | AttrError::Attribute { .. } => self,
            other => AttrError::Attribute {
                name: name.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Errors that can occur when assembling table keys.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("table {table} uses a hash/range key pair, a single key value was supplied")]
    MissingRangeKey { table: &'static str },
    #[error("table {table} uses a single hash key, a key pair was supplied")]
    UnexpectedRangeKey { table: &'static str },
    #[error("index {index} on table {table} uses a single hash key, a key pair was supplied")]
    UnexpectedIndexRangeKey {
        table: &'static str,
        index: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_error_display() {
        assert_eq!(
            AttrError::Expected("S").to_string(),
            "expected S attribute"
        );
        assert_eq!(
            AttrError::MissingAttribute("isbn".to_string()).to_string(),
            "missing attribute: isbn"
        );
    }

    #[test]
    fn test_attr_error_named_wraps_message() {
        let error = AttrError::Expected("N").named("num_pages");
        assert_eq!(
            error.to_string(),
            "attribute num_pages: expected N attribute"
        );
    }

    #[test]
    fn test_attr_error_named_keeps_existing_context() {
        let error = AttrError::MissingAttribute("isbn".to_string()).named("other");
        assert_eq!(error.to_string(), "missing attribute: isbn");
    }

    #[test]
    fn test_key_error_display() {
        let error = KeyError::MissingRangeKey { table: "library.Book" };
        assert_eq!(
            error.to_string(),
            "table library.Book uses a hash/range key pair, a single key value was supplied"
        );
    }

    #[test]
    fn test_index_key_error_names_the_index() {
        let error = KeyError::UnexpectedIndexRangeKey {
            table: "library.Book",
            index: "title_index",
        };
        assert_eq!(
            error.to_string(),
            "index title_index on table library.Book uses a single hash key, a key pair was supplied"
        );
    }
}
