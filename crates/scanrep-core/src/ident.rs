//! SQL identifier quoting
//!
//! SQLite has no placeholders for table or column names, so identifiers are
//! the only thing ever interpolated into SQL text. They all go through
//! [`quote`]; values are always bound as parameters.

use crate::error::{Error, Result};

/// Quote `name` as a SQLite identifier.
///
/// The name is wrapped in double quotes with embedded quotes doubled, which
/// makes any character sequence inert. Empty names and NUL bytes are
/// rejected because SQLite cannot represent them.
pub fn quote(name: &str) -> Result<String> {
    if name.is_empty() {
        return Err(Error::schema("identifier must not be empty"));
    }

    if name.contains('\0') {
        return Err(Error::schema(format!(
            "identifier {:?} contains a NUL byte",
            name
        )));
    }

    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Quote every name, preserving order, joined with `", "`
pub fn quote_list<'a, I>(names: I) -> Result<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let quoted = names.into_iter().map(quote).collect::<Result<Vec<_>>>()?;
    Ok(quoted.join(", "))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_plain() {
        assert_eq!(quote("CVSS").unwrap(), "\"CVSS\"");
    }

    #[test]
    fn test_quote_escapes_embedded_quotes() {
        assert_eq!(
            quote("x\"; DROP TABLE scan; --").unwrap(),
            "\"x\"\"; DROP TABLE scan; --\""
        );
    }

    #[test]
    fn test_quote_keeps_spaces_and_symbols() {
        assert_eq!(quote("Plugin Output").unwrap(), "\"Plugin Output\"");
        assert_eq!(quote("2024-05-01").unwrap(), "\"2024-05-01\"");
    }

    #[test]
    fn test_quote_rejects_empty_and_nul() {
        assert!(quote("").is_err());
        assert!(quote("a\0b").is_err());
    }

    #[test]
    fn test_quote_list() {
        assert_eq!(quote_list(["Host", "CVSS"]).unwrap(), "\"Host\", \"CVSS\"");
    }
}
