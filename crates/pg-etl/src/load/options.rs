//! CSV dialect options and the `COPY ... FROM STDIN` command built from them.

use serde::{Deserialize, Serialize};

use crate::core::identifier::{quote_identifier, quote_text};
use crate::error::{EtlError, Result};

/// CSV dialect of an imported file.
///
/// Defaults are applied at construction and deserialization time, so the
/// COPY command always states every option explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportOptions {
    /// Field separator.
    pub delimiter: char,
    /// Text that denotes a null field.
    pub null_string: String,
    /// Whether the first record is a header line to skip.
    pub header: bool,
    /// Quote character.
    pub quote_character: char,
    /// Character escaping a quote inside a quoted field.
    pub escape_character: char,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            null_string: String::new(),
            header: false,
            quote_character: '"',
            escape_character: '"',
        }
    }
}

impl ImportOptions {
    /// Check that delimiter, quote and escape are single-byte characters.
    ///
    /// Both the server's CSV reader and the header sniffer work on bytes.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("delimiter", self.delimiter),
            ("quoteCharacter", self.quote_character),
            ("escapeCharacter", self.escape_character),
        ] {
            if !value.is_ascii() || value == '\n' || value == '\r' {
                return Err(EtlError::Config(format!(
                    "{} must be a single ASCII character other than a line break, got {:?}",
                    field, value
                )));
            }
        }
        if self.delimiter == self.quote_character {
            return Err(EtlError::Config(
                "delimiter and quoteCharacter must differ".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    pub(crate) fn quote_byte(&self) -> u8 {
        self.quote_character as u8
    }

    pub(crate) fn escape_byte(&self) -> u8 {
        self.escape_character as u8
    }
}

/// Build the bulk-load command for `table`.
///
/// `COPY "t" FROM STDIN CSV [HEADER] DELIMITER 'd' NULL 'n' QUOTE 'q' ESCAPE 'e'`
pub fn build_copy_command(table: &str, options: &ImportOptions) -> Result<String> {
    options.validate()?;

    let mut command = format!("COPY {} FROM STDIN CSV", quote_identifier(table)?);
    if options.header {
        command.push_str(" HEADER");
    }
    command.push_str(&format!(
        " DELIMITER {} NULL {} QUOTE {} ESCAPE {}",
        quote_text(&options.delimiter.to_string())?,
        quote_text(&options.null_string)?,
        quote_text(&options.quote_character.to_string())?,
        quote_text(&options.escape_character.to_string())?,
    ));
    Ok(command)
}
