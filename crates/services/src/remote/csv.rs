use crate::error::RemoteError;

/// One CSV record and the source line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRecord {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Split CSV text into records of fields.
///
/// See [`parse_numbered_records`] for the accepted syntax.
///
/// # Errors
///
/// Returns `RemoteError::MalformedCsv` as `parse_numbered_records` does.
pub fn parse_records(text: &str) -> Result<Vec<Vec<String>>, RemoteError> {
    Ok(parse_numbered_records(text)?
        .into_iter()
        .map(|record| record.fields)
        .collect())
}

/// Split CSV text into records, keeping each record's starting line.
///
/// Handles quoted fields with `""` escapes and embedded commas or newlines,
/// and both `\n` and `\r\n` line endings. Blank lines are skipped but still
/// counted.
///
/// # Errors
///
/// Returns `RemoteError::MalformedCsv` when a quoted field is never closed or
/// text follows a closing quote.
pub fn parse_numbered_records(text: &str) -> Result<Vec<CsvRecord>, RemoteError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut after_quote = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut quote_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => {
                    in_quotes = false;
                    after_quote = true;
                }
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            ',' => {
                record.push(std::mem::take(&mut field));
                after_quote = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                finish_record(&mut records, record_line, &mut record, &mut field);
                after_quote = false;
                line += 1;
                record_line = line;
            }
            '"' if field.is_empty() && !after_quote => {
                in_quotes = true;
                quote_line = line;
            }
            _ if after_quote => {
                return Err(RemoteError::MalformedCsv {
                    line,
                    reason: "text after closing quote",
                });
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(RemoteError::MalformedCsv {
            line: quote_line,
            reason: "unterminated quoted field",
        });
    }
    finish_record(&mut records, record_line, &mut record, &mut field);
    Ok(records)
}

fn finish_record(
    records: &mut Vec<CsvRecord>,
    line: usize,
    record: &mut Vec<String>,
    field: &mut String,
) {
    record.push(std::mem::take(field));
    let fields = std::mem::take(record);
    if fields.len() == 1 && fields[0].trim().is_empty() {
        return;
    }
    records.push(CsvRecord { line, fields });
}
