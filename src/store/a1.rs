//! A1 notation helpers shared by the store backends.

pub fn column_letter(col: u32) -> String {
    let mut result = String::new();
    let mut n = col;
    while n > 0 {
        n -= 1;
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    result
}

pub fn column_number(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut n: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A') as u32 + 1;
        n = n.checked_mul(26)?.checked_add(digit)?;
    }
    Some(n)
}

/// Quotes the sheet name when the API would otherwise fail to parse it.
pub fn sheet_ref(table: &str) -> String {
    if table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        table.to_string()
    } else {
        format!("'{}'", table.replace('\'', "''"))
    }
}

pub fn columns_range(table: &str, first: u32, last: u32) -> String {
    format!(
        "{}!{}:{}",
        sheet_ref(table),
        column_letter(first),
        column_letter(last)
    )
}

pub fn row_range(table: &str, row: u32, first: u32, last: u32) -> String {
    format!(
        "{}!{}{row}:{}{row}",
        sheet_ref(table),
        column_letter(first),
        column_letter(last)
    )
}

/// Extracts the first row number of a range such as `'Tareas'!A7:K9`.
pub fn first_row(range: &str) -> Option<u32> {
    let cells = range.rsplit('!').next()?;
    let start = cells.split(':').next()?;
    let digits: String = start
        .chars()
        .skip_while(|c| c.is_ascii_alphabetic())
        .collect();
    digits.parse().ok()
}
