//! Cell cleaning and list splitting.

/// Trim whitespace, then one run of leading/trailing commas, then whitespace
/// again. Form exports often leave a dangling `,` after copied text.
pub fn clean_string(value: &str) -> String {
    value.trim().trim_matches(',').trim().to_string()
}

/// Split a cell on `delimiter`, clean every piece and drop the empty ones.
///
/// Order is preserved and duplicates are kept.
pub fn list_from_string(value: &str, delimiter: char) -> Vec<String> {
    value
        .split(delimiter)
        .map(clean_string)
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_strips_commas_and_whitespace() {
        assert_eq!(clean_string(",  hello,  "), "hello");
        assert_eq!(clean_string("  a, b  "), "a, b");
        assert_eq!(clean_string(",,,"), "");
        assert_eq!(clean_string(""), "");
    }

    #[test]
    fn clean_keeps_inner_text_untouched() {
        assert_eq!(clean_string("12 High St, Leeds"), "12 High St, Leeds");
    }

    #[test]
    fn list_drops_blank_pieces() {
        assert_eq!(list_from_string(" a, ,b ,", ','), vec!["a", "b"]);
    }

    #[test]
    fn list_keeps_order_and_duplicates() {
        assert_eq!(
            list_from_string("Netball, Football, Netball", ','),
            vec!["Netball", "Football", "Netball"]
        );
    }

    #[test]
    fn list_on_newlines() {
        let cell = "https://a.org/1.jpg\n\n https://a.org/2.jpg,\n";
        assert_eq!(
            list_from_string(cell, '\n'),
            vec!["https://a.org/1.jpg", "https://a.org/2.jpg"]
        );
    }

    #[test]
    fn list_of_empty_cell_is_empty() {
        assert!(list_from_string("", ',').is_empty());
        assert!(list_from_string("  ", '\n').is_empty());
    }
}
