// Header name formatting
// Author: kelexine (https://github.com/kelexine)

/// Formats a header name as `Xxx-Yyy`: the first letter and every letter
/// following a hyphen are upper-cased, the rest lower-cased.
///
/// Names containing bytes that are not valid header token characters are
/// returned unchanged.
pub fn normalize(name: &str) -> String {
    if !name.bytes().all(is_token_byte) {
        return name.to_string();
    }

    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
