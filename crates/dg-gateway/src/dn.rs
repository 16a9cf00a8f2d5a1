//! Distinguished name helpers.
//!
//! Only what the directory core needs: building child names, reading the
//! leading RDN back and comparing names. Values are escaped per RFC 4514.

/// Escapes an attribute value for use in an RDN.
#[must_use]
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let last = value.chars().count().saturating_sub(1);
    for (i, c) in value.chars().enumerate() {
        match c {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                out.push('\\');
                out.push(c);
            }
            '#' if i == 0 => out.push_str("\\#"),
            ' ' if i == 0 || i == last => out.push_str("\\ "),
            '\0' => out.push_str("\\00"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverses [`escape_value`], including `\XX` hex escapes.
#[must_use]
pub fn unescape_value(value: &str) -> String {
    let mut bytes = Vec::with_capacity(value.len());
    let raw = value.as_bytes();
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'\\' && i + 1 < raw.len() {
            let hex = raw
                .get(i + 1..i + 3)
                .filter(|h| h.iter().all(u8::is_ascii_hexdigit))
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok());
            match hex {
                Some(byte) => {
                    bytes.push(byte);
                    i += 3;
                }
                None => {
                    bytes.push(raw[i + 1]);
                    i += 2;
                }
            }
        } else {
            bytes.push(raw[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Splits a DN into its RDN components, honoring escapes.
#[must_use]
pub fn components(dn: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in dn.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            ',' => {
                parts.push(trim(&dn[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = trim(&dn[start..]);
    if !tail.is_empty() || !parts.is_empty() {
        parts.push(tail);
    }
    parts
}

/// Trims surrounding whitespace but keeps an escaped trailing space.
fn trim(raw: &str) -> &str {
    let raw = raw.trim_start();
    let trimmed = raw.trim_end();
    let backslashes = trimmed.bytes().rev().take_while(|&b| b == b'\\').count();
    if backslashes % 2 == 1 && raw.as_bytes().get(trimmed.len()) == Some(&b' ') {
        &raw[..=trimmed.len()]
    } else {
        trimmed
    }
}

/// Builds `attr=value,parent` with the value escaped.
#[must_use]
pub fn child(attribute: &str, value: &str, parent: &str) -> String {
    format!("{attribute}={},{parent}", escape_value(value))
}

/// Returns the leading RDN as `(attribute, unescaped value)`.
#[must_use]
pub fn leading_rdn(dn: &str) -> Option<(String, String)> {
    let first = *components(dn).first()?;
    let (attribute, value) = first.split_once('=')?;
    let attribute = attribute.trim();
    if attribute.is_empty() {
        return None;
    }
    Some((attribute.to_string(), unescape_value(trim(value))))
}

/// Returns the parent DN.
#[must_use]
pub fn parent(dn: &str) -> Option<String> {
    let parts = components(dn);
    if parts.len() < 2 {
        return None;
    }
    Some(parts[1..].join(","))
}

/// Normalizes a DN for comparison: trimmed components, lowercase
/// attribute names and values.
#[must_use]
pub fn normalize(dn: &str) -> String {
    components(dn)
        .into_iter()
        .map(|rdn| match rdn.split_once('=') {
            Some((attr, value)) => format!("{}={}", attr.trim().to_lowercase(), trim(value).to_lowercase()),
            None => rdn.to_lowercase(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Compares two DNs after normalization.
#[must_use]
pub fn same(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Checks whether `dn` lies under `base` (or is `base`).
#[must_use]
pub fn is_within(dn: &str, base: &str) -> bool {
    let dn = normalize(dn);
    let base = normalize(base);
    base.is_empty() || dn == base || dn.ends_with(&format!(",{base}"))
}

/// Checks whether `dn` is an immediate child of `base`.
#[must_use]
pub fn is_child_of(dn: &str, base: &str) -> bool {
    parent(dn).is_some_and(|p| same(&p, base))
}
