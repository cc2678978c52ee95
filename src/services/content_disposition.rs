// src/services/content_disposition.rs
//! Filename extraction from `Content-Disposition` response headers.

/// Returns the filename suggested by a `Content-Disposition` value.
///
/// Accepts `filename=` with a quoted or bare value. An RFC 5987
/// `filename*=UTF-8''...` parameter wins when present and decodable. Empty
/// names count as absent.
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    let params = parameters(header);

    let extended = params
        .iter()
        .find(|(name, _)| name == "filename*")
        .and_then(|(_, value)| decode_ext_value(value));

    extended
        .or_else(|| {
            params
                .iter()
                .find(|(name, _)| name == "filename")
                .map(|(_, value)| value.clone())
        })
        .filter(|name| !name.trim().is_empty())
}

fn parameters(header: &str) -> Vec<(String, String)> {
    split_unquoted(header, ';')
        .into_iter()
        .filter_map(|segment| {
            let (name, value) = segment.split_once('=')?;
            Some((name.trim().to_ascii_lowercase(), unquote(value.trim())))
        })
        .collect()
}

fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut open_quote: Option<char> = None;
    let mut prev = None;

    for (i, c) in s.char_indices() {
        match (open_quote, c) {
            (Some(q), c) if c == q => open_quote = None,
            (Some(_), _) => {}
            // Only a quote that starts a value opens a quoted run.
            (None, '"' | '\'') if prev == Some('=') => open_quote = Some(c),
            (None, c) if c == sep || c == '\n' => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
        if !c.is_whitespace() {
            prev = Some(c);
        }
    }
    parts.push(&s[start..]);
    parts
}

fn unquote(value: &str) -> String {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner.to_string();
        }
    }
    value.trim_matches(['"', '\'']).to_string()
}

fn decode_ext_value(value: &str) -> Option<String> {
    let mut pieces = value.splitn(3, '\'');
    let charset = pieces.next()?;
    let _language = pieces.next()?;
    let encoded = pieces.next()?;

    if !charset.eq_ignore_ascii_case("utf-8") {
        return None;
    }
    let decoded = urlencoding::decode_binary(encoded.as_bytes());
    String::from_utf8(decoded.into_owned()).ok()
}
