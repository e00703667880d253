//! Binary downloads and file name resolution.

/// File name used when nothing better is known.
pub const DEFAULT_FILE_NAME: &str = "material";
/// Content type assumed when the response does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Downloaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Resolved file name, reduced to a single path component.
    pub file_name: String,
    /// Declared content type.
    pub content_type: String,
    /// File content.
    pub bytes: Vec<u8>,
}

/// Pick a download file name.
///
/// Order: the structured `nombre_archivo` field, the `Content-Disposition`
/// header (RFC 5987 `filename*` before plain `filename`), the material title,
/// then [`DEFAULT_FILE_NAME`].
#[must_use]
pub fn resolve_filename(
    structured: Option<&str>,
    content_disposition: Option<&str>,
    title: Option<&str>,
) -> String {
    structured
        .and_then(sanitize)
        .or_else(|| content_disposition.and_then(filename_from_disposition))
        .or_else(|| title.and_then(sanitize))
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string())
}

/// Extract the file name carried by a `Content-Disposition` header value.
#[must_use]
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let params = disposition_params(header);
    let extended = params
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("filename*"))
        .and_then(|(_, value)| decode_extended(value))
        .and_then(|name| sanitize(&name));
    extended.or_else(|| {
        params
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("filename"))
            .and_then(|(_, value)| sanitize(value))
    })
}

/// Parameters after the disposition type, with quoted values unescaped.
fn disposition_params(header: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut rest = match header.split_once(';') {
        Some((_, rest)) => rest,
        None => return params,
    };

    loop {
        rest = rest.trim_start_matches(|ch: char| ch == ';' || ch.is_whitespace());
        if rest.is_empty() {
            break;
        }
        let Some((name, after)) = rest.split_once('=') else {
            break;
        };
        let name = name.trim().to_string();
        let after = after.trim_start();
        let (value, remainder) = if let Some(quoted) = after.strip_prefix('"') {
            read_quoted(quoted)
        } else {
            let end = after.find(';').unwrap_or(after.len());
            (after[..end].trim().to_string(), &after[end..])
        };
        params.push((name, value));
        rest = remainder;
    }
    params
}

fn read_quoted(input: &str) -> (String, &str) {
    let mut value = String::new();
    let mut chars = input.char_indices();
    while let Some((index, ch)) = chars.next() {
        match ch {
            '\\' => {
                if let Some((_, escaped)) = chars.next() {
                    value.push(escaped);
                }
            }
            '"' => return (value, &input[index + 1..]),
            other => value.push(other),
        }
    }
    (value, "")
}

/// Decode an RFC 5987 `charset'language'percent-encoded` value.
fn decode_extended(value: &str) -> Option<String> {
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?.trim();
    let _language = parts.next()?;
    let encoded = parts.next()?;

    if charset.eq_ignore_ascii_case("utf-8") {
        urlencoding::decode(encoded)
            .ok()
            .map(std::borrow::Cow::into_owned)
    } else if charset.eq_ignore_ascii_case("iso-8859-1") {
        Some(
            urlencoding::decode_binary(encoded.as_bytes())
                .iter()
                .map(|byte| char::from(*byte))
                .collect(),
        )
    } else {
        None
    }
}

/// Reduce a candidate to its last path component; blank names are rejected.
fn sanitize(candidate: &str) -> Option<String> {
    let name = candidate
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(candidate)
        .trim()
        .trim_matches('"');
    let name: String = name.chars().filter(|ch| !ch.is_control()).collect();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name)
    }
}
