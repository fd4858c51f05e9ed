//! Extraction du texte d'un élément (CDATA, entités XML)

use memchr::{memchr, memmem};

/// Vrai si l'octet peut suivre un nom de balise
fn is_tag_boundary(b: u8) -> bool {
    b == b'>' || b == b'/' || b.is_ascii_whitespace()
}

/// Cherche la prochaine balise ouvrante `<tag` (nom complet) à partir de `from`.
///
/// Retourne (début de `<`, position juste après `>`, auto-fermante).
pub fn find_open_tag(haystack: &str, tag: &str, from: usize) -> Option<(usize, usize, bool)> {
    let bytes = haystack.as_bytes();
    let needle = format!("<{}", tag);
    let finder = memmem::Finder::new(needle.as_bytes());

    let mut cursor = from;
    while let Some(rel) = finder.find(&bytes[cursor..]) {
        let start = cursor + rel;
        let after = start + needle.len();
        match bytes.get(after) {
            Some(&b) if is_tag_boundary(b) => {
                let gt = memchr(b'>', &bytes[after..])? + after;
                let self_closing = gt > 0 && bytes[gt - 1] == b'/';
                return Some((start, gt + 1, self_closing));
            }
            // `<namespace` ne correspond pas à `<name`
            _ => cursor = after,
        }
    }
    None
}

/// Texte du premier élément `tag` du bloc, décodé et nettoyé.
///
/// `None` si l'élément est absent ou jamais fermé, `Some("")` si auto-fermant.
pub fn first_text(block: &str, tag: &str) -> Option<String> {
    let (_, content_start, self_closing) = find_open_tag(block, tag, 0)?;
    if self_closing {
        return Some(String::new());
    }

    let close = format!("</{}>", tag);
    let end = memmem::find(&block.as_bytes()[content_start..], close.as_bytes())? + content_start;

    Some(decode_text(&block[content_start..end]))
}

/// Déroule les sections CDATA, décode les entités et supprime les espaces en bordure
pub fn decode_text(raw: &str) -> String {
    const CDATA_OPEN: &str = "<![CDATA[";
    const CDATA_CLOSE: &str = "]]>";

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(open) = rest.find(CDATA_OPEN) {
        unescape_into(&rest[..open], &mut out);
        let inner = &rest[open + CDATA_OPEN.len()..];
        match inner.find(CDATA_CLOSE) {
            Some(close) => {
                out.push_str(&inner[..close]);
                rest = &inner[close + CDATA_CLOSE.len()..];
            }
            None => {
                // CDATA non terminée: tout le reste est littéral
                out.push_str(inner);
                rest = "";
            }
        }
    }
    unescape_into(rest, &mut out);

    out.trim().to_string()
}

/// Décode les entités XML (nommées et numériques) de `s` dans `out`
fn unescape_into(s: &str, out: &mut String) {
    let bytes = s.as_bytes();
    let mut cursor = 0;

    while let Some(rel) = memchr(b'&', &bytes[cursor..]) {
        let amp = cursor + rel;
        out.push_str(&s[cursor..amp]);

        // Une entité fait au plus une dizaine de caractères
        let window_end = (amp + 12).min(bytes.len());
        let Some(semi) = memchr(b';', &bytes[amp..window_end]).map(|p| amp + p) else {
            out.push('&');
            cursor = amp + 1;
            continue;
        };

        match resolve_entity(&s[amp + 1..semi]) {
            Some(c) => {
                out.push(c);
                cursor = semi + 1;
            }
            None => {
                out.push('&');
                cursor = amp + 1;
            }
        }
    }
    out.push_str(&s[cursor..]);
}

fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse::<u32>().ok()?,
            };
            char::from_u32(value)
        }
    }
}
