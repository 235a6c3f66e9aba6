//! utils.rs
//! Utilidades de texto compartidas (truncado seguro, espacios, escape para Python).

/// Trunca a `max` caracteres respetando límites UTF-8.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Igual que `truncate_chars`, pero agrega `suffix` cuando hubo corte.
pub fn truncate_with_suffix(text: &str, max: usize, suffix: &str) -> String {
    if text.chars().count() > max {
        format!("{}{}", truncate_chars(text, max), suffix)
    } else {
        text.to_string()
    }
}

/// Colapsa saltos de línea y espacios repetidos (los títulos de arXiv vienen partidos).
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Elimina todo lo que no sea ASCII.
pub fn ascii_only(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii()).collect()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Literal de string Python entre comillas dobles, en una sola línea y ASCII.
pub fn py_str(text: &str) -> String {
    let cleaned = ascii_only(&text.replace(['\n', '\r', '\t'], " "));
    format!("\"{}\"", cleaned.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Lista Python de strings: `["a", "b"]`.
pub fn py_list(items: &[String]) -> String {
    let parts: Vec<String> = items.iter().map(|s| py_str(s)).collect();
    format!("[{}]", parts.join(", "))
}
