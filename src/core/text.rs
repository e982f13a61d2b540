//! Token-level normalization applied to tweet text before it is learned.
//!
//! The pipeline order is fixed: filter, lowercase, capitalize sentences,
//! append the terminal period. Lowercasing after capitalizing would undo it.

/// Drops mentions (`@...`) and links (`http...`), keeping order.
pub fn filter_words<'a>(words: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    words
        .into_iter()
        .filter(|word| !(word.starts_with('@') || word.starts_with("http")))
        .map(str::to_string)
        .collect()
}

pub fn convert_to_lowercase(words: &mut [String]) {
    for word in words.iter_mut() {
        *word = word.to_lowercase();
    }
}

/// Capitalizes the first word and every word that follows a sentence end.
pub fn capitalize_sentences(words: &mut [String]) {
    if words.is_empty() {
        return;
    }

    words[0] = capitalize(&words[0]);
    for i in 1..words.len() {
        if ends_with_punc(&words[i - 1]) {
            words[i] = capitalize(&words[i]);
        }
    }
}

/// Terminates the last word with a period unless it already ends a sentence
/// or trails off with a comma.
pub fn append_period(words: &mut [String]) {
    if let Some(last) = words.last_mut() {
        if !ends_with_punc(last) && !last.ends_with(',') {
            last.push('.');
        }
    }
}

pub fn ends_with_punc(word: &str) -> bool {
    word.ends_with('.') || word.ends_with('!') || word.ends_with('?')
}

pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Runs the whole pipeline over one tweet's tokens.
pub fn normalize(words: &mut [String]) {
    convert_to_lowercase(words);
    capitalize_sentences(words);
    append_period(words);
}
