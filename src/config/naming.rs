//! Name derivation for default class identifiers and signature-derived arguments.

/// Single-word identifiers that only say "several values" and name nothing.
const PLURAL_MARKERS: &[&str] = &[
    "args",
    "arguments",
    "params",
    "parameters",
    "values",
    "items",
    "elements",
];

/// Split an identifier into lowercase words at `_`/`-` and case boundaries.
///
/// `fileName` -> `file name`, `HTTPServer` -> `http server`, `max_count2` -> `max count2`.
pub fn split_words(identifier: &str) -> Vec<String> {
    let chars: Vec<char> = identifier.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }

        current.extend(c.to_lowercase());
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Best-effort English singular of a lowercase word.
pub fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{}y", stem);
        }
    }
    if let Some(stem) = word.strip_suffix("zzes") {
        return format!("{}z", stem);
    }
    for suffix in ["sses", "xes", "ches", "shes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with("ss") || word.ends_with("us") || word.len() <= 1 {
        return word.to_string();
    }
    match word.strip_suffix('s') {
        Some(stem) => stem.to_string(),
        None => word.to_string(),
    }
}

/// Display name of an argument derived from a parameter identifier.
///
/// Repeatable arguments name one element: the last word is singularized
/// (`inputFiles` -> `input-file`), a trailing `list` is kept as is, and a
/// lone generic plural such as `args` becomes `element`.
pub fn argument_name(identifier: &str, repeatable: bool) -> String {
    let mut words = split_words(identifier);

    if repeatable {
        if words.len() == 1 && PLURAL_MARKERS.contains(&words[0].as_str()) {
            return "element".to_string();
        }
        if let Some(last) = words.last_mut() {
            if last != "list" {
                *last = singularize(last);
            }
        }
    }

    words.join("-")
}

/// `deploy-app` -> `DeployApp`.
pub fn pascal_case(name: &str) -> String {
    split_words(name)
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("fileName"), vec!["file", "name"]);
        assert_eq!(split_words("file_name"), vec!["file", "name"]);
        assert_eq!(split_words("HTTPServer"), vec!["http", "server"]);
        assert_eq!(split_words("max_count2"), vec!["max", "count2"]);
        assert_eq!(split_words("__x__"), vec!["x"]);
        assert_eq!(split_words("source"), vec!["source"]);
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("files"), "file");
        assert_eq!(singularize("entries"), "entry");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("branches"), "branch");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("quizzes"), "quiz");
        assert_eq!(singularize("class"), "class");
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("path"), "path");
    }

    #[test]
    fn test_argument_name() {
        assert_eq!(argument_name("targetPath", false), "target-path");
        assert_eq!(argument_name("files", false), "files");
        assert_eq!(argument_name("inputFiles", true), "input-file");
        assert_eq!(argument_name("fileList", true), "file-list");
        assert_eq!(argument_name("list", true), "list");
        assert_eq!(argument_name("args", true), "element");
        assert_eq!(argument_name("values", true), "element");
        assert_eq!(argument_name("extra_args", true), "extra-arg");
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case("deploy"), "Deploy");
        assert_eq!(pascal_case("deploy-app"), "DeployApp");
        assert_eq!(pascal_case("v2-migrate"), "V2Migrate");
    }
}
