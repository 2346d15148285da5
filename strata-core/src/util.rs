/// Writes `values` into `out` through `f`, inserting `separator` between the
/// items that produced output.
pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Short alias for a table: the first letter of each underscore-separated
/// word. `"test_models"` becomes `"tm"`.
pub fn table_alias(table_name: &str) -> String {
    table_name
        .split('_')
        .filter_map(|bit| bit.chars().next())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Lowercases and reduces a label to hyphen-separated alphanumeric runs.
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Column names must look like ordinary identifiers. Rows can carry
/// synthetic or metadata keys; those are never copied onto a model.
pub fn is_column_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Last path segment of a fully qualified Rust type name.
pub fn short_type_name(full: &str) -> &str {
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases() {
        assert_eq!(table_alias("test_models"), "tm");
        assert_eq!(table_alias("blog_post_comments"), "bpc");
        assert_eq!(table_alias("users"), "u");
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("Hello World!"), "hello-world");
        assert_eq!(slugify("  a  b  "), "a-b");
        assert_eq!(slugify("Üeber"), "eber");
    }

    #[test]
    fn column_names() {
        assert!(is_column_name("text_field"));
        assert!(is_column_name("a1"));
        assert!(!is_column_name("_private"));
        assert!(!is_column_name("1abc"));
        assert!(!is_column_name(""));
        assert!(!is_column_name("weird-key"));
    }

    #[test]
    fn short_names() {
        assert_eq!(short_type_name("strata::tests::TestModel"), "TestModel");
        assert_eq!(short_type_name("TestModel"), "TestModel");
    }
}
