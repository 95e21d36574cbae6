//! Path-based document categorization

use std::path::Path;

use super::models::Category;

fn file_name_lower(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Lower-cased names of the directories containing `path`
fn parent_dirs_lower(path: &Path) -> Vec<String> {
    path.parent()
        .map(|parent| {
            parent
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_lowercase())
                .collect()
        })
        .unwrap_or_default()
}

/// Map a path to its category. First matching rule wins.
///
/// Pass the root-relative path: directory rules look at every parent
/// component, so an absolute path would also match directories above the
/// project root.
pub fn categorize(path: &Path) -> Category {
    let name = file_name_lower(path);
    let dirs = parent_dirs_lower(path);
    let in_dir = |names: &[&str]| dirs.iter().any(|d| names.contains(&d.as_str()));

    if name.contains("readme") {
        Category::Readme
    } else if name.contains("changelog") {
        Category::Changelog
    } else if name.contains("guide") || name.contains("tutorial") {
        Category::Guide
    } else if name.contains("api") || name.contains("reference") {
        Category::Api
    } else if name.contains("example") || in_dir(&["example", "examples"]) {
        Category::Example
    } else if name.contains("test") || in_dir(&["test", "tests"]) {
        Category::Test
    } else if in_dir(&["docs", "doc"]) {
        Category::Docs
    } else if name.contains("config") {
        Category::Config
    } else {
        Category::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_rules() {
        assert_eq!(categorize(Path::new("README.md")), Category::Readme);
        assert_eq!(categorize(Path::new("packages/x/readme.markdown")), Category::Readme);
        assert_eq!(categorize(Path::new("CHANGELOG.md")), Category::Changelog);
        assert_eq!(categorize(Path::new("docs/user-guide.md")), Category::Guide);
        assert_eq!(categorize(Path::new("Tutorial.md")), Category::Guide);
        assert_eq!(categorize(Path::new("docs/API.md")), Category::Api);
        assert_eq!(categorize(Path::new("reference.md")), Category::Api);
        assert_eq!(categorize(Path::new("config-options.md")), Category::Config);
        assert_eq!(categorize(Path::new("NOTES.md")), Category::Other);
    }

    #[test]
    fn test_directory_rules() {
        assert_eq!(categorize(Path::new("examples/basic.md")), Category::Example);
        assert_eq!(categorize(Path::new("tests/fixtures/input.md")), Category::Test);
        assert_eq!(categorize(Path::new("docs/overview.md")), Category::Docs);
        assert_eq!(categorize(Path::new("doc/internals/design.md")), Category::Docs);
    }

    #[test]
    fn test_rule_order_first_match_wins() {
        // readme beats the docs directory rule
        assert_eq!(categorize(Path::new("docs/README.md")), Category::Readme);
        // example directory beats docs directory
        assert_eq!(categorize(Path::new("docs/example/setup.md")), Category::Example);
        // docs directory beats config filename
        assert_eq!(categorize(Path::new("docs/config.md")), Category::Docs);
    }

    #[test]
    fn test_categorize_is_pure() {
        let path = Path::new("docs/getting-started.md");
        assert_eq!(categorize(path), categorize(path));
    }
}
