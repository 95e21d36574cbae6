//! Fixed keyword tables for dependency categories and script descriptions

use super::models::DependencyCategory;

/// Keyword table, checked top to bottom. Plain keywords match a whole
/// name segment (`react` matches `react-dom` but not `preactify`); keywords
/// containing punctuation match as substrings (`@testing-library`).
const CATEGORY_KEYWORDS: &[(DependencyCategory, &[&str])] = &[
    (
        DependencyCategory::Testing,
        &[
            "jest", "mocha", "vitest", "chai", "jasmine", "cypress", "playwright",
            "@testing-library", "supertest", "karma", "ava", "sinon", "nyc",
            "proptest", "criterion", "mockito", "tokio-test", "pretty_assertions",
            "insta", "pytest",
        ],
    ),
    (
        DependencyCategory::DevelopmentTool,
        &[
            "eslint", "prettier", "nodemon", "husky", "lint-staged", "ts-node",
            "stylelint", "concurrently", "cross-env", "rimraf", "commitlint",
        ],
    ),
    (
        DependencyCategory::BuildTool,
        &[
            "webpack", "vite", "rollup", "esbuild", "parcel", "babel", "@babel",
            "typescript", "turbo", "swc", "@swc", "tsup", "gulp", "grunt",
        ],
    ),
    (
        DependencyCategory::FrontendFramework,
        &[
            "react", "vue", "angular", "@angular", "svelte", "next", "nuxt",
            "preact", "solid-js", "ember", "lit", "yew", "leptos", "dioxus",
        ],
    ),
    (
        DependencyCategory::BackendFramework,
        &[
            "express", "koa", "fastify", "@nestjs", "hapi", "@hapi", "axum",
            "actix-web", "rocket", "warp", "tide", "django", "flask",
        ],
    ),
];

fn keyword_matches(name: &str, keyword: &str) -> bool {
    if keyword.chars().all(|c| c.is_ascii_alphanumeric()) {
        name.split(|c: char| !c.is_ascii_alphanumeric())
            .any(|segment| segment == keyword)
    } else {
        name.contains(keyword)
    }
}

/// Categorize a dependency by name; unknown names are plain libraries
pub fn categorize_dependency(name: &str) -> DependencyCategory {
    let name = name.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| keyword_matches(&name, kw)))
        .map(|(category, _)| *category)
        .unwrap_or(DependencyCategory::Library)
}

const SCRIPT_DESCRIPTIONS: &[(&str, &str)] = &[
    ("start", "Start the application"),
    ("dev", "Start the development server"),
    ("serve", "Serve the application locally"),
    ("build", "Build the project for production"),
    ("test", "Run the test suite"),
    ("lint", "Check code style and quality"),
    ("format", "Format the source code"),
    ("fmt", "Format the source code"),
    ("typecheck", "Run the type checker"),
    ("deploy", "Deploy the project"),
    ("clean", "Remove build artifacts"),
    ("watch", "Rebuild on file changes"),
    ("preview", "Preview the production build"),
    ("coverage", "Measure test coverage"),
    ("docs", "Generate documentation"),
    ("release", "Publish a new release"),
    ("prepare", "Prepare the package after install"),
];

fn lookup_script(name: &str) -> Option<&'static str> {
    SCRIPT_DESCRIPTIONS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, description)| *description)
}

/// Human-readable description for a script
///
/// Known names map to fixed phrases, `pre`/`post` hooks of known names are
/// described relative to them, and `name:variant` forms (e.g. `test:unit`)
/// append the variant. Anything else describes the command itself.
pub fn describe_script(name: &str, command: &str) -> String {
    let lower = name.to_lowercase();
    let (base, variant) = match lower.split_once(':') {
        Some((base, variant)) => (base, Some(variant)),
        None => (lower.as_str(), None),
    };

    let described = lookup_script(base)
        .map(str::to_string)
        .or_else(|| {
            base.strip_prefix("pre")
                .and_then(lookup_script)
                .map(|d| format!("Runs before: {}", d.to_lowercase()))
        })
        .or_else(|| {
            base.strip_prefix("post")
                .and_then(lookup_script)
                .map(|d| format!("Runs after: {}", d.to_lowercase()))
        });

    match (described, variant) {
        (Some(d), Some(v)) => format!("{d} ({v})"),
        (Some(d), None) => d,
        (None, _) => format!("Runs `{}`", command.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_categories() {
        assert_eq!(categorize_dependency("react"), DependencyCategory::FrontendFramework);
        assert_eq!(categorize_dependency("react-dom"), DependencyCategory::FrontendFramework);
        assert_eq!(categorize_dependency("express"), DependencyCategory::BackendFramework);
        assert_eq!(categorize_dependency("@nestjs/core"), DependencyCategory::BackendFramework);
        assert_eq!(categorize_dependency("jest"), DependencyCategory::Testing);
        assert_eq!(categorize_dependency("@testing-library/react"), DependencyCategory::Testing);
        assert_eq!(categorize_dependency("vitest"), DependencyCategory::Testing);
        assert_eq!(categorize_dependency("webpack-cli"), DependencyCategory::BuildTool);
        assert_eq!(
            categorize_dependency("eslint-plugin-react"),
            DependencyCategory::DevelopmentTool
        );
        assert_eq!(categorize_dependency("lodash"), DependencyCategory::Library);
        assert_eq!(categorize_dependency("langchain"), DependencyCategory::Library);
        assert_eq!(categorize_dependency("axum"), DependencyCategory::BackendFramework);
    }

    #[test]
    fn test_script_descriptions() {
        assert_eq!(describe_script("test", "jest"), "Run the test suite");
        assert_eq!(describe_script("test:unit", "jest unit"), "Run the test suite (unit)");
        assert_eq!(
            describe_script("prebuild", "rimraf dist"),
            "Runs before: build the project for production"
        );
        assert_eq!(describe_script("postinstall", "node setup.js"), "Runs `node setup.js`");
        assert_eq!(
            describe_script("prepare", "husky install"),
            "Prepare the package after install"
        );
        assert_eq!(describe_script("seed", "node seed.js"), "Runs `node seed.js`");
    }
}
