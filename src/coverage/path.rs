//! Path normalization shared by the parser, the change filter and the report

/// Normalize a reported file path so that LCOV paths and changed-file paths line up.
///
/// Converts separators to `/`, then drops leading `./` and `prefix` (itself
/// normalized first) for as long as either is present, so the result is
/// stable under a second call.
pub fn normalize_path(path: &str, prefix: &str) -> String {
    let path = path.replace('\\', "/");
    let prefix = normalize_prefix(prefix);

    let mut rest = strip_dot_slash(&path);
    if !prefix.is_empty() {
        while let Some(stripped) = rest.strip_prefix(prefix.as_str()).filter(|r| !r.is_empty()) {
            rest = strip_dot_slash(stripped);
        }
    }
    rest.to_string()
}

/// Prefix derived from a configured working directory: `./packages/app` -> `packages/app/`.
/// A working directory of `./` or `.` yields an empty prefix.
pub fn normalize_prefix(working_dir: &str) -> String {
    let dir = working_dir.replace('\\', "/");
    let dir = strip_dot_slash(&dir).trim_end_matches('/');

    if dir.is_empty() || dir == "." {
        String::new()
    } else {
        format!("{}/", dir)
    }
}

fn strip_dot_slash(mut path: &str) -> &str {
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separators_and_leading_dot() {
        assert_eq!(normalize_path(".\\src\\lib.rs", ""), "src/lib.rs");
        assert_eq!(normalize_path("././src/a.js", ""), "src/a.js");
    }

    #[test]
    fn test_strips_working_directory_prefix() {
        assert_eq!(normalize_path("packages/app/src/a.js", "./packages/app"), "src/a.js");
        assert_eq!(normalize_path("packages/app/src/a.js", "packages/app/"), "src/a.js");
        assert_eq!(normalize_path("other/src/a.js", "packages/app"), "other/src/a.js");
        // a path equal to the prefix itself is left alone
        assert_eq!(normalize_path("packages/app/", "packages/app"), "packages/app/");
    }

    #[test]
    fn test_prefix_from_working_directory() {
        assert_eq!(normalize_prefix("./"), "");
        assert_eq!(normalize_prefix("."), "");
        assert_eq!(normalize_prefix("./packages/app/"), "packages/app/");
    }

    #[test]
    fn test_idempotent() {
        for raw in ["./src/a.js", "src\\b.js", "lib/c.rs", "", "packages/app/x.js"] {
            let once = normalize_path(raw, "packages/app");
            assert_eq!(normalize_path(&once, "packages/app"), once);
        }
    }

    #[test]
    fn test_repeated_prefix_is_stripped_fully() {
        assert_eq!(normalize_path("app/app/x.js", "app"), "x.js");
        assert_eq!(normalize_path("app/./app/x.js", "app"), "x.js");
        assert_eq!(normalize_path("./app/app/", "app"), "app/");

        for raw in ["app/app/x.js", "app/./x.js", "./app/app/app/", "app/src/app/x.js"] {
            let once = normalize_path(raw, "app");
            assert_eq!(normalize_path(&once, "app"), once, "not stable for {}", raw);
        }
    }

    #[test]
    fn test_garbage_passes_through() {
        assert_eq!(normalize_path("::not a path::", ""), "::not a path::");
    }
}
