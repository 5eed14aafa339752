//! Path template matching
//!
//! Decides whether a concrete pathname matches a templated OpenAPI path such
//! as `/users/{id}`, and picks the declared path for a request.

/// Base path used when none is declared.
pub const DEFAULT_BASE_PATH: &str = "/";

enum Piece<'a> {
    Literal(&'a str),
    Param,
}

/// Split one template segment into literal text and `{name}` placeholders.
/// An unterminated `{` is literal text.
fn segment_pieces(segment: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut rest = segment;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        if open > 0 {
            pieces.push(Piece::Literal(&rest[..open]));
        }
        pieces.push(Piece::Param);
        rest = &rest[open + close + 1..];
    }
    if !rest.is_empty() {
        pieces.push(Piece::Literal(rest));
    }
    pieces
}

/// Non-greedy match of pieces against one path segment. A placeholder takes
/// at least one character.
fn match_pieces(pieces: &[Piece<'_>], text: &str) -> bool {
    match pieces.split_first() {
        None => text.is_empty(),
        Some((Piece::Literal(lit), rest)) => text
            .strip_prefix(*lit)
            .is_some_and(|remaining| match_pieces(rest, remaining)),
        Some((Piece::Param, rest)) => text
            .char_indices()
            .skip(1)
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .filter(|&end| end > 0)
            .any(|end| match_pieces(rest, &text[end..])),
    }
}

fn trim_trailing_slash(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

/// Whether `pathname` matches the OpenAPI path `template` in full.
///
/// Commas are removed from the pathname first: with the default
/// `style: simple; explode: false`, an array path parameter is sent as
/// `a,b,c` and the template treats the whole placeholder as one segment.
/// One trailing `/` on either side is ignored.
#[must_use]
pub fn matches(template: &str, pathname: &str) -> bool {
    let candidate = pathname.replace(',', "");
    let template_segments = trim_trailing_slash(template).split('/');
    let mut pathname_segments = trim_trailing_slash(&candidate).split('/');

    for template_segment in template_segments {
        let Some(pathname_segment) = pathname_segments.next() else {
            return false;
        };
        if !match_pieces(&segment_pieces(template_segment), pathname_segment) {
            return false;
        }
    }
    pathname_segments.next().is_none()
}

/// Find the declared path matching any of the candidate pathnames.
///
/// An exact literal match wins outright. Otherwise the *last* templated
/// match in declaration order is returned, so documents list less specific
/// templates first.
#[must_use]
pub fn find_openapi_path_matching_possible_pathnames<'a, S: AsRef<str>>(
    possible_pathnames: &[S],
    openapi_paths: &[&'a str],
) -> Option<&'a str> {
    let mut templated_match = None;
    for pathname in possible_pathnames {
        let pathname = pathname.as_ref();
        for &openapi_path in openapi_paths {
            if openapi_path == pathname {
                return Some(openapi_path);
            }
            if matches(openapi_path, pathname) {
                templated_match = Some(openapi_path);
            }
        }
    }
    templated_match
}

/// Remove a matched base path from the front of a pathname.
#[must_use]
pub fn pathname_without_base_path(base_path: &str, pathname: &str) -> String {
    if base_path == DEFAULT_BASE_PATH {
        return pathname.to_string();
    }
    let rest = pathname
        .strip_prefix(base_path)
        .map_or_else(|| pathname.replacen(base_path, "", 1), str::to_string);
    // `/api/` + `/api/users` leaves `users`; keep the root slash.
    if base_path.ends_with('/') && !rest.starts_with('/') {
        format!("/{rest}")
    } else {
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn literal_paths() {
        assert!(matches("/foo", "/foo"));
        assert!(!matches("/foo", "/bar"));
        assert!(!matches("/foo", "/foo/bar"));
        assert!(!matches("/foo/bar", "/foo"));
        assert!(matches("/", "/"));
    }

    #[test]
    fn placeholder_matches_exactly_one_segment() {
        assert!(matches("/a/{x}", "/a/v1"));
        assert!(!matches("/a/{x}", "/a/v1/v2"));
        assert!(!matches("/a/{x}", "/a/"));
        assert!(!matches("/a/{x}", "/a"));
        assert!(matches("/users/{id}/posts/{postId}", "/users/1/posts/abc"));
    }

    #[test]
    fn no_prefix_match() {
        assert!(!matches("/users", "/users/1"));
        assert!(!matches("/users/{id}", "/users/1/extra"));
    }

    #[test]
    fn commas_are_stripped_before_matching() {
        assert!(matches("/{list}", "/a,b,c"));
        assert!(matches("/pathParams/{ids}", "/pathParams/1,2,3"));
        // A segment made only of commas becomes empty and cannot satisfy a placeholder.
        assert!(!matches("/x/{list}", "/x/,,"));
    }

    #[test]
    fn trailing_slash_is_tolerated() {
        assert!(matches("/foo", "/foo/"));
        assert!(matches("/foo/{id}", "/foo/1/"));
        assert!(!matches("/foo", "/foo//"));
    }

    #[test]
    fn placeholders_mixed_with_text_in_a_segment() {
        assert!(matches("/files/{name}.{ext}", "/files/report.pdf"));
        assert!(matches("/files/{name}.{ext}", "/files/archive.tar.gz"));
        assert!(!matches("/files/{name}.{ext}", "/files/report"));
        assert!(matches("/v{version}/status", "/v2/status"));
        assert!(!matches("/v{version}/status", "/version2/statuses"));
    }

    #[test]
    fn unterminated_brace_is_literal() {
        assert!(matches("/weird/{oops", "/weird/{oops"));
        assert!(!matches("/weird/{oops", "/weird/x"));
    }

    #[test]
    fn exact_match_wins_over_templated_regardless_of_order() {
        let before = ["/items/special", "/items/{id}"];
        let after = ["/items/{id}", "/items/special"];
        assert_eq!(
            find_openapi_path_matching_possible_pathnames(&["/items/special"], &before),
            Some("/items/special")
        );
        assert_eq!(
            find_openapi_path_matching_possible_pathnames(&["/items/special"], &after),
            Some("/items/special")
        );
    }

    #[test]
    fn last_templated_match_wins() {
        let paths = ["/{a}/{b}", "/items/{id}", "/{c}/{d}"];
        assert_eq!(
            find_openapi_path_matching_possible_pathnames(&["/items/7"], &paths),
            Some("/{c}/{d}")
        );
    }

    #[test]
    fn templated_match_when_no_exact_match() {
        assert_eq!(
            find_openapi_path_matching_possible_pathnames(&["/foo/123"], &["/foo/{id}"]),
            Some("/foo/{id}")
        );
        assert_eq!(
            find_openapi_path_matching_possible_pathnames(&["/bar"], &["/foo/{id}"]),
            None
        );
    }

    #[test]
    fn exact_match_in_later_candidate_still_wins() {
        let paths = ["/{any}", "/v1/foo"];
        assert_eq!(
            find_openapi_path_matching_possible_pathnames(&["/foo", "/v1/foo"], &paths),
            Some("/v1/foo")
        );
    }

    #[test]
    fn base_path_removal() {
        assert_eq!(pathname_without_base_path("/", "/foo"), "/foo");
        assert_eq!(pathname_without_base_path("/api", "/api/foo"), "/foo");
        assert_eq!(pathname_without_base_path("/api/", "/api/foo"), "/foo");
        assert_eq!(pathname_without_base_path("/api/v1", "/api/v1/bar"), "/bar");
    }

    proptest! {
        #[test]
        fn single_placeholder_matches_any_segment(
            prefix in "[a-z]{1,8}",
            value in "[A-Za-z0-9_.~-]{1,16}",
        ) {
            let template = format!("/{prefix}/{{x}}");
            let actual = format!("/{prefix}/{value}");
            prop_assert!(matches(&template, &actual));
        }

        #[test]
        fn extra_segment_never_matches(
            prefix in "[a-z]{1,8}",
            first in "[a-z0-9]{1,8}",
            second in "[a-z0-9]{1,8}",
        ) {
            let template = format!("/{prefix}/{{x}}");
            let actual = format!("/{prefix}/{first}/{second}");
            prop_assert!(!matches(&template, &actual));
        }

        #[test]
        fn comma_joined_items_match_one_placeholder(
            items in prop::collection::vec("[a-z0-9]{1,6}", 1..6),
        ) {
            let actual = format!("/list/{}", items.join(","));
            let template = "/list/{items}";
            prop_assert!(matches(template, &actual));
        }

        #[test]
        fn literal_template_matches_itself(
            segments in prop::collection::vec("[a-z0-9]{1,8}", 1..5),
        ) {
            let path = format!("/{}", segments.join("/"));
            prop_assert!(matches(&path, &path));
        }
    }
}
