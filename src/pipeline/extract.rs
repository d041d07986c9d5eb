// src/pipeline/extract.rs

//! Release extraction from feed items.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{FeedItem, ProjectId, Release};

/// Trailing `/v1.2.3` or `/1.2.3` path segment of a release link.
static RELEASE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(v?\d+\.\d+\.\d+)$").expect("release tag pattern is valid")
});

/// Whether a feed link points at a tagged release.
pub fn is_release_link(link: &str) -> bool {
    RELEASE_TAG.is_match(link)
}

/// Map the release items of a feed into releases, preserving feed order.
///
/// Items whose link is not a release tag (blog posts, announcements) are
/// dropped.
pub fn extract_releases(project: &ProjectId, items: &[FeedItem]) -> Vec<Release> {
    let project_name = project.to_string();

    items
        .iter()
        .filter(|item| is_release_link(&item.link))
        .map(|item| Release {
            project_name: project_name.clone(),
            version: item.title.clone(),
            url: item.link.clone(),
            published_at: item.published,
            updated_at: item.updated,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn project() -> ProjectId {
        ProjectId::from_url("https://github.com/acme/widget").unwrap()
    }

    #[test]
    fn test_release_link_patterns() {
        assert!(is_release_link("https://github.com/acme/widget/releases/tag/v1.2.3"));
        assert!(is_release_link("https://github.com/acme/widget/releases/tag/10.0.12"));
        assert!(!is_release_link("https://github.com/acme/widget/releases/tag/v1.2"));
        assert!(!is_release_link("https://github.com/acme/widget/releases/tag/v1.2.3-rc.1"));
        assert!(!is_release_link("https://github.com/acme/widget/blog/new-logo"));
        assert!(!is_release_link("https://github.com/acme/widget/releases/tag/v1.2.3/"));
    }

    #[test]
    fn test_single_release() {
        let items = vec![FeedItem::new(
            "v1.2.3",
            "https://github.com/acme/widget/releases/tag/v1.2.3",
        )];

        let releases = extract_releases(&project(), &items);
        assert_eq!(
            releases,
            vec![Release {
                project_name: "acme/widget".to_string(),
                version: "v1.2.3".to_string(),
                url: "https://github.com/acme/widget/releases/tag/v1.2.3".to_string(),
                published_at: None,
                updated_at: None,
            }]
        );
    }

    #[test]
    fn test_non_release_items_dropped_and_order_kept() {
        let published = Utc.with_ymd_and_hms(2024, 1, 5, 8, 30, 0).unwrap();
        let items = vec![
            FeedItem::new("v2.0.0", "https://github.com/acme/widget/releases/tag/v2.0.0"),
            FeedItem::new("Roadmap", "https://github.com/acme/widget/discussions/7"),
            FeedItem {
                published: Some(published),
                ..FeedItem::new("Widget 1.9.0", "https://github.com/acme/widget/releases/tag/1.9.0")
            },
        ];

        let releases = extract_releases(&project(), &items);
        let versions: Vec<_> = releases.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, vec!["v2.0.0", "Widget 1.9.0"]);
        assert_eq!(releases[1].published_at, Some(published));
    }

    #[test]
    fn test_empty_feed() {
        assert!(extract_releases(&project(), &[]).is_empty());
    }
}
