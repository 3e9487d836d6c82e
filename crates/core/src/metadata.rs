//! Archival record metadata derivation.
//!
//! Builds the normalized metadata document attached to a published
//! release: title, publication date, related identifiers, and the
//! deterministic archive filename.

use chrono::NaiveDate;
use serde::Serialize;

use crate::payload::ProjectInfo;
use crate::types::Timestamp;

/// Relation of the source-tree link carried on every record.
const TREE_RELATION: &str = "isSupplementTo";

/// Normalized metadata for one published release record.
#[derive(Debug, Clone, Serialize)]
pub struct RecordMetadata {
    pub access_right: String,
    pub title: String,
    pub description: Option<String>,
    pub license: String,
    pub publication_date: NaiveDate,
    pub related_identifiers: Vec<RelatedIdentifier>,
    pub version: String,
    pub upload_type: String,
    pub creators: Vec<Creator>,
}

/// A link relating the record to an external resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedIdentifier {
    pub identifier: String,
    pub relation: String,
}

/// A record author, taken from the project's contributor list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Creator {
    pub name: String,
    pub affiliation: String,
}

impl RecordMetadata {
    /// Assemble record metadata for a tagged release.
    ///
    /// `tag_created_at` is the creation time of the tag's commit; the
    /// publication date keeps only its calendar day.
    pub fn for_release(
        project: &ProjectInfo,
        tag: &str,
        tag_created_at: Timestamp,
        creators: Vec<Creator>,
    ) -> Self {
        Self {
            access_right: "open".to_string(),
            title: release_title(project, tag),
            description: project.description.clone(),
            license: "other-open".to_string(),
            publication_date: tag_created_at.date_naive(),
            related_identifiers: vec![RelatedIdentifier {
                identifier: format!("{}/tree/{}", project.web_url, tag),
                relation: TREE_RELATION.to_string(),
            }],
            version: tag.to_string(),
            upload_type: "software".to_string(),
            creators,
        }
    }
}

/// Synthesize a record title from the qualified project path.
///
/// When the project's short name does not already appear in the path,
/// it is appended for disambiguation; otherwise the tag is.
pub fn release_title(project: &ProjectInfo, tag: &str) -> String {
    if !project.path_with_namespace.contains(&project.name) {
        format!("{}: {}", project.path_with_namespace, project.name)
    } else {
        format!("{}: {}", project.path_with_namespace, tag)
    }
}

/// Deterministic filename for a release's source archive.
pub fn archive_filename(full_name: &str, tag: &str) -> String {
    format!("{full_name}-{tag}.tar.gz")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn project() -> ProjectInfo {
        ProjectInfo {
            name: "archiver".to_string(),
            path_with_namespace: "group/archiver".to_string(),
            description: Some("Example project".to_string()),
            web_url: "https://gitlab.example.org/group/archiver".to_string(),
        }
    }

    #[test]
    fn title_uses_tag_when_name_is_in_path() {
        assert_eq!(release_title(&project(), "v1.0.0"), "group/archiver: v1.0.0");
    }

    #[test]
    fn title_appends_short_name_when_missing_from_path() {
        let p = ProjectInfo {
            name: "Archiver UI".to_string(),
            path_with_namespace: "group/frontend".to_string(),
            ..project()
        };
        assert_eq!(release_title(&p, "v1.0.0"), "group/frontend: Archiver UI");
    }

    #[test]
    fn archive_filename_is_deterministic() {
        assert_eq!(
            archive_filename("group/archiver", "v1.0.0"),
            "group/archiver-v1.0.0.tar.gz"
        );
    }

    #[test]
    fn publication_date_truncates_to_day() {
        let created = Utc.with_ymd_and_hms(2019, 3, 14, 15, 9, 26).unwrap();
        let metadata = RecordMetadata::for_release(&project(), "v1.0.0", created, vec![]);
        assert_eq!(
            metadata.publication_date,
            NaiveDate::from_ymd_opt(2019, 3, 14).unwrap()
        );
    }

    #[test]
    fn defaults_and_related_identifier() {
        let created = Utc.with_ymd_and_hms(2019, 3, 14, 15, 9, 26).unwrap();
        let creators = vec![Creator {
            name: "Ada Lovelace".to_string(),
            affiliation: String::new(),
        }];
        let metadata = RecordMetadata::for_release(&project(), "v2.0.0", created, creators);

        assert_eq!(metadata.access_right, "open");
        assert_eq!(metadata.license, "other-open");
        assert_eq!(metadata.upload_type, "software");
        assert_eq!(metadata.version, "v2.0.0");
        assert_eq!(
            metadata.related_identifiers,
            vec![RelatedIdentifier {
                identifier: "https://gitlab.example.org/group/archiver/tree/v2.0.0".to_string(),
                relation: "isSupplementTo".to_string(),
            }]
        );
        assert_eq!(metadata.creators.len(), 1);
    }
}
