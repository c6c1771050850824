use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::image::ImageDataUrl;

/// A stored image together with its display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    #[serde(alias = "dataUrl")]
    pub image_data: String,
    pub name: String,
    pub uploaded_at: DateTime<Utc>,
}

impl Project {
    /// Create a project with a fresh identifier, uploaded now
    pub fn new(name: String, image_data: &ImageDataUrl) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            image_data: image_data.to_string(),
            name,
            uploaded_at: Utc::now(),
        }
    }

    /// Copy of this project with a different name; every other field is kept
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::image::ImageFormat;

    fn sample_image() -> ImageDataUrl {
        ImageDataUrl::from_bytes(ImageFormat::Png, b"\x89PNG\r\n\x1a\nrest")
    }

    #[test]
    fn test_new_generates_unique_ids() {
        let image = sample_image();
        let a = Project::new("a".to_string(), &image);
        let b = Project::new("b".to_string(), &image);

        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(&a.id).is_ok());
        assert!(a.image_data.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_renamed_only_changes_name() {
        let project = Project::new("before".to_string(), &sample_image());
        let renamed = project.renamed("after");

        assert_eq!(renamed.name, "after");
        assert_eq!(renamed.id, project.id);
        assert_eq!(renamed.image_data, project.image_data);
        assert_eq!(renamed.uploaded_at, project.uploaded_at);
    }

    #[test]
    fn test_json_field_names() {
        let project = Project {
            id: "a1".to_string(),
            image_data: "data:image/png;base64,AAAA".to_string(),
            name: "cat".to_string(),
            uploaded_at: "2024-01-01T00:00:00Z".parse().unwrap(),
        };

        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["imageData"], "data:image/png;base64,AAAA");
        assert_eq!(json["uploadedAt"], "2024-01-01T00:00:00Z");

        let legacy = r#"{"id":"a1","dataUrl":"data:image/png;base64,AAAA","name":"cat","uploadedAt":"2024-01-01T00:00:00.000Z"}"#;
        let parsed: Project = serde_json::from_str(legacy).unwrap();
        assert_eq!(parsed, project);
    }
}
