//! Multi-document YAML container files

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

const IMAGE_KEY: &str = "image";
const DOCUMENT_SEPARATOR: &str = "---\n";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// A container definition file, one YAML document per container
#[derive(Debug, Clone)]
pub struct ContainerFile {
    path: PathBuf,
    documents: Vec<Value>,
}

impl ContainerFile {
    /// Read and parse all documents of `path`
    pub async fn load(path: &Path) -> Result<Self, DocumentError> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| DocumentError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        Self::parse(path, &content)
    }

    /// Parse documents from `content`, keeping their order
    pub fn parse(path: &Path, content: &str) -> Result<Self, DocumentError> {
        let documents = serde_yaml::Deserializer::from_str(content)
            .map(Value::deserialize)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| DocumentError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            documents,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without extension, used in commit messages
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Mapping of document `index`, if it is one
    pub fn container(&self, index: usize) -> Option<&Mapping> {
        self.documents.get(index).and_then(Value::as_mapping)
    }

    /// `image` field of document `index`
    pub fn image(&self, index: usize) -> Option<&str> {
        self.container(index)?.get(IMAGE_KEY)?.as_str()
    }

    /// Replace the `image` field of document `index`, keeping its position
    pub fn set_image(&mut self, index: usize, image: String) {
        if let Some(Value::Mapping(mapping)) = self.documents.get_mut(index) {
            mapping.insert(Value::from(IMAGE_KEY), Value::from(image));
        }
    }

    /// Serialize all documents, separated by `---`
    pub fn render(&self) -> Result<String, DocumentError> {
        let rendered = self
            .documents
            .iter()
            .map(serde_yaml::to_string)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| DocumentError::Serialize {
                path: self.path.clone(),
                source,
            })?;

        Ok(rendered.join(DOCUMENT_SEPARATOR))
    }

    /// Write all documents back to the file
    pub async fn save(&self) -> Result<(), DocumentError> {
        let content = self.render()?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|source| DocumentError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const STACK: &str = r#"image: ghcr.io/kozea/radicale:3.5.10
name: radicale
networks:
- proxy
---
image: nginx:1.27.0
environment:
  TZ: Europe/Berlin
restart: always
"#;

    fn parse(content: &str) -> ContainerFile {
        ContainerFile::parse(Path::new("containers/stack.yaml"), content).unwrap()
    }

    #[test]
    fn parse_keeps_document_order() {
        let file = parse(STACK);

        assert_eq!(file.len(), 2);
        assert_eq!(file.image(0), Some("ghcr.io/kozea/radicale:3.5.10"));
        assert_eq!(file.image(1), Some("nginx:1.27.0"));
        assert_eq!(file.stem(), "stack");
    }

    #[test]
    fn render_round_trips_unchanged_documents() {
        assert_eq!(parse(STACK).render().unwrap(), STACK);
    }

    #[test]
    fn set_image_changes_only_the_image_field() {
        let mut file = parse(STACK);

        file.set_image(1, "nginx:1.27.3".to_string());

        assert_eq!(
            file.render().unwrap(),
            STACK.replace("nginx:1.27.0", "nginx:1.27.3")
        );
    }

    #[test]
    fn image_is_none_for_documents_without_image() {
        let file = parse("name: no-image\n---\n- a list\n");

        assert_eq!(file.image(0), None);
        assert_eq!(file.image(1), None);
        assert_eq!(file.image(2), None);
    }

    #[test]
    fn parse_rejects_invalid_yaml() {
        let result = ContainerFile::parse(Path::new("broken.yaml"), "image: [unclosed\n");

        assert!(matches!(result, Err(DocumentError::Parse { .. })));
    }

    #[tokio::test]
    async fn save_writes_rendered_documents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("stack.yaml");
        tokio::fs::write(&path, STACK).await.unwrap();

        let mut file = ContainerFile::load(&path).await.unwrap();
        file.set_image(0, "ghcr.io/kozea/radicale:3.5.11".to_string());
        file.save().await.unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(written, STACK.replace("3.5.10", "3.5.11"));
    }
}
