//! Registry test utilities

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;

use image_updater::config::Config;
use image_updater::pipeline::{FilePipeline, History};
use image_updater::version::error::RegistryError;
use image_updater::version::registries::RegistrySet;
use image_updater::version::registry::{Protocol, TagList, TagQuery, TagRegistry};
use image_updater::version::resolver::UpdateResolver;

/// Registry serving fixed tag lists keyed by upstream repository
#[derive(Default)]
pub struct StaticRegistry {
    tags: HashMap<String, Vec<String>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(mut self, repository: &str, tags: Vec<&str>) -> Self {
        self.tags.insert(
            repository.to_string(),
            tags.into_iter().map(|t| t.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl TagRegistry for StaticRegistry {
    fn protocol(&self) -> Protocol {
        Protocol::Oci
    }

    async fn list_tags(&self, query: &TagQuery) -> Result<TagList, RegistryError> {
        match self.tags.get(&query.repository) {
            Some(tags) => Ok(TagList::new(tags.clone()).keep_last(query.limit)),
            None => Err(RegistryError::Status {
                status: StatusCode::NOT_FOUND,
                url: format!("static://{}", query.repository),
            }),
        }
    }
}

/// Resolver sending every host to `registry`
pub fn create_test_resolver(registry: impl TagRegistry + 'static, config: Config) -> Arc<UpdateResolver> {
    Arc::new(UpdateResolver::new(
        Arc::new(config),
        Arc::new(RegistrySet::new(Arc::new(registry))),
    ))
}

pub fn create_test_pipeline(
    registry: impl TagRegistry + 'static,
    config: Config,
    history: Arc<dyn History>,
) -> FilePipeline {
    FilePipeline::new(create_test_resolver(registry, config), history)
}
