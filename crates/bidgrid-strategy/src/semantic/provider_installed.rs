//! Provider-installed checks, one generic strategy for every provider kind.
//!
//! Each instance pairs a `ProviderRegistry` with a function that pulls the
//! relevant keys out of a job. Blank keys are "not applicable" and pass.

use bidgrid_core::Job;

use crate::model::{BidFuture, BidRequest, BidResponse, SemanticStrategy, decided};
use crate::providers::ProviderRegistry;

type KeyExtractor = Box<dyn Fn(&Job) -> Vec<String> + Send + Sync>;

pub struct ProviderInstalledStrategy<P> {
    kind: &'static str,
    name: String,
    provider: P,
    keys: KeyExtractor,
}

impl<P: ProviderRegistry> ProviderInstalledStrategy<P> {
    /// `kind` names the provider in logs and reasons ("engine", "publisher").
    pub fn new(
        kind: &'static str,
        provider: P,
        keys: impl Fn(&Job) -> Vec<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            name: format!("{kind}-installed"),
            provider,
            keys: Box::new(keys),
        }
    }

    /// Checks the task's execution engine.
    pub fn engine(provider: P) -> Self {
        Self::new("engine", provider, |job| vec![job.task.engine.clone()])
    }

    /// Checks the task's result publisher.
    pub fn publisher(provider: P) -> Self {
        Self::new("publisher", provider, |job| vec![job.task.publisher.clone()])
    }

    /// Checks the storage driver of every declared input.
    pub fn storage(provider: P) -> Self {
        Self::new("storage", provider, |job| {
            job.task
                .inputs
                .iter()
                .map(|input| input.storage_type.clone())
                .collect()
        })
    }

    fn evaluate(&self, job: &Job) -> BidResponse {
        for key in (self.keys)(job) {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            if !self.provider.has(key) {
                return BidResponse::reject(format!(
                    "{} `{key}` is not installed on this node",
                    self.kind
                ));
            }
        }
        BidResponse::proceed()
    }
}

impl<P: ProviderRegistry> SemanticStrategy for ProviderInstalledStrategy<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn should_bid<'a>(&'a self, request: &'a BidRequest) -> BidFuture<'a> {
        decided(Ok(self.evaluate(&request.job)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use bidgrid_core::InputSource;

    use super::*;
    use crate::semantic::test_support::request;

    fn registry(keys: &[&str]) -> HashSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    fn job(engine: &str, publisher: &str, storages: &[&str]) -> Job {
        let mut job = Job::default();
        job.task.engine = engine.to_string();
        job.task.publisher = publisher.to_string();
        job.task.inputs = storages
            .iter()
            .map(|s| InputSource {
                storage_type: s.to_string(),
                ..Default::default()
            })
            .collect();
        job
    }

    #[tokio::test]
    async fn installed_engine_accepted() {
        let s = ProviderInstalledStrategy::engine(registry(&["docker"]));
        let resp = s.should_bid(&request(job("docker", "", &[]))).await.unwrap();
        assert!(resp.should_bid);
        assert_eq!(s.name(), "engine-installed");
    }

    #[tokio::test]
    async fn missing_engine_rejected() {
        let s = ProviderInstalledStrategy::engine(registry(&["wasm"]));
        let resp = s.should_bid(&request(job("docker", "", &[]))).await.unwrap();
        assert!(!resp.should_bid);
        assert_eq!(resp.reason, "engine `docker` is not installed on this node");
    }

    #[tokio::test]
    async fn blank_keys_are_not_applicable() {
        let s = ProviderInstalledStrategy::publisher(registry(&[]));
        let resp = s.should_bid(&request(job("docker", "  ", &[]))).await.unwrap();
        assert!(resp.should_bid);
    }

    #[tokio::test]
    async fn every_storage_must_be_installed() {
        let s = ProviderInstalledStrategy::storage(registry(&["ipfs", "inline"]));

        let ok = s
            .should_bid(&request(job("", "", &["ipfs", "inline"])))
            .await
            .unwrap();
        assert!(ok.should_bid);

        let missing = s
            .should_bid(&request(job("", "", &["ipfs", "s3"])))
            .await
            .unwrap();
        assert!(!missing.should_bid);
        assert!(missing.reason.contains("storage `s3`"));
    }

    #[tokio::test]
    async fn custom_key_extractor() {
        let s = ProviderInstalledStrategy::new("label", registry(&["gpu"]), |job: &Job| {
            job.labels.keys().cloned().collect()
        });
        let mut j = Job::default();
        j.labels.insert("gpu".to_string(), "a100".to_string());
        assert!(s.should_bid(&request(j)).await.unwrap().should_bid);
    }
}
