//! Networking policy.

use crate::model::{BidFuture, BidRequest, BidResponse, SemanticStrategy, decided};

/// Rejects networked jobs unless the node accepts them.
#[derive(Debug, Clone, Copy)]
pub struct NetworkingStrategy {
    accept_networked_jobs: bool,
}

impl NetworkingStrategy {
    pub fn new(accept_networked_jobs: bool) -> Self {
        Self {
            accept_networked_jobs,
        }
    }
}

impl SemanticStrategy for NetworkingStrategy {
    fn name(&self) -> &str {
        "networking"
    }

    fn should_bid<'a>(&'a self, request: &'a BidRequest) -> BidFuture<'a> {
        let mode = request.job.task.network;
        let requires = request.job.requires_network();
        let policy = if self.accept_networked_jobs {
            "accepts"
        } else {
            "does not accept"
        };
        let need = if requires {
            format!("requires networking ({mode})")
        } else {
            "does not require networking".to_string()
        };

        decided(Ok(BidResponse::decide(
            !requires || self.accept_networked_jobs,
            format!("this node {policy} networked jobs and the job {need}"),
        )))
    }
}

#[cfg(test)]
mod tests {
    use bidgrid_core::{Job, NetworkMode};

    use super::*;
    use crate::semantic::test_support::request;

    fn job(network: NetworkMode) -> Job {
        let mut job = Job::default();
        job.task.network = network;
        job
    }

    #[tokio::test]
    async fn unnetworked_job_always_accepted() {
        for accept in [true, false] {
            let resp = NetworkingStrategy::new(accept)
                .should_bid(&request(job(NetworkMode::None)))
                .await
                .unwrap();
            assert!(resp.should_bid);
        }
    }

    #[tokio::test]
    async fn networked_job_rejected_by_default_policy() {
        let resp = NetworkingStrategy::new(false)
            .should_bid(&request(job(NetworkMode::Full)))
            .await
            .unwrap();

        assert!(!resp.should_bid);
        assert!(resp.reason.contains("does not accept networked jobs"));
        assert!(resp.reason.contains("requires networking (full)"));
    }

    #[tokio::test]
    async fn networked_job_accepted_when_allowed() {
        let resp = NetworkingStrategy::new(true)
            .should_bid(&request(job(NetworkMode::Http)))
            .await
            .unwrap();
        assert!(resp.should_bid);
    }
}
