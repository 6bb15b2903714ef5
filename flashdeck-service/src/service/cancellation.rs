//! Cancellation token management for document generation requests.

use dashmap::mapref::entry::Entry;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{ServiceError, ServiceResult};
use crate::service::FlashdeckService;

/// Keeps a request's token registered until dropped, including when the
/// request future itself is dropped mid-flight.
pub(crate) struct GenerationRegistration<'a, R, M> {
    service: &'a FlashdeckService<R, M>,
    request_id: String,
    token: CancellationToken,
}

impl<R, M> GenerationRegistration<'_, R, M> {
    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl<R, M> Drop for GenerationRegistration<'_, R, M> {
    fn drop(&mut self) {
        self.service.generation_tokens.remove(&self.request_id);
    }
}

impl<R, M> FlashdeckService<R, M> {
    /// Register a cancellation token for a generation request.
    pub(crate) fn register_generation(
        &self,
        request_id: &str,
    ) -> ServiceResult<GenerationRegistration<'_, R, M>> {
        let token = CancellationToken::new();
        match self.generation_tokens.entry(request_id.to_string()) {
            Entry::Occupied(_) => {
                return Err(ServiceError::InvalidRequest {
                    message: format!("Request {} is already in progress", request_id),
                });
            }
            Entry::Vacant(entry) => {
                entry.insert(token.clone());
            }
        }

        Ok(GenerationRegistration {
            service: self,
            request_id: request_id.to_string(),
            token,
        })
    }

    /// Cancel a generation request if it is in progress.
    pub fn cancel_generation(&self, request_id: &str) -> bool {
        if let Some(token) = self.generation_tokens.get(request_id) {
            token.cancel();
            info!(request_id = %request_id, "Generation cancellation triggered");
            true
        } else {
            false
        }
    }

    pub fn active_generations(&self) -> usize {
        self.generation_tokens.len()
    }
}
