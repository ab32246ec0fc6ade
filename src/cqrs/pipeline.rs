// Copyright 2025 Cowboy AI, LLC.

//! Onion composition of resolved middleware

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value as Json;

use super::dispatch::Dispatch;
use super::middleware::Middleware;
use crate::dependency_injection::DependencyContainer;
use crate::errors::DomainResult;

/// The rest of the chain after the current middleware
///
/// The first middleware in the slice runs outermost. Once the slice is
/// exhausted, `run` performs boot-then-execute.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    remaining: &'a [Arc<dyn Middleware>],
    container: &'a DependencyContainer,
}

impl<'a> Next<'a> {
    /// Chain over `middleware`, innermost link being boot-then-execute
    pub fn new(middleware: &'a [Arc<dyn Middleware>], container: &'a DependencyContainer) -> Self {
        Self {
            remaining: middleware,
            container,
        }
    }

    /// Container used for injection
    pub fn container(&self) -> &'a DependencyContainer {
        self.container
    }

    /// Number of middleware still to run
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    /// Continue the chain
    pub fn run<'b>(self, dispatch: &'b mut Dispatch) -> BoxFuture<'b, DomainResult<Json>>
    where
        'a: 'b,
    {
        Box::pin(async move {
            match self.remaining.split_first() {
                Some((current, rest)) => {
                    let next = Next {
                        remaining: rest,
                        container: self.container,
                    };
                    current.handle(dispatch, next).await
                }
                None => dispatch.boot_then_execute(self.container).await,
            }
        })
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<_> = self.remaining.iter().map(|m| m.id()).collect();
        f.debug_struct("Next").field("remaining", &ids).finish()
    }
}
