//! Deferred path requests answered under a per-frame budget.

use std::collections::VecDeque;

use fogline_core::{EntityId, GridCoordinate, GridError, Path, Traversal};
use fogline_world::GridIndex;

use crate::Pathfinder;

/// Route queued on behalf of an entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathRequest {
    /// Entity that will receive the route.
    pub requester: EntityId,
    /// Cell the route starts from.
    pub start: GridCoordinate,
    /// Cell the route must reach.
    pub goal: GridCoordinate,
    /// Which occupants block the route.
    pub traversal: Traversal,
}

/// Answer produced while draining the queue.
#[derive(Clone, Debug, PartialEq)]
pub enum PathResponse {
    /// A route reaching the goal was found.
    Found {
        /// Entity that asked for the route.
        requester: EntityId,
        /// World-space waypoints from start to goal.
        path: Path,
    },
    /// The request can never succeed and was dropped.
    Rejected {
        /// Entity that asked for the route.
        requester: EntityId,
        /// Reason the request was refused.
        reason: GridError,
    },
}

/// First-in first-out queue of pending path requests.
///
/// Each requester holds at most one pending request. Requests whose goal is
/// currently unreachable go back to the end of the queue and are retried on a
/// later pass, since blocking units may move away in the meantime.
#[derive(Clone, Debug, Default)]
pub struct PathRequestQueue {
    pending: VecDeque<PathRequest>,
}

impl PathRequestQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a walkable route for `requester`, replacing any earlier request.
    pub fn request(&mut self, requester: EntityId, start: GridCoordinate, goal: GridCoordinate) {
        self.request_with(PathRequest {
            requester,
            start,
            goal,
            traversal: Traversal::Walkable,
        });
    }

    /// Queues a fully specified request, replacing any earlier request from
    /// the same requester.
    pub fn request_with(&mut self, request: PathRequest) {
        let _ = self.cancel(request.requester);
        self.pending.push_back(request);
    }

    /// Removes the pending request of `requester`, reporting whether one existed.
    pub fn cancel(&mut self, requester: EntityId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|request| request.requester != requester);
        self.pending.len() != before
    }

    /// Reports whether `requester` has a pending request.
    #[must_use]
    pub fn contains(&self, requester: EntityId) -> bool {
        self.pending
            .iter()
            .any(|request| request.requester == requester)
    }

    /// Number of pending requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Reports whether no requests are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Attempts up to `budget` queued requests, appending answers to `out`.
    ///
    /// Returns the number of searches performed. Each request is attempted at
    /// most once per call even when unreachable requests are requeued.
    pub fn process(
        &mut self,
        pathfinder: &mut Pathfinder,
        grid: &GridIndex,
        budget: usize,
        out: &mut Vec<PathResponse>,
    ) -> usize {
        let attempts = budget.min(self.pending.len());
        for _ in 0..attempts {
            let Some(request) = self.pending.pop_front() else {
                break;
            };
            match pathfinder.find_path_with(grid, request.start, request.goal, request.traversal) {
                Ok(path) if path.is_empty() => {
                    tracing::debug!(
                        requester = request.requester.get(),
                        goal = %request.goal,
                        "path request deferred"
                    );
                    self.pending.push_back(request);
                }
                Ok(path) => out.push(PathResponse::Found {
                    requester: request.requester,
                    path,
                }),
                Err(reason) => {
                    tracing::warn!(
                        requester = request.requester.get(),
                        %reason,
                        "path request rejected"
                    );
                    out.push(PathResponse::Rejected {
                        requester: request.requester,
                        reason,
                    });
                }
            }
        }
        attempts
    }
}
