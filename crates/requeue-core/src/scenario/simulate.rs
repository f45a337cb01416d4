//! Single-threaded stand-in for the request pipeline.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use super::dupefilter::SeenFilter;
use super::{Outcome, Scenario};
use crate::request::{Request, Response};
use crate::retry::{FetchError, ResponseAction, RetryPolicy};

/// Meta key the simulator uses to map a scheduled request back to its script.
pub const SCRIPT_INDEX: &str = "scenario_index";

/// How a scripted request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A response reached the end of the pipeline.
    Completed { status: u16, fetches: u32 },
    /// A transport failure was propagated.
    Failed { error: String, fetches: u32 },
    /// Never fetched: an identical request had already been scheduled.
    Filtered,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestReport {
    pub request: Request,
    pub outcome: RequestOutcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationReport {
    /// One entry per scripted request, in script order.
    pub requests: Vec<RequestReport>,
    /// Total fetches performed, retries included.
    pub fetches: u32,
    /// Order in which requests were fetched, as script indices.
    pub fetch_order: Vec<usize>,
}

struct Queued {
    priority: i32,
    seq: Reverse<u64>,
    request: Request,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Highest priority first; FIFO among equal priorities.
impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.priority, self.seq).cmp(&(other.priority, other.seq))
    }
}

#[derive(Default)]
struct Queue {
    heap: BinaryHeap<Queued>,
    filter: SeenFilter,
    next_seq: u64,
}

impl Queue {
    fn push(&mut self, request: Request) -> bool {
        if !self.filter.admit(&request) {
            tracing::debug!(request = %request, "filtered duplicate request");
            return false;
        }
        self.heap.push(Queued {
            priority: request.priority,
            seq: Reverse(self.next_seq),
            request,
        });
        self.next_seq += 1;
        true
    }

    fn pop(&mut self) -> Option<Request> {
        self.heap.pop().map(|q| q.request)
    }
}

pub struct Simulator;

impl Simulator {
    /// Play `scenario` through `policy`. With no policy (retries disabled),
    /// every response passes through and every failure propagates.
    pub fn run(scenario: &Scenario, policy: Option<&RetryPolicy>) -> SimulationReport {
        let mut queue = Queue::default();
        let mut cursors = vec![0usize; scenario.requests.len()];
        let mut outcomes: Vec<Option<RequestOutcome>> = vec![None; scenario.requests.len()];
        let mut report = SimulationReport::default();

        for (index, scripted) in scenario.requests.iter().enumerate() {
            let request = scripted.request.clone().with_meta(SCRIPT_INDEX, index);
            queue.push(request);
        }

        while let Some(request) = queue.pop() {
            let Some(index) = request.meta.get_count(SCRIPT_INDEX).map(|i| i as usize) else {
                tracing::warn!(request = %request, "dropping request without script index");
                continue;
            };
            let script = &scenario.requests[index];
            let outcome = script
                .outcomes
                .get(cursors[index])
                .cloned()
                .unwrap_or(Outcome::Status(200));
            cursors[index] += 1;
            report.fetches += 1;
            report.fetch_order.push(index);
            let fetches = cursors[index] as u32;

            match outcome {
                Outcome::Status(status) => {
                    let response = Response::new(request.url.clone(), status);
                    let action = match policy {
                        Some(p) => p.process_response(&request, response),
                        None => ResponseAction::PassThrough(response),
                    };
                    match action {
                        ResponseAction::PassThrough(response) => {
                            tracing::info!(
                                request = %request,
                                status = response.status,
                                fetches,
                                "completed"
                            );
                            outcomes[index] = Some(RequestOutcome::Completed {
                                status: response.status,
                                fetches,
                            });
                        }
                        ResponseAction::Retry(retry) => {
                            queue.push(retry);
                        }
                    }
                }
                Outcome::Failure { kind, message } => {
                    let error = FetchError::new(kind, message);
                    match policy.and_then(|p| p.process_exception(&request, &error)) {
                        Some(retry) => {
                            queue.push(retry);
                        }
                        None => {
                            tracing::info!(request = %request, error = %error, fetches, "failed");
                            outcomes[index] = Some(RequestOutcome::Failed {
                                error: error.to_string(),
                                fetches,
                            });
                        }
                    }
                }
            }
        }

        report.requests = scenario
            .requests
            .iter()
            .zip(outcomes)
            .map(|(scripted, outcome)| RequestReport {
                request: scripted.request.clone(),
                outcome: outcome.unwrap_or(RequestOutcome::Filtered),
            })
            .collect();
        report
    }
}
