//! Request/Response Benchmarks
//!
//! Measures the cost of a full request/response round trip through the
//! deterministic scheduler: spawning the two actors, sending the kick
//! message, and driving the three dispatches a reply takes to land
//! (request leaves the requester, the target replies, the response frame
//! runs on the requester).

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::hint::black_box;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use criterion::{criterion_group, criterion_main, Criterion};

use caldera_rt::prelude::*;
use caldera_rt::testkit::DeterministicHarness;

struct Adder;

#[async_trait]
impl Actor for Adder {
    type Error = std::convert::Infallible;

    async fn pre_start(&mut self, _ctx: &mut ActorContext) -> Result<Behavior, Self::Error> {
        Ok(Behavior::new().with_handler(Handler::new::<(i32, i32), _>(|(x, y)| HandlerOutcome::Reply(Payload::new(x + y)))))
    }
}

struct Requester {
    target: SenderHandle,
    replies: Arc<AtomicUsize>,
}

#[async_trait]
impl Actor for Requester {
    type Error = std::convert::Infallible;

    async fn pre_start(&mut self, _ctx: &mut ActorContext) -> Result<Behavior, Self::Error> {
        let target = self.target.clone();
        let replies = Arc::clone(&self.replies);
        Ok(Behavior::new().with_handler(Handler::new::<(), _>(move |_| {
            let replies = Arc::clone(&replies);
            let response_behavior = RequestHandle::response_behavior(
                move |_payload| {
                    replies.fetch_add(1, Ordering::SeqCst);
                    HandlerOutcome::Void
                },
                |_err| HandlerOutcome::Void,
            );
            HandlerOutcome::Request {
                target: target.clone(),
                timeout: Duration::from_secs(60),
                payload: Payload::new((1i32, 2i32)),
                response_behavior,
            }
        })))
    }
}

/// Benchmark: one full request/response round trip, from kick message to
/// the requester processing the reply.
fn request_response_round_trip(c: &mut Criterion) {
    c.bench_function("request_response_round_trip", |b| {
        b.iter(|| {
            let harness = DeterministicHarness::new().expect("harness should build");
            let adder = harness.system.spawn(Adder, SpawnOptions::new()).expect("adder spawn should succeed");
            let replies = Arc::new(AtomicUsize::new(0));
            let requester = harness
                .system
                .spawn(
                    Requester {
                        target: adder.as_sender(),
                        replies: Arc::clone(&replies),
                    },
                    SpawnOptions::new(),
                )
                .expect("requester spawn should succeed");

            requester.as_sender().try_enqueue(Envelope::async_message(None, Priority::Normal, Payload::new(())));
            harness.dispatch(requester.id());
            harness.dispatch(adder.id());
            harness.dispatch(requester.id());

            black_box(replies.load(Ordering::SeqCst));
        });
    });
}

/// Benchmark: 50 independent request/response round trips against a single
/// shared target actor, interleaved one dispatch at a time.
fn request_response_fan_out(c: &mut Criterion) {
    c.bench_function("request_response_fan_out", |b| {
        b.iter(|| {
            let harness = DeterministicHarness::new().expect("harness should build");
            let adder = harness.system.spawn(Adder, SpawnOptions::new()).expect("adder spawn should succeed");
            let replies = Arc::new(AtomicUsize::new(0));

            let requesters: Vec<_> = (0..50)
                .map(|_| {
                    harness
                        .system
                        .spawn(
                            Requester {
                                target: adder.as_sender(),
                                replies: Arc::clone(&replies),
                            },
                            SpawnOptions::new(),
                        )
                        .expect("requester spawn should succeed")
                })
                .collect();

            for requester in &requesters {
                requester.as_sender().try_enqueue(Envelope::async_message(None, Priority::Normal, Payload::new(())));
            }
            for requester in &requesters {
                harness.dispatch(requester.id());
            }
            for _ in 0..requesters.len() {
                harness.dispatch(adder.id());
            }
            for requester in &requesters {
                harness.dispatch(requester.id());
            }

            black_box(replies.load(Ordering::SeqCst));
        });
    });
}

/// Benchmark: a request that always times out (no reply ever sent),
/// exercising the clock-heap insert/fire/cleanup path instead of the
/// reply path.
fn request_timeout_round_trip(c: &mut Criterion) {
    #[derive(Debug, Clone, PartialEq)]
    struct Ping;
    impl Message for Ping {}

    struct Sink;

    #[async_trait]
    impl Actor for Sink {
        type Error = std::convert::Infallible;

        async fn pre_start(&mut self, _ctx: &mut ActorContext) -> Result<Behavior, Self::Error> {
            Ok(Behavior::new().with_handler(Handler::new::<Ping, _>(|_| HandlerOutcome::Void)))
        }
    }

    struct TimeoutRequester {
        target: SenderHandle,
        timeouts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Actor for TimeoutRequester {
        type Error = std::convert::Infallible;

        async fn pre_start(&mut self, _ctx: &mut ActorContext) -> Result<Behavior, Self::Error> {
            let target = self.target.clone();
            let timeouts = Arc::clone(&self.timeouts);
            Ok(Behavior::new().with_handler(Handler::new::<(), _>(move |_| {
                let timeouts = Arc::clone(&timeouts);
                let response_behavior = RequestHandle::response_behavior(
                    |_payload| HandlerOutcome::Void,
                    move |_err| {
                        timeouts.fetch_add(1, Ordering::SeqCst);
                        HandlerOutcome::Void
                    },
                );
                HandlerOutcome::Request {
                    target: target.clone(),
                    timeout: Duration::from_millis(1),
                    payload: Payload::new(Ping),
                    response_behavior,
                }
            })))
        }
    }

    c.bench_function("request_timeout_round_trip", |b| {
        b.iter(|| {
            let harness = DeterministicHarness::new().expect("harness should build");
            let sink = harness.system.spawn(Sink, SpawnOptions::new()).expect("sink spawn should succeed");
            let timeouts = Arc::new(AtomicUsize::new(0));
            let requester = harness
                .system
                .spawn(
                    TimeoutRequester {
                        target: sink.as_sender(),
                        timeouts: Arc::clone(&timeouts),
                    },
                    SpawnOptions::new(),
                )
                .expect("requester spawn should succeed");

            requester.as_sender().try_enqueue(Envelope::async_message(None, Priority::Normal, Payload::new(())));
            harness.dispatch(requester.id());
            harness.dispatch(sink.id());
            harness.advance(Duration::from_millis(1));
            harness.dispatch(requester.id());

            black_box(timeouts.load(Ordering::SeqCst));
        });
    });
}

fn configure_criterion() -> Criterion {
    Criterion::default()
        .sample_size(30)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(2))
        .without_plots()
}

criterion_group! {
    name = benches;
    config = configure_criterion();
    targets =
        request_response_round_trip,
        request_response_fan_out,
        request_timeout_round_trip
}

criterion_main!(benches);
