//! Mailbox Benchmarks
//!
//! Measures the cost of the two-lane queue that backs every actor's inbox:
//! - Plain enqueue/pop round trips, normal lane only
//! - Enqueue under a mixed urgent/normal load
//! - `find_remove` scanning past a prefix of unrelated envelopes
//! - `put_back` followed by a `pop` of the same envelope (the skip path)

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::hint::black_box;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};

use caldera_rt::mailbox::Mailbox;
use caldera_rt::message::{Envelope, EnvelopeSink, Payload, Priority};

fn normal_envelope(n: i32) -> Envelope {
    Envelope::async_message(None, Priority::Normal, Payload::new(n))
}

fn urgent_envelope(n: i32) -> Envelope {
    Envelope::async_message(None, Priority::Urgent, Payload::new(n))
}

/// Benchmark: enqueue then immediately pop, normal lane only.
fn mailbox_enqueue_pop_round_trip(c: &mut Criterion) {
    c.bench_function("mailbox_enqueue_pop_round_trip", |b| {
        let mailbox = Mailbox::new();
        b.iter(|| {
            mailbox.enqueue(normal_envelope(1));
            black_box(mailbox.pop());
        });
    });
}

/// Benchmark: sustained enqueue of 100 envelopes split across both lanes,
/// then drained in delivery order.
fn mailbox_mixed_priority_throughput(c: &mut Criterion) {
    c.bench_function("mailbox_mixed_priority_throughput", |b| {
        b.iter(|| {
            let mailbox = Mailbox::new();
            for i in 0..100 {
                if i % 10 == 0 {
                    mailbox.enqueue(urgent_envelope(i));
                } else {
                    mailbox.enqueue(normal_envelope(i));
                }
            }
            let mut drained = 0;
            while mailbox.pop().is_some() {
                drained += 1;
            }
            black_box(drained);
        });
    });
}

/// Benchmark: `find_remove` locating the last of 100 queued envelopes.
fn mailbox_find_remove_tail(c: &mut Criterion) {
    c.bench_function("mailbox_find_remove_tail", |b| {
        b.iter(|| {
            let mailbox = Mailbox::new();
            for i in 0..100 {
                mailbox.enqueue(normal_envelope(i));
            }
            let found = mailbox.find_remove(|e| e.payload().downcast_ref::<i32>() == Some(&99));
            black_box(found);
        });
    });
}

/// Benchmark: pop, put_back, pop — the skip-and-replay path a handler
/// returning [`caldera_rt::behavior::HandlerOutcome::Skip`] drives.
fn mailbox_put_back_replay(c: &mut Criterion) {
    c.bench_function("mailbox_put_back_replay", |b| {
        let mailbox = Mailbox::new();
        mailbox.enqueue(normal_envelope(1));
        b.iter(|| {
            let skipped = mailbox.pop().expect("an envelope should always be queued");
            mailbox.put_back(skipped);
            black_box(mailbox.pop());
            mailbox.put_back(normal_envelope(1));
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
        mailbox_enqueue_pop_round_trip,
        mailbox_mixed_priority_throughput,
        mailbox_find_remove_tail,
        mailbox_put_back_replay
}

criterion_main!(benches);
